use crate::error::TxPeaksError;
use crate::intervals::NamedInterval;
use crate::txpeaks_utils::{get_reader_from_path, is_skippable_line, FileFormat};
use anyhow::Context;
use std::io::BufRead;
use std::path::Path;
use tracing::{info, warn};

/// A genomic peak call from a BED file (`chrom, start, end, name, ...`), 0-based half-open.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeakRecord {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub name: String,
}

impl From<PeakRecord> for NamedInterval {
    fn from(p: PeakRecord) -> NamedInterval {
        NamedInterval::new(p.chrom, p.start, p.end, p.name)
    }
}

/// Reads the peak calls of a (plain or gzipped) BED file, e.g. a MACS2 `narrowPeak`.
/// BED3 files get the names `peak_1`, `peak_2`, ... in file order.
pub fn read_peaks<T: AsRef<Path>>(file_path: T) -> anyhow::Result<Vec<PeakRecord>> {
    let file_path = file_path.as_ref();
    let rdr = get_reader_from_path(file_path).with_context(|| {
        format!("Could not open the peak file {:?}", file_path.as_os_str())
    })?;
    let peaks = _read_peaks(rdr)?;
    info!("Loaded {} peaks from the BED file.", peaks.len());
    Ok(peaks)
}

pub(crate) fn _read_peaks<T: BufRead>(rdr: T) -> Result<Vec<PeakRecord>, TxPeaksError> {
    let mut peaks = Vec::new();
    let mut n_empty = 0usize;
    for (lid, l) in rdr.lines().enumerate() {
        let line = l?;
        if is_skippable_line(&line) {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(TxPeaksError::format(
                FileFormat::BED,
                lid + 1,
                format!("expected at least 3 columns, found {}", fields.len()),
            ));
        }
        let coord = |idx: usize| {
            fields[idx].parse::<i64>().map_err(|e| {
                TxPeaksError::format(
                    FileFormat::BED,
                    lid + 1,
                    format!("could not parse `{}` as a coordinate: {}", fields[idx], e),
                )
            })
        };
        let (start, end) = (coord(1)?, coord(2)?);
        if start < 0 || end < start {
            return Err(TxPeaksError::format(
                FileFormat::BED,
                lid + 1,
                format!("invalid interval [{}, {})", start, end),
            ));
        }
        if start == end {
            n_empty += 1;
        }
        let name = match fields.get(3) {
            Some(n) => n.to_string(),
            None => format!("peak_{}", peaks.len() + 1),
        };
        peaks.push(PeakRecord {
            chrom: fields[0].to_string(),
            start,
            end,
            name,
        });
    }
    if n_empty > 0 {
        warn!(
            "Found {} zero-length peaks; they cannot overlap any exon.",
            n_empty
        );
    }
    Ok(peaks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_peaks() {
        let bed = b"track name=peaks\nchr1\t1050\t1200\tpeak_a\t100\t.\t5.2\nchr2\t10\t20\tpeak_b\n";
        let peaks = _read_peaks(&bed[..]).unwrap();
        assert_eq!(peaks.len(), 2);
        assert_eq!(
            peaks[0],
            PeakRecord {
                chrom: String::from("chr1"),
                start: 1050,
                end: 1200,
                name: String::from("peak_a"),
            }
        );
        assert_eq!(peaks[1].name, "peak_b");
    }

    #[test]
    fn test_bed3_names() {
        let bed = b"chr1\t1\t5\nchr1\t10\t20\n";
        let peaks = _read_peaks(&bed[..]).unwrap();
        assert_eq!(peaks[0].name, "peak_1");
        assert_eq!(peaks[1].name, "peak_2");
    }

    #[test]
    fn test_malformed_peaks() {
        assert!(_read_peaks(&b"chr1\t10\n"[..]).is_err());
        assert!(_read_peaks(&b"chr1\tten\t20\n"[..]).is_err());
        assert!(_read_peaks(&b"chr1\t30\t20\n"[..]).is_err());
    }
}

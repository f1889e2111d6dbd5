use crate::error::TxPeaksError;
use crate::options::Strand;
use crate::transcript::UniqueId;
use crate::txpeaks_utils::{equal_length, get_reader_from_path, is_skippable_line, FileFormat};
use anyhow::Context;
use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;
use tracing::info;

/// The number of columns of a table line once the leading `bin` column is dropped.
const TABLE_COLUMNS: usize = 12;

#[derive(Clone, Debug, PartialEq, Eq)]
/// One gene model of an annotation table.
///
/// The annotation table is the UCSC genePred-extended export offered for RefSeq,
/// GENCODE and Ensembl gene sets. Its columns are
/// `bin, name, chrom, strand, txStart, txEnd, cdsStart, cdsEnd, exonCount, exonStarts,
/// exonEnds, score, name2, ...`, with 0-based half-open coordinates and comma
/// separated (comma terminated) exon lists.
///
/// # Fields
///
/// * `uid`: the synthetic id assigned at ingestion. Ids are sequential from 1 in file order.
/// * `transcript_id`: the `name` column. It is not guaranteed to be unique.
/// * `chrom`: the chromosome.
/// * `strand`: the strand of the transcript.
/// * `tx_start`, `tx_end`: the transcription start and end.
/// * `cds_start`, `cds_end`: the coding region; equal for non-coding transcripts.
/// * `exon_starts`, `exon_ends`: the exon boundaries in ascending genomic order.
/// * `gene_id`: the `name2` column.
pub struct TableRecord {
    pub uid: UniqueId,
    pub transcript_id: String,
    pub chrom: String,
    pub strand: Strand,
    pub tx_start: i64,
    pub tx_end: i64,
    pub cds_start: i64,
    pub cds_end: i64,
    pub exon_starts: Vec<i64>,
    pub exon_ends: Vec<i64>,
    pub gene_id: String,
}

impl TableRecord {
    pub fn is_coding(&self) -> bool {
        self.cds_start != self.cds_end
    }
}

/// Reads an annotation table, plain or gzipped.
///
/// If `selected` is given, only the records whose transcript id is in the set are returned.
/// The unique ids are assigned over all records of the file, so the id of a record does not
/// depend on the selection.
///
/// ### Errors
///
/// Returns a [TxPeaksError::Format] if the file does not start with a `bin` header,
/// or if any record does not follow the table layout.
pub fn read_table<T: AsRef<Path>>(
    file_path: T,
    selected: Option<&HashSet<String>>,
) -> anyhow::Result<Vec<TableRecord>> {
    let file_path = file_path.as_ref();
    let rdr = get_reader_from_path(file_path).with_context(|| {
        format!(
            "Could not open the annotation table {:?}",
            file_path.as_os_str()
        )
    })?;
    let records = _read_table(rdr, selected)?;
    info!(
        "Loaded {} transcripts from the annotation table.",
        records.len()
    );
    Ok(records)
}

pub(crate) fn _read_table<T: BufRead>(
    rdr: T,
    selected: Option<&HashSet<String>>,
) -> Result<Vec<TableRecord>, TxPeaksError> {
    let mut lines = rdr.lines();

    // the header must name the bin column first
    let header = match lines.next() {
        Some(l) => l?,
        None => {
            return Err(TxPeaksError::format(
                FileFormat::Table,
                1,
                "the annotation table is empty",
            ))
        }
    };
    if !header
        .split_whitespace()
        .next()
        .map_or(false, |first| first.contains("bin"))
    {
        return Err(TxPeaksError::format(
            FileFormat::Table,
            1,
            "the table file does not start with a `bin` column; only RefSeq/GENCODE/Ensembl annotation tables are supported",
        ));
    }

    let mut records = Vec::new();
    let mut uid = 0u64;
    for (lid, l) in lines.enumerate() {
        let line = l?;
        if is_skippable_line(&line) {
            continue;
        }
        // the header is line 1
        let line_number = lid + 2;
        uid += 1;
        let record = parse_table_line(&line, UniqueId::new(uid))
            .map_err(|e| TxPeaksError::format(FileFormat::Table, line_number, format!("{:#}", e)))?;

        if let Some(selected) = selected {
            if !selected.contains(&record.transcript_id) {
                continue;
            }
        }
        records.push(record);
    }
    Ok(records)
}

fn parse_table_line(line: &str, uid: UniqueId) -> anyhow::Result<TableRecord> {
    // drop the bin column
    let fields: Vec<&str> = line.trim_end().split('\t').skip(1).collect();
    if fields.len() < TABLE_COLUMNS {
        anyhow::bail!(
            "expected at least {} columns, found {}",
            TABLE_COLUMNS + 1,
            fields.len() + 1
        )
    }

    let int_field = |idx: usize, name: &str| -> anyhow::Result<i64> {
        fields[idx]
            .trim()
            .parse::<i64>()
            .with_context(|| format!("could not parse {} `{}` as an integer", name, fields[idx]))
    };

    let exon_starts = parse_exon_list(fields[8]).context("invalid exonStarts")?;
    let exon_ends = parse_exon_list(fields[9]).context("invalid exonEnds")?;
    if !equal_length(&exon_starts, &exon_ends) {
        anyhow::bail!(
            "found {} exon starts but {} exon ends",
            exon_starts.len(),
            exon_ends.len()
        )
    }
    if let Some((s, e)) = exon_starts
        .iter()
        .zip(exon_ends.iter())
        .find(|(s, e)| s > e)
    {
        anyhow::bail!("found an exon starting at {} after its end {}", s, e)
    }

    Ok(TableRecord {
        uid,
        transcript_id: fields[0].to_string(),
        chrom: fields[1].to_string(),
        strand: fields[2].parse()?,
        tx_start: int_field(3, "txStart")?,
        tx_end: int_field(4, "txEnd")?,
        cds_start: int_field(5, "cdsStart")?,
        cds_end: int_field(6, "cdsEnd")?,
        exon_starts,
        exon_ends,
        gene_id: fields[11].trim().to_string(),
    })
}

/// Parses a comma separated coordinate list. The trailing comma is optional.
fn parse_exon_list(field: &str) -> anyhow::Result<Vec<i64>> {
    field
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .with_context(|| format!("could not parse `{}` as an integer", s))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &[u8] = b"#bin\tname\tchrom\tstrand\ttxStart\ttxEnd\tcdsStart\tcdsEnd\texonCount\texonStarts\texonEnds\tscore\tname2\tcdsStartStat\tcdsEndStat\texonFrames\n\
585\tNM_001\tchr1\t+\t100\t320\t120\t310\t2\t100,300,\t150,320,\t0\tGENE1\tcmpl\tcmpl\t0,2,\n\
585\tNR_002\tchr1\t-\t100\t320\t320\t320\t2\t100,300,\t150,320,\t0\tGENE1\tnone\tnone\t-1,-1,\n\
73\tNM_003\tchrUn_gl000220\t-\t1000\t1100\t1010\t1090\t1\t1000,\t1100,\t0\tGENE2\tcmpl\tcmpl\t0,\n";

    #[test]
    fn test_read_table() {
        let records = _read_table(TABLE, None).unwrap();
        assert_eq!(records.len(), 3);

        let first = &records[0];
        assert_eq!(first.uid, UniqueId::new(1));
        assert_eq!(first.transcript_id, "NM_001");
        assert_eq!(first.chrom, "chr1");
        assert_eq!(first.strand, Strand::Positive);
        assert_eq!((first.tx_start, first.tx_end), (100, 320));
        assert_eq!((first.cds_start, first.cds_end), (120, 310));
        assert_eq!(first.exon_starts, vec![100, 300]);
        assert_eq!(first.exon_ends, vec![150, 320]);
        assert_eq!(first.gene_id, "GENE1");
        assert!(first.is_coding());

        assert!(!records[1].is_coding());
        assert_eq!(records[2].uid, UniqueId::new(3));
        assert_eq!(records[2].exon_starts, vec![1000]);
    }

    #[test]
    fn test_read_selected() {
        let selected: HashSet<String> = [String::from("NR_002")].into_iter().collect();
        let records = _read_table(TABLE, Some(&selected)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].transcript_id, "NR_002");
        // the unique id does not depend on the selection
        assert_eq!(records[0].uid, UniqueId::new(2));
    }

    #[test]
    fn test_missing_bin_header() {
        let table = b"name\tchrom\tstrand\n";
        match _read_table(&table[..], None) {
            Err(TxPeaksError::Format { line, .. }) => assert_eq!(line, 1),
            _ => panic!("expected a format error"),
        }
    }

    #[test]
    fn test_malformed_records() {
        let bad_int = b"#bin\n585\tNM_001\tchr1\t+\tabc\t320\t120\t310\t2\t100,300,\t150,320,\t0\tGENE1\n";
        match _read_table(&bad_int[..], None) {
            Err(TxPeaksError::Format { line, message, .. }) => {
                assert_eq!(line, 2);
                assert!(message.contains("txStart"));
            }
            _ => panic!("expected a format error"),
        }

        let unequal = b"#bin\n585\tNM_001\tchr1\t+\t100\t320\t120\t310\t2\t100,300,\t150,\t0\tGENE1\n";
        assert!(_read_table(&unequal[..], None).is_err());

        let bad_strand = b"#bin\n585\tNM_001\tchr1\t.\t100\t320\t120\t310\t2\t100,300,\t150,320,\t0\tGENE1\n";
        assert!(_read_table(&bad_strand[..], None).is_err());

        let short = b"#bin\n585\tNM_001\tchr1\t+\t100\n";
        assert!(_read_table(&short[..], None).is_err());
    }
}

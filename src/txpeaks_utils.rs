use flate2::bufread::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

/// Type alias for a line reader that can read from either a
/// compressed or an uncompressed input file.
pub type LineReader = Box<dyn BufRead>;

pub(crate) const VALIDSTRANDS: [&str; 2] = ["+", "-"];

/// The value written in place of a landmark (start codon, stop codon, splice site)
/// that does not exist for a transcript.
pub const NOT_APPLICABLE: i64 = -1;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
/// Represents the input file formats consumed by txpeaks.
///
/// # Variants
///
/// * `Table` - A UCSC-style annotation table (genePred extended with a leading `bin` column),
///   as exported for RefSeq, GENCODE and Ensembl gene models.
/// * `FpkmTracking` - A cufflinks `isoforms.fpkm_tracking` expression table.
/// * `BED` - Browser Extensible Data, used for the peak calls.
pub enum FileFormat {
    Table,
    FpkmTracking,
    BED,
}

impl std::fmt::Display for FileFormat {
    /// Print the formatted description of the current [FileFormat]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileFormat::Table => write!(f, "annotation table"),
            FileFormat::FpkmTracking => write!(f, "FPKM tracking"),
            FileFormat::BED => write!(f, "BED"),
        }
    }
}

// Returns `true` if the input vectors are of equal length and false otherwise.
pub fn equal_length<T, R>(vec1: &[T], vec2: &[R]) -> bool {
    vec1.len() == vec2.len()
}

/// Tests if the stream underlying the [BufReader] `reader` is gzipped or not by examining the
/// first 2 bytes for the magic header.  This function *requires*, but does not check, that
/// none of the stream has yet been consumed (i.e. that no read calls have yet been issued
/// to `reader`). It will fill the buffer to examine the first two bytes, but will not consume
/// them.
///
/// If the first 2 bytes could be succesfully read, this returns
/// [Ok]`(true)` if the file is a gzipped file
/// [Ok]`(false)` if it is not a gzipped file
///
/// If the first 2 bytes could not be succesfully read, then this
/// returns the relevant [std::io::Error].
pub fn is_gzipped<T: BufRead>(reader: &mut T) -> std::io::Result<bool> {
    const GZIP_MAGIC_NUMBER: [u8; 2] = [0x1f, 0x8b];

    let src = reader.fill_buf()?;
    if src.get(..2) == Some(&GZIP_MAGIC_NUMBER) {
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Creates a [LineReader] from the provided path. This function will automatically
/// determine if the provided path points to a gzip compressed or an uncompressed
/// file, and will return the appropriate reader accordingly.
///
/// It returns [Ok]`(`[LineReader]`)` on success and an [anyhow::Error] on failure.
pub fn get_reader_from_path<T: AsRef<Path>>(p: T) -> anyhow::Result<LineReader> {
    let file = File::open(p.as_ref())?;
    let mut inner_rdr = BufReader::new(file);
    if is_gzipped(&mut inner_rdr)? {
        info!("auto-detected gzipped file - reading via decompression");
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(inner_rdr))))
    } else {
        Ok(Box::new(inner_rdr))
    }
}

/// Returns `true` if the line carries no record: it is empty, a comment, or
/// a UCSC `track`/`browser` directive.
pub(crate) fn is_skippable_line(line: &str) -> bool {
    let line = line.trim();
    line.is_empty()
        || line.starts_with('#')
        || line.starts_with("track")
        || line.starts_with("browser")
}

use crate::error::TxPeaksError;
use crate::txpeaks_utils::VALIDSTRANDS;
use anyhow::bail;
use tracing::warn;

/// The strand a transcript is annotated on.
///
/// On the [Strand::Positive] strand the biological 5'→3' order of the exons equals their
/// ascending genomic order. On the [Strand::Negative] strand it is the reverse, so
/// the exon with the highest genomic coordinate is transcribed first.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Strand {
    Positive,
    Negative,
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Strand::Positive => write!(f, "+"),
            Strand::Negative => write!(f, "-"),
        }
    }
}

impl std::str::FromStr for Strand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Strand> {
        match s {
            "+" => Ok(Strand::Positive),
            "-" => Ok(Strand::Negative),
            _ => bail!(
                "Found strand `{}`; the strand must be one of {:?}",
                s,
                VALIDSTRANDS
            ),
        }
    }
}

/// The key used to group transcripts into a [TranscriptCollection](crate::transcriptome::TranscriptCollection).
///
/// # Variants
///
/// * `Gene`: group all isoforms of a gene together.
/// * `TranscriptId`: group records sharing a transcript id. A group with more than
///   one member holds duplicated transcript ids, as found in some annotation releases.
/// * `UniqueId`: group by the synthetic id assigned to every record at ingestion.
///   Every group has exactly one member.
///
/// # Examples
///
/// ```rust
/// use txpeaks::options::TranscriptKey;
///
/// let key: TranscriptKey = "txid".parse().unwrap();
/// assert_eq!(key, TranscriptKey::TranscriptId);
/// assert!("exon".parse::<TranscriptKey>().is_err());
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TranscriptKey {
    Gene,
    TranscriptId,
    UniqueId,
}

impl std::str::FromStr for TranscriptKey {
    type Err = TxPeaksError;

    fn from_str(s: &str) -> Result<TranscriptKey, TxPeaksError> {
        match s.to_lowercase().as_str() {
            "gid" | "gene" | "gene_id" => Ok(TranscriptKey::Gene),
            "txid" | "transcript" | "transcript_id" => Ok(TranscriptKey::TranscriptId),
            "uid" | "unique_id" => Ok(TranscriptKey::UniqueId),
            _ => Err(TxPeaksError::InvalidKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for TranscriptKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TranscriptKey::Gene => write!(f, "gid"),
            TranscriptKey::TranscriptId => write!(f, "txid"),
            TranscriptKey::UniqueId => write!(f, "uid"),
        }
    }
}

/// How peaks are intersected with exons.
///
/// * `Any`: every peak/exon pair overlapping by at least one base is reported together
///   with the overlap length. This is the input of the transcript-local remapping.
/// * `Fraction(f)`: only pairs whose overlap covers at least `f` of the peak are kept,
///   and the overlapping part of the peak is reported. This is an inclusion filter used
///   for the exon-limited peak output.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum IntersectMode {
    Any,
    Fraction(f64),
}

/// Configuration options for merging sorted intervals.
///
/// # Fields
///
/// * `distance`: The maximum gap between two intervals on the same sequence that still
///   fuses them. A distance of 0 fuses overlapping and book-ended intervals only.
/// * `delimiter`: The separator placed between the names of fused intervals.
///
/// # Examples
///
/// ```rust
/// use txpeaks::options::MergeOptions;
///
/// let options = MergeOptions::new(10);
/// assert_eq!(options.distance, 10);
/// assert_eq!(options.delimiter, ";");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeOptions {
    pub distance: i64,
    pub delimiter: String,
}

impl Default for MergeOptions {
    fn default() -> MergeOptions {
        MergeOptions {
            distance: 0,
            delimiter: String::from(";"),
        }
    }
}

impl MergeOptions {
    pub fn new(distance: i64) -> MergeOptions {
        if distance < 0 {
            warn!("It usually doesn't make sense to set a negative merge distance.")
        }
        MergeOptions {
            distance,
            ..Default::default()
        }
    }
}

/// Selects the transcripts that get a parameter row.
///
/// Long sequence names are unplaced scaffolds, patches and alternative haplotypes
/// (`chrUn_gl000220`, `chr6_cox_hap2`, ...). Only transcripts whose chromosome name
/// has at most `max_name_len` characters are summarized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChromosomeFilter {
    pub max_name_len: usize,
}

impl Default for ChromosomeFilter {
    fn default() -> ChromosomeFilter {
        ChromosomeFilter { max_name_len: 5 }
    }
}

impl ChromosomeFilter {
    pub fn new(max_name_len: usize) -> ChromosomeFilter {
        ChromosomeFilter { max_name_len }
    }

    pub fn accepts<T: AsRef<str>>(&self, chrom: T) -> bool {
        chrom.as_ref().chars().count() <= self.max_name_len
    }
}

/// Column positions of the expression file, after splitting each line on whitespace.
///
/// The defaults follow the layout of cufflinks' `isoforms.fpkm_tracking`
/// (`gene_id` in column 3, `length` in column 7 and `FPKM` in column 9)
/// with a single header line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpressionLayout {
    pub isoform_column: usize,
    pub length_column: usize,
    pub value_column: usize,
    pub header_lines: usize,
}

impl Default for ExpressionLayout {
    fn default() -> ExpressionLayout {
        ExpressionLayout {
            isoform_column: 3,
            length_column: 7,
            value_column: 9,
            header_lines: 1,
        }
    }
}

impl ExpressionLayout {
    /// the number of columns a record needs to carry all fields
    pub fn min_columns(&self) -> usize {
        self.isoform_column
            .max(self.length_column)
            .max(self.value_column)
            + 1
    }
}

/// Options of the isoform selection.
///
/// * `max_unmatched`: the number of expression isoforms that may be absent from the
///   annotation table before the run is aborted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionOptions {
    pub max_unmatched: usize,
}

impl Default for SelectionOptions {
    fn default() -> SelectionOptions {
        SelectionOptions { max_unmatched: 5 }
    }
}

/// Options of the peak conversion and of the final report.
///
/// # Fields
///
/// * `merge_distance`: transcript-local segments of one transcript closer than or equal to this
///   distance are fused.
/// * `min_peak_width`: merged segments must be strictly wider than this to be reported.
/// * `exon_fraction`: the minimal fraction of a peak that must lie in an exon for the peak
///   to be part of the exon-limited peak output.
/// * `chromosome_filter`: the predicate selecting transcripts for the parameter rows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReportOptions {
    pub merge_distance: i64,
    pub min_peak_width: i64,
    pub exon_fraction: f64,
    pub chromosome_filter: ChromosomeFilter,
}

impl Default for ReportOptions {
    fn default() -> ReportOptions {
        ReportOptions {
            merge_distance: 10,
            min_peak_width: 50,
            exon_fraction: 0.5,
            chromosome_filter: ChromosomeFilter::default(),
        }
    }
}

impl ReportOptions {
    /// Checks that the options describe a meaningful run.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.exon_fraction > 0.0 && self.exon_fraction <= 1.0) {
            bail!(
                "The exon fraction must be in (0, 1], but {} was given.",
                self.exon_fraction
            )
        }
        if self.min_peak_width < 0 {
            bail!("The minimal peak width cannot be negative.")
        }
        if self.merge_distance < 0 {
            warn!("It usually doesn't make sense to set a negative merge distance.")
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strand() {
        assert_eq!("+".parse::<Strand>().unwrap(), Strand::Positive);
        assert_eq!("-".parse::<Strand>().unwrap(), Strand::Negative);
        assert!(".".parse::<Strand>().is_err());
        assert_eq!(Strand::Negative.to_string(), "-");
    }

    #[test]
    fn test_transcript_key() {
        assert_eq!("gid".parse::<TranscriptKey>().unwrap(), TranscriptKey::Gene);
        assert_eq!(
            "UID".parse::<TranscriptKey>().unwrap(),
            TranscriptKey::UniqueId
        );
        match "exon".parse::<TranscriptKey>() {
            Err(TxPeaksError::InvalidKind(k)) => assert_eq!(k, "exon"),
            _ => panic!("expected an InvalidKind error"),
        }
    }

    #[test]
    fn test_chromosome_filter() {
        let filter = ChromosomeFilter::default();
        assert!(filter.accepts("chr1"));
        assert!(filter.accepts("chrMT"));
        assert!(!filter.accepts("chrUn_gl000220"));
        assert!(ChromosomeFilter::new(20).accepts("chrUn_gl000220"));
    }

    #[test]
    fn test_report_options() {
        assert!(ReportOptions::default().validate().is_ok());
        let options = ReportOptions {
            exon_fraction: 1.5,
            ..Default::default()
        };
        assert!(options.validate().is_err());
        assert_eq!(ExpressionLayout::default().min_columns(), 10);
    }
}

use crate::options::ChromosomeFilter;
use crate::transcript::{TranscriptModel, UniqueId};
use crate::transcriptome::TranscriptCollection;
use crate::txpeaks_utils::NOT_APPLICABLE;
use tracing::info;

/// The transcript-local landmarks of a transcript used in metagene plots.
///
/// Landmarks that do not exist are set to [NOT_APPLICABLE] (`-1`):
/// the codons of non-coding transcripts, and the splice sites of single-exon transcripts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptParameterRow {
    pub transcript_id: String,
    pub start_codon: i64,
    pub stop_codon: i64,
    pub length: i64,
    pub first_splice_site: i64,
    pub last_splice_site: i64,
    pub uid: UniqueId,
}

impl TranscriptParameterRow {
    pub fn from_transcript(tx: &TranscriptModel) -> TranscriptParameterRow {
        let mut starts: Vec<i64> = tx.transcriptomic_exons().iter().map(|s| s.start).collect();
        starts.sort_unstable();

        // a start codon at position 0 marks the transcript as non-coding too
        let (start_codon, stop_codon) = match tx.start_codon() {
            Some(atg) if atg > 0 => (atg, tx.stop_codon().unwrap_or(NOT_APPLICABLE)),
            _ => (NOT_APPLICABLE, NOT_APPLICABLE),
        };

        let (first_splice_site, last_splice_site) = if starts.len() > 1 {
            (starts[1], starts[starts.len() - 1])
        } else {
            (NOT_APPLICABLE, NOT_APPLICABLE)
        };

        TranscriptParameterRow {
            transcript_id: tx.transcript_id().to_string(),
            start_codon,
            stop_codon,
            length: tx.len(),
            first_splice_site,
            last_splice_site,
            uid: tx.uid(),
        }
    }
}

/// Computes a parameter row for every transcript of the collection located on a chromosome
/// accepted by `filter`.
pub fn summarize(
    collection: &TranscriptCollection,
    filter: &ChromosomeFilter,
) -> Vec<TranscriptParameterRow> {
    let rows: Vec<TranscriptParameterRow> = collection
        .transcripts()
        .filter(|tx| filter.accepts(tx.chrom()))
        .map(TranscriptParameterRow::from_transcript)
        .collect();
    info!(
        "Computed transcript parameters for {} transcripts.",
        rows.len()
    );
    rows
}

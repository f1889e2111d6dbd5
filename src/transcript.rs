use crate::options::Strand;
use crate::reader::TableRecord;
use nutype::nutype;

#[nutype(derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display))]
/// The synthetic id of a transcript record, assigned sequentially at ingestion.
/// It tells apart records that share a transcript id.
pub struct UniqueId(u64);

/// A half-open interval `[start, end)`, either genomic or transcript-local.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: i64,
    pub end: i64,
}

impl Span {
    pub fn new(start: i64, end: i64) -> Span {
        Span { start, end }
    }

    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns `true` if `pos` lies in the span, both boundaries included.
    pub fn contains_closed(&self, pos: i64) -> bool {
        self.start <= pos && pos <= self.end
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TranscriptType {
    Coding,
    NonCoding,
}

impl std::fmt::Display for TranscriptType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TranscriptType::Coding => write!(f, "coding"),
            TranscriptType::NonCoding => write!(f, "non-coding"),
        }
    }
}

/// A transcript together with its exons in transcript-local (spliced, 5'→3') coordinates.
///
/// The model is built once from an annotation record and is immutable afterwards.
/// Its transcript-local exons are index-aligned with the genomic exons:
/// `transcriptomic_exons()[i]` is genomic exon `i` seen from the mRNA, whatever the strand.
///
/// **Notice** that genomic exons are expected in ascending genomic order, as in UCSC tables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptModel {
    transcript_id: String,
    uid: UniqueId,
    gene_id: String,
    chrom: String,
    strand: Strand,
    tx_start: i64,
    tx_end: i64,
    cds_start: i64,
    cds_end: i64,
    genomic_exons: Vec<Span>,
    transcriptomic_exons: Vec<Span>,
    transcript_type: TranscriptType,
    start_codon: Option<i64>,
    stop_codon: Option<i64>,
}

impl From<TableRecord> for TranscriptModel {
    fn from(record: TableRecord) -> TranscriptModel {
        let genomic_exons = record
            .exon_starts
            .iter()
            .zip(record.exon_ends.iter())
            .map(|(&s, &e)| Span::new(s, e))
            .collect();
        TranscriptModel::new(
            record.transcript_id,
            record.uid,
            record.gene_id,
            record.chrom,
            record.strand,
            Span::new(record.tx_start, record.tx_end),
            Span::new(record.cds_start, record.cds_end),
            genomic_exons,
        )
    }
}

impl TranscriptModel {
    /// Builds a transcript and derives its transcript-local exons and coding landmarks.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transcript_id: String,
        uid: UniqueId,
        gene_id: String,
        chrom: String,
        strand: Strand,
        transcription: Span,
        cds: Span,
        genomic_exons: Vec<Span>,
    ) -> TranscriptModel {
        let transcriptomic_exons = transcriptomic_exons(&genomic_exons, strand);
        let (transcript_type, start_codon, stop_codon) =
            coding_landmarks(&genomic_exons, &transcriptomic_exons, strand, cds);

        TranscriptModel {
            transcript_id,
            uid,
            gene_id,
            chrom,
            strand,
            tx_start: transcription.start,
            tx_end: transcription.end,
            cds_start: cds.start,
            cds_end: cds.end,
            genomic_exons,
            transcriptomic_exons,
            transcript_type,
            start_codon,
            stop_codon,
        }
    }

    pub fn transcript_id(&self) -> &str {
        &self.transcript_id
    }

    pub fn uid(&self) -> UniqueId {
        self.uid
    }

    pub fn gene_id(&self) -> &str {
        &self.gene_id
    }

    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    pub fn transcription(&self) -> Span {
        Span::new(self.tx_start, self.tx_end)
    }

    pub fn cds(&self) -> Span {
        Span::new(self.cds_start, self.cds_end)
    }

    pub fn genomic_exons(&self) -> &[Span] {
        &self.genomic_exons
    }

    pub fn transcriptomic_exons(&self) -> &[Span] {
        &self.transcriptomic_exons
    }

    pub fn transcript_type(&self) -> TranscriptType {
        self.transcript_type
    }

    pub fn is_coding(&self) -> bool {
        self.transcript_type == TranscriptType::Coding
    }

    /// The transcript-local position of the start codon, if the transcript is coding.
    pub fn start_codon(&self) -> Option<i64> {
        self.start_codon
    }

    /// The transcript-local position of the stop codon, if the transcript is coding.
    pub fn stop_codon(&self) -> Option<i64> {
        self.stop_codon
    }

    /// The length of the spliced transcript. It is 0 for a transcript without exons.
    pub fn len(&self) -> i64 {
        self.transcriptomic_exons
            .iter()
            .map(|s| s.end)
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Computes the transcript-local coordinates of the exons.
///
/// The exons are visited in biological 5'→3' order, which is ascending genomic order on the
/// positive strand and descending genomic order on the negative strand. Each exon is placed
/// right after the previously visited ones, and its local interval is written at the index of
/// the genomic exon it comes from.
pub fn transcriptomic_exons(genomic_exons: &[Span], strand: Strand) -> Vec<Span> {
    let mut local = vec![Span::default(); genomic_exons.len()];
    let order: Vec<usize> = match strand {
        Strand::Positive => (0..genomic_exons.len()).collect(),
        Strand::Negative => (0..genomic_exons.len()).rev().collect(),
    };

    let mut offset = 0i64;
    for idx in order {
        let exon_len = genomic_exons[idx].len();
        local[idx] = Span::new(offset, offset + exon_len);
        offset += exon_len;
    }
    local
}

/// Locates the start and stop codons in transcript-local coordinates.
///
/// On the negative strand the genomic CDS start is the 3' end of the coding region,
/// so it gives the stop codon and the genomic CDS end gives the start codon.
fn coding_landmarks(
    genomic_exons: &[Span],
    transcriptomic_exons: &[Span],
    strand: Strand,
    cds: Span,
) -> (TranscriptType, Option<i64>, Option<i64>) {
    if cds.start == cds.end {
        return (TranscriptType::NonCoding, None, None);
    }

    let mut start_codon = None;
    let mut stop_codon = None;
    for (g, t) in genomic_exons.iter().zip(transcriptomic_exons.iter()) {
        if g.contains_closed(cds.start) {
            match strand {
                Strand::Positive => start_codon = Some(t.start + cds.start - g.start),
                Strand::Negative => stop_codon = Some(t.start + g.end - cds.start),
            }
        }
        if g.contains_closed(cds.end) {
            match strand {
                Strand::Positive => stop_codon = Some(t.start + cds.end - g.start),
                Strand::Negative => start_codon = Some(t.start + g.end - cds.end),
            }
        }
    }
    (TranscriptType::Coding, start_codon, stop_codon)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_transcript(strand: Strand, exons: &[(i64, i64)], cds: (i64, i64)) -> TranscriptModel {
        let genomic: Vec<Span> = exons.iter().map(|&(s, e)| Span::new(s, e)).collect();
        let tx = Span::new(genomic[0].start, genomic[genomic.len() - 1].end);
        TranscriptModel::new(
            String::from("tx1"),
            UniqueId::new(1),
            String::from("g1"),
            String::from("chr1"),
            strand,
            tx,
            Span::new(cds.0, cds.1),
            genomic,
        )
    }

    #[test]
    fn test_positive_strand() {
        let tx = toy_transcript(Strand::Positive, &[(100, 150), (300, 320)], (120, 310));
        assert_eq!(
            tx.transcriptomic_exons(),
            &[Span::new(0, 50), Span::new(50, 70)]
        );
        assert_eq!(tx.len(), 70);
        assert!(tx.is_coding());
        assert_eq!(tx.start_codon(), Some(20));
        assert_eq!(tx.stop_codon(), Some(60));
    }

    #[test]
    fn test_negative_strand() {
        let tx = toy_transcript(Strand::Negative, &[(100, 150), (300, 320)], (120, 310));
        assert_eq!(
            tx.transcriptomic_exons(),
            &[Span::new(20, 70), Span::new(0, 20)]
        );
        assert_eq!(tx.len(), 70);
        assert_eq!(tx.stop_codon(), Some(50));
        assert_eq!(tx.start_codon(), Some(10));
    }

    #[test]
    fn test_non_coding() {
        for strand in [Strand::Positive, Strand::Negative] {
            let tx = toy_transcript(strand, &[(100, 150), (300, 320)], (320, 320));
            assert_eq!(tx.transcript_type(), TranscriptType::NonCoding);
            assert_eq!(tx.transcript_type().to_string(), "non-coding");
            assert_eq!(tx.start_codon(), None);
            assert_eq!(tx.stop_codon(), None);
        }
    }

    #[test]
    fn test_single_exon_cds() {
        let tx = toy_transcript(Strand::Negative, &[(1000, 1100)], (1010, 1090));
        assert_eq!(tx.transcriptomic_exons(), &[Span::new(0, 100)]);
        assert_eq!(tx.start_codon(), Some(10));
        assert_eq!(tx.stop_codon(), Some(90));
    }

    #[test]
    fn test_tiling_and_alignment() {
        let exons = [(10, 25), (40, 41), (100, 160), (200, 203)];
        for strand in [Strand::Positive, Strand::Negative] {
            let tx = toy_transcript(strand, &exons, (12, 201));

            // each local exon has the length of its genomic exon
            for (g, t) in tx.genomic_exons().iter().zip(tx.transcriptomic_exons()) {
                assert_eq!(g.len(), t.len());
            }

            // the local exons tile [0, len) without gaps or overlaps
            let mut local = tx.transcriptomic_exons().to_vec();
            local.sort_by_key(|s| s.start);
            let mut expected_start = 0;
            for s in local.iter() {
                assert_eq!(s.start, expected_start);
                expected_start = s.end;
            }
            assert_eq!(expected_start, tx.len());
            assert_eq!(tx.len(), 15 + 1 + 60 + 3);
        }
    }

    #[test]
    fn test_strand_symmetry() {
        // mirror the transcript around position 1000 and flip the strand
        let plus = toy_transcript(Strand::Positive, &[(100, 150), (300, 320)], (120, 310));
        let minus = toy_transcript(Strand::Negative, &[(680, 700), (850, 900)], (690, 880));

        let mut mirrored = minus.transcriptomic_exons().to_vec();
        mirrored.reverse();
        assert_eq!(plus.transcriptomic_exons(), mirrored.as_slice());
        assert_eq!(plus.start_codon(), minus.start_codon());
        assert_eq!(plus.stop_codon(), minus.stop_codon());
        assert_eq!(plus.len(), minus.len());
    }

    #[test]
    fn test_from_record() {
        let record = TableRecord {
            uid: UniqueId::new(7),
            transcript_id: String::from("NM_001"),
            chrom: String::from("chr1"),
            strand: Strand::Positive,
            tx_start: 100,
            tx_end: 320,
            cds_start: 120,
            cds_end: 310,
            exon_starts: vec![100, 300],
            exon_ends: vec![150, 320],
            gene_id: String::from("GENE1"),
        };
        let tx = TranscriptModel::from(record);
        assert_eq!(tx.uid(), UniqueId::new(7));
        assert_eq!(tx.transcript_id(), "NM_001");
        assert_eq!(tx.gene_id(), "GENE1");
        assert_eq!(tx.transcription(), Span::new(100, 320));
        assert_eq!(tx.start_codon(), Some(20));
    }
}

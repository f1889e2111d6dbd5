use crate::intervals::{self, GenomicInterval, NamedInterval};
use crate::options::{IntersectMode, MergeOptions, Strand};
use crate::transcript::UniqueId;
use crate::transcriptome::TranscriptCollection;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// A genomic exon of an unambiguous transcript, annotated with its transcript-local start and end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExonKey {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
    pub uid: UniqueId,
    pub local_start: i64,
    pub local_end: i64,
}

impl GenomicInterval for ExonKey {
    fn seqname(&self) -> &str {
        &self.chrom
    }

    fn start(&self) -> i64 {
        self.start
    }

    fn end(&self) -> i64 {
        self.end
    }
}

/// Lists the exons of the transcripts that are the only member of their group in `collection`.
///
/// Transcripts sharing a key with another one are left out, so that every exon key maps
/// back to a single transcript.
pub fn exon_keys(collection: &TranscriptCollection) -> Vec<ExonKey> {
    let keys: Vec<ExonKey> = collection
        .unambiguous()
        .flat_map(|tx| {
            tx.genomic_exons()
                .iter()
                .zip(tx.transcriptomic_exons())
                .map(move |(g, t)| ExonKey {
                    chrom: tx.chrom().to_string(),
                    start: g.start,
                    end: g.end,
                    strand: tx.strand(),
                    uid: tx.uid(),
                    local_start: t.start,
                    local_end: t.end,
                })
        })
        .collect();
    info!(
        "Built {} exon keys; {} ambiguous transcript groups were left out.",
        keys.len(),
        collection.n_ambiguous()
    );
    keys
}

/// An overlap between a genomic peak and an exon key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeakOverlapRecord {
    pub peak_start: i64,
    pub peak_end: i64,
    pub peak_id: String,
    pub exon_start: i64,
    pub exon_end: i64,
    pub strand: Strand,
    pub uid: UniqueId,
    pub exon_local_start: i64,
    pub overlap: i64,
}

impl PeakOverlapRecord {
    /// Translates the overlapping part of the peak into the coordinates of the transcript,
    /// applying the offset that maps the exon onto its transcript-local interval.
    pub fn remap(&self) -> MappedPeakSegment {
        let gap = match self.strand {
            Strand::Positive if self.peak_start > self.exon_start => {
                self.peak_start - self.exon_start
            }
            Strand::Negative if self.peak_end < self.exon_end => self.exon_end - self.peak_end,
            // the peak covers the 5' boundary of the exon
            _ => 0,
        };
        let start = self.exon_local_start + gap;
        MappedPeakSegment {
            uid: self.uid,
            start,
            end: start + self.overlap,
            peak_id: self.peak_id.clone(),
        }
    }
}

/// A peak segment in transcript-local coordinates.
/// After merging, `peak_id` holds the ids of all the merged segments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MappedPeakSegment {
    pub uid: UniqueId,
    pub start: i64,
    pub end: i64,
    pub peak_id: String,
}

/// Intersects the peaks with the exon keys, reporting every pair sharing at least one position.
pub fn overlap_records(peaks: &[NamedInterval], exons: &[ExonKey]) -> Vec<PeakOverlapRecord> {
    intervals::intersect(peaks, exons, IntersectMode::Any)
        .into_iter()
        .map(|pair| {
            let (peak, exon) = (&peaks[pair.a], &exons[pair.b]);
            PeakOverlapRecord {
                peak_start: peak.start,
                peak_end: peak.end,
                peak_id: peak.name.clone(),
                exon_start: exon.start,
                exon_end: exon.end,
                strand: exon.strand,
                uid: exon.uid,
                exon_local_start: exon.local_start,
                overlap: pair.overlap,
            }
        })
        .collect()
}

pub fn remap(records: &[PeakOverlapRecord]) -> Vec<MappedPeakSegment> {
    let segments: Vec<MappedPeakSegment> = records.iter().map(|r| r.remap()).collect();
    info!(
        "Remapped {} peak/exon overlaps to transcript coordinates.",
        segments.len()
    );
    segments
}

/// Merges the segments of each transcript that lie at most `options.distance` apart.
///
/// The result is ordered by unique id, then by start.
pub fn merge_segments(
    segments: Vec<MappedPeakSegment>,
    options: &MergeOptions,
) -> anyhow::Result<Vec<MappedPeakSegment>> {
    let mut by_uid: BTreeMap<UniqueId, Vec<NamedInterval>> = BTreeMap::new();
    for s in segments {
        by_uid
            .entry(s.uid)
            .or_default()
            .push(NamedInterval::new(s.uid.to_string(), s.start, s.end, s.peak_id));
    }

    let mut merged = Vec::new();
    for (uid, group) in by_uid {
        for iv in intervals::sort_and_merge(group, options)? {
            merged.push(MappedPeakSegment {
                uid,
                start: iv.start,
                end: iv.end,
                peak_id: iv.name,
            });
        }
    }
    debug!("Merged the peak segments into {} regions", merged.len());
    Ok(merged)
}

/// Computes the parts of the peaks that lie in exons, for the peaks having at least `fraction`
/// of their length in a single exon. Overlapping and book-ended parts are merged.
pub fn exon_limited_peaks(
    peaks: &[NamedInterval],
    exons: &[ExonKey],
    fraction: f64,
) -> anyhow::Result<Vec<NamedInterval>> {
    let clipped: Vec<NamedInterval> =
        intervals::intersect(peaks, exons, IntersectMode::Fraction(fraction))
            .into_iter()
            .map(|pair| intervals::clip(&peaks[pair.a], &exons[pair.b]))
            .collect();
    intervals::sort_and_merge(clipped, &MergeOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TranscriptKey;
    use crate::reader::TableRecord;

    fn overlap(
        strand: Strand,
        peak: (i64, i64),
        exon: (i64, i64),
        exon_local_start: i64,
        overlap: i64,
    ) -> PeakOverlapRecord {
        PeakOverlapRecord {
            peak_start: peak.0,
            peak_end: peak.1,
            peak_id: String::from("p1"),
            exon_start: exon.0,
            exon_end: exon.1,
            strand,
            uid: UniqueId::new(1),
            exon_local_start,
            overlap,
        }
    }

    fn record(
        uid: u64,
        transcript_id: &str,
        strand: Strand,
        exons: &[(i64, i64)],
    ) -> TableRecord {
        TableRecord {
            uid: UniqueId::new(uid),
            transcript_id: transcript_id.to_string(),
            chrom: String::from("chr1"),
            strand,
            tx_start: exons[0].0,
            tx_end: exons[exons.len() - 1].1,
            cds_start: exons[0].0,
            cds_end: exons[0].0,
            exon_starts: exons.iter().map(|e| e.0).collect(),
            exon_ends: exons.iter().map(|e| e.1).collect(),
            gene_id: String::from("g1"),
        }
    }

    #[test]
    fn test_remap_positive() {
        // the peak starts inside the exon
        let seg = overlap(Strand::Positive, (1050, 1200), (1000, 1100), 200, 50).remap();
        assert_eq!((seg.start, seg.end), (250, 300));

        // the peak starts before the exon
        let seg = overlap(Strand::Positive, (950, 1020), (1000, 1100), 200, 20).remap();
        assert_eq!((seg.start, seg.end), (200, 220));
    }

    #[test]
    fn test_remap_negative() {
        // the peak ends inside the exon
        let seg = overlap(Strand::Negative, (950, 1050), (1000, 1100), 0, 50).remap();
        assert_eq!((seg.start, seg.end), (50, 100));

        // the peak ends after the exon
        let seg = overlap(Strand::Negative, (1080, 1150), (1000, 1100), 30, 20).remap();
        assert_eq!((seg.start, seg.end), (30, 50));
    }

    #[test]
    fn test_exon_keys_skip_ambiguous() {
        let records = vec![
            record(1, "NM_001", Strand::Positive, &[(100, 150), (300, 320)]),
            record(2, "NM_002", Strand::Negative, &[(500, 600)]),
            record(3, "NM_002", Strand::Negative, &[(700, 800)]),
        ];
        let collection = TranscriptCollection::group(records, TranscriptKey::TranscriptId);
        let keys = exon_keys(&collection);
        assert_eq!(keys.len(), 2);
        assert!(keys.iter().all(|k| k.uid == UniqueId::new(1)));
        assert_eq!((keys[1].local_start, keys[1].local_end), (50, 70));
    }

    #[test]
    fn test_peak_across_splice_junction() {
        let records = vec![
            record(1, "NM_001", Strand::Positive, &[(100, 150), (300, 320)]),
            record(2, "NR_002", Strand::Negative, &[(100, 150), (300, 320)]),
        ];
        let collection = TranscriptCollection::group(records, TranscriptKey::TranscriptId);
        let keys = exon_keys(&collection);
        let peaks = vec![NamedInterval::new("chr1", 140, 310, "p1")];

        let overlaps = overlap_records(&peaks, &keys);
        assert_eq!(overlaps.len(), 4);

        let merged = merge_segments(remap(&overlaps), &MergeOptions::new(10)).unwrap();
        assert_eq!(
            merged,
            vec![
                MappedPeakSegment {
                    uid: UniqueId::new(1),
                    start: 40,
                    end: 60,
                    peak_id: String::from("p1;p1"),
                },
                MappedPeakSegment {
                    uid: UniqueId::new(2),
                    start: 10,
                    end: 30,
                    peak_id: String::from("p1;p1"),
                },
            ]
        );
    }

    #[test]
    fn test_merge_tolerance() {
        let seg = |start: i64, end: i64, id: &str| MappedPeakSegment {
            uid: UniqueId::new(3),
            start,
            end,
            peak_id: id.to_string(),
        };
        let merged = merge_segments(
            vec![seg(200, 260, "c"), seg(0, 50, "a"), seg(60, 100, "b")],
            &MergeOptions::new(10),
        )
        .unwrap();
        assert_eq!(merged, vec![seg(0, 100, "a;b"), seg(200, 260, "c")]);
    }

    #[test]
    fn test_exon_limited_peaks() {
        let records = vec![record(
            1,
            "NM_001",
            Strand::Positive,
            &[(100, 150), (300, 320)],
        )];
        let collection = TranscriptCollection::group(records, TranscriptKey::TranscriptId);
        let keys = exon_keys(&collection);
        let peaks = vec![
            // 40 of 60 positions in the first exon
            NamedInterval::new("chr1", 110, 170, "p1"),
            NamedInterval::new("chr1", 120, 140, "p2"),
            // 10 of 100 positions in the second exon
            NamedInterval::new("chr1", 310, 410, "p3"),
        ];
        let limited = exon_limited_peaks(&peaks, &keys, 0.5).unwrap();
        assert_eq!(limited, vec![NamedInterval::new("chr1", 110, 150, "p1;p2")]);
    }
}

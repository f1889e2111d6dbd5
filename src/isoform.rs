use crate::error::TxPeaksError;
use crate::options::SelectionOptions;
use crate::reader::{ExpressionRecord, TableRecord};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{info, warn};

/// Maps each transcript id of the full annotation to its gene and coding status.
///
/// When a transcript id appears several times, the last record wins.
#[derive(Clone, Debug, Default)]
pub struct IsoformIndex {
    genes: HashMap<String, (String, bool)>,
}

impl IsoformIndex {
    pub fn from_records(records: &[TableRecord]) -> IsoformIndex {
        let genes = records
            .iter()
            .map(|r| (r.transcript_id.clone(), (r.gene_id.clone(), r.is_coding())))
            .collect();
        IsoformIndex { genes }
    }

    /// Returns the gene id and the coding flag of the isoform, if annotated.
    pub fn get<T: AsRef<str>>(&self, isoform_id: T) -> Option<(&str, bool)> {
        self.genes
            .get(isoform_id.as_ref())
            .map(|(gene, coding)| (gene.as_str(), *coding))
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}

/// The candidate representative isoform of a gene.
#[derive(Clone, Debug, PartialEq)]
pub struct IsoformChoice {
    pub isoform_id: String,
    pub value: f64,
    pub length: i64,
    pub coding: bool,
}

impl IsoformChoice {
    /// Tells whether this isoform replaces `incumbent` as the representative of their gene.
    ///
    /// The rules apply in order:
    /// 1. the higher expression value wins;
    /// 2. at equal expression, a coding isoform beats a non-coding one;
    /// 3. at equal expression and coding status, the longer isoform wins.
    ///
    /// A full tie keeps the incumbent.
    pub fn beats(&self, incumbent: &IsoformChoice) -> bool {
        if self.value > incumbent.value {
            return true;
        }
        if self.value == incumbent.value {
            if self.coding != incumbent.coding {
                return self.coding;
            }
            return self.length > incumbent.length;
        }
        false
    }
}

/// Picks one representative isoform per gene from an expression table.
#[derive(Clone, Copy, Debug, Default)]
pub struct IsoformSelector {
    options: SelectionOptions,
}

impl IsoformSelector {
    pub fn new(options: SelectionOptions) -> IsoformSelector {
        IsoformSelector { options }
    }

    /// Reduces the expression records to the winning [IsoformChoice] of every gene.
    ///
    /// Isoforms missing from `index` are skipped with a warning.
    ///
    /// ### Errors
    ///
    /// Returns [TxPeaksError::ReferenceMismatch] as soon as more than
    /// `max_unmatched` isoforms are missing from `index`.
    pub fn choices(
        &self,
        records: &[ExpressionRecord],
        index: &IsoformIndex,
    ) -> Result<BTreeMap<String, IsoformChoice>, TxPeaksError> {
        let (winners, unmatched) = records.iter().try_fold(
            (BTreeMap::<String, IsoformChoice>::new(), 0usize),
            |(mut winners, mut unmatched), rec| {
                let Some((gene, coding)) = index.get(&rec.isoform_id) else {
                    warn!(
                        "Isoform {} was not found in the annotation table.",
                        rec.isoform_id
                    );
                    unmatched += 1;
                    if unmatched > self.options.max_unmatched {
                        return Err(TxPeaksError::ReferenceMismatch {
                            unmatched,
                            limit: self.options.max_unmatched,
                        });
                    }
                    return Ok((winners, unmatched));
                };

                let challenger = IsoformChoice {
                    isoform_id: rec.isoform_id.clone(),
                    value: rec.value,
                    length: rec.length,
                    coding,
                };
                match winners.get_mut(gene) {
                    Some(incumbent) => {
                        if challenger.beats(incumbent) {
                            *incumbent = challenger;
                        }
                    }
                    None => {
                        winners.insert(gene.to_string(), challenger);
                    }
                }
                Ok((winners, unmatched))
            },
        )?;

        if unmatched > 0 {
            info!(
                "Skipped {} isoforms missing from the annotation table.",
                unmatched
            );
        }
        Ok(winners)
    }

    /// Returns the ids of the representative isoforms, one per gene of the expression table.
    pub fn select(
        &self,
        records: &[ExpressionRecord],
        index: &IsoformIndex,
    ) -> Result<HashSet<String>, TxPeaksError> {
        let chosen: HashSet<String> = self
            .choices(records, index)?
            .into_values()
            .map(|c| c.isoform_id)
            .collect();
        info!("Chose {} representative isoforms.", chosen.len());
        Ok(chosen)
    }
}

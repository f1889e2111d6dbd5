use crate::error::TxPeaksError;
use crate::options::TranscriptKey;
use crate::reader::TableRecord;
use crate::transcript::TranscriptModel;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// A set of [TranscriptModel]s grouped by a [TranscriptKey].
///
/// Groups keep their members in input order. A group with a single member is an
/// unambiguous transcript for the key; larger groups arise when several records share
/// the key, e.g. the same transcript id placed on two chromosomes.
#[derive(Clone, Debug)]
pub struct TranscriptCollection {
    key: TranscriptKey,
    groups: BTreeMap<String, Vec<TranscriptModel>>,
}

impl TranscriptCollection {
    /// Builds a transcript model from every record and groups the models by `key`.
    ///
    /// ### Example
    ///
    /// ```rust
    /// use txpeaks::options::TranscriptKey;
    /// use txpeaks::transcriptome::TranscriptCollection;
    ///
    /// let collection = TranscriptCollection::group(Vec::new(), TranscriptKey::Gene);
    /// assert!(collection.is_empty());
    /// ```
    pub fn group<I: IntoIterator<Item = TableRecord>>(
        records: I,
        key: TranscriptKey,
    ) -> TranscriptCollection {
        let start = std::time::Instant::now();
        let mut groups: BTreeMap<String, Vec<TranscriptModel>> = BTreeMap::new();
        for record in records {
            let tx = TranscriptModel::from(record);
            trace!(
                "{} ({}): {} exons, {} nt",
                tx.transcript_id(),
                tx.transcript_type(),
                tx.genomic_exons().len(),
                tx.len()
            );
            groups.entry(key_of(&tx, key)).or_default().push(tx);
        }
        debug!(
            "Built {} transcript groups keyed by {} in {:?}",
            groups.len(),
            key,
            start.elapsed()
        );
        TranscriptCollection { key, groups }
    }

    /// Same as [TranscriptCollection::group], with the key given by name
    /// (`gid`, `txid` or `uid`).
    ///
    /// ### Errors
    ///
    /// Returns [TxPeaksError::InvalidKind] for any other name, before any record is processed.
    pub fn group_by_name<I: IntoIterator<Item = TableRecord>>(
        records: I,
        key: &str,
    ) -> Result<TranscriptCollection, TxPeaksError> {
        let key: TranscriptKey = key.parse()?;
        Ok(TranscriptCollection::group(records, key))
    }

    pub fn key(&self) -> TranscriptKey {
        self.key
    }

    /// The number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get<T: AsRef<str>>(&self, key: T) -> Option<&[TranscriptModel]> {
        self.groups.get(key.as_ref()).map(|g| g.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[TranscriptModel])> {
        self.groups.iter().map(|(k, g)| (k.as_str(), g.as_slice()))
    }

    /// Iterates over all transcripts, group by group.
    pub fn transcripts(&self) -> impl Iterator<Item = &TranscriptModel> {
        self.groups.values().flatten()
    }

    /// Iterates over the transcripts that are the only member of their group.
    pub fn unambiguous(&self) -> impl Iterator<Item = &TranscriptModel> {
        self.groups
            .values()
            .filter(|g| g.len() == 1)
            .flatten()
    }

    /// The number of groups holding more than one transcript.
    pub fn n_ambiguous(&self) -> usize {
        self.groups.values().filter(|g| g.len() > 1).count()
    }
}

fn key_of(tx: &TranscriptModel, key: TranscriptKey) -> String {
    match key {
        TranscriptKey::Gene => tx.gene_id().to_string(),
        TranscriptKey::TranscriptId => tx.transcript_id().to_string(),
        TranscriptKey::UniqueId => tx.uid().to_string(),
    }
}

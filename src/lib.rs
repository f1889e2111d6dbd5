//! txpeaks converts genomic peak calls (e.g. from [MACS2](https://github.com/macs3-project/MACS))
//! into transcript-local coordinates, for use in metagene plots along mRNAs.
//!
//! Given an annotation table (the UCSC genePred export of RefSeq, GENCODE or Ensembl gene
//! models) and a transcript quantification (cufflinks `isoforms.fpkm_tracking`), txpeaks picks
//! the most expressed isoform of each gene, derives the spliced coordinates of its exons and of
//! its start and stop codons, and translates the parts of the peaks that lie in exons into the
//! coordinates of the transcript. Nearby peak segments are merged and reported together with the
//! landmarks of their transcript in a [Polars](https://pola.rs/) data frame.
//!
//! The [report::run] function drives the whole conversion. The building blocks are exposed as
//! well: [transcript::TranscriptModel] for the coordinate derivation,
//! [isoform::IsoformSelector] for the choice of isoforms and [remap] for the peak conversion.

pub mod error;
pub mod intervals;
pub mod isoform;
pub mod options;
pub mod parameters;
pub mod reader;
pub mod remap;
pub mod report;
pub mod transcript;
pub mod transcriptome;
pub mod txpeaks_utils;
pub use error::TxPeaksError;
pub use report::{run, PipelineInputs, PipelineOptions, PipelineOutputs};
pub use transcript::{TranscriptModel, UniqueId};
pub use transcriptome::TranscriptCollection;

//! Assembly and writing of the output files, and the end-to-end pipeline.
//!
//! Two files are written for an output prefix `out/sample`:
//!
//! * `out/sample_exonpeaks.bed`: the parts of the peaks lying in exons, for peaks having at
//!   least a given fraction of their length in one exon (`chrom, start, end, names`).
//! * `out/sample_tx.bed`: the merged peak segments in transcript coordinates, joined with the
//!   landmarks of their transcript, in the columns of [REPORT_COLUMNS].
//!
//! Both are TAB separated, without a header.

use crate::intervals::NamedInterval;
use crate::isoform::{IsoformIndex, IsoformSelector};
use crate::options::{
    ExpressionLayout, MergeOptions, ReportOptions, SelectionOptions, TranscriptKey,
};
use crate::parameters::{summarize, TranscriptParameterRow};
use crate::reader::{bed::read_peaks, expression::read_expression, table::read_table};
use crate::remap::{
    exon_keys, exon_limited_peaks, merge_segments, overlap_records, remap, MappedPeakSegment,
};
use crate::transcriptome::TranscriptCollection;
use anyhow::Context;
use polars::prelude::*;
use std::ffi::OsString;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

/// The columns of the transcript-coordinate peak report, in output order.
pub const REPORT_COLUMNS: [&str; 10] = [
    "Tx_ID",
    "Peak_Start",
    "Peak_End",
    "Peak_Names",
    "Peak_Middle",
    "ATG",
    "Stop",
    "Length",
    "FirstSpliceSite",
    "LastSpliceSite",
];

/// Builds the frame of the transcript parameter rows,
/// with the columns `Tx_ID, ATG, Stop, Length, FirstSpliceSite, LastSpliceSite, UID`.
pub fn parameters_df(rows: &[TranscriptParameterRow]) -> anyhow::Result<DataFrame> {
    let df = df!(
        "Tx_ID" => rows.iter().map(|r| r.transcript_id.as_str()).collect::<Vec<&str>>(),
        "ATG" => rows.iter().map(|r| r.start_codon).collect::<Vec<i64>>(),
        "Stop" => rows.iter().map(|r| r.stop_codon).collect::<Vec<i64>>(),
        "Length" => rows.iter().map(|r| r.length).collect::<Vec<i64>>(),
        "FirstSpliceSite" => rows.iter().map(|r| r.first_splice_site).collect::<Vec<i64>>(),
        "LastSpliceSite" => rows.iter().map(|r| r.last_splice_site).collect::<Vec<i64>>(),
        "UID" => rows.iter().map(|r| r.uid.into_inner()).collect::<Vec<u64>>(),
    )?;
    Ok(df)
}

/// Builds the frame of the merged peak segments,
/// with the columns `UID, Peak_Start, Peak_End, Peak_Names, Peak_Middle`.
///
/// `Peak_Middle` is the center of the segment, rounded half to even.
pub fn segments_df(segments: &[MappedPeakSegment]) -> anyhow::Result<DataFrame> {
    let df = df!(
        "UID" => segments.iter().map(|s| s.uid.into_inner()).collect::<Vec<u64>>(),
        "Peak_Start" => segments.iter().map(|s| s.start).collect::<Vec<i64>>(),
        "Peak_End" => segments.iter().map(|s| s.end).collect::<Vec<i64>>(),
        "Peak_Names" => segments.iter().map(|s| s.peak_id.as_str()).collect::<Vec<&str>>(),
        "Peak_Middle" => segments
            .iter()
            .map(|s| ((s.start + s.end) as f64 / 2.0).round_ties_even() as i64)
            .collect::<Vec<i64>>(),
    )?;
    Ok(df)
}

/// Joins the merged segments with the parameter rows of their transcripts.
///
/// Duplicated rows are dropped, segments not wider than `options.min_peak_width` are
/// filtered out, and the rows are sorted by transcript id, then by segment start.
pub fn assemble_report(
    rows: &[TranscriptParameterRow],
    segments: &[MappedPeakSegment],
    options: &ReportOptions,
) -> anyhow::Result<DataFrame> {
    let params = parameters_df(rows)?;
    let peaks = segments_df(segments)?;

    let df = peaks
        .lazy()
        .join(
            params.lazy(),
            [col("UID")],
            [col("UID")],
            JoinArgs::new(JoinType::Inner),
        )
        .unique_stable(None, UniqueKeepStrategy::First)
        .select(REPORT_COLUMNS.iter().map(|&c| col(c)).collect::<Vec<Expr>>())
        .filter((col("Peak_End") - col("Peak_Start")).gt(lit(options.min_peak_width)))
        .sort_by_exprs(
            [col("Tx_ID"), col("Peak_Start")],
            [false, false],
            false, /*nulls last*/
            true,  /*maintain order*/
        )
        .collect()?;

    info!("The report holds {} peak regions.", df.height());
    Ok(df)
}

fn write_tsv<T: AsRef<Path>>(df: &mut DataFrame, file_path: T) -> anyhow::Result<()> {
    let file_path = file_path.as_ref();

    // create the folder if it doesn't exist
    fs::create_dir_all(file_path.parent().with_context(|| {
        format!(
            "Could not get the parent directory of the given output file path {:?}",
            file_path.as_os_str()
        )
    })?)?;

    let file = fs::File::create(file_path)
        .with_context(|| format!("Could not create the output file {:?}", file_path.as_os_str()))?;
    let mut file = BufWriter::with_capacity(4194304, file);
    CsvWriter::new(&mut file)
        .include_header(false)
        .with_separator(b'\t')
        .finish(df)?;
    Ok(())
}

/// Writes the report built by [assemble_report].
pub fn write_tx_report<T: AsRef<Path>>(report: &mut DataFrame, file_path: T) -> anyhow::Result<()> {
    write_tsv(report, file_path)
}

/// Writes named intervals as a BED4 file.
pub fn write_exon_peaks<T: AsRef<Path>>(
    intervals: &[NamedInterval],
    file_path: T,
) -> anyhow::Result<()> {
    let mut df = df!(
        "seqname" => intervals.iter().map(|i| i.seqname.as_str()).collect::<Vec<&str>>(),
        "start" => intervals.iter().map(|i| i.start).collect::<Vec<i64>>(),
        "end" => intervals.iter().map(|i| i.end).collect::<Vec<i64>>(),
        "name" => intervals.iter().map(|i| i.name.as_str()).collect::<Vec<&str>>(),
    )?;
    write_tsv(&mut df, file_path)
}

/// The input files of a run.
#[derive(Clone, Debug)]
pub struct PipelineInputs {
    pub bed_file: PathBuf,
    pub table_file: PathBuf,
    pub expression_file: PathBuf,
}

/// All the knobs of a run. The defaults reproduce the usual behavior of the tool.
#[derive(Clone, Copy, Debug, Default)]
pub struct PipelineOptions {
    pub layout: ExpressionLayout,
    pub selection: SelectionOptions,
    pub report: ReportOptions,
}

/// The files written by [run] and the number of records in each.
#[derive(Clone, Debug)]
pub struct PipelineOutputs {
    pub tx_file: PathBuf,
    pub exon_peaks_file: PathBuf,
    pub n_tx_records: usize,
    pub n_exon_peaks: usize,
}

fn with_suffix<T: AsRef<Path>>(prefix: T, suffix: &str) -> PathBuf {
    let mut s: OsString = prefix.as_ref().as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

/// Runs the whole conversion: picks one isoform per gene, computes the transcript landmarks,
/// converts the peaks to transcript coordinates and writes both output files.
pub fn run<T: AsRef<Path>>(
    inputs: &PipelineInputs,
    output_prefix: T,
    options: &PipelineOptions,
) -> anyhow::Result<PipelineOutputs> {
    options.report.validate()?;
    let tx_file = with_suffix(&output_prefix, "_tx.bed");
    let exon_peaks_file = with_suffix(&output_prefix, "_exonpeaks.bed");

    info!("Choosing the most expressed isoform of each gene...");
    let index = IsoformIndex::from_records(&read_table(&inputs.table_file, None)?);
    let expression = read_expression(&inputs.expression_file, &options.layout)?;
    let selected = IsoformSelector::new(options.selection).select(&expression, &index)?;

    info!("Building the transcriptome of the chosen isoforms...");
    let records = read_table(&inputs.table_file, Some(&selected))?;
    let collection = TranscriptCollection::group(records, TranscriptKey::TranscriptId);

    info!("Computing the transcript parameters...");
    let rows = summarize(&collection, &options.report.chromosome_filter);
    let keys = exon_keys(&collection);

    let peaks: Vec<NamedInterval> = read_peaks(&inputs.bed_file)?
        .into_iter()
        .map(NamedInterval::from)
        .collect();

    info!("Limiting the peaks to exons...");
    let limited = exon_limited_peaks(&peaks, &keys, options.report.exon_fraction)?;
    write_exon_peaks(&limited, &exon_peaks_file)?;

    info!("Converting the peaks to transcript coordinates...");
    let segments = remap(&overlap_records(&peaks, &keys));
    let merged = merge_segments(segments, &MergeOptions::new(options.report.merge_distance))?;

    info!("Writing the transcript peak report...");
    let mut report = assemble_report(&rows, &merged, &options.report)?;
    write_tx_report(&mut report, &tx_file)?;

    Ok(PipelineOutputs {
        tx_file,
        exon_peaks_file,
        n_tx_records: report.height(),
        n_exon_peaks: limited.len(),
    })
}

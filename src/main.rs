use anyhow::Context;
use clap::Parser;
use peak_alloc::PeakAlloc;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use txpeaks::options::{ChromosomeFilter, ExpressionLayout, ReportOptions, SelectionOptions};
use txpeaks::{PipelineInputs, PipelineOptions};

#[global_allocator]
static PEAK_ALLOC: PeakAlloc = PeakAlloc;

/// Convert genomic peak calls into the coordinates of the most expressed transcript of each gene.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// peak calls in BED format (e.g. MACS2 narrowPeak)
    #[arg(long)]
    bed_file: PathBuf,

    /// RefSeq, GENCODE or Ensembl annotation table from the UCSC table browser (may be gzipped)
    #[arg(long)]
    table_file: PathBuf,

    /// cufflinks isoforms.fpkm_tracking file (may be gzipped)
    #[arg(long)]
    expression_file: PathBuf,

    /// prefix of the output files; `_tx.bed` and `_exonpeaks.bed` are appended
    #[arg(long)]
    output_prefix: PathBuf,

    /// peak segments of a transcript at most this far apart are merged
    #[arg(long, default_value_t = 10)]
    merge_distance: i64,

    /// merged peak segments must be wider than this to be reported
    #[arg(long, default_value_t = 50)]
    min_peak_width: i64,

    /// minimal fraction of a peak lying in one exon for the exon-limited peak file
    #[arg(long, default_value_t = 0.5)]
    exon_fraction: f64,

    /// transcripts on chromosomes with longer names (unplaced scaffolds, haplotypes) get no
    /// landmark row
    #[arg(long, default_value_t = 5)]
    max_chrom_name_len: usize,

    /// number of expressed isoforms that may be missing from the annotation table
    #[arg(long, default_value_t = 5)]
    max_unmatched: usize,

    /// log filter, e.g. `info` or `txpeaks=debug`; RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log level `{}`", level))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let inputs = PipelineInputs {
        bed_file: cli.bed_file,
        table_file: cli.table_file,
        expression_file: cli.expression_file,
    };
    let options = PipelineOptions {
        layout: ExpressionLayout::default(),
        selection: SelectionOptions {
            max_unmatched: cli.max_unmatched,
        },
        report: ReportOptions {
            merge_distance: cli.merge_distance,
            min_peak_width: cli.min_peak_width,
            exon_fraction: cli.exon_fraction,
            chromosome_filter: ChromosomeFilter::new(cli.max_chrom_name_len),
        },
    };

    let start = Instant::now();
    let outputs = txpeaks::run(&inputs, &cli.output_prefix, &options)?;
    info!(
        "Wrote {} exon-limited peaks to {:?}",
        outputs.n_exon_peaks,
        outputs.exon_peaks_file.as_os_str()
    );
    info!(
        "Wrote {} transcript peak regions to {:?}",
        outputs.n_tx_records,
        outputs.tx_file.as_os_str()
    );
    info!("Done in {:?}", start.elapsed());

    let peak_mem = PEAK_ALLOC.peak_usage_as_gb();
    info!("Peak Memory usage was {} GB", peak_mem);
    Ok(())
}

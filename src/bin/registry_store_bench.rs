use clap::{Parser, Subcommand};
use registry_store_bench::backend::{Backend, DocumentBackend, MemoryBackend, RelationalBackend};
use registry_store_bench::config::Settings;
use registry_store_bench::harness::Harness;
use registry_store_bench::report;
use registry_store_bench::workloads;
use registry_store_bench::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Subcommand, Debug)]
enum Command {
    /// Time the stock query pairs sequentially on both backends.
    Queries,

    /// Concurrent insert rounds followed by concurrent update rounds, one
    /// artifact set per kind (insert results are rendered and cleared before
    /// the update rounds start; reference keys survive).
    Writes {
        /// Batch sizes, one concurrent round per entry.
        #[arg(long, value_delimiter = ',', default_values_t = vec![100, 1_000, 10_000])]
        counts: Vec<usize>,
    },

    /// Queries, then writes.
    Suite {
        #[arg(long, value_delimiter = ',', default_values_t = vec![100, 1_000, 10_000])]
        counts: Vec<usize>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "registry-store-bench")]
#[command(about = "Relational vs document-store benchmarks for a household registry")]
struct Args {
    /// JSON settings file; environment variables (REGISTRY_BENCH_*) otherwise.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed for record generation.
    #[arg(long, default_value_t = 0, global = true)]
    seed: u64,

    /// Worker-pool size for concurrent phases; overrides the settings value.
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Directory for JSON and SVG artifacts.
    #[arg(long, default_value = "bench-out", global = true)]
    out_dir: PathBuf,

    /// Run against in-memory fakes instead of live backends (smoke testing).
    #[arg(long, default_value_t = false, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    cmd: Command,
}

fn build_backends(
    settings: &Settings,
    dry_run: bool,
) -> Result<(Box<dyn Backend>, Box<dyn Backend>)> {
    if dry_run {
        tracing::info!("dry run: both backends are in-memory fakes");
        return Ok((
            Box::new(MemoryBackend::new()),
            Box::new(MemoryBackend::new()),
        ));
    }
    let relational = RelationalBackend::connect(&settings.relational)?;
    let document = DocumentBackend::connect(&settings.document)?;
    Ok((Box::new(relational), Box::new(document)))
}

fn emit(
    harness: &Harness,
    args: &Args,
    workers: usize,
    name: &str,
) -> Result<()> {
    print!("{}", report::render_table(harness.results()));
    let report = report::build_report(args.seed, workers, harness.results());
    let json_path = report::write_json_report(&args.out_dir, name, &report)?;
    let chart_path = report::write_bar_chart(&args.out_dir, name, harness.results())?;
    tracing::info!(json = %json_path.display(), chart = %chart_path.display(), "artifacts written");
    Ok(())
}

fn run_queries(harness: &mut Harness, args: &Args, workers: usize) -> Result<()> {
    for workload in workloads::registry_queries() {
        harness.register(workload);
    }
    harness.run_sequential()?;
    emit(harness, args, workers, "queries")
}

fn run_writes(harness: &mut Harness, args: &Args, workers: usize, counts: &[usize]) -> Result<()> {
    for &count in counts {
        harness.run_concurrent_insert(count, workers)?;
    }
    emit(harness, args, workers, "inserts")?;
    harness.clear();

    for &count in counts {
        harness.run_concurrent_update(count, workers)?;
    }
    emit(harness, args, workers, "updates")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?;
    let workers = args.workers.unwrap_or(settings.workers);

    let (relational, document) = build_backends(&settings, args.dry_run)?;
    let mut harness = Harness::new(relational, document, args.seed);

    match &args.cmd {
        Command::Queries => run_queries(&mut harness, &args, workers)?,
        Command::Writes { counts } => run_writes(&mut harness, &args, workers, counts)?,
        Command::Suite { counts } => {
            run_queries(&mut harness, &args, workers)?;
            harness.clear();
            run_writes(&mut harness, &args, workers, counts)?;
        }
    }

    Ok(())
}

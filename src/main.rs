//! `matbench` command line.
//!
//! ```bash
//! # Write the testing dataset into ./data
//! matbench generate -s testing --data-dir data
//!
//! # Time the blocked kernel on it with 64x64 tiles
//! matbench run -i opt -s testing -b 64 --data-dir data
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use matbench::config::DEFAULT_BLOCK_SIZE;
use matbench::generate::{generate, DEFAULT_SEED};
use matbench::measure::{DEFAULT_INNER, DEFAULT_REPEATS};
use matbench::stats::DEFAULT_THRESHOLD;
use matbench::verify::DEFAULT_TOLERANCE;
use matbench::{DatasetSize, Harness, HarnessConfig, KernelKind};

/// Benchmark matrix-multiplication kernels
#[derive(Parser, Debug)]
#[command(name = "matbench")]
#[command(version)]
struct Cli {
    /// Log at DEBUG level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Time one kernel on a dataset and verify its output
    Run(RunArgs),
    /// Write random operands and their reference product
    Generate(GenerateArgs),
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Kernel to benchmark
    #[arg(short = 'i', long = "impl", value_enum)]
    kernel: KernelKind,

    /// Dataset size
    #[arg(short, long, value_enum, default_value_t = DatasetSize::Native)]
    size: DatasetSize,

    /// Number of timing samples
    #[arg(long, default_value_t = DEFAULT_REPEATS)]
    nruns: usize,

    /// Outlier threshold in standard deviations
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    nstdevs: f64,

    /// Worker threads for the parallel kernel
    #[arg(short = 'n', long, default_value_t = 1)]
    nthreads: usize,

    /// First core to run on
    #[arg(short, long, default_value_t = 0)]
    cpu: usize,

    /// Tile edge for blocked kernels
    #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
    block: usize,

    /// Kernel calls per timing sample
    #[arg(short = 'w', long, default_value_t = DEFAULT_INNER)]
    inner: usize,

    /// Absolute tolerance against the reference
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    tolerance: f32,

    /// Dump the last output to <size>_dump.csv
    #[arg(short, long)]
    dump: bool,

    /// Directory holding <size>_test.csv and <size>_golden.csv
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Directory for the runtime report and dumps
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Skip priority, FIFO and affinity requests
    #[arg(long)]
    no_sched: bool,
}

impl From<RunArgs> for HarnessConfig {
    fn from(args: RunArgs) -> Self {
        HarnessConfig {
            kernel: args.kernel,
            size: args.size,
            nruns: args.nruns,
            nstdevs: args.nstdevs,
            threads: args.nthreads,
            cpu: args.cpu,
            block_size: args.block,
            inner: args.inner,
            tolerance: args.tolerance,
            dump: args.dump,
            data_dir: args.data_dir,
            output_dir: args.output_dir,
            sched: !args.no_sched,
        }
    }
}

#[derive(clap::Args, Debug)]
struct GenerateArgs {
    /// Dataset sizes to write (all when omitted)
    #[arg(short, long, value_enum)]
    size: Vec<DatasetSize>,

    /// Random seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Output directory
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .init();
}

fn run(args: RunArgs) -> Result<()> {
    let harness = Harness::from_config(HarnessConfig::from(args))
        .context("invalid benchmark configuration")?;
    let summary = harness.run().with_context(|| {
        let config = harness.config();
        format!(
            "benchmark of {} on {} failed",
            config.kernel.kernel_name(),
            config.size
        )
    })?;

    let status = if summary.outcome.is_trusted() {
        "verified"
    } else {
        "UNVERIFIED"
    };
    println!("{}", summary.outcome);
    println!("Runtimes ({status}): {} ns", summary.statistics.mean);
    Ok(())
}

fn generate_all(args: GenerateArgs) -> Result<()> {
    let sizes = if args.size.is_empty() {
        DatasetSize::ALL.to_vec()
    } else {
        args.size
    };

    std::fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("cannot create {}", args.data_dir.display()))?;

    for size in sizes {
        let files = generate(size, args.seed, &args.data_dir)
            .with_context(|| format!("generating the {size} dataset failed"))?;
        info!(input = %files.input.display(), golden = %files.golden.display(), "done");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run(args) => run(args),
        Command::Generate(args) => generate_all(args),
    }
}

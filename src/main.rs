use clap::Parser;
use std::path::PathBuf;

use mashalign::kernel::KernelKind;
use mashalign::params::Params;
use mashalign::pipeline;
use mashalign::refindex::ReferenceIndex;
use mashalign::utils;

#[derive(Parser)]
#[command(name = "mashalign")]
#[command(about = "Base-level alignment of mashmap approximate mappings", long_about = None)]
#[command(version)]
struct Cli {
    /// Reference FASTA file(s), plain or gzipped
    #[arg(short = 'r', long = "reference", value_name = "FASTA", required = true)]
    reference: Vec<PathBuf>,

    /// Query FASTA file(s), ordered consistently with the mapping file
    #[arg(short = 'q', long = "query", value_name = "FASTA", required = true)]
    query: Vec<PathBuf>,

    /// Mashmap mapping file (PAF), grouped by query id in FASTA order
    #[arg(short = 'i', long = "mappings", value_name = "PAF")]
    mappings: PathBuf,

    /// Output file for alignment records
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: PathBuf,

    /// Target minimum percent identity; 0 leaves the edit bound open
    #[arg(short = 'p', long = "percent-identity", value_name = "FLOAT", default_value = "0")]
    percent_identity: f32,

    /// Alignment backend
    #[arg(long, value_name = "KERNEL", default_value = "edit", value_parser = ["edit", "wfa"])]
    kernel: String,

    /// Number of worker threads (default: all available cores)
    #[arg(short = 't', long, value_name = "INT")]
    threads: Option<usize>,

    /// Verbose level: 1=error, 2=warning, 3=message, 4+=debugging
    #[arg(short = 'v', long, value_name = "INT", default_value = "3")]
    verbosity: i32,
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbosity {
        v if v <= 1 => log::LevelFilter::Error,
        2 => log::LevelFilter::Warn,
        3 => log::LevelFilter::Info,
        4 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    if !(0.0..=100.0).contains(&cli.percent_identity) {
        log::error!(
            "Percent identity {} is outside [0, 100]",
            cli.percent_identity
        );
        std::process::exit(1);
    }

    let mut num_threads = cli.threads.unwrap_or_else(num_cpus::get);
    if num_threads < 1 {
        log::warn!("Invalid thread count {}, using 1 thread", num_threads);
        num_threads = 1;
    }
    let max_threads = num_cpus::get() * 2;
    if num_threads > max_threads {
        log::warn!(
            "Thread count {} exceeds recommended maximum {}, capping at {}",
            num_threads,
            max_threads,
            max_threads
        );
        num_threads = max_threads;
    }

    let kernel = match cli.kernel.as_str() {
        "edit" => KernelKind::EditDistance,
        "wfa" => KernelKind::Wavefront,
        other => {
            log::error!("Unknown alignment kernel {:?}", other);
            std::process::exit(1);
        }
    };

    let params = Params {
        ref_files: cli.reference,
        query_files: cli.query,
        mappings: cli.mappings,
        output: cli.output,
        threads: num_threads,
        percentage_identity: cli.percent_identity,
        kernel,
    };

    let thread_word = if num_threads == 1 { "thread" } else { "threads" };
    log::info!("Using {} worker {}", num_threads, thread_word);
    if params.percentage_identity > 0.0 {
        log::info!(
            "Bounding edit distance at {}% identity",
            params.percentage_identity
        );
    }

    let t_start = utils::realtime();

    let index = match ReferenceIndex::build(&params.ref_files) {
        Ok(index) => index,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };
    log::info!(
        "Reference index ready: {} sequences, {} bp",
        index.len(),
        index.total_bases()
    );

    let stats = match pipeline::compute_alignments(&params, &index) {
        Ok(stats) => stats,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    log::info!(
        "Aligned {} of {} mappings ({} rejected by the kernel)",
        stats.written,
        stats.enqueued,
        stats.rejected
    );
    log::info!(
        "Real time: {:.3} sec; CPU: {:.3} sec",
        utils::realtime() - t_start,
        utils::cputime()
    );
}

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;
use wiktionary_renderer::config::DEFAULT_WORKERS;
use wiktionary_renderer::language::Language;
use wiktionary_renderer::run::{self, FetchConfig};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "wiktionary-renderer")]
#[command(about = "Render per-language Wiktionary sections from a dump through the parse API")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the dump and render every matching section to <revision_id>.html
    Fetch(FetchArgs),
    /// List matching sections without rendering them
    Scan(ScanArgs),
}

#[derive(Args)]
struct FetchArgs {
    /// Path to the Wiktionary dump (.xml or .xml.bz2)
    #[arg(short, long)]
    dump: PathBuf,

    /// Language pair: <wiki language>-<entry language>
    #[arg(short, long, value_enum)]
    lang: Language,

    /// Parse API endpoint, e.g. https://en.wiktionary.org/w/api.php (repeat for fallbacks)
    #[arg(short, long = "url", required = true)]
    urls: Vec<String>,

    /// Output directory for rendered HTML files
    #[arg(short, long, default_value = "out")]
    out: PathBuf,

    /// Number of concurrent render workers
    #[arg(short, long, default_value_t = DEFAULT_WORKERS, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    workers: usize,

    /// Stop after this many matched entries (for testing)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    limit: Option<u64>,
}

#[derive(Args)]
struct ScanArgs {
    /// Path to the Wiktionary dump (.xml or .xml.bz2)
    #[arg(short, long)]
    dump: PathBuf,

    /// Language pair: <wiki language>-<entry language>
    #[arg(short, long, value_enum)]
    lang: Language,

    /// Stop after this many matched entries
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    limit: Option<u64>,
}

fn run_fetch(args: FetchArgs) -> Result<()> {
    let config = FetchConfig {
        dump: args.dump,
        output_dir: args.out,
        language: args.lang,
        endpoints: args.urls,
        workers: args.workers,
        limit: args.limit,
    };

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers.clamp(2, 16))
        .thread_name("wiktionary-render-worker")
        .enable_io()
        .enable_time()
        .build()?;
    let stats = rt.block_on(run::run_fetch(config))?;
    info!(
        written = stats.written(),
        skipped = stats.skipped(),
        failed = stats.render_failed(),
        "Fetch finished"
    );
    Ok(())
}

fn run_scan(args: ScanArgs) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    run::run_scan(&args.dump, args.lang, args.limit, &mut out)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let result = match cli.command {
        Commands::Fetch(args) => run_fetch(args),
        Commands::Scan(args) => run_scan(args),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

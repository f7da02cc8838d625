//! Small command-line driver for exercising a buffer pool.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use pagepool::{BufferPool, Error, PageId, ReplacementStrategy};

#[derive(Parser)]
#[command(name = "bufmgr-cli", about = "Drive a paged buffer pool from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a fresh, single-page page file.
    Create { file: PathBuf },
    /// Pin and unpin `n` sequential pages through a pool, printing final
    /// statistics.
    Bench {
        file: PathBuf,
        frames: usize,
        strategy: StrategyArg,
        n: i64,
    },
    /// Open a pool against an existing page file and print its (empty)
    /// initial shape.
    Stats {
        file: PathBuf,
        frames: usize,
        strategy: StrategyArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Fifo,
    Lru,
    Lfu,
    Clock,
}

impl StrategyArg {
    fn into_strategy(self) -> ReplacementStrategy {
        match self {
            Self::Fifo => ReplacementStrategy::Fifo,
            Self::Lru => ReplacementStrategy::Lru,
            Self::Lfu => ReplacementStrategy::Lfu,
            Self::Clock => ReplacementStrategy::Clock,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_target(false).init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), Error> {
    match command {
        Command::Create { file } => {
            pagepool::PageFileStore::create(&file)?;
            println!("created {}", file.display());
            Ok(())
        }
        Command::Bench {
            file,
            frames,
            strategy,
            n,
        } => {
            let pool = BufferPool::init(&file, frames, strategy.into_strategy())?;
            for i in 0..n {
                let handle = pool.pin(PageId::new(i % n.max(1)))?;
                pool.unpin(handle.page_id())?;
            }
            println!("{}", pool.pool_content_string());
            print_stats(&pool);
            Ok(())
        }
        Command::Stats {
            file,
            frames,
            strategy,
        } => {
            let pool = BufferPool::init(&file, frames, strategy.into_strategy())?;
            println!("{}", pool.pool_content_string());
            print_stats(&pool);
            Ok(())
        }
    }
}

fn print_stats(pool: &BufferPool) {
    let stats = pool.stats();
    println!(
        "reads={} writes={} hits={} misses={} evictions={} hit_rate={:.3}",
        stats.num_read_io,
        stats.num_write_io,
        stats.cache_hits,
        stats.cache_misses,
        stats.evictions,
        stats.hit_rate(),
    );
}

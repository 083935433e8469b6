use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::exit;
use std::time::Duration;

use advlock::{
    acquire_exclusive, acquire_exclusive_timeout, release, try_acquire_exclusive, LockError,
    LockHandle, LockResult,
};
use anyhow::Context;
use log::{debug, LevelFilter};

/// Exit status when someone else holds the lock.
const CONTENDED_EXIT_CODE: i32 = 3;

#[derive(clap::Subcommand)]
enum Commands {
    /// Print the lock strategy this build uses.
    Strategy,
    /// Try once to lock a file, then release it.
    Probe { path: PathBuf },
    /// Lock a file and hold it until stdin is closed.
    Hold {
        path: PathBuf,
        /// Wait for the lock instead of failing when it's taken.
        #[arg(long, conflicts_with = "timeout_ms")]
        wait: bool,
        /// Keep retrying for this long before giving up.
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

#[derive(clap::Parser)]
struct Cli {
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

fn open(path: &Path) -> anyhow::Result<File> {
    OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .with_context(|| format!("opening {:?}", path))
}

fn contended_or(res: LockResult, path: &Path) -> anyhow::Result<()> {
    match res {
        Err(LockError::WouldBlock) => {
            println!("would block");
            exit(CONTENDED_EXIT_CODE)
        }
        res => res.with_context(|| format!("locking {:?}", path)),
    }
}

fn main() -> anyhow::Result<()> {
    let cli: Cli = clap::Parser::parse();
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .parse_default_env()
        .init();
    use Commands::*;
    match cli.command {
        Strategy => {
            let strategy = advlock::Strategy::PLATFORM;
            println!("{} (locks belong to the {})", strategy, strategy.scope());
            Ok(())
        }
        Probe { path } => {
            let file = open(&path)?;
            let handle = LockHandle::of(&file);
            contended_or(try_acquire_exclusive(handle), &path)?;
            println!("acquired");
            release(handle).context("releasing")?;
            Ok(())
        }
        Hold {
            path,
            wait,
            timeout_ms,
        } => {
            let file = open(&path)?;
            let handle = LockHandle::of(&file);
            let res = match (wait, timeout_ms) {
                (true, _) => acquire_exclusive(handle),
                (false, Some(ms)) => acquire_exclusive_timeout(handle, Duration::from_millis(ms)),
                (false, None) => try_acquire_exclusive(handle),
            };
            contended_or(res, &path)?;
            println!("locked");
            io::stdout().flush()?;
            debug!("holding lock on {:?} until stdin closes", path);
            io::stdin().read_to_end(&mut Vec::new())?;
            release(handle).context("releasing")?;
            Ok(())
        }
    }
}

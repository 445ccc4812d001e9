// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod source;
pub mod types;
pub mod watch;

use anyhow::Result;
use tracing::{debug, info};

pub use crate::config::SourceConfig;
pub use crate::errors::DirChangesError;
pub use crate::source::{ChangeSubscription, DirectoryChangeSource};
pub use crate::types::{ChangeKind, ChangeRecord, OverflowPolicy};

use crate::cli::CliArgs;
use crate::config::{load_from_path, RawSourceConfig};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file, then CLI overrides)
/// - the directory change source
/// - a consumer loop that requests `--batch` records at a time and prints
///   them
/// - Ctrl-C handling (cancels the subscription)
pub async fn run(args: CliArgs) -> Result<()> {
    let file_cfg = match args.config {
        Some(ref path) => load_from_path(path)?.source,
        None => RawSourceConfig::default(),
    };
    let config = SourceConfig::try_from(file_cfg.merge(args.source_overrides()))?;

    if args.dry_run {
        print_dry_run(&config, &args);
        return Ok(());
    }

    if args.count == Some(0) {
        return Ok(());
    }

    let source = DirectoryChangeSource::new(config);
    let mut subscription = source.subscribe()?;

    let batch = args.batch.max(1);
    let mut remaining = args.count;
    let mut outstanding = 0u64;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        if outstanding == 0 {
            let n = remaining.map_or(batch, |r| r.min(batch));
            subscription.request(n);
            outstanding = n;
            debug!(requested = n, "requested next batch");
        }

        tokio::select! {
            item = subscription.next() => match item {
                Some(Ok(record)) => {
                    println!("{record}");
                    outstanding -= 1;
                    if let Some(r) = remaining.as_mut() {
                        *r -= 1;
                        if *r == 0 {
                            info!("printed requested number of records");
                            break;
                        }
                    }
                }
                Some(Err(err)) => {
                    subscription.wait_released().await;
                    return Err(err.into());
                }
                None => break,
            },
            _ = &mut ctrl_c => {
                info!("Ctrl-C received; cancelling");
                break;
            }
        }
    }

    subscription.cancel();
    subscription.wait_released().await;
    Ok(())
}

/// Simple dry-run output: print the resolved source settings.
fn print_dry_run(config: &SourceConfig, args: &CliArgs) {
    println!("dirchanges dry-run");
    println!("  directory       = {}", config.directory().display());
    println!("  poll_interval   = {:?}", config.poll_interval());
    println!("  max_buffer_size = {}", config.max_buffer_size());
    println!("  overflow_policy = {:?}", config.overflow_policy());
    println!("  backend         = {:?}", config.backend());
    println!("  batch           = {}", args.batch.max(1));
    if let Some(count) = args.count {
        println!("  count           = {count}");
    }

    debug!("dry-run complete (nothing watched)");
}

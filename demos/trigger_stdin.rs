//! Fire bound triggers from stdin.
//!
//! Loads a bindings file, builds one pool and one dispatcher for the whole
//! run, and fires the trigger named on each input line. Stands in for an
//! OS keyboard hook.
//!
//! Usage:
//!
//! ```text
//! cargo run --example trigger_stdin -- bindings.json [--debug] [--no-retry]
//! ```

mod common;

use std::sync::Arc;

use anyhow::{Context, Result};
use cmnd_link::{Bindings, ConnectionPool, TriggerDispatcher};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = common::Args::parse();
    common::init_logging(args.debug);

    let path = args
        .positional
        .first()
        .context("usage: trigger_stdin <bindings.json> [--debug] [--no-retry]")?;
    let bindings = Bindings::from_path(path)?;

    let pool = Arc::new(ConnectionPool::new());
    let dispatcher =
        TriggerDispatcher::new(Arc::clone(&pool), bindings.endpoint().clone())
            .with_retry(!args.no_retry);
    for binding in &bindings {
        info!(trigger = %binding.trigger, message = %binding.message, "Binding");
        dispatcher.register(binding.trigger.clone(), Arc::clone(&binding.message));
    }

    info!(endpoint = %dispatcher.endpoint(), "Type a trigger name and press Enter (Ctrl+D to quit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let trigger = line.trim();
                if !trigger.is_empty() {
                    dispatcher.spawn_fire(trigger);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let closed = dispatcher.shutdown().await;
    let stats = pool.stats();
    info!(closed, dials = stats.dials, writes = stats.write_attempts, failures = stats.write_failures, "Done");

    Ok(())
}

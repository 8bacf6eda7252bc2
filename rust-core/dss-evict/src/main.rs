// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! dss-evict: report, and optionally delete, operational intents and
//! subscriptions that expired more than a TTL ago.
//!
//! ```text
//! dss-evict --store /var/lib/dss/dss.redb --ttl 112d          # dry run
//! dss-evict --store /var/lib/dss/dss.redb --ttl 30d --delete
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use dss_scd::{ScdConfig, ScdService, DEFAULT_EVICTION_TTL};
use dss_storage::{RedbStore, StoreConfig, DEFAULT_MAX_RETRIES};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "dss-evict", version, about)]
struct Args {
    /// Path of the redb store file.
    #[arg(long, env = "DSS_STORE_PATH")]
    store: PathBuf,

    /// Age past expiry after which an entity is evicted (`90m`, `36h`,
    /// `112d`; bare numbers are seconds).
    #[arg(long, env = "DSS_EVICT_TTL", value_parser = parse_ttl, default_value = "112d")]
    ttl: Duration,

    /// Delete what was found instead of only listing it.
    #[arg(long)]
    delete: bool,

    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    max_retries: u32,
}

fn parse_ttl(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    let (digits, unit) = match raw.find(|c: char| !c.is_ascii_digit()) {
        Some(split) => raw.split_at(split),
        None => (raw, "s"),
    };
    let value: u64 = digits
        .parse()
        .with_context(|| format!("invalid TTL `{raw}`"))?;
    let seconds = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        other => bail!("unknown TTL unit `{other}` (use s, m, h or d)"),
    };
    value
        .checked_mul(seconds)
        .map(Duration::from_secs)
        .with_context(|| format!("TTL `{raw}` is too large"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if args.ttl < DEFAULT_EVICTION_TTL {
        warn!(
            ttl_secs = args.ttl.as_secs(),
            default_secs = DEFAULT_EVICTION_TTL.as_secs(),
            "TTL is shorter than the default"
        );
    }

    let store = RedbStore::open_with_config(
        &args.store,
        StoreConfig {
            max_retries: args.max_retries,
        },
    )
    .with_context(|| format!("opening store {}", args.store.display()))?;
    let service = ScdService::new(store, ScdConfig::default());

    let report = service
        .evict_older_than(args.ttl, args.delete)
        .await
        .context("eviction failed")?;
    info!(
        operational_intents = report.operational_intents.len(),
        subscriptions = report.subscriptions.len(),
        orphaned_subscriptions = report.orphaned_subscriptions.len(),
        deleted = report.deleted,
        "eviction finished"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

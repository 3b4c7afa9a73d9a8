//! Operator commands against the configured toolcrib database.
//!
//! ```text
//! toolcrib-admin dashboard          current totals
//! toolcrib-admin history inward     inward ledger
//! toolcrib-admin history outward    outward ledger
//! toolcrib-admin check              compare aggregate with ledger
//! toolcrib-admin rebuild            recompute aggregate from ledger
//! ```
//!
//! Output is JSON on stdout; logs go to stderr.

use anyhow::{Context, bail};
use serde::Serialize;

use toolcrib_infra::{App, AppConfig};

const USAGE: &str = "usage: toolcrib-admin <dashboard | history inward|outward | check | rebuild>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = AppConfig::load().context("failed to load configuration")?;
    toolcrib_observability::init(config.log.format);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    // `check` must see the stored aggregate as it is, not after a startup repair.
    if matches!(args.as_slice(), ["check"]) {
        config.inventory.reconcile_on_startup = false;
    }

    let app = App::open(&config).await.context("failed to open storage")?;

    match args.as_slice() {
        ["dashboard"] => print(&app.dashboard().await?),
        ["history", "inward"] => print(&app.inward_history().await?),
        ["history", "outward"] => print(&app.outward_history().await?),
        ["check"] => {
            let report = app.check_consistency().await?;
            print(&report)?;
            if !report.is_consistent() {
                bail!("{} insert(s) drift from the ledger", report.drift.len());
            }
            Ok(())
        }
        ["rebuild"] => print(&app.rebuild_aggregate().await?),
        _ => bail!(USAGE),
    }
}

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

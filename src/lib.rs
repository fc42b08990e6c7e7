//! One-shot rename migration for the Checkmk Grafana datasource plugin.
//!
//! Grafana keeps datasource connections and dashboards in a SQLite
//! database. When the plugin id changed from `tribe-29-checkmk-datasource`
//! to `tribe29-checkmk-datasource`, existing installations kept the old id
//! in two places:
//!
//! - `data_source` rows, whose `type` column carries the plugin id
//! - dashboard JSON documents, which embed the id in every panel and
//!   target datasource reference
//!
//! This tool rewrites both inside a single transaction. Every dashboard it
//! touches gets a new `dashboard_version` row, so the rename appears in
//! the dashboard's history like any other edit and can be inspected or
//! restored from the Grafana UI.
//!
//! Stop Grafana before running this; the tool assumes exclusive access to
//! the database file and commits once at the end. On any error nothing is
//! committed and the database is left exactly as it was.
//!
//! ```bash
//! grafana-plugin-rename /var/lib/grafana/grafana.db
//! ```

pub mod dashboard;
pub mod datasource;
pub mod db;
pub mod error;

use clap::Parser;
use colored::Colorize;
use rusqlite::Connection;
use std::path::PathBuf;

/// Plugin id written by releases before the rename.
pub const OLD_PLUGIN_ID: &str = "tribe-29-checkmk-datasource";
/// Plugin id expected by current releases.
pub const NEW_PLUGIN_ID: &str = "tribe29-checkmk-datasource";

#[derive(Parser, Debug)]
#[clap(
    name = "grafana-plugin-rename",
    version = env!("CARGO_PKG_VERSION"),
    about = "datasource plugin renamer"
)]
struct Cli {
    /// Grafana sqlite database
    #[clap(value_name = "DB")]
    db: PathBuf,
}

/// Row counts reported by one migration run.
#[derive(Debug)]
pub struct MigrationSummary {
    /// Dashboards whose document was rewritten.
    pub dashboards: usize,
    /// `data_source` rows renamed.
    pub datasources: usize,
}

/// Runs both migrators against an open connection inside one transaction.
///
/// The dashboard walk runs first, the datasource bulk update second; the
/// two are independent, and neither is visible to outside readers until
/// the single commit at the end. If either step fails the transaction is
/// dropped uncommitted and no partial state persists.
pub fn migrate(conn: &mut Connection) -> Result<MigrationSummary, error::RenameError> {
    let tx = conn.transaction()?;
    let dashboards = dashboard::migrate_dashboards(&tx)?;
    let datasources = datasource::migrate_datasources(&tx)?;
    tx.commit()?;
    Ok(MigrationSummary {
        dashboards,
        datasources,
    })
}

pub fn run() -> Result<(), error::RenameError> {
    let cli = Cli::parse();

    let mut conn = db::db_connect(&cli.db)?;
    let summary = migrate(&mut conn)?;

    println!(
        "{} {} dashboard(s) rewritten",
        "✓".bright_green(),
        summary.dashboards
    );
    println!(
        "{} {} data_source row(s) renamed",
        "✓".bright_green(),
        summary.datasources
    );
    Ok(())
}

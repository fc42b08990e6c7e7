//! Datasource migrator: one set-based rename of matching connection rows.

use crate::error::RenameError;
use crate::{NEW_PLUGIN_ID, OLD_PLUGIN_ID};
use chrono::Local;
use rusqlite::{Connection, params};

// Full datetime precision, unlike the second-truncated dashboard form.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Renames every `data_source` row whose `type` equals the old plugin id
/// and stamps `updated`. Returns the number of rows changed; zero matching
/// rows is a valid, silent outcome.
pub fn migrate_datasources(conn: &Connection) -> Result<usize, RenameError> {
    let now = Local::now().format(TIME_FORMAT).to_string();
    let updated = conn.execute(
        "UPDATE data_source SET type = ?1, updated = ?2 WHERE type = ?3",
        params![NEW_PLUGIN_ID, now, OLD_PLUGIN_ID],
    )?;
    Ok(updated)
}

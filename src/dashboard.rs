//! Dashboard migrator.
//!
//! Walks every `dashboard` row, rewrites embedded datasource plugin ids
//! inside the stored JSON document, and records the rewrite in the
//! dashboard's version history so it shows up like any other edit.
//!
//! The document is deserialized into a typed model rather than probed with
//! dynamic key lookups. Fields this tool does not care about are captured
//! in flattened maps and written back unchanged; only `datasource.type`
//! occurrences of the old plugin id and the document `version` are
//! modified.

use crate::error::RenameError;
use crate::{NEW_PLUGIN_ID, OLD_PLUGIN_ID};
use chrono::Local;
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message stamped on every `dashboard_version` row this tool creates.
pub const MIGRATION_MESSAGE: &str = "datasource plugin renamer";

/// `dashboard_version.restored_from` value meaning "not a restore".
const NOT_A_RESTORE: i64 = 0;

/// Timestamp format Grafana stores in `dashboard.updated` and
/// `dashboard_version.created`: local time, second precision.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A dashboard `data` document, typed down to the fields this migration
/// touches. `version` and `panels` (and `targets` per panel) must exist;
/// their absence fails deserialization and aborts the run.
#[derive(Serialize, Deserialize, Debug)]
pub struct DashboardDoc {
    version: i64,
    panels: Vec<Panel>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug)]
struct Panel {
    datasource: Option<DatasourceRef>,
    targets: Vec<Target>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug)]
struct Target {
    datasource: Option<DatasourceRef>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

/// A panel or target datasource reference. `type` is optional here so a
/// missing key surfaces as a modeled error with the exact position in the
/// document, not as a generic deserialization failure.
#[derive(Serialize, Deserialize, Debug)]
struct DatasourceRef {
    r#type: Option<String>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

/// Rewrites every old-plugin-id occurrence in the document and returns the
/// number of references renamed.
///
/// Panels are visited in stored order, each panel's own datasource before
/// its targets, targets in stored order. Every reference is visited; the
/// walk never short-circuits on the first match.
pub fn rename_plugin_refs(
    doc: &mut DashboardDoc,
    dashboard_id: i64,
) -> Result<usize, RenameError> {
    let mut renamed = 0;
    for (panel_no, panel) in doc.panels.iter_mut().enumerate() {
        let at = format!("dashboard {dashboard_id} panel {panel_no}");
        if rename_datasource(panel.datasource.as_mut(), &at)? {
            renamed += 1;
        }
        for (target_no, target) in panel.targets.iter_mut().enumerate() {
            let at = format!("dashboard {dashboard_id} panel {panel_no} target {target_no}");
            if rename_datasource(target.datasource.as_mut(), &at)? {
                renamed += 1;
            }
        }
    }
    Ok(renamed)
}

fn rename_datasource(
    slot: Option<&mut DatasourceRef>,
    at: &str,
) -> Result<bool, RenameError> {
    let datasource = slot
        .ok_or_else(|| RenameError::MalformedDashboard(format!("{at}: missing datasource")))?;
    let plugin = datasource
        .r#type
        .as_mut()
        .ok_or_else(|| RenameError::MalformedDashboard(format!("{at}: datasource has no type")))?;
    if plugin == OLD_PLUGIN_ID {
        *plugin = NEW_PLUGIN_ID.to_owned();
        return Ok(true);
    }
    Ok(false)
}

/// Scans all dashboards and rewrites those that reference the old plugin
/// id. Returns the number of dashboards rewritten.
///
/// A dashboard with no occurrences is left completely untouched: no write,
/// no version bump. A rewritten dashboard gets `version + 1` in both the
/// document and the live row, plus one appended `dashboard_version` row
/// whose `parent_version` is the pre-rewrite version. All rows written by
/// one invocation share the same timestamp.
pub fn migrate_dashboards(conn: &Connection) -> Result<usize, RenameError> {
    let now = Local::now().format(TIME_FORMAT).to_string();

    let mut stmt = conn.prepare("SELECT id, data, created_by FROM dashboard")?;
    let rows: Vec<(i64, String, i64)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<Result<_, _>>()?;
    drop(stmt);

    let mut migrated = 0;
    for (dashboard_id, data, created_by) in rows {
        let mut doc: DashboardDoc = serde_json::from_str(&data)
            .map_err(|err| RenameError::InvalidDocument(format!("dashboard {dashboard_id}: {err}")))?;
        if rename_plugin_refs(&mut doc, dashboard_id)? == 0 {
            continue;
        }
        let parent_version = doc.version;
        doc.version = parent_version + 1;
        persist_rewrite(conn, dashboard_id, created_by, parent_version, &doc, &now)?;
        migrated += 1;
    }
    Ok(migrated)
}

fn persist_rewrite(
    conn: &Connection,
    dashboard_id: i64,
    created_by: i64,
    parent_version: i64,
    doc: &DashboardDoc,
    now: &str,
) -> Result<(), RenameError> {
    let data = serde_json::to_string(doc)?;
    conn.execute(
        "INSERT INTO dashboard_version
             (dashboard_id, parent_version, restored_from, version, created, created_by, message, data)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            dashboard_id,
            parent_version,
            NOT_A_RESTORE,
            doc.version,
            now,
            created_by,
            MIGRATION_MESSAGE,
            data
        ],
    )?;
    conn.execute(
        "UPDATE dashboard SET data = ?1, version = ?2, updated = ?3 WHERE id = ?4",
        params![data, doc.version, now, dashboard_id],
    )?;
    Ok(())
}

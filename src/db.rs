use crate::error::RenameError;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

/// Opens an existing Grafana database read-write. The create flag is
/// deliberately left out: a mistyped path must fail, not leave an empty
/// database behind.
pub fn db_connect(db_path: &Path) -> Result<Connection, RenameError> {
    if !db_path.is_file() {
        return Err(RenameError::NotFound(format!(
            "database file {} does not exist",
            db_path.display()
        )));
    }
    let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_WRITE)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(RenameError::RusqliteError)?;
    Ok(conn)
}

//! Catalog backup taken before an import pass.
//!
//! The importer never deletes or overwrites populated fields, but a pass that
//! dies part-way is not rolled back. The backup copy is the recovery path.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// `<stem>_backup.<ext>` next to the database.
/// e.g., "/data/catalog.db" → "/data/catalog_backup.db"
pub fn backup_path(db: &Path) -> PathBuf {
    let stem = db.file_stem().and_then(|s| s.to_str()).unwrap_or("catalog");
    let name = match db.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_backup.{ext}"),
        None => format!("{stem}_backup"),
    };
    db.with_file_name(name)
}

/// Validates that a backup path is safe to (over)write.
///
/// Checks:
/// - Backup filename must contain "backup"
/// - Backup cannot be the database itself
pub fn validate_backup_path(backup: &Path, db: &Path) -> Result<()> {
    let backup_name = backup.file_name().and_then(|n| n.to_str()).unwrap_or("");

    if !backup_name.contains("backup") {
        bail!(
            "Safety check failed: backup file '{}' must contain 'backup' in the name",
            backup.display()
        );
    }

    if backup == db {
        bail!(
            "Safety check failed: backup '{}' cannot be the same as database '{}'",
            backup.display(),
            db.display()
        );
    }

    Ok(())
}

/// Copy the database to its backup path and return that path.
pub fn create_backup(db: &Path) -> Result<PathBuf> {
    if !db.is_file() {
        bail!("Database not found: {}", db.display());
    }
    let backup = backup_path(db);
    validate_backup_path(&backup, db)?;
    std::fs::copy(db, &backup)
        .with_context(|| format!("Failed to copy {} to {}", db.display(), backup.display()))?;
    Ok(backup)
}

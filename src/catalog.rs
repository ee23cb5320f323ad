//! Catalog store boundary and its SQLite implementation.
//!
//! The engine reads `(id, title)` pairs and the current value of the target
//! field, and writes that field one row at a time. Schema and transactions
//! belong to the store.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{ReconcileError, Result};
use crate::models::CatalogEntity;

/// Plain SQL identifier, safe to interpolate.
static SQL_IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Catalog access needed by the matcher and the importer.
pub trait CatalogStore {
    /// Every entity, in the order the matcher uses for tie-breaking.
    fn list_entities(&self) -> Result<Vec<CatalogEntity>>;

    /// Current value of the target field for `id`, if any.
    fn existing_value(&self, id: &str) -> Result<Option<String>>;

    /// Set the target field for `id`. Atomic per call.
    fn update_field(&mut self, id: &str, value: &str) -> Result<()>;
}

/// Where the catalog lives inside the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogLayout {
    pub table: String,
    pub id_column: String,
    pub title_column: String,
    pub field: String,
}

impl Default for CatalogLayout {
    fn default() -> Self {
        Self {
            table: "items".to_string(),
            id_column: "id".to_string(),
            title_column: "title".to_string(),
            field: "lyrics".to_string(),
        }
    }
}

impl CatalogLayout {
    /// Reject names that are not plain identifiers.
    pub fn validate(&self) -> Result<()> {
        for name in [&self.table, &self.id_column, &self.title_column, &self.field] {
            if !SQL_IDENTIFIER.is_match(name) {
                return Err(ReconcileError::InvalidIdentifier(name.clone()));
            }
        }
        Ok(())
    }
}

/// SQLite-backed catalog.
pub struct SqliteCatalog {
    conn: Connection,
    layout: CatalogLayout,
}

impl SqliteCatalog {
    pub fn open(path: &Path, layout: CatalogLayout) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn, layout)
    }

    pub fn from_connection(conn: Connection, layout: CatalogLayout) -> Result<Self> {
        layout.validate()?;
        Ok(Self { conn, layout })
    }

    pub fn layout(&self) -> &CatalogLayout {
        &self.layout
    }
}

impl CatalogStore for SqliteCatalog {
    fn list_entities(&self) -> Result<Vec<CatalogEntity>> {
        let CatalogLayout {
            table,
            id_column,
            title_column,
            ..
        } = &self.layout;
        let sql = format!(
            "SELECT CAST({id_column} AS TEXT), {title_column} FROM {table}
             WHERE {title_column} IS NOT NULL
             ORDER BY {title_column}"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(CatalogEntity {
                id: row.get(0)?,
                title: row.get(1)?,
            })
        })?;

        let mut entities = Vec::new();
        for row in rows {
            entities.push(row?);
        }
        Ok(entities)
    }

    fn existing_value(&self, id: &str) -> Result<Option<String>> {
        let CatalogLayout {
            table,
            id_column,
            field,
            ..
        } = &self.layout;
        let sql = format!("SELECT {field} FROM {table} WHERE {id_column} = ?1");

        let value: Option<Option<String>> = self
            .conn
            .query_row(&sql, params![id], |row| row.get(0))
            .optional()?;
        Ok(value.flatten())
    }

    fn update_field(&mut self, id: &str, value: &str) -> Result<()> {
        let CatalogLayout {
            table,
            id_column,
            field,
            ..
        } = &self.layout;
        let sql = format!("UPDATE {table} SET {field} = ?1 WHERE {id_column} = ?2");
        self.conn.execute(&sql, params![value, id])?;
        Ok(())
    }
}

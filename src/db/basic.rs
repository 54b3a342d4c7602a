use anyhow::Result;

use super::{Db, DbResult, Field};

/// A store that does nothing but log every call. Useful for smoke-testing a
/// workload configuration without a real backend.
#[derive(Debug, Default)]
pub struct BasicDb;

impl BasicDb {
    /// Create a logging store.
    pub fn new() -> Self {
        Self
    }

    fn fields_repr(fields: Option<&[String]>) -> String {
        match fields {
            Some(fields) => format!("[{}]", fields.join(" ")),
            None => "<all fields>".to_string(),
        }
    }
}

impl Db for BasicDb {
    fn init(&mut self) -> Result<()> {
        tracing::debug!("basic store handle initialized");
        Ok(())
    }

    fn read(&mut self, table: &str, key: &str, fields: Option<&[String]>) -> DbResult<Vec<Field>> {
        tracing::info!("READ {table} {key} {}", Self::fields_repr(fields));
        Ok(vec![])
    }

    fn scan(
        &mut self,
        table: &str,
        key: &str,
        len: usize,
        fields: Option<&[String]>,
    ) -> DbResult<Vec<Vec<Field>>> {
        tracing::info!("SCAN {table} {key} {len} {}", Self::fields_repr(fields));
        Ok(vec![])
    }

    fn update(&mut self, table: &str, key: &str, values: Vec<Field>) -> DbResult<()> {
        tracing::info!("UPDATE {table} {key} ({} fields)", values.len());
        Ok(())
    }

    fn insert(&mut self, table: &str, key: &str, values: Vec<Field>) -> DbResult<()> {
        tracing::info!("INSERT {table} {key} ({} fields)", values.len());
        Ok(())
    }

    fn delete(&mut self, table: &str, key: &str) -> DbResult<()> {
        tracing::info!("DELETE {table} {key}");
        Ok(())
    }
}

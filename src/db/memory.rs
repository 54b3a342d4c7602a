use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{Db, DbError, DbResult, Field};

type Record = Vec<Field>;
type Table = BTreeMap<String, Record>;

/// An in-memory record store backed by ordered maps.
///
/// All handles cloned from one instance share the same tables, so records
/// loaded by one worker are visible to every other worker and to a later
/// transaction phase in the same process.
#[derive(Debug, Default, Clone)]
pub struct MemoryDb {
    tables: Arc<RwLock<HashMap<String, Table>>>,
}

impl MemoryDb {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently in `table`.
    pub fn len(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, |t| t.len())
    }

    /// Whether `table` holds no records.
    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    fn project(record: &Record, fields: Option<&[String]>) -> Record {
        match fields {
            None => record.clone(),
            Some(wanted) => record
                .iter()
                .filter(|f| wanted.contains(&f.name))
                .cloned()
                .collect(),
        }
    }
}

impl Db for MemoryDb {
    fn read(&mut self, table: &str, key: &str, fields: Option<&[String]>) -> DbResult<Vec<Field>> {
        let tables = self.tables.read();
        let record = tables
            .get(table)
            .and_then(|t| t.get(key))
            .ok_or(DbError::NotFound)?;
        Ok(Self::project(record, fields))
    }

    fn scan(
        &mut self,
        table: &str,
        key: &str,
        len: usize,
        fields: Option<&[String]>,
    ) -> DbResult<Vec<Vec<Field>>> {
        let tables = self.tables.read();
        let Some(t) = tables.get(table) else {
            return Err(DbError::NotFound);
        };
        Ok(t
            .range::<str, _>((Bound::Included(key), Bound::Unbounded))
            .take(len)
            .map(|(_, record)| Self::project(record, fields))
            .collect())
    }

    fn update(&mut self, table: &str, key: &str, values: Vec<Field>) -> DbResult<()> {
        let mut tables = self.tables.write();
        let record = tables
            .get_mut(table)
            .and_then(|t| t.get_mut(key))
            .ok_or(DbError::NotFound)?;
        for value in values {
            match record.iter_mut().find(|f| f.name == value.name) {
                Some(field) => field.value = value.value,
                None => record.push(value),
            }
        }
        Ok(())
    }

    fn insert(&mut self, table: &str, key: &str, values: Vec<Field>) -> DbResult<()> {
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .insert(key.to_string(), values);
        Ok(())
    }

    fn delete(&mut self, table: &str, key: &str) -> DbResult<()> {
        self.tables
            .write()
            .get_mut(table)
            .and_then(|t| t.remove(key))
            .map(|_| ())
            .ok_or(DbError::NotFound)
    }
}

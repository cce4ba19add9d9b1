//! In-memory table state with write fault injection

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

#[derive(Default)]
struct Table {
    rows: Vec<Value>,
    next_id: i64,
}

impl Table {
    fn assign_id(&mut self, row: &mut Value) {
        if let Value::Object(map) = row {
            if !map.contains_key("id") || map["id"].is_null() {
                self.next_id += 1;
                map.insert("id".to_string(), Value::from(self.next_id));
            } else if let Some(given) = map["id"].as_i64() {
                self.next_id = self.next_id.max(given);
            }
        }
    }
}

#[derive(Default)]
struct Inner {
    tables: HashMap<String, Table>,
    /// Per-table 1-based index of the write that should fail (one-shot)
    planned_faults: HashMap<String, u64>,
    write_counts: HashMap<String, u64>,
}

/// Shared handle over the in-memory store
///
/// Clones share state; keep one handle in the test and hand the router a
/// clone so rows can be seeded and inspected out-of-band.
#[derive(Clone, Default)]
pub struct MockStore {
    inner: Arc<Mutex<Inner>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert rows directly, bypassing the wire (test setup)
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        let mut inner = self.inner.lock().unwrap();
        let table = inner.tables.entry(table.to_string()).or_default();
        for mut row in rows {
            table.assign_id(&mut row);
            table.rows.push(row);
        }
    }

    /// Snapshot of a table's rows (test inspection)
    pub fn rows(&self, table: &str) -> Vec<Value> {
        let inner = self.inner.lock().unwrap();
        inner
            .tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    /// Make the nth write (1-based) to `table` fail with a 500, once
    pub fn fail_nth_write(&self, table: &str, nth: u64) {
        let mut inner = self.inner.lock().unwrap();
        inner.planned_faults.insert(table.to_string(), nth);
        inner.write_counts.insert(table.to_string(), 0);
    }

    /// Count one write against the fault plan; true means "fail this one"
    pub(crate) fn write_should_fail(&self, table: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let Some(&nth) = inner.planned_faults.get(table) else {
            return false;
        };
        let count = inner.write_counts.entry(table.to_string()).or_insert(0);
        *count += 1;
        if *count == nth {
            inner.planned_faults.remove(table);
            tracing::debug!(table, nth, "injected write fault");
            true
        } else {
            false
        }
    }

    pub(crate) fn with_table<R>(&self, table: &str, f: impl FnOnce(&mut Vec<Value>) -> R) -> R {
        let mut inner = self.inner.lock().unwrap();
        let table = inner.tables.entry(table.to_string()).or_default();
        f(&mut table.rows)
    }

    pub(crate) fn insert_rows(&self, table: &str, rows: Vec<Value>) -> Vec<Value> {
        let mut inner = self.inner.lock().unwrap();
        let table = inner.tables.entry(table.to_string()).or_default();
        let mut stored = Vec::with_capacity(rows.len());
        for mut row in rows {
            table.assign_id(&mut row);
            table.rows.push(row.clone());
            stored.push(row);
        }
        stored
    }

    /// Insert-or-merge on the conflict-target columns
    pub(crate) fn upsert_rows(
        &self,
        table: &str,
        rows: Vec<Value>,
        conflict_columns: &[String],
    ) -> Vec<Value> {
        let mut inner = self.inner.lock().unwrap();
        let table = inner.tables.entry(table.to_string()).or_default();
        let mut stored = Vec::with_capacity(rows.len());
        for mut row in rows {
            let existing = table.rows.iter_mut().find(|candidate| {
                conflict_columns.iter().all(|col| {
                    let lhs = candidate.get(col).unwrap_or(&Value::Null);
                    let rhs = row.get(col).unwrap_or(&Value::Null);
                    !lhs.is_null() && lhs == rhs
                })
            });
            match existing {
                Some(current) => {
                    if let (Value::Object(target), Value::Object(source)) = (&mut *current, &row) {
                        for (key, value) in source {
                            if key != "id" {
                                target.insert(key.clone(), value.clone());
                            }
                        }
                    }
                    stored.push(current.clone());
                }
                None => {
                    table.assign_id(&mut row);
                    table.rows.push(row.clone());
                    stored.push(row);
                }
            }
        }
        stored
    }
}

use crate::error::{ClassbotError, Result};
use crate::store::{type_name, Store};
use crate::types::ManagedClass;
use serde_json::Value;

/// Key of the class list inside the store document.
pub const STORE_KEY: &str = "managedClasses";

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// The managed-class ledger.
///
/// Loaded once from the [`Store`] by [`Registry::load`]; every mutation
/// rewrites the whole list under [`STORE_KEY`] and persists the document.
pub struct Registry {
    store: Store,
    classes: Vec<ManagedClass>,
}

impl Registry {
    /// Read and validate the class list. An absent key is an empty list; any
    /// other shape than an array of `[department, courseId]` string pairs
    /// fails the load.
    pub fn load(store: Store) -> Result<Self> {
        let classes = match store.document().get(STORE_KEY) {
            None => Vec::new(),
            Some(value) => parse_classes(value)?,
        };
        tracing::debug!(count = classes.len(), "loaded managed classes");
        Ok(Self { store, classes })
    }

    pub fn list(&self) -> &[ManagedClass] {
        &self.classes
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Append `classes` and persist. Duplicates are not filtered.
    pub fn add(&mut self, classes: Vec<ManagedClass>) -> Result<()> {
        if classes.is_empty() {
            return Ok(());
        }
        self.classes.extend(classes);
        self.save()
    }

    /// Remove each target at most once, taking the first structurally equal
    /// record. Unmatched targets are ignored. Returns how many records were
    /// removed; persists only if that is non-zero.
    pub fn remove(&mut self, targets: &[ManagedClass]) -> Result<usize> {
        if targets.is_empty() {
            return Ok(0);
        }

        let mut pending: Vec<&ManagedClass> = targets.iter().collect();
        let mut removed = 0;
        self.classes.retain(|class| {
            match pending.iter().position(|t| *t == class) {
                Some(pos) => {
                    pending.swap_remove(pos);
                    removed += 1;
                    false
                }
                None => true,
            }
        });

        if removed > 0 {
            self.save()?;
        }
        Ok(removed)
    }

    fn save(&mut self) -> Result<()> {
        let value = Value::Array(
            self.classes
                .iter()
                .map(|c| {
                    Value::Array(vec![
                        Value::String(c.department.clone()),
                        Value::String(c.course_id.clone()),
                    ])
                })
                .collect(),
        );
        self.store.document_mut().insert(STORE_KEY.to_string(), value);
        self.store.write()
    }
}

fn parse_classes(value: &Value) -> Result<Vec<ManagedClass>> {
    let Value::Array(records) = value else {
        return Err(ClassbotError::InvalidStore(format!(
            "class data should be an array, got {}",
            type_name(value)
        )));
    };

    records
        .iter()
        .map(|record| {
            let Value::Array(fields) = record else {
                return Err(ClassbotError::InvalidStore(format!(
                    "expected array, got {}",
                    type_name(record)
                )));
            };
            if fields.len() != 2 {
                return Err(ClassbotError::InvalidStore(format!(
                    "expected 2 elements (department/id), got {} / {}",
                    fields.len(),
                    record
                )));
            }
            match (&fields[0], &fields[1]) {
                (Value::String(department), Value::String(course_id)) => {
                    Ok(ManagedClass::from_parts(department, course_id))
                }
                _ => Err(ClassbotError::InvalidStore(format!(
                    "department and course id should be strings, got {record}"
                ))),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Registry of variable names in use.
//!
//! Every variable holds a [`NameGuard`] for its name. The guard releases the
//! name when the variable is dropped, so a name can be reused once its
//! previous owner is gone, but never while it is alive.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use ht_types::{TunerError, TunerResult};

#[derive(Debug, Default)]
struct NameTable {
    /// Name -> registration ticket of its current owner.
    names: BTreeMap<String, u64>,
    next_ticket: u64,
}

impl NameTable {
    fn generate(&self) -> String {
        let mut offset = 0;
        loop {
            let candidate = format!("var_{}", self.names.len() + offset);
            if !self.names.contains_key(&candidate) {
                return candidate;
            }
            offset += 1;
        }
    }
}

/// Shared handle to a set of in-use variable names. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    table: Arc<Mutex<NameTable>>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name`, or a generated `var_<n>` name when `None`.
    ///
    /// Fails with [`TunerError::DuplicateName`] if an explicit name is taken.
    pub fn register(&self, name: Option<&str>) -> TunerResult<NameGuard> {
        let mut table = self.table.lock();
        let name = match name {
            Some(name) => {
                if table.names.contains_key(name) {
                    return Err(TunerError::DuplicateName {
                        name: name.to_string(),
                    });
                }
                name.to_string()
            }
            None => table.generate(),
        };

        let ticket = table.next_ticket;
        table.next_ticket += 1;
        table.names.insert(name.clone(), ticket);
        tracing::debug!("Registered variable name {}", name);

        Ok(NameGuard {
            name,
            ticket,
            registry: self.clone(),
        })
    }

    /// Free `name` regardless of who holds it. Returns whether it was in use.
    pub fn release(&self, name: &str) -> bool {
        self.table.lock().names.remove(name).is_some()
    }

    fn release_ticket(&self, name: &str, ticket: u64) {
        let mut table = self.table.lock();
        if table.names.get(name) == Some(&ticket) {
            table.names.remove(name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.lock().names.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.table.lock().names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names currently in use, sorted.
    pub fn names(&self) -> Vec<String> {
        self.table.lock().names.keys().cloned().collect()
    }
}

/// Ownership of one registered name; releases it on drop.
#[derive(Debug)]
pub struct NameGuard {
    name: String,
    ticket: u64,
    registry: NameRegistry,
}

impl NameGuard {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for NameGuard {
    fn drop(&mut self) {
        // A name released explicitly may already belong to someone else.
        self.registry.release_ticket(&self.name, self.ticket);
    }
}

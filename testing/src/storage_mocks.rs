//! In-memory storage collaborators
//!
//! Fast, deterministic stand-ins for a persistence engine:
//! - [`InMemoryRepository`]: entity rows with `find` / `findBy*` lookups and optional deletion
//! - [`InMemoryStorageManager`]: unit of work with persist/flush call counting
//! - [`InMemoryManagerRegistry`]: name and type based manager resolution

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Locks only panic when poisoned

use entity_binding_core::entity::Entity;
use entity_binding_core::storage::{
    Deletable, DeletionContext, ManagerRegistry, Repository, StorageError, StorageFuture,
    StorageManager,
};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Field holding the identity of in-memory entities.
pub const KEY_FIELD: &str = "id";

/// In-memory repository for one entity type.
///
/// Supported lookup methods:
/// - `find`: match on the `id` field
/// - `findBy<Field>`: match on the snake_cased field (`findByItemName` reads `item_name`)
///
/// Deletion is opt-in via [`InMemoryRepository::deletable`]; outcomes can be
/// scripted with [`InMemoryRepository::script_deletion`].
///
/// # Example
///
/// ```
/// use entity_binding_core::entity::Entity;
/// use entity_binding_core::storage::Repository;
/// use entity_binding_testing::InMemoryRepository;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let repository = InMemoryRepository::new("Item")
///     .with_entity(Entity::new("Item").with_field("id", 1).with_field("name", "widget"));
///
/// let found = repository.lookup("findByName", "widget").await?;
/// assert!(found.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct InMemoryRepository {
    entity_type: String,
    rows: RwLock<Vec<Entity>>,
    deletable: bool,
    scripted_deletions: Mutex<VecDeque<Result<bool, StorageError>>>,
    deletion_contexts: Mutex<Vec<DeletionContext>>,
    lookups: Mutex<Vec<(String, String)>>,
}

impl InMemoryRepository {
    /// Create an empty, non-deletable repository.
    #[must_use]
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            rows: RwLock::new(Vec::new()),
            deletable: false,
            scripted_deletions: Mutex::new(VecDeque::new()),
            deletion_contexts: Mutex::new(Vec::new()),
            lookups: Mutex::new(Vec::new()),
        }
    }

    /// Seed a row.
    #[must_use]
    pub fn with_entity(self, entity: Entity) -> Self {
        self.rows.write().unwrap().push(entity);
        self
    }

    /// Opt into the deletion capability.
    #[must_use]
    pub fn deletable(mut self) -> Self {
        self.deletable = true;
        self
    }

    /// Force the outcome of the next deletion instead of touching the rows.
    pub fn script_deletion(&self, outcome: Result<bool, StorageError>) {
        self.scripted_deletions.lock().unwrap().push_back(outcome);
    }

    /// Snapshot of the stored rows.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        self.rows.read().unwrap().clone()
    }

    /// Row whose `id` renders as `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Entity> {
        self.rows
            .read()
            .unwrap()
            .iter()
            .find(|e| field_matches(e, KEY_FIELD, key))
            .cloned()
    }

    /// Number of stored rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().unwrap().len()
    }

    /// Whether no row is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.read().unwrap().is_empty()
    }

    /// Every deletion context received, in order.
    #[must_use]
    pub fn deletion_contexts(&self) -> Vec<DeletionContext> {
        self.deletion_contexts.lock().unwrap().clone()
    }

    /// Every `(method, key)` lookup received, in order.
    #[must_use]
    pub fn lookups(&self) -> Vec<(String, String)> {
        self.lookups.lock().unwrap().clone()
    }

    /// Insert or replace a row by its `id`.
    fn upsert(&self, entity: Entity) {
        let mut rows = self.rows.write().unwrap();
        let key = entity.get(KEY_FIELD).cloned();
        match rows.iter_mut().find(|row| row.get(KEY_FIELD) == key.as_ref()) {
            Some(row) => *row = entity,
            None => rows.push(entity),
        }
    }
}

/// Field name a lookup method reads, if the method is supported.
fn lookup_field(method: &str) -> Option<String> {
    if method == "find" {
        return Some(KEY_FIELD.to_string());
    }

    let rest = method.strip_prefix("findBy").filter(|rest| !rest.is_empty())?;
    let mut field = String::with_capacity(rest.len() + 4);
    for (i, c) in rest.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                field.push('_');
            }
            field.extend(c.to_lowercase());
        } else {
            field.push(c);
        }
    }
    Some(field)
}

/// Whether `entity.field` renders as `key`.
fn field_matches(entity: &Entity, field: &str, key: &str) -> bool {
    match entity.get(field) {
        Some(Value::String(s)) => s == key,
        Some(Value::Number(n)) => n.to_string() == key,
        Some(Value::Bool(b)) => b.to_string() == key,
        _ => false,
    }
}

impl Repository for InMemoryRepository {
    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn lookup<'a>(&'a self, method: &'a str, key: &'a str) -> StorageFuture<'a, Option<Entity>> {
        Box::pin(async move {
            self.lookups
                .lock()
                .unwrap()
                .push((method.to_string(), key.to_string()));

            let field = lookup_field(method).ok_or_else(|| StorageError::UnknownLookup {
                entity_type: self.entity_type.clone(),
                method: method.to_string(),
            })?;

            Ok(self
                .rows
                .read()
                .unwrap()
                .iter()
                .find(|e| field_matches(e, &field, key))
                .cloned())
        })
    }

    fn as_deletable(&self) -> Option<&dyn Deletable> {
        if self.deletable {
            Some(self)
        } else {
            None
        }
    }
}

impl Deletable for InMemoryRepository {
    fn delete_by_request<'a>(&'a self, context: &'a DeletionContext) -> StorageFuture<'a, bool> {
        Box::pin(async move {
            self.deletion_contexts.lock().unwrap().push(context.clone());

            if let Some(outcome) = self.scripted_deletions.lock().unwrap().pop_front() {
                return outcome;
            }

            let mut rows = self.rows.write().unwrap();
            let before = rows.len();
            rows.retain(|e| {
                !field_matches(e, context.parameter_name(), context.parameter_value())
            });

            if rows.len() == before {
                return Err(StorageError::NotFound(None));
            }
            Ok(true)
        })
    }
}

/// In-memory unit of work.
///
/// `persist` assigns an `id` to entities without one and queues them;
/// `flush` writes the queue into the repositories. Both calls are counted.
#[derive(Debug, Default)]
pub struct InMemoryStorageManager {
    repositories: HashMap<String, Arc<InMemoryRepository>>,
    pending: Mutex<Vec<Entity>>,
    next_id: AtomicI64,
    persist_calls: AtomicUsize,
    flush_calls: AtomicUsize,
    flush_failure: Mutex<Option<StorageError>>,
}

impl InMemoryStorageManager {
    /// Manager without repositories.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a repository under its entity type.
    #[must_use]
    pub fn with_repository(mut self, repository: Arc<InMemoryRepository>) -> Self {
        let max_id = repository
            .entities()
            .iter()
            .filter_map(|e| e.get(KEY_FIELD).and_then(Value::as_i64))
            .max()
            .unwrap_or(0);
        self.next_id.fetch_max(max_id, Ordering::SeqCst);
        self.repositories
            .insert(repository.entity_type.clone(), repository);
        self
    }

    /// Make the next flush fail with `error`.
    pub fn fail_next_flush(&self, error: StorageError) {
        *self.flush_failure.lock().unwrap() = Some(error);
    }

    /// Whether a repository exists for `entity_type`.
    #[must_use]
    pub fn handles(&self, entity_type: &str) -> bool {
        self.repositories.contains_key(entity_type)
    }

    /// Number of `persist` calls.
    #[must_use]
    pub fn persist_count(&self) -> usize {
        self.persist_calls.load(Ordering::SeqCst)
    }

    /// Number of `flush` calls.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.flush_calls.load(Ordering::SeqCst)
    }
}

impl StorageManager for InMemoryStorageManager {
    fn repository(&self, entity_type: &str) -> Result<Arc<dyn Repository>, StorageError> {
        self.repositories
            .get(entity_type)
            .map(|r| Arc::clone(r) as Arc<dyn Repository>)
            .ok_or_else(|| StorageError::UnknownEntityType(entity_type.to_string()))
    }

    fn persist<'a>(&'a self, entity: &'a mut Entity) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            self.persist_calls.fetch_add(1, Ordering::SeqCst);

            if !self.handles(entity.entity_type()) {
                return Err(StorageError::UnknownEntityType(
                    entity.entity_type().to_string(),
                ));
            }

            if entity.get(KEY_FIELD).is_none_or(Value::is_null) {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                entity.set(KEY_FIELD, id);
            }

            self.pending.lock().unwrap().push(entity.clone());
            Ok(())
        })
    }

    fn flush(&self) -> StorageFuture<'_, ()> {
        Box::pin(async move {
            self.flush_calls.fetch_add(1, Ordering::SeqCst);

            if let Some(error) = self.flush_failure.lock().unwrap().take() {
                self.pending.lock().unwrap().clear();
                return Err(error);
            }

            let pending = std::mem::take(&mut *self.pending.lock().unwrap());
            for entity in pending {
                if let Some(repository) = self.repositories.get(entity.entity_type()) {
                    repository.upsert(entity);
                }
            }
            Ok(())
        })
    }
}

/// In-memory manager registry.
///
/// Managers are resolved by name, or by the first registered manager holding a
/// repository for the requested type. Every resolution is counted.
#[derive(Debug, Default)]
pub struct InMemoryManagerRegistry {
    managers: Vec<(String, Arc<InMemoryStorageManager>)>,
    resolutions: AtomicUsize,
}

impl InMemoryManagerRegistry {
    /// Registry without managers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a manager under `name`.
    #[must_use]
    pub fn with_manager(
        mut self,
        name: impl Into<String>,
        manager: Arc<InMemoryStorageManager>,
    ) -> Self {
        self.managers.push((name.into(), manager));
        self
    }

    /// Number of manager resolutions served.
    #[must_use]
    pub fn resolution_count(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }
}

impl ManagerRegistry for InMemoryManagerRegistry {
    fn manager(&self, name: &str) -> Option<Arc<dyn StorageManager>> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        self.managers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| Arc::clone(m) as Arc<dyn StorageManager>)
    }

    fn manager_for_type(&self, entity_type: &str) -> Option<Arc<dyn StorageManager>> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        self.managers
            .iter()
            .find(|(_, m)| m.handles(entity_type))
            .map(|(_, m)| Arc::clone(m) as Arc<dyn StorageManager>)
    }
}

//! Item fixtures shared by converter tests.

use crate::binding_mocks::RecordingBindingEngine;
use crate::storage_mocks::{InMemoryManagerRegistry, InMemoryRepository, InMemoryStorageManager};
use entity_binding_core::converter::ConverterManager;
use entity_binding_core::delete::DeleteConverter;
use entity_binding_core::entity::Entity;
use entity_binding_core::schema::{FieldSpec, FormSchema, SchemaRegistry};
use entity_binding_core::update::UpdateConverter;
use std::sync::Arc;

/// Entity type of the fixture items.
pub const ITEM: &str = "Item";

/// Form schema binding onto [`ITEM`].
pub const ITEM_TYPE: &str = "ItemType";

/// Form schema without a data class.
pub const ORPHAN_TYPE: &str = "OrphanType";

/// Entity type whose repository cannot delete.
pub const LEDGER: &str = "Ledger";

/// Name of the default storage manager.
pub const DEFAULT_MANAGER: &str = "default";

/// Schemas for the fixture types.
///
/// `ItemType` binds `name` (required, at most 64 characters), `description`
/// and `price` onto `Item`.
#[must_use]
pub fn item_forms() -> SchemaRegistry {
    SchemaRegistry::new()
        .with_schema(
            FormSchema::new(ITEM_TYPE)
                .data_class(ITEM)
                .field(FieldSpec::string("name").required().max_length(64))
                .field(FieldSpec::string("description"))
                .field(FieldSpec::number("price")),
        )
        .with_schema(FormSchema::new(ORPHAN_TYPE).field(FieldSpec::string("name")))
}

/// An item row.
#[must_use]
pub fn item(id: i64, name: &str) -> Entity {
    Entity::new(ITEM).with_field("id", id).with_field("name", name)
}

/// In-memory wiring for converter tests.
///
/// One manager named [`DEFAULT_MANAGER`] holds a deletable `Item` repository and
/// a non-deletable `Ledger` repository.
#[derive(Debug, Clone)]
pub struct BindingFixture {
    /// `Item` rows.
    pub items: Arc<InMemoryRepository>,
    /// `Ledger` rows.
    pub ledger: Arc<InMemoryRepository>,
    /// The default manager.
    pub manager: Arc<InMemoryStorageManager>,
    /// Registry holding the default manager.
    pub registry: Arc<InMemoryManagerRegistry>,
    /// Recording engine over [`item_forms`].
    pub forms: Arc<RecordingBindingEngine<SchemaRegistry>>,
}

impl BindingFixture {
    /// Fixture seeded with `items`.
    #[must_use]
    pub fn with_items(items: impl IntoIterator<Item = Entity>) -> Self {
        let items = Arc::new(
            items
                .into_iter()
                .fold(InMemoryRepository::new(ITEM).deletable(), InMemoryRepository::with_entity),
        );
        let ledger = Arc::new(InMemoryRepository::new(LEDGER));
        let manager = Arc::new(
            InMemoryStorageManager::new()
                .with_repository(Arc::clone(&items))
                .with_repository(Arc::clone(&ledger)),
        );
        let registry = Arc::new(
            InMemoryManagerRegistry::new().with_manager(DEFAULT_MANAGER, Arc::clone(&manager)),
        );

        Self {
            items,
            ledger,
            manager,
            registry,
            forms: Arc::new(RecordingBindingEngine::new(item_forms())),
        }
    }

    /// Empty fixture.
    #[must_use]
    pub fn new() -> Self {
        Self::with_items([])
    }

    /// Update converter wired to this fixture.
    #[must_use]
    pub fn update_converter(&self) -> UpdateConverter {
        UpdateConverter::new(self.forms.clone()).with_registry(self.registry.clone())
    }

    /// Delete converter wired to this fixture.
    #[must_use]
    pub fn delete_converter(&self) -> DeleteConverter {
        DeleteConverter::new().with_registry(self.registry.clone())
    }

    /// Manager holding both converters.
    #[must_use]
    pub fn converters(&self) -> ConverterManager {
        ConverterManager::new()
            .with_converter(Arc::new(self.update_converter()))
            .with_converter(Arc::new(self.delete_converter()))
    }
}

impl Default for BindingFixture {
    fn default() -> Self {
        Self::new()
    }
}

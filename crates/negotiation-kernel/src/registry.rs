//! Entity registry: stable integer ids for names.
//!
//! Every group, teacher, class, room, class type and tool name is resolved
//! through one registry before negotiation starts. Identical names always map to
//! the same id, and ids are handed out in insertion order.

use std::collections::HashMap;

/// Opaque integer handle for any named entity.
pub type EntityId = u32;

/// Id reserved for the blocked-slot sentinel. Never assigned to a real name.
pub const BLOCKED_SLOT: EntityId = 0;

const BLOCKED_SLOT_NAME: &str = "<blocked>";

/// Name-to-id dedup mapping.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    names: Vec<String>,
    index: HashMap<String, EntityId>,
}

impl EntityRegistry {
    /// Create a registry with the sentinel already reserved.
    pub fn new() -> Self {
        let mut registry = Self {
            names: Vec::new(),
            index: HashMap::new(),
        };
        registry.resolve(BLOCKED_SLOT_NAME);
        registry
    }

    /// Resolve a name to its id, inserting it if unseen.
    pub fn resolve(&mut self, name: &str) -> EntityId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = self.names.len() as EntityId;
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        id
    }

    /// Look up an id without inserting.
    pub fn lookup(&self, name: &str) -> Option<EntityId> {
        self.index.get(name).copied()
    }

    /// Name for an id.
    pub fn name(&self, id: EntityId) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    /// All registered names, indexed by id.
    pub fn entities(&self) -> &[String] {
        &self.names
    }

    /// Most recently assigned id.
    pub fn last_created_id(&self) -> Option<EntityId> {
        self.names.len().checked_sub(1).map(|id| id as EntityId)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

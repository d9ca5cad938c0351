// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Entity identifiers, the world-level entity index, and the ergonomic
//! `Entity` façade.
//!
//! Entity ids are plain monotonically increasing integers, not generational
//! slotmap keys: the core never reuses an id within a run, so there is no
//! generation to track, and the spec describes them as "a monotonically
//! increasing positive integer" in the first place.

use ahash::AHashMap;

use crate::component::Component;
use crate::error::Result;
use crate::world::World;

/// Unique entity identifier. Zero is reserved as "none" and is never handed
/// out by [`World::new_entity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) u64);

impl EntityId {
    /// The reserved "no entity" sentinel.
    pub const NONE: EntityId = EntityId(0);

    /// Raw integer value of this id.
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Allocates entity ids and tracks which archetype currently holds each one.
///
/// An entity exists iff it appears in this index. Archetypes separately
/// track which *row* within themselves belongs to a given entity (see
/// [`crate::archetype::Archetype`]) — this index only needs to resolve
/// entity id to archetype.
pub struct EntityIndex {
    next_id: u64,
    locations: AHashMap<EntityId, usize>,
}

impl EntityIndex {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            locations: AHashMap::new(),
        }
    }

    /// Allocate the next entity id without yet recording a location.
    ///
    /// # Panics
    /// Panics on exhaustion of the 64-bit id space, which is not reachable
    /// in practice.
    pub fn allocate(&mut self) -> EntityId {
        let id = self
            .next_id
            .checked_add(1)
            .map(|next| {
                let id = self.next_id;
                self.next_id = next;
                id
            })
            .expect("entity id space exhausted");
        EntityId(id)
    }

    pub fn insert(&mut self, entity: EntityId, archetype_id: usize) {
        self.locations.insert(entity, archetype_id);
    }

    pub fn archetype_of(&self, entity: EntityId) -> Option<usize> {
        self.locations.get(&entity).copied()
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.locations.contains_key(&entity)
    }

    pub fn remove(&mut self, entity: EntityId) -> Option<usize> {
        self.locations.remove(&entity)
    }

    pub fn set_archetype(&mut self, entity: EntityId, archetype_id: usize) {
        self.locations.insert(entity, archetype_id);
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl Default for EntityIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Ergonomic handle binding an entity id to the world that owns it, so call
/// sites can chain `.set(...)`/`.remove::<T>()` instead of threading the
/// entity id through every call. Non-owning: outliving the `World` it
/// borrows is prevented by the borrow checker, not by the type itself.
pub struct EntityRef<'w> {
    world: &'w mut World,
    id: EntityId,
}

impl<'w> EntityRef<'w> {
    pub fn new(world: &'w mut World, id: EntityId) -> Self {
        Self { world, id }
    }

    /// The bound entity id.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Set a component on this entity, chaining for further calls.
    pub fn set<T: Component>(self, value: T) -> Result<Self> {
        self.world.set(self.id, value)?;
        Ok(self)
    }

    /// Remove a component from this entity, chaining for further calls.
    pub fn remove<T: Component>(self) -> Result<Self> {
        self.world.remove::<T>(self.id)?;
        Ok(self)
    }

    /// Read a component off this entity.
    pub fn get<T: Component>(&self) -> Option<&T> {
        self.world.get::<T>(self.id)
    }

    /// Delete this entity (or enqueue the deletion, if the world is locked).
    pub fn delete(self) -> Result<()> {
        self.world.delete(self.id)
    }
}

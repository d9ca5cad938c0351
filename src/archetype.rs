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

//! Archetype storage: one column per component, columns kept row-aligned
//! with the entity-id list.
//!
//! All entities with the same [`Signature`] live in one `Archetype`. Adding
//! or removing a component moves an entity's row to a different archetype
//! (see [`crate::archetype_index::ArchetypeIndex::change_type`]); this
//! module only deals with storage within a single, fixed signature.

use rustc_hash::FxHashMap;

use crate::column::Column;
use crate::component::{self, Component, ComponentId};
use crate::entity::EntityId;
use crate::error::{EcsError, Result};
use crate::signature::Signature;

pub struct Archetype {
    signature: Signature,
    entities: Vec<EntityId>,
    row_of: FxHashMap<EntityId, usize>,
    columns: Vec<Column>,
    column_index: FxHashMap<ComponentId, usize>,
}

impl Archetype {
    /// Build storage for `signature`. Every component id in the signature
    /// must already be registered (every id reaching this point came from
    /// `Component::id()`, which registers as a side effect), so a missing
    /// descriptor here indicates a caller bug rather than user error.
    pub fn new(signature: Signature) -> Result<Self> {
        let mut columns = Vec::with_capacity(signature.len());
        let mut column_index = FxHashMap::default();
        for (i, &id) in signature.components().iter().enumerate() {
            let desc = component::descriptor_of(id)?;
            columns.push(Column::new(desc.size));
            column_index.insert(id, i);
        }
        Ok(Self {
            signature,
            entities: Vec::new(),
            row_of: FxHashMap::default(),
            columns,
            column_index,
        })
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entity_ids(&self) -> &[EntityId] {
        &self.entities
    }

    pub fn row_of(&self, entity: EntityId) -> Option<usize> {
        self.row_of.get(&entity).copied()
    }

    pub fn has_column(&self, id: ComponentId) -> bool {
        self.column_index.contains_key(&id)
    }

    /// Append a new, zero-initialized row for `entity` across every column,
    /// keeping all columns row-aligned with the entity list.
    ///
    /// Fails with [`EcsError::DuplicateEntity`] if `entity` already occupies
    /// a row in this archetype.
    pub fn allocate_row(&mut self, entity: EntityId) -> Result<usize> {
        if self.row_of.contains_key(&entity) {
            return Err(EcsError::DuplicateEntity(entity));
        }
        let row = self.entities.len();
        for col in &mut self.columns {
            let zeros = vec![0u8; col.elem_size()];
            col.append(&zeros)?;
        }
        self.entities.push(entity);
        self.row_of.insert(entity, row);
        Ok(row)
    }

    /// Write `value` into the column identified by `id` at `row`.
    pub fn write_component<T: Component>(
        &mut self,
        row: usize,
        id: ComponentId,
        value: &T,
    ) -> Result<()> {
        let idx = *self
            .column_index
            .get(&id)
            .ok_or(EcsError::UnknownComponent(id))?;
        let bytes = unsafe {
            std::slice::from_raw_parts(value as *const T as *const u8, std::mem::size_of::<T>())
        };
        self.columns[idx].write(row, bytes)
    }

    /// Write raw bytes into the column identified by `id`, for callers that
    /// hold a component's value only as captured bytes (the deferred set
    /// queue, which records pending writes before the target archetype for
    /// a given entity is necessarily known).
    pub fn write_raw(&mut self, row: usize, id: ComponentId, bytes: &[u8]) -> Result<()> {
        let idx = *self
            .column_index
            .get(&id)
            .ok_or(EcsError::UnknownComponent(id))?;
        self.columns[idx].write(row, bytes)
    }

    pub fn get<T: Component>(&self, row: usize) -> Result<&T> {
        let id = T::id();
        let idx = *self
            .column_index
            .get(&id)
            .ok_or(EcsError::UnknownComponent(id))?;
        let bytes = self.columns[idx].read(row)?;
        Ok(unsafe { &*(bytes.as_ptr() as *const T) })
    }

    pub fn get_mut<T: Component>(&mut self, row: usize) -> Result<&mut T> {
        let id = T::id();
        let idx = *self
            .column_index
            .get(&id)
            .ok_or(EcsError::UnknownComponent(id))?;
        let bytes = self.columns[idx].read_mut(row)?;
        Ok(unsafe { &mut *(bytes.as_mut_ptr() as *mut T) })
    }

    /// Allocate a row here for `entity` and copy over every component
    /// column shared with `src`, leaving columns unique to this archetype
    /// zero-initialized. Used when a structural change (`set`/`remove`)
    /// moves an entity to a new archetype.
    pub fn add_from(&mut self, entity: EntityId, src: &Archetype, src_row: usize) -> Result<usize> {
        let row = self.allocate_row(entity)?;
        for (&id, &dst_idx) in &self.column_index {
            if let Some(&src_idx) = src.column_index.get(&id) {
                let bytes = src.columns[src_idx].read(src_row)?.to_vec();
                self.columns[dst_idx].write(row, &bytes)?;
            }
        }
        Ok(row)
    }

    /// Remove `entity`'s row via swap-remove, compacting every column and
    /// the entity list together. Returns the id of whichever entity
    /// occupied the last row and was moved into the freed slot, if the
    /// removed row wasn't already last — the caller must update that
    /// entity's row index.
    pub fn swap_delete(&mut self, entity: EntityId) -> Result<Option<EntityId>> {
        let row = self
            .row_of
            .remove(&entity)
            .ok_or(EcsError::UnknownEntity(entity))?;
        let last = self.entities.len() - 1;
        let moved = if row != last {
            Some(self.entities[last])
        } else {
            None
        };
        self.entities.swap_remove(row);
        for col in &mut self.columns {
            col.swap_remove(row)?;
        }
        if let Some(moved_entity) = moved {
            self.row_of.insert(moved_entity, row);
        }
        Ok(moved)
    }
}

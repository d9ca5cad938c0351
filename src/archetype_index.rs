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

//! Archetype graph: signature-to-archetype lookup and the transition table
//! entities move through as components are added or removed.

use ahash::AHashMap;

use crate::archetype::Archetype;
use crate::component::ComponentId;
use crate::entity::EntityId;
use crate::error::{EcsError, Result};
use crate::signature::Signature;

/// Owns every archetype that currently exists and the signature-to-index
/// map used to find or lazily create them.
///
/// New archetypes are only ever appended, never removed — matching the
/// spec's choice to keep the archetype graph monotonic rather than garbage
/// collect archetypes that drop to zero entities, since signature churn
/// tends to revisit the same small set of archetypes repeatedly.
pub struct ArchetypeIndex {
    archetypes: Vec<Archetype>,
    by_signature: AHashMap<Signature, usize>,
    max_archetypes: usize,
}

impl ArchetypeIndex {
    pub fn new(max_archetypes: usize) -> Self {
        Self {
            archetypes: Vec::new(),
            by_signature: AHashMap::new(),
            max_archetypes,
        }
    }

    pub fn get(&self, id: usize) -> Option<&Archetype> {
        self.archetypes.get(id)
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut Archetype> {
        self.archetypes.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Archetype)> {
        self.archetypes.iter().enumerate()
    }

    /// Find the archetype matching `signature`, creating and registering it
    /// if it doesn't yet exist. Returns the id of the newly created
    /// archetype as `Some(id)` in the second tuple slot when one was
    /// created, so callers (the system registry) can extend their cached
    /// match lists.
    pub fn find_or_create(&mut self, signature: Signature) -> Result<(usize, Option<usize>)> {
        if let Some(&id) = self.by_signature.get(&signature) {
            return Ok((id, None));
        }

        if self.archetypes.len() >= self.max_archetypes {
            return Err(EcsError::ArchetypeLimitExceeded(self.max_archetypes));
        }

        let archetype = Archetype::new(signature.clone())?;
        let id = self.archetypes.len();
        self.archetypes.push(archetype);
        self.by_signature.insert(signature, id);
        Ok((id, Some(id)))
    }

    /// Move `entity` from archetype `from` to the archetype matching
    /// `to_signature` (creating it if needed), copying every component
    /// column shared between the two signatures. Returns
    /// `(new_archetype_id, newly_created, entity_displaced_in_from)`.
    pub fn change_type(
        &mut self,
        entity: EntityId,
        from: usize,
        to_signature: Signature,
    ) -> Result<(usize, Option<usize>, Option<EntityId>)> {
        let (to_id, created) = self.find_or_create(to_signature)?;

        let from_row = self
            .archetypes
            .get(from)
            .and_then(|a| a.row_of(entity))
            .ok_or(EcsError::UnknownEntity(entity))?;

        // `from` and `to_id` are always distinct here: callers only invoke
        // `change_type` when adding/removing a component actually changes
        // the signature, so `find_or_create` never hands back `from` itself.
        let (from_arch, to_arch): (&mut Archetype, &mut Archetype) = if from < to_id {
            let (a, b) = self.archetypes.split_at_mut(to_id);
            (&mut a[from], &mut b[0])
        } else {
            let (a, b) = self.archetypes.split_at_mut(from);
            (&mut b[0], &mut a[to_id])
        };

        to_arch.add_from(entity, from_arch, from_row)?;
        let displaced = from_arch.swap_delete(entity)?;

        Ok((to_id, created, displaced))
    }
}

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

//! Archetype signatures: order-independent sets of component ids.
//!
//! A signature is the key of the archetype graph, so two entities with the
//! same components in a different registration order must hash and compare
//! equal. Canonicalizing (sort + dedup) once at construction, rather than
//! comparing as unordered sets on every lookup, keeps `find_or_create` a
//! cheap hash-map probe.

use smallvec::SmallVec;

use crate::component::ComponentId;

/// Inline capacity before a signature spills to the heap. Eight matches the
/// `Bundle` tuple arity ceiling, which covers the overwhelming majority of
/// archetypes in practice.
const INLINE_CAPACITY: usize = 8;

/// Canonical, sorted, deduplicated set of component ids identifying an
/// archetype.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature(SmallVec<[ComponentId; INLINE_CAPACITY]>);

impl Signature {
    /// The empty signature, shared by every entity with no components.
    pub fn empty() -> Self {
        Self(SmallVec::new())
    }

    /// Components making up this signature, in canonical (sorted) order.
    pub fn components(&self) -> &[ComponentId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    /// Signature with `id` added, or `self` unchanged (cloned) if already
    /// present.
    pub fn with(&self, id: ComponentId) -> Self {
        match self.0.binary_search(&id) {
            Ok(_) => self.clone(),
            Err(pos) => {
                let mut v = self.0.clone();
                v.insert(pos, id);
                Self(v)
            }
        }
    }

    /// Signature with `id` removed, or `self` unchanged (cloned) if absent.
    pub fn without(&self, id: ComponentId) -> Self {
        match self.0.binary_search(&id) {
            Ok(pos) => {
                let mut v = self.0.clone();
                v.remove(pos);
                Self(v)
            }
            Err(_) => self.clone(),
        }
    }

    /// True if `self` contains every component id in `other` — the relation
    /// used to match systems (registered against a required signature)
    /// against archetypes (identified by their full signature).
    pub fn is_superset_of(&self, other: &Signature) -> bool {
        other.0.iter().all(|id| self.contains(*id))
    }
}

/// Build a canonical signature from an arbitrary (possibly unsorted,
/// possibly duplicate-containing) slice of component ids.
pub fn make_signature(ids: &[ComponentId]) -> Signature {
    let mut v: SmallVec<[ComponentId; INLINE_CAPACITY]> = ids.iter().copied().collect();
    v.sort_unstable();
    v.dedup();
    Signature(v)
}

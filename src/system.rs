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

//! Systems: a required signature plus a per-entity callback, matched
//! against archetypes whose signature is a superset of the system's.
//!
//! There is no read/write access metadata here, unlike the teacher crate's
//! `SystemAccess`/`conflicts_with` — that machinery exists to schedule
//! systems across threads, and this core runs systems sequentially in
//! registration order, so there is nothing to detect conflicts for.

use crate::entity::EntityId;
use crate::signature::Signature;
use crate::world::World;

/// Handle identifying a registered system, returned by `World::add_system`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemId(pub(crate) u32);

impl SystemId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Per-entity callback invoked once for every entity in every matched
/// archetype, each time the system runs.
pub type SystemFn = Box<dyn FnMut(&mut World, EntityId) + Send + Sync>;

/// A registered system: the signature it requires, its callback, and the
/// cached list of archetype ids currently known to satisfy that signature.
pub struct System {
    id: SystemId,
    signature: Signature,
    handler: Option<SystemFn>,
    matched: Vec<usize>,
}

impl System {
    pub fn new(id: SystemId, signature: Signature, handler: SystemFn) -> Self {
        Self {
            id,
            signature,
            handler: Some(handler),
            matched: Vec::new(),
        }
    }

    pub fn id(&self) -> SystemId {
        self.id
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn matched_archetypes(&self) -> &[usize] {
        &self.matched
    }

    /// Add `archetype_id` to this system's match list if `archetype_signature`
    /// satisfies the system's required signature. Called once per existing
    /// archetype at registration time, and once per newly created archetype
    /// thereafter — so a system's match list only ever grows, matching the
    /// append-only archetype graph in [`crate::archetype_index`].
    pub fn consider_archetype(&mut self, archetype_id: usize, archetype_signature: &Signature) {
        if archetype_signature.is_superset_of(&self.signature) {
            self.matched.push(archetype_id);
        }
    }

    /// Take the handler out so it can be invoked with `&mut World` without
    /// the handler itself living behind the same borrow. Must be paired
    /// with [`System::restore_handler`] once the run completes.
    ///
    /// # Panics
    /// Panics if the handler has already been taken and not restored —
    /// this would indicate a bug in the dispatch loop, not user error.
    pub fn take_handler(&mut self) -> SystemFn {
        self.handler.take().expect("system handler already taken")
    }

    pub fn restore_handler(&mut self, handler: SystemFn) {
        self.handler = Some(handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentId;
    use crate::signature::make_signature;

    fn cid(n: u32) -> ComponentId {
        ComponentId(n)
    }

    #[test]
    fn matches_superset_signature_only() {
        let required = make_signature(&[cid(1)]);
        let mut system = System::new(SystemId(0), required, Box::new(|_, _| {}));

        let matching = make_signature(&[cid(1), cid(2)]);
        let non_matching = make_signature(&[cid(2)]);

        system.consider_archetype(0, &matching);
        system.consider_archetype(1, &non_matching);

        assert_eq!(system.matched_archetypes(), &[0]);
    }
}

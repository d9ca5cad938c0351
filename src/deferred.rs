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

//! Deferred structural-mutation queues.
//!
//! While a system is iterating (`World::locked == true`), `set`/`remove`/
//! `delete` calls against entities other than the one currently visited
//! cannot touch the archetype graph directly — doing so could invalidate
//! the row indices the running iteration depends on. Instead they're
//! recorded here and drained, in a fixed set → remove → delete order, once
//! the current system's pass over its matched archetypes finishes.
//!
//! `SetQueue` stores each pending component value by component id, as raw
//! bytes next to the target entity id — it owns the bytes directly rather
//! than taking `&mut T`, which sidesteps the historical defect in the
//! original C++ queue (`Queue->Enqueue(Entity, &Data)` took the address of
//! a local pointer parameter instead of the pointee, so the enqueued bytes
//! were garbage by the time the queue drained). Taking `value: T` by value
//! here means there is no pointer for a caller to misuse in the first
//! place.

use ahash::AHashMap;

use crate::component::{Component, ComponentId};
use crate::entity::EntityId;

/// One pending `set::<T>(entity, value)` call per (entity, component)
/// pair, keyed by component id so the drain step can batch writes to the
/// same archetype's column.
#[derive(Default)]
pub struct SetQueue {
    pending: AHashMap<ComponentId, Vec<(EntityId, Vec<u8>)>>,
}

impl SetQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<T: Component>(&mut self, entity: EntityId, value: T) {
        let id = T::id();
        let bytes = unsafe {
            std::slice::from_raw_parts(&value as *const T as *const u8, std::mem::size_of::<T>())
        }
        .to_vec();
        self.pending.entry(id).or_default().push((entity, bytes));
    }

    pub fn is_empty(&self) -> bool {
        self.pending.values().all(|v| v.is_empty())
    }

    /// Drain every pending set, grouped by component id.
    pub fn drain(&mut self) -> Vec<(ComponentId, Vec<(EntityId, Vec<u8>)>)> {
        self.pending.drain().collect()
    }
}

/// One pending `remove::<T>(entity)` call per (entity, component) pair.
#[derive(Default)]
pub struct RemoveQueue {
    pending: AHashMap<ComponentId, Vec<EntityId>>,
}

impl RemoveQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entity: EntityId, id: ComponentId) {
        self.pending.entry(id).or_default().push(entity);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.values().all(|v| v.is_empty())
    }

    pub fn drain(&mut self) -> Vec<(ComponentId, Vec<EntityId>)> {
        self.pending.drain().collect()
    }
}

/// Pending `delete(entity)` calls, drained last so a deletion never races
/// ahead of a set/remove that targets the same entity in the same tick.
/// Named after the original's "graveyard" queue.
#[derive(Default)]
pub struct Graveyard {
    pending: Vec<EntityId>,
}

impl Graveyard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entity: EntityId) {
        self.pending.push(entity);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn drain(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    struct Position {
        #[allow(dead_code)]
        x: f32,
        #[allow(dead_code)]
        y: f32,
    }

    #[test]
    fn set_queue_batches_by_component_id() {
        let mut queue = SetQueue::new();
        queue.push(EntityId::NONE, Position { x: 1.0, y: 2.0 });
        assert!(!queue.is_empty());

        let drained = queue.drain();
        assert_eq!(drained.len(), 1);
        let (id, entries) = &drained[0];
        assert_eq!(*id, Position::id());
        assert_eq!(entries.len(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn graveyard_drains_in_fifo_order() {
        let mut grave = Graveyard::new();
        let a = EntityId::NONE;
        grave.push(a);
        grave.push(a);
        assert_eq!(grave.drain().len(), 2);
        assert!(grave.is_empty());
    }
}

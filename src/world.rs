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

//! World: central entity/archetype storage, system registry, and the
//! deferred-mutation dispatch loop.

#[cfg(feature = "profiling")]
use tracing::info_span;

use crate::archetype_index::ArchetypeIndex;
use crate::component::{Bundle, Component, ComponentId};
use crate::config::EcsConfig;
use crate::deferred::{Graveyard, RemoveQueue, SetQueue};
use crate::entity::{EntityId, EntityIndex, EntityRef};
use crate::error::{EcsError, Result};
use crate::signature::{make_signature, Signature};
use crate::system::{System, SystemFn, SystemId};

/// Central ECS world: owns every entity, archetype, and registered system.
pub struct World {
    entities: EntityIndex,
    archetypes: ArchetypeIndex,
    systems: Vec<System>,
    next_system_id: u32,
    set_queue: SetQueue,
    remove_queue: RemoveQueue,
    graveyard: Graveyard,
    locked: bool,
    /// Entity currently being passed to a running system's handler, if any.
    /// Lets `delete` distinguish a self-delete (safe to apply immediately
    /// under Rule D) from a delete targeting some other entity (deferred).
    visiting: Option<EntityId>,
    config: EcsConfig,
}

impl World {
    pub fn new() -> Self {
        Self::with_config(EcsConfig::default())
    }

    pub fn with_config(config: EcsConfig) -> Self {
        let mut archetypes = ArchetypeIndex::new(config.max_archetypes);
        archetypes
            .find_or_create(Signature::empty())
            .expect("the empty archetype always fits within a fresh archetype limit");

        Self {
            entities: EntityIndex::new(),
            archetypes,
            systems: Vec::new(),
            next_system_id: 0,
            set_queue: SetQueue::new(),
            remove_queue: RemoveQueue::new(),
            graveyard: Graveyard::new(),
            locked: false,
            visiting: None,
            config,
        }
    }

    pub fn config(&self) -> &EcsConfig {
        &self.config
    }

    /// True while a system is mid-iteration; structural mutations against
    /// entities other than the one currently being visited are deferred
    /// while this holds.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains(entity)
    }

    /// Create a new, component-less entity in the empty archetype.
    ///
    /// Unlike `set`/`remove`/`delete`, this has no deferred form: the spec
    /// treats `new_entity` while locked as a fatal condition rather than a
    /// queueable spawn, since a system iterating today has no way to expect
    /// brand-new entities to appear mid-pass.
    pub fn new_entity(&mut self) -> Result<EntityId> {
        if self.locked {
            return Err(EcsError::LockedMutation);
        }
        let (empty_id, _) = self.archetypes.find_or_create(Signature::empty())?;
        let id = self.entities.allocate();
        self.archetypes
            .get_mut(empty_id)
            .expect("just found or created")
            .allocate_row(id)?;
        self.entities.insert(id, empty_id);
        Ok(id)
    }

    /// Ergonomic façade for chaining `set`/`remove`/`get`/`delete` calls
    /// against a freshly created entity.
    pub fn entity(&mut self, id: EntityId) -> EntityRef<'_> {
        EntityRef::new(self, id)
    }

    /// Create an entity and immediately populate it with every component in
    /// `bundle`, going straight to the matching archetype instead of
    /// transitioning through the empty one component at a time.
    pub fn spawn_bundle<B: Bundle>(&mut self, bundle: B) -> Result<EntityId> {
        if self.locked {
            return Err(EcsError::LockedMutation);
        }
        let signature = make_signature(&B::component_ids());
        let (arch_id, created) = self.archetypes.find_or_create(signature)?;
        if let Some(new_id) = created {
            self.notify_new_archetype(new_id);
        }

        let id = self.entities.allocate();
        let archetype = self
            .archetypes
            .get_mut(arch_id)
            .expect("just found or created");
        let row = archetype.allocate_row(id)?;
        bundle.write_into(archetype, row)?;
        self.entities.insert(id, arch_id);
        Ok(id)
    }

    /// Create `count` component-less entities in one call.
    pub fn spawn_batch(&mut self, count: usize) -> Result<Vec<EntityId>> {
        if self.locked {
            return Err(EcsError::LockedMutation);
        }
        if count > self.config.max_batch_size {
            return Err(EcsError::BatchTooLarge {
                requested: count,
                limit: self.config.max_batch_size,
            });
        }

        let (empty_id, _) = self.archetypes.find_or_create(Signature::empty())?;
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let id = self.entities.allocate();
            self.archetypes
                .get_mut(empty_id)
                .expect("just found or created")
                .allocate_row(id)?;
            self.entities.insert(id, empty_id);
            ids.push(id);
        }
        Ok(ids)
    }

    /// Set (adding if absent) a component on `entity`.
    ///
    /// If the world is locked this is recorded in the deferred set queue
    /// instead of applied immediately.
    pub fn set<T: Component>(&mut self, entity: EntityId, value: T) -> Result<()> {
        if !self.entities.contains(entity) {
            return Err(EcsError::UnknownEntity(entity));
        }
        if self.locked {
            self.set_queue.push(entity, value);
            return Ok(());
        }
        self.set_immediate(entity, value)
    }

    fn set_immediate<T: Component>(&mut self, entity: EntityId, value: T) -> Result<()> {
        let from = self
            .entities
            .archetype_of(entity)
            .ok_or(EcsError::UnknownEntity(entity))?;
        let id = T::id();

        let already_has = self
            .archetypes
            .get(from)
            .map(|a| a.has_column(id))
            .unwrap_or(false);

        if already_has {
            let row = self
                .archetypes
                .get(from)
                .and_then(|a| a.row_of(entity))
                .ok_or(EcsError::UnknownEntity(entity))?;
            self.archetypes
                .get_mut(from)
                .expect("looked up above")
                .write_component(row, id, &value)?;
            return Ok(());
        }

        let to_signature = self
            .archetypes
            .get(from)
            .expect("looked up above")
            .signature()
            .with(id);
        let (to_id, created, displaced) = self.archetypes.change_type(entity, from, to_signature)?;
        if let Some(new_id) = created {
            self.notify_new_archetype(new_id);
        }
        if let Some(moved) = displaced {
            self.entities.set_archetype(moved, from);
        }
        self.entities.set_archetype(entity, to_id);

        let row = self
            .archetypes
            .get(to_id)
            .and_then(|a| a.row_of(entity))
            .expect("add_from always allocates a row for entity");
        self.archetypes
            .get_mut(to_id)
            .expect("looked up above")
            .write_component(row, id, &value)?;
        Ok(())
    }

    /// Remove a component from `entity`, a no-op if it wasn't present.
    pub fn remove<T: Component>(&mut self, entity: EntityId) -> Result<()> {
        if !self.entities.contains(entity) {
            return Err(EcsError::UnknownEntity(entity));
        }
        if self.locked {
            self.remove_queue.push(entity, T::id());
            return Ok(());
        }
        self.remove_immediate(T::id(), entity)
    }

    fn remove_immediate(&mut self, id: ComponentId, entity: EntityId) -> Result<()> {
        let from = self
            .entities
            .archetype_of(entity)
            .ok_or(EcsError::UnknownEntity(entity))?;

        let has = self
            .archetypes
            .get(from)
            .map(|a| a.has_column(id))
            .unwrap_or(false);
        if !has {
            return Ok(());
        }

        let to_signature = self
            .archetypes
            .get(from)
            .expect("looked up above")
            .signature()
            .without(id);
        let (to_id, created, displaced) = self.archetypes.change_type(entity, from, to_signature)?;
        if let Some(new_id) = created {
            self.notify_new_archetype(new_id);
        }
        if let Some(moved) = displaced {
            self.entities.set_archetype(moved, from);
        }
        self.entities.set_archetype(entity, to_id);
        Ok(())
    }

    pub fn get<T: Component>(&self, entity: EntityId) -> Option<&T> {
        let archetype_id = self.entities.archetype_of(entity)?;
        let archetype = self.archetypes.get(archetype_id)?;
        let row = archetype.row_of(entity)?;
        archetype.get::<T>(row).ok()
    }

    pub fn get_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        let archetype_id = self.entities.archetype_of(entity)?;
        let row = self.archetypes.get(archetype_id)?.row_of(entity)?;
        self.archetypes.get_mut(archetype_id)?.get_mut::<T>(row).ok()
    }

    pub fn has<T: Component>(&self, entity: EntityId) -> bool {
        self.entities
            .archetype_of(entity)
            .and_then(|id| self.archetypes.get(id))
            .map(|a| a.has_column(T::id()))
            .unwrap_or(false)
    }

    /// Delete `entity`, or enqueue its deletion if the world is locked.
    ///
    /// An entity deleting itself — `entity` equal to the one currently
    /// being passed to a running system's handler — is applied immediately
    /// even while locked. Reverse iteration (see `tick`) guarantees the
    /// swap-remove this triggers only ever touches a row already visited,
    /// so there is nothing for a deferred queue to protect here. Any other
    /// target is deferred to the graveyard, same as always.
    pub fn delete(&mut self, entity: EntityId) -> Result<()> {
        if !self.entities.contains(entity) {
            return Err(EcsError::UnknownEntity(entity));
        }
        if self.locked && self.visiting != Some(entity) {
            self.graveyard.push(entity);
            return Ok(());
        }
        self.delete_immediate(entity)
    }

    fn delete_immediate(&mut self, entity: EntityId) -> Result<()> {
        let archetype_id = self
            .entities
            .remove(entity)
            .ok_or(EcsError::UnknownEntity(entity))?;
        if let Some(archetype) = self.archetypes.get_mut(archetype_id) {
            if let Some(moved) = archetype.swap_delete(entity)? {
                self.entities.set_archetype(moved, archetype_id);
            }
        }
        Ok(())
    }

    /// Register a system requiring `signature`, matched immediately against
    /// every archetype that already exists.
    pub fn add_system<F>(&mut self, signature: Signature, handler: F) -> SystemId
    where
        F: FnMut(&mut World, EntityId) + Send + Sync + 'static,
    {
        let id = SystemId(self.next_system_id);
        self.next_system_id += 1;

        let mut system = System::new(id, signature, Box::new(handler) as SystemFn);
        for (archetype_id, archetype) in self.archetypes.iter() {
            system.consider_archetype(archetype_id, archetype.signature());
        }
        self.systems.push(system);
        id
    }

    fn notify_new_archetype(&mut self, archetype_id: usize) {
        let signature = self
            .archetypes
            .get(archetype_id)
            .expect("archetype was just created")
            .signature()
            .clone();
        for system in &mut self.systems {
            system.consider_archetype(archetype_id, &signature);
        }
    }

    /// Run every registered system once, in registration order, over every
    /// entity in every archetype it currently matches. Deferred mutations
    /// queued during a system's pass are drained, in set → remove → delete
    /// order, before the next system runs.
    pub fn tick(&mut self) -> Result<()> {
        for index in 0..self.systems.len() {
            self.run_system(index)?;
            self.drain_deferred()?;
        }
        Ok(())
    }

    fn run_system(&mut self, system_index: usize) -> Result<()> {
        #[cfg(feature = "profiling")]
        let _span = info_span!("world.run_system", system_index).entered();

        let matched = self.systems[system_index].matched_archetypes().to_vec();
        let mut handler = self.systems[system_index].take_handler();

        self.locked = true;
        for archetype_id in matched {
            // Iterate back to front ("Rule D"): starting at the last row
            // and walking down, an entity that deletes itself is always
            // the current last row at the moment of deletion (nothing else
            // shrinks this archetype mid-pass), so its swap-remove is a
            // no-op reindex and the next row down is still exactly where
            // we expect it.
            let mut row = match self.archetypes.get(archetype_id) {
                Some(a) => a.len(),
                None => continue,
            };
            while row > 0 {
                row -= 1;
                let entity = match self
                    .archetypes
                    .get(archetype_id)
                    .and_then(|a| a.entity_ids().get(row))
                {
                    Some(&e) => e,
                    None => break,
                };

                self.visiting = Some(entity);
                handler(self, entity);
                self.visiting = None;
            }
        }
        self.locked = false;

        self.systems[system_index].restore_handler(handler);
        Ok(())
    }

    fn drain_deferred(&mut self) -> Result<()> {
        for (id, entries) in self.set_queue.drain() {
            for (entity, bytes) in entries {
                self.apply_deferred_set(entity, id, bytes)?;
            }
        }
        for (id, entities) in self.remove_queue.drain() {
            for entity in entities {
                if self.entities.contains(entity) {
                    self.remove_immediate(id, entity)?;
                }
            }
        }
        for entity in self.graveyard.drain() {
            if self.entities.contains(entity) {
                self.delete_immediate(entity)?;
            }
        }
        Ok(())
    }

    fn apply_deferred_set(&mut self, entity: EntityId, id: ComponentId, bytes: Vec<u8>) -> Result<()> {
        if !self.entities.contains(entity) {
            return Ok(());
        }
        let from = self
            .entities
            .archetype_of(entity)
            .ok_or(EcsError::UnknownEntity(entity))?;

        let already_has = self
            .archetypes
            .get(from)
            .map(|a| a.has_column(id))
            .unwrap_or(false);

        let target = if already_has {
            from
        } else {
            let to_signature = self
                .archetypes
                .get(from)
                .expect("looked up above")
                .signature()
                .with(id);
            let (to_id, created, displaced) =
                self.archetypes.change_type(entity, from, to_signature)?;
            if let Some(new_id) = created {
                self.notify_new_archetype(new_id);
            }
            if let Some(moved) = displaced {
                self.entities.set_archetype(moved, from);
            }
            self.entities.set_archetype(entity, to_id);
            to_id
        };

        let row = self
            .archetypes
            .get(target)
            .and_then(|a| a.row_of(entity))
            .expect("entity has a row in its own archetype");
        self.archetypes
            .get_mut(target)
            .expect("looked up above")
            .write_raw(row, id, &bytes)?;
        Ok(())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Marker;

    #[test]
    fn new_entity_is_in_empty_archetype() {
        let mut world = World::new();
        let e = world.new_entity().unwrap();
        assert!(world.contains(e));
        assert!(world.get::<Position>(e).is_none());
    }

    #[test]
    fn set_moves_entity_into_matching_archetype() {
        let mut world = World::new();
        let e = world.new_entity().unwrap();
        world.set(e, Position { x: 1.0, y: 2.0 }).unwrap();
        assert_eq!(world.get::<Position>(e), Some(&Position { x: 1.0, y: 2.0 }));

        world.set(e, Velocity { dx: 0.5, dy: 0.0 }).unwrap();
        assert_eq!(world.get::<Position>(e), Some(&Position { x: 1.0, y: 2.0 }));
        assert_eq!(world.get::<Velocity>(e), Some(&Velocity { dx: 0.5, dy: 0.0 }));
    }

    #[test]
    fn remove_moves_entity_back_to_smaller_archetype() {
        let mut world = World::new();
        let e = world.new_entity().unwrap();
        world.set(e, Position { x: 1.0, y: 2.0 }).unwrap();
        world.set(e, Velocity { dx: 0.0, dy: 0.0 }).unwrap();
        world.remove::<Velocity>(e).unwrap();
        assert!(world.get::<Velocity>(e).is_none());
        assert_eq!(world.get::<Position>(e), Some(&Position { x: 1.0, y: 2.0 }));
    }

    #[test]
    fn distinct_signatures_land_in_distinct_archetypes() {
        let mut world = World::new();
        let a = world.spawn_bundle((Position { x: 0.0, y: 0.0 },)).unwrap();
        let b = world
            .spawn_bundle((Position { x: 0.0, y: 0.0 }, Velocity { dx: 1.0, dy: 1.0 }))
            .unwrap();

        let a_arch = world.entities.archetype_of(a).unwrap();
        let b_arch = world.entities.archetype_of(b).unwrap();
        assert_ne!(a_arch, b_arch);
    }

    #[test]
    fn deferred_set_during_tick_is_applied_after_the_system_returns() {
        let mut world = World::new();
        let e = world.spawn_bundle((Position { x: 0.0, y: 0.0 },)).unwrap();

        let sig = make_signature(&[Position::id()]);
        world.add_system(sig, move |world, entity| {
            // Adding Velocity mid-iteration must not be visible until the
            // tick's deferred-drain step runs.
            world.set(entity, Velocity { dx: 1.0, dy: 1.0 }).ok();
            assert!(world.get::<Velocity>(entity).is_none());
        });

        world.tick().unwrap();
        assert_eq!(world.get::<Velocity>(e), Some(&Velocity { dx: 1.0, dy: 1.0 }));
    }

    #[test]
    fn self_delete_during_reverse_iteration_is_safe() {
        let mut world = World::new();
        let a = world.spawn_bundle((Marker,)).unwrap();
        let b = world.spawn_bundle((Marker,)).unwrap();
        let c = world.spawn_bundle((Marker,)).unwrap();

        let sig = make_signature(&[Marker::id()]);
        world.add_system(sig, |world, entity| {
            world.delete(entity).ok();
        });

        world.tick().unwrap();
        assert!(!world.contains(a));
        assert!(!world.contains(b));
        assert!(!world.contains(c));
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn new_entity_while_locked_is_fatal() {
        let mut world = World::new();
        world.spawn_bundle((Marker,)).unwrap();
        let sig = make_signature(&[Marker::id()]);
        world.add_system(sig, |world, _entity| {
            assert!(matches!(world.new_entity(), Err(EcsError::LockedMutation)));
        });
        world.tick().unwrap();
    }

    #[test]
    fn get_of_absent_component_is_none_not_error() {
        let mut world = World::new();
        let e = world.new_entity().unwrap();
        assert_eq!(world.get::<Position>(e), None);
    }
}

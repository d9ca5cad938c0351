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

//! Component trait, the process-wide component registry, and `Bundle`.
//!
//! Component ids are assigned once per Rust type, the first time that type
//! is registered anywhere in the process, mirroring the original C++
//! `GetComponent<T>()`/`GetNextID()` static globals.

use once_cell::sync::Lazy;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::RwLock;

use smallvec::{smallvec, SmallVec};

use crate::archetype::Archetype;
use crate::error::{EcsError, Result};

/// Maximum number of components a `Bundle` tuple impl supports.
pub const MAX_BUNDLE_COMPONENTS: usize = 8;

/// Dense, process-wide component id. Assigned on first registration of a
/// component type and stable for the remainder of the process's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) u32);

impl ComponentId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Registry entry: id paired with byte size, matching the spec's "Component
/// id" data-model entry ("Paired with a byte size").
#[derive(Debug, Clone, Copy)]
pub struct ComponentDescriptor {
    pub id: ComponentId,
    pub size: usize,
}

struct Registry {
    by_type: HashMap<TypeId, ComponentDescriptor>,
    by_id: HashMap<ComponentId, ComponentDescriptor>,
    next_id: u32,
}

static REGISTRY: Lazy<RwLock<Registry>> = Lazy::new(|| {
    RwLock::new(Registry {
        by_type: HashMap::new(),
        by_id: HashMap::new(),
        next_id: 0,
    })
});

fn register_type(type_id: TypeId, size: usize) -> ComponentDescriptor {
    {
        let reg = REGISTRY.read().unwrap();
        if let Some(desc) = reg.by_type.get(&type_id) {
            return *desc;
        }
    }

    let mut reg = REGISTRY.write().unwrap();
    // Another thread may have registered the type between dropping the read
    // lock above and acquiring this write lock.
    if let Some(desc) = reg.by_type.get(&type_id) {
        return *desc;
    }

    let id = ComponentId(reg.next_id);
    reg.next_id = reg
        .next_id
        .checked_add(1)
        .expect("component id space exhausted");

    let desc = ComponentDescriptor { id, size };
    reg.by_type.insert(type_id, desc);
    reg.by_id.insert(id, desc);
    desc
}

/// Look up a previously registered component's descriptor by id.
///
/// Fails with [`EcsError::UnknownComponent`] if `id` was never registered.
pub fn descriptor_of(id: ComponentId) -> Result<ComponentDescriptor> {
    REGISTRY
        .read()
        .unwrap()
        .by_id
        .get(&id)
        .copied()
        .ok_or(EcsError::UnknownComponent(id))
}

/// Marker trait for component types.
///
/// Components are required to be `Copy`: the storage layer blits raw bytes
/// on append, write, and swap-remove and never runs a destructor on
/// copied-out data. `Copy` is the only sound way to express that contract
/// without `unsafe` leaking into every call site — a stricter bound than
/// `Send + Sync + 'static` alone, which would allow non-`Copy` types and
/// then require a manual per-column drop function to cover them.
pub trait Component: Copy + Send + Sync + 'static {
    /// This type's registered descriptor, registering it on first call.
    fn descriptor() -> ComponentDescriptor {
        register_type(TypeId::of::<Self>(), std::mem::size_of::<Self>())
    }

    /// This type's component id, registering it on first call.
    fn id() -> ComponentId {
        Self::descriptor().id
    }
}

impl<T: Copy + Send + Sync + 'static> Component for T {}

/// Idempotent registration entry point exposed on [`crate::world::World`]:
/// `register::<T>() -> ComponentId`.
pub fn register<T: Component>() -> ComponentId {
    T::id()
}

/// Bundle of components spawned onto an entity in one call.
///
/// Pure sugar over `World::new_entity` + `World::set`; introduces no new
/// storage semantics.
pub trait Bundle: Send + Sync + 'static {
    fn component_ids() -> SmallVec<[ComponentId; MAX_BUNDLE_COMPONENTS]>
    where
        Self: Sized;

    fn write_into(self, archetype: &mut Archetype, row: usize) -> Result<()>
    where
        Self: Sized;
}

macro_rules! impl_bundle {
    ($($T:ident),+) => {
        impl<$($T: Component),+> Bundle for ($($T,)+) {
            fn component_ids() -> SmallVec<[ComponentId; MAX_BUNDLE_COMPONENTS]> {
                smallvec![$($T::id()),+]
            }

            #[allow(non_snake_case)]
            fn write_into(self, archetype: &mut Archetype, row: usize) -> Result<()> {
                let ($($T,)+) = self;
                $(archetype.write_component(row, $T::id(), &$T)?;)+
                Ok(())
            }
        }
    };
}

impl_bundle!(A);
impl_bundle!(A, B);
impl_bundle!(A, B, C);
impl_bundle!(A, B, C, D);
impl_bundle!(A, B, C, D, E);
impl_bundle!(A, B, C, D, E, F);
impl_bundle!(A, B, C, D, E, F, G);
impl_bundle!(A, B, C, D, E, F, G, H);

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

    #[derive(Debug, Clone, Copy)]
    struct Velocity {
        #[allow(dead_code)]
        x: f32,
        #[allow(dead_code)]
        y: f32,
    }

    #[test]
    fn registering_same_type_twice_returns_same_id() {
        let a = Position::id();
        let b = Position::id();
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_types_get_distinct_ids() {
        assert_ne!(Position::id(), Velocity::id());
    }

    #[test]
    fn descriptor_of_unknown_id_fails() {
        let bogus = ComponentId(u32::MAX);
        assert!(matches!(
            descriptor_of(bogus),
            Err(EcsError::UnknownComponent(_))
        ));
    }

    #[test]
    fn bundle_collects_ids_in_order() {
        let ids = <(Position, Velocity)>::component_ids();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], Position::id());
        assert_eq!(ids[1], Velocity::id());
    }
}

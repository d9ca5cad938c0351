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

//! Archetype ECS - an archetype-based Entity Component System core.
//!
//! Entities are grouped into archetypes by their exact component signature;
//! each archetype stores its components column-major, one contiguous buffer
//! per component type. Structural changes made while a system is iterating
//! are deferred and applied once that system's pass finishes.

pub mod archetype;
pub mod archetype_index;
pub mod column;
pub mod component;
pub mod config;
pub mod deferred;
pub mod entity;
pub mod error;
pub mod signature;
pub mod system;
pub mod world;

pub use archetype::Archetype;
pub use component::{Bundle, Component, ComponentDescriptor, ComponentId};
pub use config::EcsConfig;
pub use entity::{EntityId, EntityRef};
pub use error::{EcsError, Result};
pub use signature::Signature;
pub use system::{SystemFn, SystemId};
pub use world::World;

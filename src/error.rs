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

//! Error types
//!
//! Every variant here corresponds to a "Fatal" condition in the core's error
//! policy: the world has nothing sensible left to do with the request. This
//! port returns `Result` instead of aborting the process; callers may
//! propagate, log, or `.expect()` as they see fit.

use std::fmt;

use crate::component::ComponentId;
use crate::entity::EntityId;

/// ECS error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcsError {
    /// A component id was used that was never registered.
    UnknownComponent(ComponentId),

    /// An entity id has no location in the world's entity index.
    UnknownEntity(EntityId),

    /// Attempted to add an entity id that already occupies a row in the
    /// target archetype.
    DuplicateEntity(EntityId),

    /// A structural mutation was attempted that cannot be deferred: either a
    /// new archetype would need to be created while the world is locked, or
    /// `new_entity` was called while locked.
    LockedMutation,

    /// A column index fell outside `[0, count)`.
    OutOfBounds { index: usize, count: usize },

    /// A column growth step would have overflowed its counter.
    GrowthOverflow,

    /// The archetype-count ceiling configured via `EcsConfig` was reached.
    ArchetypeLimitExceeded(usize),

    /// `spawn_batch` was asked to create more entities than the configured
    /// batch ceiling allows.
    BatchTooLarge { requested: usize, limit: usize },
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::UnknownComponent(id) => write!(f, "unregistered component id {id:?}"),
            EcsError::UnknownEntity(e) => write!(f, "entity {e:?} has no archetype location"),
            EcsError::DuplicateEntity(e) => {
                write!(f, "entity {e:?} already present in target archetype")
            }
            EcsError::LockedMutation => {
                write!(f, "structural mutation attempted while the world is locked")
            }
            EcsError::OutOfBounds { index, count } => {
                write!(f, "column index {index} out of bounds for count {count}")
            }
            EcsError::GrowthOverflow => write!(f, "column growth step would overflow capacity"),
            EcsError::ArchetypeLimitExceeded(limit) => {
                write!(f, "archetype count ceiling of {limit} reached")
            }
            EcsError::BatchTooLarge { requested, limit } => {
                write!(f, "batch size {requested} exceeds configured limit {limit}")
            }
        }
    }
}

impl std::error::Error for EcsError {}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EcsError>;

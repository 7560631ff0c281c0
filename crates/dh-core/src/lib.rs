//! Core types for the Daggerheart rules engine: actors, items, session
//! tables, and the privileged mutation gate.
//!
//! This crate defines the document model the rest of the engine operates
//! on. It is independent of any host application; the "documents" are
//! plain in-memory structs with a scoped flag bag for persisted engine
//! state, and the seams to a hosting tabletop application (dice animation,
//! cross-session writes) are expressed as traits.

/// Actor documents: traits, resources, statuses, owned items.
pub mod actor;
/// The dice-source seam and reference rollers.
pub mod dice;
/// Error types used throughout the engine.
pub mod error;
/// Dotted-path numeric field store and standard field paths.
pub mod fields;
/// Item documents: categories, container state, armor stats.
pub mod item;
/// Session roles and the privileged mutation gate.
pub mod relay;
/// The session table that owns actors and the shared Fear counter.
pub mod table;
/// Clamped resource tracks.
pub mod track;

pub use actor::{Actor, ActorId, ActorKind, TraitKey};
pub use dice::{DiceRoller, RandomRoller, ScriptedRoller};
pub use error::{CoreError, CoreResult};
pub use fields::{FieldStore, FlagBag};
pub use item::{Container, Item, ItemCategory, ItemId};
pub use relay::{Mutation, Role, Session};
pub use table::Table;
pub use track::Track;

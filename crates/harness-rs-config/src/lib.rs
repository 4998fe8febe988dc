//! Configuration schema and layered config resolution.
//!
//! This crate owns the harness config schema, the descriptor tables that
//! drive default and environment assignment, and the overlay loading and
//! merging used to resolve a config before a run starts.

mod descriptor;
mod env;
mod error;
mod loader;
mod model;
mod transform;

/// Descriptor tables and walking.
pub use descriptor::{
    FieldDescriptor, FieldInfo, FieldKind, FieldRef, FieldSlot, Leaf, LeafVisitor, NestedSchema,
    Schema, walk_fields,
};
/// Environment variable sources.
pub use env::{Environment, ProcessEnvironment};
/// Public error type returned by resolution APIs.
pub use error::ConfigError;
/// Resolver, passes, and overlay loading.
pub use loader::{
    BundledOverlay, BundledOverlays, OverlaySource, Resolver, Stage, load as load_overlay, resolve,
};
/// Harness configuration schema.
pub use model::*;
/// Sentinel transforms.
pub use transform::{MAX_RANDOM_LENGTH, TEMP_DIR_SENTINEL, Transform, random_string};

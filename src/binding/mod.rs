//! # Path Resolver
//!
//! Addressable, mutable backing data with read/write by binding path.

mod path;
mod store;

pub use path::{BindingPath, Segment};
pub use store::{DataStore, ListenerId, Lookup};

//! # Renderer Engine
//!
//! Rendering of validated trees through a host-supplied component registry,
//! reactive visibility, and action dispatch.

mod actions;
mod engine;
mod live;
mod registry;

pub use actions::{dispatch_action, dispatch_action_with, ActionHandler, ActionHandlers, ActionInvocation};
pub use engine::{NodeState, RenderPass, Renderer};
pub use live::LiveView;
pub use registry::{BoundValue, ComponentRegistry, ElementView, RenderFn, VerifiedRegistry};

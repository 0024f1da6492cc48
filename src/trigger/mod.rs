//! Trigger glue.
//!
//! Collaborators that feed `(trigger, message)` pairs into the pool. The
//! event source itself (keyboard hook, stdin, anything else) lives outside
//! the crate and only calls [`TriggerDispatcher::fire`].
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `bindings` | JSON trigger→message configuration |
//! | `dispatcher` | Per-trigger handlers over a shared pool |

// ============================================================================
// Submodules
// ============================================================================

/// Trigger bindings configuration.
pub mod bindings;

/// Trigger dispatch.
pub mod dispatcher;

// ============================================================================
// Re-exports
// ============================================================================

pub use bindings::{Binding, Bindings};
pub use dispatcher::{TriggerDispatcher, TriggerHandler};

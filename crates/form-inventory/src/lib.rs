//! Form inventory: one scan of the document producing the typed
//! [`FormSnapshot`](formpilot_core_types::FormSnapshot) that planners
//! consume and executors resolve against.
//!
//! Scanning is read-only and idempotent. Stable ids are derived from the
//! control's own identity (`id`, then `name`) so a plan written against one
//! snapshot still resolves after a re-render; positional ids are a last
//! resort for anonymous controls.

pub mod builder;
pub mod errors;
pub mod labels;

pub use builder::InventoryBuilder;
pub use errors::InventoryError;

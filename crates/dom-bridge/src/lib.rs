//! Bridge between the autofill engine and a live, re-rendering document.
//!
//! The engine never retains raw references into the page. It holds
//! revision-tagged [`NodeId`] handles that go stale the moment the host
//! document re-renders, forcing every consumer back through the resolver.
//! [`DomPort`] is the only surface through which the page is read or
//! mutated; [`FixtureDom`] is an in-memory implementation used by the CLI
//! and by tests across the workspace.

mod errors;
mod fixture;
mod model;
mod port;

pub use errors::DomError;
pub use fixture::{ControlSpec, FixtureDoc, FixtureDom};
pub use model::{ControlTag, DomEvent, FilePayload, NodeId, NodeSnapshot, OptionState};
pub use port::DomPort;

//! Action execution against a live document.
//!
//! Each action kind has its own commit protocol, tuned to what real form
//! stacks tolerate: plain inputs take a native-setter write plus input and
//! change notifications; selects need a full open gesture, settle time,
//! read-back verification and a retry; toggles are direct; uploads degrade
//! from synthetic transfer to property override to the user's own picker.

mod click;
mod errors;
mod executor;
mod fill;
mod ports;
mod select;
mod tempo;
mod toggle;
mod upload;

pub use errors::ExecError;
pub use executor::{ActionExecutor, Applied, PlanContext};
pub use ports::{fallback_cover_letter, AttachmentPayload, AttachmentPort};
pub use tempo::Tempo;
pub use upload::MANUAL_UPLOAD;

//! HTTP surface for the chat and webhook collaborators.

mod caller;
mod decisions;
pub mod dto;
mod groups;
pub mod response;
mod router;
mod rules;

pub use caller::{ACTING_USER_HEADER, Caller, RequireToken};
pub use router::{AppState, create_router};

//! Stored operator session and what it is allowed to do.

mod capability;
mod session;

pub use capability::{Capabilities, Capability, Role, resolve_capabilities};
pub use session::AdminSession;

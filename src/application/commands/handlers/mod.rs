//! Command Handlers 实现

mod narrate_handlers;

pub use narrate_handlers::*;

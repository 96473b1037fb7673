//! Terminal user interface.

pub mod error;
pub mod scope;

pub use error::{show_error_screen, ErrorScreen};
pub use scope::{ScopeCommand, ScopeTui};

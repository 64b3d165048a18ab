//! Namespace session: a tree plus the current directory, with the policy
//! applied to every command.

pub mod path;
#[allow(clippy::module_inception)]
mod session;

pub use session::{NamespaceError, Session};

//! Interactive front-end: parses command lines into [`Command`]s and runs
//! them against a [`Session`](crate::session::Session).

mod command;
mod output;
#[allow(clippy::module_inception)]
mod shell;

pub use command::{Command, USAGE};
pub use shell::{Shell, ShellError};

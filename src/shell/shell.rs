use std::fmt::Display;
use std::io::{self, Write};

use colored::Color;
use futures::{AsyncBufRead, AsyncBufReadExt, StreamExt};
use snafu::prelude::*;
use tracing::{debug, info};

use crate::session::{NamespaceError, Session};
use crate::shell::output::{BANNER, format_listing, paint};
use crate::shell::{Command, USAGE};

/// Whether the loop should keep reading commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Line-oriented front-end over a [`Session`].
pub struct Shell<W> {
    session: Session,
    out: W,
    color: bool,
}

impl<W: Write> Shell<W> {
    pub fn new(session: Session, out: W, color: bool) -> Self {
        Self {
            session,
            out,
            color,
        }
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn into_parts(self) -> (Session, W) {
        (self.session, self.out)
    }

    /// Reads commands until `exit` or end of input.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> Result<(), ShellError> {
        self.print_banner().context(OutputSnafu)?;
        self.print_current_directory().context(OutputSnafu)?;

        let mut lines = input.lines();
        while let Some(line) = lines.next().await {
            let line = line.context(InputSnafu)?;
            if self.handle_line(&line).context(OutputSnafu)? == Flow::Exit {
                info!("Exit requested");
                return Ok(());
            }
        }

        debug!("Input closed, leaving the command loop");
        Ok(())
    }

    /// Parses and executes one line, printing its result or error.
    pub fn handle_line(&mut self, line: &str) -> io::Result<Flow> {
        let flow = match line.parse::<Command>() {
            Ok(command) => match self.execute(command) {
                Ok(flow) => flow,
                Err(ExecuteError::Namespace { source }) => {
                    self.print_error(&source)?;
                    Flow::Continue
                }
                Err(ExecuteError::Output { source }) => return Err(source),
            },
            Err(error) => {
                debug!("Rejected input '{}': {}", line, error);
                writeln!(self.out, "{error}")?;
                Flow::Continue
            }
        };
        self.out.flush()?;
        Ok(flow)
    }

    fn execute(&mut self, command: Command) -> Result<Flow, ExecuteError> {
        debug!("Executing {:?}", command);
        match command {
            Command::Mkdir { name } => self.session.make_directory(&name)?,
            Command::Ls => {
                let listing = format_listing(&self.session.list());
                writeln!(self.out, "{listing}")?;
            }
            Command::Cd { target } => {
                let outcome = self.session.change_directory(&target).map(|_| ());
                if let Err(error) = outcome {
                    self.print_error(&error)?;
                }
                self.print_current_directory()?;
            }
            Command::Cat { name } => {
                let content = self.session.read_file(&name)?;
                writeln!(self.out, "{content}")?;
            }
            Command::Touch { name } => self.session.create_file(&name)?,
            Command::Echo { name, words } => self.session.append_text(&name, &words)?,
            Command::Mv { src, dst } => self.session.move_entry(&src, &dst)?,
            Command::Cp { src, dst } => self.session.copy_entry(&src, &dst)?,
            Command::Rm { path } => self.session.remove(&path)?,
            Command::Grep { name, pattern } => {
                if self.session.grep(&name, &pattern)? {
                    let found = format!("Pattern '{pattern}' found in {name}");
                    writeln!(self.out, "{}", paint(&found, Color::Yellow, self.color))?;
                }
            }
            Command::Pwd => writeln!(self.out, "{}", self.session.current_path())?,
            Command::Help => {
                for (_, usage) in USAGE {
                    writeln!(self.out, "  {usage}")?;
                }
            }
            Command::Exit => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }

    pub fn print_banner(&mut self) -> io::Result<()> {
        let verbs = USAGE
            .iter()
            .map(|(verb, _)| *verb)
            .filter(|verb| !matches!(*verb, "pwd" | "help" | "exit"))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(self.out, "{BANNER}")?;
        writeln!(self.out, "List of Commands: {verbs}")?;
        writeln!(self.out, "Type 'exit' to exit the program\n")
    }

    pub fn print_error(&mut self, error: &impl Display) -> io::Result<()> {
        let message = format!("Error: {error}");
        writeln!(self.out, "{}", paint(&message, Color::Red, self.color))
    }

    fn print_current_directory(&mut self) -> io::Result<()> {
        let message = format!("Current directory: {}", self.session.current_path());
        writeln!(self.out, "{}\n", paint(&message, Color::Yellow, self.color))
    }
}

#[derive(Debug, Snafu)]
enum ExecuteError {
    #[snafu(context(false))]
    Namespace { source: NamespaceError },
    #[snafu(context(false))]
    Output { source: io::Error },
}

#[derive(Debug, Snafu)]
pub enum ShellError {
    #[snafu(display("Failed to read a command"))]
    InputError { source: io::Error },
    #[snafu(display("Failed to write command output"))]
    OutputError { source: io::Error },
}

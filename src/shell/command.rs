use std::str::{FromStr, SplitWhitespace};

use snafu::prelude::*;

/// One parsed input line, carrying its validated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Mkdir { name: String },
    Ls,
    Cd { target: String },
    Cat { name: String },
    Touch { name: String },
    Echo { name: String, words: Vec<String> },
    Mv { src: String, dst: String },
    Cp { src: String, dst: String },
    Rm { path: String },
    Grep { name: String, pattern: String },
    Pwd,
    Help,
    Exit,
}

/// Verbs with their usage, in the order they are advertised.
pub const USAGE: &[(&str, &str)] = &[
    ("mkdir", "mkdir <name>"),
    ("ls", "ls"),
    ("cd", "cd <path>"),
    ("cat", "cat <name>"),
    ("touch", "touch <name>"),
    ("echo", "echo <name> <text...>"),
    ("mv", "mv <src> <dst>"),
    ("cp", "cp <src> <dst>"),
    ("rm", "rm <path>"),
    ("grep", "grep <name> <pattern>"),
    ("pwd", "pwd"),
    ("help", "help"),
    ("exit", "exit"),
];

fn usage(verb: &str) -> &'static str {
    USAGE
        .iter()
        .find(|(name, _)| *name == verb)
        .map(|(_, usage)| *usage)
        .unwrap_or("help")
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let verb = tokens.next().context(EmptySnafu)?;
        let mut args = Arguments {
            usage: usage(verb),
            tokens,
        };

        let command = match verb {
            "mkdir" => Command::Mkdir {
                name: args.required()?,
            },
            "ls" => Command::Ls,
            "cd" => Command::Cd {
                target: args.optional().unwrap_or_default(),
            },
            "cat" => Command::Cat {
                name: args.required()?,
            },
            "touch" => Command::Touch {
                name: args.required()?,
            },
            "echo" => Command::Echo {
                name: args.required()?,
                words: args.rest(),
            },
            "mv" => Command::Mv {
                src: args.required()?,
                dst: args.required()?,
            },
            "cp" => Command::Cp {
                src: args.required()?,
                dst: args.required()?,
            },
            "rm" => Command::Rm {
                path: args.required()?,
            },
            "grep" => Command::Grep {
                name: args.required()?,
                pattern: args.required()?,
            },
            "pwd" => Command::Pwd,
            "help" => Command::Help,
            "exit" => Command::Exit,
            other => return UnknownCommandSnafu { verb: other }.fail(),
        };

        args.finish()?;
        Ok(command)
    }
}

struct Arguments<'a> {
    usage: &'static str,
    tokens: SplitWhitespace<'a>,
}

impl Arguments<'_> {
    fn required(&mut self) -> Result<String, CommandParseError> {
        self.optional().context(MissingArgumentSnafu { usage: self.usage })
    }

    fn optional(&mut self) -> Option<String> {
        self.tokens.next().map(str::to_string)
    }

    fn rest(&mut self) -> Vec<String> {
        self.tokens.by_ref().map(str::to_string).collect()
    }

    fn finish(mut self) -> Result<(), CommandParseError> {
        match self.tokens.next() {
            Some(extra) => TooManyArgumentsSnafu {
                usage: self.usage,
                extra,
            }
            .fail(),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    #[snafu(display("Please enter a command"))]
    Empty,
    #[snafu(display("Invalid command: {}", verb))]
    UnknownCommand { verb: String },
    #[snafu(display("Missing argument, usage: {}", usage))]
    MissingArgument { usage: &'static str },
    #[snafu(display("Unexpected argument '{}', usage: {}", extra, usage))]
    TooManyArguments { usage: &'static str, extra: String },
}

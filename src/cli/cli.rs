use std::path::PathBuf;

use clap::Parser;

use crate::application::data::LogLevel;
use crate::persistence::SnapshotFormat;

/// In-memory file system shell that keeps its namespace between sessions.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// Directory holding `memfs.yaml` and the default state file
    #[clap(long, short, default_value = ".")]
    pub root: PathBuf,

    /// Snapshot file to load at start and save on exit
    #[clap(long, short)]
    pub state_file: Option<PathBuf>,

    /// Snapshot encoding, inferred from the state file extension when omitted
    #[clap(long, short, value_enum)]
    pub format: Option<SnapshotFormat>,

    /// Disable colored output
    #[clap(long)]
    pub no_color: bool,
}

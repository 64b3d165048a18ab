use std::path::PathBuf;

use crate::cli::Cli;
use crate::config::Settings;
use crate::persistence::{SnapshotFormat, default_state_file};

/// Effective configuration: CLI flags first, then `memfs.yaml`, then defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub root: PathBuf,
    pub state_file: PathBuf,
    pub format: SnapshotFormat,
    pub color: bool,
}

impl RuntimeConfig {
    pub fn new(cli: Cli, settings: Settings) -> Self {
        let state_file = cli
            .state_file
            .or_else(|| settings.state_file.map(|path| cli.root.join(path)))
            .unwrap_or_else(|| default_state_file(&cli.root));
        let format = cli
            .format
            .or(settings.format)
            .unwrap_or_else(|| SnapshotFormat::from_path(&state_file));
        let color = !cli.no_color && settings.color.unwrap_or(true);

        Self {
            root: cli.root,
            state_file,
            format,
            color,
        }
    }
}

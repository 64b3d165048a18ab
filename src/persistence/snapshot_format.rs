use std::path::Path;

use clap::ValueEnum;
use derive_more::Display;

/// On-disk encoding of a namespace snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default, Display)]
pub enum SnapshotFormat {
    /// Human readable JSON document
    #[default]
    #[display("json")]
    Json,
    /// bincode, compressed with zstd
    #[display("binary")]
    Binary,
}

impl SnapshotFormat {
    /// `.json` files are JSON, everything else is binary.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SnapshotFormat::Json,
            _ => SnapshotFormat::Binary,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "json" => Some(SnapshotFormat::Json),
            "binary" | "bin" => Some(SnapshotFormat::Binary),
            _ => None,
        }
    }
}

use std::io;
use std::path::{Path, PathBuf};

use compio::fs;
use serde::Deserialize;
use snafu::{ResultExt, Snafu};
use tracing::{debug, info};

use crate::ext::BestEffortPathExt;
use crate::filesystem::Snapshot;
use crate::persistence::SnapshotFormat;

const STATE_DIR: &str = ".memfs";
const STATE_FILE_NAME: &str = "filesystem_state.json";
const ZSTD_LEVEL: i32 = 3;

/// Where the snapshot lives when neither settings nor CLI name a file.
pub fn default_state_file(root: &Path) -> PathBuf {
    root.join(STATE_DIR).join(STATE_FILE_NAME)
}

/// Reads and writes whole snapshots at a single location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStore {
    path: PathBuf,
    format: SnapshotFormat,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>, format: SnapshotFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored snapshot. A missing file is reported as
    /// [`SnapshotStoreError::Unavailable`].
    pub async fn load(&self) -> Result<Snapshot, SnapshotStoreError> {
        let file_path = self.path.best_effort_path_display();
        debug!("Reading {} snapshot from {}", self.format, file_path);

        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return UnavailableSnafu { file_path }.fail();
            }
            Err(e) => return Err(e).context(ReadSnafu { file_path }),
        };

        let snapshot = decode(&bytes, self.format)?;
        info!(
            "Loaded {} entries ({} bytes) from {}",
            snapshot.entry_count(),
            bytes.len(),
            file_path
        );
        Ok(snapshot)
    }

    /// Writes `snapshot`, creating the parent directory when needed.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotStoreError> {
        let file_path = self.path.best_effort_path_display();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.context(CreateDirSnafu {
                    dir_path: parent.best_effort_path_display(),
                })?;
            }
        }

        let bytes = encode(snapshot, self.format)?;
        let size = bytes.len();
        let res = fs::write(&self.path, bytes).await;
        res.0.context(WriteSnafu {
            file_path: file_path.clone(),
        })?;

        info!(
            "Saved {} entries ({} bytes) to {}",
            snapshot.entry_count(),
            size,
            file_path
        );
        Ok(())
    }
}

fn encode(snapshot: &Snapshot, format: SnapshotFormat) -> Result<Vec<u8>, SnapshotStoreError> {
    match format {
        SnapshotFormat::Json => serde_json::to_vec_pretty(snapshot).context(JsonSnafu),
        SnapshotFormat::Binary => {
            let raw = bincode::encode_to_vec(snapshot, bincode::config::standard())
                .context(EncodeSnafu)?;
            zstd::encode_all(raw.as_slice(), ZSTD_LEVEL).context(CompressionSnafu)
        }
    }
}

fn decode(bytes: &[u8], format: SnapshotFormat) -> Result<Snapshot, SnapshotStoreError> {
    match format {
        SnapshotFormat::Json => {
            // Two JSON levels per namespace level, so nesting depth is unbounded.
            let mut json = serde_json::Deserializer::from_slice(bytes);
            json.disable_recursion_limit();
            let snapshot = Snapshot::deserialize(serde_stacker::Deserializer::new(&mut json))
                .context(JsonSnafu)?;
            json.end().context(JsonSnafu)?;
            Ok(snapshot)
        }
        SnapshotFormat::Binary => {
            let raw = zstd::decode_all(bytes).context(CompressionSnafu)?;
            let (snapshot, _) = bincode::decode_from_slice(&raw, bincode::config::standard())
                .context(DecodeSnafu)?;
            Ok(snapshot)
        }
    }
}

#[derive(Debug, Snafu)]
pub enum SnapshotStoreError {
    #[snafu(display("File system state file not found ({})", file_path))]
    Unavailable { file_path: String },
    #[snafu(display("Failed to read the state file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Failed to create the state directory: {}", dir_path))]
    CreateDirError {
        dir_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Failed to write the state file: {}", file_path))]
    WriteError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Malformed JSON snapshot"))]
    JsonError { source: serde_json::Error },
    #[snafu(display("Failed to encode the binary snapshot"))]
    EncodeError {
        source: bincode::error::EncodeError,
    },
    #[snafu(display("Malformed binary snapshot"))]
    DecodeError {
        source: bincode::error::DecodeError,
    },
    #[snafu(display("Failed to (de)compress the binary snapshot"))]
    CompressionError { source: std::io::Error },
}

impl SnapshotStoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SnapshotStoreError::Unavailable { .. })
    }
}

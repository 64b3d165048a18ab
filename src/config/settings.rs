use std::io;
use std::path::{Path, PathBuf};

use compio::fs;
use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::prelude::*;
use tracing::debug;

use crate::ext::BestEffortPathExt;
use crate::persistence::SnapshotFormat;

const SETTINGS_FILE_NAME: &str = "memfs.yaml";

fn get_settings_file_path(root: &Path) -> PathBuf {
    root.join(SETTINGS_FILE_NAME)
}

/// Optional project settings read from `memfs.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub state_file: Option<PathBuf>,
    pub format: Option<SnapshotFormat>,
    pub color: Option<bool>,
}

impl Settings {
    /// Reads the settings file under `root`; a missing file yields defaults.
    pub async fn read(root: &Path) -> Result<Self, SettingsError> {
        let path = get_settings_file_path(root);
        let file_path = path.best_effort_path_display();
        debug!("Opening settings file: {}", file_path);

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No settings file at {}, using defaults", file_path);
                return Ok(Self::default());
            }
            Err(e) => return Err(e).context(ReadSnafu { file_path }),
        };
        let contents = String::from_utf8(bytes).context(EncodingSnafu { file_path })?;
        contents.as_str().try_into()
    }

    fn parse_settings(top_level: &LinkedHashMap<Yaml, Yaml>) -> Result<Self, SettingsError> {
        let mut settings = Settings::default();

        for (key, value) in top_level {
            let Yaml::Value(Scalar::String(key)) = key else {
                debug!("Skipping non-string settings key: {:?}", key);
                continue;
            };
            let key: &str = key;

            match key {
                "state_file" => {
                    let path = value.as_str().context(InvalidValueSnafu {
                        key: "state_file",
                        expected: "a path",
                    })?;
                    settings.state_file = Some(PathBuf::from(path));
                }
                "format" => {
                    let format = value
                        .as_str()
                        .and_then(SnapshotFormat::from_name)
                        .context(InvalidValueSnafu {
                            key: "format",
                            expected: "'json' or 'binary'",
                        })?;
                    settings.format = Some(format);
                }
                "color" => match value {
                    Yaml::Value(Scalar::Boolean(color)) => settings.color = Some(*color),
                    _ => {
                        return InvalidValueSnafu {
                            key: "color",
                            expected: "a boolean",
                        }
                        .fail();
                    }
                },
                other => debug!("Ignoring unknown settings key: {}", other),
            }
        }

        Ok(settings)
    }
}

impl TryFrom<&str> for Settings {
    type Error = SettingsError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents = Yaml::load_from_str(contents).context(ParseSnafu)?;
        let Some(document) = documents.first() else {
            return Ok(Self::default());
        };

        match document {
            Yaml::Value(Scalar::Null) => Ok(Self::default()),
            _ => {
                let top_level = document.as_mapping().context(TopLevelNotMapSnafu)?;
                Self::parse_settings(top_level)
            }
        }
    }
}

#[derive(Debug, Snafu)]
pub enum SettingsError {
    #[snafu(display("Failed to read the settings file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("The settings file is not valid UTF-8: {}", file_path))]
    EncodingError {
        file_path: String,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Failed to parse the settings file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Top level of the settings file should be a map"))]
    TopLevelNotMap,
    #[snafu(display("Setting '{}' should be {}", key, expected))]
    InvalidValue {
        key: &'static str,
        expected: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use tempfile::TempDir;

    #[compio::test]
    async fn missing_settings_file_yields_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let settings = Settings::read(temp_dir.path()).await.unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[compio::test]
    async fn settings_file_is_read_from_root() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        std::fs::write(
            temp_dir.path().join(SETTINGS_FILE_NAME),
            "state_file: snapshots/ns.bin\nformat: binary\ncolor: false\n",
        )
        .expect("Failed to write settings");

        let settings = Settings::read(temp_dir.path()).await.unwrap();

        assert_eq!(
            settings,
            Settings {
                state_file: Some(PathBuf::from("snapshots/ns.bin")),
                format: Some(SnapshotFormat::Binary),
                color: Some(false),
            }
        );
    }

    #[compio::test]
    async fn unreadable_settings_file_is_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        std::fs::create_dir(temp_dir.path().join(SETTINGS_FILE_NAME))
            .expect("Failed to create directory");

        let result = Settings::read(temp_dir.path()).await;

        assert!(matches!(result, Err(SettingsError::ReadError { .. })));
    }

    #[compio::test]
    async fn invalid_utf8_settings_file_is_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        std::fs::write(temp_dir.path().join(SETTINGS_FILE_NAME), [0xff, 0xfe, 0x00])
            .expect("Failed to write settings");

        let result = Settings::read(temp_dir.path()).await;

        assert!(matches!(result, Err(SettingsError::EncodingError { .. })));
    }

    #[rstest]
    #[case("")]
    #[case("~")]
    #[case("unrelated: 1")]
    fn empty_or_unrelated_settings_yield_defaults(#[case] contents: &str) {
        let settings: Settings = contents.try_into().unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn invalid_yaml_is_a_parse_error() {
        let result: Result<Settings, _> = "invalid: yaml: content: [unclosed".try_into();
        assert!(matches!(result, Err(SettingsError::ParseError { .. })));
    }

    #[rstest]
    #[case("- item1\n- item2")]
    #[case("just a string")]
    fn top_level_must_be_a_map(#[case] contents: &str) {
        let result: Result<Settings, _> = contents.try_into();
        assert!(matches!(result, Err(SettingsError::TopLevelNotMap)));
    }

    #[rstest]
    #[case("format: yaml", "format")]
    #[case("color: sometimes", "color")]
    #[case("state_file: [a, b]", "state_file")]
    fn invalid_values_name_the_key(#[case] contents: &str, #[case] expected_key: &str) {
        let result: Result<Settings, _> = contents.try_into();
        match result {
            Err(SettingsError::InvalidValue { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
    }
}

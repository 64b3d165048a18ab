use compio::io::compat::AsyncStream;
use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info, warn};

use crate::application::RuntimeConfig;
use crate::cli::Cli;
use crate::config::{Settings, SettingsError};
use crate::ext::BestEffortPathExt;
use crate::persistence::{SnapshotStore, SnapshotStoreError};
use crate::session::{NamespaceError, Session};
use crate::shell::{Shell, ShellError};

pub struct Application;

impl Application {
    pub async fn run(cli: Cli) -> Result<(), ApplicationError> {
        let settings = Settings::read(&cli.root).await.context(SettingsSnafu)?;
        debug!("Loaded settings: {:?}", settings);

        let runtime_config = RuntimeConfig::new(cli, settings);
        debug!("Runtime config: {:?}", runtime_config);
        info!(
            "Namespace root {}, state file {}",
            runtime_config.root.best_effort_path_display(),
            runtime_config.state_file.best_effort_path_display()
        );

        let store = SnapshotStore::new(runtime_config.state_file.clone(), runtime_config.format);
        let color = runtime_config.color
            && supports_color::on(supports_color::Stream::Stdout).is_some();
        let mut shell = Shell::new(Session::new(), std::io::stdout(), color);

        if let Err(error) = Self::restore(&store, shell.session_mut()).await {
            match &error {
                ApplicationError::LoadError { source } if source.is_unavailable() => {
                    info!("{}", error)
                }
                _ => warn!("Starting with an empty namespace: {}", error),
            }
            shell.print_error(&error).context(ReportSnafu)?;
        }

        let input = futures::io::BufReader::new(AsyncStream::new(compio::fs::stdin()));
        shell.run(input).await.context(ShellSnafu)?;

        let (session, _) = shell.into_parts();
        store.save(&session.snapshot()).await.context(SaveSnafu)?;
        info!(
            "Namespace saved to {}",
            store.path().best_effort_path_display()
        );

        Ok(())
    }

    /// Replaces the session's namespace with the stored snapshot.
    async fn restore(store: &SnapshotStore, session: &mut Session) -> Result<(), ApplicationError> {
        let snapshot = store.load().await.context(LoadSnafu)?;
        session.restore(&snapshot).context(RestoreSnafu)?;
        Ok(())
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered while reading settings"))]
    SettingsError { source: SettingsError },
    #[snafu(display("{}", source))]
    LoadError { source: SnapshotStoreError },
    #[snafu(display("The saved namespace is unusable: {}", source))]
    RestoreError { source: NamespaceError },
    #[snafu(display("Failed to report a startup problem"))]
    ReportError { source: std::io::Error },
    #[snafu(display("Critical failure encountered in the command loop"))]
    ShellError { source: ShellError },
    #[snafu(display("Failed to save the namespace"))]
    SaveError { source: SnapshotStoreError },
}

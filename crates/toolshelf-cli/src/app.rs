//! Wiring of the store, backend client and session machine.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use tracing::debug;

use toolshelf_core::{ApiUrl, AuthSessionMachine, AuthState, DependentDataCoordinator, Session};
use toolshelf_file::FileTokenStore;
use toolshelf_http::{ClientConfig, HttpAuthApi};

use crate::cli::GlobalArgs;

/// Everything a command needs, built once per invocation.
pub struct App {
    pub store: Arc<FileTokenStore>,
    pub api: Arc<HttpAuthApi>,
    pub machine: AuthSessionMachine,
}

impl App {
    pub fn open(args: &GlobalArgs) -> Result<Self> {
        let api_url = ApiUrl::new(&args.api_url).context("Invalid API URL")?;
        let mut config = ClientConfig::new(api_url);
        if let Some(secs) = args.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        let api = Arc::new(HttpAuthApi::new(config).context("Failed to create HTTP client")?);

        let path = match &args.store {
            Some(path) => path.clone(),
            None => default_store_path()?,
        };
        debug!(store = %path.display(), api = %api.api_url(), "Opening session");
        let store = Arc::new(FileTokenStore::new(path));

        let machine = AuthSessionMachine::new(store.clone(), api.clone(), api.clone());

        Ok(Self {
            store,
            api,
            machine,
        })
    }

    /// Run the boot-time session check and require a signed-in user.
    pub async fn require_session(&self) -> Result<Session> {
        if self.machine.start().await != AuthState::Authenticated {
            let session = self.machine.session();
            let reason = session
                .last_error
                .map(|kind| format!(" ({})", kind))
                .unwrap_or_default();
            anyhow::bail!("Not logged in{}. Run 'toolshelf login' first.", reason);
        }
        Ok(self.machine.session())
    }

    /// A collection coordinator following this invocation's machine.
    pub fn coordinator(&self) -> DependentDataCoordinator {
        DependentDataCoordinator::new(
            self.store.clone(),
            self.api.clone(),
            self.machine.subscribe(),
        )
    }

    pub fn store_path(&self) -> &Path {
        self.store.path()
    }
}

/// Get the default store file path.
fn default_store_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "toolshelf").context("Could not determine data directory")?;

    let data_dir = dirs.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data directory")?;

    Ok(data_dir.join("store.json"))
}

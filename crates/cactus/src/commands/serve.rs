//! `cactus serve` command implementation.

use std::path::PathBuf;

use cactus_config::{CliSettings, Config};
use cactus_server::{Server, ServerConfig};
use clap::Args;

use crate::error::CliError;
use crate::output::Output;
use crate::watch::{SiteWatcher, WatchSettings};

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover cactus.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to serve (overrides config).
    #[arg(short, long, env = "CACTUS_BUILD_DIR")]
    build_dir: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long, env = "CACTUS_PORT")]
    port: Option<u16>,

    /// Enable verbose output (log every served request).
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable live reload (default: enabled).
    #[arg(long)]
    live_reload: Option<bool>,

    /// Disable live reload.
    #[arg(long, conflicts_with = "live_reload")]
    no_live_reload: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// Blocks until the server stops.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        // Resolve flags before moving into CliSettings
        let live_reload_enabled = self.resolve_live_reload_enabled();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            build_dir: self.build_dir,
            live_reload_enabled,
        };

        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let server = Server::new(ServerConfig {
            host: config.server.host.clone(),
            port: config.server.port,
            root: config.site_resolved.build_dir.clone(),
        })?;

        output.serving(&format!(
            "http://{}:{}",
            config.server.host, config.server.port
        ));
        output.setting("Directory", config.site_resolved.build_dir.display());
        if let Some(path) = &config.config_path {
            output.setting("Config", path.display());
        }

        // Kept alive until the server returns
        let _watcher = if config.live_reload.enabled {
            let settings = WatchSettings::from_config(&config.live_reload)?;
            let watcher = SiteWatcher::start(config.watch_dir(), settings, server.handle())?;
            output.setting("Watching", config.watch_dir().display());
            Some(watcher)
        } else {
            output.setting("Live reload", "disabled");
            None
        };

        server.start()?;
        Ok(())
    }

    /// Resolve `live_reload_enabled` from --live-reload/--no-live-reload flags.
    fn resolve_live_reload_enabled(&self) -> Option<bool> {
        self.no_live_reload.then_some(false).or(self.live_reload)
    }
}

// # nbs - NetBox host sync
//
// Thin integration layer: flags and environment are turned into a
// `SyncConfig`, the store is built from the registry, the hosts file is
// loaded, and a single reconciliation pass runs. All sync logic lives in
// nbs-core.
//
// ## Configuration
//
// Every flag can also be set through the environment:
//
// - `--store` / `NBS_STORE`: Record store type (netbox, memory)
// - `--url` / `NBS_URL`: NetBox base URL
// - `--token` / `NBS_TOKEN`: NetBox API token
// - `--tls-verify` / `NBS_TLS_VERIFY`: Verify the server certificate (default true)
// - `--hosts` / `NBS_HOSTS`: Hosts file, one `address description` per line
// - `--tag` / `NBS_TAG`: Scope tag (default "nbs")
// - `--cleanup` / `NBS_CLEANUP`: Delete tagged records missing from the hosts file
// - `--dry-run` / `NBS_DRY_RUN`: Log mutations without applying them
// - `--log-level` / `NBS_LOG_LEVEL`: trace, debug, info, warn, error
// - `--json`: Print the sync report as JSON on stdout
//
// ## Example
//
// ```bash
// export NBS_URL=https://netbox.example.com
// export NBS_TOKEN=your_token
//
// nbs --hosts /etc/nbs/hosts --cleanup
// ```

use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use nbs_core::config::DEFAULT_TAG;
use nbs_core::{InventoryConfig, Reconciler, StoreConfig, StoreRegistry, SyncConfig, SyncReport};
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Sync finished without errors
/// - 1: Configuration or startup error
/// - 2: Runtime error (store unreachable, unexpected failure)
/// - 3: Sync finished but some hosts failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NbsExitCode {
    /// Clean run
    Clean = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
    /// Sync completed with per-host errors
    SyncErrors = 3,
}

impl From<NbsExitCode> for ExitCode {
    fn from(code: NbsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl NbsExitCode {
    /// Classify a failure that stopped the run
    fn for_error(err: &nbs_core::Error) -> Self {
        match err {
            nbs_core::Error::Config(_) | nbs_core::Error::Inventory(_) => Self::ConfigError,
            _ => Self::RuntimeError,
        }
    }

    fn for_report(report: &SyncReport) -> Self {
        if report.stats.has_errors() {
            Self::SyncErrors
        } else {
            Self::Clean
        }
    }
}

/// Record store backends selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StoreKind {
    /// NetBox IPAM over its REST API
    Netbox,
    /// In-memory store, nothing leaves the process
    Memory,
}

/// Sync a list of hosts into NetBox IPAM
#[derive(Debug, Parser)]
#[command(name = "nbs", version, about)]
struct Cli {
    /// Record store type
    #[arg(long, env = "NBS_STORE", value_enum, default_value_t = StoreKind::Netbox)]
    store: StoreKind,

    /// NetBox base URL
    #[arg(long, env = "NBS_URL")]
    url: Option<String>,

    /// NetBox API token
    #[arg(long, env = "NBS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Verify the NetBox TLS certificate
    #[arg(long, env = "NBS_TLS_VERIFY", action = ArgAction::Set, default_value_t = true)]
    tls_verify: bool,

    /// Hosts file
    #[arg(long, env = "NBS_HOSTS")]
    hosts: String,

    /// Scope tag for records owned by this tool
    #[arg(long, env = "NBS_TAG", default_value = DEFAULT_TAG)]
    tag: String,

    /// Delete tagged records that are not in the hosts file
    #[arg(long, env = "NBS_CLEANUP")]
    cleanup: bool,

    /// Log intended changes without applying them
    #[arg(long, env = "NBS_DRY_RUN")]
    dry_run: bool,

    /// Log level
    #[arg(long, env = "NBS_LOG_LEVEL", default_value = "info")]
    log_level: Level,

    /// Print the sync report as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    /// Build the sync configuration from the parsed flags
    fn to_config(&self) -> Result<SyncConfig> {
        let store = match self.store {
            StoreKind::Netbox => {
                let Some(url) = self.url.clone() else {
                    anyhow::bail!(
                        "--url is required for the netbox store. \
                        Set it via: export NBS_URL=https://netbox.example.com"
                    );
                };
                let Some(token) = self.token.clone() else {
                    anyhow::bail!(
                        "--token is required for the netbox store. \
                        Set it via: export NBS_TOKEN=your_token"
                    );
                };
                StoreConfig::Netbox {
                    url,
                    token,
                    tls_verify: self.tls_verify,
                }
            }
            StoreKind::Memory => StoreConfig::Memory,
        };

        let inventory = InventoryConfig::File {
            path: self.hosts.clone(),
        };

        let config = SyncConfig::new(store, inventory)
            .with_tag(self.tag.clone())
            .with_cleanup(self.cleanup)
            .with_dry_run(self.dry_run);
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                NbsExitCode::ConfigError.into()
            } else {
                NbsExitCode::Clean.into()
            };
        }
    };

    let config = match cli.to_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return NbsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return NbsExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return NbsExitCode::RuntimeError.into();
        }
    };

    let report = match rt.block_on(run(config)) {
        Ok(report) => report,
        Err(e) => {
            error!("Sync aborted: {}", e);
            return NbsExitCode::for_error(&e).into();
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize report: {}", e);
                return NbsExitCode::RuntimeError.into();
            }
        }
    }

    NbsExitCode::for_report(&report).into()
}

/// Load the hosts, build the store and run one reconciliation pass
async fn run(config: SyncConfig) -> nbs_core::Result<SyncReport> {
    let registry = StoreRegistry::with_builtin();

    #[cfg(feature = "netbox")]
    nbs_store_netbox::register(&registry);

    let source = nbs_core::inventory::from_config(&config.inventory);
    let hosts = source.hosts().await?;
    info!("Loaded {} host(s) from {}", hosts.len(), source.source_name());

    let store = registry.create_store(&config.store)?;
    info!("Using {} store, tag '{}'", store.store_name(), config.tag);

    let reconciler = Reconciler::from_config(store, hosts, &config)?;
    reconciler.sync().await
}

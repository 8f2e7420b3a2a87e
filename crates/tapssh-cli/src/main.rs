//! tapssh CLI
//!
//! Runs a preconfigured command on a remote device and prints the outcome as
//! JSON: `{"success": true, "output": "..."}` or `{"success": false, "error": "..."}`.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use color_eyre::Result;
use eyre::{WrapErr, bail};
use tapssh_exec::{
    CommandDescriptor, CommandRequest, JsonFileStatusStore, Reporter, SshTarget, StatusStore,
    TransportConfig,
};
use tracing_subscriber::EnvFilter;

mod config;
mod factory;

use config::Config;

#[derive(Parser)]
#[command(name = "tapssh")]
#[command(about = "Run preconfigured SSH commands on a remote device", long_about = None)]
struct Cli {
    /// Config file (defaults to $TAPSSH_CONFIG, ./tapssh.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one command on a device
    Run(RunArgs),
    /// Show the last recorded status of commands
    Status {
        /// Only this command id
        #[arg(long)]
        id: Option<String>,
    },
    /// Forget all recorded statuses
    ClearStatus,
}

#[derive(Args)]
struct RunArgs {
    /// JSON file with {host, port, username, password, command}
    ///
    /// `--password` may still be set (for example from `TAPSSH_PASSWORD`); the
    /// descriptor's password is used.
    #[arg(long, conflicts_with_all = ["host", "user", "command"])]
    descriptor: Option<PathBuf>,

    /// Device hostname or IP address
    #[arg(long)]
    host: Option<String>,

    /// SSH port
    #[arg(long, default_value_t = 22)]
    port: u16,

    /// Login user
    #[arg(long, short)]
    user: Option<String>,

    /// Login password
    #[arg(long, env = "TAPSSH_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Shell command line to run
    #[arg(long, short)]
    command: Option<String>,

    /// Identifier the status is recorded under
    #[arg(long, default_value = "adhoc")]
    id: String,

    /// Send the command through this relay instead of connecting directly
    #[arg(long)]
    relay: Option<String>,

    /// Deadline in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

impl RunArgs {
    fn request(&self) -> Result<CommandRequest> {
        if let Some(path) = &self.descriptor {
            let content = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("failed to read {}", path.display()))?;
            let descriptor: CommandDescriptor =
                serde_json::from_str(&content).wrap_err("invalid command descriptor")?;
            return Ok(descriptor.into());
        }

        let (Some(host), Some(user), Some(password), Some(command)) =
            (&self.host, &self.user, &self.password, &self.command)
        else {
            bail!("--host, --user, --password and --command are required without --descriptor");
        };

        Ok(CommandRequest::new(
            SshTarget::new(host, user, password).with_port(self.port),
            command,
        ))
    }

    /// Command-line flags win over the config file
    fn apply(&self, config: &mut Config) {
        if let Some(timeout) = self.timeout {
            config.exec.timeout_secs = timeout;
        }
        if let Some(url) = &self.relay {
            let timeout_secs = match &config.exec.transport {
                TransportConfig::Relay { timeout_secs, .. } => *timeout_secs,
                TransportConfig::Direct => tapssh_exec::config::DEFAULT_RELAY_TIMEOUT_SECS,
            };
            config.exec.transport = TransportConfig::Relay {
                url: url.clone(),
                timeout_secs,
            };
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    // stdout carries the JSON result; logs go to stderr
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let store = Arc::new(JsonFileStatusStore::new(config.status.resolved_path()));

    match cli.command {
        Commands::Run(args) => {
            args.apply(&mut config);
            let request = args.request()?;
            let executor = factory::create_executor(&config.exec, &args.id)?;
            tracing::debug!(
                command_id = %args.id,
                executor = executor.executor_type(),
                "running command"
            );
            let reporter = Reporter::new(executor, store);

            let result = reporter.run(&args.id, request).await;

            println!("{}", serde_json::to_string_pretty(&result.to_outcome())?);
            if !result.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Status { id } => {
            let output = match id {
                Some(id) => match store.last(&id).await? {
                    Some(status) => serde_json::to_string_pretty(&status)?,
                    None => bail!("no status recorded for {id}"),
                },
                None => serde_json::to_string_pretty(&store.all().await?)?,
            };
            println!("{output}");
        }
        Commands::ClearStatus => {
            store.clear().await?;
            println!("cleared {}", store.path().display());
        }
    }

    Ok(ExitCode::SUCCESS)
}

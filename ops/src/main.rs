//! evermail-ops: switch and inspect the runtime mode of an Evermail deployment
//!
//! ```text
//! evermail-ops set-mode Maintenance
//! evermail-ops get-mode
//! ```

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use evermail_admin::RuntimeModeWriter;
use evermail_core::{
	config::Configuration,
	host::{is_hosted_instance, should_load_secret_store, HostEnvironment},
	logging::init_tracing,
	resolve_mode,
	runtime::RUNTIME_MODE_KEY,
};
use evermail_secret_adapter_fs::SecretAdapterFs;
use evermail_types::prelude::*;

const DEFAULT_SECRET_DIR: &str = "./data/secrets";

#[derive(Parser, Debug)]
#[command(name = "evermail-ops", version, about = "Evermail operations tool")]
struct Cli {
	#[arg(
		long,
		global = true,
		env = "EVERMAIL_SECRET_DIR",
		default_value = DEFAULT_SECRET_DIR,
		help = "Directory of the filesystem secret store"
	)]
	secret_dir: PathBuf,
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Store a new runtime mode, services pick it up on their next start
	SetMode { mode: String },
	/// Print the runtime mode a service would resolve right now
	GetMode,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModeReport<'a> {
	environment: String,
	configured: Option<&'a str>,
	mode: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
	let cli = Cli::parse();
	if let Err(e) = init_tracing() {
		eprintln!("{}", e);
	}

	match run(cli).await {
		Ok(code) => code,
		Err(e) => {
			error!("FATAL: {}", e);
			eprintln!("error: {}", e);
			ExitCode::FAILURE
		}
	}
}

async fn run(cli: Cli) -> EmResult<ExitCode> {
	let store = Arc::new(SecretAdapterFs::new(cli.secret_dir.into()).await?);

	match cli.command {
		Commands::SetMode { mode } => {
			let writer = RuntimeModeWriter::new(store);

			let token = CancellationToken::new();
			let ctrl_c = token.clone();
			tokio::spawn(async move {
				if tokio::signal::ctrl_c().await.is_ok() {
					warn!("Interrupted, cancelling runtime mode update");
					ctrl_c.cancel();
				}
			});

			let outcome = writer.set_runtime_mode(&mode, Some(&token)).await;
			println!("{}", serde_json::to_string(&outcome)?);

			Ok(if outcome.success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
		}
		Commands::GetMode => {
			let env = HostEnvironment::from_process_env();
			let mut config = Configuration::new();
			config.add_process_env(None);

			if should_load_secret_store(env, is_hosted_instance()) {
				config.add_secret_store(&*store, None).await?;
			} else {
				info!(environment = %env, "Secret store not consulted outside production");
			}

			let report = ModeReport {
				environment: env.to_string(),
				configured: config.get(RUNTIME_MODE_KEY),
				mode: resolve_mode(&config, env).to_string(),
			};
			println!("{}", serde_json::to_string(&report)?);

			Ok(ExitCode::SUCCESS)
		}
	}
}

// vim: ts=4

use anyhow::Result;
use clap::Parser;

use hedera_faucet_cli::cli::{Cli, Command};
use hedera_faucet_cli::commands;
use hedera_faucet_cli::config::ConfigError;

#[tokio::main]
async fn main() -> Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
		.format_timestamp(None)
		.init();

	let cli = Cli::parse();

	let outcome = match &cli.command {
		Command::Deploy => commands::deploy::run(&cli).await,
		Command::Boost { command } => commands::boost::run(&cli, command).await,
		Command::Claimable { serials } => commands::claimable::run(&cli, serials).await,
		Command::MirrorCall { serials, estimate } => {
			commands::query::run(&cli, serials, *estimate).await
		}
		Command::Stats { out_dir } => commands::stats::run(&cli, out_dir).await,
		Command::Monitor { command } => commands::monitor::run(&cli, command).await,
		Command::Logs => commands::logs::run(&cli).await,
		Command::Get { function, outputs } => commands::call::get(&cli, function, outputs).await,
		Command::Execute { function, args, gas, value } => {
			commands::call::execute(&cli, function, args, *gas, *value).await
		}
	};

	match outcome {
		// missing settings are reported, not treated as a crash
		Err(err) if err.downcast_ref::<ConfigError>().is_some() => {
			log::error!("{err}");
			Ok(())
		}
		other => other,
	}
}

use anyhow::Result;

use crate::abi::{format_value, uint_array, DynSolValue};
use crate::cli::{BoostCommand, Cli, SerialList};
use crate::client::{ContractBackend, FaucetClient, SETTER_GAS};
use crate::commands::{
	confirmer, faucet_client, load_artifact, load_settings, print_banner, read_backend, write_backend,
};

pub async fn run(cli: &Cli, cmd: &BoostCommand) -> Result<()> {
	let settings = load_settings(cli)?;
	settings.require_contract()?;
	print_banner(&settings);
	let artifact = load_artifact(&settings)?;

	match cmd {
		BoostCommand::List => {
			let faucet = faucet_client(&settings, artifact, read_backend(&settings)?)?;
			let serials = boost_serials(&faucet).await?;
			println!("Current Boost Serials: {}", format_value(&serials));
			Ok(())
		}
		BoostCommand::Add { serials } => {
			let faucet = faucet_client(&settings, artifact, write_backend(&settings).await?)?;
			change_boosts(cli, &faucet, "addBoostSerials", "**ADD** boost to", serials).await
		}
		BoostCommand::Remove { serials } => {
			let faucet = faucet_client(&settings, artifact, write_backend(&settings).await?)?;
			change_boosts(cli, &faucet, "removeBoostSerials", "**REMOVE** boost from", serials).await
		}
	}
}

async fn boost_serials<B: ContractBackend>(faucet: &FaucetClient<B>) -> Result<DynSolValue> {
	Ok(faucet.get_setting("getBoostSerials", "boostSerials").await?)
}

async fn change_boosts<B: ContractBackend>(
	cli: &Cli,
	faucet: &FaucetClient<B>,
	function: &str,
	verb: &str,
	serials: &SerialList,
) -> Result<()> {
	println!("Current Boost Serials: {}", format_value(&boost_serials(faucet).await?));

	let list = join_serials(&serials.0);
	if !confirmer(cli).confirm(&format!("Do you want to {verb} serial(s): {list}?"))? {
		println!("User Aborted");
		return Ok(());
	}

	let arg = uint_array(serials.0.iter().copied());
	let report = faucet.execute(function, &[arg], SETTER_GAS, 0).await?;
	println!("Operation: {} ({})", report.status, report.tx_hash);

	println!("Updated Boost Serials: {}", format_value(&boost_serials(faucet).await?));
	Ok(())
}

fn join_serials(serials: &[u64]) -> String {
	serials.iter().map(u64::to_string).collect::<Vec<_>>().join(",")
}

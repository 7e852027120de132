use alloy::primitives::U256;
use anyhow::Result;

use crate::abi::DynSolValue;
use crate::cli::Cli;
use crate::client::{FaucetClient, DEPLOY_GAS};
use crate::commands::{confirmer, load_artifact, load_settings, print_banner, write_backend};

pub async fn run(cli: &Cli) -> Result<()> {
	let settings = load_settings(cli)?;
	settings.require_operator()?;
	settings.require_contract_name()?;
	let (sct, token, claim_token) = settings.deploy.require_targets()?;
	let p = &settings.deploy;

	print_banner(&settings);
	println!("\n-Using SCT: {sct}");
	println!("\n-Using FT Token: {token}");
	println!("\n-Using NFT Claim Token: {claim_token}");
	println!("\n-Using Daily FT Amount: {}", p.daily_amt);
	println!("\n-Using Min Time (secs): {}", p.min_time);
	println!("\n-Using Max Time units: {}", p.max_time_units);
	println!("\n-Using Boost Perc: {}", p.boost_percentage);

	if !confirmer(cli).confirm("Do you want to deploy the faucet?")? {
		println!("User Aborted");
		return Ok(());
	}

	println!("deploying in {}", settings.network.banner());
	let backend = write_backend(&settings).await?;
	let artifact = load_artifact(&settings)?;

	let args = [
		DynSolValue::Address(sct.to_address()),
		DynSolValue::Address(token.to_address()),
		DynSolValue::Address(claim_token.to_address()),
		DynSolValue::Uint(U256::from(p.daily_amt), 256),
		DynSolValue::Uint(U256::from(p.boost_percentage), 256),
		DynSolValue::Uint(U256::from(p.min_time), 256),
		DynSolValue::Uint(U256::from(p.max_time_units), 8),
	];

	println!("\n- Deploying contract... {}", artifact.contract_name);
	let deployment = FaucetClient::deploy(&backend, &artifact, &args, DEPLOY_GAS).await?;

	println!(
		"Contract created with ID: {} / {}",
		deployment.contract_id,
		deployment.contract_id.to_solidity_address()
	);
	println!("Deployment tx: {}", deployment.tx_hash);
	Ok(())
}

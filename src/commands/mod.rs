pub mod boost;
pub mod call;
pub mod claimable;
pub mod deploy;
pub mod logs;
pub mod monitor;
pub mod query;
pub mod stats;

use alloy::primitives::Address;
use anyhow::{bail, Result};

use crate::abi::Artifact;
use crate::cli::Cli;
use crate::client::{FaucetClient, HederaBackend};
use crate::config::Settings;
use crate::confirm::{AssumeYes, Confirm, LinePrompt};
use crate::entity::EntityId;
use crate::mirror::MirrorClient;
use crate::relay::RelayClient;

/// Resolve settings from `.env`, the environment and `--network`.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
	Ok(Settings::from_env(cli.network)?)
}

/// The lines every command prints before touching the network.
pub fn print_banner(settings: &Settings) {
	println!("\n-Using ENVIRONMENT: {}", settings.network.as_str().to_uppercase());
	if let Some(operator) = settings.operator_id {
		println!("\n-Using Operator: {operator}");
	}
	if let (Some(contract), Some(name)) = (settings.contract_id, settings.contract_name.as_deref()) {
		println!(
			"\n-Using Contract: {contract} with name: {name} and address: {}",
			contract.to_solidity_address()
		);
	}
	println!("interacting in {}", settings.network.banner());
}

pub fn load_artifact(settings: &Settings) -> Result<Artifact> {
	let name = settings.require_contract_name()?;
	let artifact = Artifact::load(&settings.artifacts_dir, name)?;
	println!("\n -Loading ABI...\n");
	Ok(artifact)
}

/// The address simulations are sent from: whoever signs writes when a key
/// is configured, otherwise the operator account.
pub fn simulation_sender(settings: &Settings) -> Result<Address> {
	if let Some(key) = settings.private_key.as_ref() {
		return Ok(crate::signer::from_private_key(key)?.address());
	}
	Ok(settings.operator_id.map(|id| id.to_address()).unwrap_or(Address::ZERO))
}

/// Backend for read-only work.
pub fn read_backend(settings: &Settings) -> Result<HederaBackend> {
	Ok(HederaBackend::new(
		MirrorClient::new(&settings.mirror_url),
		simulation_sender(settings)?,
	))
}

/// Backend that can also submit transactions as the operator, once the
/// relay's chain and the operator's key have been checked.
pub async fn write_backend(settings: &Settings) -> Result<HederaBackend> {
	let operator = settings.require_operator()?;
	let key = settings.require_private_key()?;
	let signer = crate::signer::from_private_key(key)?;
	let sender = signer.address();

	let relay = RelayClient::with_signer(&settings.relay_url, signer)?;
	relay.ensure_chain(settings.chain_id).await?;

	let mirror = MirrorClient::new(&settings.mirror_url);
	let alias = mirror.account_evm_address(&operator).await?;
	check_operator(operator, alias, sender)?;
	log::debug!("signing as {sender}");

	Ok(HederaBackend::new(mirror, sender).with_relay(relay))
}

/// The relay sends from the key's EVM address, which must be the operator
/// account's own.
fn check_operator(operator: EntityId, alias: Option<Address>, sender: Address) -> Result<()> {
	match alias {
		Some(alias) if alias == sender => Ok(()),
		Some(alias) => bail!(
			"PRIVATE_KEY signs as {sender} but ACCOUNT_ID {operator} has EVM address {alias}"
		),
		None => bail!("ACCOUNT_ID {operator} has no EVM address; an ECDSA account is required"),
	}
}

/// Bind the configured contract and its ABI to `backend`.
pub fn faucet_client(
	settings: &Settings,
	artifact: Artifact,
	backend: HederaBackend,
) -> Result<FaucetClient<HederaBackend>> {
	let contract = settings.require_contract()?;
	Ok(FaucetClient::new(artifact.abi, contract, backend))
}

pub fn confirmer(cli: &Cli) -> Box<dyn Confirm> {
	if cli.yes {
		Box::new(AssumeYes)
	} else {
		Box::new(LinePrompt::terminal())
	}
}

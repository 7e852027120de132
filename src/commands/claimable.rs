use anyhow::Result;

use crate::abi::{format_value, uint_array};
use crate::cli::{Cli, SerialList};
use crate::commands::{faucet_client, load_artifact, load_settings, print_banner, read_backend};
use crate::events::format_units;

/// Gas for `getClaimableForTokens`: 50k for the first serial, 10k per
/// additional one.
pub fn claimable_gas(serials: usize) -> u64 {
	50_000 + 10_000 * serials.saturating_sub(1) as u64
}

pub async fn run(cli: &Cli, serials: &SerialList) -> Result<()> {
	let settings = load_settings(cli)?;
	settings.require_contract()?;
	print_banner(&settings);
	let artifact = load_artifact(&settings)?;
	let faucet = faucet_client(&settings, artifact, read_backend(&settings)?)?;

	let arg = uint_array(serials.0.iter().copied());
	let out = faucet
		.query("getClaimableForTokens", &[arg], claimable_gas(serials.0.len()))
		.await?;
	let amount = out.require("amt")?;

	match amount.as_uint() {
		Some((amt, _)) if settings.decimals > 0 => {
			println!("Claimable: {amt} ({})", format_units(amt, settings.decimals))
		}
		_ => println!("Claimable: {}", format_value(amount)),
	}
	Ok(())
}

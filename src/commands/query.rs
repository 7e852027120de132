use alloy::primitives::U256;
use anyhow::Result;

use crate::abi::{format_value, uint_array, RevertReason};
use crate::cli::{Cli, SerialList};
use crate::commands::{load_artifact, load_settings, print_banner, simulation_sender};
use crate::mirror::{interpret_call_response, CallOutcome, ContractCallRequest, MirrorClient};

/// Simulate `getClaimableForTokens` against the mirror node and show the
/// raw response alongside its decoding.
pub async fn run(cli: &Cli, serials: &SerialList, estimate: bool) -> Result<()> {
	let settings = load_settings(cli)?;
	settings.require_operator()?;
	let contract = settings.require_contract()?;
	print_banner(&settings);
	let artifact = load_artifact(&settings)?;
	let abi = &artifact.abi;

	println!("\n -POST to mirror node...\n");
	let arg = uint_array(serials.0.iter().copied());
	let calldata = abi.encode_call("getClaimableForTokens", &[arg])?;
	println!("encodedCommand: 0x{}", hex::encode(&calldata));

	let mirror = MirrorClient::new(&settings.mirror_url);
	let request = ContractCallRequest::new(&contract.to_address(), &simulation_sender(&settings)?, &calldata)
		.with_estimate(estimate);
	let (status, body) = mirror.contract_call_raw(&request).await?;
	println!("{}", serde_json::to_string_pretty(&body)?);

	match interpret_call_response(status, &body)? {
		CallOutcome::Success(out) if estimate => {
			match U256::try_from_be_slice(&out) {
				Some(gas) => println!("Estimated gas: {gas}"),
				None => println!("Estimated gas: 0x{}", hex::encode(out)),
			}
		}
		CallOutcome::Success(out) => {
			for (name, value) in abi.decode_output("getClaimableForTokens", &out)?.iter() {
				println!("{name}: {}", format_value(value));
			}
		}
		CallOutcome::Reverted(data) => {
			println!("Reverted: {}", RevertReason::decode(&data, Some(abi)));
		}
	}
	Ok(())
}

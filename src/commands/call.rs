use alloy::dyn_abi::Specifier;
use anyhow::Result;

use crate::abi::{coerce, format_value, is_read_only, AbiError, DynSolValue, Function};
use crate::cli::Cli;
use crate::client::GETTER_GAS;
use crate::commands::{
	confirmer, faucet_client, load_artifact, load_settings, print_banner, read_backend, write_backend,
};

/// `get <function> [outputs...]`
pub async fn get(cli: &Cli, function: &str, outputs: &[String]) -> Result<()> {
	let settings = load_settings(cli)?;
	settings.require_contract()?;
	print_banner(&settings);
	let artifact = load_artifact(&settings)?;
	let faucet = faucet_client(&settings, artifact, read_backend(&settings)?)?;

	if outputs.is_empty() {
		let decoded = faucet.query(function, &[], GETTER_GAS).await?;
		for (name, value) in decoded.iter() {
			println!("{name}: {}", format_value(value));
		}
	} else {
		let values = faucet.get_settings(function, outputs).await?;
		for (name, value) in outputs.iter().zip(values) {
			println!("{name}: {}", format_value(&value));
		}
	}
	Ok(())
}

/// `execute <function> [args...]`: read-only functions are simulated,
/// anything else is confirmed and submitted.
pub async fn execute(cli: &Cli, function: &str, args: &[String], gas: u64, value: u64) -> Result<()> {
	let settings = load_settings(cli)?;
	settings.require_contract()?;
	print_banner(&settings);
	let artifact = load_artifact(&settings)?;

	let f = artifact.abi.function(function)?;
	let values = coerce_args(f, args)?;

	if is_read_only(f) {
		let faucet = faucet_client(&settings, artifact, read_backend(&settings)?)?;
		for (name, value) in faucet.query(function, &values, gas).await?.iter() {
			println!("{name}: {}", format_value(value));
		}
		return Ok(());
	}

	let rendered = values.iter().map(format_value).collect::<Vec<_>>().join(", ");
	let question = format!("Do you want to call {function}({rendered})?");
	if !confirmer(cli).confirm(&question)? {
		println!("User Aborted");
		return Ok(());
	}

	let faucet = faucet_client(&settings, artifact, write_backend(&settings).await?)?;
	let report = faucet.execute(function, &values, gas, value).await?;
	println!("Operation: {} ({})", report.status, report.tx_hash);
	for (name, value) in report.outputs.iter() {
		println!("{name}: {}", format_value(value));
	}
	Ok(())
}

/// Coerce command-line strings into the function's input types.
fn coerce_args(f: &Function, args: &[String]) -> Result<Vec<DynSolValue>, AbiError> {
	if f.inputs.len() != args.len() {
		return Err(AbiError::ArgumentCount {
			function: f.name.clone(),
			expected: f.inputs.len(),
			got: args.len(),
		});
	}
	f.inputs
		.iter()
		.zip(args)
		.map(|(param, raw)| coerce(&param.resolve()?, raw))
		.collect()
}

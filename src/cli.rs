use std::path::PathBuf;
use std::str::FromStr;

use clap::{ArgAction, Parser, Subcommand};

use crate::abi::{parse_serials, AbiError};
use crate::networks::Network;

#[derive(Parser)]
#[command(
	name = "faucet",
	about = "Operate an NFT-gated token faucet contract on Hedera.",
	version
)]
pub struct Cli {
	/// Network to use instead of ENVIRONMENT.
	#[arg(long, global = true)]
	pub network: Option<Network>,

	/// Answer yes to every confirmation prompt.
	#[arg(long, short = 'y', global = true)]
	pub yes: bool,

	#[command(subcommand)]
	pub command: Command,
}

/// A comma-separated list of NFT serials, e.g. `3,4,484`.
#[derive(Debug, Clone, PartialEq)]
pub struct SerialList(pub Vec<u64>);

impl FromStr for SerialList {
	type Err = AbiError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let serials = parse_serials(s)?;
		if serials.is_empty() {
			return Err(AbiError::InvalidArgument {
				value: s.to_owned(),
				expected: "at least one serial".into(),
			});
		}
		Ok(Self(serials))
	}
}

#[derive(Subcommand)]
pub enum Command {
	/// Deploy a new faucet contract from the build artifact.
	Deploy,

	/// Inspect and edit the boosted serial list.
	Boost {
		#[command(subcommand)]
		command: BoostCommand,
	},

	/// Query how much the given serials can claim right now.
	Claimable {
		/// Serials, comma separated.
		serials: SerialList,
	},

	/// Simulate a claimable query through the mirror node.
	MirrorCall {
		/// Serials, comma separated.
		serials: SerialList,

		/// Ask for the decoded result instead of a gas estimate.
		#[arg(long = "no-estimate", action = ArgAction::SetFalse)]
		estimate: bool,
	},

	/// Summarise every claim event into a JSON report.
	Stats {
		/// Directory for the report file.
		#[arg(long, default_value = ".")]
		out_dir: PathBuf,
	},

	/// Follow new faucet events as they happen.
	Monitor {
		#[command(subcommand)]
		command: MonitorCommand,
	},

	/// Print every decodable event the contract has emitted.
	Logs,

	/// Call a read-only function and print selected outputs.
	Get {
		/// Function name.
		function: String,

		/// Output names to print; all when omitted.
		outputs: Vec<String>,
	},

	/// Execute a contract function after confirmation.
	Execute {
		/// Function name.
		function: String,

		/// Arguments, one per function input.
		args: Vec<String>,

		/// Gas limit.
		#[arg(long, default_value_t = crate::client::SETTER_GAS)]
		gas: u64,

		/// Tinybars to send with the call.
		#[arg(long, default_value_t = 0)]
		value: u64,
	},
}

// -- Boost subcommands --

#[derive(Subcommand)]
pub enum BoostCommand {
	/// Show the boosted serials.
	List,

	/// Boost more serials.
	Add {
		/// Serials, comma separated.
		serials: SerialList,
	},

	/// Remove serials from the boost list.
	Remove {
		/// Serials, comma separated.
		serials: SerialList,
	},
}

// -- Monitor subcommands --

#[derive(Subcommand)]
pub enum MonitorCommand {
	/// Poll the mirror node for new logs.
	Mirror,

	/// Poll the JSON-RPC relay for the configured event.
	Relay,
}

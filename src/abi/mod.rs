//! Solidity ABI support for the faucet contract.
//!
//! Wraps `alloy`'s JSON ABI and dynamic codec with what the operational
//! commands need from a Hardhat artifact:
//! - encoding function calls and constructor arguments
//! - decoding return values by output name
//! - decoding event logs (indexed topics and data)
//! - classifying revert payloads

pub mod artifact;
pub mod coerce;
pub mod revert;
pub mod values;

pub use alloy::dyn_abi::{DynSolType, DynSolValue};
pub use alloy::json_abi::Function;
pub use artifact::{is_read_only, Abi, Artifact, Decoded, DecodedEvent};
pub use coerce::{coerce, parse_serials};
pub use revert::RevertReason;
pub use values::{format_ledger_value, format_value, uint_array};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AbiError {
	#[error("function {0} not found in ABI")]
	UnknownFunction(String),

	#[error("event {0} not found in ABI")]
	UnknownEvent(String),

	#[error("selector does not match {0}")]
	SelectorMismatch(String),

	#[error("log is missing the topic for {0}")]
	MissingTopic(String),

	#[error("no output named {0}")]
	MissingOutput(String),

	#[error("{function} takes {expected} argument(s), got {got}")]
	ArgumentCount { function: String, expected: usize, got: usize },

	#[error("{function}: argument {param} is not a {expected}")]
	ArgumentType { function: String, param: String, expected: String },

	#[error("cannot read {value:?} as {expected}")]
	InvalidArgument { value: String, expected: String },

	#[error("failed to read artifact {path}: {source}")]
	Artifact {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[error("ABI codec error: {0}")]
	Codec(#[from] alloy::dyn_abi::Error),

	#[error("ABI JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

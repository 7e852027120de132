use std::fmt;

use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::primitives::U256;
use alloy::sol_types::{Panic, Revert, SolError};

use super::artifact::{decode_params, Abi, Decoded};
use super::values::format_value;

/// Why a contract call reverted.
#[derive(Debug, Clone, PartialEq)]
pub enum RevertReason {
	/// Reverted with no payload (`revert()` or `require(cond)`).
	Empty,
	Message(String),
	Panic(U256),
	Custom { name: String, args: Decoded },
	Unknown(Vec<u8>),
}

impl RevertReason {
	/// Classify a revert payload by its leading selector; custom errors are
	/// looked up in `abi` when one is given.
	pub fn decode(data: &[u8], abi: Option<&Abi>) -> Self {
		if data.is_empty() {
			return Self::Empty;
		}
		if data.len() < 4 {
			return Self::Unknown(data.to_vec());
		}
		let (sel, body) = data.split_at(4);

		if sel == Revert::SELECTOR {
			if let Some(DynSolValue::String(msg)) = decode_single(DynSolType::String, body) {
				return Self::Message(msg);
			}
		} else if sel == Panic::SELECTOR {
			if let Some(DynSolValue::Uint(code, _)) = decode_single(DynSolType::Uint(256), body) {
				return Self::Panic(code);
			}
		} else if let Some(error) = abi.and_then(|a| a.error_by_selector(sel)) {
			if let Ok(args) = decode_params(&error.inputs, body) {
				return Self::Custom { name: error.name.clone(), args };
			}
		}

		Self::Unknown(data.to_vec())
	}
}

fn decode_single(ty: DynSolType, body: &[u8]) -> Option<DynSolValue> {
	match DynSolType::Tuple(vec![ty]).abi_decode_sequence(body) {
		Ok(DynSolValue::Tuple(mut values)) => values.pop(),
		_ => None,
	}
}

/// Description of the compiler-inserted panic codes.
pub fn panic_description(code: U256) -> &'static str {
	match code.as_limbs()[0] {
		_ if code > U256::from(0xffu64) => "unknown panic code",
		0x00 => "generic compiler panic",
		0x01 => "assertion failed",
		0x11 => "arithmetic overflow or underflow",
		0x12 => "division or modulo by zero",
		0x21 => "invalid enum value",
		0x22 => "corrupt storage byte array",
		0x31 => "pop on empty array",
		0x32 => "array index out of bounds",
		0x41 => "out of memory",
		0x51 => "call to zero-initialized function",
		_ => "unknown panic code",
	}
}

impl fmt::Display for RevertReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Empty => f.write_str("reverted without a reason"),
			Self::Message(msg) => write!(f, "{msg}"),
			Self::Panic(code) => write!(f, "panic 0x{code:x}: {}", panic_description(*code)),
			Self::Custom { name, args } => {
				write!(f, "{name}(")?;
				for (i, (key, value)) in args.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{key}: {}", format_value(value))?;
				}
				f.write_str(")")
			}
			Self::Unknown(data) => write!(f, "unrecognised revert data 0x{}", hex::encode(data)),
		}
	}
}

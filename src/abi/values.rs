use alloy::dyn_abi::DynSolValue;
use alloy::primitives::U256;

use crate::entity::account_label;

/// The common `uint256[]` argument.
pub fn uint_array<I: IntoIterator<Item = u64>>(values: I) -> DynSolValue {
	DynSolValue::Array(values.into_iter().map(|v| DynSolValue::Uint(U256::from(v), 256)).collect())
}

/// Whether every integer inside `value` fits its declared width.
///
/// `alloy` type matching only compares widths, so a `uint8` holding 300
/// would otherwise encode as a word the contract rejects.
pub fn in_range(value: &DynSolValue) -> bool {
	match value {
		DynSolValue::Uint(v, bits) => v.bit_len() <= *bits,
		DynSolValue::Int(v, bits) => {
			if *bits >= 256 {
				return true;
			}
			// sign extension: everything above bit `bits - 1` is all zeros
			// or all ones
			let high = v.into_raw() >> (*bits - 1);
			high == U256::ZERO || high == U256::MAX >> (*bits - 1)
		}
		DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
			items.iter().all(in_range)
		}
		_ => true,
	}
}

/// Human rendering of a decoded value.
pub fn format_value(value: &DynSolValue) -> String {
	match value {
		DynSolValue::Address(a) => a.to_string(),
		DynSolValue::Uint(v, _) => v.to_string(),
		DynSolValue::Int(v, _) => v.to_string(),
		DynSolValue::Bool(b) => b.to_string(),
		DynSolValue::FixedBytes(word, size) => format!("0x{}", hex::encode(&word[..*size])),
		DynSolValue::Bytes(b) => format!("0x{}", hex::encode(b)),
		DynSolValue::String(s) => s.clone(),
		DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
			format!("[{}]", join(items, format_value))
		}
		DynSolValue::Tuple(items) => format!("({})", join(items, format_value)),
		other => format!("{other:?}"),
	}
}

/// Like [`format_value`], with addresses shown as account ids.
pub fn format_ledger_value(value: &DynSolValue) -> String {
	match value {
		DynSolValue::Address(a) => account_label(a),
		other => format_value(other),
	}
}

fn join(items: &[DynSolValue], f: fn(&DynSolValue) -> String) -> String {
	items.iter().map(f).collect::<Vec<_>>().join(", ")
}

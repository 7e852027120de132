use alloy::dyn_abi::{DynSolType, DynSolValue};

use super::values::in_range;
use super::AbiError;
use crate::entity::EntityId;

/// Turn a command-line argument into a value of type `ty`.
///
/// Addresses also accept a Hedera id (`0.0.1234`). Arrays accept `[a,b,c]`
/// or a bare `a,b,c`; nesting requires brackets. Integers must fit the
/// declared width.
pub fn coerce(ty: &DynSolType, raw: &str) -> Result<DynSolValue, AbiError> {
	let raw = raw.trim();
	let invalid = || AbiError::InvalidArgument { value: raw.to_owned(), expected: ty.sol_type_name().into_owned() };

	let value = match ty {
		DynSolType::Address => match raw.parse::<EntityId>() {
			Ok(id) => DynSolValue::Address(id.to_address()),
			Err(_) => ty.coerce_str(raw).map_err(|_| invalid())?,
		},
		DynSolType::Bool => match raw.to_ascii_lowercase().as_str() {
			"true" | "1" | "yes" => DynSolValue::Bool(true),
			"false" | "0" | "no" => DynSolValue::Bool(false),
			_ => return Err(invalid()),
		},
		DynSolType::Array(inner) => {
			let items = split_list(raw).ok_or_else(invalid)?;
			DynSolValue::Array(coerce_all(items.iter().map(|item| (inner.as_ref(), item)))?)
		}
		DynSolType::FixedArray(inner, n) => {
			let items = split_list(raw).ok_or_else(invalid)?;
			if items.len() != *n {
				return Err(invalid());
			}
			DynSolValue::FixedArray(coerce_all(items.iter().map(|item| (inner.as_ref(), item)))?)
		}
		DynSolType::Tuple(members) => {
			let items = split_list(raw).ok_or_else(invalid)?;
			if items.len() != members.len() {
				return Err(invalid());
			}
			DynSolValue::Tuple(coerce_all(members.iter().zip(&items))?)
		}
		leaf => leaf.coerce_str(raw).map_err(|_| invalid())?,
	};

	if in_range(&value) {
		Ok(value)
	} else {
		Err(invalid())
	}
}

fn coerce_all<'a>(
	pairs: impl Iterator<Item = (&'a DynSolType, &'a String)>,
) -> Result<Vec<DynSolValue>, AbiError> {
	pairs.map(|(ty, item)| coerce(ty, item)).collect()
}

/// Parse a comma-separated serial list such as `3,4,484`.
pub fn parse_serials(raw: &str) -> Result<Vec<u64>, AbiError> {
	raw.split(',')
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(|s| {
			s.parse::<u64>().map_err(|_| AbiError::InvalidArgument {
				value: s.to_owned(),
				expected: "serial number".into(),
			})
		})
		.collect()
}

/// Split one level of a list, respecting nested brackets.
fn split_list(raw: &str) -> Option<Vec<String>> {
	let inner = match (raw.strip_prefix('['), raw.strip_suffix(']')) {
		(Some(_), Some(_)) => &raw[1..raw.len() - 1],
		(None, None) => raw,
		_ => return None,
	};
	if inner.trim().is_empty() {
		return Some(Vec::new());
	}

	let mut items = Vec::new();
	let mut depth = 0i32;
	let mut current = String::new();
	for c in inner.chars() {
		match c {
			'[' | '(' => depth += 1,
			']' | ')' => depth -= 1,
			_ => {}
		}
		if depth < 0 {
			return None;
		}
		if c == ',' && depth == 0 {
			items.push(current.trim().to_owned());
			current.clear();
		} else {
			current.push(c);
		}
	}
	if depth != 0 {
		return None;
	}
	items.push(current.trim().to_owned());
	Some(items)
}

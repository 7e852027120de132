use std::path::{Path, PathBuf};

use alloy::dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier};
use alloy::json_abi::{Error as ErrorDef, Event, Function, JsonAbi, Param, StateMutability};
use alloy::primitives::{Bytes, B256};
use serde::Deserialize;

use super::values::in_range;
use super::AbiError;

/// Whether calling `function` cannot change contract state.
pub fn is_read_only(function: &Function) -> bool {
	matches!(function.state_mutability, StateMutability::View | StateMutability::Pure)
}

/// A contract ABI looked up by name.
#[derive(Debug, Clone, Default)]
pub struct Abi {
	json: JsonAbi,
}

impl From<JsonAbi> for Abi {
	fn from(json: JsonAbi) -> Self {
		Self { json }
	}
}

impl Abi {
	pub fn from_json(json: &str) -> Result<Self, AbiError> {
		Ok(Self { json: serde_json::from_str(json)? })
	}

	pub fn json(&self) -> &JsonAbi {
		&self.json
	}

	/// First function with this name; overloads beyond the first are not
	/// reachable by name.
	pub fn function(&self, name: &str) -> Result<&Function, AbiError> {
		self.json
			.function(name)
			.and_then(|overloads| overloads.first())
			.ok_or_else(|| AbiError::UnknownFunction(name.to_owned()))
	}

	pub fn event(&self, name: &str) -> Result<&Event, AbiError> {
		self.json
			.event(name)
			.and_then(|overloads| overloads.first())
			.ok_or_else(|| AbiError::UnknownEvent(name.to_owned()))
	}

	/// Selector followed by the encoded arguments, checked against the
	/// declared inputs.
	pub fn encode_call(&self, name: &str, args: &[DynSolValue]) -> Result<Vec<u8>, AbiError> {
		let function = self.function(name)?;
		check_args(&function.name, &function.inputs, args)?;
		Ok(function.abi_encode_input(args)?)
	}

	pub fn decode_output(&self, name: &str, data: &[u8]) -> Result<Decoded, AbiError> {
		decode_params(&self.function(name)?.outputs, data)
	}

	/// Encoded constructor arguments (no selector), to append to bytecode.
	pub fn encode_constructor(&self, args: &[DynSolValue]) -> Result<Vec<u8>, AbiError> {
		match &self.json.constructor {
			Some(constructor) => {
				check_args("constructor", &constructor.inputs, args)?;
				Ok(constructor.abi_encode_input(args)?)
			}
			None => {
				check_args("constructor", &[], args)?;
				Ok(Vec::new())
			}
		}
	}

	/// Decode a log by matching `topic0` against every declared event.
	pub fn decode_log(&self, topics: &[B256], data: &[u8]) -> Result<DecodedEvent, AbiError> {
		let topic0 = topics.first().ok_or(AbiError::MissingTopic("topic0".into()))?;
		self.json
			.events()
			.find(|e| !e.anonymous && e.selector() == *topic0)
			.ok_or_else(|| AbiError::UnknownEvent(topic0.to_string()))
			.and_then(|event| decode_event(event, topics, data))
	}

	pub fn error_by_selector(&self, selector: &[u8]) -> Option<&ErrorDef> {
		self.json.errors().find(|e| e.selector().as_slice() == selector)
	}
}

fn check_args(name: &str, params: &[Param], args: &[DynSolValue]) -> Result<(), AbiError> {
	if params.len() != args.len() {
		return Err(AbiError::ArgumentCount {
			function: name.to_owned(),
			expected: params.len(),
			got: args.len(),
		});
	}
	for (param, arg) in params.iter().zip(args) {
		let ty = param.resolve()?;
		if !ty.matches(arg) || !in_range(arg) {
			return Err(AbiError::ArgumentType {
				function: name.to_owned(),
				param: param.name.clone(),
				expected: ty.sol_type_name().into_owned(),
			});
		}
	}
	Ok(())
}

/// Decode `data` as the parameter list `params`.
pub(crate) fn decode_params(params: &[Param], data: &[u8]) -> Result<Decoded, AbiError> {
	let types = params.iter().map(|p| p.resolve()).collect::<Result<Vec<_>, _>>()?;
	let values = unpack(DynSolType::Tuple(types).abi_decode_sequence(data)?);
	Ok(Decoded::new(params.iter().map(|p| p.name.as_str()), values))
}

fn unpack(value: DynSolValue) -> Vec<DynSolValue> {
	match value {
		DynSolValue::Tuple(values) => values,
		other => vec![other],
	}
}

/// Indexed parameters come from the topics (reference types only log their
/// hash), the rest from `data`.
fn decode_event(event: &Event, topics: &[B256], data: &[u8]) -> Result<DecodedEvent, AbiError> {
	let mut topics = topics.iter();
	if !event.anonymous {
		match topics.next() {
			Some(t) if *t == event.selector() => {}
			_ => return Err(AbiError::SelectorMismatch(event.name.clone())),
		}
	}

	let body_types = event
		.inputs
		.iter()
		.filter(|p| !p.indexed)
		.map(|p| p.resolve())
		.collect::<Result<Vec<_>, _>>()?;
	let mut body = unpack(DynSolType::Tuple(body_types).abi_decode_sequence(data)?).into_iter();

	let mut values = Vec::with_capacity(event.inputs.len());
	for param in &event.inputs {
		let value = if param.indexed {
			let topic = topics.next().ok_or_else(|| AbiError::MissingTopic(param.name.clone()))?;
			let ty = param.resolve()?;
			if ty.is_dynamic() || matches!(ty, DynSolType::Tuple(_) | DynSolType::FixedArray(..)) {
				DynSolValue::FixedBytes(*topic, 32)
			} else {
				ty.abi_decode(topic.as_slice())?
			}
		} else {
			body.next().ok_or_else(|| AbiError::MissingTopic(param.name.clone()))?
		};
		values.push(value);
	}

	Ok(DecodedEvent {
		name: event.name.clone(),
		fields: Decoded::new(event.inputs.iter().map(|p| p.name.as_str()), values),
	})
}

/// Decoded values keyed by parameter name, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decoded {
	names: Vec<String>,
	values: Vec<DynSolValue>,
}

impl Decoded {
	/// Unnamed parameters are keyed by their position.
	pub(crate) fn new<'a>(names: impl IntoIterator<Item = &'a str>, values: Vec<DynSolValue>) -> Self {
		let names = names
			.into_iter()
			.enumerate()
			.map(|(i, n)| if n.is_empty() { i.to_string() } else { n.to_owned() })
			.collect();
		Self { names, values }
	}

	/// Look a value up by name, or by position when `key` is numeric.
	pub fn get(&self, key: &str) -> Option<&DynSolValue> {
		self.names
			.iter()
			.position(|n| n == key)
			.or_else(|| key.parse::<usize>().ok())
			.and_then(|i| self.values.get(i))
	}

	pub fn require(&self, key: &str) -> Result<&DynSolValue, AbiError> {
		self.get(key).ok_or_else(|| AbiError::MissingOutput(key.to_owned()))
	}

	pub fn values(&self) -> &[DynSolValue] {
		&self.values
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &DynSolValue)> {
		self.names.iter().map(String::as_str).zip(&self.values)
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
	pub name: String,
	pub fields: Decoded,
}

/// A compiled Hardhat artifact: ABI plus creation bytecode.
#[derive(Debug, Clone)]
pub struct Artifact {
	pub contract_name: String,
	pub abi: Abi,
	pub bytecode: Bytes,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactFile {
	#[serde(default)]
	contract_name: Option<String>,
	abi: JsonAbi,
	#[serde(default)]
	bytecode: Option<Bytes>,
}

impl Artifact {
	/// Hardhat layout: `<dir>/contracts/<Name>.sol/<Name>.json`.
	pub fn path(artifacts_dir: &Path, contract_name: &str) -> PathBuf {
		artifacts_dir
			.join("contracts")
			.join(format!("{contract_name}.sol"))
			.join(format!("{contract_name}.json"))
	}

	pub fn load(artifacts_dir: &Path, contract_name: &str) -> Result<Self, AbiError> {
		let path = Self::path(artifacts_dir, contract_name);
		let content = std::fs::read_to_string(&path).map_err(|source| AbiError::Artifact {
			path: path.display().to_string(),
			source,
		})?;
		Self::from_json(contract_name, &content)
	}

	pub fn from_json(contract_name: &str, json: &str) -> Result<Self, AbiError> {
		let file: ArtifactFile = serde_json::from_str(json)?;
		Ok(Self {
			contract_name: file.contract_name.unwrap_or_else(|| contract_name.to_owned()),
			abi: Abi::from(file.abi),
			bytecode: file.bytecode.unwrap_or_default(),
		})
	}
}

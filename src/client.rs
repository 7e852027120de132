use std::time::Duration;

use alloy::primitives::{Address, U256};
use alloy::sol_types::{Revert, SolError};
use anyhow::{anyhow, bail};
use thiserror::Error;

use crate::abi::{Abi, AbiError, Artifact, Decoded, DynSolValue, RevertReason};
use crate::entity::EntityId;
use crate::mirror::{decode_hex, CallOutcome, ContractCallRequest, ContractResult, MirrorClient};
use crate::relay::{tinybars_to_weibars, RelayClient};

/// Gas for a plain getter.
pub const GETTER_GAS: u64 = 100_000;
/// Gas for an administrative setter.
pub const SETTER_GAS: u64 = 220_000;
/// Gas for the deployment transaction.
pub const DEPLOY_GAS: u64 = 1_500_000;

#[derive(Error, Debug)]
pub enum FaucetError {
	#[error("{function} reverted: {reason}")]
	Reverted { function: String, reason: RevertReason },

	#[error("artifact has no bytecode to deploy")]
	NoBytecode,

	#[error(transparent)]
	Abi(#[from] AbiError),

	#[error(transparent)]
	Backend(#[from] anyhow::Error),
}

/// What an executed transaction left behind.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
	pub tx_hash: String,
	/// Network status name, `SUCCESS` when the call went through.
	pub status: String,
	pub output: Vec<u8>,
	/// Revert payload when the contract reverted.
	pub revert: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Deployment {
	pub tx_hash: String,
	pub contract_id: EntityId,
	pub address: Address,
}

/// The ledger operations the faucet commands are built on.
#[async_trait::async_trait]
pub trait ContractBackend: Send + Sync {
	/// Simulate a read-only call.
	async fn call(&self, contract: &EntityId, calldata: &[u8], gas: u64)
		-> anyhow::Result<CallOutcome>;

	/// Submit a state-changing call, attaching `value` tinybars.
	async fn execute(
		&self,
		contract: &EntityId,
		calldata: &[u8],
		gas: u64,
		value: u64,
	) -> anyhow::Result<Execution>;

	/// Create a contract from `init_code` (bytecode followed by the
	/// encoded constructor arguments).
	async fn deploy(&self, init_code: &[u8], gas: u64) -> anyhow::Result<Deployment>;
}

// -- Hedera backend --

/// Reads through the mirror node, writes through the JSON-RPC relay.
pub struct HederaBackend {
	mirror: MirrorClient,
	relay: Option<RelayClient>,
	caller: Address,
	poll_interval: Duration,
	poll_attempts: u32,
}

impl HederaBackend {
	/// Simulations are sent from `caller`.
	pub fn new(mirror: MirrorClient, caller: Address) -> Self {
		Self {
			mirror,
			relay: None,
			caller,
			poll_interval: Duration::from_secs(1),
			poll_attempts: 30,
		}
	}

	/// Attach a signing relay for state-changing calls; simulations are
	/// then sent from the relay's sender as well.
	pub fn with_relay(mut self, relay: RelayClient) -> Self {
		if let Some(sender) = relay.sender() {
			self.caller = sender;
		}
		self.relay = Some(relay);
		self
	}

	pub fn mirror(&self) -> &MirrorClient {
		&self.mirror
	}

	fn relay(&self) -> anyhow::Result<&RelayClient> {
		self.relay
			.as_ref()
			.ok_or_else(|| anyhow!("a signer is required to submit transactions"))
	}

	/// The mirror lags consensus by a few seconds; poll until it has the
	/// result or give up quietly.
	async fn mirror_result(&self, tx_hash: &str) -> anyhow::Result<Option<ContractResult>> {
		for _ in 0..self.poll_attempts {
			if let Some(result) = self.mirror.contract_result(tx_hash).await? {
				return Ok(Some(result));
			}
			tokio::time::sleep(self.poll_interval).await;
		}
		Ok(None)
	}

	async fn resolve_contract(&self, address: &Address) -> anyhow::Result<EntityId> {
		let mut last_err = None;
		for _ in 0..self.poll_attempts {
			match self.mirror.contract_by_address(address).await {
				Ok(id) => return Ok(id),
				Err(e) => last_err = Some(e),
			}
			tokio::time::sleep(self.poll_interval).await;
		}
		Err(last_err.unwrap_or_else(|| anyhow!("contract {address} not found")))
	}
}

#[async_trait::async_trait]
impl ContractBackend for HederaBackend {
	async fn call(
		&self,
		contract: &EntityId,
		calldata: &[u8],
		gas: u64,
	) -> anyhow::Result<CallOutcome> {
		let request =
			ContractCallRequest::new(&contract.to_address(), &self.caller, calldata).with_gas(gas);
		self.mirror.contract_call(&request).await
	}

	async fn execute(
		&self,
		contract: &EntityId,
		calldata: &[u8],
		gas: u64,
		value: u64,
	) -> anyhow::Result<Execution> {
		let receipt = self
			.relay()?
			.send(Some(contract.to_address()), calldata.to_vec(), gas, tinybars_to_weibars(value))
			.await?;
		let tx_hash = receipt.transaction_hash.to_string();
		let result = self.mirror_result(&tx_hash).await?;
		execution_from(tx_hash, receipt.status(), result)
	}

	async fn deploy(&self, init_code: &[u8], gas: u64) -> anyhow::Result<Deployment> {
		let receipt = self.relay()?.send(None, init_code.to_vec(), gas, U256::ZERO).await?;
		let tx_hash = receipt.transaction_hash.to_string();
		if !receipt.status() {
			bail!("deployment {tx_hash} failed");
		}
		let address = receipt
			.contract_address
			.ok_or_else(|| anyhow!("receipt for {tx_hash} has no contract address"))?;
		let contract_id = self.resolve_contract(&address).await?;
		Ok(Deployment {
			tx_hash,
			contract_id,
			address,
		})
	}
}

/// Merge the relay receipt with the mirror's view of the same transaction.
fn execution_from(
	tx_hash: String,
	succeeded: bool,
	result: Option<ContractResult>,
) -> anyhow::Result<Execution> {
	let fallback_status = if succeeded { "SUCCESS" } else { "CONTRACT_REVERT_EXECUTED" };
	let Some(result) = result else {
		return Ok(Execution {
			tx_hash,
			status: fallback_status.to_owned(),
			output: Vec::new(),
			revert: (!succeeded).then(Vec::new),
		});
	};

	let output = match result.call_result.as_deref() {
		Some(hex) if succeeded => decode_hex(hex)?,
		_ => Vec::new(),
	};
	let revert = (!succeeded).then(|| revert_payload(result.error_message.as_deref()));
	Ok(Execution {
		tx_hash,
		status: result.result.unwrap_or_else(|| fallback_status.to_owned()),
		output,
		revert,
	})
}

/// The mirror reports reverts either as hex or as plain text.
fn revert_payload(error_message: Option<&str>) -> Vec<u8> {
	match error_message {
		None | Some("") => Vec::new(),
		Some(msg) => decode_hex(msg).unwrap_or_else(|_| Revert { reason: msg.to_owned() }.abi_encode()),
	}
}

// -- Faucet client --

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
	pub tx_hash: String,
	pub status: String,
	pub outputs: Decoded,
}

/// A faucet contract bound to its ABI and a backend.
pub struct FaucetClient<B> {
	abi: Abi,
	contract: EntityId,
	backend: B,
}

impl<B: ContractBackend> FaucetClient<B> {
	pub fn new(abi: Abi, contract: EntityId, backend: B) -> Self {
		Self { abi, contract, backend }
	}

	pub fn abi(&self) -> &Abi {
		&self.abi
	}

	pub fn contract(&self) -> EntityId {
		self.contract
	}

	pub fn backend(&self) -> &B {
		&self.backend
	}

	fn reverted(&self, function: &str, data: &[u8]) -> FaucetError {
		FaucetError::Reverted {
			function: function.to_owned(),
			reason: RevertReason::decode(data, Some(&self.abi)),
		}
	}

	/// Read-only call, decoded by the function's outputs.
	pub async fn query(&self, function: &str, args: &[DynSolValue], gas: u64) -> Result<Decoded, FaucetError> {
		let calldata = self.abi.encode_call(function, args)?;
		match self.backend.call(&self.contract, &calldata, gas).await? {
			CallOutcome::Success(out) => Ok(self.abi.decode_output(function, &out)?),
			CallOutcome::Reverted(data) => Err(self.reverted(function, &data)),
		}
	}

	/// A zero-argument getter, reduced to one named output.
	pub async fn get_setting(&self, function: &str, output: &str) -> Result<DynSolValue, FaucetError> {
		let decoded = self.query(function, &[], GETTER_GAS).await?;
		Ok(decoded.require(output)?.clone())
	}

	/// A zero-argument getter, reduced to several named outputs in order.
	pub async fn get_settings<S: AsRef<str>>(
		&self,
		function: &str,
		outputs: &[S],
	) -> Result<Vec<DynSolValue>, FaucetError> {
		let decoded = self.query(function, &[], GETTER_GAS).await?;
		outputs
			.iter()
			.map(|o| decoded.require(o.as_ref()).cloned().map_err(FaucetError::from))
			.collect()
	}

	/// State-changing call. A revert is an error carrying the decoded reason.
	pub async fn execute(
		&self,
		function: &str,
		args: &[DynSolValue],
		gas: u64,
		value: u64,
	) -> Result<ExecutionReport, FaucetError> {
		let calldata = self.abi.encode_call(function, args)?;
		let execution = self.backend.execute(&self.contract, &calldata, gas, value).await?;
		if let Some(data) = &execution.revert {
			return Err(self.reverted(function, data));
		}
		// no output when the mirror never caught up with the transaction
		let outputs = if execution.output.is_empty() {
			Decoded::default()
		} else {
			self.abi.decode_output(function, &execution.output)?
		};
		Ok(ExecutionReport {
			tx_hash: execution.tx_hash,
			status: execution.status,
			outputs,
		})
	}

	/// Deploy `artifact` with the given constructor arguments.
	pub async fn deploy(
		backend: &B,
		artifact: &Artifact,
		args: &[DynSolValue],
		gas: u64,
	) -> Result<Deployment, FaucetError> {
		if artifact.bytecode.is_empty() {
			return Err(FaucetError::NoBytecode);
		}
		let mut init_code = artifact.bytecode.to_vec();
		init_code.extend(artifact.abi.encode_constructor(args)?);
		Ok(backend.deploy(&init_code, gas).await?)
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use std::sync::Mutex;

	use super::*;
	use crate::abi::artifact::tests::{encode, faucet_abi, uint, FAUCET_ABI};
	use crate::abi::uint_array;

	/// Answers calls from a queue and records every request.
	#[derive(Default)]
	pub(crate) struct MockBackend {
		pub calls: Mutex<Vec<(Vec<u8>, u64)>>,
		pub outcomes: Mutex<Vec<CallOutcome>>,
		pub execution: Mutex<Option<Execution>>,
	}

	impl MockBackend {
		pub(crate) fn answering(outcomes: Vec<CallOutcome>) -> Self {
			Self {
				outcomes: Mutex::new(outcomes),
				..Default::default()
			}
		}
	}

	#[async_trait::async_trait]
	impl ContractBackend for MockBackend {
		async fn call(
			&self,
			_contract: &EntityId,
			calldata: &[u8],
			gas: u64,
		) -> anyhow::Result<CallOutcome> {
			self.calls.lock().unwrap().push((calldata.to_vec(), gas));
			let mut outcomes = self.outcomes.lock().unwrap();
			if outcomes.is_empty() {
				bail!("no canned outcome");
			}
			Ok(outcomes.remove(0))
		}

		async fn execute(
			&self,
			_contract: &EntityId,
			calldata: &[u8],
			gas: u64,
			_value: u64,
		) -> anyhow::Result<Execution> {
			self.calls.lock().unwrap().push((calldata.to_vec(), gas));
			self.execution
				.lock()
				.unwrap()
				.clone()
				.ok_or_else(|| anyhow!("no canned execution"))
		}

		async fn deploy(&self, init_code: &[u8], gas: u64) -> anyhow::Result<Deployment> {
			self.calls.lock().unwrap().push((init_code.to_vec(), gas));
			Ok(Deployment {
				tx_hash: "0xfeed".into(),
				contract_id: EntityId::new(0, 0, 9),
				address: EntityId::new(0, 0, 9).to_address(),
			})
		}
	}

	fn client(backend: MockBackend) -> FaucetClient<MockBackend> {
		FaucetClient::new(faucet_abi(), EntityId::new(0, 0, 5), backend)
	}

	#[tokio::test]
	async fn query_encodes_and_decodes_by_name() {
		let out = encode(vec![uint(250)]);
		let c = client(MockBackend::answering(vec![CallOutcome::Success(out)]));

		let decoded = c
			.query("getClaimableForTokens", &[uint_array([1, 2])], 60_000)
			.await
			.unwrap();
		assert_eq!(decoded.get("amt"), Some(&uint(250)));

		let calls = c.backend().calls.lock().unwrap();
		let f = faucet_abi();
		let sel = f.function("getClaimableForTokens").unwrap().selector();
		assert_eq!(calls[0].0[..4], sel[..]);
		assert_eq!(calls[0].1, 60_000);
	}

	#[tokio::test]
	async fn getters_pick_named_outputs() {
		let out = encode(vec![uint(5), DynSolValue::Bool(false)]);
		let c = client(MockBackend::answering(vec![
			CallOutcome::Success(out.clone()),
			CallOutcome::Success(out),
		]));

		let daily = c.get_setting("getSettings", "dailyAmt").await.unwrap();
		assert_eq!(daily, uint(5));

		let both = c.get_settings("getSettings", &["dailyAmt", "1"]).await.unwrap();
		assert_eq!(both, vec![uint(5), DynSolValue::Bool(false)]);
		assert_eq!(c.backend().calls.lock().unwrap()[0].1, GETTER_GAS);
	}

	#[tokio::test]
	async fn missing_output_is_an_abi_error() {
		let out = encode(vec![uint(5), DynSolValue::Bool(false)]);
		let c = client(MockBackend::answering(vec![CallOutcome::Success(out)]));
		let err = c.get_setting("getSettings", "nope").await.unwrap_err();
		assert!(matches!(err, FaucetError::Abi(AbiError::MissingOutput(_))));
	}

	#[tokio::test]
	async fn reverts_carry_decoded_reason() {
		let caller = Address::repeat_byte(0x42);
		let abi = faucet_abi();
		let mut payload = abi.json().errors().next().unwrap().selector().to_vec();
		payload.extend(encode(vec![DynSolValue::Address(caller)]));
		let c = client(MockBackend::answering(vec![CallOutcome::Reverted(payload)]));

		let err = c.get_setting("getBoostSerials", "boostSerials").await.unwrap_err();
		match err {
			FaucetError::Reverted { function, reason: RevertReason::Custom { name, .. } } => {
				assert_eq!(function, "getBoostSerials");
				assert_eq!(name, "NotOperator");
			}
			other => panic!("unexpected {other:?}"),
		}
	}

	#[tokio::test]
	async fn execute_reports_status_or_revert() {
		let backend = MockBackend::default();
		*backend.execution.lock().unwrap() = Some(Execution {
			tx_hash: "0x01".into(),
			status: "SUCCESS".into(),
			output: vec![],
			revert: None,
		});
		let c = client(backend);
		let report = c
			.execute("addBoostSerials", &[uint_array([7])], SETTER_GAS, 0)
			.await
			.unwrap();
		assert_eq!(report.status, "SUCCESS");
		assert!(report.outputs.is_empty());

		*c.backend().execution.lock().unwrap() = Some(Execution {
			tx_hash: "0x02".into(),
			status: "CONTRACT_REVERT_EXECUTED".into(),
			output: vec![],
			revert: Some(vec![]),
		});
		let err = c
			.execute("addBoostSerials", &[uint_array([7])], SETTER_GAS, 0)
			.await
			.unwrap_err();
		assert!(matches!(err, FaucetError::Reverted { reason: RevertReason::Empty, .. }));
	}

	#[tokio::test]
	async fn deploy_appends_constructor_args() {
		let json = format!(r#"{{"abi":{FAUCET_ABI},"bytecode":"0x6080"}}"#);
		let artifact = Artifact::from_json("F", &json).unwrap();
		let backend = MockBackend::default();
		let args: Vec<DynSolValue> = (0..6)
			.map(|i| {
				if i < 3 {
					DynSolValue::Address(EntityId::new(0, 0, i).to_address())
				} else {
					uint(i)
				}
			})
			.chain([DynSolValue::Uint(U256::from(12u8), 8)])
			.collect();

		let deployment = FaucetClient::deploy(&backend, &artifact, &args, DEPLOY_GAS).await.unwrap();
		assert_eq!(deployment.contract_id, EntityId::new(0, 0, 9));

		let calls = backend.calls.lock().unwrap();
		assert_eq!(calls[0].0[..2], [0x60, 0x80]);
		assert_eq!(calls[0].0.len(), 2 + 7 * 32);
		assert_eq!(calls[0].1, DEPLOY_GAS);
	}

	#[tokio::test]
	async fn deploy_without_bytecode_fails() {
		let artifact = Artifact::from_json("F", &format!(r#"{{"abi":{FAUCET_ABI}}}"#)).unwrap();
		let err = FaucetClient::deploy(&MockBackend::default(), &artifact, &[], DEPLOY_GAS)
			.await
			.unwrap_err();
		assert!(matches!(err, FaucetError::NoBytecode));
	}

	#[test]
	fn execution_merges_mirror_view() {
		let ok = execution_from(
			"0x1".into(),
			true,
			Some(ContractResult {
				result: Some("SUCCESS".into()),
				call_result: Some("0x01".into()),
				error_message: None,
				contract_id: None,
			}),
		)
		.unwrap();
		assert_eq!(ok.status, "SUCCESS");
		assert_eq!(ok.output, vec![1]);
		assert!(ok.revert.is_none());

		let reverted = execution_from(
			"0x2".into(),
			false,
			Some(ContractResult {
				result: Some("CONTRACT_REVERT_EXECUTED".into()),
				call_result: None,
				error_message: Some("not allowed".into()),
				contract_id: None,
			}),
		)
		.unwrap();
		let reason = RevertReason::decode(reverted.revert.as_deref().unwrap(), None);
		assert_eq!(reason, RevertReason::Message("not allowed".into()));

		let unseen = execution_from("0x3".into(), true, None).unwrap();
		assert_eq!(unseen.status, "SUCCESS");
	}
}

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, B256};
use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::entity::EntityId;

/// Page size requested from the logs endpoint (the mirror's maximum).
pub const LOGS_PAGE_LIMIT: u32 = 100;

/// Client for the mirror-node REST API.
///
/// Only the handful of contract endpoints the faucet commands need:
/// log listing, read-only call simulation and result lookups.
pub struct MirrorClient {
	base_url: String,
	http: reqwest::Client,
}

impl MirrorClient {
	pub fn new(base_url: &str) -> Self {
		Self {
			base_url: base_url.trim_end_matches('/').to_owned(),
			http: reqwest::Client::new(),
		}
	}

	/// `links.next` values are paths; make them absolute.
	fn absolute(&self, path_or_url: &str) -> String {
		if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
			path_or_url.to_owned()
		} else {
			format!("{}{}", self.base_url, path_or_url)
		}
	}

	async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
		log::debug!("GET {url}");
		let resp = self.http.get(url).send().await?.error_for_status()?;
		Ok(resp.json().await?)
	}

	// -- Logs --

	pub fn logs_url(&self, contract: &EntityId) -> String {
		format!(
			"{}/api/v1/contracts/{contract}/results/logs?order=desc&limit={LOGS_PAGE_LIMIT}",
			self.base_url
		)
	}

	/// Newest-first pages of a contract's logs.
	pub fn logs(&self, contract: &EntityId) -> LogPager<'_> {
		LogPager {
			client: self,
			next: Some(self.logs_url(contract)),
		}
	}

	// -- Contract call simulation --

	/// POST a read-only call and return the raw HTTP status and body.
	pub async fn contract_call_raw(&self, request: &ContractCallRequest) -> Result<(u16, Value)> {
		let url = format!("{}/api/v1/contracts/call", self.base_url);
		log::debug!("POST {url} data={}", request.data);
		let resp = self.http.post(&url).json(request).send().await?;
		let status = resp.status().as_u16();
		let body = resp.json::<Value>().await.unwrap_or(Value::Null);
		Ok((status, body))
	}

	/// POST a read-only call; a contract revert is an `Ok` outcome.
	pub async fn contract_call(&self, request: &ContractCallRequest) -> Result<CallOutcome> {
		let (status, body) = self.contract_call_raw(request).await?;
		interpret_call_response(status, &body)
	}

	// -- Result lookups --

	/// Execution result of a transaction, once the mirror has ingested it.
	pub async fn contract_result(&self, tx_hash: &str) -> Result<Option<ContractResult>> {
		let url = format!("{}/api/v1/contracts/results/{tx_hash}", self.base_url);
		log::debug!("GET {url}");
		let resp = self.http.get(&url).send().await?;
		if resp.status() == reqwest::StatusCode::NOT_FOUND {
			return Ok(None);
		}
		Ok(Some(resp.error_for_status()?.json().await?))
	}

	/// EVM address the network derived for an account's key, when it has
	/// one (ECDSA accounts created from an alias).
	pub async fn account_evm_address(&self, account: &EntityId) -> Result<Option<Address>> {
		let url = format!("{}/api/v1/accounts/{account}", self.base_url);
		let info: AccountInfo = self.get_json(&url).await?;
		info.evm_address
			.as_deref()
			.map(|a| {
				let bytes = decode_hex(a)?;
				if bytes.len() != 20 {
					bail!("mirror returned a bad evm_address {a:?}");
				}
				Ok(Address::from_slice(&bytes))
			})
			.transpose()
	}

	/// Resolve a contract's `0.0.N` id from its EVM address.
	pub async fn contract_by_address(&self, address: &Address) -> Result<EntityId> {
		let url = format!("{}/api/v1/contracts/0x{}", self.base_url, hex::encode(address));
		let info: ContractInfo = self.get_json(&url).await?;
		info.contract_id
			.parse()
			.with_context(|| format!("mirror returned a bad contract id {:?}", info.contract_id))
	}
}

/// A newest-first sequence of log pages.
#[async_trait::async_trait]
pub trait LogSource: Send {
	/// Fetch the next page, or `None` once exhausted. After an error the
	/// source is exhausted as well.
	async fn next_page(&mut self) -> Result<Option<LogsPage>>;

	/// Do not fetch any further pages.
	fn stop(&mut self);
}

/// Walks `links.next` until the mirror reports no further page.
pub struct LogPager<'a> {
	client: &'a MirrorClient,
	next: Option<String>,
}

#[async_trait::async_trait]
impl LogSource for LogPager<'_> {
	async fn next_page(&mut self) -> Result<Option<LogsPage>> {
		let Some(url) = self.next.take() else {
			return Ok(None);
		};
		let page: LogsPage = self
			.client
			.get_json(&url)
			.await
			.with_context(|| format!("fetching logs from {url}"))?;
		self.next = page.links.next.as_deref().map(|n| self.client.absolute(n));
		Ok(Some(page))
	}

	fn stop(&mut self) {
		self.next = None;
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogsPage {
	#[serde(default)]
	pub logs: Vec<ContractLog>,
	#[serde(default)]
	pub links: Links,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Links {
	pub next: Option<String>,
}

/// One entry of `/contracts/{id}/results/logs`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractLog {
	#[serde(default)]
	pub address: Option<String>,
	#[serde(default)]
	pub block_number: Option<u64>,
	#[serde(default)]
	pub contract_id: Option<String>,
	#[serde(default)]
	pub data: Option<String>,
	#[serde(default)]
	pub index: Option<u64>,
	#[serde(default)]
	pub topics: Vec<String>,
	pub timestamp: ConsensusTimestamp,
	#[serde(default)]
	pub transaction_hash: Option<String>,
}

impl ContractLog {
	/// Logs with `data == "0x"` carry nothing we can decode.
	pub fn has_data(&self) -> bool {
		matches!(self.data.as_deref(), Some(d) if !d.is_empty() && d != "0x")
	}

	pub fn data_bytes(&self) -> Result<Vec<u8>> {
		let data = self.data.as_deref().unwrap_or("0x");
		decode_hex(data)
	}

	/// Topics left-padded to full words; the mirror trims leading zeros.
	pub fn topic_words(&self) -> Result<Vec<B256>> {
		self.topics
			.iter()
			.map(|t| {
				let bytes = decode_hex(t)?;
				if bytes.len() > 32 {
					bail!("topic longer than 32 bytes: {t}");
				}
				Ok(B256::left_padding_from(&bytes))
			})
			.collect()
	}
}

pub(crate) fn decode_hex(s: &str) -> Result<Vec<u8>> {
	let clean = s.strip_prefix("0x").unwrap_or(s);
	hex::decode(clean).map_err(|e| anyhow!("invalid hex {s:?}: {e}"))
}

/// A consensus timestamp, `seconds.nanoseconds` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConsensusTimestamp {
	pub seconds: i64,
	pub nanos: u32,
}

impl ConsensusTimestamp {
	pub fn from_datetime(dt: DateTime<Utc>) -> Self {
		Self {
			seconds: dt.timestamp(),
			nanos: dt.timestamp_subsec_nanos(),
		}
	}

	pub fn now() -> Self {
		Self::from_datetime(Utc::now())
	}
}

impl Ord for ConsensusTimestamp {
	fn cmp(&self, other: &Self) -> Ordering {
		(self.seconds, self.nanos).cmp(&(other.seconds, other.nanos))
	}
}

impl PartialOrd for ConsensusTimestamp {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl FromStr for ConsensusTimestamp {
	type Err = anyhow::Error;

	fn from_str(s: &str) -> Result<Self> {
		let (secs, frac) = s.split_once('.').unwrap_or((s, ""));
		let seconds = secs.parse().with_context(|| format!("bad timestamp {s:?}"))?;
		let nanos = if frac.is_empty() {
			0
		} else {
			if frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
				bail!("bad timestamp {s:?}");
			}
			format!("{frac:0<9}").parse()?
		};
		Ok(Self { seconds, nanos })
	}
}

impl fmt::Display for ConsensusTimestamp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{:09}", self.seconds, self.nanos)
	}
}

impl<'de> Deserialize<'de> for ConsensusTimestamp {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}

/// Body of `POST /api/v1/contracts/call`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractCallRequest {
	pub block: String,
	pub data: String,
	pub estimate: bool,
	pub from: String,
	pub gas: u64,
	pub gas_price: u64,
	pub to: String,
	pub value: u64,
}

impl ContractCallRequest {
	pub const DEFAULT_GAS: u64 = 300_000;
	pub const DEFAULT_GAS_PRICE: u64 = 100_000_000;

	pub fn new(to: &Address, from: &Address, calldata: &[u8]) -> Self {
		Self {
			block: "latest".into(),
			data: format!("0x{}", hex::encode(calldata)),
			estimate: false,
			from: format!("0x{}", hex::encode(from)),
			gas: Self::DEFAULT_GAS,
			gas_price: Self::DEFAULT_GAS_PRICE,
			to: format!("0x{}", hex::encode(to)),
			value: 0,
		}
	}

	pub fn with_gas(mut self, gas: u64) -> Self {
		self.gas = gas;
		self
	}

	pub fn with_estimate(mut self, estimate: bool) -> Self {
		self.estimate = estimate;
		self
	}
}

/// What a simulated call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
	Success(Vec<u8>),
	/// The contract reverted; holds the revert payload (possibly empty).
	Reverted(Vec<u8>),
}

/// Classify a `/contracts/call` response.
pub fn interpret_call_response(status: u16, body: &Value) -> Result<CallOutcome> {
	if (200..300).contains(&status) {
		let result = body
			.get("result")
			.and_then(Value::as_str)
			.ok_or_else(|| anyhow!("mirror call response has no result: {body}"))?;
		return Ok(CallOutcome::Success(decode_hex(result)?));
	}

	let messages = body
		.pointer("/_status/messages")
		.and_then(Value::as_array)
		.cloned()
		.unwrap_or_default();
	for msg in &messages {
		if msg.get("message").and_then(Value::as_str) == Some("CONTRACT_REVERT_EXECUTED") {
			let data = msg.get("data").and_then(Value::as_str).unwrap_or("0x");
			return Ok(CallOutcome::Reverted(decode_hex(data)?));
		}
	}

	let text: Vec<String> = messages
		.iter()
		.map(|m| {
			let message = m.get("message").and_then(Value::as_str).unwrap_or("");
			match m.get("detail").and_then(Value::as_str) {
				Some(detail) if !detail.is_empty() => format!("{message} ({detail})"),
				_ => message.to_owned(),
			}
		})
		.collect();
	bail!("mirror call failed with HTTP {status}: {}", text.join("; "))
}

/// Subset of `/api/v1/contracts/results/{txHash}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractResult {
	/// Hedera status name, e.g. `SUCCESS` or `CONTRACT_REVERT_EXECUTED`.
	#[serde(default)]
	pub result: Option<String>,
	#[serde(default)]
	pub call_result: Option<String>,
	#[serde(default)]
	pub error_message: Option<String>,
	#[serde(default)]
	pub contract_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ContractInfo {
	contract_id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct AccountInfo {
	#[serde(default)]
	evm_address: Option<String>,
}

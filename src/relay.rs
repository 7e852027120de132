use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log, TransactionReceipt, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::{RpcError, TransportError};
use anyhow::{bail, Context, Result};

/// Weibars per tinybar; the relay prices gas and value in weibars.
pub const WEIBARS_PER_TINYBAR: u64 = 10_000_000_000;

/// Convert a tinybar amount to the weibar value a relay transaction carries.
pub fn tinybars_to_weibars(tinybars: u64) -> U256 {
	U256::from(tinybars) * U256::from(WEIBARS_PER_TINYBAR)
}

/// JSON-RPC access to the Hedera relay (Hashio).
///
/// Used for what the mirror node cannot do: submitting signed
/// transactions and following the chain head for log polling.
pub struct RelayClient {
	url: String,
	provider: DynProvider,
	sender: Option<Address>,
}

impl RelayClient {
	/// Read-only connection.
	pub fn connect(url: &str) -> Result<Self> {
		let provider = ProviderBuilder::new().connect_http(url.parse().context("invalid relay URL")?);
		Ok(Self {
			url: url.to_owned(),
			provider: provider.erased(),
			sender: None,
		})
	}

	/// Connection that signs and sends transactions as `signer`.
	pub fn with_signer(url: &str, signer: PrivateKeySigner) -> Result<Self> {
		let sender = signer.address();
		let provider = ProviderBuilder::new()
			.wallet(EthereumWallet::from(signer))
			.connect_http(url.parse().context("invalid relay URL")?);
		Ok(Self {
			url: url.to_owned(),
			provider: provider.erased(),
			sender: Some(sender),
		})
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	/// The address transactions are sent from, when signing.
	pub fn sender(&self) -> Option<Address> {
		self.sender
	}

	pub async fn block_number(&self) -> Result<u64> {
		Ok(self.provider.get_block_number().await?)
	}

	pub async fn chain_id(&self) -> Result<u64> {
		Ok(self.provider.get_chain_id().await?)
	}

	/// Fail unless the relay serves the chain we are about to sign for.
	pub async fn ensure_chain(&self, expected: u64) -> Result<()> {
		let actual = self.chain_id().await?;
		check_chain(expected, actual)
	}

	/// Send a legacy transaction priced at the relay's gas price and wait
	/// for its receipt.
	pub async fn send(
		&self,
		to: Option<Address>,
		input: Vec<u8>,
		gas: u64,
		value: U256,
	) -> Result<TransactionReceipt> {
		if self.sender.is_none() {
			bail!("a signer is required to submit transactions");
		}
		let gas_price = self.provider.get_gas_price().await?;
		let request = legacy_request(to, input.into(), gas, value, gas_price);

		let pending = self.provider.send_transaction(request).await?;
		log::info!("submitted {}", pending.tx_hash());
		Ok(pending.get_receipt().await?)
	}

	pub async fn get_logs(&self, address: Address, from_block: u64, topic0: B256) -> Result<Vec<Log>> {
		let filter = Filter::new().address(address).from_block(from_block).event_signature(topic0);
		Ok(self.provider.get_logs(&filter).await?)
	}
}

fn legacy_request(
	to: Option<Address>,
	input: Bytes,
	gas: u64,
	value: U256,
	gas_price: u128,
) -> TransactionRequest {
	let request = TransactionRequest::default()
		.with_input(input)
		.with_gas_limit(gas)
		.with_gas_price(gas_price)
		.with_value(value);
	match to {
		Some(to) => request.with_to(to),
		None => request.into_create(),
	}
}

fn check_chain(expected: u64, actual: u64) -> Result<()> {
	if expected != actual {
		bail!("relay serves chain {actual}, expected {expected}; check RELAY_URL against ENVIRONMENT");
	}
	Ok(())
}

/// Whether `err` is the relay answering with something that is not a
/// JSON-RPC response; these come and go and are not worth reporting.
pub fn is_malformed_response(err: &anyhow::Error) -> bool {
	matches!(
		err.downcast_ref::<TransportError>(),
		Some(RpcError::DeserError { .. } | RpcError::NullResp)
	)
}

//! Integration tests that hit a live Hedera mirror node.
//!
//! They read the same `.env` as the CLI (ENVIRONMENT, CONTRACT_ID,
//! CONTRACT_NAME, ARTIFACTS_DIR) and are marked `#[ignore]` by default
//! because they require network access and a deployed faucet. Run them
//! explicitly with:
//!
//!   cargo test --test integration -- --ignored
//!
//! FAUCET_TEST_SERIALS (comma separated) selects the serials used by the
//! claimable checks; the operator must hold them.
//!
//! The state tests submit transactions as the operator (ACCOUNT_ID and
//! PRIVATE_KEY) and need the faucet's function names:
//!   FAUCET_CLAIM_FUNCTION   claim for a `uint256[]` of serials
//!   FAUCET_RESET_FUNCTION   reset the accrual timestamp of serials
//! Each skips itself when its variable is unset.

use alloy::dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier};
use alloy::primitives::{Address, B256, I256, U256};

use hedera_faucet_cli::abi::{is_read_only, parse_serials, uint_array, Artifact, Function};
use hedera_faucet_cli::client::{FaucetClient, HederaBackend, SETTER_GAS};
use hedera_faucet_cli::commands::claimable::claimable_gas;
use hedera_faucet_cli::commands::{read_backend, write_backend};
use hedera_faucet_cli::config::Settings;
use hedera_faucet_cli::mirror::{CallOutcome, ContractCallRequest, LogSource, MirrorClient};

fn settings() -> Settings {
	Settings::from_env(None).expect("faucet settings missing from .env")
}

fn bind(settings: &Settings, backend: HederaBackend) -> FaucetClient<HederaBackend> {
	let name = settings.contract_name.as_deref().expect("CONTRACT_NAME not set");
	let artifact = Artifact::load(&settings.artifacts_dir, name).expect("artifact not found");
	FaucetClient::new(artifact.abi, settings.require_contract().unwrap(), backend)
}

fn faucet(settings: &Settings) -> FaucetClient<HederaBackend> {
	bind(settings, read_backend(settings).expect("bad PRIVATE_KEY"))
}

async fn operator_faucet(settings: &Settings) -> FaucetClient<HederaBackend> {
	bind(settings, write_backend(settings).await.expect("operator cannot sign"))
}

fn test_serials() -> Vec<u64> {
	let raw = std::env::var("FAUCET_TEST_SERIALS").unwrap_or_else(|_| "1,2".into());
	parse_serials(&raw).expect("FAUCET_TEST_SERIALS is not a serial list")
}

fn function_name(var: &str) -> Option<String> {
	let name = std::env::var(var).ok().filter(|v| !v.is_empty());
	if name.is_none() {
		eprintln!("{var} not set; skipping");
	}
	name
}

async fn claimable(faucet: &FaucetClient<HederaBackend>, serials: &[u64]) -> U256 {
	let out = faucet
		.query(
			"getClaimableForTokens",
			&[uint_array(serials.iter().copied())],
			claimable_gas(serials.len()),
		)
		.await
		.expect("getClaimableForTokens failed");
	out.require("amt").unwrap().as_uint().expect("amt is not a uint").0
}

async fn boosted(faucet: &FaucetClient<HederaBackend>) -> Vec<U256> {
	let list = faucet
		.get_setting("getBoostSerials", "boostSerials")
		.await
		.expect("getBoostSerials failed");
	list.as_array()
		.expect("boostSerials is not an array")
		.iter()
		.filter_map(|v| v.as_uint().map(|(n, _)| n))
		.collect()
}

/// A plausible argument of type `ty`; arrays of integers carry `serials`.
fn sample_arg(ty: &DynSolType, who: Address, serials: &[u64], now: u64) -> Option<DynSolValue> {
	Some(match ty {
		DynSolType::Address => DynSolValue::Address(who),
		DynSolType::Bool => DynSolValue::Bool(true),
		DynSolType::Uint(bits) if *bits >= 64 => DynSolValue::Uint(U256::from(now), *bits),
		DynSolType::Uint(bits) => DynSolValue::Uint(U256::from(1u64), *bits),
		DynSolType::Int(bits) => DynSolValue::Int(I256::ONE, *bits),
		DynSolType::String => DynSolValue::String("test".into()),
		DynSolType::Bytes => DynSolValue::Bytes(Vec::new()),
		DynSolType::FixedBytes(size) => DynSolValue::FixedBytes(B256::ZERO, *size),
		DynSolType::Array(inner) => match inner.as_ref() {
			DynSolType::Uint(bits) => DynSolValue::Array(
				serials.iter().map(|s| DynSolValue::Uint(U256::from(*s), *bits)).collect(),
			),
			other => DynSolValue::Array(vec![sample_arg(other, who, serials, now)?]),
		},
		_ => return None,
	})
}

fn sample_args(f: &Function, who: Address, serials: &[u64]) -> Option<Vec<DynSolValue>> {
	let now = chrono::Utc::now().timestamp() as u64;
	f.inputs
		.iter()
		.map(|p| sample_arg(&p.resolve().ok()?, who, serials, now))
		.collect()
}

async fn simulate_as(
	faucet: &FaucetClient<HederaBackend>,
	from: &Address,
	calldata: &[u8],
) -> CallOutcome {
	let request =
		ContractCallRequest::new(&faucet.contract().to_address(), from, calldata).with_gas(SETTER_GAS);
	faucet
		.backend()
		.mirror()
		.contract_call(&request)
		.await
		.expect("contract call failed")
}

#[tokio::test]
#[ignore]
async fn first_log_page_is_ordered_newest_first() {
	let settings = settings();
	let mirror = MirrorClient::new(&settings.mirror_url);
	let contract = settings.require_contract().unwrap();

	let page = mirror
		.logs(&contract)
		.next_page()
		.await
		.expect("log fetch failed")
		.expect("first page is always present");

	let stamps: Vec<_> = page.logs.iter().map(|l| l.timestamp).collect();
	let mut sorted = stamps.clone();
	sorted.sort_by(|a, b| b.cmp(a));
	assert_eq!(stamps, sorted, "mirror logs should be newest first");
}

#[tokio::test]
#[ignore]
async fn batch_claimable_matches_individual_queries() {
	let settings = settings();
	let faucet = faucet(&settings);
	let serials = test_serials();

	let batch = claimable(&faucet, &serials).await;
	let mut sum = U256::ZERO;
	for serial in &serials {
		sum += claimable(&faucet, std::slice::from_ref(serial)).await;
	}
	assert_eq!(batch, sum);
}

#[tokio::test]
#[ignore]
async fn stranger_cannot_add_boost_serials() {
	let settings = settings();
	let faucet = faucet(&settings);
	let stranger = Address::from(rand::random::<[u8; 20]>());

	let calldata = faucet
		.abi()
		.encode_call("addBoostSerials", &[uint_array(test_serials())])
		.unwrap();
	assert!(
		matches!(simulate_as(&faucet, &stranger, &calldata).await, CallOutcome::Reverted(_)),
		"non-operator boost should revert"
	);
}

/// Covers boost list edits, pausing, parameter updates, timestamp resets
/// and withdrawals alike: a random account holds no serials and is not
/// the operator, so no state-changing function may succeed for it.
#[tokio::test]
#[ignore]
async fn stranger_cannot_call_any_state_changing_function() {
	let settings = settings();
	let faucet = faucet(&settings);
	let stranger = Address::from(rand::random::<[u8; 20]>());
	let serials = test_serials();

	let mut checked = 0;
	let mut allowed = Vec::new();
	for f in faucet.abi().json().functions().filter(|f| !is_read_only(f)) {
		let Some(args) = sample_args(f, stranger, &serials) else {
			eprintln!("no sample arguments for {}; skipping", f.signature());
			continue;
		};
		let calldata = f.abi_encode_input(&args).unwrap();
		checked += 1;
		if let CallOutcome::Success(_) = simulate_as(&faucet, &stranger, &calldata).await {
			allowed.push(f.signature());
		}
	}
	assert!(checked > 0, "the ABI has no state-changing functions");
	assert!(allowed.is_empty(), "a stranger may call {allowed:?}");
}

#[tokio::test]
#[ignore]
async fn reclaiming_immediately_yields_zero() {
	let Some(claim) = function_name("FAUCET_CLAIM_FUNCTION") else {
		return;
	};
	let settings = settings();
	let faucet = operator_faucet(&settings).await;
	let serials = test_serials();

	faucet
		.execute(&claim, &[uint_array(serials.clone())], SETTER_GAS, 0)
		.await
		.expect("claim failed");
	assert_eq!(claimable(&faucet, &serials).await, U256::ZERO);
}

#[tokio::test]
#[ignore]
async fn boosting_a_serial_scales_its_claimable_amount() {
	let settings = settings();
	let faucet = operator_faucet(&settings).await;
	let already = boosted(&faucet).await;
	let Some(serial) = test_serials().into_iter().find(|s| !already.contains(&U256::from(*s))) else {
		eprintln!("every test serial is boosted already; skipping");
		return;
	};

	let before = claimable(&faucet, &[serial]).await;
	faucet
		.execute("addBoostSerials", &[uint_array([serial])], SETTER_GAS, 0)
		.await
		.expect("addBoostSerials failed");
	let after = claimable(&faucet, &[serial]).await;
	faucet
		.execute("removeBoostSerials", &[uint_array([serial])], SETTER_GAS, 0)
		.await
		.expect("removeBoostSerials failed");

	if before.is_zero() {
		assert!(after.is_zero(), "nothing accrued, so the boost has nothing to scale");
	} else {
		assert!(after > before, "boosted {after} should exceed unboosted {before}");
	}
	assert_eq!(claimable(&faucet, &[serial]).await, before);
}

#[tokio::test]
#[ignore]
async fn resetting_a_timestamp_moves_the_accrual_baseline() {
	let Some(reset) = function_name("FAUCET_RESET_FUNCTION") else {
		return;
	};
	let settings = settings();
	let faucet = operator_faucet(&settings).await;
	let serials = test_serials();
	let f = faucet.abi().function(&reset).expect("reset function not in ABI");
	let operator = settings.require_operator().unwrap().to_address();
	let args = sample_args(f, operator, &serials).expect("cannot build reset arguments");

	let before = claimable(&faucet, &serials).await;
	faucet.execute(&reset, &args, SETTER_GAS, 0).await.expect("reset failed");
	let after = claimable(&faucet, &serials).await;

	assert!(after <= before, "accrual grew from {before} to {after} after a reset");
	assert!(after.is_zero(), "a fresh baseline has accrued {after}");
}

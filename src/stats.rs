use std::collections::HashMap;
use std::path::{Path, PathBuf};

use alloy::primitives::U256;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::abi::DecodedEvent;
use crate::entity::account_label;

const SECS_PER_DAY: f64 = 86_400.0;

/// The parts of a claim event the report needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimRecord {
	pub account: String,
	pub amount: U256,
	pub timestamp: i64,
}

impl ClaimRecord {
	/// `None` unless the event has `toAddress`, `amount` and `timestamp`.
	pub fn from_event(event: &DecodedEvent) -> Option<Self> {
		let f = &event.fields;
		let to = f.get("toAddress")?.as_address()?;
		let (amount, _) = f.get("amount")?.as_uint()?;
		let timestamp = i64::try_from(f.get("timestamp")?.as_uint()?.0).ok()?;
		Some(Self {
			account: account_label(&to),
			amount,
			timestamp,
		})
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountClaims {
	pub account_id: String,
	pub claim_count: usize,
	pub claim_list: Vec<i64>,
	pub average_gap: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimStats {
	pub total_claims: u64,
	pub total_tokens_claimed: u128,
	pub multi_claim_users: usize,
	pub single_claim_users: usize,
	pub average_gap: Option<i64>,
	pub average_gap_days: Option<f64>,
	pub claims_array: Vec<AccountClaims>,
}

/// Accumulates claims in the order they are read (newest first) and keeps
/// accounts in first-seen order.
#[derive(Debug, Default)]
pub struct ClaimStatsBuilder {
	decimals: u32,
	total_claims: u64,
	total_tokens: u128,
	accounts: Vec<(String, Vec<i64>)>,
	index: HashMap<String, usize>,
}

impl ClaimStatsBuilder {
	pub fn new(decimals: u32) -> Self {
		Self {
			decimals,
			..Default::default()
		}
	}

	pub fn add(&mut self, record: ClaimRecord) {
		self.total_claims += 1;
		self.total_tokens = self
			.total_tokens
			.saturating_add(whole_tokens(record.amount, self.decimals));

		let slot = match self.index.get(&record.account) {
			Some(i) => *i,
			None => {
				self.accounts.push((record.account.clone(), Vec::new()));
				self.index.insert(record.account, self.accounts.len() - 1);
				self.accounts.len() - 1
			}
		};
		self.accounts[slot].1.push(record.timestamp);
	}

	pub fn finish(self) -> ClaimStats {
		let claims_array: Vec<AccountClaims> = self
			.accounts
			.into_iter()
			.map(|(account_id, claim_list)| AccountClaims {
				account_id,
				claim_count: claim_list.len(),
				average_gap: average_gap(&claim_list),
				claim_list,
			})
			.collect();

		let multi_claim_users = claims_array.iter().filter(|a| a.claim_count > 1).count();
		let single_claim_users = claims_array.len() - multi_claim_users;

		let average_gap = if claims_array.is_empty() {
			None
		} else {
			let sum: i64 = claims_array.iter().map(|a| a.average_gap.unwrap_or(0)).sum();
			Some(sum.div_euclid(claims_array.len() as i64))
		};

		ClaimStats {
			total_claims: self.total_claims,
			total_tokens_claimed: self.total_tokens,
			multi_claim_users,
			single_claim_users,
			average_gap,
			average_gap_days: average_gap.map(|g| g as f64 / SECS_PER_DAY),
			claims_array,
		}
	}
}

/// Mean spacing between consecutive claims, positive for a newest-first
/// list; `None` for a single claim.
fn average_gap(claims: &[i64]) -> Option<i64> {
	if claims.len() < 2 {
		return None;
	}
	let total: i64 = claims.windows(2).map(|w| w[1] - w[0]).sum();
	Some(-total.div_euclid(claims.len() as i64 - 1))
}

/// `floor(amount / 10^decimals)`, saturating at `u128::MAX`.
fn whole_tokens(amount: U256, decimals: u32) -> u128 {
	let scale = U256::from(10u64).checked_pow(U256::from(decimals));
	let whole = match scale {
		Some(s) => amount / s,
		None => U256::ZERO,
	};
	u128::try_from(whole).unwrap_or(u128::MAX)
}

pub fn report_file_name(now: DateTime<Utc>) -> String {
	format!("faucetClaimStats-{}.txt", now.format("%Y-%m-%dT%H-%M-%S"))
}

/// Write the pretty-printed report into `dir` and return its path.
pub fn write_report(dir: &Path, stats: &ClaimStats, now: DateTime<Utc>) -> Result<PathBuf> {
	let path = dir.join(report_file_name(now));
	let json = serde_json::to_string_pretty(stats)?;
	std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
	Ok(path)
}

//! Bookkeeping for the polling monitors.

use std::collections::{HashSet, VecDeque};

use alloy::rpc::types::Log;

use crate::abi::{format_value, DecodedEvent};
use crate::mirror::{ConsensusTimestamp, ContractLog};

/// Mirror poll period.
pub const MIRROR_POLL_SECS: u64 = 5;
/// Heartbeat period of the mirror monitor.
pub const HEARTBEAT_SECS: u64 = 30 * 60;
/// How far behind the tip the relay monitor starts.
pub const RELAY_LOOKBACK_BLOCKS: u64 = 900;
pub const RELAY_POLL_SECS: u64 = 2;
pub const RELAY_ERROR_BACKOFF_SECS: u64 = 30;
/// Events remembered for de-duplication.
pub const RECENT_KEYS: usize = 500;
/// Minimum block advance before the relay monitor prints the block again.
pub const BLOCK_REPORT_STEP: u64 = 500;

/// Tracks the newest consensus time already shown.
#[derive(Debug, Clone, Copy)]
pub struct HighWaterMark {
	last: ConsensusTimestamp,
}

impl HighWaterMark {
	pub fn new(last: ConsensusTimestamp) -> Self {
		Self { last }
	}

	pub fn last(&self) -> ConsensusTimestamp {
		self.last
	}

	/// From a newest-first page, the logs strictly newer than the mark, and
	/// whether the next page could still hold new logs.
	pub fn fresh<'a>(&self, logs: &'a [ContractLog]) -> (Vec<&'a ContractLog>, bool) {
		let fresh: Vec<&ContractLog> = logs.iter().filter(|l| l.timestamp > self.last).collect();
		let keep_paging = fresh.len() == logs.len();
		(fresh, keep_paging)
	}

	/// Move the mark to when the poll began, not to the newest log seen.
	pub fn advance(&mut self, poll_started: ConsensusTimestamp) {
		if poll_started > self.last {
			self.last = poll_started;
		}
	}
}

/// A bounded set that forgets its oldest keys first.
#[derive(Debug)]
pub struct RecentKeys {
	capacity: usize,
	order: VecDeque<String>,
	seen: HashSet<String>,
}

impl RecentKeys {
	pub fn new(capacity: usize) -> Self {
		Self {
			capacity,
			order: VecDeque::with_capacity(capacity),
			seen: HashSet::with_capacity(capacity),
		}
	}

	/// `true` the first time a key is seen.
	pub fn insert(&mut self, key: String) -> bool {
		if self.seen.contains(&key) {
			return false;
		}
		if self.order.len() == self.capacity {
			if let Some(old) = self.order.pop_front() {
				self.seen.remove(&old);
			}
		}
		self.seen.insert(key.clone());
		self.order.push_back(key);
		true
	}

	pub fn len(&self) -> usize {
		self.order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}
}

/// De-duplication key: the event's `hash` argument when it has one,
/// otherwise the transaction hash and log index.
pub fn event_key(event: &DecodedEvent, log: &Log) -> String {
	match event.fields.get("hash") {
		Some(value) => format_value(value),
		None => format!(
			"{}:{}",
			log.transaction_hash.map(|h| h.to_string()).unwrap_or_default(),
			log.log_index.map(|i| i.to_string()).unwrap_or_default()
		),
	}
}

/// Decides when the relay monitor reports the block height.
#[derive(Debug, Clone, Copy)]
pub struct BlockProgress {
	last_reported: u64,
}

impl BlockProgress {
	pub fn new(start: u64) -> Self {
		Self { last_reported: start }
	}

	pub fn should_report(&mut self, current: u64) -> bool {
		if current > self.last_reported + BLOCK_REPORT_STEP {
			self.last_reported = current;
			true
		} else {
			false
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::abi::{Decoded, DynSolValue};
	use alloy::primitives::B256;

	fn log_at(ts: &str) -> ContractLog {
		serde_json::from_value(serde_json::json!({ "timestamp": ts, "data": "0x" })).unwrap()
	}

	#[test]
	fn only_strictly_newer_logs_are_fresh() {
		let mark = HighWaterMark::new("100.5".parse().unwrap());
		let page = vec![log_at("101.0"), log_at("100.6"), log_at("100.5"), log_at("99.0")];
		let (fresh, more) = mark.fresh(&page);
		assert_eq!(fresh.len(), 2);
		assert!(!more);

		let all_new = vec![log_at("105.0"), log_at("104.0")];
		let (fresh, more) = mark.fresh(&all_new);
		assert_eq!(fresh.len(), 2);
		assert!(more);
	}

	#[test]
	fn mark_never_moves_backwards() {
		let mut mark = HighWaterMark::new("200.0".parse().unwrap());
		mark.advance("150.0".parse().unwrap());
		assert_eq!(mark.last().to_string(), "200.000000000");
		mark.advance("250.0".parse().unwrap());
		assert_eq!(mark.last().seconds, 250);
	}

	#[test]
	fn recent_keys_forget_oldest() {
		let mut keys = RecentKeys::new(2);
		assert!(keys.insert("a".into()));
		assert!(!keys.insert("a".into()));
		assert!(keys.insert("b".into()));
		assert!(keys.insert("c".into()));
		assert_eq!(keys.len(), 2);
		// "a" was evicted, so it is new again
		assert!(keys.insert("a".into()));
		assert!(!keys.insert("c".into()));
	}

	#[test]
	fn key_prefers_hash_field_then_tx_and_index() {
		let log = Log {
			transaction_hash: Some(B256::repeat_byte(0xbe)),
			log_index: Some(2),
			..Default::default()
		};
		let event = DecodedEvent {
			name: "FaucetMessage".into(),
			fields: Decoded::default(),
		};
		assert_eq!(event_key(&event, &log), format!("{}:2", B256::repeat_byte(0xbe)));

		let hashed = DecodedEvent {
			name: "Attested".into(),
			fields: Decoded::new(["hash"], vec![DynSolValue::FixedBytes(B256::repeat_byte(0xab), 32)]),
		};
		assert_eq!(event_key(&hashed, &log), format!("0x{}", "ab".repeat(32)));
	}

	#[test]
	fn block_progress_reports_in_steps() {
		let mut p = BlockProgress::new(1_000);
		assert!(!p.should_report(1_400));
		assert!(!p.should_report(1_500));
		assert!(p.should_report(1_501));
		assert!(!p.should_report(1_900));
		assert!(p.should_report(2_100));
	}
}

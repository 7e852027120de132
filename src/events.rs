//! Decoding and rendering of faucet event logs.

use alloy::primitives::{Address, U256};
use anyhow::Result;
use chrono::{Local, TimeZone};

use crate::abi::{format_ledger_value, Abi, DecodedEvent};
use crate::entity::account_label;
use crate::mirror::ContractLog;

/// Decode a mirror log, or `None` when it carries no data.
pub fn decode_mirror_log(abi: &Abi, log: &ContractLog) -> Result<Option<DecodedEvent>> {
	if !log.has_data() {
		return Ok(None);
	}
	let topics = log.topic_words()?;
	let data = log.data_bytes()?;
	Ok(Some(abi.decode_log(&topics, &data)?))
}

/// The fields every faucet claim event carries.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimEvent {
	pub msg_type: String,
	pub from: Address,
	pub to: Address,
	pub amount: U256,
	pub timestamp: U256,
}

impl ClaimEvent {
	/// `None` if the event is not shaped like a claim.
	pub fn from_decoded(event: &DecodedEvent) -> Option<Self> {
		let f = &event.fields;
		Some(Self {
			msg_type: f.get("msgType")?.as_str()?.to_owned(),
			from: f.get("fromAddress")?.as_address()?,
			to: f.get("toAddress")?.as_address()?,
			amount: f.get("amount")?.as_uint()?.0,
			timestamp: f.get("timestamp")?.as_uint()?.0,
		})
	}

	/// `msgType : from -> to : amount @ time`
	pub fn describe(&self, decimals: u32) -> String {
		format!(
			"{} : {} -> {} : {} @ {}",
			self.msg_type,
			account_label(&self.from),
			account_label(&self.to),
			format_units(self.amount, decimals),
			local_time(self.timestamp),
		)
	}
}

/// Render one decoded event: claims get the claim layout, anything else
/// has its fields joined with ` : `.
pub fn describe_event(event: &DecodedEvent, decimals: u32) -> String {
	match ClaimEvent::from_decoded(event) {
		Some(claim) => claim.describe(decimals),
		None => format_generic(event),
	}
}

pub fn format_generic(event: &DecodedEvent) -> String {
	event
		.fields
		.values()
		.iter()
		.map(format_ledger_value)
		.collect::<Vec<_>>()
		.join(" : ")
}

/// One monitor line for a mirror log.
pub fn mirror_line(log: &ContractLog, event: &DecodedEvent, decimals: u32) -> String {
	let block = log.block_number.map(|b| b.to_string()).unwrap_or_else(|| "?".into());
	format!(
		"Block: {block} : Tx Hash: {} : Event: {} : {}",
		log.transaction_hash.as_deref().unwrap_or("?"),
		event.name,
		describe_event(event, decimals)
	)
}

/// Scale an integer token amount by `decimals`, trimming trailing zeros.
pub fn format_units(amount: U256, decimals: u32) -> String {
	if decimals == 0 {
		return amount.to_string();
	}
	let digits = amount.to_string();
	let decimals = decimals as usize;
	let padded = if digits.len() <= decimals {
		format!("{}{digits}", "0".repeat(decimals + 1 - digits.len()))
	} else {
		digits
	};
	let (whole, frac) = padded.split_at(padded.len() - decimals);
	let frac = frac.trim_end_matches('0');
	if frac.is_empty() {
		whole.to_owned()
	} else {
		format!("{whole}.{frac}")
	}
}

/// Unix seconds in the local time zone; out-of-range values print raw.
pub fn local_time(secs: U256) -> String {
	i64::try_from(secs)
		.ok()
		.and_then(|s| Local.timestamp_opt(s, 0).single())
		.map(|dt| dt.format("%Y-%m-%d %H:%M:%S %Z").to_string())
		.unwrap_or_else(|| secs.to_string())
}

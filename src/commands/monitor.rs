use std::time::Duration;

use alloy::primitives::B256;
use alloy::rpc::types::Log;
use anyhow::Result;
use chrono::Local;

use crate::abi::Abi;
use crate::cli::{Cli, MonitorCommand};
use crate::commands::{load_artifact, load_settings, print_banner};
use crate::config::Settings;
use crate::entity::EntityId;
use crate::events::{decode_mirror_log, describe_event, mirror_line};
use crate::mirror::{ConsensusTimestamp, LogSource, MirrorClient};
use crate::monitor::{
	event_key, BlockProgress, HighWaterMark, RecentKeys, HEARTBEAT_SECS, MIRROR_POLL_SECS,
	RECENT_KEYS, RELAY_ERROR_BACKOFF_SECS, RELAY_LOOKBACK_BLOCKS, RELAY_POLL_SECS,
};
use crate::relay::{is_malformed_response, RelayClient};

pub async fn run(cli: &Cli, cmd: &MonitorCommand) -> Result<()> {
	let settings = load_settings(cli)?;
	let contract = settings.require_contract()?;
	settings.require_contract_name()?;
	print_banner(&settings);
	println!("\n-Using Event: {}", settings.event_name.as_deref().unwrap_or("(any)"));
	let artifact = load_artifact(&settings)?;

	match cmd {
		MonitorCommand::Mirror => watch_mirror(&settings, &contract, &artifact.abi).await,
		MonitorCommand::Relay => watch_relay(&settings, &contract, &artifact.abi).await,
	}
}

// -- Mirror node --

async fn watch_mirror(settings: &Settings, contract: &EntityId, abi: &Abi) -> Result<()> {
	let mirror = MirrorClient::new(&settings.mirror_url);
	let mut mark = HighWaterMark::new(ConsensusTimestamp::now());

	let mut poll = tokio::time::interval(Duration::from_secs(MIRROR_POLL_SECS));
	let mut heartbeat = tokio::time::interval(Duration::from_secs(HEARTBEAT_SECS));
	// both fire immediately; only the poll should
	heartbeat.tick().await;

	let ctrl_c = tokio::signal::ctrl_c();
	tokio::pin!(ctrl_c);

	println!("\n -Starting event monitor...\n");
	loop {
		tokio::select! {
			_ = &mut ctrl_c => {
				println!("Monitor stopped.");
				return Ok(());
			}
			_ = heartbeat.tick() => println!("..."),
			_ = poll.tick() => {
				let started = ConsensusTimestamp::now();
				let lines = poll_mirror(&mut mirror.logs(contract), abi, &mark, settings.decimals).await;
				for line in lines {
					println!("{line}");
				}
				mark.advance(started);
			}
		}
	}
}

/// Lines for every log newer than the mark, newest first. Paging stops at
/// the first page holding an already-seen log.
async fn poll_mirror<S: LogSource>(
	pages: &mut S,
	abi: &Abi,
	mark: &HighWaterMark,
	decimals: u32,
) -> Vec<String> {
	let mut lines = Vec::new();
	loop {
		let page = match pages.next_page().await {
			Ok(Some(page)) => page,
			Ok(None) => return lines,
			Err(e) => {
				log::error!(
					"{} Error fetching logs from mirror node: {e:#}",
					Local::now().to_rfc3339()
				);
				return lines;
			}
		};

		let (fresh, keep_paging) = mark.fresh(&page.logs);
		for entry in fresh {
			match decode_mirror_log(abi, entry) {
				Ok(Some(event)) => lines.push(mirror_line(entry, &event, decimals)),
				Ok(None) => {}
				Err(e) => log::warn!("skipping log at {}: {e}", entry.timestamp),
			}
		}
		if !keep_paging {
			pages.stop();
		}
	}
}

// -- JSON-RPC relay --

struct RelayWatch<'a> {
	relay: RelayClient,
	abi: &'a Abi,
	contract: EntityId,
	topic: B256,
	decimals: u32,
	from_block: u64,
	seen: RecentKeys,
	progress: BlockProgress,
}

async fn watch_relay(settings: &Settings, contract: &EntityId, abi: &Abi) -> Result<()> {
	let event_name = settings.require_event_name()?;
	let topic = abi.event(event_name)?.selector();
	let relay = RelayClient::connect(&settings.relay_url)?;

	println!("\n-Using Provider: {}", relay.url());
	let tip = relay.block_number().await?;
	println!("\n-Using Block Number: {tip}");

	let from_block = tip.saturating_sub(RELAY_LOOKBACK_BLOCKS);
	let mut watch = RelayWatch {
		relay,
		abi,
		contract: *contract,
		topic,
		decimals: settings.decimals,
		from_block,
		seen: RecentKeys::new(RECENT_KEYS),
		progress: BlockProgress::new(from_block),
	};

	let ctrl_c = tokio::signal::ctrl_c();
	tokio::pin!(ctrl_c);

	loop {
		let pause = match watch.poll().await {
			Ok(()) => RELAY_POLL_SECS,
			Err(e) => {
				if !is_malformed_response(&e) {
					log::error!("{e:#}");
				}
				RELAY_ERROR_BACKOFF_SECS
			}
		};
		if watch.progress.should_report(watch.from_block) {
			println!(
				"blockNumber: {} at {}",
				watch.from_block,
				Local::now().format("%Y-%m-%d %H:%M:%S")
			);
		}

		tokio::select! {
			_ = &mut ctrl_c => {
				println!("Monitor stopped.");
				return Ok(());
			}
			_ = tokio::time::sleep(Duration::from_secs(pause)) => {}
		}
	}
}

impl RelayWatch<'_> {
	/// Print unseen events from `from_block` to the tip, then move
	/// `from_block` to the tip.
	async fn poll(&mut self) -> Result<()> {
		let logs = self
			.relay
			.get_logs(self.contract.to_address(), self.from_block, self.topic)
			.await?;
		for line in relay_lines(self.abi, &logs, &mut self.seen, self.decimals) {
			println!("{line}");
		}
		self.from_block = self.relay.block_number().await?;
		Ok(())
	}
}

/// Lines for the logs not seen before; undecodable logs are skipped.
fn relay_lines(abi: &Abi, logs: &[Log], seen: &mut RecentKeys, decimals: u32) -> Vec<String> {
	let mut lines = Vec::new();
	for entry in logs {
		let event = match abi.decode_log(entry.topics(), &entry.data().data) {
			Ok(event) => event,
			Err(e) => {
				log::warn!("skipping undecodable log in block {:?}: {e}", entry.block_number);
				continue;
			}
		};
		if !seen.insert(event_key(&event, entry)) {
			continue;
		}
		let tx = entry
			.transaction_hash
			.map(|h| h.to_string())
			.unwrap_or_else(|| "?".into());
		lines.push(format!("{tx} : {}", describe_event(&event, decimals)));
	}
	lines
}

use std::path::Path;

use anyhow::Result;
use chrono::Utc;

use crate::abi::Abi;
use crate::cli::Cli;
use crate::commands::{load_artifact, load_settings, print_banner};
use crate::events::decode_mirror_log;
use crate::mirror::{LogSource, MirrorClient};
use crate::stats::{write_report, ClaimRecord, ClaimStats, ClaimStatsBuilder};

pub async fn run(cli: &Cli, out_dir: &Path) -> Result<()> {
	let settings = load_settings(cli)?;
	let contract = settings.require_contract()?;
	print_banner(&settings);
	let artifact = load_artifact(&settings)?;

	let mirror = MirrorClient::new(&settings.mirror_url);
	let stats = collect(
		&mut mirror.logs(&contract),
		&artifact.abi,
		settings.event_name.as_deref(),
		settings.decimals,
	)
	.await;

	println!("Total claims: {}", stats.total_claims);
	println!("Total tokens claimed: {}", stats.total_tokens_claimed);
	println!(
		"Users: {} multi-claim, {} single-claim",
		stats.multi_claim_users, stats.single_claim_users
	);
	if let Some(days) = stats.average_gap_days {
		println!("Average gap between claims: {days:.2} days");
	}

	match write_report(out_dir, &stats, Utc::now()) {
		Ok(path) => println!("Stats written to {}", path.display()),
		Err(e) => {
			log::error!("{e:#}");
			println!("{}", serde_json::to_string_pretty(&stats)?);
		}
	}
	Ok(())
}

/// Walk every log page; a failed page ends the walk and what was read so
/// far is still reported.
async fn collect<S: LogSource>(
	pages: &mut S,
	abi: &Abi,
	event_name: Option<&str>,
	decimals: u32,
) -> ClaimStats {
	let mut builder = ClaimStatsBuilder::new(decimals);

	loop {
		let page = match pages.next_page().await {
			Ok(Some(page)) => page,
			Ok(None) => break,
			Err(e) => {
				log::error!("Error fetching logs from mirror node: {e:#}");
				break;
			}
		};

		for entry in &page.logs {
			let event = match decode_mirror_log(abi, entry) {
				Ok(Some(event)) => event,
				Ok(None) => continue,
				Err(e) => {
					log::warn!("skipping log at {}: {e}", entry.timestamp);
					continue;
				}
			};
			if event_name.is_some_and(|name| name != event.name) {
				continue;
			}
			match ClaimRecord::from_event(&event) {
				Some(record) => builder.add(record),
				None => log::debug!("{} at {} is not a claim", event.name, entry.timestamp),
			}
		}
	}

	builder.finish()
}

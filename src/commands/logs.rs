use anyhow::Result;

use crate::cli::Cli;
use crate::commands::{load_artifact, load_settings, print_banner};
use crate::events::{decode_mirror_log, format_generic};
use crate::mirror::{LogSource, MirrorClient};

/// Print every decodable log, newest first.
pub async fn run(cli: &Cli) -> Result<()> {
	let settings = load_settings(cli)?;
	let contract = settings.require_contract()?;
	print_banner(&settings);
	let artifact = load_artifact(&settings)?;

	let mirror = MirrorClient::new(&settings.mirror_url);
	let mut pager = mirror.logs(&contract);
	let mut count = 0u64;

	while let Some(page) = pager.next_page().await? {
		for entry in &page.logs {
			let event = match decode_mirror_log(&artifact.abi, entry) {
				Ok(Some(event)) => event,
				Ok(None) => continue,
				Err(e) => {
					log::warn!("skipping log at {}: {e}", entry.timestamp);
					continue;
				}
			};
			count += 1;
			println!(
				"{} : {} : {} : {}",
				entry.timestamp,
				entry.transaction_hash.as_deref().unwrap_or("?"),
				event.name,
				format_generic(&event)
			);
		}
	}

	println!("\n{count} event(s) total.");
	Ok(())
}

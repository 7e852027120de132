pub mod local;

use alloy::signers::local::PrivateKeySigner;
use anyhow::{anyhow, Result};

use crate::config::Secret;

/// Build the operator's signer from the `PRIVATE_KEY` setting.
pub fn from_private_key(key: &Secret) -> Result<PrivateKeySigner> {
	let raw = local::parse_private_key(key.expose())?;
	PrivateKeySigner::from_slice(&raw).map_err(|e| anyhow!("invalid private key: {e}"))
}

use anyhow::{anyhow, bail, Result};

/// PKCS#8 wrapping of a secp256k1 key, as exported by the Hedera portal.
const ECDSA_PKCS8_PREFIX: &str = "3030020100300706052b8104000a04220420";
/// SEC1 `ECPrivateKey` header; the curve OID follows the key.
const ECDSA_SEC1_PREFIX: &str = "302e0201010420";
const ECDSA_SEC1_SUFFIX: &str = "a00706052b8104000a";
const ED25519_PKCS8_PREFIX: &str = "302e020100300506032b657004220420";

/// Raw secp256k1 key bytes from a hex key, bare or DER-wrapped, with or
/// without a `0x` prefix.
pub fn parse_private_key(key: &str) -> Result<[u8; 32]> {
	let hex_str = key.trim();
	let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str).to_lowercase();

	if hex_str.starts_with(ED25519_PKCS8_PREFIX) {
		bail!("PRIVATE_KEY is an ED25519 key; transactions are sent through the JSON-RPC relay, which needs an ECDSA (secp256k1) key");
	}

	let body = if let Some(rest) = hex_str.strip_prefix(ECDSA_PKCS8_PREFIX) {
		rest
	} else if let Some(rest) = hex_str.strip_prefix(ECDSA_SEC1_PREFIX) {
		rest.strip_suffix(ECDSA_SEC1_SUFFIX).unwrap_or(rest)
	} else {
		hex_str.as_str()
	};

	let bytes = hex::decode(body).map_err(|_| anyhow!("PRIVATE_KEY is not valid hex"))?;
	bytes
		.try_into()
		.map_err(|b: Vec<u8>| anyhow!("PRIVATE_KEY must hold 32 key bytes, found {}", b.len()))
}

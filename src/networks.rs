use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The Hedera networks a faucet can be deployed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Network {
	Test,
	Main,
}

impl Network {
	/// Parse the `ENVIRONMENT` selector (`TEST` or `MAIN`, any case).
	pub fn from_selector(s: &str) -> Option<Self> {
		match s.trim().to_uppercase().as_str() {
			"TEST" => Some(Self::Test),
			"MAIN" => Some(Self::Main),
			_ => None,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Test => "test",
			Self::Main => "main",
		}
	}

	/// Banner printed before interacting, e.g. `*TESTNET*`.
	pub fn banner(&self) -> &'static str {
		match self {
			Self::Test => "*TESTNET*",
			Self::Main => "*MAINNET*",
		}
	}

	pub fn endpoints(&self) -> &'static Endpoints {
		match self {
			Self::Test => &NETWORKS.testnet,
			Self::Main => &NETWORKS.mainnet,
		}
	}
}

impl fmt::Display for Network {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Public service endpoints for one network.
pub struct Endpoints {
	/// Mirror-node REST base URL (no trailing slash).
	pub mirror_url: &'static str,
	/// JSON-RPC relay URL.
	pub relay_url: &'static str,
	/// EIP-155 chain id served by the relay.
	pub chain_id: u64,
}

pub struct Networks {
	testnet: Endpoints,
	mainnet: Endpoints,
}

/// Default endpoints; see `config` for overrides.
pub static NETWORKS: Networks = Networks {
	testnet: Endpoints {
		mirror_url: "https://testnet.mirrornode.hedera.com",
		relay_url: "https://testnet.hashio.io/api",
		chain_id: 296,
	},
	mainnet: Endpoints {
		mirror_url: "https://mainnet-public.mirrornode.hedera.com",
		relay_url: "https://mainnet.hashio.io/api",
		chain_id: 295,
	},
};

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn selector_is_case_insensitive() {
		assert_eq!(Network::from_selector("test"), Some(Network::Test));
		assert_eq!(Network::from_selector("MAIN"), Some(Network::Main));
		assert_eq!(Network::from_selector(" Main "), Some(Network::Main));
		assert_eq!(Network::from_selector("previewnet"), None);
		assert_eq!(Network::from_selector(""), None);
	}

	#[test]
	fn endpoints_are_distinct_per_network() {
		let t = Network::Test.endpoints();
		let m = Network::Main.endpoints();
		assert_ne!(t.mirror_url, m.mirror_url);
		assert_ne!(t.chain_id, m.chain_id);
		for url in [t.mirror_url, m.mirror_url, t.relay_url, m.relay_url] {
			assert!(url.starts_with("https://"));
			assert!(!url.ends_with('/'));
		}
	}
}

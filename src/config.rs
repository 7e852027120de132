use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::EntityId;
use crate::networks::Network;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("Environment required, please specify {0} in the .env file")]
	Missing(&'static str),

	#[error("Must specify either MAIN or TEST as ENVIRONMENT, got {0:?}")]
	InvalidNetwork(String),

	#[error("{var} has an invalid value {value:?}")]
	InvalidValue { var: &'static str, value: String },

	#[error("endpoint URL must start with http:// or https://: {0}")]
	InvalidUrl(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),
}

// -- Endpoint override file --

/// Optional `faucet.toml` overriding the built-in endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointFile {
	#[serde(default)]
	pub test: EndpointOverride,
	#[serde(default)]
	pub main: EndpointOverride,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointOverride {
	pub mirror_url: Option<String>,
	pub relay_url: Option<String>,
}

impl EndpointFile {
	pub const FILE_NAME: &'static str = "faucet.toml";

	/// Per-user directory (`<config dir>/hedera-faucet/`).
	pub fn user_dir() -> Option<PathBuf> {
		dirs::config_dir().map(|d| d.join("hedera-faucet"))
	}

	/// Load the first override file found (working directory, then the
	/// per-user directory), falling back to no overrides.
	pub fn load() -> Result<Self, ConfigError> {
		let mut candidates = vec![PathBuf::from(Self::FILE_NAME)];
		if let Some(dir) = Self::user_dir() {
			candidates.push(dir.join(Self::FILE_NAME));
		}
		for path in candidates {
			if path.exists() {
				return Self::load_from(&path);
			}
		}
		Ok(Self::default())
	}

	pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path)?;
		Ok(toml::from_str(&content)?)
	}

	fn for_network(&self, network: Network) -> &EndpointOverride {
		match network {
			Network::Test => &self.test,
			Network::Main => &self.main,
		}
	}
}

// -- Environment settings --

/// A string that never shows up in `Debug` output.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
	pub fn new(value: String) -> Self {
		Self(value)
	}

	pub fn expose(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for Secret {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Secret(..)")
	}
}

/// Constructor parameters for a new faucet deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct DeployParams {
	pub sct_contract: Option<EntityId>,
	pub token_id: Option<EntityId>,
	pub claim_token: Option<EntityId>,
	pub daily_amt: u64,
	pub boost_percentage: u64,
	pub min_time: u64,
	pub max_time_units: u8,
}

impl DeployParams {
	/// The three entities a deployment cannot go without: the gating NFT
	/// collection, the faucet token and the claim token.
	pub fn require_targets(&self) -> Result<(EntityId, EntityId, EntityId), ConfigError> {
		Ok((
			self.sct_contract.ok_or(ConfigError::Missing("SCT_CONTRACT"))?,
			self.token_id.ok_or(ConfigError::Missing("TOKEN_ID"))?,
			self.claim_token.ok_or(ConfigError::Missing("CLAIM_TOKEN"))?,
		))
	}
}

/// Everything the commands read from the environment, resolved once.
#[derive(Debug, Clone)]
pub struct Settings {
	pub network: Network,
	pub operator_id: Option<EntityId>,
	pub private_key: Option<Secret>,
	pub contract_id: Option<EntityId>,
	pub contract_name: Option<String>,
	pub event_name: Option<String>,
	pub decimals: u32,
	pub artifacts_dir: PathBuf,
	pub mirror_url: String,
	pub relay_url: String,
	pub chain_id: u64,
	pub deploy: DeployParams,
}

impl Settings {
	/// Load `.env` (if present) and read the process environment.
	pub fn from_env(network_override: Option<Network>) -> Result<Self, ConfigError> {
		// a missing .env file is fine
		let _ = dotenvy::dotenv();
		let file = EndpointFile::load()?;
		Self::from_lookup(|key| std::env::var(key).ok(), network_override, &file)
	}

	/// Resolve settings from an arbitrary key lookup.
	pub fn from_lookup<F>(
		lookup: F,
		network_override: Option<Network>,
		file: &EndpointFile,
	) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

		let network = match network_override {
			Some(n) => n,
			None => {
				let selector = get("ENVIRONMENT").ok_or(ConfigError::Missing("ENVIRONMENT"))?;
				Network::from_selector(&selector).ok_or(ConfigError::InvalidNetwork(selector))?
			}
		};

		let defaults = network.endpoints();
		let overrides = file.for_network(network);
		let mirror_url = get("MIRROR_URL")
			.or_else(|| overrides.mirror_url.clone())
			.unwrap_or_else(|| defaults.mirror_url.to_owned());
		let relay_url = get("RELAY_URL")
			.or_else(|| overrides.relay_url.clone())
			.unwrap_or_else(|| defaults.relay_url.to_owned());
		validate_url(&mirror_url)?;
		validate_url(&relay_url)?;

		let deploy = DeployParams {
			sct_contract: parse_opt(&get, "SCT_CONTRACT")?,
			token_id: parse_opt(&get, "TOKEN_ID")?,
			claim_token: parse_opt(&get, "CLAIM_TOKEN")?,
			daily_amt: parse_opt(&get, "DAILY_AMT")?.unwrap_or(5),
			boost_percentage: parse_opt(&get, "BOOST_PERCENTAGE")?.unwrap_or(100),
			min_time: parse_opt(&get, "MIN_TIME")?.unwrap_or(43_200),
			max_time_units: parse_opt(&get, "MAX_TIME_UNITS")?.unwrap_or(12),
		};

		Ok(Self {
			network,
			operator_id: parse_opt(&get, "ACCOUNT_ID")?,
			private_key: get("PRIVATE_KEY").map(Secret::new),
			contract_id: parse_opt(&get, "CONTRACT_ID")?,
			contract_name: get("CONTRACT_NAME"),
			event_name: get("EVENT_NAME"),
			decimals: parse_opt(&get, "DECIMALS")?.unwrap_or(0),
			artifacts_dir: get("ARTIFACTS_DIR")
				.map(PathBuf::from)
				.unwrap_or_else(|| PathBuf::from("./artifacts")),
			mirror_url: mirror_url.trim_end_matches('/').to_owned(),
			relay_url,
			chain_id: defaults.chain_id,
			deploy,
		})
	}

	pub fn require_operator(&self) -> Result<EntityId, ConfigError> {
		self.operator_id.ok_or(ConfigError::Missing("ACCOUNT_ID"))
	}

	pub fn require_private_key(&self) -> Result<&Secret, ConfigError> {
		self.private_key.as_ref().ok_or(ConfigError::Missing("PRIVATE_KEY"))
	}

	pub fn require_contract(&self) -> Result<EntityId, ConfigError> {
		self.contract_id.ok_or(ConfigError::Missing("CONTRACT_ID"))
	}

	pub fn require_contract_name(&self) -> Result<&str, ConfigError> {
		self.contract_name.as_deref().ok_or(ConfigError::Missing("CONTRACT_NAME"))
	}

	pub fn require_event_name(&self) -> Result<&str, ConfigError> {
		self.event_name.as_deref().ok_or(ConfigError::Missing("EVENT_NAME"))
	}
}

fn parse_opt<T, G>(get: &G, var: &'static str) -> Result<Option<T>, ConfigError>
where
	T: FromStr,
	G: Fn(&str) -> Option<String>,
{
	match get(var) {
		Some(value) => value
			.parse()
			.map(Some)
			.map_err(|_| ConfigError::InvalidValue { var, value }),
		None => Ok(None),
	}
}

fn validate_url(url: &str) -> Result<(), ConfigError> {
	if url.starts_with("http://") || url.starts_with("https://") {
		Ok(())
	} else {
		Err(ConfigError::InvalidUrl(url.to_owned()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
		let map: HashMap<String, String> =
			vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
		Settings::from_lookup(|k| map.get(k).cloned(), None, &EndpointFile::default())
	}

	#[test]
	fn defaults_are_sensible() {
		let s = settings(&[("ENVIRONMENT", "test")]).unwrap();
		assert_eq!(s.network, Network::Test);
		assert_eq!(s.mirror_url, "https://testnet.mirrornode.hedera.com");
		assert_eq!(s.chain_id, 296);
		assert_eq!(s.decimals, 0);
		assert_eq!(s.deploy.daily_amt, 5);
		assert_eq!(s.deploy.boost_percentage, 100);
		assert_eq!(s.deploy.min_time, 43_200);
		assert_eq!(s.deploy.max_time_units, 12);
		assert_eq!(s.artifacts_dir, PathBuf::from("./artifacts"));
		assert!(s.contract_name.is_none());
	}

	#[test]
	fn network_selector_is_required_and_validated() {
		assert!(matches!(settings(&[]), Err(ConfigError::Missing("ENVIRONMENT"))));
		assert!(matches!(
			settings(&[("ENVIRONMENT", "previewnet")]),
			Err(ConfigError::InvalidNetwork(_))
		));
	}

	#[test]
	fn cli_override_beats_environment() {
		let file = EndpointFile::default();
		let s = Settings::from_lookup(|_| None, Some(Network::Main), &file).unwrap();
		assert_eq!(s.network, Network::Main);
		assert_eq!(s.chain_id, 295);
	}

	#[test]
	fn parses_ids_and_numbers() {
		let s = settings(&[
			("ENVIRONMENT", "MAIN"),
			("ACCOUNT_ID", "0.0.1001"),
			("CONTRACT_ID", "0.0.2002"),
			("DECIMALS", "1"),
			("MAX_TIME_UNITS", "3"),
		])
		.unwrap();
		assert_eq!(s.require_operator().unwrap(), EntityId::new(0, 0, 1001));
		assert_eq!(s.require_contract().unwrap(), EntityId::new(0, 0, 2002));
		assert_eq!(s.decimals, 1);
		assert_eq!(s.deploy.max_time_units, 3);
	}

	#[test]
	fn bad_values_are_reported_by_variable() {
		let err = settings(&[("ENVIRONMENT", "test"), ("MAX_TIME_UNITS", "300")]).unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { var: "MAX_TIME_UNITS", .. }));

		let err = settings(&[("ENVIRONMENT", "test"), ("CONTRACT_ID", "abc")]).unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { var: "CONTRACT_ID", .. }));
	}

	#[test]
	fn missing_variables_name_themselves() {
		let s = settings(&[("ENVIRONMENT", "test")]).unwrap();
		assert!(matches!(s.require_contract_name(), Err(ConfigError::Missing("CONTRACT_NAME"))));
		assert!(matches!(s.require_private_key(), Err(ConfigError::Missing("PRIVATE_KEY"))));
	}

	#[test]
	fn endpoint_overrides_apply_in_order() {
		let file = EndpointFile {
			test: EndpointOverride {
				mirror_url: Some("http://localhost:5551/".into()),
				relay_url: None,
			},
			main: EndpointOverride::default(),
		};
		let s = Settings::from_lookup(
			|k| (k == "ENVIRONMENT").then(|| "test".to_owned()),
			None,
			&file,
		)
		.unwrap();
		assert_eq!(s.mirror_url, "http://localhost:5551");
		assert_eq!(s.relay_url, "https://testnet.hashio.io/api");

		let s = Settings::from_lookup(
			|k| match k {
				"ENVIRONMENT" => Some("test".into()),
				"MIRROR_URL" => Some("ftp://nope".into()),
				_ => None,
			},
			None,
			&file,
		);
		assert!(matches!(s, Err(ConfigError::InvalidUrl(_))));
	}

	#[test]
	fn private_key_is_redacted() {
		let s = settings(&[("ENVIRONMENT", "test"), ("PRIVATE_KEY", "0xdeadbeef")]).unwrap();
		assert_eq!(s.require_private_key().unwrap().expose(), "0xdeadbeef");
		assert!(!format!("{s:?}").contains("deadbeef"));
	}

	#[test]
	fn toml_roundtrip() {
		let mut file = EndpointFile::default();
		file.main.relay_url = Some("https://relay.example".into());

		let serialized = toml::to_string_pretty(&file).unwrap();
		let parsed: EndpointFile = toml::from_str(&serialized).unwrap();
		assert_eq!(parsed, file);
	}

	#[test]
	fn loads_override_file_from_path() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join(EndpointFile::FILE_NAME);
		std::fs::write(&path, "[test]\nmirror_url = \"http://127.0.0.1:5551\"\n").unwrap();

		let file = EndpointFile::load_from(&path).unwrap();
		assert_eq!(file.test.mirror_url.as_deref(), Some("http://127.0.0.1:5551"));
		assert!(file.main.mirror_url.is_none());
	}
}

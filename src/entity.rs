use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A Hedera `shard.realm.num` identifier (account, contract or token).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
	pub shard: u32,
	pub realm: u64,
	pub num: u64,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid entity id {0:?}, expected shard.realm.num")]
pub struct InvalidEntityId(pub String);

impl EntityId {
	pub const fn new(shard: u32, realm: u64, num: u64) -> Self {
		Self { shard, realm, num }
	}

	/// The "long-zero" EVM address: 4-byte shard, 8-byte realm and 8-byte
	/// num, all big-endian.
	pub fn to_address(&self) -> Address {
		let mut bytes = [0u8; 20];
		bytes[..4].copy_from_slice(&self.shard.to_be_bytes());
		bytes[4..12].copy_from_slice(&self.realm.to_be_bytes());
		bytes[12..].copy_from_slice(&self.num.to_be_bytes());
		Address::from(bytes)
	}

	/// Solidity address as 40 lowercase hex characters, no prefix.
	pub fn to_solidity_address(&self) -> String {
		hex::encode(self.to_address())
	}

	/// Inverse of [`EntityId::to_address`]; any 20 bytes decode, so only
	/// use this when the address is known to be long-zero.
	pub fn from_address(address: &Address) -> Self {
		let b = address.as_slice();
		let mut shard = [0u8; 4];
		let mut realm = [0u8; 8];
		let mut num = [0u8; 8];
		shard.copy_from_slice(&b[..4]);
		realm.copy_from_slice(&b[4..12]);
		num.copy_from_slice(&b[12..]);
		Self {
			shard: u32::from_be_bytes(shard),
			realm: u64::from_be_bytes(realm),
			num: u64::from_be_bytes(num),
		}
	}
}

/// Whether the address encodes a `0.0.N` entity rather than an EVM alias.
pub fn is_long_zero(address: &Address) -> bool {
	address.as_slice()[..12].iter().all(|b| *b == 0)
}

/// Human label for an address seen in a log: `0.0.N` for long-zero
/// addresses, `0.0.<evm hex>` for EVM aliases.
pub fn account_label(address: &Address) -> String {
	if is_long_zero(address) {
		EntityId::from_address(address).to_string()
	} else {
		format!("0.0.{}", hex::encode(address))
	}
}

impl fmt::Display for EntityId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
	}
}

impl FromStr for EntityId {
	type Err = InvalidEntityId;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let err = || InvalidEntityId(s.to_owned());
		let mut parts = s.trim().split('.');
		let shard = parts.next().and_then(|p| p.parse().ok()).ok_or_else(err)?;
		let realm = parts.next().and_then(|p| p.parse().ok()).ok_or_else(err)?;
		let num = parts.next().and_then(|p| p.parse().ok()).ok_or_else(err)?;
		if parts.next().is_some() {
			return Err(err());
		}
		Ok(Self { shard, realm, num })
	}
}

impl Serialize for EntityId {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for EntityId {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}

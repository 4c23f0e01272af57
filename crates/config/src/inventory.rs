//! Inventory targets and token routes.
//!
//! Percentages are fixed-point fractions of [`ONE`] (10^18). In TOML they
//! are written as decimal strings ("0.25" for 25%), parsed with the same
//! machinery as ether amounts.

use alloy_primitives::{
    utils::{format_ether, parse_ether},
    Address, U256,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed-point scalar: a fraction of 1.0 is stored as `fraction * ONE`.
pub const ONE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Allocation settings for one token on one chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenChainConfig {
    /// Desired steady-state allocation fraction
    #[serde(with = "ether_str")]
    pub target_pct: U256,
    /// Under-allocation trigger; must not exceed `target_pct`
    #[serde(with = "ether_str")]
    pub threshold_pct: U256,
    /// Unwrap when the chain's native balance falls below this (wrapped-native only)
    #[serde(default, with = "ether_opt")]
    pub unwrap_threshold: Option<U256>,
    /// Native balance to restore by unwrapping (wrapped-native only)
    #[serde(default, with = "ether_opt")]
    pub unwrap_target: Option<U256>,
}

/// One managed L1 token: metadata, per-chain mirror addresses, and
/// per-chain allocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Token symbol, e.g. "WETH"
    pub symbol: String,
    /// Token decimals (shared across chains; this core does not convert)
    pub decimals: u8,
    /// Canonical hub-chain address
    pub l1: Address,
    /// Mirror addresses keyed by L2 chain id
    #[serde(default, with = "chain_map")]
    pub l2: BTreeMap<u64, Address>,
    /// Allocation settings keyed by L2 chain id.
    /// A chain absent here is unmanaged for this token.
    #[serde(default, with = "chain_map")]
    pub chains: BTreeMap<u64, TokenChainConfig>,
}

impl TokenConfig {
    /// Check config consistency: thresholds below targets, and a mirror
    /// address for every managed chain.
    pub fn validate(&self) -> eyre::Result<()> {
        for (chain_id, cfg) in &self.chains {
            if cfg.threshold_pct > cfg.target_pct {
                eyre::bail!(
                    "{} on chain {}: threshold {} exceeds target {}",
                    self.symbol,
                    chain_id,
                    format_ether(cfg.threshold_pct),
                    format_ether(cfg.target_pct),
                );
            }
            if !self.l2.contains_key(chain_id) {
                eyre::bail!(
                    "{} managed on chain {} but has no mirror address there",
                    self.symbol,
                    chain_id,
                );
            }
        }

        Ok(())
    }
}

/// Serde adapter: maps keyed by chain id. TOML keys are always strings, so
/// chain ids round-trip through their decimal representation.
mod chain_map {
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer, T: Serialize>(
        v: &BTreeMap<u64, T>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        s.collect_map(v.iter().map(|(k, val)| (k.to_string(), val)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, T: Deserialize<'de>>(
        d: D,
    ) -> Result<BTreeMap<u64, T>, D::Error> {
        let raw: BTreeMap<String, T> = BTreeMap::deserialize(d)?;
        raw.into_iter()
            .map(|(k, v)| k.parse::<u64>().map(|k| (k, v)).map_err(Error::custom))
            .collect()
    }
}

/// Serde adapter: U256 as a decimal ether-style string.
mod ether_str {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &U256, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_ether(*v))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(d)?;
        parse_ether(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter: Option<U256> as a decimal ether-style string.
mod ether_opt {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &Option<U256>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(v) => s.serialize_some(&format_ether(*v)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<U256>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|s| parse_ether(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_one_is_ten_pow_18() {
        assert_eq!(ONE, U256::from(10).pow(U256::from(18)));
    }

    #[test]
    fn test_parse_token_config() {
        let raw = r#"
            symbol = "WETH"
            decimals = 18
            l1 = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"

            [l2]
            10 = "0x4200000000000000000000000000000000000006"

            [chains.10]
            target_pct = "0.25"
            threshold_pct = "0.1"
            unwrap_threshold = "1.5"
            unwrap_target = "3"
        "#;

        let token: TokenConfig = toml::from_str(raw).unwrap();
        assert_eq!(token.symbol, "WETH");
        assert_eq!(
            token.l2[&10],
            address!("4200000000000000000000000000000000000006")
        );

        let cfg = &token.chains[&10];
        assert_eq!(cfg.target_pct, parse_ether("0.25").unwrap());
        assert_eq!(cfg.threshold_pct, parse_ether("0.1").unwrap());
        assert_eq!(cfg.unwrap_threshold, Some(parse_ether("1.5").unwrap()));
        assert_eq!(cfg.unwrap_target, Some(parse_ether("3").unwrap()));
        token.validate().unwrap();
    }

    #[test]
    fn test_threshold_above_target_rejected() {
        let raw = r#"
            symbol = "USDC"
            decimals = 6
            l1 = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"

            [l2]
            10 = "0x7F5c764cBc14f9669B88837ca1490cCa17c31607"

            [chains.10]
            target_pct = "0.1"
            threshold_pct = "0.2"
        "#;

        let token: TokenConfig = toml::from_str(raw).unwrap();
        assert!(token.validate().is_err());
    }

    #[test]
    fn test_managed_chain_requires_mirror_address() {
        let raw = r#"
            symbol = "USDC"
            decimals = 6
            l1 = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"

            [chains.10]
            target_pct = "0.2"
            threshold_pct = "0.1"
        "#;

        let token: TokenConfig = toml::from_str(raw).unwrap();
        assert!(token.validate().is_err());
    }
}

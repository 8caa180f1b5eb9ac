//! # Core Domain Entities
//!
//! Defines the entities shared by every subsystem of the game client.
//!
//! ## Clusters
//!
//! - **Identity**: `TierId`, `StageKind`, `BatchId`
//! - **Ledger Calls**: `Action`, `Entrypoint`, `ContractAddress`
//! - **Ledger Receipts**: `TxHash`

use crate::errors::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export U256 from primitive-types for use across all subsystems
pub use primitive_types::U256;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Zero-based chain tier index. Tier 0 is displayed as `L1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct TierId(pub u32);

impl TierId {
    /// The base layer every game starts with.
    pub const BASE: TierId = TierId(0);

    /// Calldata word carrying this tier id.
    #[must_use]
    pub fn as_word(self) -> U256 {
        U256::from(self.0)
    }

    /// Recover a tier id from a calldata word, if it fits.
    #[must_use]
    pub fn from_word(word: &U256) -> Option<Self> {
        if *word > U256::from(u32::MAX) {
            return None;
        }
        Some(TierId(word.low_u32()))
    }
}

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", u64::from(self.0) + 1)
    }
}

impl FromStr for TierId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('L')
            .or_else(|| s.strip_prefix('l'))
            .ok_or_else(|| ParseError::MalformedTier(s.to_string()))?;
        match digits.parse::<u32>() {
            Ok(n) if n >= 1 => Ok(TierId(n - 1)),
            _ => Err(ParseError::MalformedTier(s.to_string())),
        }
    }
}

/// One step of the production pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Packing transactions into a block.
    Mining,
    /// Confirmation clicks that seal a full block.
    Sequencing,
    /// Aggregating sequenced blocks for data availability.
    DataAvailability,
    /// Aggregating sequenced blocks into a proof.
    Proving,
}

impl StageKind {
    /// All stage kinds in pipeline order.
    pub const ALL: [StageKind; 4] = [
        StageKind::Mining,
        StageKind::Sequencing,
        StageKind::DataAvailability,
        StageKind::Proving,
    ];
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageKind::Mining => "mining",
            StageKind::Sequencing => "sequencing",
            StageKind::DataAvailability => "data-availability",
            StageKind::Proving => "proving",
        };
        f.write_str(name)
    }
}

/// Queue-assigned batch identifier, strictly increasing in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct BatchId(pub u64);

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch-{}", self.0)
    }
}

// =============================================================================
// CLUSTER B: LEDGER CALLS
// =============================================================================

/// Address of the contract an action is sent to.
///
/// Opaque to this crate; an empty address marks a missing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ContractAddress(String);

impl ContractAddress {
    /// Wrap an address string.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into().trim().to_string())
    }

    /// True when no address was configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the raw address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ledger operation invoked by an [`Action`].
///
/// Pipeline entrypoints come in pairs: the per-item form and the `*_bundled`
/// form produced by the bundling optimizer. Purchases never bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entrypoint {
    /// `[tier, fee]`
    AddTransaction,
    /// `[tier, count, fee_1, .., fee_n]`
    AddTransactionBundled,
    /// `[tier]`
    MineBlock,
    /// `[tier, count]`
    MineBlockBundled,
    /// `[tier]`
    StoreDa,
    /// `[tier, count]`
    StoreDaBundled,
    /// `[tier]`
    ProveBatch,
    /// `[tier, count]`
    ProveBatchBundled,
    /// `[tier, upgrade]`
    BuyUpgrade,
    /// `[tier, automation]`
    BuyAutomation,
    /// `[tier, feature]`
    UnlockFeature,
}

impl Entrypoint {
    /// The bundled counterpart, if this entrypoint can be bundled.
    #[must_use]
    pub fn bundled(self) -> Option<Entrypoint> {
        match self {
            Entrypoint::AddTransaction => Some(Entrypoint::AddTransactionBundled),
            Entrypoint::MineBlock => Some(Entrypoint::MineBlockBundled),
            Entrypoint::StoreDa => Some(Entrypoint::StoreDaBundled),
            Entrypoint::ProveBatch => Some(Entrypoint::ProveBatchBundled),
            _ => None,
        }
    }

    /// True for the `*_bundled` forms.
    #[must_use]
    pub fn is_bundled(self) -> bool {
        matches!(
            self,
            Entrypoint::AddTransactionBundled
                | Entrypoint::MineBlockBundled
                | Entrypoint::StoreDaBundled
                | Entrypoint::ProveBatchBundled
        )
    }

    /// Wire name of the entrypoint.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Entrypoint::AddTransaction => "add_transaction",
            Entrypoint::AddTransactionBundled => "add_transaction_bundled",
            Entrypoint::MineBlock => "mine_block",
            Entrypoint::MineBlockBundled => "mine_block_bundled",
            Entrypoint::StoreDa => "store_da",
            Entrypoint::StoreDaBundled => "store_da_bundled",
            Entrypoint::ProveBatch => "prove_batch",
            Entrypoint::ProveBatchBundled => "prove_batch_bundled",
            Entrypoint::BuyUpgrade => "buy_upgrade",
            Entrypoint::BuyAutomation => "buy_automation",
            Entrypoint::UnlockFeature => "unlock_feature",
        }
    }
}

impl fmt::Display for Entrypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Entrypoint {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let entrypoint = match s {
            "add_transaction" => Entrypoint::AddTransaction,
            "add_transaction_bundled" => Entrypoint::AddTransactionBundled,
            "mine_block" => Entrypoint::MineBlock,
            "mine_block_bundled" => Entrypoint::MineBlockBundled,
            "store_da" => Entrypoint::StoreDa,
            "store_da_bundled" => Entrypoint::StoreDaBundled,
            "prove_batch" => Entrypoint::ProveBatch,
            "prove_batch_bundled" => Entrypoint::ProveBatchBundled,
            "buy_upgrade" => Entrypoint::BuyUpgrade,
            "buy_automation" => Entrypoint::BuyAutomation,
            "unlock_feature" => Entrypoint::UnlockFeature,
            other => return Err(ParseError::UnknownEntrypoint(other.to_string())),
        };
        Ok(entrypoint)
    }
}

/// A single ledger call awaiting submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Contract receiving the call.
    pub target: ContractAddress,
    /// Operation invoked on the contract.
    pub entrypoint: Entrypoint,
    /// Call arguments; pipeline actions lead with the tier id.
    pub calldata: Vec<U256>,
}

impl Action {
    /// Build an action from raw parts.
    pub fn new(target: ContractAddress, entrypoint: Entrypoint, calldata: Vec<U256>) -> Self {
        Self {
            target,
            entrypoint,
            calldata,
        }
    }

    /// Build an action whose calldata starts with `tier`, followed by `args`.
    pub fn for_tier(
        target: ContractAddress,
        entrypoint: Entrypoint,
        tier: TierId,
        args: Vec<U256>,
    ) -> Self {
        let mut calldata = Vec::with_capacity(args.len() + 1);
        calldata.push(tier.as_word());
        calldata.extend(args);
        Self::new(target, entrypoint, calldata)
    }

    /// Tier addressed by this action (first calldata word), if any.
    #[must_use]
    pub fn tier(&self) -> Option<TierId> {
        self.calldata.first().and_then(TierId::from_word)
    }
}

// =============================================================================
// CLUSTER C: LEDGER RECEIPTS
// =============================================================================

/// Maximum hex digits in a transaction hash (a 256-bit field element).
pub const MAX_TX_HASH_DIGITS: usize = 64;

/// A well-formed ledger transaction hash: `0x` followed by 1..=64 hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxHash(String);

impl TxHash {
    /// Parse and normalize (lowercase) a transaction hash.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| ParseError::MalformedTxHash(raw.to_string()))?;

        let well_formed = !digits.is_empty()
            && digits.len() <= MAX_TX_HASH_DIGITS
            && digits.chars().all(|c| c.is_ascii_hexdigit());
        if !well_formed {
            return Err(ParseError::MalformedTxHash(raw.to_string()));
        }

        Ok(Self(format!("0x{}", digits.to_ascii_lowercase())))
    }

    /// Borrow the normalized hash.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TxHash {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TxHash::parse(&value)
    }
}

impl From<TxHash> for String {
    fn from(value: TxHash) -> Self {
        value.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_display_and_parse() {
        assert_eq!(TierId(0).to_string(), "L1");
        assert_eq!(TierId(1).to_string(), "L2");
        assert_eq!("L2".parse::<TierId>().unwrap(), TierId(1));
        assert!("L0".parse::<TierId>().is_err());
        assert!("X1".parse::<TierId>().is_err());
    }

    #[test]
    fn test_tier_word_roundtrip_rejects_overflow() {
        assert_eq!(TierId::from_word(&U256::from(7)), Some(TierId(7)));
        assert_eq!(TierId::from_word(&(U256::from(u32::MAX) + 1)), None);
    }

    #[test]
    fn test_entrypoint_bundling_pairs() {
        assert_eq!(
            Entrypoint::AddTransaction.bundled(),
            Some(Entrypoint::AddTransactionBundled)
        );
        assert_eq!(Entrypoint::AddTransactionBundled.bundled(), None);
        assert_eq!(Entrypoint::BuyUpgrade.bundled(), None);
        assert!(Entrypoint::MineBlockBundled.is_bundled());
        assert!(!Entrypoint::MineBlock.is_bundled());
    }

    #[test]
    fn test_entrypoint_wire_names_match_serde() {
        for entrypoint in [
            Entrypoint::AddTransaction,
            Entrypoint::ProveBatchBundled,
            Entrypoint::UnlockFeature,
        ] {
            let json = serde_json::to_string(&entrypoint).unwrap();
            assert_eq!(json, format!("\"{}\"", entrypoint.name()));
            assert_eq!(entrypoint.name().parse::<Entrypoint>().unwrap(), entrypoint);
        }
    }

    #[test]
    fn test_tx_hash_validation() {
        assert_eq!(TxHash::parse("0xABC").unwrap().as_str(), "0xabc");
        assert!(TxHash::parse("0x").is_err());
        assert!(TxHash::parse("abc").is_err());
        assert!(TxHash::parse("0xzz").is_err());
        assert!(TxHash::parse(&format!("0x{}", "f".repeat(65))).is_err());
        assert!(TxHash::parse(&format!("0x{}", "f".repeat(64))).is_ok());
    }

    #[test]
    fn test_action_tier_from_calldata() {
        let action = Action::for_tier(
            ContractAddress::new("0xgame"),
            Entrypoint::AddTransaction,
            TierId(1),
            vec![U256::from(5)],
        );
        assert_eq!(action.tier(), Some(TierId(1)));
        assert_eq!(action.calldata, vec![U256::from(1), U256::from(5)]);

        let bare = Action::new(ContractAddress::default(), Entrypoint::MineBlock, vec![]);
        assert_eq!(bare.tier(), None);
        assert!(bare.target.is_empty());
    }
}

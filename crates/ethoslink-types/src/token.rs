//! Token and holder types
//!
//! A `SocialToken` is a distinct fungible asset class identified by an integer
//! id, created by exactly one mint and never deleted. The split between what a
//! holder owns privately and what they currently offer for sale lives in a
//! `HolderRecord` keyed by `(TokenId, Address)`.

use crate::{Address, Amount, LedgerError, Price, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer token identifier
///
/// Minted token ids are allocated monotonically starting at 1. Id 0 is reserved
/// for the bootstrap token (EthosLink).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct TokenId(pub u64);

impl TokenId {
    /// The bootstrap token (EthosLink), claimable once per address
    pub const BOOTSTRAP: TokenId = TokenId(0);

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn is_bootstrap(&self) -> bool {
        *self == Self::BOOTSTRAP
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token_{}", self.0)
    }
}

/// Launch state of a token
///
/// A token starts `Unlaunched` and may transition to `Launched` exactly once;
/// there is no way back. The launch price is carried on the variant so a
/// launched token can never be missing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchState {
    /// Created by mint, not yet offered for sale by its creator
    Unlaunched,
    /// Bulk self-listed by a holder at the recorded price
    Launched { price: Price },
}

impl LaunchState {
    pub fn is_launched(&self) -> bool {
        matches!(self, LaunchState::Launched { .. })
    }

    /// The launch price, if launched
    pub fn price(&self) -> Option<Price> {
        match self {
            LaunchState::Unlaunched => None,
            LaunchState::Launched { price } => Some(*price),
        }
    }

    /// Perform the single legal transition
    pub fn launch(&self, token_id: TokenId, price: Price) -> Result<Self> {
        match self {
            LaunchState::Unlaunched => Ok(LaunchState::Launched { price }),
            LaunchState::Launched { .. } => Err(LedgerError::AlreadyLaunched { token_id }),
        }
    }
}

/// Registry entry for one token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialToken {
    /// Token identifier
    pub id: TokenId,
    /// Address that minted the token
    pub creator: Address,
    /// Human-readable label
    pub name: String,
    /// Declared total supply, immutable after mint
    pub total_supply: Amount,
    /// Price recorded at mint, used as the default launch price
    pub default_price: Price,
    /// Launch state machine
    pub state: LaunchState,
    /// When the token was minted
    pub minted_at: DateTime<Utc>,
}

impl SocialToken {
    pub fn is_launched(&self) -> bool {
        self.state.is_launched()
    }

    /// The price recorded at launch, if launched
    pub fn launch_price(&self) -> Option<Price> {
        self.state.price()
    }
}

/// Per-(token, address) balance record
///
/// Created lazily on the first balance-affecting operation and never removed;
/// balances may return to zero but the record persists, preserving listing
/// price history and bootstrap claim state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderRecord {
    /// Units owned and not offered for sale
    pub holding: Amount,
    /// Units currently offered for sale
    pub listed: Amount,
    /// Price at which the listed units are offered; meaningful only while
    /// `listed` is non-zero
    pub listed_price: Price,
}

impl HolderRecord {
    /// Total units owned (holding + listed)
    pub fn total(&self) -> Amount {
        self.holding
            .checked_add(self.listed)
            .unwrap_or(Amount(u128::MAX))
    }
}

//! EthosLink Token Registry
//!
//! Tracks, per token id, the creator, declared total supply, display name, and
//! launch state. Token ids are allocated by a strictly increasing counter that
//! lives under the same lock as the token map, so id allocation and entry
//! creation are a single transaction. Id 0 is reserved for the bootstrap token
//! and is never allocated.
//!
//! Tokens are created by mint and never deleted; total supply is immutable once
//! recorded; the launch transition is one-way.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use ethoslink_types::{
    Address, Amount, LaunchState, LedgerError, Price, Result, SocialToken, TokenId,
};
use tokio::sync::{RwLock, RwLockWriteGuard};

#[derive(Debug, Default)]
struct RegistryState {
    tokens: HashMap<TokenId, SocialToken>,
    /// Most recently allocated id; the bootstrap id 0 means "none yet"
    last_id: u64,
}

/// The EthosLink token registry
///
/// Thread-safe; registration and the launch transition each run under one
/// write lock.
#[derive(Clone)]
pub struct TokenRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl TokenRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(RegistryState::default())),
        }
    }

    /// Register a new token, allocating the next id
    ///
    /// The entry starts unlaunched with `initial_price` recorded as the default
    /// launch price. Returns the allocated id.
    pub async fn register(
        &self,
        creator: Address,
        name: impl Into<String>,
        total_supply: Amount,
        initial_price: Price,
    ) -> Result<TokenId> {
        if total_supply.is_zero() {
            return Err(LedgerError::InvalidSupply);
        }

        let mut state = self.state.write().await;
        state.last_id += 1;
        let id = TokenId::new(state.last_id);

        state.tokens.insert(
            id,
            SocialToken {
                id,
                creator,
                name: name.into(),
                total_supply,
                default_price: initial_price,
                state: LaunchState::Unlaunched,
                minted_at: Utc::now(),
            },
        );

        Ok(id)
    }

    /// Get a token's registry entry
    pub async fn token(&self, id: TokenId) -> Result<SocialToken> {
        let state = self.state.read().await;
        state
            .tokens
            .get(&id)
            .cloned()
            .ok_or(LedgerError::TokenNotFound { token_id: id })
    }

    /// Whether a token exists
    pub async fn contains(&self, id: TokenId) -> bool {
        self.state.read().await.tokens.contains_key(&id)
    }

    /// Begin the one-way launch transition
    ///
    /// Validates that the token exists and is unlaunched, and returns a permit
    /// that holds the registry write lock. The caller performs whatever other
    /// work belongs to the launch transaction, then calls
    /// [`LaunchPermit::commit`]. Dropping the permit without committing leaves
    /// the token unlaunched. While the permit is alive no other launch of any
    /// token can proceed past this check, so two concurrent launches resolve
    /// to a single winner.
    pub async fn begin_launch(&self, id: TokenId) -> Result<LaunchPermit<'_>> {
        let state = self.state.write().await;
        let token = state
            .tokens
            .get(&id)
            .ok_or(LedgerError::TokenNotFound { token_id: id })?;

        // Re-validate the transition now so the permit can commit infallibly.
        token.state.launch(id, Price::zero())?;

        Ok(LaunchPermit { token_id: id, state })
    }

    /// Perform the one-way launch transition, recording the launch price
    pub async fn mark_launched(&self, id: TokenId, price: Price) -> Result<()> {
        let permit = self.begin_launch(id).await?;
        permit.commit(price);
        Ok(())
    }

    /// The most recently allocated token id (monotonic, read-only)
    pub async fn current_token_id(&self) -> TokenId {
        TokenId::new(self.state.read().await.last_id)
    }

    /// Number of registered tokens
    pub async fn token_count(&self) -> usize {
        self.state.read().await.tokens.len()
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// In-flight launch transition
///
/// Holds the registry write lock from validation until [`commit`] records the
/// launch, so the rest of the launch transaction (the bulk balance move) runs
/// with the unlaunched state pinned. Dropped without commit, the token stays
/// unlaunched and a later launch may try again.
///
/// [`commit`]: LaunchPermit::commit
pub struct LaunchPermit<'a> {
    token_id: TokenId,
    state: RwLockWriteGuard<'a, RegistryState>,
}

impl LaunchPermit<'_> {
    /// The token this permit launches
    pub fn token_id(&self) -> TokenId {
        self.token_id
    }

    /// Record the launch at `price` and release the lock
    pub fn commit(mut self, price: Price) {
        // The entry was validated by `begin_launch` and tokens are never
        // removed, so it is still present.
        if let Some(token) = self.state.tokens.get_mut(&self.token_id) {
            token.state = LaunchState::Launched { price };
        }
    }
}

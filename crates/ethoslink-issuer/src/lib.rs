//! EthosLink Issuer - token issuance and the bootstrap grant
//!
//! The issuer is the only component that creates units:
//!
//! 1. `mint_social_token` allocates the next token id, registers the token,
//!    and seeds the creator's holding balance with the entire declared supply
//! 2. `claim_bootstrap` grants the fixed EthosLink amount (token id 0) to a
//!    caller exactly once per address
//!
//! After issuance the supply is fixed; every later operation only moves
//! existing units between balance columns and addresses.

use std::sync::Arc;

use ethoslink_ledger::{AccountBook, EntryReason};
use ethoslink_registry::TokenRegistry;
use ethoslink_types::{Address, Amount, LedgerError, Price, Result, TokenId};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Configuration for the issuer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuerConfig {
    /// Display name of the bootstrap token
    pub bootstrap_name: String,
    /// Fixed grant credited on a successful bootstrap claim
    pub bootstrap_grant: Amount,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            bootstrap_name: "EthosLink".to_string(),
            bootstrap_grant: Amount::from_whole(100),
        }
    }
}

/// The EthosLink issuance service
#[derive(Clone)]
pub struct Issuer {
    config: IssuerConfig,
    registry: Arc<TokenRegistry>,
    book: Arc<AccountBook>,
}

impl Issuer {
    /// Create an issuer over shared registry and account book handles
    pub fn new(config: IssuerConfig, registry: Arc<TokenRegistry>, book: Arc<AccountBook>) -> Self {
        Self {
            config,
            registry,
            book,
        }
    }

    /// Get issuer configuration
    pub fn config(&self) -> &IssuerConfig {
        &self.config
    }

    /// Claim the one-time bootstrap grant for `caller`
    ///
    /// Credits the fixed grant to the caller's holding balance for token 0.
    /// A second claim fails with `AlreadyClaimed` and changes nothing; the
    /// guard is the existence of the holder record, which persists even if the
    /// balance is later spent to zero.
    pub async fn claim_bootstrap(&self, caller: Address) -> Result<Amount> {
        let granted = self
            .book
            .grant_once(
                TokenId::BOOTSTRAP,
                caller,
                self.config.bootstrap_grant,
                EntryReason::BootstrapGrant,
            )
            .await?;

        info!("Bootstrap grant of {} claimed by {}", granted, caller);
        Ok(granted)
    }

    /// Mint a new social token
    ///
    /// Allocates the next token id, registers the token with `caller` as
    /// creator and `initial_price` as the default launch price, and credits the
    /// caller's holding balance with the full supply. Returns the new id.
    pub async fn mint_social_token(
        &self,
        caller: Address,
        total_supply: Amount,
        name: impl Into<String>,
        initial_price: Price,
    ) -> Result<TokenId> {
        if total_supply.is_zero() {
            return Err(LedgerError::InvalidSupply);
        }

        let name = name.into();
        let id = self
            .registry
            .register(caller, name.clone(), total_supply, initial_price)
            .await?;

        // Seed the creator's holding with the entire declared supply. From this
        // point the conservation law holds for the token.
        self.book
            .credit_holding(id, caller, total_supply, EntryReason::MintSeed)
            .await?;

        info!(
            "Minted {} (\"{}\") with supply {} for creator {}",
            id, name, total_supply, caller
        );
        Ok(id)
    }

    /// The most recently allocated token id
    pub async fn current_token_id(&self) -> TokenId {
        self.registry.current_token_id().await
    }

    /// Bootstrap (EthosLink) holding balance of an address
    pub async fn bootstrap_balance(&self, address: Address) -> Amount {
        self.book.holding_of(TokenId::BOOTSTRAP, address).await
    }

    /// Whether an address has claimed the bootstrap grant
    pub async fn has_claimed(&self, address: Address) -> bool {
        self.book.has_record(TokenId::BOOTSTRAP, address).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_issuer() -> Issuer {
        Issuer::new(
            IssuerConfig::default(),
            Arc::new(TokenRegistry::new()),
            Arc::new(AccountBook::new()),
        )
    }

    #[tokio::test]
    async fn test_claim_bootstrap() {
        let issuer = create_test_issuer();
        let caller = Address::new();

        let granted = issuer.claim_bootstrap(caller).await.unwrap();

        assert_eq!(granted, Amount::from_whole(100));
        assert_eq!(issuer.bootstrap_balance(caller).await, Amount::from_whole(100));
        assert!(issuer.has_claimed(caller).await);
    }

    #[tokio::test]
    async fn test_second_claim_rejected() {
        let issuer = create_test_issuer();
        let caller = Address::new();

        issuer.claim_bootstrap(caller).await.unwrap();
        let second = issuer.claim_bootstrap(caller).await;

        assert!(matches!(
            second,
            Err(LedgerError::AlreadyClaimed { address }) if address == caller
        ));
        // Balance unchanged by the rejected claim.
        assert_eq!(issuer.bootstrap_balance(caller).await, Amount::from_whole(100));
    }

    #[tokio::test]
    async fn test_claims_are_per_address() {
        let issuer = create_test_issuer();
        let first = Address::new();
        let second = Address::new();

        issuer.claim_bootstrap(first).await.unwrap();
        issuer.claim_bootstrap(second).await.unwrap();

        assert_eq!(issuer.bootstrap_balance(first).await, Amount::from_whole(100));
        assert_eq!(issuer.bootstrap_balance(second).await, Amount::from_whole(100));
    }

    #[tokio::test]
    async fn test_concurrent_claims_single_winner() {
        let issuer = create_test_issuer();
        let caller = Address::new();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let issuer = issuer.clone();
            handles.push(tokio::spawn(
                async move { issuer.claim_bootstrap(caller).await.is_ok() },
            ));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 1);
        assert_eq!(issuer.bootstrap_balance(caller).await, Amount::from_whole(100));
    }

    #[tokio::test]
    async fn test_mint_seeds_creator_holding() {
        let registry = Arc::new(TokenRegistry::new());
        let book = Arc::new(AccountBook::new());
        let issuer = Issuer::new(IssuerConfig::default(), registry.clone(), book.clone());
        let creator = Address::new();

        let id = issuer
            .mint_social_token(creator, Amount::new(1000), "karthikeya", Price::new(10))
            .await
            .unwrap();

        assert_eq!(id, TokenId::new(1));
        assert_eq!(issuer.current_token_id().await, id);
        assert_eq!(registry.token(id).await.unwrap().creator, creator);
        assert_eq!(book.holding_of(id, creator).await, Amount::new(1000));
    }

    #[tokio::test]
    async fn test_mint_zero_supply_rejected() {
        let issuer = create_test_issuer();
        let result = issuer
            .mint_social_token(Address::new(), Amount::zero(), "empty", Price::new(10))
            .await;
        assert!(matches!(result, Err(LedgerError::InvalidSupply)));
        assert_eq!(issuer.current_token_id().await, TokenId::BOOTSTRAP);
    }

    #[tokio::test]
    async fn test_custom_grant_amount() {
        let config = IssuerConfig {
            bootstrap_grant: Amount::new(42),
            ..Default::default()
        };
        let issuer = Issuer::new(
            config,
            Arc::new(TokenRegistry::new()),
            Arc::new(AccountBook::new()),
        );
        let caller = Address::new();

        let granted = issuer.claim_bootstrap(caller).await.unwrap();
        assert_eq!(granted, Amount::new(42));
    }
}

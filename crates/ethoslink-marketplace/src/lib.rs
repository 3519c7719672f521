//! EthosLink Marketplace Engine
//!
//! Orchestrates the sellable side of the ledger: launching a token (bulk
//! self-listing by its holder), listing and withdrawing units, and purchases
//! that move listed units directly into a buyer's holding balance.
//!
//! Every operation takes an explicit authenticated caller and may only move
//! that caller's balances; a purchase is the one defined transfer across
//! addresses, and it touches exactly the seller's listed column and the
//! buyer's holding column. The token is resolved through the registry before
//! any balance is read, so `TokenNotFound` always wins over balance errors.
//!
//! No settlement currency moves here. Prices are recorded and reported; paying
//! for a purchase is a collaborator concern.

use std::sync::Arc;

use ethoslink_ledger::{AccountBook, JournalEntry};
use ethoslink_registry::TokenRegistry;
use ethoslink_types::{
    Address, Amount, HolderRecord, LedgerError, Price, Result, SocialToken, TokenId,
};
use tracing::info;

/// The EthosLink marketplace engine
///
/// Cheap to clone; all state lives behind the shared registry and account book
/// handles.
#[derive(Clone)]
pub struct Marketplace {
    registry: Arc<TokenRegistry>,
    book: Arc<AccountBook>,
}

impl Marketplace {
    /// Create a marketplace over shared registry and account book handles
    pub fn new(registry: Arc<TokenRegistry>, book: Arc<AccountBook>) -> Self {
        Self { registry, book }
    }

    // ========================================================================
    // Mutating operations
    // ========================================================================

    /// Launch a token: move the caller's entire holding into their own listed
    /// balance at `price` and mark the token launched
    ///
    /// A bulk self-listing, not a transfer: after launch the caller's listed
    /// balance equals what they held and their holding is zero. One-way; a
    /// second launch fails with `AlreadyLaunched`. Returns the amount listed.
    pub async fn launch_social_token(
        &self,
        caller: Address,
        token_id: TokenId,
        price: Price,
    ) -> Result<Amount> {
        // The permit validates existence and launch state and pins the
        // unlaunched state for the rest of the transaction. If the bulk move
        // fails (the caller holds nothing), the permit is dropped uncommitted
        // and the token stays launchable; the registry only records the launch
        // once the listing has actually happened.
        let permit = self.registry.begin_launch(token_id).await?;
        let listed = self.book.list_all(token_id, caller, price).await?;
        permit.commit(price);

        info!(
            "Launched {}: {} listed {} at price {}",
            token_id, caller, listed, price
        );
        Ok(listed)
    }

    /// List units for sale: move `amount` from the caller's holding to their
    /// listed balance, setting the listing price
    pub async fn list_tokens(
        &self,
        caller: Address,
        amount: Amount,
        token_id: TokenId,
        price: Price,
    ) -> Result<()> {
        self.ensure_token(token_id).await?;
        self.book.list(token_id, caller, amount, price).await?;

        info!("{} listed {} of {} at price {}", caller, amount, token_id, price);
        Ok(())
    }

    /// Withdraw listed units: the exact inverse of `list_tokens`
    pub async fn withdraw_tokens(
        &self,
        caller: Address,
        amount: Amount,
        token_id: TokenId,
    ) -> Result<()> {
        self.ensure_token(token_id).await?;
        self.book.withdraw(token_id, caller, amount).await?;

        info!("{} withdrew {} of {} from listing", caller, amount, token_id);
        Ok(())
    }

    /// Buy listed units from a seller
    ///
    /// Moves `amount` from the seller's listed balance directly into the
    /// buyer's holding balance; the seller's holding is untouched. Concurrent
    /// buys against the same seller serialize inside the account book, so the
    /// listed balance can never be oversold.
    pub async fn buy_social_token(
        &self,
        buyer: Address,
        token_id: TokenId,
        amount: Amount,
        seller: Address,
    ) -> Result<()> {
        self.ensure_token(token_id).await?;
        if buyer == seller {
            return Err(LedgerError::SelfPurchase { address: buyer });
        }
        self.book
            .transfer_listed(token_id, seller, buyer, amount)
            .await?;

        info!("{} bought {} of {} from {}", buyer, amount, token_id, seller);
        Ok(())
    }

    // ========================================================================
    // Read-only accessors
    // ========================================================================

    /// Registry entry for a token
    pub async fn token(&self, token_id: TokenId) -> Result<SocialToken> {
        self.registry.token(token_id).await
    }

    /// Holder record for a (token, address) pair, if one exists
    pub async fn holder_record(
        &self,
        token_id: TokenId,
        address: Address,
    ) -> Option<HolderRecord> {
        self.book.holder_record(token_id, address).await
    }

    /// The most recently allocated token id
    pub async fn current_token_id(&self) -> TokenId {
        self.registry.current_token_id().await
    }

    /// Sum of holding + listed across all holders of a token
    pub async fn circulating(&self, token_id: TokenId) -> Amount {
        self.book.circulating(token_id).await
    }

    /// Recent journal entries across the whole book (newest first)
    pub async fn recent_entries(&self, limit: usize) -> Vec<JournalEntry> {
        self.book.recent_entries(limit).await
    }

    async fn ensure_token(&self, token_id: TokenId) -> Result<()> {
        // The bootstrap token has no registry entry but its balances are real.
        if token_id.is_bootstrap() || self.registry.contains(token_id).await {
            Ok(())
        } else {
            Err(LedgerError::TokenNotFound { token_id })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethoslink_issuer::{Issuer, IssuerConfig};

    struct Harness {
        issuer: Issuer,
        market: Marketplace,
    }

    fn harness() -> Harness {
        let registry = Arc::new(TokenRegistry::new());
        let book = Arc::new(AccountBook::new());
        Harness {
            issuer: Issuer::new(IssuerConfig::default(), registry.clone(), book.clone()),
            market: Marketplace::new(registry, book),
        }
    }

    async fn mint(h: &Harness, creator: Address, supply: u128, price: u128) -> TokenId {
        h.issuer
            .mint_social_token(creator, Amount::new(supply), "karthikeya", Price::new(price))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_launch_lists_entire_holding() {
        let h = harness();
        let owner = Address::new();
        let id = mint(&h, owner, 1000, 10).await;

        let listed = h
            .market
            .launch_social_token(owner, id, Price::new(20))
            .await
            .unwrap();

        assert_eq!(listed, Amount::new(1000));
        let record = h.market.holder_record(id, owner).await.unwrap();
        assert_eq!(record.listed, Amount::new(1000));
        assert_eq!(record.holding, Amount::zero());
        assert_eq!(record.listed_price, Price::new(20));

        let token = h.market.token(id).await.unwrap();
        assert!(token.is_launched());
        assert_eq!(token.launch_price(), Some(Price::new(20)));
    }

    #[tokio::test]
    async fn test_second_launch_rejected() {
        let h = harness();
        let owner = Address::new();
        let id = mint(&h, owner, 1000, 10).await;

        h.market
            .launch_social_token(owner, id, Price::new(20))
            .await
            .unwrap();
        let again = h.market.launch_social_token(owner, id, Price::new(30)).await;

        assert!(matches!(again, Err(LedgerError::AlreadyLaunched { .. })));
    }

    #[tokio::test]
    async fn test_launch_unknown_token() {
        let h = harness();
        let result = h
            .market
            .launch_social_token(Address::new(), TokenId::new(9), Price::new(1))
            .await;
        assert!(matches!(result, Err(LedgerError::TokenNotFound { .. })));
    }

    #[tokio::test]
    async fn test_launch_without_holdings() {
        let h = harness();
        let owner = Address::new();
        let stranger = Address::new();
        let id = mint(&h, owner, 1000, 10).await;

        let result = h
            .market
            .launch_social_token(stranger, id, Price::new(20))
            .await;
        assert!(matches!(
            result,
            Err(LedgerError::NoHoldings { address, .. }) if address == stranger
        ));
        // The failed launch left the token unlaunched.
        assert!(!h.market.token(id).await.unwrap().is_launched());
    }

    #[tokio::test]
    async fn test_buy_moves_listed_to_buyer_holding() {
        let h = harness();
        let owner = Address::new();
        let buyer = Address::new();
        let id = mint(&h, owner, 1000, 10).await;

        h.market
            .launch_social_token(owner, id, Price::new(2))
            .await
            .unwrap();
        h.issuer.claim_bootstrap(buyer).await.unwrap();
        h.market
            .buy_social_token(buyer, id, Amount::new(1), owner)
            .await
            .unwrap();

        let seller = h.market.holder_record(id, owner).await.unwrap();
        assert_eq!(seller.listed, Amount::new(999));
        assert_eq!(seller.holding, Amount::zero());

        let bought = h.market.holder_record(id, buyer).await.unwrap();
        assert_eq!(bought.holding, Amount::new(1));
        assert_eq!(bought.listed, Amount::zero());
    }

    #[tokio::test]
    async fn test_buy_insufficient_listed_leaves_state() {
        let h = harness();
        let owner = Address::new();
        let buyer = Address::new();
        let id = mint(&h, owner, 1000, 10).await;

        h.market
            .launch_social_token(owner, id, Price::new(2))
            .await
            .unwrap();

        let result = h
            .market
            .buy_social_token(buyer, id, Amount::new(1001), owner)
            .await;
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientListed { available, required })
                if available == Amount::new(1000) && required == Amount::new(1001)
        ));

        let seller = h.market.holder_record(id, owner).await.unwrap();
        assert_eq!(seller.listed, Amount::new(1000));
        assert!(h.market.holder_record(id, buyer).await.is_none());
    }

    #[tokio::test]
    async fn test_self_purchase_rejected() {
        let h = harness();
        let owner = Address::new();
        let id = mint(&h, owner, 1000, 10).await;

        h.market
            .launch_social_token(owner, id, Price::new(2))
            .await
            .unwrap();
        let result = h
            .market
            .buy_social_token(owner, id, Amount::new(1), owner)
            .await;

        assert!(matches!(
            result,
            Err(LedgerError::SelfPurchase { address }) if address == owner
        ));
        let record = h.market.holder_record(id, owner).await.unwrap();
        assert_eq!(record.listed, Amount::new(1000));
    }

    #[tokio::test]
    async fn test_list_and_withdraw_roundtrip() {
        let h = harness();
        let owner = Address::new();
        let buyer = Address::new();
        let id = mint(&h, owner, 1000, 10).await;

        h.market
            .launch_social_token(owner, id, Price::new(2))
            .await
            .unwrap();
        h.market
            .buy_social_token(buyer, id, Amount::new(5), owner)
            .await
            .unwrap();

        h.market
            .list_tokens(buyer, Amount::new(5), id, Price::new(10))
            .await
            .unwrap();
        let listed = h.market.holder_record(id, buyer).await.unwrap();
        assert_eq!(listed.listed, Amount::new(5));
        assert_eq!(listed.holding, Amount::zero());
        assert_eq!(listed.listed_price, Price::new(10));

        h.market
            .withdraw_tokens(buyer, Amount::new(5), id)
            .await
            .unwrap();
        let withdrawn = h.market.holder_record(id, buyer).await.unwrap();
        assert_eq!(withdrawn.holding, Amount::new(5));
        assert_eq!(withdrawn.listed, Amount::zero());
    }

    #[tokio::test]
    async fn test_list_more_than_holding() {
        let h = harness();
        let owner = Address::new();
        let id = mint(&h, owner, 100, 10).await;

        let result = h
            .market
            .list_tokens(owner, Amount::new(200), id, Price::new(1))
            .await;
        assert!(matches!(result, Err(LedgerError::InsufficientHolding { .. })));
    }

    #[tokio::test]
    async fn test_operations_on_unknown_token() {
        let h = harness();
        let addr = Address::new();
        let missing = TokenId::new(77);

        assert!(matches!(
            h.market.list_tokens(addr, Amount::new(1), missing, Price::new(1)).await,
            Err(LedgerError::TokenNotFound { .. })
        ));
        assert!(matches!(
            h.market.withdraw_tokens(addr, Amount::new(1), missing).await,
            Err(LedgerError::TokenNotFound { .. })
        ));
        assert!(matches!(
            h.market
                .buy_social_token(addr, missing, Amount::new(1), Address::new())
                .await,
            Err(LedgerError::TokenNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_bootstrap_units_can_be_listed_and_sold() {
        let h = harness();
        let seller = Address::new();
        let buyer = Address::new();

        h.issuer.claim_bootstrap(seller).await.unwrap();
        h.market
            .list_tokens(seller, Amount::from_whole(10), TokenId::BOOTSTRAP, Price::new(3))
            .await
            .unwrap();
        h.market
            .buy_social_token(buyer, TokenId::BOOTSTRAP, Amount::from_whole(4), seller)
            .await
            .unwrap();

        assert_eq!(
            h.market
                .holder_record(TokenId::BOOTSTRAP, buyer)
                .await
                .unwrap()
                .holding,
            Amount::from_whole(4)
        );
    }

    #[tokio::test]
    async fn test_conservation_through_full_cycle() {
        let h = harness();
        let owner = Address::new();
        let alice = Address::new();
        let bob = Address::new();
        let supply = Amount::new(1000);
        let id = mint(&h, owner, 1000, 10).await;

        h.market
            .launch_social_token(owner, id, Price::new(2))
            .await
            .unwrap();
        h.market
            .buy_social_token(alice, id, Amount::new(300), owner)
            .await
            .unwrap();
        h.market
            .list_tokens(alice, Amount::new(200), id, Price::new(4))
            .await
            .unwrap();
        h.market
            .buy_social_token(bob, id, Amount::new(150), alice)
            .await
            .unwrap();
        h.market.withdraw_tokens(alice, Amount::new(50), id).await.unwrap();

        assert_eq!(h.market.circulating(id).await, supply);
    }

    #[tokio::test]
    async fn test_concurrent_buys_never_oversell() {
        let h = harness();
        let owner = Address::new();
        let id = mint(&h, owner, 10, 1).await;

        h.market
            .launch_social_token(owner, id, Price::new(1))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..25 {
            let market = h.market.clone();
            let buyer = Address::new();
            handles.push(tokio::spawn(async move {
                market
                    .buy_social_token(buyer, id, Amount::new(1), owner)
                    .await
                    .is_ok()
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 10);
        assert_eq!(
            h.market.holder_record(id, owner).await.unwrap().listed,
            Amount::zero()
        );
        assert_eq!(h.market.circulating(id).await, Amount::new(10));
    }

    #[tokio::test]
    async fn test_launch_racing_own_listing_leaves_no_partial_state() {
        // A caller's own list_tokens can drain the holding a concurrent launch
        // is about to bulk-list. Whichever way the race resolves, a failed
        // launch must leave the token unlaunched and every unit accounted for.
        for _ in 0..200 {
            let h = harness();
            let owner = Address::new();
            let id = mint(&h, owner, 1000, 10).await;

            let market = h.market.clone();
            let launch = tokio::spawn(async move {
                market.launch_social_token(owner, id, Price::new(2)).await
            });
            let market = h.market.clone();
            let list = tokio::spawn(async move {
                market
                    .list_tokens(owner, Amount::new(1000), id, Price::new(3))
                    .await
            });

            let launch_result = launch.await.unwrap();
            let list_result = list.await.unwrap();

            // Exactly one of the two moves wins the full holding.
            assert_ne!(launch_result.is_ok(), list_result.is_ok());
            let token = h.market.token(id).await.unwrap();
            assert_eq!(token.is_launched(), launch_result.is_ok());
            assert_eq!(h.market.circulating(id).await, Amount::new(1000));
        }
    }

    #[tokio::test]
    async fn test_concurrent_launches_single_winner() {
        let h = harness();
        let owner = Address::new();
        let id = mint(&h, owner, 1000, 10).await;

        let mut handles = Vec::new();
        for i in 0..8u128 {
            let market = h.market.clone();
            handles.push(tokio::spawn(async move {
                market
                    .launch_social_token(owner, id, Price::new(i + 1))
                    .await
                    .is_ok()
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 1);
        let record = h.market.holder_record(id, owner).await.unwrap();
        assert_eq!(record.listed, Amount::new(1000));
        assert_eq!(record.holding, Amount::zero());
    }

    #[tokio::test]
    async fn test_journal_visible_through_engine() {
        let h = harness();
        let owner = Address::new();
        let id = mint(&h, owner, 100, 1).await;

        h.market
            .launch_social_token(owner, id, Price::new(1))
            .await
            .unwrap();

        let recent = h.market.recent_entries(10).await;
        assert_eq!(recent.len(), 2); // mint seed + launch listing
    }
}

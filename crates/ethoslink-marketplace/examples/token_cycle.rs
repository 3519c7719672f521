//! EthosLink Demo - Complete Token Cycle
//!
//! This example demonstrates the full social-token lifecycle:
//!
//! Mint → Launch → Bootstrap Claim → Buy → List → Withdraw
//!
//! Run with:
//!   cargo run --example token_cycle

use std::sync::Arc;

use ethoslink_issuer::{Issuer, IssuerConfig};
use ethoslink_ledger::AccountBook;
use ethoslink_marketplace::Marketplace;
use ethoslink_registry::TokenRegistry;
use ethoslink_types::{Address, Amount, Price};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("EthosLink — social-token ledger walkthrough");
    println!();

    let registry = Arc::new(TokenRegistry::new());
    let book = Arc::new(AccountBook::new());
    let issuer = Issuer::new(IssuerConfig::default(), registry.clone(), book.clone());
    let market = Marketplace::new(registry, book);

    let creator = Address::new();
    let fan = Address::new();

    // =========================================================================
    // Step 1: Mint a social token
    // =========================================================================
    println!("── Step 1: Mint ──────────────────────────────────────────────");
    let token_id = issuer
        .mint_social_token(creator, Amount::from_whole(1000), "karthikeya", Price::new(10))
        .await
        .expect("mint");
    let token = market.token(token_id).await.expect("token");
    println!("  ✓ Minted {} (\"{}\")", token_id, token.name);
    println!("    Creator:  {}", token.creator);
    println!("    Supply:   {:.0} whole tokens", token.total_supply.to_whole());
    println!();

    // =========================================================================
    // Step 2: Launch (bulk self-listing)
    // =========================================================================
    println!("── Step 2: Launch ────────────────────────────────────────────");
    let listed = market
        .launch_social_token(creator, token_id, Price::new(20))
        .await
        .expect("launch");
    println!("  ✓ Launched at price 20; {:.0} whole tokens listed", listed.to_whole());
    println!();

    // =========================================================================
    // Step 3: A fan claims the bootstrap grant and buys in
    // =========================================================================
    println!("── Step 3: Claim & Buy ───────────────────────────────────────");
    let grant = issuer.claim_bootstrap(fan).await.expect("claim");
    println!("  ✓ Fan claimed {:.0} EthosLink", grant.to_whole());

    market
        .buy_social_token(fan, token_id, Amount::from_whole(25), creator)
        .await
        .expect("buy");
    let fan_record = market.holder_record(token_id, fan).await.expect("record");
    println!("  ✓ Fan bought 25; now holding {:.0}", fan_record.holding.to_whole());
    println!();

    // =========================================================================
    // Step 4: Re-list and withdraw
    // =========================================================================
    println!("── Step 4: List & Withdraw ───────────────────────────────────");
    market
        .list_tokens(fan, Amount::from_whole(10), token_id, Price::new(40))
        .await
        .expect("list");
    market
        .withdraw_tokens(fan, Amount::from_whole(4), token_id)
        .await
        .expect("withdraw");
    let fan_record = market.holder_record(token_id, fan).await.expect("record");
    println!(
        "  ✓ Fan listed 10 at price 40, withdrew 4; holding {:.0}, listed {:.0}",
        fan_record.holding.to_whole(),
        fan_record.listed.to_whole()
    );
    println!();

    // =========================================================================
    // Step 5: Conservation check
    // =========================================================================
    println!("── Step 5: Conservation ──────────────────────────────────────");
    let circulating = market.circulating(token_id).await;
    println!(
        "  ✓ Circulating {:.0} == declared supply {:.0}",
        circulating.to_whole(),
        token.total_supply.to_whole()
    );

    println!();
    println!("Recent ledger activity:");
    for entry in market.recent_entries(5).await {
        println!(
            "  {:?} {:?} {} on {} for {}",
            entry.side, entry.column, entry.amount, entry.token, entry.address
        );
    }
}

//! EthosLink Account Registry - holder balances for every token
//!
//! The account book is:
//! - Token-scoped (every record is keyed by `(TokenId, Address)`)
//! - Two-sided (each record splits into a *holding* and a *listed* balance)
//! - Journaled (every balance move appends an immutable entry with its reason)
//! - Atomic (each operation applies all of its writes under one lock, or none)
//!
//! # Invariants
//!
//! 1. No negative balances
//! 2. Units only move between the columns and addresses an operation names
//! 3. Holder records are never removed once created
//! 4. Concurrent operations against the same record serialize; two buys can
//!    never consume the same listed units
//!
//! The book is the sole writer of holder balances. Issuance and marketplace
//! services call its primitives; they never touch records directly.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ethoslink_types::{Address, Amount, HolderRecord, LedgerError, Price, Result, TokenId};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Unique identifier for a journal entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl EntryId {
    pub fn new() -> Self {
        Self(format!("entry_{}", Uuid::new_v4()))
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

/// Which balance column an entry touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceColumn {
    Holding,
    Listed,
}

/// Direction of a journal entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntrySide {
    /// Increase
    Credit,
    /// Decrease
    Debit,
}

/// Reason for a journal entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryReason {
    /// One-time bootstrap grant (EthosLink)
    BootstrapGrant,
    /// Supply seeded to the creator at mint
    MintSeed,
    /// Bulk self-listing at launch
    Launch { price: Price },
    /// Holding moved to listed
    List { price: Price },
    /// Listed moved back to holding
    Withdraw,
    /// Listed units transferred to a buyer's holding
    Purchase { counterparty: Address },
}

/// A single journal entry (one side of a balance move)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub entry_id: EntryId,
    pub token: TokenId,
    pub address: Address,
    pub column: BalanceColumn,
    pub side: EntrySide,
    pub amount: Amount,
    pub holding_after: Amount,
    pub listed_after: Amount,
    pub reason: EntryReason,
    pub recorded_at: DateTime<Utc>,
}

/// The EthosLink account book
///
/// Tracks the holding/listed split per `(token, address)` pair. Thread-safe and
/// designed for concurrent access: every mutating primitive takes the write
/// lock for its whole read-check-write cycle.
#[derive(Clone)]
pub struct AccountBook {
    /// Holder records, created lazily and never removed
    records: Arc<RwLock<HashMap<(TokenId, Address), HolderRecord>>>,
    /// All journal entries (append-only)
    entries: Arc<RwLock<Vec<JournalEntry>>>,
}

impl AccountBook {
    /// Create a new in-memory account book
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    // ========================================================================
    // Mutating primitives
    // ========================================================================

    /// Credit an address's holding balance
    ///
    /// Creates the holder record if this is the first balance-affecting
    /// operation for the pair. Returns the new holding balance.
    pub async fn credit_holding(
        &self,
        token: TokenId,
        address: Address,
        amount: Amount,
        reason: EntryReason,
    ) -> Result<Amount> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }

        let mut records = self.records.write().await;
        let mut entries = self.entries.write().await;

        // Validate before touching the map: a failed operation must not leave
        // behind a freshly created record.
        let current = records
            .get(&(token, address))
            .map(|r| r.holding)
            .unwrap_or(Amount::zero());
        let new_holding = current
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;

        let record = records.entry((token, address)).or_default();
        record.holding = new_holding;

        push_entry(
            &mut entries,
            token,
            address,
            BalanceColumn::Holding,
            EntrySide::Credit,
            amount,
            *record,
            reason,
        );

        Ok(new_holding)
    }

    /// Credit an address's holding balance at most once per pair
    ///
    /// Fails with `AlreadyClaimed` if a record for the pair already exists,
    /// regardless of its current balances. The existence check and the credit
    /// happen under one write lock, so two concurrent claims cannot both win.
    pub async fn grant_once(
        &self,
        token: TokenId,
        address: Address,
        amount: Amount,
        reason: EntryReason,
    ) -> Result<Amount> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }

        let mut records = self.records.write().await;
        let mut entries = self.entries.write().await;

        if records.contains_key(&(token, address)) {
            return Err(LedgerError::AlreadyClaimed { address });
        }

        let record = records.entry((token, address)).or_default();
        record.holding = amount;

        push_entry(
            &mut entries,
            token,
            address,
            BalanceColumn::Holding,
            EntrySide::Credit,
            amount,
            *record,
            reason,
        );

        Ok(amount)
    }

    /// Move units from holding to listed, recording the listing price
    pub async fn list(
        &self,
        token: TokenId,
        address: Address,
        amount: Amount,
        price: Price,
    ) -> Result<()> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }

        let mut records = self.records.write().await;
        let mut entries = self.entries.write().await;

        // No record means a zero balance; fail without creating one.
        let record = records
            .get_mut(&(token, address))
            .ok_or(LedgerError::InsufficientHolding {
                available: Amount::zero(),
                required: amount,
            })?;
        let new_holding =
            record
                .holding
                .checked_sub(amount)
                .ok_or(LedgerError::InsufficientHolding {
                    available: record.holding,
                    required: amount,
                })?;
        let new_listed = record
            .listed
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;

        record.holding = new_holding;
        record.listed = new_listed;
        record.listed_price = price;

        push_entry(
            &mut entries,
            token,
            address,
            BalanceColumn::Listed,
            EntrySide::Credit,
            amount,
            *record,
            EntryReason::List { price },
        );

        Ok(())
    }

    /// Move an address's entire holding balance to listed
    ///
    /// The bulk self-listing behind launch. Fails with `NoHoldings` if there is
    /// nothing to move. Returns the amount moved.
    pub async fn list_all(&self, token: TokenId, address: Address, price: Price) -> Result<Amount> {
        let mut records = self.records.write().await;
        let mut entries = self.entries.write().await;

        let record = records
            .get_mut(&(token, address))
            .filter(|r| !r.holding.is_zero())
            .ok_or(LedgerError::NoHoldings {
                token_id: token,
                address,
            })?;

        let moved = record.holding;
        let new_listed = record
            .listed
            .checked_add(moved)
            .ok_or(LedgerError::AmountOverflow)?;

        record.holding = Amount::zero();
        record.listed = new_listed;
        record.listed_price = price;

        push_entry(
            &mut entries,
            token,
            address,
            BalanceColumn::Listed,
            EntrySide::Credit,
            moved,
            *record,
            EntryReason::Launch { price },
        );

        Ok(moved)
    }

    /// Move units from listed back to holding (un-listing)
    ///
    /// The listing price is retained on the record for whatever stays listed.
    pub async fn withdraw(&self, token: TokenId, address: Address, amount: Amount) -> Result<()> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }

        let mut records = self.records.write().await;
        let mut entries = self.entries.write().await;

        // No record means a zero balance; fail without creating one.
        let record = records
            .get_mut(&(token, address))
            .ok_or(LedgerError::InsufficientListed {
                available: Amount::zero(),
                required: amount,
            })?;
        let new_listed =
            record
                .listed
                .checked_sub(amount)
                .ok_or(LedgerError::InsufficientListed {
                    available: record.listed,
                    required: amount,
                })?;
        let new_holding = record
            .holding
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;

        record.listed = new_listed;
        record.holding = new_holding;

        push_entry(
            &mut entries,
            token,
            address,
            BalanceColumn::Holding,
            EntrySide::Credit,
            amount,
            *record,
            EntryReason::Withdraw,
        );

        Ok(())
    }

    /// Transfer units from a seller's listed balance to a buyer's holding
    ///
    /// The purchase primitive. Both sides are applied under one write lock:
    /// either the seller had the listed units and the buyer receives them, or
    /// nothing changes. The seller's holding balance is untouched.
    pub async fn transfer_listed(
        &self,
        token: TokenId,
        seller: Address,
        buyer: Address,
        amount: Amount,
    ) -> Result<()> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }

        let mut records = self.records.write().await;
        let mut entries = self.entries.write().await;

        // Validate both legs before mutating either record.
        let seller_listed = records
            .get(&(token, seller))
            .map(|r| r.listed)
            .unwrap_or(Amount::zero());
        let new_seller_listed =
            seller_listed
                .checked_sub(amount)
                .ok_or(LedgerError::InsufficientListed {
                    available: seller_listed,
                    required: amount,
                })?;
        let buyer_holding = records
            .get(&(token, buyer))
            .map(|r| r.holding)
            .unwrap_or(Amount::zero());
        let new_buyer_holding = buyer_holding
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;

        let seller_record = records.entry((token, seller)).or_default();
        seller_record.listed = new_seller_listed;
        let seller_snapshot = *seller_record;

        let buyer_record = records.entry((token, buyer)).or_default();
        buyer_record.holding = new_buyer_holding;
        let buyer_snapshot = *buyer_record;

        push_entry(
            &mut entries,
            token,
            seller,
            BalanceColumn::Listed,
            EntrySide::Debit,
            amount,
            seller_snapshot,
            EntryReason::Purchase {
                counterparty: buyer,
            },
        );
        push_entry(
            &mut entries,
            token,
            buyer,
            BalanceColumn::Holding,
            EntrySide::Credit,
            amount,
            buyer_snapshot,
            EntryReason::Purchase {
                counterparty: seller,
            },
        );

        Ok(())
    }

    // ========================================================================
    // Read-only accessors
    // ========================================================================

    /// Get a holder record, if one was ever created for the pair
    pub async fn holder_record(&self, token: TokenId, address: Address) -> Option<HolderRecord> {
        let records = self.records.read().await;
        records.get(&(token, address)).copied()
    }

    /// Whether any balance-affecting operation ever touched the pair
    pub async fn has_record(&self, token: TokenId, address: Address) -> bool {
        let records = self.records.read().await;
        records.contains_key(&(token, address))
    }

    /// Holding balance for the pair (zero if no record)
    pub async fn holding_of(&self, token: TokenId, address: Address) -> Amount {
        self.holder_record(token, address)
            .await
            .map(|r| r.holding)
            .unwrap_or(Amount::zero())
    }

    /// Listed balance for the pair (zero if no record)
    pub async fn listed_of(&self, token: TokenId, address: Address) -> Amount {
        self.holder_record(token, address)
            .await
            .map(|r| r.listed)
            .unwrap_or(Amount::zero())
    }

    /// Sum of holding + listed across all addresses for a token
    ///
    /// For a non-bootstrap token this equals the declared total supply at all
    /// times (conservation law).
    pub async fn circulating(&self, token: TokenId) -> Amount {
        let records = self.records.read().await;
        records
            .iter()
            .filter(|((t, _), _)| *t == token)
            .map(|(_, r)| r.total())
            .sum()
    }

    /// All addresses holding a record for a token
    pub async fn holders(&self, token: TokenId) -> Vec<Address> {
        let records = self.records.read().await;
        records
            .keys()
            .filter(|(t, _)| *t == token)
            .map(|(_, a)| *a)
            .collect()
    }

    /// All journal entries for an address
    pub async fn account_entries(&self, address: Address) -> Vec<JournalEntry> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|e| e.address == address)
            .cloned()
            .collect()
    }

    /// All journal entries for a token
    pub async fn token_entries(&self, token: TokenId) -> Vec<JournalEntry> {
        let entries = self.entries.read().await;
        entries.iter().filter(|e| e.token == token).cloned().collect()
    }

    /// Get recent journal entries (newest first)
    pub async fn recent_entries(&self, limit: usize) -> Vec<JournalEntry> {
        let entries = self.entries.read().await;
        entries.iter().rev().take(limit).cloned().collect()
    }

    /// Total number of journal entries
    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for AccountBook {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::too_many_arguments)]
fn push_entry(
    entries: &mut Vec<JournalEntry>,
    token: TokenId,
    address: Address,
    column: BalanceColumn,
    side: EntrySide,
    amount: Amount,
    record: HolderRecord,
    reason: EntryReason,
) {
    entries.push(JournalEntry {
        entry_id: EntryId::new(),
        token,
        address,
        column,
        side,
        amount,
        holding_after: record.holding,
        listed_after: record.listed,
        reason,
        recorded_at: Utc::now(),
    });
}

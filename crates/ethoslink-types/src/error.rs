//! Error types for EthosLink
//!
//! All errors are explicit, synchronous, recoverable-by-caller rejections. A
//! failed operation never leaves the ledger in an intermediate state, and the
//! specific kind is always propagated so callers can distinguish "insufficient
//! balance" from "not found" from "already launched".

use crate::{Address, Amount, TokenId};
use thiserror::Error;

/// Result type for EthosLink operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// EthosLink error taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========================================================================
    // Amount Errors
    // ========================================================================

    /// Amount overflow during arithmetic
    #[error("Amount overflow during arithmetic operation")]
    AmountOverflow,

    /// Zero or otherwise unusable amount
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    // ========================================================================
    // Token Registry Errors
    // ========================================================================

    /// Token does not exist
    #[error("Token {token_id} not found")]
    TokenNotFound { token_id: TokenId },

    /// Launch attempted on an already-launched token
    #[error("Token {token_id} has already been launched")]
    AlreadyLaunched { token_id: TokenId },

    /// Mint with a zero supply
    #[error("Declared total supply must be greater than zero")]
    InvalidSupply,

    // ========================================================================
    // Issuance Errors
    // ========================================================================

    /// Bootstrap grant claimed a second time
    #[error("Address {address} has already claimed the bootstrap grant")]
    AlreadyClaimed { address: Address },

    // ========================================================================
    // Balance Errors
    // ========================================================================

    /// Launch by a caller with nothing to list
    #[error("Address {address} has no holdings of token {token_id}")]
    NoHoldings { token_id: TokenId, address: Address },

    /// Holding balance too small for the requested move
    #[error("Insufficient holding balance: have {available}, need {required}")]
    InsufficientHolding { available: Amount, required: Amount },

    /// Listed balance too small for the requested move
    #[error("Insufficient listed balance: have {available}, need {required}")]
    InsufficientListed { available: Amount, required: Amount },

    /// Buyer and seller are the same address
    #[error("Address {address} cannot purchase its own listing")]
    SelfPurchase { address: Address },
}

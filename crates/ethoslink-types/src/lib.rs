//! EthosLink Types - Canonical domain types for the social-token ledger
//!
//! This crate contains all foundational types for EthosLink with zero
//! dependencies on other ethoslink crates. It defines the complete type system
//! for:
//!
//! - Identity types (`Address`)
//! - Token units with 18-decimal fixed-point precision (`Amount`, `Price`)
//! - Token and holder types (`TokenId`, `SocialToken`, `HolderRecord`)
//! - The explicit launch state machine (`LaunchState`)
//! - The error taxonomy (`LedgerError`)
//!
//! # Architectural Invariants
//!
//! These types support the core EthosLink ledger invariants:
//!
//! 1. A token's total supply is fixed at mint and never changes
//! 2. No unit is created, destroyed, or duplicated outside defined operations
//! 3. Launch is a one-way transition, enforced by the type of `LaunchState`
//! 4. Failure is explicit — every rejection carries a typed error

pub mod amount;
pub mod error;
pub mod identity;
pub mod token;

pub use amount::*;
pub use error::*;
pub use identity::*;
pub use token::*;

/// Version of the EthosLink types schema
pub const TYPES_VERSION: &str = "0.1.0";

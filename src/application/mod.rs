//! Application layer: the operations callers invoke.
//!
//! `SettlementService` is the settlement coordinator. The other services cover the
//! order lifecycle around it (placement, cancellation), opening funded accounts and
//! registering products. Each operation runs in its own store transaction.

pub mod accounts;
pub mod catalog;
pub mod orders;
pub mod response;
pub mod settlement;

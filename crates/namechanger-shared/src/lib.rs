//! Protocol data model for renaming a wallet-owned avatar profile.
//!
//! Everything in this crate is pure: no network, no wallet, no clock unless a
//! caller asks for one. The client crate wires these pieces to the name
//! index, the peer network and the user's wallet.

pub mod auth;
pub mod cid;
pub mod constants;
pub mod entity;
pub mod error;
pub mod mutate;
pub mod payload;
pub mod selection;
pub mod types;

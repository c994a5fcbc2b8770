//! EVM primitives for the token client.
//!
//! This crate provides:
//! - Address parsing with EIP-55 checksums and the zero-address sentinel
//! - EIP-155 legacy transaction encoding, reassembly and decoding
//! - The `sol!` contract method catalog and per-kind method tables
//! - Network settings and the network registry

pub mod address;
pub mod chains;
pub mod contracts;
pub mod error;
pub mod transaction;

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! secp256k1 key pair generation for server-created wallets.
//!
//! The private key is handed back to the caller once and never stored.

use alloy::primitives::keccak256;
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::rand_core::OsRng;

use crate::models::WalletAddress;

/// Freshly generated key pair.
#[derive(Debug, Clone)]
pub struct GeneratedKey {
    /// Hex-encoded 32-byte private key, `0x` prefixed
    pub private_key: String,
    /// Ethereum address derived from the public key
    pub address: WalletAddress,
}

/// Generate a secp256k1 keypair and derive its Ethereum address.
///
/// Ethereum addresses are derived by:
/// 1. Generate secp256k1 private key
/// 2. Get uncompressed public key (65 bytes: 0x04 || x || y)
/// 3. Take keccak256 hash of the public key without the 0x04 prefix
/// 4. Take the last 20 bytes of the hash
pub fn generate_keypair() -> GeneratedKey {
    let signing_key = SigningKey::random(&mut OsRng);

    let public_key_uncompressed = signing_key.verifying_key().to_encoded_point(false);
    let public_key_bytes = public_key_uncompressed.as_bytes();

    let hash = keccak256(&public_key_bytes[1..]);
    let address = alloy::primitives::Address::from_slice(&hash[12..]);

    GeneratedKey {
        private_key: alloy::hex::encode_prefixed(signing_key.to_bytes()),
        address: address.into(),
    }
}

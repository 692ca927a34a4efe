// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EIP-191 (`personal_sign`) signature verification and the canonical
//! transfer message.

use alloy::primitives::Signature;
use rust_decimal::Decimal;

use crate::models::WalletAddress;

/// Build the exact text a sender signs to authorize a transfer.
///
/// Addresses are lowercase and the amount is normalized, so `10`, `10.0`
/// and `10.000` all produce the same message.
pub fn transfer_message(
    from: &WalletAddress,
    to: &WalletAddress,
    amount: Decimal,
    nonce: u64,
) -> String {
    format!(
        "ETH Mock Wallet transfer\nfrom: {from}\nto: {to}\namount: {} ETH\nnonce: {nonce}",
        amount.normalize()
    )
}

/// Recover the signer of `message` and compare it with `claimed`.
///
/// Malformed signatures yield `false`.
pub fn verify_signature(message: &str, signature: &str, claimed: &WalletAddress) -> bool {
    let bytes = match alloy::hex::decode(signature.trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "Signature is not valid hex");
            return false;
        }
    };

    let signature = match Signature::from_raw(&bytes) {
        Ok(sig) => sig,
        Err(e) => {
            tracing::debug!(error = %e, "Signature has invalid encoding");
            return false;
        }
    };

    match signature.recover_address_from_msg(message.as_bytes()) {
        Ok(recovered) => recovered == claimed.to_primitive(),
        Err(e) => {
            tracing::debug!(error = %e, "Signature recovery failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::signers::{local::PrivateKeySigner, SignerSync};

    fn sign(signer: &PrivateKeySigner, message: &str) -> String {
        let sig = signer.sign_message_sync(message.as_bytes()).unwrap();
        alloy::hex::encode_prefixed(sig.as_bytes())
    }

    fn addr(n: u8) -> WalletAddress {
        format!("0x{:040x}", n).parse().unwrap()
    }

    #[test]
    fn valid_signature_verifies() {
        let signer = PrivateKeySigner::random();
        let message = "hello";
        let sig = sign(&signer, message);
        assert!(verify_signature(message, &sig, &signer.address().into()));
    }

    #[test]
    fn signature_from_other_key_is_rejected() {
        let signer = PrivateKeySigner::random();
        let other = PrivateKeySigner::random();
        let sig = sign(&other, "hello");
        assert!(!verify_signature("hello", &sig, &signer.address().into()));
    }

    #[test]
    fn signature_over_other_message_is_rejected() {
        let signer = PrivateKeySigner::random();
        let sig = sign(&signer, "hello");
        assert!(!verify_signature("goodbye", &sig, &signer.address().into()));
    }

    #[test]
    fn malformed_signatures_return_false() {
        let claimed = addr(1);
        assert!(!verify_signature("m", "", &claimed));
        assert!(!verify_signature("m", "0x_mock_signature_for_testing", &claimed));
        assert!(!verify_signature("m", "0x1234", &claimed));
        assert!(!verify_signature("m", &format!("0x{}", "00".repeat(65)), &claimed));
    }

    #[test]
    fn transfer_message_is_canonical() {
        let a = transfer_message(&addr(1), &addr(2), "10.000".parse().unwrap(), 3);
        let b = transfer_message(&addr(1), &addr(2), Decimal::from(10), 3);
        assert_eq!(a, b);
        assert!(a.contains("amount: 10 ETH"));
        assert!(a.contains("nonce: 3"));

        let c = transfer_message(&addr(1), &addr(2), Decimal::from(10), 4);
        assert_ne!(a, c);
    }
}

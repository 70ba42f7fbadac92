//! Verified address signature verification.
//!
//! Verified addresses are JWS general-serialization envelopes whose payload
//! member is the raw (unencoded) JSON of the attested address. Signatures
//! are checked against the key embedded in each protected header's inline
//! `jwk` member; there is no key resolution beyond that.
//!
//! Each verified signature also yields a cascade request so the attested
//! address can be put through the same ledger existence lookup as the plain
//! addresses.

use crate::check::ValidationCheck;
use crate::{Result, ValidatorError};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use josekit::jws::alg::ecdsa::EcdsaJwsAlgorithm;
use josekit::jws::alg::rsassa::RsassaJwsAlgorithm;
use josekit::jws::JwsVerifier;
use josekit::jwk::Jwk;
use serde_json::Value;

/// One outcome of the verified-address phase.
#[derive(Debug)]
pub enum SignatureEvent {
    /// A check to record.
    Check(ValidationCheck),
    /// A verified signature whose attested address should get a ledger
    /// existence lookup.
    Cascade {
        /// Position of the envelope in the `verifiedAddresses` array.
        index: usize,
        /// The attested payment network.
        payment_network: String,
        /// The attested environment, when declared.
        environment: Option<String>,
        /// The attested ledger address.
        address: String,
    },
}

/// Check every verified address envelope in the body.
pub fn verify_verified_addresses(pay_id: &str, body: &Value) -> Vec<SignatureEvent> {
    let mut events = Vec::new();

    let Some(envelopes) = body.get("verifiedAddresses").and_then(Value::as_array) else {
        return events;
    };

    for (index, envelope) in envelopes.iter().enumerate() {
        verify_entry(pay_id, index, envelope, &mut events);
    }

    events
}

fn verify_entry(pay_id: &str, index: usize, envelope: &Value, events: &mut Vec<SignatureEvent>) {
    if let Err(error) = try_verify_entry(pay_id, index, envelope, events) {
        let address = envelope
            .pointer("/payload")
            .and_then(Value::as_str)
            .and_then(|payload| serde_json::from_str::<Value>(payload).ok())
            .and_then(|payload| {
                payload
                    .pointer("/payIdAddress/addressDetails/address")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_default();

        events.push(SignatureEvent::Check(
            ValidationCheck::fail(
                format!("Verified address[{index}] PayID signature verification"),
                address,
            )
            .with_message(format!("Invalid signature. Error: {error}")),
        ));
    }
}

fn try_verify_entry(
    pay_id: &str,
    index: usize,
    envelope: &Value,
    events: &mut Vec<SignatureEvent>,
) -> Result<()> {
    let payload_raw = envelope
        .get("payload")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidatorError::invalid_data("payload", "not a string"))?;
    let payload: Value = serde_json::from_str(payload_raw)
        .map_err(|e| ValidatorError::invalid_data("payload", e.to_string()))?;

    if payload.get("payIdAddress").is_none() {
        events.push(SignatureEvent::Check(
            ValidationCheck::fail(format!("Verified address[{index}] PayID"), "")
                .with_message("The \"payIdAddress\" property is missing."),
        ));
        return Ok(());
    }

    // Display value only; an attested address without this member still
    // goes through the sub and signature checks.
    let address_value = payload
        .pointer("/payIdAddress/addressDetails/address")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let Some(sub) = payload.get("sub").and_then(Value::as_str) else {
        events.push(SignatureEvent::Check(
            ValidationCheck::fail(format!("Verified address[{index}] PayID"), address_value)
                .with_message("The payload \"sub\" property is missing."),
        ));
        return Ok(());
    };

    if sub != pay_id {
        events.push(SignatureEvent::Check(
            ValidationCheck::fail(format!("Verified address[{index}] PayID"), address_value)
                .with_message(format!(
                    "The payload \"sub\" value {sub} does not match {pay_id}."
                )),
        ));
    }

    let signatures = envelope
        .get("signatures")
        .and_then(Value::as_array)
        .ok_or_else(|| ValidatorError::invalid_data("signatures", "not an array"))?;

    for (signature_index, entry) in signatures.iter().enumerate() {
        let label =
            format!("Verified address[{index}] PayID signature[{signature_index}] verification");

        let protected_b64 = entry
            .get("protected")
            .and_then(Value::as_str)
            .ok_or_else(|| ValidatorError::invalid_data("protected", "not a string"))?;
        let protected_bytes = URL_SAFE_NO_PAD
            .decode(protected_b64)
            .map_err(|e| ValidatorError::invalid_data("protected", e.to_string()))?;
        let protected: Value = serde_json::from_slice(&protected_bytes)
            .map_err(|e| ValidatorError::invalid_data("protected", e.to_string()))?;

        let signature_b64 = entry
            .get("signature")
            .and_then(Value::as_str)
            .ok_or_else(|| ValidatorError::invalid_data("signature", "not a string"))?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|e| ValidatorError::invalid_data("signature", e.to_string()))?;

        let jwk = inline_jwk(&protected)?;
        let verifier = verifier_for(&protected, &jwk)?;

        // With b64:false the payload member goes into the signing input as
        // raw text, so the input is the same string either way.
        let signing_input = format!("{protected_b64}.{payload_raw}");

        match verifier.verify(signing_input.as_bytes(), &signature) {
            Ok(()) => {
                events.push(SignatureEvent::Check(
                    ValidationCheck::pass(label, address_value)
                        .with_message("Address has a valid signature."),
                ));
                events.push(SignatureEvent::Cascade {
                    index,
                    payment_network: payload
                        .pointer("/payIdAddress/paymentNetwork")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    environment: payload
                        .pointer("/payIdAddress/environment")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    address: address_value.to_string(),
                });
            }
            Err(_) => {
                events.push(SignatureEvent::Check(
                    ValidationCheck::fail(label, address_value)
                        .with_message("Signature does not match address."),
                ));
            }
        }
    }

    Ok(())
}

// Only the inline jwk protected-header member is honored. Remote key sets
// via jku are not fetched.
fn inline_jwk(protected: &Value) -> Result<Jwk> {
    let map = protected
        .get("jwk")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            ValidatorError::invalid_data("jwk", "no inline jwk in the protected header")
        })?;

    Jwk::from_map(map.clone()).map_err(|e| ValidatorError::invalid_data("jwk", e.to_string()))
}

fn verifier_for(protected: &Value, jwk: &Jwk) -> Result<Box<dyn JwsVerifier>> {
    let alg = protected
        .get("alg")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidatorError::invalid_data("alg", "missing from the protected header"))?;

    let verifier: Box<dyn JwsVerifier> = match alg {
        "ES256" => Box::new(
            EcdsaJwsAlgorithm::Es256
                .verifier_from_jwk(jwk)
                .map_err(|e| ValidatorError::invalid_data("jwk", e.to_string()))?,
        ),
        "ES256K" => Box::new(
            EcdsaJwsAlgorithm::Es256k
                .verifier_from_jwk(jwk)
                .map_err(|e| ValidatorError::invalid_data("jwk", e.to_string()))?,
        ),
        "ES512" => Box::new(
            EcdsaJwsAlgorithm::Es512
                .verifier_from_jwk(jwk)
                .map_err(|e| ValidatorError::invalid_data("jwk", e.to_string()))?,
        ),
        "RS256" => Box::new(
            RsassaJwsAlgorithm::Rs256
                .verifier_from_jwk(jwk)
                .map_err(|e| ValidatorError::invalid_data("jwk", e.to_string()))?,
        ),
        "RS512" => Box::new(
            RsassaJwsAlgorithm::Rs512
                .verifier_from_jwk(jwk)
                .map_err(|e| ValidatorError::invalid_data("jwk", e.to_string()))?,
        ),
        other => {
            return Err(ValidatorError::invalid_data(
                "alg",
                format!("unsupported algorithm {other}"),
            ))
        }
    };

    Ok(verifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::CheckCode;
    use josekit::jwk::alg::ec::EcCurve;
    use serde_json::json;

    fn signed_envelope(pay_id: &str, tamper_signature: bool) -> Value {
        let key = Jwk::generate_ec_key(EcCurve::P256).unwrap();
        let public = key.to_public_key().unwrap();
        let public_jwk: Value = serde_json::from_str(&public.to_string()).unwrap();

        let payload = json!({
            "sub": pay_id,
            "payIdAddress": {
                "paymentNetwork": "XRPL",
                "environment": "TESTNET",
                "addressDetailsType": "CryptoAddressDetails",
                "addressDetails": { "address": "rDk7FQvkQxQQNGTtfM2Fr66s7Nm3k87vdS" }
            }
        })
        .to_string();

        let protected = json!({
            "alg": "ES256",
            "b64": false,
            "crit": ["b64"],
            "typ": "JOSE+JSON",
            "jwk": public_jwk
        });
        let protected_b64 = URL_SAFE_NO_PAD.encode(protected.to_string());

        let signer = EcdsaJwsAlgorithm::Es256.signer_from_jwk(&key).unwrap();
        let signing_input = format!("{protected_b64}.{payload}");
        let mut signature = signer.sign(signing_input.as_bytes()).unwrap();
        if tamper_signature {
            signature[0] ^= 0xff;
        }

        json!({
            "payload": payload,
            "signatures": [{
                "protected": protected_b64,
                "signature": URL_SAFE_NO_PAD.encode(signature)
            }]
        })
    }

    fn body_with(envelope: Value) -> Value {
        json!({ "addresses": [], "verifiedAddresses": [envelope] })
    }

    #[test]
    fn test_valid_signature_passes_and_cascades() {
        let body = body_with(signed_envelope("alice$example.com", false));
        let events = verify_verified_addresses("alice$example.com", &body);
        assert_eq!(events.len(), 2);

        match &events[0] {
            SignatureEvent::Check(check) => {
                assert_eq!(check.code, CheckCode::Pass);
                assert_eq!(
                    check.label,
                    "Verified address[0] PayID signature[0] verification"
                );
                assert_eq!(check.value, "rDk7FQvkQxQQNGTtfM2Fr66s7Nm3k87vdS");
            }
            other => panic!("expected a check, got {other:?}"),
        }

        match &events[1] {
            SignatureEvent::Cascade {
                index,
                payment_network,
                environment,
                address,
            } => {
                assert_eq!(*index, 0);
                assert_eq!(payment_network, "XRPL");
                assert_eq!(environment.as_deref(), Some("TESTNET"));
                assert_eq!(address, "rDk7FQvkQxQQNGTtfM2Fr66s7Nm3k87vdS");
            }
            other => panic!("expected a cascade, got {other:?}"),
        }
    }

    #[test]
    fn test_tampered_signature_fails() {
        let body = body_with(signed_envelope("alice$example.com", true));
        let events = verify_verified_addresses("alice$example.com", &body);
        assert_eq!(events.len(), 1);

        match &events[0] {
            SignatureEvent::Check(check) => {
                assert_eq!(check.code, CheckCode::Fail);
            }
            other => panic!("expected a check, got {other:?}"),
        }
    }

    #[test]
    fn test_sub_mismatch_fails_then_still_verifies_signatures() {
        let body = body_with(signed_envelope("bob$example.com", false));
        let events = verify_verified_addresses("alice$example.com", &body);

        match &events[0] {
            SignatureEvent::Check(check) => {
                assert_eq!(check.code, CheckCode::Fail);
                assert_eq!(check.label, "Verified address[0] PayID");
            }
            other => panic!("expected a check, got {other:?}"),
        }
        // The signature itself is still valid against its own payload.
        assert!(matches!(
            &events[1],
            SignatureEvent::Check(check) if check.code == CheckCode::Pass
        ));
    }

    #[test]
    fn test_missing_pay_id_address() {
        let payload = json!({ "sub": "alice$example.com" }).to_string();
        let body = body_with(json!({ "payload": payload, "signatures": [] }));
        let events = verify_verified_addresses("alice$example.com", &body);
        assert_eq!(events.len(), 1);

        match &events[0] {
            SignatureEvent::Check(check) => {
                assert_eq!(check.code, CheckCode::Fail);
                assert_eq!(check.label, "Verified address[0] PayID");
            }
            other => panic!("expected a check, got {other:?}"),
        }
    }

    #[test]
    fn test_address_without_details_is_not_a_missing_pay_id_address() {
        let payload = json!({
            "payIdAddress": { "paymentNetwork": "ACH" }
        })
        .to_string();
        let body = body_with(json!({ "payload": payload, "signatures": [] }));
        let events = verify_verified_addresses("alice$example.com", &body);
        assert_eq!(events.len(), 1);

        match &events[0] {
            SignatureEvent::Check(check) => {
                assert_eq!(check.code, CheckCode::Fail);
                assert_eq!(check.value, "");
                assert_eq!(
                    check.message,
                    crate::check::CheckMessage::Text(
                        "The payload \"sub\" property is missing.".to_string()
                    )
                );
            }
            other => panic!("expected a check, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_sub() {
        let payload = json!({
            "payIdAddress": {
                "addressDetails": { "address": "rDk7FQvkQxQQNGTtfM2Fr66s7Nm3k87vdS" }
            }
        })
        .to_string();
        let body = body_with(json!({ "payload": payload, "signatures": [] }));
        let events = verify_verified_addresses("alice$example.com", &body);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_garbage_payload_reports_invalid_signature() {
        let body = body_with(json!({ "payload": "not json", "signatures": [] }));
        let events = verify_verified_addresses("alice$example.com", &body);
        assert_eq!(events.len(), 1);

        match &events[0] {
            SignatureEvent::Check(check) => {
                assert_eq!(check.code, CheckCode::Fail);
                assert_eq!(
                    check.label,
                    "Verified address[0] PayID signature verification"
                );
            }
            other => panic!("expected a check, got {other:?}"),
        }
    }
}

//! JSON Schema validation of the discovery response body.
//!
//! The body is checked top down: the root payload schema first, then each
//! address entry with its discriminated details schema, then each verified
//! address envelope and its string-encoded payload. Violations are
//! accumulated as human-readable strings prefixed with the JSON pointer of
//! the offending subtree so one pass can report every problem at once.

use crate::check::ValidationCheck;
use jsonschema::JSONSchema;
use lazy_static::lazy_static;
use serde_json::Value;

lazy_static! {
    static ref PAYMENT_INFORMATION: JSONSchema =
        compile(include_str!("../schemas/payment-information.json"));
    static ref ADDRESS: JSONSchema = compile(include_str!("../schemas/address.json"));
    static ref ACH_ADDRESS_DETAILS: JSONSchema =
        compile(include_str!("../schemas/ach-address-details.json"));
    static ref CRYPTO_ADDRESS_DETAILS: JSONSchema =
        compile(include_str!("../schemas/crypto-address-details.json"));
    static ref VERIFIED_ADDRESS: JSONSchema =
        compile(include_str!("../schemas/verified-address.json"));
    static ref VERIFIED_ADDRESS_PAYLOAD: JSONSchema =
        compile(include_str!("../schemas/verified-address-payload.json"));
}

fn compile(raw: &str) -> JSONSchema {
    let value: Value = serde_json::from_str(raw).expect("bundled schema must be valid JSON");
    JSONSchema::compile(&value).expect("bundled schema must compile")
}

/// A crypto address discovered during the schema walk, queued for a live
/// ledger existence lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CryptoLookup {
    /// Position of the address in the `addresses` array.
    pub index: usize,
    /// The declared payment network.
    pub payment_network: String,
    /// The declared environment.
    pub environment: String,
    /// The on-ledger address.
    pub address: String,
}

/// Result of validating one response body.
#[derive(Clone, Debug, Default)]
pub struct SchemaOutcome {
    /// Every schema violation found, pointer-prefixed.
    pub violations: Vec<String>,
    /// Crypto addresses eligible for a ledger lookup.
    pub crypto_lookups: Vec<CryptoLookup>,
}

impl SchemaOutcome {
    /// Whether the body passed every schema.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Render the outcome as the body-validity check. `body` is the
    /// display form of the response body carried in the check value.
    pub fn into_check(self, body: String) -> ValidationCheck {
        const LABEL: &str = "Response Body JSON";
        if self.violations.is_empty() {
            ValidationCheck::pass(LABEL, body).with_message("The response body is valid JSON.")
        } else {
            ValidationCheck::fail(LABEL, body).with_message(self.violations)
        }
    }
}

/// Walk a parsed response body and validate every level of it.
pub fn validate_body(body: &Value) -> SchemaOutcome {
    let mut outcome = SchemaOutcome::default();

    apply(&PAYMENT_INFORMATION, body, "", &mut outcome.violations);

    if let Some(addresses) = body.get("addresses").and_then(Value::as_array) {
        for (index, address) in addresses.iter().enumerate() {
            let pointer = format!("/addresses/{index}");
            apply(&ADDRESS, address, &pointer, &mut outcome.violations);
            validate_address_details(address, &pointer, &mut outcome.violations);
            if let Some(lookup) = crypto_lookup(index, address) {
                outcome.crypto_lookups.push(lookup);
            }
        }
    }

    if let Some(verified) = body.get("verifiedAddresses").and_then(Value::as_array) {
        for (index, envelope) in verified.iter().enumerate() {
            let pointer = format!("/verifiedAddresses/{index}");
            apply(&VERIFIED_ADDRESS, envelope, &pointer, &mut outcome.violations);

            let Some(payload) = envelope.get("payload").and_then(Value::as_str) else {
                continue;
            };
            let Ok(payload) = serde_json::from_str::<Value>(payload) else {
                // An unparseable payload is surfaced by the signature phase.
                continue;
            };

            let pointer = format!("{pointer}/payload");
            apply(
                &VERIFIED_ADDRESS_PAYLOAD,
                &payload,
                &pointer,
                &mut outcome.violations,
            );

            // Attested addresses are only held to the address schema; the
            // details sub-schemas apply to the plain addresses array alone.
            if let Some(address) = payload.get("payIdAddress") {
                let pointer = format!("{pointer}/payIdAddress");
                apply(&ADDRESS, address, &pointer, &mut outcome.violations);
            }
        }
    }

    outcome
}

// Descends into addressDetails through the addressDetailsType discriminator.
// An unknown discriminator is already reported by the address schema's enum,
// so it is skipped here rather than reported twice.
fn validate_address_details(address: &Value, pointer: &str, violations: &mut Vec<String>) {
    let (Some(kind), Some(details)) = (
        address.get("addressDetailsType").and_then(Value::as_str),
        address.get("addressDetails"),
    ) else {
        return;
    };

    let schema = match kind {
        "AchAddressDetails" => &*ACH_ADDRESS_DETAILS,
        "CryptoAddressDetails" => &*CRYPTO_ADDRESS_DETAILS,
        _ => return,
    };

    apply(
        schema,
        details,
        &format!("{pointer}/addressDetails"),
        violations,
    );
}

// A ledger lookup needs the network, the environment, and the address all
// present on the entry. Entries missing any of the three are not queued.
fn crypto_lookup(index: usize, address: &Value) -> Option<CryptoLookup> {
    if address.get("addressDetailsType").and_then(Value::as_str) != Some("CryptoAddressDetails") {
        return None;
    }

    Some(CryptoLookup {
        index,
        payment_network: address
            .get("paymentNetwork")
            .and_then(Value::as_str)?
            .to_string(),
        environment: address
            .get("environment")
            .and_then(Value::as_str)?
            .to_string(),
        address: address
            .pointer("/addressDetails/address")
            .and_then(Value::as_str)?
            .to_string(),
    })
}

fn apply(schema: &JSONSchema, instance: &Value, pointer: &str, violations: &mut Vec<String>) {
    if let Err(errors) = schema.validate(instance) {
        for error in errors {
            violations.push(format!("[{pointer}{}] {error}", error.instance_path));
        }
    }
}

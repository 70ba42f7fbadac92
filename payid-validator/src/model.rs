//! Typed model of a PayID discovery response.
//!
//! Validation itself walks the raw JSON tree (a non-conformant body must
//! still be checkable); these types exist for building payloads — fixtures,
//! signing, the admin probe body — and as the reference shape of the
//! protocol.

use serde::{Deserialize, Serialize};

/// Root payload returned by a PayID discovery endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInformation {
    /// The PayID the payload describes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_id: Option<String>,
    /// Plain payment addresses.
    pub addresses: Vec<Address>,
    /// Signature-attested addresses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verified_addresses: Vec<VerifiedAddress>,
}

/// One payment address entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Payment network identifier, e.g. `XRPL` or `ACH`.
    pub payment_network: String,
    /// Network environment, e.g. `MAINNET`; absent for networks without
    /// environments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// The discriminated address details.
    #[serde(flatten)]
    pub details: AddressDetails,
}

/// Address details, discriminated by the `addressDetailsType` member.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "addressDetailsType", content = "addressDetails")]
pub enum AddressDetails {
    /// ACH bank account details.
    #[serde(rename = "AchAddressDetails")]
    Ach(AchAddressDetails),
    /// Crypto-ledger address details.
    #[serde(rename = "CryptoAddressDetails")]
    Crypto(CryptoAddressDetails),
}

/// Bank account details for an ACH address.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchAddressDetails {
    /// Bank account number.
    pub account_number: String,
    /// Bank routing number.
    pub routing_number: String,
}

/// On-ledger details for a crypto address.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoAddressDetails {
    /// The ledger address.
    pub address: String,
    /// Destination tag, where the ledger uses one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// A verified address: a JWS general-serialization envelope whose payload
/// is a string-encoded [`VerifiedAddressPayload`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerifiedAddress {
    /// String-encoded JSON payload covered by the signatures.
    pub payload: String,
    /// One or more signatures over the payload.
    pub signatures: Vec<SignatureEntry>,
}

/// One signature of a JWS general serialization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignatureEntry {
    /// Base64url-encoded protected header. Carries the inline `jwk`.
    pub protected: String,
    /// Unprotected header members, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<serde_json::Value>,
    /// Base64url-encoded signature bytes.
    pub signature: String,
}

/// The decoded payload of a verified address envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedAddressPayload {
    /// The PayID the attestation is for; must match the queried PayID.
    pub sub: String,
    /// The attested address.
    pub pay_id_address: Address,
}

//! Network consistency between the Accept header and the response body.
//!
//! When a specific network was requested, every address in the body must
//! declare that network, and an environment only when the request carried
//! one. Requests for all networks skip the comparison entirely.

use crate::check::ValidationCheck;
use crate::networks::{parse_accept_media_type, NetworkType};
use serde_json::Value;

/// Compare every address in the body against the requested network.
pub fn check_network_consistency(network: NetworkType, body: &Value) -> ValidationCheck {
    const LABEL: &str = "Response Body Addresses Match Requested Headers";

    let accept = network.accept_header();
    let Some(media) = parse_accept_media_type(accept) else {
        return ValidationCheck::fail(LABEL, accept)
            .with_message("The requested network type cannot be found.");
    };

    let mut errors = Vec::new();

    if network != NetworkType::All {
        let addresses = body
            .get("addresses")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        for address in &addresses {
            let payment_network = address
                .get("paymentNetwork")
                .and_then(Value::as_str)
                .unwrap_or("");
            if !payment_network.eq_ignore_ascii_case(&media.network) {
                errors.push("The paymentNetwork does not match with request header.".to_string());
            }

            if let Some(environment) = address.get("environment").and_then(Value::as_str) {
                let matches = media
                    .environment
                    .as_deref()
                    .is_some_and(|wanted| wanted.eq_ignore_ascii_case(environment));
                if !matches {
                    errors.push("The environment does not match with request header.".to_string());
                }
            }
        }
    }

    if errors.is_empty() {
        ValidationCheck::pass(LABEL, accept)
    } else {
        ValidationCheck::fail(LABEL, accept).with_message(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{CheckCode, CheckMessage};
    use serde_json::json;

    fn xrpl_mainnet_body() -> Value {
        json!({
            "addresses": [{
                "paymentNetwork": "XRPL",
                "environment": "MAINNET",
                "addressDetailsType": "CryptoAddressDetails",
                "addressDetails": { "address": "rw2ciyaNshpHe7bCHo4bRWq6pqqynnWKQg" }
            }]
        })
    }

    #[test]
    fn test_matching_network_and_environment() {
        let check = check_network_consistency(NetworkType::XrplMainnet, &xrpl_mainnet_body());
        assert_eq!(check.code, CheckCode::Pass);
        assert_eq!(check.value, "application/xrpl-mainnet+json");
    }

    #[test]
    fn test_all_networks_skips_comparison() {
        let body = json!({
            "addresses": [{ "paymentNetwork": "ACH" }, { "paymentNetwork": "BTC" }]
        });
        let check = check_network_consistency(NetworkType::All, &body);
        assert_eq!(check.code, CheckCode::Pass);
    }

    #[test]
    fn test_network_mismatch() {
        let check = check_network_consistency(NetworkType::BtcMainnet, &xrpl_mainnet_body());
        assert_eq!(check.code, CheckCode::Fail);
        assert_eq!(
            check.message,
            CheckMessage::List(vec![
                "The paymentNetwork does not match with request header.".to_string()
            ])
        );
    }

    #[test]
    fn test_environment_mismatch() {
        let check = check_network_consistency(NetworkType::XrplTestnet, &xrpl_mainnet_body());
        assert_eq!(check.code, CheckCode::Fail);
        assert_eq!(
            check.message,
            CheckMessage::List(vec![
                "The environment does not match with request header.".to_string()
            ])
        );
    }

    #[test]
    fn test_missing_payment_network_counts_as_mismatch() {
        let body = json!({ "addresses": [{ "environment": "MAINNET" }] });
        let check = check_network_consistency(NetworkType::XrplMainnet, &body);
        assert_eq!(check.code, CheckCode::Fail);
    }

    #[test]
    fn test_declared_environment_without_requested_one() {
        let body = json!({
            "addresses": [{ "paymentNetwork": "ACH", "environment": "SANDBOX" }]
        });
        let check = check_network_consistency(NetworkType::Ach, &body);
        assert_eq!(check.code, CheckCode::Fail);
    }
}

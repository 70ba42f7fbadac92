use crate::model::{AchAddressDetails, Address, AddressDetails, PaymentInformation};
use serde_json::Value;

/// A conformant discovery payload for `alice$127.0.0.1` with one ACH
/// address, the shape most tests start from.
pub fn sample_payment_information() -> Value {
    let info = PaymentInformation {
        pay_id: Some("alice$127.0.0.1".to_string()),
        addresses: vec![Address {
            payment_network: "ACH".to_string(),
            environment: None,
            details: AddressDetails::Ach(AchAddressDetails {
                account_number: "000123456789".to_string(),
                routing_number: "123456789".to_string(),
            }),
        }],
        verified_addresses: Vec::new(),
    };
    serde_json::to_value(info).expect("fixture payload serializes")
}

/// Which violations to inject into an otherwise conformant response.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResponseMutations {
    /// Send `text/html` instead of a JSON content type.
    pub invalid_content_type_header: bool,
    /// Omit every CORS header.
    pub missing_cors_headers: bool,
    /// Send CORS headers with wrong values.
    pub invalid_cors_headers: bool,
    /// Send `max-age=60` instead of `no-store`.
    pub invalid_cache_control_header: bool,
    /// Truncate the serialized body so it no longer parses.
    pub malformed_json_body: bool,
    /// Set every address's `paymentNetwork` to a bogus value.
    pub wrong_network_property: bool,
    /// Remove `paymentNetwork` from every address.
    pub missing_network_property: bool,
    /// Remove the root `payId` member.
    pub missing_pay_id_root: bool,
    /// Point the root `payId` at a different identifier.
    pub mismatched_pay_id_root: bool,
}

/// Header/body pair ready to be served by a test server.
#[derive(Clone, Debug)]
pub struct MutatedResponse {
    /// Response headers, in order.
    pub headers: Vec<(String, String)>,
    /// Response body text.
    pub body: String,
}

impl ResponseMutations {
    /// Apply the selected mutations to the given payload.
    pub fn apply(&self, payload: &Value) -> MutatedResponse {
        let mut headers = Vec::new();

        if self.invalid_content_type_header {
            headers.push(("Content-Type".to_string(), "text/html".to_string()));
        } else {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

        if !self.missing_cors_headers {
            if self.invalid_cors_headers {
                headers.push((
                    "Access-Control-Allow-Headers".to_string(),
                    "PayID-Version-Bar".to_string(),
                ));
                headers.push((
                    "Access-Control-Allow-Methods".to_string(),
                    "POST".to_string(),
                ));
                headers.push((
                    "Access-Control-Allow-Origin".to_string(),
                    "foo.com".to_string(),
                ));
                headers.push((
                    "Access-Control-Expose-Headers".to_string(),
                    "PayID-Server-Version-Bar, PayID-Version-Bar".to_string(),
                ));
            } else {
                // The canonical baseline omits POST from the methods list;
                // a clean generated response still trips that one check.
                headers.push((
                    "Access-Control-Allow-Headers".to_string(),
                    "PayID-Version".to_string(),
                ));
                headers.push((
                    "Access-Control-Allow-Methods".to_string(),
                    "GET, OPTIONS".to_string(),
                ));
                headers.push(("Access-Control-Allow-Origin".to_string(), "*".to_string()));
                headers.push((
                    "Access-Control-Expose-Headers".to_string(),
                    "PayID-Server-Version, PayID-Version".to_string(),
                ));
            }
        }

        if self.invalid_cache_control_header {
            headers.push(("Cache-Control".to_string(), "max-age=60".to_string()));
        } else {
            headers.push(("Cache-Control".to_string(), "no-store".to_string()));
        }

        headers.push(("PayID-Server-Version".to_string(), "1.0".to_string()));

        let mut body = payload.clone();

        // Toggle precedence: the payId removal beats the mismatch rewrite,
        // and the wrong-network rewrite beats the network removal.
        if self.missing_pay_id_root {
            if let Some(root) = body.as_object_mut() {
                root.remove("payId");
            }
        } else if self.mismatched_pay_id_root {
            body["payId"] = Value::String("mismatch$payidvalidator.com".to_string());
        }
        if self.wrong_network_property || self.missing_network_property {
            if let Some(addresses) = body.get_mut("addresses").and_then(Value::as_array_mut) {
                for address in addresses {
                    let Some(address) = address.as_object_mut() else {
                        continue;
                    };
                    if self.wrong_network_property {
                        address.insert(
                            "paymentNetwork".to_string(),
                            Value::String("foobar".to_string()),
                        );
                    } else {
                        address.remove("paymentNetwork");
                    }
                }
            }
        }

        let mut body = body.to_string();
        if self.malformed_json_body {
            body.remove(0);
        }

        MutatedResponse { headers, body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_header_set() {
        let response = ResponseMutations::default().apply(&sample_payment_information());
        let expected = [
            ("Content-Type", "application/json"),
            ("Access-Control-Allow-Headers", "PayID-Version"),
            ("Access-Control-Allow-Methods", "GET, OPTIONS"),
            ("Access-Control-Allow-Origin", "*"),
            (
                "Access-Control-Expose-Headers",
                "PayID-Server-Version, PayID-Version",
            ),
            ("Cache-Control", "no-store"),
            ("PayID-Server-Version", "1.0"),
        ];
        assert_eq!(response.headers.len(), expected.len());
        for (name, value) in expected {
            assert!(
                response
                    .headers
                    .iter()
                    .any(|(n, v)| n == name && v == value),
                "missing {name}: {value}"
            );
        }
        // PayID-Version is only ever advertised, never sent.
        assert!(!response.headers.iter().any(|(n, _)| n == "PayID-Version"));
        assert!(serde_json::from_str::<Value>(&response.body).is_ok());
    }

    #[test]
    fn test_combined_toggle_precedence() {
        let mutations = ResponseMutations {
            missing_pay_id_root: true,
            mismatched_pay_id_root: true,
            wrong_network_property: true,
            missing_network_property: true,
            ..Default::default()
        };
        let body: Value =
            serde_json::from_str(&mutations.apply(&sample_payment_information()).body).unwrap();
        assert!(body.get("payId").is_none());
        assert_eq!(body["addresses"][0]["paymentNetwork"], "foobar");
    }

    #[test]
    fn test_missing_cors_drops_all_four_headers() {
        let mutations = ResponseMutations {
            missing_cors_headers: true,
            ..Default::default()
        };
        let response = mutations.apply(&sample_payment_information());
        assert!(!response
            .headers
            .iter()
            .any(|(name, _)| name.starts_with("Access-Control")));
    }

    #[test]
    fn test_malformed_body_does_not_parse() {
        let mutations = ResponseMutations {
            malformed_json_body: true,
            ..Default::default()
        };
        let response = mutations.apply(&sample_payment_information());
        assert!(serde_json::from_str::<Value>(&response.body).is_err());
    }

    #[test]
    fn test_network_property_mutations() {
        let wrong = ResponseMutations {
            wrong_network_property: true,
            ..Default::default()
        };
        let body: Value =
            serde_json::from_str(&wrong.apply(&sample_payment_information()).body).unwrap();
        assert_eq!(body["addresses"][0]["paymentNetwork"], "foobar");

        let missing = ResponseMutations {
            missing_network_property: true,
            ..Default::default()
        };
        let body: Value =
            serde_json::from_str(&missing.apply(&sample_payment_information()).body).unwrap();
        assert!(body["addresses"][0].get("paymentNetwork").is_none());
    }
}

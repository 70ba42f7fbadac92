//! Probe for a publicly exposed admin API.
//!
//! Reference server deployments ship a user-management API on a separate
//! port. It must never be reachable from the open internet, so the probe
//! attempts a user-creation POST against it and flags any 200-level answer.

use crate::check::ValidationCheck;
use crate::http::{PAYID_VERSION, PAYID_VERSION_HEADER, USER_AGENT};
use crate::{Result, ValidatorError};
use serde_json::json;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const TOTAL_TIMEOUT: Duration = Duration::from_secs(5);

const LABEL: &str = "Admin API Exposed Check";

/// Issues the admin exposure probes.
pub struct AdminExposureProbe {
    client: reqwest::Client,
}

impl AdminExposureProbe {
    /// Create the probe client.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(TOTAL_TIMEOUT)
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| ValidatorError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Probe the admin user-creation endpoint on the given domain. A
    /// connection failure or error status is the desired outcome and is
    /// not reported individually.
    pub async fn probe(&self, scheme: &str, domain: &str, port: u16) -> Vec<ValidationCheck> {
        let mut checks = Vec::new();

        let hostnames = vec![format!("{scheme}://{domain}:{port}/users")];
        let body = json!({
            "payId": "alice$127.0.0.1",
            "addresses": [{
                "paymentNetwork": "XRPL",
                "environment": "TESTNET",
                "details": {
                    "address": "rDk7FQvkQxQQNGTtfM2Fr66s7Nm3k87vdS",
                    "tag": "123"
                }
            }]
        });

        for hostname in hostnames {
            let response = self
                .client
                .post(&hostname)
                .header(PAYID_VERSION_HEADER, PAYID_VERSION)
                .json(&body)
                .send()
                .await;

            if let Ok(response) = response {
                if response.status().is_success() {
                    checks.push(ValidationCheck::fail(LABEL, hostname).with_message(
                        "A POST request was made to this endpoint and a 200-level HTTP \
                         response code was returned.",
                    ));
                }
            }
        }

        if checks.is_empty() {
            checks.push(ValidationCheck::pass(LABEL, "").with_message(
                "The admin API to create users was checked and not found to be publicly exposed.",
            ));
        }

        checks
    }
}

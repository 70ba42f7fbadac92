//! One end-to-end validation run.
//!
//! A session is built from the raw user inputs, preflight-checked, run
//! once, and then queried for its ordered check list and score. Checks are
//! recorded in a fixed order: response time, status code, the admin
//! exposure probe, then (for a 200 answer) the header checks, the body
//! schema walk with its ledger lookups, the verified-address signature
//! phase, and finally network consistency.

use crate::admin::AdminExposureProbe;
use crate::check::{aggregate_score, ValidationCheck};
use crate::headers;
use crate::http::{FetchedResponse, RequestOrchestrator};
use crate::ledger::LedgerClient;
use crate::networks::NetworkType;
use crate::payid::PayId;
use crate::signature::{self, SignatureEvent};
use crate::{consistency, schema};
use crate::{Result, ValidatorError};
use serde_json::Value;

/// Request-shape knobs for a session.
///
/// Production validation uses the defaults; the scheme and ports exist so
/// a server under test can live on a local loopback address.
#[derive(Clone, Debug)]
pub struct ValidatorConfig {
    /// URL scheme for the discovery request.
    pub scheme: String,
    /// Explicit discovery port, when the server is not on the default one.
    pub port: Option<u16>,
    /// Port probed for an exposed admin API.
    pub admin_port: u16,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            port: None,
            admin_port: 8081,
        }
    }
}

impl ValidatorConfig {
    /// Override the discovery URL scheme.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Override the discovery port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Override the admin probe port.
    pub fn with_admin_port(mut self, port: u16) -> Self {
        self.admin_port = port;
        self
    }
}

/// A single validation run against one PayID.
pub struct ValidationSession {
    pay_id_raw: String,
    network_raw: String,
    expected_status: u16,
    config: ValidatorConfig,
    debug_mode: bool,
    etherscan_api_key: Option<String>,
    blockchain_api_key: Option<String>,

    pay_id: Option<PayId>,
    network: Option<NetworkType>,
    errors: Vec<String>,
    checks: Vec<ValidationCheck>,
    response: Option<FetchedResponse>,
    fail_error: Option<String>,
    has_occurred: bool,
    preflight_done: bool,
}

impl ValidationSession {
    /// Build a session from raw user inputs. Nothing is validated until
    /// [`has_preflight_errors`](Self::has_preflight_errors) runs.
    pub fn new(pay_id: impl Into<String>, network: impl Into<String>, expected_status: u16) -> Self {
        Self {
            pay_id_raw: pay_id.into(),
            network_raw: network.into(),
            expected_status,
            config: ValidatorConfig::default(),
            debug_mode: false,
            etherscan_api_key: None,
            blockchain_api_key: None,
            pay_id: None,
            network: None,
            errors: Vec::new(),
            checks: Vec::new(),
            response: None,
            fail_error: None,
            has_occurred: false,
            preflight_done: false,
        }
    }

    /// Replace the request-shape configuration.
    pub fn with_config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Log each recorded check as it happens.
    pub fn with_debug_mode(mut self, debug: bool) -> Self {
        self.debug_mode = debug;
        self
    }

    /// Attach an Etherscan API key to ETH ledger lookups.
    pub fn with_etherscan_api_key(mut self, key: impl Into<String>) -> Self {
        self.etherscan_api_key = Some(key.into());
        self
    }

    /// Attach a blockchain.info API code to BTC ledger lookups.
    pub fn with_blockchain_api_key(mut self, key: impl Into<String>) -> Self {
        self.blockchain_api_key = Some(key.into());
        self
    }

    /// Validate the raw inputs. Returns true when any input is unusable;
    /// the individual messages are in
    /// [`preflight_errors`](Self::preflight_errors).
    pub fn has_preflight_errors(&mut self) -> bool {
        if !self.preflight_done {
            self.preflight_done = true;

            match PayId::parse(&self.pay_id_raw) {
                Ok(pay_id) => self.pay_id = Some(pay_id),
                Err(_) => self.errors.push(format!(
                    "The PayID you specified ({}) is not a valid format for a PayID.",
                    self.pay_id_raw
                )),
            }

            match NetworkType::from_id(&self.network_raw) {
                Some(network) => self.network = Some(network),
                None => self
                    .errors
                    .push("The Network provided is not valid.".to_string()),
            }

            if ![200, 404].contains(&self.expected_status) {
                self.errors
                    .push("The Expected Response type provided is not valid.".to_string());
            }
        }

        !self.errors.is_empty()
    }

    /// Input validation messages collected by the preflight.
    pub fn preflight_errors(&self) -> &[String] {
        &self.errors
    }

    /// The discovery URL this session will request, once the preflight has
    /// accepted the PayID.
    pub fn request_url(&self) -> Option<String> {
        self.pay_id
            .as_ref()
            .map(|pay_id| pay_id.request_url(&self.config.scheme, self.config.port))
    }

    /// Run the validation. On a transport failure the failure message is
    /// retained and the checks recorded so far stay queryable.
    pub async fn validate(&mut self) -> Result<()> {
        let (pay_id, network) = match (&self.pay_id, self.network) {
            (Some(pay_id), Some(network)) => (pay_id.clone(), network),
            _ => {
                return Err(ValidatorError::Internal(
                    "validate called without a passing preflight".to_string(),
                ))
            }
        };

        let url = pay_id.request_url(&self.config.scheme, self.config.port);
        if self.debug_mode {
            tracing::info!(url = %url, accept = network.accept_header(), "validation started");
        }

        let orchestrator = RequestOrchestrator::new()?;
        let response = match orchestrator.fetch(&url, network.accept_header()).await {
            Ok(response) => response,
            Err(error) => {
                tracing::error!(url = %url, %error, "discovery request failed");
                self.fail_error = Some(error.to_string());
                self.has_occurred = true;
                return Err(error);
            }
        };

        self.record(headers::check_response_time(response.elapsed));
        self.record(headers::check_status_code(
            response.status,
            self.expected_status,
        ));

        let probe = AdminExposureProbe::new()?;
        for check in probe
            .probe(&self.config.scheme, pay_id.domain(), self.config.admin_port)
            .await
        {
            self.record(check);
        }

        if response.status == 200 {
            self.record(headers::check_allow_origin(&response));

            let mut options_via_preflight = false;
            if headers::allow_methods_needs_preflight(&response) {
                if let Ok(preflight) = orchestrator
                    .options_preflight(&url, network.accept_header())
                    .await
                {
                    options_via_preflight = headers::preflight_contains_options(&preflight);
                }
            }
            self.record(headers::check_allow_methods(&response, options_via_preflight));
            self.record(headers::check_allow_headers(&response));
            self.record(headers::check_expose_headers(&response));
            self.record(headers::check_cache_control(&response));
            self.record(headers::check_content_type(&response));

            match serde_json::from_str::<Value>(&response.body) {
                Ok(body) => {
                    let outcome = schema::validate_body(&body);

                    let mut ledger = LedgerClient::new()?;
                    if let Some(key) = &self.etherscan_api_key {
                        ledger = ledger.with_etherscan_api_key(key);
                    }
                    if let Some(key) = &self.blockchain_api_key {
                        ledger = ledger.with_blockchain_api_key(key);
                    }

                    for lookup in &outcome.crypto_lookups {
                        let check = ledger
                            .verify_address(
                                lookup.index,
                                &lookup.payment_network,
                                Some(&lookup.environment),
                                &lookup.address,
                            )
                            .await;
                        if let Some(check) = check {
                            self.record(check);
                        }
                    }

                    self.record(outcome.into_check(prettify_body(&body)));

                    for event in signature::verify_verified_addresses(pay_id.as_str(), &body) {
                        match event {
                            SignatureEvent::Check(check) => self.record(check),
                            SignatureEvent::Cascade {
                                index,
                                payment_network,
                                environment,
                                address,
                            } => {
                                let check = ledger
                                    .verify_address(
                                        index,
                                        &payment_network,
                                        environment.as_deref(),
                                        &address,
                                    )
                                    .await;
                                if let Some(check) = check {
                                    self.record(check);
                                }
                            }
                        }
                    }

                    self.record(consistency::check_network_consistency(network, &body));
                }
                Err(_) => {
                    // An unparseable body leaves nothing for the signature
                    // and consistency phases to examine.
                    self.record(
                        ValidationCheck::fail("Response Body JSON", response.body.clone())
                            .with_message("The response body is NOT valid JSON."),
                    );
                }
            }
        }

        self.response = Some(response);
        self.has_occurred = true;
        Ok(())
    }

    fn record(&mut self, check: ValidationCheck) {
        if self.debug_mode {
            tracing::info!(
                label = %check.label,
                code = %check.code,
                value = %check.value,
                "check recorded"
            );
        }
        self.checks.push(check);
    }

    /// The recorded checks, in protocol order.
    pub fn checks(&self) -> &[ValidationCheck] {
        &self.checks
    }

    /// Whether [`validate`](Self::validate) has run.
    pub fn has_validation_occurred(&self) -> bool {
        self.has_occurred
    }

    /// The transport failure message, when the discovery request never
    /// produced a response.
    pub fn fail_error(&self) -> Option<&str> {
        self.fail_error.as_deref()
    }

    /// Headers of the discovery response, once captured.
    pub fn response_headers(&self) -> Option<&reqwest::header::HeaderMap> {
        self.response.as_ref().map(|response| &response.headers)
    }

    /// The aggregate score of the run, or 0 before validation.
    pub fn score(&self) -> f64 {
        if !self.has_occurred {
            return 0.0;
        }
        let score = aggregate_score(&self.checks);
        if self.debug_mode {
            tracing::info!(score, "validation finished");
        }
        score
    }
}

// Display form of the body: pretty-printed, with each verified address
// payload string decoded in place so the attested addresses are readable.
fn prettify_body(body: &Value) -> String {
    let mut display = body.clone();

    if let Some(envelopes) = display
        .get_mut("verifiedAddresses")
        .and_then(Value::as_array_mut)
    {
        for envelope in envelopes {
            let Some(decoded) = envelope
                .get("payload")
                .and_then(Value::as_str)
                .and_then(|payload| serde_json::from_str::<Value>(payload).ok())
            else {
                continue;
            };
            envelope["payload"] = decoded;
        }
    }

    serde_json::to_string_pretty(&display).unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_preflight_accepts_valid_inputs() {
        let mut session = ValidationSession::new("alice$example.com", "xrpl-mainnet", 200);
        assert!(!session.has_preflight_errors());
        assert_eq!(
            session.request_url().as_deref(),
            Some("https://example.com/alice")
        );
    }

    #[test]
    fn test_preflight_collects_every_error() {
        let mut session = ValidationSession::new("not a payid", "moonnet", 302);
        assert!(session.has_preflight_errors());
        assert_eq!(session.preflight_errors().len(), 3);
        assert!(session.preflight_errors()[0].contains("not a payid"));
    }

    #[test]
    fn test_preflight_runs_once() {
        let mut session = ValidationSession::new("bad", "bad", 500);
        assert!(session.has_preflight_errors());
        assert!(session.has_preflight_errors());
        assert_eq!(session.preflight_errors().len(), 3);
    }

    #[test]
    fn test_expected_status_accepts_404() {
        let mut session = ValidationSession::new("alice$example.com", "all", 404);
        assert!(!session.has_preflight_errors());
    }

    #[test]
    fn test_config_shapes_request_url() {
        let config = ValidatorConfig::default()
            .with_scheme("http")
            .with_port(8080);
        let mut session =
            ValidationSession::new("alice$127.0.0.1", "all", 200).with_config(config);
        assert!(!session.has_preflight_errors());
        assert_eq!(
            session.request_url().as_deref(),
            Some("http://127.0.0.1:8080/alice")
        );
    }

    #[test]
    fn test_score_is_zero_before_validation() {
        let session = ValidationSession::new("alice$example.com", "all", 200);
        assert_eq!(session.score(), 0.0);
        assert!(!session.has_validation_occurred());
    }

    #[tokio::test]
    async fn test_validate_requires_passing_preflight() {
        let mut session = ValidationSession::new("bad", "all", 200);
        session.has_preflight_errors();
        assert!(session.validate().await.is_err());
    }

    #[test]
    fn test_prettify_decodes_verified_payloads() {
        let payload = json!({ "sub": "alice$example.com" }).to_string();
        let body = json!({
            "addresses": [],
            "verifiedAddresses": [{ "payload": payload, "signatures": [] }]
        });
        let pretty = prettify_body(&body);
        assert!(pretty.contains("\"sub\": \"alice$example.com\""));
        assert!(!pretty.contains("\\\""));
    }
}

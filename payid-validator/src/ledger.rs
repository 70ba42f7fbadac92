//! Live ledger existence lookups for crypto addresses.
//!
//! Best-effort checks against public chain explorers: blockchain.info for
//! BTC, Etherscan for ETH, and a rippled JSON-RPC endpoint for the XRP
//! Ledger. Networks without a provider are skipped, and an XRPL lookup
//! whose node answer is neither a confirmed match nor `actNotFound`
//! produces no check at all.

use crate::check::ValidationCheck;
use crate::http::USER_AGENT;
use crate::networks::NetworkType;
use crate::{Result, ValidatorError};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Decode service for X-address encoded XRPL addresses.
const XADDRESS_DECODE_URL: &str = "https://xrpaddress.info/api/decode";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const TOTAL_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct EthBalanceResponse {
    status: String,
    result: String,
}

#[derive(Debug, Deserialize)]
struct XAddressParts {
    account: String,
}

/// Queries chain explorers for address existence.
pub struct LedgerClient {
    client: reqwest::Client,
    etherscan_api_key: Option<String>,
    blockchain_api_key: Option<String>,
    xaddress_decode_url: String,
}

impl LedgerClient {
    /// Create the client with the fixed lookup request profile.
    pub fn new() -> Result<Self> {
        // Same posture as the discovery request: broken provider TLS should
        // degrade to a not-found answer, not abort the run.
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(TOTAL_TIMEOUT)
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| ValidatorError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            etherscan_api_key: None,
            blockchain_api_key: None,
            xaddress_decode_url: XADDRESS_DECODE_URL.to_string(),
        })
    }

    /// Attach an Etherscan API key to ETH lookups.
    pub fn with_etherscan_api_key(mut self, key: impl Into<String>) -> Self {
        self.etherscan_api_key = Some(key.into());
        self
    }

    /// Attach a blockchain.info API code to BTC lookups.
    pub fn with_blockchain_api_key(mut self, key: impl Into<String>) -> Self {
        self.blockchain_api_key = Some(key.into());
        self
    }

    /// Override the X-address decode service URL.
    pub fn with_xaddress_decode_url(mut self, url: impl Into<String>) -> Self {
        self.xaddress_decode_url = url.into();
        self
    }

    /// Look up one address on its declared network. Returns `None` when the
    /// network has no lookup provider or the answer is inconclusive.
    pub async fn verify_address(
        &self,
        index: usize,
        payment_network: &str,
        environment: Option<&str>,
        address: &str,
    ) -> Option<ValidationCheck> {
        let network = payment_network.to_ascii_lowercase();
        let id = match environment {
            Some(environment) => format!("{network}-{}", environment.to_ascii_lowercase()),
            None => network.clone(),
        };
        let base_url = NetworkType::from_id(&id).and_then(|n| n.ledger_hostname());

        match network.as_str() {
            // An unknown BTC or ETH environment has nowhere to look, which
            // is indistinguishable from an address the network does not know.
            "btc" => match base_url {
                Some(base_url) => Some(self.verify_btc(base_url, index, address).await),
                None => Some(not_found(index, address)),
            },
            "eth" => match base_url {
                Some(base_url) => Some(self.verify_eth(base_url, index, address).await),
                None => Some(not_found(index, address)),
            },
            "xrpl" => {
                let base_url = base_url?;
                self.verify_xrpl(base_url, index, address).await
            }
            _ => None,
        }
    }

    /// BTC balance probe. Any answer other than a 200 counts as not found.
    pub async fn verify_btc(&self, base_url: &str, index: usize, address: &str) -> ValidationCheck {
        let mut request = self
            .client
            .get(format!("{base_url}/q/addressbalance/{address}"));
        if let Some(key) = &self.blockchain_api_key {
            request = request.query(&[("api_code", key.as_str())]);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(_) => return not_found(index, address),
        };
        if !response.status().is_success() {
            return not_found(index, address);
        }

        match response.text().await {
            Ok(balance) => found(index, address, balance.trim()),
            Err(_) => not_found(index, address),
        }
    }

    /// ETH balance probe via the Etherscan account API.
    pub async fn verify_eth(&self, base_url: &str, index: usize, address: &str) -> ValidationCheck {
        let api_key = self.etherscan_api_key.as_deref().unwrap_or("");
        let request = self.client.get(format!("{base_url}/api")).query(&[
            ("module", "account"),
            ("action", "balance"),
            ("address", address),
            ("tag", "latest"),
            ("apikey", api_key),
        ]);

        let response = match request.send().await {
            Ok(response) => response,
            Err(_) => return not_found(index, address),
        };
        if !response.status().is_success() {
            return not_found(index, address);
        }

        match response.json::<EthBalanceResponse>().await {
            // Etherscan reports unknown addresses with status "0".
            Ok(balance) if balance.status != "0" => found(index, address, &balance.result),
            _ => not_found(index, address),
        }
    }

    /// XRPL `account_info` probe. Only a confirmed account match or an
    /// explicit `actNotFound` produces a check.
    pub async fn verify_xrpl(
        &self,
        base_url: &str,
        index: usize,
        address: &str,
    ) -> Option<ValidationCheck> {
        // Once an X-address decodes, the classic account id is what gets
        // queried and what the checks report.
        let account = if address.starts_with('X') {
            match self.decode_xaddress(address).await {
                Ok(account) => account,
                Err(_) => return Some(not_found(index, address)),
            }
        } else {
            address.to_string()
        };

        let body = json!({
            "method": "account_info",
            "params": [{ "account": account }]
        });

        let response = match self.client.post(base_url).json(&body).send().await {
            Ok(response) => response,
            Err(_) => return Some(not_found(index, &account)),
        };
        let answer: Value = match response.json().await {
            Ok(answer) => answer,
            Err(_) => return None,
        };

        if answer.pointer("/result/error").and_then(Value::as_str) == Some("actNotFound") {
            return Some(not_found(index, &account));
        }

        let matched = answer
            .pointer("/result/account_data/Account")
            .and_then(Value::as_str)
            == Some(account.as_str());
        if matched {
            let balance = answer
                .pointer("/result/account_data/Balance")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            return Some(found(index, &account, balance));
        }

        None
    }

    async fn decode_xaddress(&self, address: &str) -> Result<String> {
        let url = format!("{}/{address}", self.xaddress_decode_url);
        let parts: XAddressParts = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ValidatorError::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| ValidatorError::Serialization(e.to_string()))?;
        Ok(parts.account)
    }
}

fn label(index: usize) -> String {
    format!("Address[{index}] ledger verification")
}

fn found(index: usize, address: &str, balance: &str) -> ValidationCheck {
    ValidationCheck::pass(label(index), address).with_message(format!(
        "The address was validated with the network. Current balance: {balance}"
    ))
}

fn not_found(index: usize, address: &str) -> ValidationCheck {
    ValidationCheck::fail(label(index), address)
        .with_message("The network could not find the given address.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::CheckCode;

    #[tokio::test]
    async fn test_networks_without_a_provider_are_skipped() {
        let client = LedgerClient::new().unwrap();
        assert!(client
            .verify_address(0, "ACH", None, "000123456789")
            .await
            .is_none());
        assert!(client
            .verify_address(0, "interledger", Some("MAINNET"), "$example.money/alice")
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_unknown_environment_for_btc_is_not_found() {
        let client = LedgerClient::new().unwrap();
        let check = client
            .verify_address(2, "BTC", Some("MOONNET"), "3E8ociqZa9mZUSwGdSmAEMAoV5p3cUEVMr")
            .await
            .unwrap();
        assert_eq!(check.code, CheckCode::Fail);
        assert_eq!(check.label, "Address[2] ledger verification");
    }
}

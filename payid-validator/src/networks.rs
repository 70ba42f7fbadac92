//! Static registry of payment networks and environments.
//!
//! Each entry maps a network/environment identifier to the Accept-header
//! media type used to request it and, where a live existence lookup is
//! possible, the hostname of the ledger provider to query.

use lazy_static::lazy_static;
use regex::Regex;

/// A supported network/environment selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NetworkType {
    /// Every network the server knows about.
    All,
    /// ACH bank transfers.
    Ach,
    /// BTC mainnet.
    BtcMainnet,
    /// BTC testnet.
    BtcTestnet,
    /// ETH mainnet.
    EthMainnet,
    /// ETH Ropsten testnet.
    EthRopsten,
    /// ETH Kovan testnet.
    EthKovan,
    /// ETH Rinkeby testnet.
    EthRinkeby,
    /// Interledger mainnet.
    IlpMainnet,
    /// Interledger testnet.
    IlpTestnet,
    /// XRP Ledger mainnet.
    XrplMainnet,
    /// XRP Ledger testnet.
    XrplTestnet,
    /// XRP Ledger devnet.
    XrplDevnet,
}

impl NetworkType {
    /// Every supported selection, in display order.
    pub const ALL: [NetworkType; 13] = [
        Self::BtcMainnet,
        Self::BtcTestnet,
        Self::EthMainnet,
        Self::EthRopsten,
        Self::EthKovan,
        Self::EthRinkeby,
        Self::IlpMainnet,
        Self::IlpTestnet,
        Self::XrplMainnet,
        Self::XrplTestnet,
        Self::XrplDevnet,
        Self::Ach,
        Self::All,
    ];

    /// Resolve a catalog identifier such as `xrpl-mainnet`.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|network| network.id() == id)
    }

    /// The catalog identifier.
    pub fn id(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Ach => "ach",
            Self::BtcMainnet => "btc-mainnet",
            Self::BtcTestnet => "btc-testnet",
            Self::EthMainnet => "eth-mainnet",
            Self::EthRopsten => "eth-ropsten",
            Self::EthKovan => "eth-kovan",
            Self::EthRinkeby => "eth-rinkeby",
            Self::IlpMainnet => "ilp-mainnet",
            Self::IlpTestnet => "ilp-testnet",
            Self::XrplMainnet => "xrpl-mainnet",
            Self::XrplTestnet => "xrpl-testnet",
            Self::XrplDevnet => "xrpl-devnet",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Ach => "ACH",
            Self::BtcMainnet => "BTC (mainnet)",
            Self::BtcTestnet => "BTC (testnet)",
            Self::EthMainnet => "ETH (mainnet)",
            Self::EthRopsten => "ETH (ropsten)",
            Self::EthKovan => "ETH (kovan)",
            Self::EthRinkeby => "ETH (rinkeby)",
            Self::IlpMainnet => "ILP (mainnet)",
            Self::IlpTestnet => "ILP (testnet)",
            Self::XrplMainnet => "XRP (mainnet)",
            Self::XrplTestnet => "XRP (testnet)",
            Self::XrplDevnet => "XRP (devnet)",
        }
    }

    /// The Accept-header media type requesting this selection.
    pub fn accept_header(&self) -> &'static str {
        match self {
            Self::All => "application/payid+json",
            Self::Ach => "application/ach+json",
            Self::BtcMainnet => "application/btc-mainnet+json",
            Self::BtcTestnet => "application/btc-testnet+json",
            Self::EthMainnet => "application/eth-mainnet+json",
            Self::EthRopsten => "application/eth-ropsten+json",
            Self::EthKovan => "application/eth-kovan+json",
            Self::EthRinkeby => "application/eth-rinkeby+json",
            Self::IlpMainnet => "application/interledger-mainnet+json",
            Self::IlpTestnet => "application/interledger-testnet+json",
            Self::XrplMainnet => "application/xrpl-mainnet+json",
            Self::XrplTestnet => "application/xrpl-testnet+json",
            Self::XrplDevnet => "application/xrpl-devnet+json",
        }
    }

    /// Ledger-lookup provider hostname, for networks that support a live
    /// existence check.
    pub fn ledger_hostname(&self) -> Option<&'static str> {
        match self {
            Self::BtcMainnet => Some("https://blockchain.info"),
            Self::BtcTestnet => Some("https://testnet.blockchain.info"),
            Self::EthMainnet => Some("https://api.etherscan.io"),
            Self::EthRopsten => Some("https://api-ropsten.etherscan.io"),
            Self::EthKovan => Some("https://api-kovan.etherscan.io"),
            Self::EthRinkeby => Some("https://api-rinkeby.etherscan.io"),
            Self::XrplMainnet => Some("https://s1.ripple.com:51234"),
            Self::XrplTestnet => Some("https://s.altnet.rippletest.net:51234"),
            Self::XrplDevnet => Some("https://s.devnet.rippletest.net:51234"),
            Self::All | Self::Ach | Self::IlpMainnet | Self::IlpTestnet => None,
        }
    }
}

/// A parsed `application/{network}[-{environment}]+{format}` media type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcceptMediaType {
    /// The payment network, e.g. `xrpl` or `payid` for the wildcard.
    pub network: String,
    /// The environment, absent for environment-agnostic types.
    pub environment: Option<String>,
    /// The serialization format suffix, normally `json`.
    pub format: String,
}

lazy_static! {
    static ref MEDIA_RE: Regex = Regex::new(r"^application/(\w+)(?:-([^+]+))?\+(\w+)$")
        .expect("media type grammar must compile");
}

/// Parse an Accept-header media type following the network grammar.
pub fn parse_accept_media_type(header: &str) -> Option<AcceptMediaType> {
    let captures = MEDIA_RE.captures(header)?;
    Some(AcceptMediaType {
        network: captures[1].to_string(),
        environment: captures.get(2).map(|m| m.as_str().to_string()),
        format: captures[3].to_string(),
    })
}

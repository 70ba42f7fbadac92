//! PayID discovery-response validator.
//!
//! Issues the diagnostic request against a PayID server and checks the
//! response against the protocol's header and body contracts: status code,
//! CORS and cache headers, content type, JSON-schema validity of the body,
//! requested network/environment consistency, JWS signatures on verified
//! addresses, and (optionally) live existence of referenced ledger
//! addresses. Results surface as an ordered list of pass/warn/fail checks
//! plus a normalized score.
//!
//! # Example
//!
//! ```ignore
//! use payid_validator::ValidationSession;
//!
//! let mut session = ValidationSession::new("alice$example.com", "all", 200);
//! if session.has_preflight_errors() {
//!     for error in session.preflight_errors() {
//!         eprintln!("{error}");
//!     }
//!     return Ok(());
//! }
//! session.validate().await?;
//! for check in session.checks() {
//!     println!("[{}] {}: {}", check.code, check.label, check.value);
//! }
//! println!("score: {:.2}", session.score());
//! ```

pub mod admin;
pub mod check;
pub mod consistency;
pub mod errors;
pub mod headers;
pub mod http;
pub mod ledger;
pub mod model;
pub mod networks;
pub mod payid;
pub mod schema;
pub mod session;
pub mod signature;

/// Fixture support for downstream integration testing.
///
/// Carries the canonical negative-test mutator that injects protocol
/// violations into an otherwise conformant response. Only compiled for
/// tests or with the `test-utils` feature.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use check::{aggregate_score, CheckCode, CheckMessage, ValidationCheck};
pub use errors::ValidatorError;
pub use http::FetchedResponse;
pub use networks::{parse_accept_media_type, AcceptMediaType, NetworkType};
pub use payid::PayId;
pub use session::{ValidationSession, ValidatorConfig};

/// Common result alias for validator operations.
pub type Result<T> = std::result::Result<T, ValidatorError>;

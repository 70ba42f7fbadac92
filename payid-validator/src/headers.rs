//! Header checks over an already-fetched response.
//!
//! Every function here is a pure function of the captured response and
//! emits exactly one [`ValidationCheck`] regardless of outcome. The one
//! network-dependent wrinkle — the secondary OPTIONS preflight for
//! `Access-Control-Allow-Methods` — is decided by the session and passed
//! in as a flag.

use crate::check::ValidationCheck;
use crate::http::FetchedResponse;
use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;

const MISSING_HEADER: &str = "The header could not be located in the response.";

/// The status code must equal the caller's expectation.
pub fn check_status_code(status: u16, expected: u16) -> ValidationCheck {
    if status == expected {
        ValidationCheck::pass("HTTP Status Code", status.to_string())
    } else {
        ValidationCheck::fail("HTTP Status Code", status.to_string())
    }
}

/// The transfer must have completed within the five second budget.
pub fn check_response_time(elapsed: Duration) -> ValidationCheck {
    let seconds = elapsed.as_secs_f64();
    let value = format!("{seconds:.4} seconds");
    if seconds < 5.0 {
        ValidationCheck::pass("Response Time", value)
    } else {
        ValidationCheck::fail("Response Time", value).with_message(
            "If the request attempt took more than 5 seconds to complete, it was aborted.",
        )
    }
}

/// `Access-Control-Allow-Origin` must be exactly `*`.
pub fn check_allow_origin(response: &FetchedResponse) -> ValidationCheck {
    const LABEL: &str = "Header Check / Access-Control-Allow-Origin";

    match response.header_line("access-control-allow-origin") {
        None => ValidationCheck::fail(LABEL, "").with_message(MISSING_HEADER),
        Some(value) if value != "*" => {
            ValidationCheck::fail(LABEL, value).with_message("The header has an incorrect value.")
        }
        Some(value) => ValidationCheck::pass(LABEL, value),
    }
}

/// Whether the methods header is present but does not list `OPTIONS`, i.e.
/// whether the session should attempt the secondary OPTIONS preflight.
pub fn allow_methods_needs_preflight(response: &FetchedResponse) -> bool {
    match response.header_line("access-control-allow-methods") {
        Some(value) => !split_csv(&value).iter().any(|method| method == "OPTIONS"),
        None => false,
    }
}

/// Whether a preflight response's methods header mentions `OPTIONS`.
pub fn preflight_contains_options(response: &FetchedResponse) -> bool {
    response
        .header_line("access-control-allow-methods")
        .is_some_and(|value| value.to_ascii_lowercase().contains("options"))
}

/// `Access-Control-Allow-Methods` must list `GET`, `POST`, and `OPTIONS`.
///
/// `options_via_preflight` reports whether a secondary OPTIONS preflight
/// found the missing `OPTIONS` entry; that path is recorded in the message
/// so the narrower concept stays visible in the result.
pub fn check_allow_methods(
    response: &FetchedResponse,
    options_via_preflight: bool,
) -> ValidationCheck {
    const LABEL: &str = "Header Check / Access-Control-Allow-Methods";

    let Some(value) = response.header_line("access-control-allow-methods") else {
        return ValidationCheck::fail(LABEL, "").with_message(MISSING_HEADER);
    };

    let present = split_csv(&value);
    let mut errors = Vec::new();
    let mut preflight_note = None;

    for method in ["POST", "GET", "OPTIONS"] {
        if present.iter().any(|candidate| candidate == method) {
            continue;
        }
        if method == "OPTIONS" && options_via_preflight {
            preflight_note = Some(
                "Method [OPTIONS] was found via a secondary OPTIONS pre-flight request."
                    .to_string(),
            );
            continue;
        }
        errors.push(format!("Method [{method}] not supported."));
    }

    if errors.is_empty() {
        let check = ValidationCheck::pass(LABEL, value);
        match preflight_note {
            Some(note) => check.with_message(note),
            None => check,
        }
    } else {
        errors.extend(preflight_note);
        ValidationCheck::fail(LABEL, value).with_message(errors)
    }
}

/// `Access-Control-Allow-Headers` must include `payid-version`.
pub fn check_allow_headers(response: &FetchedResponse) -> ValidationCheck {
    const LABEL: &str = "Header Check / Access-Control-Allow-Headers";

    let Some(value) = response.header_line("access-control-allow-headers") else {
        return ValidationCheck::fail(LABEL, "").with_message(MISSING_HEADER);
    };

    let listed = split_csv_lowercase(&value);
    if listed.iter().any(|header| header == "payid-version") {
        ValidationCheck::pass(LABEL, value)
    } else {
        ValidationCheck::fail(LABEL, value)
            .with_message("The [PayID-Version] header was not specified.")
    }
}

/// `Access-Control-Expose-Headers` must include `PayID-Version` and
/// `PayID-Server-Version`.
pub fn check_expose_headers(response: &FetchedResponse) -> ValidationCheck {
    const LABEL: &str = "Header Check / Access-Control-Expose-Headers";

    let Some(value) = response.header_line("access-control-expose-headers") else {
        return ValidationCheck::fail(LABEL, "").with_message(MISSING_HEADER);
    };

    let listed = split_csv_lowercase(&value);
    let errors: Vec<String> = ["PayID-Version", "PayID-Server-Version"]
        .iter()
        .filter(|header| !listed.contains(&header.to_ascii_lowercase()))
        .map(|header| format!("Header [{header}] not included."))
        .collect();

    if errors.is_empty() {
        ValidationCheck::pass(LABEL, value)
    } else {
        ValidationCheck::fail(LABEL, value).with_message(errors)
    }
}

/// `Cache-Control` must contain `no-store`.
pub fn check_cache_control(response: &FetchedResponse) -> ValidationCheck {
    const LABEL: &str = "Header Check / Cache-Control";

    let Some(value) = response.header_line("cache-control") else {
        return ValidationCheck::fail(LABEL, "")
            .with_message("The header was not set in the response.");
    };

    if value.contains("no-store") {
        ValidationCheck::pass(LABEL, value)
    } else {
        ValidationCheck::fail(LABEL, value)
            .with_message("The header value is not correct. Expected value \"no-store\".")
    }
}

lazy_static! {
    // An application/ media type ending in json, with or without a +json
    // structured-syntax suffix and arbitrary subtype tokens in between.
    static ref CONTENT_TYPE_RE: Regex =
        Regex::new(r"(?i)application/[\w\-]*\+*json").expect("content type pattern must compile");
}

/// `Content-Type` must be an `application/...json` media type.
pub fn check_content_type(response: &FetchedResponse) -> ValidationCheck {
    const LABEL: &str = "Header Check / Content-Type";

    let Some(value) = response.header_line("content-type") else {
        return ValidationCheck::fail(LABEL, "")
            .with_message("The header was not sent in the response.");
    };

    if CONTENT_TYPE_RE.is_match(&value) {
        ValidationCheck::pass(LABEL, value)
    } else {
        ValidationCheck::fail(LABEL, value)
            .with_message("The value of [application/json] or other variants could not be found.")
    }
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|piece| piece.trim().to_string())
        .collect()
}

fn split_csv_lowercase(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|piece| piece.trim().to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{CheckCode, CheckMessage};
    use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

    fn response_with(headers: &[(&str, &str)]) -> FetchedResponse {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.append(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        FetchedResponse {
            status: 200,
            headers: map,
            body: String::new(),
            elapsed: Duration::from_millis(25),
        }
    }

    #[test]
    fn test_status_code() {
        assert_eq!(check_status_code(200, 200).code, CheckCode::Pass);
        assert_eq!(check_status_code(404, 200).code, CheckCode::Fail);
        assert_eq!(check_status_code(404, 404).code, CheckCode::Pass);
    }

    #[test]
    fn test_response_time() {
        assert_eq!(
            check_response_time(Duration::from_millis(400)).code,
            CheckCode::Pass
        );
        let slow = check_response_time(Duration::from_secs(6));
        assert_eq!(slow.code, CheckCode::Fail);
        assert!(!slow.message.is_none());
    }

    #[test]
    fn test_allow_origin_missing_has_empty_value() {
        let check = check_allow_origin(&response_with(&[]));
        assert_eq!(check.code, CheckCode::Fail);
        assert_eq!(check.value, "");
    }

    #[test]
    fn test_allow_origin_must_be_wildcard() {
        let check = check_allow_origin(&response_with(&[(
            "access-control-allow-origin",
            "https://foo.example",
        )]));
        assert_eq!(check.code, CheckCode::Fail);

        let check = check_allow_origin(&response_with(&[("access-control-allow-origin", "*")]));
        assert_eq!(check.code, CheckCode::Pass);
    }

    #[test]
    fn test_allow_methods_lists_each_missing_method() {
        let response = response_with(&[("access-control-allow-methods", "GET")]);
        let check = check_allow_methods(&response, false);
        assert_eq!(check.code, CheckCode::Fail);
        match &check.message {
            CheckMessage::List(lines) => {
                assert_eq!(
                    lines,
                    &[
                        "Method [POST] not supported.".to_string(),
                        "Method [OPTIONS] not supported.".to_string(),
                    ]
                );
            }
            other => panic!("expected a list, got {other:?}"),
        }
    }

    #[test]
    fn test_allow_methods_accepts_preflight_path() {
        let response = response_with(&[("access-control-allow-methods", "GET, POST")]);
        assert!(allow_methods_needs_preflight(&response));

        let check = check_allow_methods(&response, true);
        assert_eq!(check.code, CheckCode::Pass);
        assert_eq!(
            check.message,
            CheckMessage::Text(
                "Method [OPTIONS] was found via a secondary OPTIONS pre-flight request."
                    .to_string()
            )
        );
    }

    #[test]
    fn test_allow_methods_case_sensitive_literal_match() {
        let response = response_with(&[("access-control-allow-methods", "get, post, options")]);
        let check = check_allow_methods(&response, false);
        assert_eq!(check.code, CheckCode::Fail);
    }

    #[test]
    fn test_preflight_contains_options_is_case_insensitive() {
        let response = response_with(&[("access-control-allow-methods", "get, options")]);
        assert!(preflight_contains_options(&response));
        assert!(!preflight_contains_options(&response_with(&[])));
    }

    #[test]
    fn test_allow_headers_case_insensitive() {
        let response = response_with(&[("access-control-allow-headers", "PayID-Version")]);
        assert_eq!(check_allow_headers(&response).code, CheckCode::Pass);

        let response = response_with(&[("access-control-allow-headers", "X-Other")]);
        assert_eq!(check_allow_headers(&response).code, CheckCode::Fail);
    }

    #[test]
    fn test_expose_headers_lists_missing_entries() {
        let response = response_with(&[("access-control-expose-headers", "PayID-Version")]);
        let check = check_expose_headers(&response);
        assert_eq!(check.code, CheckCode::Fail);
        assert_eq!(
            check.message,
            CheckMessage::List(vec![
                "Header [PayID-Server-Version] not included.".to_string()
            ])
        );

        let response = response_with(&[(
            "access-control-expose-headers",
            "payid-version, payid-server-version",
        )]);
        assert_eq!(check_expose_headers(&response).code, CheckCode::Pass);
    }

    #[test]
    fn test_cache_control_missing_message() {
        let check = check_cache_control(&response_with(&[]));
        assert_eq!(check.code, CheckCode::Fail);
        assert_eq!(check.value, "");
        assert_eq!(
            check.message,
            CheckMessage::Text("The header was not set in the response.".to_string())
        );
    }

    #[test]
    fn test_cache_control_requires_no_store() {
        let response = response_with(&[("cache-control", "max-age=60")]);
        assert_eq!(check_cache_control(&response).code, CheckCode::Fail);

        let response = response_with(&[("cache-control", "no-store, no-cache")]);
        assert_eq!(check_cache_control(&response).code, CheckCode::Pass);
    }

    #[test]
    fn test_content_type_variants() {
        for good in [
            "application/json",
            "application/payid+json; charset=utf-8",
            "APPLICATION/XRPL-MAINNET+JSON",
        ] {
            let response = response_with(&[("content-type", good)]);
            assert_eq!(
                check_content_type(&response).code,
                CheckCode::Pass,
                "rejected {good}"
            );
        }

        let response = response_with(&[("content-type", "text/html")]);
        assert_eq!(check_content_type(&response).code, CheckCode::Fail);

        let check = check_content_type(&response_with(&[]));
        assert_eq!(check.code, CheckCode::Fail);
        assert_eq!(check.value, "");
    }
}

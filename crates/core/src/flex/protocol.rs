//! Response-shape handling for the two-step Flex request protocol.
//!
//! The SendRequest step answers in several formats depending on endpoint
//! family and error path: a `<code>|<message>` status line, a
//! `FlexWebServiceResponse` XML wrapper, a bare reference-code attribute or
//! element, a plain-text phrase, or an HTML login page when auth/routing is
//! broken. All of them are matched here so the client stays free of text
//! munging.

use std::sync::OnceLock;

use regex::Regex;

use super::flex_errors::{codes, FlexError};

fn regex(cell: &'static OnceLock<Regex>, pattern: &'static str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("invalid protocol pattern"))
}

static HTML_DOCTYPE: OnceLock<Regex> = OnceLock::new();
static HTML_TAG: OnceLock<Regex> = OnceLock::new();
static PIPE_STATUS: OnceLock<Regex> = OnceLock::new();
static REF_PHRASE: OnceLock<Regex> = OnceLock::new();
static REF_TOKEN: OnceLock<Regex> = OnceLock::new();
static WEBSERVICE_WRAPPER: OnceLock<Regex> = OnceLock::new();
static STATUS_ELEMENT: OnceLock<Regex> = OnceLock::new();
static ERROR_MESSAGE_ELEMENT: OnceLock<Regex> = OnceLock::new();
static ERROR_CODE_ELEMENT: OnceLock<Regex> = OnceLock::new();
static REFERENCE_CODE_ELEMENT: OnceLock<Regex> = OnceLock::new();
static REFERENCE_CODE_ATTR: OnceLock<Regex> = OnceLock::new();
static EXPIRED: OnceLock<Regex> = OnceLock::new();
static TRY_AGAIN: OnceLock<Regex> = OnceLock::new();

fn capture(cell: &'static OnceLock<Regex>, pattern: &'static str, text: &str) -> Option<String> {
    regex(cell, pattern)
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn status_element(text: &str) -> Option<String> {
    capture(&STATUS_ELEMENT, r"(?i)<Status>([^<]+)</Status>", text)
}

fn error_from_elements(text: &str) -> FlexError {
    let message = capture(
        &ERROR_MESSAGE_ELEMENT,
        r"(?is)<ErrorMessage>(.*?)</ErrorMessage>",
        text,
    )
    .unwrap_or_else(|| "Flex service error".to_string());
    let code = capture(&ERROR_CODE_ELEMENT, r"(?i)<ErrorCode>([^<]+)</ErrorCode>", text);
    FlexError { message, code }
}

/// Extracts the reference code from a SendRequest response body.
pub fn parse_send_response(body: &str) -> Result<String, FlexError> {
    let text = body.trim();

    // HTML/login pages mean auth or routing trouble, never a protocol reply.
    if regex(&HTML_DOCTYPE, r"(?i)<!DOCTYPE\s+html").is_match(text)
        || regex(&HTML_TAG, r"(?i)<html[\s>]").is_match(text)
    {
        return Err(FlexError::with_code(
            "Flex endpoint returned HTML (possible auth/routing issue). Check token/IP and try again.",
            codes::HTML_RESPONSE,
        ));
    }

    // Official format: numeric status, pipe, message.
    if let Some(caps) = regex(&PIPE_STATUS, r"(?s)^(\d+)\|(.*)$").captures(text) {
        let status: u32 = caps[1].parse().unwrap_or(0);
        let message = caps[2].trim().to_string();
        if status != 200 {
            if regex(&EXPIRED, r"(?i)expired").is_match(&message) {
                return Err(FlexError::token_expired());
            }
            return Err(FlexError::with_code(
                format!("SendRequest error {status}: {message}"),
                status.to_string(),
            ));
        }
        if let Some(reference) = capture(
            &REF_PHRASE,
            r"(?i)reference\s*code[^A-Za-z0-9]{0,3}(?:is)?\s*[:=]?\s*([A-Za-z0-9-]+)",
            &message,
        ) {
            return Ok(reference);
        }
        // Otherwise the last long alphanumeric token is the reference.
        if let Some(reference) = regex(&REF_TOKEN, r"\b([A-Za-z0-9]{6,})\b")
            .find_iter(&message)
            .last()
        {
            return Ok(reference.as_str().to_string());
        }
    }

    // Flex Web Service XML wrapper.
    if regex(&WEBSERVICE_WRAPPER, r"(?i)<FlexWebServiceResponse").is_match(text) {
        if let Some(status) = status_element(text) {
            if status.to_lowercase().contains("fail") {
                return Err(error_from_elements(text));
            }
        }
        if let Some(reference) = capture(
            &REFERENCE_CODE_ELEMENT,
            r"(?i)<ReferenceCode>([^<]+)</ReferenceCode>",
            text,
        ) {
            return Ok(reference);
        }
    }

    // Other XML variants: bare attribute or element.
    if let Some(reference) = capture(
        &REFERENCE_CODE_ATTR,
        r#"(?i)referenceCode\s*=\s*"([^"]+)""#,
        text,
    ) {
        return Ok(reference);
    }
    if let Some(reference) = capture(
        &REFERENCE_CODE_ELEMENT,
        r"(?i)<ReferenceCode>([^<]+)</ReferenceCode>",
        text,
    ) {
        return Ok(reference);
    }

    // Plain-text variant.
    if let Some(reference) = capture(
        &REF_PHRASE,
        r"(?i)reference\s*code[^A-Za-z0-9]{0,3}(?:is)?\s*[:=]?\s*([A-Za-z0-9-]+)",
        text,
    ) {
        return Ok(reference);
    }

    // Explicit error document.
    if text.contains("<FlexErrorResponse") {
        return Err(error_from_elements(text));
    }

    if regex(&EXPIRED, r"(?i)expired").is_match(text) {
        return Err(FlexError::token_expired());
    }

    Err(FlexError::with_code(
        "Unexpected SendRequest response format",
        codes::UNEXPECTED_FORMAT,
    ))
}

/// Inspects a GetStatement response for an error document.
///
/// Returns `None` when the body is a real statement.
pub fn statement_error(xml: &str) -> Option<FlexError> {
    if xml.contains("<FlexErrorResponse") {
        return Some(error_from_elements(xml));
    }
    if let Some(status) = status_element(xml) {
        if status.to_lowercase().contains("fail") {
            return Some(error_from_elements(xml));
        }
    }
    None
}

/// Whether a GetStatement failure means "statement not ready, poll again".
pub fn is_retryable(error: &FlexError) -> bool {
    error.code.as_deref() == Some("1019")
        || regex(&TRY_AGAIN, r"(?i)try again").is_match(&error.message)
}

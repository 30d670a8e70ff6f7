//! Recovery of a single JSON object from loosely formatted model output.
//!
//! Attempts, first success wins:
//! 1. the widest `{ ... }` span, parsed as-is;
//! 2. the same span after textual repairs (newlines, trailing commas, smart quotes);
//! 3. the widest `{ ... }` span of the repaired text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*([}\]])").expect("TRAILING_COMMA is a valid regex pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("empty completion text")]
    EmptyInput,

    #[error("no JSON object found in completion text")]
    NoObjectFound,

    #[error("JSON value is not an object")]
    NotAnObject,

    #[error("could not parse JSON object: {0}")]
    Unparseable(String),
}

/// Recover the JSON object embedded in `text`.
pub fn extract_object(text: &str) -> Result<Map<String, Value>, ExtractError> {
    if text.trim().is_empty() {
        return Err(ExtractError::EmptyInput);
    }

    let span = widest_object_span(text).ok_or(ExtractError::NoObjectFound)?;

    let mut last_error = match parse_object(span) {
        Ok(object) => return Ok(object),
        Err(err) => err,
    };

    let repaired = repair(span);
    match parse_object(&repaired) {
        Ok(object) => return Ok(object),
        Err(err) => last_error = prefer_informative(last_error, err),
    }

    if let Some(narrowed) = widest_object_span(&repaired) {
        match parse_object(narrowed) {
            Ok(object) => return Ok(object),
            Err(err) => last_error = prefer_informative(last_error, err),
        }
    }

    log::debug!("JSON salvage failed: {}", last_error);
    Err(last_error)
}

/// First `{` through last `}`, inclusive.
pub fn widest_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Fixed repair sequence applied when the raw span does not parse.
pub fn repair(span: &str) -> String {
    let flattened = span.replace('\r', "").replace('\n', " ");
    let without_trailing_commas = TRAILING_COMMA.replace_all(&flattened, "$1");
    without_trailing_commas
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
}

fn parse_object(candidate: &str) -> Result<Map<String, Value>, ExtractError> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(ExtractError::NotAnObject),
        Err(err) => Err(ExtractError::Unparseable(err.to_string())),
    }
}

fn prefer_informative(previous: ExtractError, next: ExtractError) -> ExtractError {
    match (&previous, &next) {
        (ExtractError::NotAnObject, ExtractError::Unparseable(_)) => previous,
        _ => next,
    }
}

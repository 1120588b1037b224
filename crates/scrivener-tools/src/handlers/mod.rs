//! Method handlers exposed by the `scrivener-tools` worker.
//!
//! `echo` and `add` are self-contained. `correct`, `polish` and `summarize`
//! forward the text to a [`TextBackend`] and reshape the first JSON object
//! found in its reply.

use std::sync::Arc;

use scrivener_protocol::span::object_spans;
use scrivener_worker::{HandlerError, MethodRegistry};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::backend::TextBackend;

const CORRECT_INSTRUCTIONS: &str = concat!(
    "You are a spelling and grammar corrector. Fix spelling mistakes, misused ",
    "words, punctuation and obvious grammatical errors without changing the ",
    "meaning or style of the text. Reply with JSON only, in the form ",
    r#"{"corrected": "<corrected text>", "modifications": ["<change>", ...]}"#,
);

const POLISH_INSTRUCTIONS: &str = concat!(
    "You are an editor who rewrites text in a formal, precise and neutral ",
    "register suitable for official documents. Keep every key fact and the ",
    "original intent. Reply with JSON only, in the form ",
    r#"{"polished": "<polished text>", "modifications": ["<change>", ...]}"#,
);

const SUMMARIZE_INSTRUCTIONS: &str = concat!(
    "You summarise documents. Capture the purpose, the core content, key ",
    "facts, decisions and requested actions, in language much shorter than ",
    "the original. Reply with JSON only, in the form ",
    r#"{"summary": "<summary>", "key_points": ["<point>", ...]}"#,
);

/// Parameters for `echo`.
#[derive(Debug, Clone, Deserialize)]
pub struct EchoParams {
    /// Text returned unchanged.
    pub text: String,
}

/// Parameters for `add`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AddParams {
    /// Left operand.
    pub a: i64,
    /// Right operand.
    pub b: i64,
}

/// Parameters shared by the text tools.
#[derive(Debug, Clone, Deserialize)]
pub struct TextParams {
    /// Text to process.
    pub text: String,
}

/// Result of `correct`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Correction {
    /// Corrected text; the original when the backend proposed none.
    pub corrected_text: String,
    /// Human-readable list of applied changes.
    pub modifications: Vec<String>,
}

/// Result of `polish`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Polish {
    /// Polished text; the original when the backend proposed none.
    pub polished_text: String,
    /// Human-readable list of applied changes.
    pub modifications: Vec<String>,
}

/// Result of `summarize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Condensed text.
    pub summary: String,
    /// Bullet points extracted from the text.
    pub key_points: Vec<String>,
}

/// Returns the text unchanged.
///
/// # Errors
///
/// Never fails; the signature matches the registry's handler shape.
pub fn echo(params: EchoParams) -> Result<String, HandlerError> {
    Ok(params.text)
}

/// Adds two integers.
///
/// # Errors
///
/// Returns [`HandlerError::Failed`] when the sum overflows.
pub fn add(params: AddParams) -> Result<i64, HandlerError> {
    params
        .a
        .checked_add(params.b)
        .ok_or_else(|| HandlerError::failed(format!("{} + {} overflows", params.a, params.b)))
}

/// Corrects spelling and grammar through `backend`.
///
/// # Errors
///
/// Returns [`HandlerError::InvalidParams`] for blank text and
/// [`HandlerError::Failed`] when the backend fails or its reply holds no
/// JSON object.
pub fn correct(backend: &dyn TextBackend, text: &str) -> Result<Correction, HandlerError> {
    let reply = ask(backend, CORRECT_INSTRUCTIONS, text)?;
    Ok(Correction {
        corrected_text: string_field(&reply, "corrected").unwrap_or(text).to_owned(),
        modifications: string_list(&reply, "modifications"),
    })
}

/// Rewrites text in a formal register through `backend`.
///
/// # Errors
///
/// As for [`correct`].
pub fn polish(backend: &dyn TextBackend, text: &str) -> Result<Polish, HandlerError> {
    let reply = ask(backend, POLISH_INSTRUCTIONS, text)?;
    Ok(Polish {
        polished_text: string_field(&reply, "polished").unwrap_or(text).to_owned(),
        modifications: string_list(&reply, "modifications"),
    })
}

/// Summarises text through `backend`.
///
/// # Errors
///
/// As for [`correct`].
pub fn summarize(backend: &dyn TextBackend, text: &str) -> Result<Summary, HandlerError> {
    let reply = ask(backend, SUMMARIZE_INSTRUCTIONS, text)?;
    Ok(Summary {
        summary: string_field(&reply, "summary").unwrap_or_default().to_owned(),
        key_points: string_list(&reply, "key_points"),
    })
}

fn ask(
    backend: &dyn TextBackend,
    instructions: &str,
    text: &str,
) -> Result<Map<String, Value>, HandlerError> {
    if text.trim().is_empty() {
        return Err(HandlerError::invalid_params("text must not be empty"));
    }
    let reply = backend
        .complete(instructions, text)
        .map_err(|error| HandlerError::failed(error.to_string()))?;
    first_object(&reply).ok_or_else(|| HandlerError::Failed {
        message: String::from("text backend reply contains no JSON object"),
        data: Some(json!({ "reply": reply })),
    })
}

fn first_object(reply: &str) -> Option<Map<String, Value>> {
    object_spans(reply).find_map(|span| match serde_json::from_str(span) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    })
}

fn string_field<'a>(reply: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    reply.get(key).and_then(Value::as_str)
}

/// Reads `key` as a list of strings; a lone string becomes one entry.
fn string_list(reply: &Map<String, Value>, key: &str) -> Vec<String> {
    match reply.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_owned)
            .collect(),
        Some(Value::String(item)) if !item.trim().is_empty() => vec![item.trim().to_owned()],
        _ => Vec::new(),
    }
}

/// Builds the registry served by the worker.
#[must_use]
pub fn build_registry(backend: Arc<dyn TextBackend>) -> MethodRegistry {
    let mut registry = MethodRegistry::new();
    registry.register_fn("echo", "Returns `text` unchanged.", echo);
    registry.register_fn("add", "Adds integers `a` and `b`.", add);

    let corrector = Arc::clone(&backend);
    registry.register_fn(
        "correct",
        "Fixes spelling and grammar in `text`.",
        move |params: TextParams| correct(corrector.as_ref(), &params.text),
    );
    let polisher = Arc::clone(&backend);
    registry.register_fn(
        "polish",
        "Rewrites `text` in a formal register.",
        move |params: TextParams| polish(polisher.as_ref(), &params.text),
    );
    registry.register_fn(
        "summarize",
        "Summarises `text` with key points.",
        move |params: TextParams| summarize(backend.as_ref(), &params.text),
    );
    registry
}

#[cfg(test)]
mod tests;

// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Figment errors are turned into [`ConfigError`]s that `miette` can render
//! with a pointer into the offending `fable.toml` and, for typos in keys or
//! chatbot names, the closest valid spelling (Jaro-Winkler via `strsim`).

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Similarity a candidate must exceed to be offered as a correction.
const MIN_SIMILARITY: f64 = 0.75;

/// A configuration problem, rendered through `miette`.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(fable::config::unknown_key),
        help("{}", did_you_mean(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        valid_keys: Vec<String>,
        #[label("not a recognised key here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A closed-set value such as `memory.chatbot` outside its set.
    #[error("`{value}` is not a valid value for `{key}`")]
    #[diagnostic(
        code(fable::config::unknown_variant),
        help("{}", did_you_mean(suggestion.as_deref(), valid_values))
    )]
    UnknownVariant {
        key: String,
        value: String,
        suggestion: Option<String>,
        valid_values: Vec<String>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(fable::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(code(fable::config::missing_key))]
    MissingKey { key: String },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(fable::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(fable::config::other))]
    Other(String),
}

fn did_you_mean(suggestion: Option<&str>, valid: &[String]) -> String {
    let valid = valid.join(", ");
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid values: {valid}"),
        None => format!("valid values: {valid}"),
    }
}

impl ConfigError {
    /// Translate one figment error, locating unknown keys in `sources`
    /// (`(path, content)` pairs of the TOML files that were read).
    pub fn from_figment(error: &figment::Error, sources: &[(String, String)]) -> Self {
        let path: Vec<String> = error.path.iter().map(ToString::to_string).collect();
        let dotted = path.join(".");

        match &error.kind {
            Kind::UnknownField(field, expected) => {
                let (span, src) = source_location(error, &path, field, sources);
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: closest_match(field, expected),
                    valid_keys: expected.iter().map(|k| k.to_string()).collect(),
                    span,
                    src,
                }
            }
            Kind::UnknownVariant(value, expected) => ConfigError::UnknownVariant {
                key: dotted,
                value: value.clone(),
                suggestion: closest_match(value, expected),
                valid_values: expected.iter().map(|v| v.to_string()).collect(),
            },
            Kind::InvalidType(found, expected) => ConfigError::InvalidType {
                key: dotted,
                found: found.to_string(),
                expected: expected.clone(),
            },
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: if dotted.is_empty() {
                    field.to_string()
                } else {
                    format!("{dotted}.{field}")
                },
            },
            _ => ConfigError::Other(error.to_string()),
        }
    }
}

/// Every error carried by a figment failure, in report order.
pub fn figment_to_config_errors(
    err: figment::Error,
    sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|e| ConfigError::from_figment(&e, sources))
        .collect()
}

/// The most similar candidate above [`MIN_SIMILARITY`], if any.
pub fn closest_match(input: &str, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|c| (strsim::jaro_winkler(input, c), *c))
        .filter(|(score, _)| *score > MIN_SIMILARITY)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, c)| c.to_string())
}

fn source_location(
    error: &figment::Error,
    path: &[String],
    field: &str,
    sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let Some(figment::Source::File(file)) = error.metadata.as_ref().and_then(|m| m.source.as_ref())
    else {
        return (None, None);
    };
    let file = file.display().to_string();
    let located = sources.iter().find(|(p, _)| *p == file).and_then(|(p, content)| {
        locate_key(content, path.first().map(String::as_str), field).map(|offset| {
            (
                SourceSpan::new(offset.into(), field.len()),
                NamedSource::new(p, content.clone()),
            )
        })
    });
    match located {
        Some((span, src)) => (Some(span), Some(src)),
        None => (None, None),
    }
}

/// Byte offset of `field` as a key inside `[section]` (or before any
/// section header when `section` is `None`).
pub fn locate_key(content: &str, section: Option<&str>, field: &str) -> Option<usize> {
    let mut current: Option<&str> = None;
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(header) = trimmed.strip_prefix('[') {
            current = header.split(']').next().map(str::trim);
        } else if current == section
            && let Some(rest) = trimmed.strip_prefix(field)
            && rest.trim_start().starts_with('=')
        {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

/// Print every error to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    eprintln!(
        "fable.toml: {} configuration problem{}",
        errors.len(),
        if errors.len() == 1 { "" } else { "s" }
    );
    for error in errors {
        let mut report = String::new();
        match handler.render_report(&mut report, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{report}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}

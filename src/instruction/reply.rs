// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Pulling numbers and fields back out of free-text replies
//!
//! Both parsers are heuristics over text the model was merely asked to
//! format. They never fail; they fall back to fixed defaults instead.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Confidence reported when the reply mentions none
pub const DEFAULT_CONFIDENCE: u8 = 80;

/// Confidence reported for a structured reply without a `Confidence:` line
pub const DEFAULT_STRUCTURED_CONFIDENCE: u8 = 50;

fn confidence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // ASCII digits only; `\d` would also match other scripts' digits
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)confidence.*?([0-9]+)").expect("valid confidence pattern")
    })
}

/// Line labels of the structured reply format, in template order
const FIELDS: [&str; 5] = ["Object", "Components", "Categories", "Reasons", "Confidence"];

fn field_patterns() -> &'static [Regex; 5] {
    static PATTERNS: OnceLock<[Regex; 5]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        FIELDS.map(|field| {
            Regex::new(&format!(r"(?im)^\s*\**{}\**:\s*\**\s*(.*)$", field))
                .expect("valid field pattern")
        })
    })
}

/// Percentage from a non-empty run of ASCII digits, saturating at 100
fn saturating_percent(digits: &str) -> u8 {
    digits.parse::<u64>().map_or(100, |value| value.min(100) as u8)
}

/// Best-effort confidence percentage from a free-text reply
///
/// Takes the first run of ASCII digits that follows the word "confidence" on
/// the same line. Unreliable by nature: "confidence is high, 3 bins apply"
/// yields 3. Values above 100 saturate; no match yields [`DEFAULT_CONFIDENCE`].
pub fn extract_confidence(reply: &str) -> u8 {
    confidence_pattern()
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .map(|m| saturating_percent(m.as_str()))
        .unwrap_or(DEFAULT_CONFIDENCE)
}

/// One component of a structured reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredComponent {
    pub name: String,
    /// Lower-cased category text as the model wrote it
    pub category: String,
    pub reason: String,
}

/// Parsed `Object:/Components:/Categories:/Reasons:/Confidence:` reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredReply {
    pub object: String,
    pub components: Vec<StructuredComponent>,
    pub confidence: u8,
}

/// Parse the line format requested by [`super::PromptStyle::Structured`]
///
/// Returns `None` when neither an `Object:` nor a `Categories:` line is
/// present, which means the model ignored the format.
pub fn parse_structured_reply(reply: &str) -> Option<StructuredReply> {
    let [object_line, components_line, categories_line, reasons_line, confidence_line] =
        field_patterns();
    let field = |pattern: &Regex| -> Option<String> {
        pattern
            .captures(reply)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().trim_end_matches('*').trim().to_string())
    };
    let split = |value: &str| -> Vec<String> {
        value
            .split(';')
            .map(|item| item.trim().to_string())
            .collect()
    };

    let object = field(object_line);
    let categories = field(categories_line);
    if object.is_none() && categories.is_none() {
        return None;
    }

    let components = field(components_line)
        .map(|v| split(&v))
        .unwrap_or_else(|| vec!["Unknown component".to_string()]);
    let categories = categories
        .map(|v| split(&v.to_lowercase()))
        .unwrap_or_else(|| vec!["unknown".to_string()]);
    let reasons = field(reasons_line).map(|v| split(&v)).unwrap_or_default();

    let confidence = field(confidence_line)
        .map(|v| v.chars().take_while(|c| c.is_ascii_digit()).collect::<String>())
        .filter(|digits| !digits.is_empty())
        .map(|digits| saturating_percent(&digits))
        .unwrap_or(DEFAULT_STRUCTURED_CONFIDENCE);

    let components = components
        .into_iter()
        .enumerate()
        .map(|(idx, name)| StructuredComponent {
            name,
            category: categories
                .get(idx)
                .cloned()
                .unwrap_or_else(|| "unknown".to_string()),
            reason: reasons.get(idx).cloned().unwrap_or_default(),
        })
        .collect();

    Some(StructuredReply {
        object: object.unwrap_or_else(|| "Unknown object".to_string()),
        components,
        confidence,
    })
}

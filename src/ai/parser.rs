//! Defensive parser for free-form completion output.
//!
//! The model is not obliged to emit valid JSON, so structure is
//! recovered by splitting on `RISK n:` headers and reading labeled
//! fields up to the next known marker. Every missing or malformed
//! field has a documented default; the parser terminates on arbitrary
//! input and never panics.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::scoring::clamp_rating;

static BLOCK_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"RISK\s+\d+\s*:").unwrap());
static FIRST_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d+").unwrap());

/// Every marker the field extractor recognizes.
const FIELD_MARKERS: [&str; 7] = [
    "TITLE:",
    "DESCRIPTION:",
    "LIKELIHOOD:",
    "IMPACT:",
    "EXPOSURE:",
    "EXPLANATION:",
    "MITIGATIONS:",
];

const DEFAULT_DESCRIPTION: &str = "Risk identified from analysis";
const DEFAULT_EXPLANATION: &str = "No additional detail provided";
const DEFAULT_LIKELIHOOD: u8 = 3;
const DEFAULT_IMPACT: u8 = 4;
const DEFAULT_EXPOSURE: u8 = 3;

const MAX_TITLE_CHARS: usize = 255;
const MAX_MITIGATIONS: usize = 5;

/// Canned mitigations used when a block offers none.
pub const FALLBACK_MITIGATIONS: [&str; 3] = [
    "Review the risk with the accountable owner",
    "Define and track a remediation plan",
    "Reassess exposure after controls are applied",
];

/// One risk recovered from completion output (or emitted by the
/// deterministic fallback generator). Ratings are already clamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRisk {
    pub title: String,
    pub description: String,
    pub likelihood: u8,
    pub impact: u8,
    pub exposure: u8,
    pub explanation: String,
    pub mitigations: Vec<String>,
}

/// Parse raw bytes, substituting invalid UTF-8 first.
pub fn parse_bytes(output: &[u8]) -> Vec<ParsedRisk> {
    parse(&String::from_utf8_lossy(output))
}

/// Parse completion output into zero or more risks.
///
/// Text before the first `RISK n:` header is discarded.
pub fn parse(output: &str) -> Vec<ParsedRisk> {
    let headers: Vec<_> = BLOCK_HEADER.find_iter(output).collect();
    headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let end = headers
                .get(i + 1)
                .map(|next| next.start())
                .unwrap_or(output.len());
            parse_block(&output[header.end()..end], i + 1)
        })
        .collect()
}

fn parse_block(block: &str, ordinal: usize) -> ParsedRisk {
    let title = field(block, "TITLE:")
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format!("Risk {}", ordinal));
    let description = field(block, "DESCRIPTION:")
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());
    let explanation = field(block, "EXPLANATION:")
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| DEFAULT_EXPLANATION.to_string());

    ParsedRisk {
        title: truncate_chars(&title, MAX_TITLE_CHARS),
        description,
        likelihood: rating(block, "LIKELIHOOD:", DEFAULT_LIKELIHOOD),
        impact: rating(block, "IMPACT:", DEFAULT_IMPACT),
        exposure: rating(block, "EXPOSURE:", DEFAULT_EXPOSURE),
        explanation,
        mitigations: mitigations(block),
    }
}

/// Extract the text between `marker` and the next known marker (or the
/// end of the block).
fn field(block: &str, marker: &str) -> Option<String> {
    let start = block.find(marker)? + marker.len();
    let rest = &block[start..];
    let end = FIELD_MARKERS
        .iter()
        .filter_map(|m| rest.find(m))
        .min()
        .unwrap_or(rest.len());
    Some(rest[..end].trim().to_string())
}

fn rating(block: &str, marker: &str, default: u8) -> u8 {
    field(block, marker)
        .and_then(|text| {
            FIRST_INTEGER
                .find(&text)
                .and_then(|m| m.as_str().parse::<i64>().ok())
        })
        .map(clamp_rating)
        .unwrap_or(default)
}

fn mitigations(block: &str) -> Vec<String> {
    let section = match field(block, "MITIGATIONS:") {
        Some(section) => section,
        None => String::new(),
    };

    let mut bullets: Vec<String> = section
        .lines()
        .filter_map(|line| {
            let line = line.trim_start();
            ["- ", "\u{2022} ", "* "]
                .iter()
                .find_map(|bullet| line.strip_prefix(bullet))
        })
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    if bullets.is_empty() {
        // tolerate unbulleted output: take the first non-empty line
        bullets = section
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(|line| vec![line.to_string()])
            .unwrap_or_default();
    }

    bullets.truncate(MAX_MITIGATIONS);
    if bullets.is_empty() {
        bullets = FALLBACK_MITIGATIONS.iter().map(|m| m.to_string()).collect();
    }
    bullets
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

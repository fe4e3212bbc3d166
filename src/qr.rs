//! Deposit code extraction from scanned QR text.
//!
//! QR codes in circulation carry the code in several shapes. The matchers in
//! [`MATCHERS`] are tried in order and the first hit wins:
//!
//! 1. the whole text is a code (`DV123`),
//! 2. a JSON object with a `dv`, `code` or `depositCode` field,
//! 3. a URL with a `dv` query parameter (`https://host/doctor?dv=DV123`),
//! 4. a code anywhere in free text (`Code: DV123 for Dr. X`).
//!
//! Changing this order changes which code is picked for ambiguous input.

use std::sync::LazyLock;

use regex::Regex;

static WHOLE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^DV\d+$").expect("valid deposit code pattern"));

static URL_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[?&]dv=([^&]+)").expect("valid query pattern"));

static EMBEDDED_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)DV\d+").expect("valid embedded code pattern"));

/// JSON field names that may hold the code, by priority.
pub const JSON_CODE_FIELDS: [&str; 3] = ["dv", "code", "depositCode"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    Direct,
    JsonField,
    UrlQuery,
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanMatch {
    pub code: String,
    pub source: MatchSource,
}

pub type Matcher = fn(&str) -> Option<String>;

pub const MATCHERS: [(MatchSource, Matcher); 4] = [
    (MatchSource::Direct, match_direct),
    (MatchSource::JsonField, match_json_field),
    (MatchSource::UrlQuery, match_url_query),
    (MatchSource::Substring, match_substring),
];

pub fn is_deposit_code(candidate: &str) -> bool {
    WHOLE_CODE.is_match(candidate)
}

pub fn extract(scanned: &str) -> Option<ScanMatch> {
    let text = scanned.trim();
    MATCHERS.iter().find_map(|(source, matcher)| {
        matcher(text).map(|code| ScanMatch {
            code,
            source: *source,
        })
    })
}

/// Uppercased deposit code found in `scanned`, if any.
pub fn extract_deposit_code(scanned: &str) -> Option<String> {
    extract(scanned).map(|found| found.code)
}

fn match_direct(text: &str) -> Option<String> {
    is_deposit_code(text).then(|| text.to_uppercase())
}

fn match_json_field(text: &str) -> Option<String> {
    let parsed: serde_json::Value = serde_json::from_str(text).ok()?;
    let object = parsed.as_object()?;

    // first truthy field decides, even if its value is not a code
    let value = JSON_CODE_FIELDS
        .iter()
        .filter_map(|field| object.get(*field))
        .find(|value| is_truthy(value))?;

    value
        .as_str()
        .filter(|code| is_deposit_code(code))
        .map(str::to_uppercase)
}

fn match_url_query(text: &str) -> Option<String> {
    let value = URL_PARAM.captures(text)?.get(1)?.as_str();
    is_deposit_code(value).then(|| value.to_uppercase())
}

fn match_substring(text: &str) -> Option<String> {
    EMBEDDED_CODE
        .find(text)
        .map(|found| found.as_str().to_uppercase())
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => true,
    }
}

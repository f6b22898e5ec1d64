use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static VISIBLE_DATETIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{1,2}\.\d{1,2}\.\d{2,4}\s+\d{1,2}:\d{2}").expect("valid datetime regex")
});
static SPAN_WRAPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<span[^>]*>(.*?)</span>").expect("valid span regex"));
static SPAN_EPOCH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<span[^>]*>(\d+)</span>").expect("valid epoch regex"));
static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid br regex"));
static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

pub fn strip_markup(html: &str) -> String {
    let spaced = LINE_BREAK.replace_all(html, " ");
    let bare = ANY_TAG.replace_all(&spaced, "");
    collapse_ws(&decode_entities(&bare))
}

/// Visible part of a date cell.
///
/// Prefers the `D.M.YY HH:MM` substring when the scraper left one in place;
/// otherwise unwraps `<span>` content and strips whatever markup is left.
pub fn extract_visible_datetime(field: &str) -> String {
    if let Some(found) = VISIBLE_DATETIME.find(field) {
        return found.as_str().to_string();
    }
    let unwrapped = SPAN_WRAPPER.replace_all(field, "$1");
    strip_markup(&unwrapped)
}

pub fn extract_epoch(field: &str) -> i64 {
    SPAN_EPOCH
        .captures(field)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .unwrap_or(0)
}

pub fn normalize_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(extract_visible_datetime(s)),
        Value::Array(items) => Value::Array(items.iter().map(normalize_value).collect()),
        other => other.clone(),
    }
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ").replace("&amp;", "&")
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Field-level extraction helpers for scraped product records.
///
/// Everything here is tolerant: a helper either produces a usable value or
/// `None`/empty, and the gate in `catalog::transform_product` decides whether
/// that is a rejection.
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::model::{ProductDetail, RawProduct};

pub(crate) const DESCRIPTION_MAX_CHARS: usize = 420;
pub(crate) const SLUG_MAX_LEN: usize = 48;

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

// Splits list-ish free text: "oak, walnut and brass" -> 3 parts.
static DELIMITER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[,/;]|\band\b|\bor\b").expect("valid regex"));

/// Lowercase, collapse non-alphanumerics to `-`, cap at [`SLUG_MAX_LEN`].
/// Never returns an empty string ("item" is the fallback).
pub(crate) fn slugify(value: &str) -> String {
    let lowered = value.to_lowercase();
    let slug = SLUG_RE.replace_all(&lowered, "-");
    let mut slug = slug.trim_matches('-').to_string();
    if slug.len() > SLUG_MAX_LEN {
        // Slug is ASCII by construction, byte truncation is safe.
        slug.truncate(SLUG_MAX_LEN);
        slug = slug.trim_end_matches('-').to_string();
    }
    if slug.is_empty() {
        "item".to_string()
    } else {
        slug
    }
}

pub(crate) fn split_on_delimiters(text: &str) -> Vec<String> {
    DELIMITER_RE
        .split(text)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trim, lowercase, and deduplicate preserving first-seen order.
pub(crate) fn normalize_list<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut result = Vec::new();
    for value in values {
        let clean = value.as_ref().trim().to_lowercase();
        if clean.is_empty() {
            continue;
        }
        if seen.insert(clean.clone()) {
            result.push(clean);
        }
    }
    result
}

fn detail_text(detail: &ProductDetail) -> Option<String> {
    match detail.value.as_ref()? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Look up the first detail entry whose `type` matches one of `keys`
/// (case-insensitive, keys tried in order).
pub(crate) fn extract_detail(raw: &RawProduct, keys: &[&str]) -> Option<String> {
    for key in keys {
        for detail in &raw.product_details {
            let matches = detail
                .kind
                .as_deref()
                .map(|kind| kind.trim().eq_ignore_ascii_case(key))
                .unwrap_or(false);
            if matches {
                if let Some(text) = detail_text(detail) {
                    return Some(text);
                }
            }
        }
    }
    None
}

pub(crate) fn derive_materials(raw: &RawProduct) -> Vec<String> {
    match extract_detail(raw, &["material", "materials", "frame material", "fabric type"]) {
        Some(text) => normalize_list(split_on_delimiters(&text)),
        None => Vec::new(),
    }
}

pub(crate) fn derive_colors(raw: &RawProduct) -> Vec<String> {
    match extract_detail(raw, &["color", "finish type", "finish types"]) {
        Some(text) => normalize_list(split_on_delimiters(&text)),
        None => Vec::new(),
    }
}

/// Style tags come from the style/theme detail plus the first few short
/// feature strings. The caller falls back to raw category hints when empty.
pub(crate) fn derive_style_tags(raw: &RawProduct) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    if let Some(style_text) = extract_detail(raw, &["style", "theme", "pattern"]) {
        tags.extend(split_on_delimiters(&style_text));
    }
    for feature in raw.features.iter().take(3) {
        if feature.chars().count() < 120 {
            tags.extend(split_on_delimiters(feature));
        }
    }
    normalize_list(tags)
}

pub(crate) fn derive_lighting_type(raw: &RawProduct) -> Option<String> {
    let text = extract_detail(
        raw,
        &["light type", "light source type", "lighting type", "special feature"],
    )?;
    normalize_list(split_on_delimiters(&text)).into_iter().next()
}

pub(crate) fn derive_brand(raw: &RawProduct) -> String {
    raw.brand
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .or_else(|| extract_detail(raw, &["brand", "manufacturer"]))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Long-form description, falling back to the top review snippet.
/// Whitespace-collapsed and truncated to [`DESCRIPTION_MAX_CHARS`].
pub(crate) fn build_description(raw: &RawProduct) -> Option<String> {
    let source = [raw.description.as_deref(), raw.top_review.as_deref()]
        .into_iter()
        .flatten()
        .find(|text| !text.trim().is_empty())?;
    let collapsed = source.split_whitespace().collect::<Vec<_>>().join(" ");
    Some(collapsed.chars().take(DESCRIPTION_MAX_CHARS).collect())
}

/// Parse a vendor price value. Accepts JSON numbers and strings with
/// currency symbols or thousands separators ("$1,249.99").
pub(crate) fn parse_price_value(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, '$' | '€' | '£' | ','))
                .collect();
            cleaned.trim().parse::<f64>().ok()?
        }
        _ => return None,
    };
    if parsed.is_finite() {
        Some(round2(parsed))
    } else {
        None
    }
}

/// Preferred price field first, then the pre-discount price.
pub(crate) fn extract_price(raw: &RawProduct) -> Option<f64> {
    [raw.final_price.as_ref(), raw.initial_price.as_ref()]
        .into_iter()
        .flatten()
        .find_map(parse_price_value)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

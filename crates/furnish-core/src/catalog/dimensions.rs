/// Free-text dimension parsing.
///
/// Vendor dimension strings look like `48 x 24 x 18 in`, `30"W x 20"D x
/// 15"H`, or `120 cm x 60 cm x 45 cm`. The string is split on `x`/`×`, each
/// segment is parsed for a value, an optional unit, and an optional axis
/// label, and everything is converted to inches.
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::model::Dimensions;

use super::fields::round2;

static SEGMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?ix)
        (?P<value>[0-9]+(?:\.[0-9]+)?)
        \s*
        (?P<unit>centimeters?|cm|millimeters?|mm|feet|foot|ft|inches|inch|in|")?
        \s*
        (?P<label>length|depth|width|height|[ldwh])?
        "#,
    )
    .expect("valid regex")
});

#[derive(Clone, Copy, PartialEq)]
enum Axis {
    W,
    D,
    H,
}

fn unit_to_inches(unit: &str) -> Option<f64> {
    match unit {
        "\"" | "in" | "inch" | "inches" => Some(1.0),
        "ft" | "feet" | "foot" => Some(12.0),
        "cm" | "centimeter" | "centimeters" => Some(0.393701),
        "mm" | "millimeter" | "millimeters" => Some(0.0393701),
        _ => None,
    }
}

fn canonical_axis(label: &str) -> Option<Axis> {
    match label {
        "l" | "length" | "d" | "depth" => Some(Axis::D),
        "w" | "width" => Some(Axis::W),
        "h" | "height" => Some(Axis::H),
        _ => None,
    }
}

/// Parse a free-text dimension string into a `{w, h, d}` triple in inches.
///
/// Labeled segments claim their axis directly. Unlabeled segments are
/// assigned positionally in (d, w, h) order to the still-empty slots — the
/// common `L x W x H` vendor convention. That convention is a heuristic, not
/// a guarantee; see the tests pinning the assumption. Returns `None` unless
/// all three axes resolve.
pub fn parse_dimensions(text: &str) -> Option<Dimensions> {
    if text.trim().is_empty() {
        return None;
    }

    let normalized = text.replace('—', "-").replace('×', "x");
    let mut w: Option<f64> = None;
    let mut d: Option<f64> = None;
    let mut h: Option<f64> = None;
    let mut unlabeled: Vec<f64> = Vec::new();

    for segment in normalized.split(['x', 'X']) {
        let Some(caps) = SEGMENT_RE.captures(segment) else {
            continue;
        };
        let Ok(value) = caps["value"].parse::<f64>() else {
            continue;
        };
        // A bare number is assumed to be inches (matching `"` notation).
        let unit = caps
            .name("unit")
            .map(|m| m.as_str().to_lowercase())
            .unwrap_or_else(|| "\"".to_string());
        let Some(multiplier) = unit_to_inches(&unit) else {
            debug!(segment, unit, "unrecognized dimension unit");
            continue;
        };
        let inches = value * multiplier;

        match caps
            .name("label")
            .and_then(|m| canonical_axis(&m.as_str().to_lowercase()))
        {
            Some(Axis::W) => w = Some(inches),
            Some(Axis::D) => d = Some(inches),
            Some(Axis::H) => h = Some(inches),
            None => unlabeled.push(inches),
        }
    }

    let mut leftover = unlabeled.into_iter();
    for slot in [&mut d, &mut w, &mut h] {
        if slot.is_none() {
            *slot = leftover.next();
        }
    }

    match (w, h, d) {
        (Some(w), Some(h), Some(d)) => Some(Dimensions {
            w: round2(w),
            h: round2(h),
            d: round2(d),
        }),
        _ => None,
    }
}

/// Catalog normalization: turn noisy scraped product records into validated
/// catalog items, or reject them with a stable reason code.
///
/// `transform_product` is an ordered pipeline of named validator gates; the
/// first failing gate determines the rejection reason, so reasons are
/// mutually exclusive and their order is part of the contract:
///
///   title -> category -> dimensions -> materials -> colors -> style tags
///   -> price -> image -> description -> required assembly fields
///
/// `clean_products` drives a whole batch: it counts rejections, drops
/// duplicates (ASIN, else image URL) after the first occurrence, and
/// disambiguates id collisions in encounter order. Record-level failures
/// never abort the batch.
mod category;
mod dimensions;
mod fields;

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::CatalogError;
use crate::model::{Category, CleanProduct, Dimensions, RawProduct};

pub use category::pick_category;
pub use dimensions::parse_dimensions;

const DEFAULT_CURRENCY: &str = "USD";

/// Why a record was dropped. [`RejectReason::code`] is the stable key used
/// in the batch histogram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    MissingTitle,
    CategoryFilter,
    MissingDimensions,
    MissingMaterials,
    MissingColors,
    MissingStyleTags,
    MissingPrice,
    MissingImage,
    MissingDescription,
    /// Required assembly fields absent after projection (`buy_url`,
    /// `scraped_at`); names every missing field.
    MissingFields(Vec<&'static str>),
    Duplicate,
}

impl RejectReason {
    pub fn code(&self) -> String {
        match self {
            RejectReason::MissingTitle => "missing_title".to_string(),
            RejectReason::CategoryFilter => "category_filter".to_string(),
            RejectReason::MissingDimensions => "missing_dimensions".to_string(),
            RejectReason::MissingMaterials => "missing_materials".to_string(),
            RejectReason::MissingColors => "missing_colors".to_string(),
            RejectReason::MissingStyleTags => "missing_style_tags".to_string(),
            RejectReason::MissingPrice => "missing_price".to_string(),
            RejectReason::MissingImage => "missing_image".to_string(),
            RejectReason::MissingDescription => "missing_description".to_string(),
            RejectReason::MissingFields(fields) => format!("missing_{}", fields.join("-")),
            RejectReason::Duplicate => "duplicate".to_string(),
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

// --- validator gates, in pipeline order ---

fn gate_title(raw: &RawProduct) -> Result<String, RejectReason> {
    raw.title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or(RejectReason::MissingTitle)
}

fn gate_category(title: &str, raw: &RawProduct) -> Result<Category, RejectReason> {
    pick_category(title, &raw.categories).ok_or(RejectReason::CategoryFilter)
}

fn gate_dimensions(raw: &RawProduct) -> Result<Dimensions, RejectReason> {
    let text = raw
        .product_dimensions
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| {
            fields::extract_detail(
                raw,
                &["product dimensions", "item dimensions lxwxh", "dimensions"],
            )
        });
    text.as_deref()
        .and_then(parse_dimensions)
        .ok_or(RejectReason::MissingDimensions)
}

fn gate_materials(raw: &RawProduct) -> Result<Vec<String>, RejectReason> {
    let materials = fields::derive_materials(raw);
    if materials.is_empty() {
        Err(RejectReason::MissingMaterials)
    } else {
        Ok(materials)
    }
}

fn gate_colors(raw: &RawProduct) -> Result<Vec<String>, RejectReason> {
    let colors = fields::derive_colors(raw);
    if colors.is_empty() {
        Err(RejectReason::MissingColors)
    } else {
        Ok(colors)
    }
}

fn gate_style_tags(raw: &RawProduct) -> Result<Vec<String>, RejectReason> {
    let mut tags = fields::derive_style_tags(raw);
    if tags.is_empty() {
        // Last resort: the vendor's own category strings.
        tags = fields::normalize_list(&raw.categories);
    }
    if tags.is_empty() {
        Err(RejectReason::MissingStyleTags)
    } else {
        Ok(tags)
    }
}

fn gate_price(raw: &RawProduct) -> Result<f64, RejectReason> {
    match fields::extract_price(raw) {
        Some(price) if price > 0.0 => Ok(price),
        _ => Err(RejectReason::MissingPrice),
    }
}

fn gate_image(raw: &RawProduct) -> Result<String, RejectReason> {
    raw.images
        .iter()
        .map(String::as_str)
        .chain(raw.image_url.as_deref())
        .find(|url| !url.trim().is_empty())
        .map(str::to_string)
        .ok_or(RejectReason::MissingImage)
}

fn gate_description(raw: &RawProduct) -> Result<String, RejectReason> {
    fields::build_description(raw).ok_or(RejectReason::MissingDescription)
}

/// Base id before batch-level collision handling:
/// `furn_{category}_{slug}` with `-{asin}` folded into the slug if present.
fn build_id(category: Category, name: &str, asin: Option<&str>) -> String {
    let slug = fields::slugify(name);
    let slug = match asin.map(str::trim).filter(|a| !a.is_empty()) {
        Some(asin) => fields::slugify(&format!("{slug}-{}", asin.to_lowercase())),
        None => slug,
    };
    format!("furn_{category}_{slug}")
}

/// Transform one raw record into a validated catalog item.
///
/// Runs the gate pipeline in order; the returned reason is always the first
/// failure. Total over its input: nothing here panics on vendor garbage.
pub fn transform_product(raw: &RawProduct) -> Result<CleanProduct, RejectReason> {
    let name = gate_title(raw)?;
    let category = gate_category(&name, raw)?;
    let dimensions_in = gate_dimensions(raw)?;
    let materials = gate_materials(raw)?;
    let colors = gate_colors(raw)?;
    let style_tags = gate_style_tags(raw)?;
    let price = gate_price(raw)?;
    let brand = fields::derive_brand(raw);
    let image_url = gate_image(raw)?;
    let description = gate_description(raw)?;

    let lighting_type = if category == Category::Lamp {
        fields::derive_lighting_type(raw)
    } else {
        None
    };

    // Assembly is a strict allow-list projection: CleanProduct has no other
    // fields, so nothing from RawProduct::extra can survive. The two
    // passthrough fields without earlier gates are checked here together.
    let buy_url = raw.url.as_deref().map(str::trim).filter(|u| !u.is_empty());
    let scraped_at = raw
        .timestamp
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let mut missing: Vec<&'static str> = Vec::new();
    if buy_url.is_none() {
        missing.push("buy_url");
    }
    if scraped_at.is_none() {
        missing.push("scraped_at");
    }
    if !missing.is_empty() {
        return Err(RejectReason::MissingFields(missing));
    }

    Ok(CleanProduct {
        id: build_id(category, &name, raw.asin.as_deref()),
        name,
        brand,
        category,
        room_types: category.room_types().iter().map(|r| r.to_string()).collect(),
        price,
        currency: raw
            .currency
            .clone()
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        buy_url: buy_url.unwrap_or_default().to_string(),
        image_url,
        dimensions_in,
        materials,
        colors,
        style_tags,
        description,
        scraped_at: scraped_at.unwrap_or_default().to_string(),
        lighting_type,
    })
}

/// Dedup key: vendor ASIN (case-insensitive) when present, else the resolved
/// image URL. Empty when neither exists, which disables dedup for the record.
fn dedup_key(raw: &RawProduct, item: &CleanProduct) -> String {
    match raw.asin.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        Some(asin) => asin.to_lowercase(),
        None => item.image_url.clone(),
    }
}

fn unique_id(base: &str, seen: &mut HashSet<String>) -> String {
    let mut candidate = base.to_string();
    let mut suffix = 2u32;
    while seen.contains(&candidate) {
        candidate = format!("{base}-v{suffix:02}");
        suffix += 1;
    }
    seen.insert(candidate.clone());
    candidate
}

/// Normalize a whole batch.
///
/// Returns the accepted items (input order) and a histogram of rejection
/// reason code -> count. Invariant: accepted + histogram total == input
/// length. Records are processed independently; only dedup and id collision
/// handling depend on input order (first occurrence wins).
pub fn clean_products(raw_items: &[RawProduct]) -> (Vec<CleanProduct>, BTreeMap<String, usize>) {
    let mut cleaned: Vec<CleanProduct> = Vec::new();
    let mut rejects: BTreeMap<String, usize> = BTreeMap::new();
    let mut seen_keys: HashSet<String> = HashSet::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for raw in raw_items {
        let mut item = match transform_product(raw) {
            Ok(item) => item,
            Err(reason) => {
                debug!(reason = %reason, title = raw.title.as_deref().unwrap_or(""), "record rejected");
                *rejects.entry(reason.code()).or_insert(0) += 1;
                continue;
            }
        };

        let key = dedup_key(raw, &item);
        if !key.is_empty() && !seen_keys.insert(key) {
            debug!(id = %item.id, "duplicate record rejected");
            *rejects.entry(RejectReason::Duplicate.code()).or_insert(0) += 1;
            continue;
        }

        item.id = unique_id(&item.id, &mut seen_ids);
        cleaned.push(item);
    }

    info!(
        total = raw_items.len(),
        accepted = cleaned.len(),
        rejected = raw_items.len() - cleaned.len(),
        "catalog batch normalized"
    );
    (cleaned, rejects)
}

/// Normalize a batch given as raw JSON.
///
/// Structurally invalid input — anything other than an array of objects —
/// is fatal for the whole call and surfaced as an error, never as a silently
/// empty result. Record-level validation failures still only count against
/// the individual record.
pub fn clean_products_value(
    value: &Value,
) -> Result<(Vec<CleanProduct>, BTreeMap<String, usize>), CatalogError> {
    let entries = value.as_array().ok_or(CatalogError::NotAnArray)?;

    let mut records: Vec<RawProduct> = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let record = RawProduct::deserialize(entry).map_err(|e| CatalogError::InvalidRecord {
            index,
            message: e.to_string(),
        })?;
        records.push(record);
    }

    Ok(clean_products(&records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::model::ProductDetail;

    /// A fully-populated record that passes every gate.
    fn good_record(title: &str) -> RawProduct {
        RawProduct {
            title: Some(title.to_string()),
            product_dimensions: Some("48 x 24 x 18 in".to_string()),
            product_details: vec![
                detail("Material", "oak"),
                detail("Color", "natural"),
                detail("Style", "modern"),
            ],
            final_price: Some(json!("$249.99")),
            images: vec!["http://x/img.jpg".to_string()],
            description: Some("A sturdy oak coffee table for the living room.".to_string()),
            url: Some("http://x/product".to_string()),
            timestamp: Some("2024-03-01T12:00:00Z".to_string()),
            ..Default::default()
        }
    }

    fn detail(kind: &str, value: &str) -> ProductDetail {
        ProductDetail {
            kind: Some(kind.to_string()),
            value: Some(json!(value)),
        }
    }

    #[test]
    fn golden_record_accepted() {
        let item = transform_product(&good_record("Modern Oak Coffee Table")).unwrap();
        assert_eq!(item.category, Category::Table);
        assert_eq!(item.price, 249.99);
        assert_eq!(item.dimensions_in.w, 24.0);
        assert_eq!(item.dimensions_in.d, 48.0);
        assert_eq!(item.dimensions_in.h, 18.0);
        assert_eq!(item.materials, vec!["oak"]);
        assert_eq!(item.colors, vec!["natural"]);
        assert_eq!(item.style_tags, vec!["modern"]);
        assert_eq!(item.brand, "unknown");
        assert_eq!(item.currency, "USD");
        assert_eq!(item.room_types, vec!["living", "bedroom"]);
        assert_eq!(item.id, "furn_table_modern-oak-coffee-table");
        assert!(item.lighting_type.is_none());
    }

    #[test]
    fn gates_fire_in_pipeline_order() {
        // Record that would fail several gates; the first one must win.
        let empty = RawProduct::default();
        assert_eq!(transform_product(&empty), Err(RejectReason::MissingTitle));

        let mut titled = RawProduct::default();
        titled.title = Some("Garden Hose Reel".to_string());
        assert_eq!(transform_product(&titled), Err(RejectReason::CategoryFilter));

        let mut categorized = RawProduct::default();
        categorized.title = Some("Oak Coffee Table".to_string());
        assert_eq!(
            transform_product(&categorized),
            Err(RejectReason::MissingDimensions)
        );
    }

    #[test]
    fn banned_title_rejects_as_category_filter() {
        let record = good_record("Laundry Hamper with Lid");
        assert_eq!(transform_product(&record), Err(RejectReason::CategoryFilter));
    }

    #[test]
    fn missing_materials_then_colors_then_tags() {
        let mut record = good_record("Oak Coffee Table");
        record.product_details = vec![detail("Color", "natural")];
        assert_eq!(
            transform_product(&record),
            Err(RejectReason::MissingMaterials)
        );

        record.product_details = vec![detail("Material", "oak")];
        assert_eq!(transform_product(&record), Err(RejectReason::MissingColors));

        record.product_details = vec![detail("Material", "oak"), detail("Color", "natural")];
        // No style detail and no features; category hints rescue the tags.
        record.categories = vec!["Coffee Tables".to_string()];
        let item = transform_product(&record).unwrap();
        assert_eq!(item.style_tags, vec!["coffee tables"]);

        record.categories = Vec::new();
        assert_eq!(
            transform_product(&record),
            Err(RejectReason::MissingStyleTags)
        );
    }

    #[test]
    fn zero_or_unparsable_price_rejects() {
        let mut record = good_record("Oak Coffee Table");
        record.final_price = Some(json!("0"));
        record.initial_price = None;
        assert_eq!(transform_product(&record), Err(RejectReason::MissingPrice));

        record.final_price = None;
        assert_eq!(transform_product(&record), Err(RejectReason::MissingPrice));
    }

    #[test]
    fn missing_image_and_description() {
        let mut record = good_record("Oak Coffee Table");
        record.images = Vec::new();
        assert_eq!(transform_product(&record), Err(RejectReason::MissingImage));

        let mut record = good_record("Oak Coffee Table");
        record.description = None;
        assert_eq!(
            transform_product(&record),
            Err(RejectReason::MissingDescription)
        );
        // The review snippet rescues it.
        let mut record = good_record("Oak Coffee Table");
        record.description = None;
        record.top_review = Some("Solid and handsome.".to_string());
        assert!(transform_product(&record).is_ok());
    }

    #[test]
    fn composite_reason_names_every_missing_field() {
        let mut record = good_record("Oak Coffee Table");
        record.url = None;
        assert_eq!(
            transform_product(&record).unwrap_err().code(),
            "missing_buy_url"
        );

        let mut record = good_record("Oak Coffee Table");
        record.timestamp = None;
        assert_eq!(
            transform_product(&record).unwrap_err().code(),
            "missing_scraped_at"
        );

        let mut record = good_record("Oak Coffee Table");
        record.url = None;
        record.timestamp = None;
        assert_eq!(
            transform_product(&record).unwrap_err().code(),
            "missing_buy_url-scraped_at"
        );
    }

    #[test]
    fn lamp_gets_lighting_type() {
        let mut record = good_record("Brass Floor Lamp");
        record
            .product_details
            .push(detail("Light Type", "LED"));
        let item = transform_product(&record).unwrap();
        assert_eq!(item.category, Category::Lamp);
        assert_eq!(item.lighting_type, Some("led".to_string()));

        // Missing lighting type never rejects a lamp.
        let record = good_record("Brass Floor Lamp");
        let item = transform_product(&record).unwrap();
        assert!(item.lighting_type.is_none());
    }

    #[test]
    fn asin_folds_into_id() {
        let mut record = good_record("Oak Coffee Table");
        record.asin = Some("B0ABC123".to_string());
        let item = transform_product(&record).unwrap();
        assert_eq!(item.id, "furn_table_oak-coffee-table-b0abc123");
    }

    #[test]
    fn duplicate_asin_rejected_and_counts_balance() {
        let mut first = good_record("Oak Coffee Table");
        first.asin = Some("B0DUP".to_string());
        let mut second = good_record("Oak Coffee Table Deluxe");
        second.asin = Some("b0dup".to_string());
        second.images = vec!["http://x/other.jpg".to_string()];
        let third = RawProduct::default(); // missing_title

        let batch = vec![first, second, third];
        let (cleaned, rejects) = clean_products(&batch);

        assert_eq!(cleaned.len(), 1);
        assert_eq!(rejects.get("duplicate"), Some(&1));
        assert_eq!(rejects.get("missing_title"), Some(&1));
        let reject_total: usize = rejects.values().sum();
        assert_eq!(cleaned.len() + reject_total, batch.len());
    }

    #[test]
    fn duplicate_image_url_without_asin() {
        let batch = vec![good_record("Oak Coffee Table"), good_record("Oak Side Table")];
        // Both share http://x/img.jpg and have no ASIN.
        let (cleaned, rejects) = clean_products(&batch);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(rejects.get("duplicate"), Some(&1));
    }

    #[test]
    fn id_collisions_get_version_suffixes() {
        let mut first = good_record("Oslo Chair");
        first.categories = vec!["Armchair".to_string()];
        let mut second = first.clone();
        second.images = vec!["http://x/img2.jpg".to_string()];
        let mut third = first.clone();
        third.images = vec!["http://x/img3.jpg".to_string()];

        let (cleaned, rejects) = clean_products(&vec![first, second, third]);
        assert!(rejects.is_empty());
        assert_eq!(cleaned[0].id, "furn_chair_oslo-chair");
        assert_eq!(cleaned[1].id, "furn_chair_oslo-chair-v02");
        assert_eq!(cleaned[2].id, "furn_chair_oslo-chair-v03");
    }

    #[test]
    fn renormalizing_clean_values_is_stable() {
        let (cleaned, _) = clean_products(&[good_record("Modern Oak Coffee Table")]);
        let item = &cleaned[0];

        // Rebuild a raw record from the cleaned output, as if the clean
        // catalog were scraped again, and run it back through the pipeline.
        let requoted = RawProduct {
            title: Some(item.name.clone()),
            product_dimensions: Some(format!(
                "{} x {} x {} in",
                item.dimensions_in.d, item.dimensions_in.w, item.dimensions_in.h
            )),
            product_details: vec![
                detail("Material", &item.materials.join(", ")),
                detail("Color", &item.colors.join(", ")),
                detail("Style", &item.style_tags.join(", ")),
            ],
            final_price: Some(json!(item.price)),
            brand: Some(item.brand.clone()),
            images: vec![item.image_url.clone()],
            description: Some(item.description.clone()),
            currency: Some(item.currency.clone()),
            url: Some(item.buy_url.clone()),
            timestamp: Some(item.scraped_at.clone()),
            ..Default::default()
        };

        let again = transform_product(&requoted).unwrap();
        assert_eq!(again.name, item.name);
        assert_eq!(again.category, item.category);
        assert_eq!(again.dimensions_in, item.dimensions_in);
        assert_eq!(again.materials, item.materials);
        assert_eq!(again.colors, item.colors);
        assert_eq!(again.style_tags, item.style_tags);
        assert_eq!(again.price, item.price);
        assert_eq!(again.brand, item.brand);
        assert_eq!(again.description, item.description);
        assert_eq!(again.id, item.id);
    }

    #[test]
    fn json_entrypoint_rejects_non_array() {
        assert!(matches!(
            clean_products_value(&json!({"items": []})),
            Err(CatalogError::NotAnArray)
        ));
        assert!(matches!(
            clean_products_value(&json!("nope")),
            Err(CatalogError::NotAnArray)
        ));
    }

    #[test]
    fn json_entrypoint_rejects_non_object_element() {
        let err = clean_products_value(&json!([{"title": "Oak Table"}, 42])).unwrap_err();
        match err {
            CatalogError::InvalidRecord { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn json_entrypoint_accepts_valid_batch() {
        let value = json!([{
            "title": "Modern Oak Coffee Table",
            "product_dimensions": "48 x 24 x 18 in",
            "product_details": [
                {"type": "Material", "value": "oak"},
                {"type": "Color", "value": "natural"},
                {"type": "Style", "value": "modern"}
            ],
            "final_price": "$249.99",
            "images": ["http://x/img.jpg"],
            "description": "A sturdy oak coffee table.",
            "url": "http://x/product",
            "timestamp": "2024-03-01T12:00:00Z",
            "unexpected_vendor_field": {"junk": true}
        }]);
        let (cleaned, rejects) = clean_products_value(&value).unwrap();
        assert_eq!(cleaned.len(), 1);
        assert!(rejects.is_empty());
        // The extension bag never reaches the output.
        let out = serde_json::to_value(&cleaned[0]).unwrap();
        assert!(out.get("unexpected_vendor_field").is_none());
    }
}

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A product returned by the vector-similarity search layer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductCandidate {
    /// Catalog item id, unique within one search response.
    pub id: String,
    /// Cosine similarity between the query vector and the item embedding,
    /// roughly in [-1, 1]. Higher is more similar.
    pub cosine_similarity: f64,
    /// Opaque catalog metadata, passed through to the caller untouched.
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

/// A relevance score the Claude judge assigned to one candidate.
///
/// Construction goes through [`crate::llm::parse_claude_scores`], which
/// guarantees the score is a finite number.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClaudeScore {
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A candidate wrapped with its final blended score.
///
/// Ephemeral: derived per request, sorted descending by `score`, never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankedRecommendation {
    pub id: String,
    /// Blended final score (see [`crate::ranking::COSINE_BLEND_WEIGHT`]).
    pub score: f64,
    pub cosine_similarity: f64,
    /// The judge score that went into the blend, if one was available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claude_score: Option<f64>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

/// Catalog category. Closed set; scraped records that fit none of these
/// are filtered out during cleaning.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Sofa,
    Chair,
    Table,
    Storage,
    Bed,
    Lamp,
    Rug,
    Decor,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Sofa => "sofa",
            Category::Chair => "chair",
            Category::Table => "table",
            Category::Storage => "storage",
            Category::Bed => "bed",
            Category::Lamp => "lamp",
            Category::Rug => "rug",
            Category::Decor => "decor",
        }
    }

    /// Default room placements for the category.
    pub fn room_types(&self) -> &'static [&'static str] {
        match self {
            Category::Sofa | Category::Decor => &["living"],
            Category::Bed => &["bedroom"],
            Category::Chair
            | Category::Table
            | Category::Storage
            | Category::Lamp
            | Category::Rug => &["living", "bedroom"],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `{type, value}` entry from a vendor's `product_details` list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductDetail {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub value: Option<Value>,
}

/// One untrusted scraped record, as found in the vendor dump.
///
/// Every field is optional; validation happens in [`crate::catalog`]. Keys
/// the pipeline does not know about land in `extra` and are never projected
/// into the cleaned output.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProduct {
    pub title: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub product_details: Vec<ProductDetail>,
    #[serde(default)]
    pub features: Vec<String>,
    pub product_dimensions: Option<String>,
    /// String or number; vendors are inconsistent.
    pub final_price: Option<Value>,
    pub initial_price: Option<Value>,
    pub brand: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub top_review: Option<String>,
    pub currency: Option<String>,
    pub url: Option<String>,
    pub timestamp: Option<String>,
    pub asin: Option<String>,
    /// Extension bag for everything else in the record.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Item dimensions in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Dimensions {
    pub w: f64,
    pub h: f64,
    pub d: f64,
}

/// A validated catalog item.
///
/// The struct is the allow-list: only these fields exist, so nothing from
/// [`RawProduct::extra`] can leak into the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CleanProduct {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub category: Category,
    #[serde(rename = "roomTypes")]
    pub room_types: Vec<String>,
    pub price: f64,
    pub currency: String,
    pub buy_url: String,
    pub image_url: String,
    pub dimensions_in: Dimensions,
    pub materials: Vec<String>,
    pub colors: Vec<String>,
    pub style_tags: Vec<String>,
    pub description: String,
    pub scraped_at: String,
    /// Lamp-only extra; omitted for every other category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lighting_type: Option<String>,
}

/// Category inference for scraped product titles.
///
/// Three layers, checked in order:
/// 1. banned title keywords (bedding, textile accessories) reject outright,
/// 2. explicit overrides beat the generic table (an ottoman sells as seating),
/// 3. an ordered category -> keyword table matched against the title and the
///    vendor's own category hints. Earlier categories win.
use std::sync::LazyLock;

use regex::Regex;

use crate::model::Category;

const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Sofa, &["sofa", "sectional", "loveseat", "couch", "settee"]),
    (
        Category::Chair,
        &["armchair", "accent chair", "recliner", "lounger", "stool", "bench"],
    ),
    (
        Category::Table,
        &["table", "desk", "console", "nightstand", "side table", "coffee table", "dining table"],
    ),
    (
        Category::Storage,
        &["dresser", "cabinet", "sideboard", "credenza", "bookcase", "shelving", "wardrobe"],
    ),
    (
        Category::Bed,
        &["platform bed", "bed frame", "headboard", "canopy bed"],
    ),
    (
        Category::Lamp,
        &["lamp", "sconce", "chandelier", "pendant", "lighting", "light fixture", "floor lamp", "table lamp"],
    ),
    (Category::Rug, &["rug", "runner"]),
    (Category::Decor, &["mirror", "wall art", "planter", "vase"]),
];

const BANNED_TITLE_KEYWORDS: &[&str] = &[
    "hamper",
    "laundry basket",
    "mattress topper",
    "mattress pad",
    "protector",
    "sheet",
    "pillow",
    "blanket",
    "duvet",
];

const CATEGORY_OVERRIDES: &[(&str, Category)] =
    &[("bench", Category::Chair), ("ottoman", Category::Chair)];

fn keyword_set_regex(keywords: &[&str]) -> Regex {
    let alternation = keywords
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b")).expect("valid regex")
}

static BANNED_RE: LazyLock<Regex> = LazyLock::new(|| keyword_set_regex(BANNED_TITLE_KEYWORDS));

static OVERRIDE_RES: LazyLock<Vec<(Regex, Category)>> = LazyLock::new(|| {
    CATEGORY_OVERRIDES
        .iter()
        .map(|(keyword, category)| (keyword_set_regex(&[keyword]), *category))
        .collect()
});

static CATEGORY_RES: LazyLock<Vec<(Category, Regex)>> = LazyLock::new(|| {
    CATEGORY_KEYWORDS
        .iter()
        .map(|(category, keywords)| (*category, keyword_set_regex(keywords)))
        .collect()
});

/// Infer a category from a title and the vendor's category hint list.
///
/// Returns `None` both for banned titles and for titles matching nothing;
/// the caller treats either as a category filter rejection.
pub fn pick_category(title: &str, categories: &[String]) -> Option<Category> {
    let title = title.to_lowercase();
    let hints: Vec<String> = categories.iter().map(|c| c.to_lowercase()).collect();

    if BANNED_RE.is_match(&title) {
        return None;
    }

    for (re, category) in OVERRIDE_RES.iter() {
        if re.is_match(&title) {
            return Some(*category);
        }
    }

    for (category, re) in CATEGORY_RES.iter() {
        if re.is_match(&title) || hints.iter().any(|hint| re.is_match(hint)) {
            return Some(*category);
        }
    }
    None
}

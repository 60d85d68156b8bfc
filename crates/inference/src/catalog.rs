//! Static mapping from detector class labels to catalog SKUs and brands.

/// Catalog entry for one detected label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductMatch {
    pub sku: String,
    pub brand: Option<String>,
}

/// Resolves a detector label to a product. Lookups never fail; unknown labels
/// get a synthesized SKU.
pub trait ProductMatcher: Send + Sync {
    fn lookup(&self, label: &str) -> ProductMatch;
}

const SKUS: [(&str, &str); 4] = [
    ("bottle", "generic-bottle-750ml"),
    ("wine", "red-wine-750ml"),
    ("beer", "beer-bottle-355ml"),
    ("cup", "cocktail-glass"),
];

const BRANDS: [(&str, &str); 3] = [
    ("bottle", "Unknown"),
    ("wine", "Unknown Wine"),
    ("beer", "Unknown Beer"),
];

const UNKNOWN_BRAND: &str = "Unknown";

/// Placeholder catalog used until a product database is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticCatalog;

impl StaticCatalog {
    pub fn sku_for(label: &str) -> String {
        SKUS.iter()
            .find(|(l, _)| *l == label)
            .map(|(_, sku)| sku.to_string())
            .unwrap_or_else(|| format!("{}-unknown", label))
    }

    pub fn brand_for(label: &str) -> String {
        BRANDS
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, brand)| *brand)
            .unwrap_or(UNKNOWN_BRAND)
            .to_string()
    }
}

impl ProductMatcher for StaticCatalog {
    fn lookup(&self, label: &str) -> ProductMatch {
        ProductMatch {
            sku: Self::sku_for(label),
            brand: Some(Self::brand_for(label)),
        }
    }
}

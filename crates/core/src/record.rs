//! The canonical cached product record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Brand stamped on records whose payload names none.
pub const DEFAULT_BRAND: &str = "Generic";

/// Category stamped on records whose payload names none.
pub const DEFAULT_CATEGORY: &str = "General";

/// A product as stored in the offline cache.
///
/// Serialized field names match the camelCase shape the UI layer consumes.
/// Upstream fields without a canonical slot are kept in `extra` and
/// flattened back out on serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub brand: String,
    pub category: String,
    pub image_url: String,
    #[serde(default)]
    pub badges: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_keywords: Option<Vec<String>>,
    pub enrichment_source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    pub cached: bool,
    /// Epoch millis of first insertion.
    pub cached_at: i64,
    /// Epoch millis of the most recent read.
    pub last_accessed: i64,
    pub access_count: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProductRecord {
    /// Name used for matching and display; empty when the payload had none.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_camel_case_with_extra_fields() {
        let mut extra = Map::new();
        extra.insert("price".into(), json!(3.49));

        let record = ProductRecord {
            id: "p1".into(),
            name: Some("Whole Milk".into()),
            brand: "Acme".into(),
            category: "Dairy".into(),
            image_url: "https://img.example.com/milk.png".into(),
            badges: vec!["organic".into()],
            nutrition: None,
            search_keywords: None,
            enrichment_source: "offline_cache".into(),
            upstream_id: None,
            barcode: None,
            cached: true,
            cached_at: 1,
            last_accessed: 2,
            access_count: 3,
            extra,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["imageUrl"], "https://img.example.com/milk.png");
        assert_eq!(value["accessCount"], 3);
        assert_eq!(value["price"], 3.49);
        assert!(value.get("nutrition").is_none());

        let back: ProductRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_display_name_defaults_to_empty() {
        let record: ProductRecord = serde_json::from_value(json!({
            "id": "p2",
            "brand": "Generic",
            "category": "General",
            "imageUrl": "data:,",
            "enrichmentSource": "offline_cache",
            "cached": true,
            "cachedAt": 0,
            "lastAccessed": 0,
            "accessCount": 0
        }))
        .unwrap();
        assert_eq!(record.display_name(), "");
        assert!(record.badges.is_empty());
    }
}

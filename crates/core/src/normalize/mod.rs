//! Payload normalization.
//!
//! Upstream sources name the same product fields differently. The
//! [`Normalizer`] coalesces them into one [`ProductRecord`] with a usable id
//! and image, stamping fresh access bookkeeping.

pub mod placeholder;

pub use placeholder::placeholder_image;

use rand::Rng;
use serde_json::{Map, Value};

use crate::Error;
use crate::config::DEFAULT_ENRICHMENT_SOURCE;
use crate::record::{DEFAULT_BRAND, DEFAULT_CATEGORY, ProductRecord};

const NAME_FIELDS: &[&str] = &["name", "productName", "product_name", "title"];
const UPSTREAM_ID_FIELDS: &[&str] = &["upstreamId", "productId", "product_id", "externalId"];
const BARCODE_FIELDS: &[&str] = &["barcode", "upc", "gtin"];
const IMAGE_FIELDS: &[&str] = &["imageUrl", "image_url", "image"];
const SOURCE_FIELDS: &[&str] = &["enrichmentSource", "source"];
const KEYWORD_FIELDS: &[&str] = &["searchKeywords", "search_keywords"];

/// Keys with a canonical slot; everything else is carried in `extra`.
const CONSUMED_FIELDS: &[&str] = &[
    "id",
    "brand",
    "category",
    "badges",
    "nutrition",
    "cached",
    "cachedAt",
    "lastAccessed",
    "accessCount",
];

const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

/// Converts raw product payloads into cache records.
#[derive(Debug, Clone)]
pub struct Normalizer {
    default_source: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_ENRICHMENT_SOURCE)
    }
}

impl Normalizer {
    pub fn new(default_source: impl Into<String>) -> Self {
        Self { default_source: default_source.into() }
    }

    /// Normalize one payload, stamping it as first cached at `now`.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedPayload` if the payload is not a JSON object
    /// or carries an `id` that is neither a string nor a number.
    pub fn normalize(&self, payload: &Value, now: i64) -> Result<ProductRecord, Error> {
        let obj = payload
            .as_object()
            .ok_or_else(|| Error::MalformedPayload(format!("expected an object, got {}", kind_of(payload))))?;

        let name = text_field(obj, NAME_FIELDS);
        let upstream_id = ident_field(obj, UPSTREAM_ID_FIELDS);
        let barcode = ident_field(obj, BARCODE_FIELDS);

        let id = match explicit_id(obj)? {
            Some(id) => id,
            None => match &upstream_id {
                Some(upstream) => format!("{upstream}_{}", random_suffix()),
                None => format!("product_{now}_{}", random_suffix()),
            },
        };

        let image_url = text_field(obj, IMAGE_FIELDS)
            .unwrap_or_else(|| placeholder_image(name.as_deref().unwrap_or_default()));

        let extra: Map<String, Value> = obj
            .iter()
            .filter(|(key, _)| !is_consumed(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(ProductRecord {
            id,
            name,
            brand: text_field(obj, &["brand"]).unwrap_or_else(|| DEFAULT_BRAND.to_string()),
            category: text_field(obj, &["category"]).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            image_url,
            badges: string_list(obj.get("badges")).unwrap_or_default(),
            nutrition: obj.get("nutrition").filter(|v| !v.is_null()).cloned(),
            search_keywords: KEYWORD_FIELDS.iter().find_map(|key| string_list(obj.get(*key))),
            enrichment_source: text_field(obj, SOURCE_FIELDS).unwrap_or_else(|| self.default_source.clone()),
            upstream_id,
            barcode,
            cached: true,
            cached_at: now,
            last_accessed: now,
            access_count: 0,
            extra,
        })
    }
}

fn is_consumed(key: &str) -> bool {
    CONSUMED_FIELDS.contains(&key)
        || [NAME_FIELDS, UPSTREAM_ID_FIELDS, BARCODE_FIELDS, IMAGE_FIELDS, SOURCE_FIELDS, KEYWORD_FIELDS]
            .iter()
            .any(|fields| fields.contains(&key))
}

/// First non-empty string among `keys`.
fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    })
}

/// First non-empty string or number among `keys`, as a string.
fn ident_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn explicit_id(obj: &Map<String, Value>) -> Result<Option<String>, Error> {
    match obj.get("id") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(Error::MalformedPayload(format!("id must be a string or number, got {}", kind_of(other)))),
    }
}

/// String entries of a JSON array; `None` when the value is not an array.
fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    value.and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

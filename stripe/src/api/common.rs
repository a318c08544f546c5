//! Shapes shared by every Stripe object endpoint

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// Body returned by `DELETE /v1/<objects>/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct Deleted {
    pub id: String,
    #[serde(default)]
    pub deleted: bool,
}

/// Stripe metadata as returned by the API
pub type Metadata = HashMap<String, String>;

/// Related objects come back as a bare ID, or as the full object when
/// expanded. Either way only the ID is kept.
pub fn deserialize_expandable_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdOrObject {
        Id(String),
        Object { id: String },
    }

    Ok(Option::<IdOrObject>::deserialize(deserializer)?.map(|v| match v {
        IdOrObject::Id(id) => id,
        IdOrObject::Object { id } => id,
    }))
}

/// Stripe sends `null` for many empty strings
pub fn deserialize_null_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "deserialize_expandable_id")]
        product: Option<String>,
        #[serde(default, deserialize_with = "deserialize_null_string")]
        nickname: String,
    }

    #[test]
    fn expandable_accepts_id_or_object() {
        let bare: Holder = serde_json::from_str(r#"{"product":"prod_1"}"#).unwrap();
        assert_eq!(bare.product.as_deref(), Some("prod_1"));

        let expanded: Holder =
            serde_json::from_str(r#"{"product":{"id":"prod_2","name":"Gold"}}"#).unwrap();
        assert_eq!(expanded.product.as_deref(), Some("prod_2"));

        let missing: Holder = serde_json::from_str(r#"{"product":null}"#).unwrap();
        assert_eq!(missing.product, None);
    }

    #[test]
    fn null_string_becomes_empty() {
        let holder: Holder = serde_json::from_str(r#"{"nickname":null}"#).unwrap();
        assert_eq!(holder.nickname, "");
    }
}

//! Stripe form encoding
//!
//! Stripe takes `application/x-www-form-urlencoded` bodies with bracketed
//! keys for nesting: `recurring[interval]=month`, `images[0]=...`,
//! `metadata[env]=prod`. `FormParams` keeps insertion order so request
//! bodies are deterministic.

use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormParams {
    params: Vec<(String, String)>,
}

impl FormParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn add_optional<K: Into<String>, V: ToString>(self, key: K, value: Option<V>) -> Self {
        match value {
            Some(v) => self.add(key, v),
            None => self,
        }
    }

    /// `key[0]=a&key[1]=b`; an empty list sends `key=""`, which Stripe reads as "clear"
    pub fn add_list<V: ToString>(mut self, key: &str, values: &[V]) -> Self {
        if values.is_empty() {
            self.params.push((key.to_string(), String::new()));
        }
        for (i, value) in values.iter().enumerate() {
            self.params
                .push((format!("{}[{}]", key, i), value.to_string()));
        }
        self
    }

    /// `key[k]=v` for every entry, sorted by key
    pub fn add_map(mut self, key: &str, values: &HashMap<String, String>) -> Self {
        let sorted: BTreeMap<_, _> = values.iter().collect();
        for (k, v) in sorted {
            self.params.push((format!("{}[{}]", key, k), v.clone()));
        }
        self
    }

    /// Metadata entries; empty values delete the key remotely
    pub fn add_metadata(self, metadata: &HashMap<String, String>) -> Self {
        self.add_map("metadata", metadata)
    }

    /// Merge `inner` under `prefix`: `a` becomes `prefix[a]`, `a[b]` becomes `prefix[a][b]`
    pub fn nested(mut self, prefix: &str, inner: FormParams) -> Self {
        for (key, value) in inner.params {
            let nested_key = match key.find('[') {
                Some(pos) => format!("{}[{}]{}", prefix, &key[..pos], &key[pos..]),
                None => format!("{}[{}]", prefix, key),
            };
            self.params.push((nested_key, value));
        }
        self
    }

    /// Ask Stripe to inline a related object in the response
    pub fn expand(mut self, field: &str) -> Self {
        self.params.push(("expand[]".to_string(), field.to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Body form: `a=1&b%5Bc%5D=2`
    pub fn encode(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Query form, empty or starting with `?`
    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            String::new()
        } else {
            format!("?{}", self.encode())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_optional() {
        let params = FormParams::new()
            .add("name", "Gold plan")
            .add("active", true)
            .add_optional("unit_label", None::<String>)
            .add_optional("url", Some("https://example.com"));

        assert_eq!(params.get("name"), Some("Gold plan"));
        assert_eq!(params.get("active"), Some("true"));
        assert_eq!(params.get("unit_label"), None);
        assert_eq!(params.pairs().len(), 3);
    }

    #[test]
    fn list_and_map_use_brackets() {
        let metadata = HashMap::from([
            ("team".to_string(), "billing".to_string()),
            ("env".to_string(), String::new()),
        ]);
        let params = FormParams::new()
            .add_list("images", &["a.png", "b.png"])
            .add_metadata(&metadata);

        assert_eq!(params.get("images[0]"), Some("a.png"));
        assert_eq!(params.get("images[1]"), Some("b.png"));
        assert_eq!(params.get("metadata[env]"), Some(""));
        assert_eq!(params.pairs()[2].0, "metadata[env]");
    }

    #[test]
    fn empty_list_clears() {
        let params = FormParams::new().add_list::<String>("preferred_locales", &[]);
        assert_eq!(params.get("preferred_locales"), Some(""));
    }

    #[test]
    fn nested_prefixes_keys() {
        let tier = FormParams::new()
            .add("up_to", "inf")
            .add("unit_amount", 100)
            .nested("currency_options", FormParams::new().add("eur", 1));
        let params = FormParams::new().nested("tiers[0]", tier);

        assert_eq!(params.get("tiers[0][up_to]"), Some("inf"));
        assert_eq!(params.get("tiers[0][unit_amount]"), Some("100"));
        assert_eq!(params.get("tiers[0][currency_options][eur]"), Some("1"));
    }

    #[test]
    fn encodes_keys_and_values() {
        let params = FormParams::new()
            .add("metadata[note]", "a b&c")
            .expand("latest_invoice");

        assert_eq!(
            params.encode(),
            "metadata%5Bnote%5D=a%20b%26c&expand%5B%5D=latest_invoice"
        );
        assert!(params.to_query_string().starts_with('?'));
        assert_eq!(FormParams::new().to_query_string(), "");
    }
}

//! Customers API

use super::common::{deserialize_expandable_id, Deleted, Metadata};
use super::{ApiError, Client, FormParams};
use serde::Deserialize;
use tfplug::Context;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Customer {
    pub id: String,
    /// Retrieving a deleted customer succeeds with only `id` and `deleted`
    pub deleted: bool,
    pub name: Option<String>,
    pub email: Option<String>,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
    pub shipping: Option<Shipping>,
    pub balance: i64,
    pub invoice_prefix: Option<String>,
    pub invoice_settings: Option<InvoiceSettings>,
    pub next_invoice_sequence: Option<i64>,
    pub preferred_locales: Vec<String>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Address {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl Address {
    /// Non-empty fields as `(key, value)` pairs in Stripe's field names
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("line1", &self.line1),
            ("line2", &self.line2),
            ("city", &self.city),
            ("state", &self.state),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ]
        .into_iter()
        .filter_map(|(key, value)| match value.as_deref() {
            Some(v) if !v.is_empty() => Some((key, v)),
            _ => None,
        })
        .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Shipping {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InvoiceSettings {
    pub footer: Option<String>,
    #[serde(deserialize_with = "deserialize_expandable_id")]
    pub default_payment_method: Option<String>,
    pub custom_fields: Option<Vec<CustomField>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CustomField {
    pub name: String,
    pub value: String,
}

pub struct CustomersApi<'a> {
    client: &'a Client,
}

impl<'a> CustomersApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /v1/customers/{id}
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<Customer, ApiError> {
        self.client
            .get(ctx, &format!("/v1/customers/{}", urlencoding::encode(id)), &FormParams::new())
            .await
    }

    /// POST /v1/customers
    pub async fn create(&self, ctx: &Context, params: &FormParams) -> Result<Customer, ApiError> {
        self.client.post(ctx, "/v1/customers", params).await
    }

    /// POST /v1/customers/{id}
    pub async fn update(
        &self,
        ctx: &Context,
        id: &str,
        params: &FormParams,
    ) -> Result<Customer, ApiError> {
        self.client
            .post(ctx, &format!("/v1/customers/{}", urlencoding::encode(id)), params)
            .await
    }

    /// DELETE /v1/customers/{id}
    pub async fn delete(&self, ctx: &Context, id: &str) -> Result<Deleted, ApiError> {
        self.client
            .delete(ctx, &format!("/v1/customers/{}", urlencoding::encode(id)), &FormParams::new())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::create_test_client;
    use mockito::Server;

    #[test]
    fn address_fields_skip_empty() {
        let address = Address {
            line1: Some("1 Main St".into()),
            line2: Some(String::new()),
            city: Some("Dublin".into()),
            country: Some("IE".into()),
            ..Address::default()
        };

        assert_eq!(
            address.fields(),
            vec![("line1", "1 Main St"), ("city", "Dublin"), ("country", "IE")]
        );
    }

    #[tokio::test]
    async fn get_deleted_customer() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/customers/cus_1")
            .with_body(r#"{"id":"cus_1","object":"customer","deleted":true}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let customer = client
            .customers()
            .get(&Context::new(), "cus_1")
            .await
            .unwrap();

        assert!(customer.deleted);
        assert!(customer.address.is_none());
    }
}

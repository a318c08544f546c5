//! Billing meters API
//!
//! Meters are never deleted, only deactivated.

use super::{ApiError, Client, FormParams};
use serde::Deserialize;
use tfplug::Context;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Meter {
    pub id: String,
    pub display_name: String,
    pub event_name: String,
    pub event_time_window: Option<String>,
    pub status: String,
    pub default_aggregation: Option<DefaultAggregation>,
    pub customer_mapping: Option<CustomerMapping>,
    pub value_settings: Option<ValueSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DefaultAggregation {
    pub formula: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CustomerMapping {
    pub event_payload_key: String,
    #[serde(rename = "type")]
    pub mapping_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ValueSettings {
    pub event_payload_key: String,
}

pub struct BillingMetersApi<'a> {
    client: &'a Client,
}

impl<'a> BillingMetersApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /v1/billing/meters/{id}
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<Meter, ApiError> {
        self.client
            .get(
                ctx,
                &format!("/v1/billing/meters/{}", urlencoding::encode(id)),
                &FormParams::new(),
            )
            .await
    }

    /// POST /v1/billing/meters
    pub async fn create(&self, ctx: &Context, params: &FormParams) -> Result<Meter, ApiError> {
        self.client.post(ctx, "/v1/billing/meters", params).await
    }

    /// POST /v1/billing/meters/{id}
    pub async fn update(
        &self,
        ctx: &Context,
        id: &str,
        params: &FormParams,
    ) -> Result<Meter, ApiError> {
        self.client
            .post(ctx, &format!("/v1/billing/meters/{}", urlencoding::encode(id)), params)
            .await
    }

    /// POST /v1/billing/meters/{id}/deactivate
    pub async fn deactivate(&self, ctx: &Context, id: &str) -> Result<Meter, ApiError> {
        self.client
            .post(
                ctx,
                &format!("/v1/billing/meters/{}/deactivate", urlencoding::encode(id)),
                &FormParams::new(),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::create_test_client;
    use mockito::Server;

    #[tokio::test]
    async fn deactivate_posts_to_action_path() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/billing/meters/mtr_1/deactivate")
            .with_body(r#"{"id":"mtr_1","status":"inactive","customer_mapping":{"event_payload_key":"stripe_customer_id","type":"by_id"}}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let meter = client
            .billing_meters()
            .deactivate(&Context::new(), "mtr_1")
            .await
            .unwrap();

        assert_eq!(meter.status, "inactive");
        assert_eq!(meter.customer_mapping.unwrap().mapping_type, "by_id");
        mock.assert_async().await;
    }
}

//! Prices API
//!
//! Prices cannot be deleted; `archive` deactivates them instead.

use super::common::{deserialize_expandable_id, Metadata};
use super::{ApiError, Client, FormParams};
use serde::Deserialize;
use tfplug::Context;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Price {
    pub id: String,
    pub active: bool,
    pub currency: String,
    #[serde(deserialize_with = "deserialize_expandable_id")]
    pub product: Option<String>,
    pub unit_amount: Option<i64>,
    pub unit_amount_decimal: Option<String>,
    pub nickname: Option<String>,
    pub recurring: Option<Recurring>,
    pub billing_scheme: String,
    pub tiers: Vec<PriceTier>,
    pub tiers_mode: Option<String>,
    pub transform_quantity: Option<TransformQuantity>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Recurring {
    pub interval: String,
    pub aggregate_usage: Option<String>,
    pub interval_count: i64,
    pub usage_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PriceTier {
    /// `None` for the last, unbounded tier
    pub up_to: Option<i64>,
    pub flat_amount: Option<i64>,
    pub flat_amount_decimal: Option<String>,
    pub unit_amount: Option<i64>,
    pub unit_amount_decimal: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransformQuantity {
    pub divide_by: i64,
    pub round: String,
}

pub struct PricesApi<'a> {
    client: &'a Client,
}

impl<'a> PricesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /v1/prices/{id}, tiers expanded
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<Price, ApiError> {
        self.client
            .get(
                ctx,
                &format!("/v1/prices/{}", urlencoding::encode(id)),
                &FormParams::new().expand("tiers"),
            )
            .await
    }

    /// POST /v1/prices
    pub async fn create(&self, ctx: &Context, params: &FormParams) -> Result<Price, ApiError> {
        self.client.post(ctx, "/v1/prices", params).await
    }

    /// POST /v1/prices/{id}
    pub async fn update(
        &self,
        ctx: &Context,
        id: &str,
        params: &FormParams,
    ) -> Result<Price, ApiError> {
        self.client
            .post(ctx, &format!("/v1/prices/{}", urlencoding::encode(id)), params)
            .await
    }

    /// POST /v1/prices/{id} with `active=false`
    pub async fn archive(&self, ctx: &Context, id: &str) -> Result<Price, ApiError> {
        self.update(ctx, id, &FormParams::new().add("active", false))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::create_test_client;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn get_expands_tiers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/prices/price_1")
            .match_query(Matcher::UrlEncoded("expand[]".into(), "tiers".into()))
            .with_body(
                r#"{
                    "id": "price_1",
                    "active": true,
                    "currency": "usd",
                    "product": "prod_1",
                    "unit_amount": null,
                    "billing_scheme": "tiered",
                    "tiers_mode": "graduated",
                    "tiers": [
                        {"up_to": 10, "unit_amount": 500, "flat_amount": null},
                        {"up_to": null, "unit_amount": 400, "flat_amount": 100}
                    ],
                    "recurring": {"interval": "month", "interval_count": 1, "usage_type": "licensed", "aggregate_usage": null}
                }"#,
            )
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let price = client.prices().get(&Context::new(), "price_1").await.unwrap();

        assert_eq!(price.product.as_deref(), Some("prod_1"));
        assert_eq!(price.tiers.len(), 2);
        assert_eq!(price.tiers[0].up_to, Some(10));
        assert_eq!(price.tiers[1].up_to, None);
        assert_eq!(price.recurring.unwrap().interval, "month");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn archive_sets_active_false() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/prices/price_1")
            .match_body(Matcher::UrlEncoded("active".into(), "false".into()))
            .with_body(r#"{"id":"price_1","active":false,"currency":"usd"}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let price = client
            .prices()
            .archive(&Context::new(), "price_1")
            .await
            .unwrap();

        assert!(!price.active);
        mock.assert_async().await;
    }
}

//! Promotion codes API (no delete endpoint)

use super::common::{deserialize_expandable_id, Metadata};
use super::{ApiError, Client, FormParams};
use serde::Deserialize;
use tfplug::Context;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PromotionCode {
    pub id: String,
    #[serde(deserialize_with = "deserialize_expandable_id")]
    pub coupon: Option<String>,
    pub code: String,
    pub active: bool,
    #[serde(deserialize_with = "deserialize_expandable_id")]
    pub customer: Option<String>,
    pub max_redemptions: Option<i64>,
    /// Unix seconds
    pub expires_at: Option<i64>,
    pub restrictions: Option<Restrictions>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Restrictions {
    pub first_time_transaction: bool,
    pub minimum_amount: Option<i64>,
    pub minimum_amount_currency: Option<String>,
}

pub struct PromotionCodesApi<'a> {
    client: &'a Client,
}

impl<'a> PromotionCodesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /v1/promotion_codes/{id}
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<PromotionCode, ApiError> {
        self.client
            .get(
                ctx,
                &format!("/v1/promotion_codes/{}", urlencoding::encode(id)),
                &FormParams::new(),
            )
            .await
    }

    /// POST /v1/promotion_codes
    pub async fn create(
        &self,
        ctx: &Context,
        params: &FormParams,
    ) -> Result<PromotionCode, ApiError> {
        self.client.post(ctx, "/v1/promotion_codes", params).await
    }

    /// POST /v1/promotion_codes/{id}
    pub async fn update(
        &self,
        ctx: &Context,
        id: &str,
        params: &FormParams,
    ) -> Result<PromotionCode, ApiError> {
        self.client
            .post(ctx, &format!("/v1/promotion_codes/{}", urlencoding::encode(id)), params)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::create_test_client;
    use mockito::Server;

    #[tokio::test]
    async fn coupon_object_collapses_to_id() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/promotion_codes/promo_1")
            .with_body(
                r#"{
                    "id": "promo_1",
                    "code": "WELCOME",
                    "active": true,
                    "coupon": {"id": "SUMMER25", "object": "coupon", "percent_off": 25},
                    "customer": null,
                    "restrictions": {"first_time_transaction": true, "minimum_amount": null, "minimum_amount_currency": null}
                }"#,
            )
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let code = client
            .promotion_codes()
            .get(&Context::new(), "promo_1")
            .await
            .unwrap();

        assert_eq!(code.coupon.as_deref(), Some("SUMMER25"));
        assert_eq!(code.customer, None);
        assert!(code.restrictions.unwrap().first_time_transaction);
    }
}

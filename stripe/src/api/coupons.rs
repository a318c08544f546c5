//! Coupons API

use super::common::{Deleted, Metadata};
use super::{ApiError, Client, FormParams};
use serde::Deserialize;
use tfplug::Context;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Coupon {
    pub id: String,
    pub name: Option<String>,
    pub amount_off: Option<i64>,
    pub currency: Option<String>,
    pub percent_off: Option<f64>,
    pub duration: String,
    pub duration_in_months: Option<i64>,
    pub max_redemptions: Option<i64>,
    /// Unix seconds
    pub redeem_by: Option<i64>,
    pub times_redeemed: i64,
    pub applies_to: Option<AppliesTo>,
    pub metadata: Metadata,
    pub valid: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppliesTo {
    pub products: Vec<String>,
}

pub struct CouponsApi<'a> {
    client: &'a Client,
}

impl<'a> CouponsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /v1/coupons/{id}, `applies_to` expanded
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<Coupon, ApiError> {
        self.client
            .get(
                ctx,
                &format!("/v1/coupons/{}", urlencoding::encode(id)),
                &FormParams::new().expand("applies_to"),
            )
            .await
    }

    /// POST /v1/coupons
    pub async fn create(&self, ctx: &Context, params: &FormParams) -> Result<Coupon, ApiError> {
        self.client.post(ctx, "/v1/coupons", params).await
    }

    /// POST /v1/coupons/{id}
    pub async fn update(
        &self,
        ctx: &Context,
        id: &str,
        params: &FormParams,
    ) -> Result<Coupon, ApiError> {
        self.client
            .post(ctx, &format!("/v1/coupons/{}", urlencoding::encode(id)), params)
            .await
    }

    /// DELETE /v1/coupons/{id}
    pub async fn delete(&self, ctx: &Context, id: &str) -> Result<Deleted, ApiError> {
        self.client
            .delete(
                ctx,
                &format!("/v1/coupons/{}", urlencoding::encode(id)),
                &FormParams::new(),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::create_test_client;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn custom_ids_are_path_encoded() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/coupons/SUMMER%2025")
            .match_query(Matcher::Any)
            .with_body(
                r#"{
                    "id": "SUMMER 25",
                    "percent_off": 25.5,
                    "duration": "repeating",
                    "duration_in_months": 3,
                    "redeem_by": 1767225600,
                    "applies_to": {"products": ["prod_1"]},
                    "times_redeemed": 4,
                    "valid": true
                }"#,
            )
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let coupon = client
            .coupons()
            .get(&Context::new(), "SUMMER 25")
            .await
            .unwrap();

        assert_eq!(coupon.percent_off, Some(25.5));
        assert_eq!(coupon.amount_off, None);
        assert_eq!(coupon.applies_to.unwrap().products, vec!["prod_1"]);
        mock.assert_async().await;
    }
}

//! Shipping rates API
//!
//! Shipping rates cannot be deleted; `archive` deactivates them.

use super::common::Metadata;
use super::{ApiError, Client, FormParams};
use serde::Deserialize;
use std::collections::HashMap;
use tfplug::Context;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShippingRate {
    pub id: String,
    #[serde(rename = "type")]
    pub rate_type: String,
    pub display_name: Option<String>,
    pub active: bool,
    pub fixed_amount: Option<FixedAmount>,
    pub delivery_estimate: Option<DeliveryEstimate>,
    pub tax_behavior: Option<String>,
    pub tax_code: Option<String>,
    pub livemode: bool,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FixedAmount {
    pub amount: i64,
    pub currency: String,
    pub currency_options: HashMap<String, CurrencyOption>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CurrencyOption {
    pub amount: i64,
    pub tax_behavior: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeliveryEstimate {
    pub minimum: Option<DeliveryBound>,
    pub maximum: Option<DeliveryBound>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeliveryBound {
    pub unit: String,
    pub value: i64,
}

pub struct ShippingRatesApi<'a> {
    client: &'a Client,
}

impl<'a> ShippingRatesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /v1/shipping_rates/{id}, currency options expanded
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<ShippingRate, ApiError> {
        self.client
            .get(
                ctx,
                &format!("/v1/shipping_rates/{}", urlencoding::encode(id)),
                &FormParams::new().expand("fixed_amount.currency_options"),
            )
            .await
    }

    /// POST /v1/shipping_rates
    pub async fn create(
        &self,
        ctx: &Context,
        params: &FormParams,
    ) -> Result<ShippingRate, ApiError> {
        self.client.post(ctx, "/v1/shipping_rates", params).await
    }

    /// POST /v1/shipping_rates/{id}
    pub async fn update(
        &self,
        ctx: &Context,
        id: &str,
        params: &FormParams,
    ) -> Result<ShippingRate, ApiError> {
        self.client
            .post(ctx, &format!("/v1/shipping_rates/{}", urlencoding::encode(id)), params)
            .await
    }

    /// POST /v1/shipping_rates/{id} with `active=false`
    pub async fn archive(&self, ctx: &Context, id: &str) -> Result<ShippingRate, ApiError> {
        self.update(ctx, id, &FormParams::new().add("active", false))
            .await
    }
}

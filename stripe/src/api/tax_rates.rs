//! Tax rates API (no delete endpoint)

use super::common::Metadata;
use super::{ApiError, Client, FormParams};
use serde::Deserialize;
use tfplug::Context;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaxRate {
    pub id: String,
    pub object: String,
    pub active: bool,
    pub country: Option<String>,
    pub created: i64,
    pub description: Option<String>,
    pub display_name: String,
    pub inclusive: bool,
    pub jurisdiction: Option<String>,
    pub livemode: bool,
    pub metadata: Metadata,
    pub percentage: f64,
    pub state: Option<String>,
    pub tax_type: Option<String>,
}

pub struct TaxRatesApi<'a> {
    client: &'a Client,
}

impl<'a> TaxRatesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /v1/tax_rates/{id}
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<TaxRate, ApiError> {
        self.client
            .get(ctx, &format!("/v1/tax_rates/{}", urlencoding::encode(id)), &FormParams::new())
            .await
    }

    /// POST /v1/tax_rates
    pub async fn create(&self, ctx: &Context, params: &FormParams) -> Result<TaxRate, ApiError> {
        self.client.post(ctx, "/v1/tax_rates", params).await
    }

    /// POST /v1/tax_rates/{id}
    pub async fn update(
        &self,
        ctx: &Context,
        id: &str,
        params: &FormParams,
    ) -> Result<TaxRate, ApiError> {
        self.client
            .post(ctx, &format!("/v1/tax_rates/{}", urlencoding::encode(id)), params)
            .await
    }
}

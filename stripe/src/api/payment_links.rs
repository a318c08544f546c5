//! Payment links API
//!
//! Payment links cannot be deleted; `deactivate` turns the URL off.
//! Line items are only returned when expanded.

use super::common::{deserialize_expandable_id, Metadata};
use super::{ApiError, Client, FormParams};
use serde::Deserialize;
use tfplug::Context;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentLink {
    pub id: String,
    pub url: String,
    pub active: bool,
    pub line_items: Option<LineItemList>,
    pub after_completion: Option<AfterCompletion>,
    pub allow_promotion_codes: bool,
    pub application_fee_amount: Option<i64>,
    pub application_fee_percent: Option<f64>,
    pub automatic_tax: Option<AutomaticTax>,
    pub billing_address_collection: Option<String>,
    pub currency: Option<String>,
    pub customer_creation: Option<String>,
    pub inactive_message: Option<String>,
    #[serde(deserialize_with = "deserialize_expandable_id")]
    pub on_behalf_of: Option<String>,
    pub payment_method_collection: Option<String>,
    pub payment_method_types: Option<Vec<String>>,
    pub submit_type: Option<String>,
    pub livemode: bool,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LineItemList {
    pub data: Vec<LineItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LineItem {
    pub id: String,
    #[serde(deserialize_with = "deserialize_expandable_id")]
    pub price: Option<String>,
    pub quantity: i64,
    pub adjustable_quantity: Option<AdjustableQuantity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdjustableQuantity {
    pub enabled: bool,
    pub maximum: Option<i64>,
    pub minimum: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AfterCompletion {
    #[serde(rename = "type")]
    pub completion_type: String,
    pub hosted_confirmation: Option<HostedConfirmation>,
    pub redirect: Option<Redirect>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HostedConfirmation {
    pub custom_message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Redirect {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AutomaticTax {
    pub enabled: bool,
    pub liability: Option<Liability>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Liability {
    #[serde(rename = "type")]
    pub liability_type: String,
    #[serde(deserialize_with = "deserialize_expandable_id")]
    pub account: Option<String>,
}

pub struct PaymentLinksApi<'a> {
    client: &'a Client,
}

impl<'a> PaymentLinksApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn path(id: &str) -> String {
        format!("/v1/payment_links/{}", urlencoding::encode(id))
    }

    /// GET /v1/payment_links/{id}, line items expanded
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<PaymentLink, ApiError> {
        self.client
            .get(ctx, &Self::path(id), &FormParams::new().expand("line_items"))
            .await
    }

    /// POST /v1/payment_links
    pub async fn create(&self, ctx: &Context, params: &FormParams) -> Result<PaymentLink, ApiError> {
        self.client.post(ctx, "/v1/payment_links", params).await
    }

    /// POST /v1/payment_links/{id}
    pub async fn update(
        &self,
        ctx: &Context,
        id: &str,
        params: &FormParams,
    ) -> Result<PaymentLink, ApiError> {
        self.client.post(ctx, &Self::path(id), params).await
    }

    /// POST /v1/payment_links/{id} with `active=false`
    pub async fn deactivate(&self, ctx: &Context, id: &str) -> Result<PaymentLink, ApiError> {
        self.update(ctx, id, &FormParams::new().add("active", false)).await
    }
}

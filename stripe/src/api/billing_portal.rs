//! Customer portal configurations API
//!
//! There is no delete endpoint; configurations can only be deactivated.

use super::common::{deserialize_expandable_id, Metadata};
use super::{ApiError, Client, FormParams};
use serde::Deserialize;
use tfplug::Context;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PortalConfiguration {
    pub id: String,
    pub active: bool,
    #[serde(deserialize_with = "deserialize_expandable_id")]
    pub application: Option<String>,
    pub business_profile: BusinessProfile,
    pub default_return_url: Option<String>,
    pub features: Features,
    pub is_default: bool,
    /// Unix seconds
    pub created: i64,
    /// Unix seconds
    pub updated: i64,
    pub livemode: bool,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BusinessProfile {
    pub headline: Option<String>,
    pub privacy_policy_url: Option<String>,
    pub terms_of_service_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Features {
    pub customer_update: Option<CustomerUpdate>,
    pub invoice_history: Option<Toggle>,
    pub payment_method_update: Option<Toggle>,
    pub subscription_cancel: Option<SubscriptionCancel>,
    pub subscription_pause: Option<Toggle>,
    pub subscription_update: Option<SubscriptionUpdate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Toggle {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CustomerUpdate {
    pub enabled: bool,
    pub allowed_updates: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubscriptionCancel {
    pub enabled: bool,
    pub cancellation_reason: Option<CancellationReason>,
    pub mode: Option<String>,
    pub proration_behavior: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CancellationReason {
    pub enabled: bool,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubscriptionUpdate {
    pub enabled: bool,
    pub default_allowed_updates: Vec<String>,
    pub products: Vec<SubscriptionUpdateProduct>,
    pub proration_behavior: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubscriptionUpdateProduct {
    pub product: String,
    pub prices: Vec<String>,
}

pub struct BillingPortalApi<'a> {
    client: &'a Client,
}

impl<'a> BillingPortalApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn path(id: &str) -> String {
        format!("/v1/billing_portal/configurations/{}", urlencoding::encode(id))
    }

    /// GET /v1/billing_portal/configurations/{id}
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<PortalConfiguration, ApiError> {
        self.client.get(ctx, &Self::path(id), &FormParams::new()).await
    }

    /// POST /v1/billing_portal/configurations
    pub async fn create(
        &self,
        ctx: &Context,
        params: &FormParams,
    ) -> Result<PortalConfiguration, ApiError> {
        self.client
            .post(ctx, "/v1/billing_portal/configurations", params)
            .await
    }

    /// POST /v1/billing_portal/configurations/{id}
    pub async fn update(
        &self,
        ctx: &Context,
        id: &str,
        params: &FormParams,
    ) -> Result<PortalConfiguration, ApiError> {
        self.client.post(ctx, &Self::path(id), params).await
    }
}

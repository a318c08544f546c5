//! Webhook endpoints API

use super::common::{Deleted, Metadata};
use super::{ApiError, Client, FormParams};
use serde::Deserialize;
use tfplug::Context;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebhookEndpoint {
    pub id: String,
    pub url: String,
    pub enabled_events: Vec<String>,
    pub description: Option<String>,
    pub api_version: Option<String>,
    pub application: Option<String>,
    /// Only present in the create response
    pub secret: Option<String>,
    pub status: String,
    /// Unix seconds
    pub created: i64,
    pub livemode: bool,
    pub metadata: Metadata,
}

pub struct WebhookEndpointsApi<'a> {
    client: &'a Client,
}

impl<'a> WebhookEndpointsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /v1/webhook_endpoints/{id}
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<WebhookEndpoint, ApiError> {
        self.client
            .get(
                ctx,
                &format!("/v1/webhook_endpoints/{}", urlencoding::encode(id)),
                &FormParams::new(),
            )
            .await
    }

    /// POST /v1/webhook_endpoints
    pub async fn create(
        &self,
        ctx: &Context,
        params: &FormParams,
    ) -> Result<WebhookEndpoint, ApiError> {
        self.client.post(ctx, "/v1/webhook_endpoints", params).await
    }

    /// POST /v1/webhook_endpoints/{id}
    pub async fn update(
        &self,
        ctx: &Context,
        id: &str,
        params: &FormParams,
    ) -> Result<WebhookEndpoint, ApiError> {
        self.client
            .post(ctx, &format!("/v1/webhook_endpoints/{}", urlencoding::encode(id)), params)
            .await
    }

    /// DELETE /v1/webhook_endpoints/{id}
    pub async fn delete(&self, ctx: &Context, id: &str) -> Result<Deleted, ApiError> {
        self.client
            .delete(
                ctx,
                &format!("/v1/webhook_endpoints/{}", urlencoding::encode(id)),
                &FormParams::new(),
            )
            .await
    }
}

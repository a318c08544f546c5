//! Entitlement features and their attachment to products

use super::common::{deserialize_expandable_id, Deleted, Metadata};
use super::{ApiError, Client, FormParams};
use serde::Deserialize;
use tfplug::Context;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Feature {
    pub id: String,
    pub object: String,
    pub lookup_key: String,
    pub name: String,
    pub active: bool,
    pub livemode: bool,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductFeature {
    pub id: String,
    pub object: String,
    #[serde(deserialize_with = "deserialize_expandable_id")]
    pub entitlement_feature: Option<String>,
    pub livemode: bool,
}

pub struct EntitlementsApi<'a> {
    client: &'a Client,
}

impl<'a> EntitlementsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /v1/entitlements/features/{id}
    pub async fn get_feature(&self, ctx: &Context, id: &str) -> Result<Feature, ApiError> {
        self.client
            .get(
                ctx,
                &format!("/v1/entitlements/features/{}", urlencoding::encode(id)),
                &FormParams::new(),
            )
            .await
    }

    /// POST /v1/entitlements/features
    pub async fn create_feature(
        &self,
        ctx: &Context,
        params: &FormParams,
    ) -> Result<Feature, ApiError> {
        self.client
            .post(ctx, "/v1/entitlements/features", params)
            .await
    }

    /// POST /v1/entitlements/features/{id}
    pub async fn update_feature(
        &self,
        ctx: &Context,
        id: &str,
        params: &FormParams,
    ) -> Result<Feature, ApiError> {
        self.client
            .post(ctx, &format!("/v1/entitlements/features/{}", urlencoding::encode(id)), params)
            .await
    }

    /// Features cannot be deleted, only archived
    pub async fn deactivate_feature(&self, ctx: &Context, id: &str) -> Result<Feature, ApiError> {
        self.update_feature(ctx, id, &FormParams::new().add("active", false))
            .await
    }

    /// GET /v1/products/{product}/features/{id}
    pub async fn get_product_feature(
        &self,
        ctx: &Context,
        product: &str,
        id: &str,
    ) -> Result<ProductFeature, ApiError> {
        self.client
            .get(
                ctx,
                &format!(
                    "/v1/products/{}/features/{}",
                    urlencoding::encode(product),
                    urlencoding::encode(id),
                ),
                &FormParams::new(),
            )
            .await
    }

    /// POST /v1/products/{product}/features
    pub async fn attach_product_feature(
        &self,
        ctx: &Context,
        product: &str,
        feature: &str,
    ) -> Result<ProductFeature, ApiError> {
        self.client
            .post(
                ctx,
                &format!("/v1/products/{}/features", urlencoding::encode(product)),
                &FormParams::new().add("entitlement_feature", feature),
            )
            .await
    }

    /// DELETE /v1/products/{product}/features/{id}
    pub async fn detach_product_feature(
        &self,
        ctx: &Context,
        product: &str,
        id: &str,
    ) -> Result<Deleted, ApiError> {
        self.client
            .delete(
                ctx,
                &format!(
                    "/v1/products/{}/features/{}",
                    urlencoding::encode(product),
                    urlencoding::encode(id),
                ),
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
    async fn attach_posts_under_product() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/products/prod_1/features")
            .match_body(Matcher::UrlEncoded(
                "entitlement_feature".into(),
                "feat_1".into(),
            ))
            .with_body(
                r#"{"id":"prodft_1","object":"product_feature","livemode":false,
                    "entitlement_feature":{"id":"feat_1","object":"entitlements.feature","lookup_key":"sso"}}"#,
            )
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let attached = client
            .entitlements()
            .attach_product_feature(&Context::new(), "prod_1", "feat_1")
            .await
            .unwrap();

        assert_eq!(attached.id, "prodft_1");
        assert_eq!(attached.entitlement_feature.as_deref(), Some("feat_1"));
        mock.assert_async().await;
    }
}

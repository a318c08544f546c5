//! Products API

use super::common::{Deleted, Metadata};
use super::{ApiError, Client, FormParams};
use serde::Deserialize;
use tfplug::Context;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub url: Option<String>,
    pub statement_descriptor: Option<String>,
    pub unit_label: Option<String>,
    pub metadata: Metadata,
}

pub struct ProductsApi<'a> {
    client: &'a Client,
}

impl<'a> ProductsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /v1/products/{id}
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<Product, ApiError> {
        self.client
            .get(ctx, &format!("/v1/products/{}", urlencoding::encode(id)), &FormParams::new())
            .await
    }

    /// POST /v1/products
    pub async fn create(&self, ctx: &Context, params: &FormParams) -> Result<Product, ApiError> {
        self.client.post(ctx, "/v1/products", params).await
    }

    /// POST /v1/products/{id}
    pub async fn update(
        &self,
        ctx: &Context,
        id: &str,
        params: &FormParams,
    ) -> Result<Product, ApiError> {
        self.client
            .post(ctx, &format!("/v1/products/{}", urlencoding::encode(id)), params)
            .await
    }

    /// DELETE /v1/products/{id}
    pub async fn delete(&self, ctx: &Context, id: &str) -> Result<Deleted, ApiError> {
        self.client
            .delete(ctx, &format!("/v1/products/{}", urlencoding::encode(id)), &FormParams::new())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::create_test_client;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn get_product_tolerates_nulls() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/products/prod_1")
            .with_body(
                r#"{
                    "id": "prod_1",
                    "object": "product",
                    "name": "Gold",
                    "active": true,
                    "description": null,
                    "images": [],
                    "url": null,
                    "unit_label": "seat",
                    "metadata": {"tier": "1"}
                }"#,
            )
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let product = client
            .products()
            .get(&Context::new(), "prod_1")
            .await
            .unwrap();

        assert_eq!(product.name, "Gold");
        assert!(product.active);
        assert_eq!(product.description, None);
        assert_eq!(product.unit_label.as_deref(), Some("seat"));
        assert_eq!(product.metadata.get("tier").map(String::as_str), Some("1"));
    }

    #[tokio::test]
    async fn create_posts_form() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/products")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("name".into(), "Gold".into()),
                Matcher::UrlEncoded("images[0]".into(), "https://img/1.png".into()),
            ]))
            .with_body(r#"{"id":"prod_9","name":"Gold","active":true}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let params = FormParams::new()
            .add("name", "Gold")
            .add_list("images", &["https://img/1.png"]);
        let product = client
            .products()
            .create(&Context::new(), &params)
            .await
            .unwrap();

        assert_eq!(product.id, "prod_9");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn delete_returns_deleted_marker() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/v1/products/prod_1")
            .with_body(r#"{"id":"prod_1","object":"product","deleted":true}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let deleted = client
            .products()
            .delete(&Context::new(), "prod_1")
            .await
            .unwrap();

        assert!(deleted.deleted);
    }

    #[tokio::test]
    async fn imported_ids_cannot_escape_the_product_path() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/v1/products/prod%2F1%3Fexpand%3Dx")
            .with_body(r#"{"id":"prod/1?expand=x","deleted":true}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let deleted = client
            .products()
            .delete(&Context::new(), "prod/1?expand=x")
            .await
            .unwrap();

        assert!(deleted.deleted);
        mock.assert_async().await;
    }
}

//! stripe_product

use super::{non_empty, non_empty_list, non_empty_map, update_metadata, StripeResource};
use crate::api::{Client, FormParams};
use crate::diagnostics::{api_error, call_set};
use crate::resource_data::ResourceData;
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::validator::ListLength;
use tfplug::{AttributeBuilder, AttributeType, Diagnostic, Schema, SchemaBuilder};

#[derive(Default)]
pub struct ProductResource;

#[async_trait]
impl StripeResource for ProductResource {
    fn type_name(&self) -> &'static str {
        "stripe_product"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Products describe the goods or services you sell")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Unique identifier for the product")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The product's name, meant to be displayable to the customer")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("active", AttributeType::Bool)
                    .description("Whether the product is currently available for purchase")
                    .default(StaticDefault::bool(true))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("The product's description, meant to be displayable to the customer")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("images", AttributeType::string_list())
                    .description("A list of up to 8 URLs of images for this product")
                    .optional()
                    .validator(ListLength::at_most(8))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("url", AttributeType::String)
                    .description("A URL of a publicly-accessible webpage for this product")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("statement_descriptor", AttributeType::String)
                    .description("Extra information about a product which will appear on the customer's statement")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("unit_label", AttributeType::String)
                    .description("A label that represents units of this product")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("metadata", AttributeType::string_map())
                    .description("Set of key-value pairs attached to the object")
                    .optional()
                    .build(),
            )
            .build()
    }

    async fn create(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let mut params = FormParams::new()
            .add("name", d.extract_string("name"))
            .add("active", d.extract_bool("active"))
            .add_optional("description", d.optional_string("description"))
            .add_optional("url", d.optional_string("url"))
            .add_optional("statement_descriptor", d.optional_string("statement_descriptor"))
            .add_optional("unit_label", d.optional_string("unit_label"));
        if d.get_ok("images").is_some() {
            params = params.add_list("images", &d.extract_string_list("images"));
        }
        if d.get_ok("metadata").is_some() {
            params = params.add_metadata(&d.extract_string_map("metadata"));
        }

        match client.products().create(ctx, &params).await {
            Ok(product) => d.set_id(&product.id),
            Err(e) => return vec![api_error("create product", e)],
        }

        self.read(ctx, client, d).await
    }

    async fn read(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let product = match client.products().get(ctx, &d.id()).await {
            Ok(product) => product,
            Err(e) => return vec![api_error("read product", e)],
        };

        call_set([
            d.set("name", product.name),
            d.set("active", product.active),
            d.set("description", non_empty(product.description)),
            d.set("images", non_empty_list(product.images)),
            d.set("url", non_empty(product.url)),
            d.set("statement_descriptor", non_empty(product.statement_descriptor)),
            d.set("unit_label", non_empty(product.unit_label)),
            d.set("metadata", non_empty_map(product.metadata)),
        ])
    }

    async fn update(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let mut params = FormParams::new();
        for name in ["name", "description", "url", "statement_descriptor", "unit_label"] {
            if d.has_change(name) {
                params = params.add(name, d.extract_string(name));
            }
        }
        if d.has_change("active") {
            params = params.add("active", d.extract_bool("active"));
        }
        if d.has_change("images") {
            params = params.add_list("images", &d.extract_string_list("images"));
        }
        params = update_metadata(d, params);

        if !params.is_empty() {
            if let Err(e) = client.products().update(ctx, &d.id(), &params).await {
                return vec![api_error("update product", e)];
            }
        }

        self.read(ctx, client, d).await
    }

    async fn delete(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        if let Err(e) = client.products().delete(ctx, &d.id()).await {
            return vec![api_error("delete product", e)];
        }
        d.set_id("");
        vec![]
    }
}

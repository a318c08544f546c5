//! stripe_balance
//!
//! The account balance, split into funds available for payout and funds
//! still pending.

use crate::api::balance::Amount;
use crate::diagnostics::api_error;
use crate::provider_data::StripeProviderData;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource,
    DataSourceMetadataRequest, DataSourceMetadataResponse, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse, ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::validator::validate_config;
use tfplug::{
    downcast_provider_data, AttributeBuilder, AttributePath, AttributeType, Diagnostic, Dynamic,
    DynamicValue, Schema, SchemaBuilder,
};

#[derive(Default)]
pub struct BalanceDataSource {
    provider_data: Option<Arc<StripeProviderData>>,
}

impl BalanceDataSource {
    fn amounts_type() -> AttributeType {
        AttributeType::object_list(&[
            ("amount", AttributeType::String),
            ("currency", AttributeType::String),
            ("source_types", AttributeType::string_map()),
        ])
    }

    fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Current balance of the Stripe account")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("livemode", AttributeType::Bool)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("available", Self::amounts_type())
                    .description("Funds available to be paid out, per currency")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("pending", Self::amounts_type())
                    .description("Funds not yet available, per currency")
                    .computed()
                    .build(),
            )
            .build()
    }
}

/// Amounts are kept as strings; balances in minor units can exceed what a
/// float represents exactly
fn flatten_amounts(amounts: Vec<Amount>) -> Dynamic {
    Dynamic::List(
        amounts
            .into_iter()
            .map(|a| {
                let source_types: HashMap<String, Dynamic> = a
                    .source_types
                    .into_iter()
                    .map(|(k, v)| (k, Dynamic::String(v.to_string())))
                    .collect();
                Dynamic::Map(HashMap::from([
                    ("amount".to_string(), Dynamic::String(a.amount.to_string())),
                    ("currency".to_string(), Dynamic::String(a.currency)),
                    ("source_types".to_string(), Dynamic::Map(source_types)),
                ]))
            })
            .collect(),
    )
}

#[async_trait]
impl DataSource for BalanceDataSource {
    fn type_name(&self) -> &str {
        "stripe_balance"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        DataSourceSchemaResponse {
            schema: Self::schema_static(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: validate_config(&Self::schema_static(), &request.config),
        }
    }

    async fn read(&self, ctx: Context, _request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let client = match &self.provider_data {
            Some(data) => &data.client,
            None => {
                return ReadDataSourceResponse::failed(Diagnostic::error(
                    "Provider not configured",
                    "Provider data was not properly configured",
                ))
            }
        };

        let balance = match client.balance().get(&ctx).await {
            Ok(balance) => balance,
            Err(e) => return ReadDataSourceResponse::failed(api_error("read balance", e)),
        };

        let mut state = DynamicValue::object();
        let results = [
            state.set(&AttributePath::new("id"), "balance"),
            state.set(&AttributePath::new("livemode"), balance.livemode),
            state.set(&AttributePath::new("available"), flatten_amounts(balance.available)),
            state.set(&AttributePath::new("pending"), flatten_amounts(balance.pending)),
        ];
        let diagnostics = results
            .into_iter()
            .filter_map(|result| result.err())
            .map(|e| Diagnostic::error("Failed to set state", e.to_string()))
            .collect();

        ReadDataSourceResponse { state, diagnostics }
    }
}

#[async_trait]
impl DataSourceWithConfigure for BalanceDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        match downcast_provider_data::<StripeProviderData>(request.provider_data, "data source") {
            Ok(data) => {
                self.provider_data = Some(data);
                ConfigureDataSourceResponse::default()
            }
            Err(diag) => ConfigureDataSourceResponse {
                diagnostics: vec![diag],
            },
        }
    }
}

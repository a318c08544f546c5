//! Resource implementations
//!
//! Each Stripe object implements [`StripeResource`]: a schema plus CRUD
//! handlers over a [`ResourceData`]. [`ResourceAdapter`] turns that into the
//! framework's `Resource` traits, handling provider data, validation,
//! defaults, and the mapping of handler outcomes to new state.

pub mod coupon;
pub mod customer;
pub mod entitlements_feature;
pub mod meter;
pub mod payment_link;
pub mod portal_configuration;
pub mod price;
pub mod product;
pub mod product_feature;
pub mod promotion_code;
pub mod shipping_rate;
pub mod tax_rate;
pub mod webhook_endpoint;

#[cfg(test)]
pub(crate) mod testing;

use crate::api::{Client, FormParams};
use crate::metadata::reconcile;
use crate::provider_data::StripeProviderData;
use crate::resource_data::ResourceData;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure,
    ResourceWithImportState, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::validator::validate_config;
use tfplug::{
    downcast_provider_data, import_state_passthrough_id, AttributePath, Diagnostic, Dynamic,
    DynamicValue, ResourceFactory, Schema,
};

pub use coupon::CouponResource;
pub use customer::CustomerResource;
pub use entitlements_feature::EntitlementsFeatureResource;
pub use meter::MeterResource;
pub use payment_link::PaymentLinkResource;
pub use portal_configuration::PortalConfigurationResource;
pub use price::PriceResource;
pub use product::ProductResource;
pub use product_feature::ProductFeatureResource;
pub use promotion_code::PromotionCodeResource;
pub use shipping_rate::ShippingRateResource;
pub use tax_rate::TaxRateResource;
pub use webhook_endpoint::WebhookEndpointResource;

/// One Stripe object type
#[async_trait]
pub trait StripeResource: Send + Sync + 'static {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// Cross-attribute checks beyond the per-attribute validators
    fn validate(&self, _config: &DynamicValue) -> Vec<Diagnostic> {
        vec![]
    }

    /// Create the object, set the ID, then read it back
    async fn create(&self, ctx: &Context, client: &Client, d: &mut ResourceData)
        -> Vec<Diagnostic>;

    /// Refresh state; clearing the ID removes the resource from state
    async fn read(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic>;

    async fn update(&self, ctx: &Context, client: &Client, d: &mut ResourceData)
        -> Vec<Diagnostic>;

    async fn delete(&self, ctx: &Context, client: &Client, d: &mut ResourceData)
        -> Vec<Diagnostic>;

    /// Import ID copied into `id`
    fn import_state(
        &self,
        ctx: &Context,
        request: &ImportResourceStateRequest,
        response: &mut ImportResourceStateResponse,
    ) {
        import_state_passthrough_id(ctx, AttributePath::new("id"), request, response);
    }
}

pub struct ResourceAdapter<R> {
    resource: R,
    provider_data: Option<Arc<StripeProviderData>>,
}

impl<R: StripeResource> ResourceAdapter<R> {
    pub fn new(resource: R) -> Self {
        Self {
            resource,
            provider_data: None,
        }
    }

    fn client(&self) -> Result<&Client, Diagnostic> {
        self.provider_data
            .as_ref()
            .map(|data| &data.client)
            .ok_or_else(|| {
                Diagnostic::error(
                    "Provider not configured",
                    "Provider data was not properly configured",
                )
            })
    }
}

/// Factory building an unconfigured adapter around `R::default()`
pub fn factory<R: StripeResource + Default>() -> ResourceFactory {
    Box::new(|| Box::new(ResourceAdapter::new(R::default())))
}

#[async_trait]
impl<R: StripeResource> Resource for ResourceAdapter<R> {
    fn type_name(&self) -> &str {
        self.resource.type_name()
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: self.resource.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: self.resource.schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = validate_config(&self.resource.schema(), &request.config);
        diagnostics.extend(self.resource.validate(&request.config));
        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let client = match self.client() {
            Ok(client) => client,
            Err(diag) => return CreateResourceResponse::failed(diag),
        };

        tracing::debug!("Creating {}", self.resource.type_name());
        let mut d = ResourceData::for_create(&self.resource.schema(), &request.planned_state);
        let diagnostics = self.resource.create(&ctx, client, &mut d).await;

        // an object that exists remotely stays in state even if the read-back failed
        CreateResourceResponse {
            new_state: d.into_state().unwrap_or_else(DynamicValue::null),
            diagnostics,
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let mut d = ResourceData::for_read(&request.current_state);
        if d.id().is_empty() {
            return ReadResourceResponse::removed();
        }

        let client = match self.client() {
            Ok(client) => client,
            Err(diag) => {
                return ReadResourceResponse::refreshed_or_current(
                    request.current_state,
                    None,
                    vec![diag],
                )
            }
        };

        let diagnostics = self.resource.read(&ctx, client, &mut d).await;
        if d.id().is_empty() {
            tracing::info!(
                "{} no longer exists remotely, removing from state",
                self.resource.type_name()
            );
        }
        ReadResourceResponse::refreshed_or_current(request.current_state, d.into_state(), diagnostics)
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let client = match self.client() {
            Ok(client) => client,
            Err(diag) => {
                return UpdateResourceResponse::updated_or_prior(
                    request.prior_state,
                    DynamicValue::null(),
                    vec![diag],
                )
            }
        };

        let mut d = ResourceData::for_update(&request.prior_state, &request.planned_state);
        tracing::debug!("Updating {} {}", self.resource.type_name(), d.id());
        let diagnostics = self.resource.update(&ctx, client, &mut d).await;
        let updated = d.into_state().unwrap_or_else(DynamicValue::null);

        UpdateResourceResponse::updated_or_prior(request.prior_state, updated, diagnostics)
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let client = match self.client() {
            Ok(client) => client,
            Err(diag) => {
                return DeleteResourceResponse {
                    diagnostics: vec![diag],
                }
            }
        };

        let mut d = ResourceData::for_read(&request.prior_state);
        tracing::debug!("Deleting {} {}", self.resource.type_name(), d.id());
        let diagnostics = self.resource.delete(&ctx, client, &mut d).await;

        DeleteResourceResponse { diagnostics }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl<R: StripeResource> ResourceWithConfigure for ResourceAdapter<R> {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        match downcast_provider_data::<StripeProviderData>(request.provider_data, "resource") {
            Ok(data) => {
                self.provider_data = Some(data);
                ConfigureResourceResponse::default()
            }
            Err(diag) => ConfigureResourceResponse {
                diagnostics: vec![diag],
            },
        }
    }
}

#[async_trait]
impl<R: StripeResource> ResourceWithImportState for ResourceAdapter<R> {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse::default();
        self.resource.import_state(&ctx, &request, &mut response);
        response
    }
}

/// Add `metadata[...]` entries reconciling prior state with the plan, when
/// the metadata attribute changed
pub(crate) fn update_metadata(d: &ResourceData, params: FormParams) -> FormParams {
    if !d.has_change("metadata") {
        return params;
    }
    let (previous, desired) = d.string_map_change("metadata");
    params.add_metadata(&reconcile(&previous, &desired))
}

/// Stripe reports unset strings as `null` or `""`; state keeps them null
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Empty maps are stored as null so an unset `metadata` stays unset
pub(crate) fn non_empty_map<V>(map: HashMap<String, V>) -> Option<HashMap<String, V>> {
    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

pub(crate) fn non_empty_list<T>(list: Vec<T>) -> Option<Vec<T>> {
    if list.is_empty() {
        None
    } else {
        Some(list)
    }
}

/// Null when Stripe reports its own default for a value the configuration
/// left out, so the omission does not show up as a diff
pub(crate) fn unless_default(remote: Dynamic, configured: &Dynamic, default: Dynamic) -> Dynamic {
    if configured.is_null() && remote == default {
        Dynamic::Null
    } else {
        remote
    }
}

/// Unix seconds from an RFC3339 timestamp
pub(crate) fn unix_from_rfc3339(value: &str) -> Result<i64, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.timestamp())
        .map_err(|e| format!("'{}' is not an RFC3339 timestamp: {}", value, e))
}

/// RFC3339 (UTC, second precision) from Unix seconds
pub(crate) fn rfc3339_from_unix(seconds: i64) -> String {
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

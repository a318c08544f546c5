//! Helpers for driving resources against a mock server

use super::{ResourceAdapter, StripeResource};
use crate::api::test_helpers::create_test_client;
use crate::provider_data::StripeProviderData;
use std::any::Any;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::resource::{
    ConfigureResourceRequest, CreateResourceRequest, CreateResourceResponse, DeleteResourceRequest,
    DeleteResourceResponse, ReadResourceRequest, ReadResourceResponse, Resource,
    ResourceWithConfigure, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest,
};
use tfplug::types::ClientCapabilities;
use tfplug::{AttributePath, Diagnostic, Dynamic, DynamicValue};

pub async fn configured<R: StripeResource>(resource: R, url: &str) -> ResourceAdapter<R> {
    let mut adapter = ResourceAdapter::new(resource);
    let data: Arc<dyn Any + Send + Sync> =
        Arc::new(StripeProviderData::new(create_test_client(url)));
    let response = adapter
        .configure(
            Context::new(),
            ConfigureResourceRequest {
                provider_data: Some(data),
            },
        )
        .await;
    assert!(response.diagnostics.is_empty());
    adapter
}

/// Object value from `(name, value)` pairs
pub fn object(pairs: Vec<(&str, Dynamic)>) -> DynamicValue {
    DynamicValue::new(Dynamic::Map(
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
    ))
}

pub fn block(pairs: Vec<(&str, Dynamic)>) -> Dynamic {
    object(pairs).value
}

pub async fn create<R: StripeResource>(
    adapter: &ResourceAdapter<R>,
    planned: DynamicValue,
) -> CreateResourceResponse {
    adapter
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: adapter.type_name().to_string(),
                config: planned.clone(),
                planned_state: planned,
            },
        )
        .await
}

pub async fn read<R: StripeResource>(
    adapter: &ResourceAdapter<R>,
    current: DynamicValue,
) -> ReadResourceResponse {
    adapter
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: adapter.type_name().to_string(),
                current_state: current,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await
}

pub async fn update<R: StripeResource>(
    adapter: &ResourceAdapter<R>,
    prior: DynamicValue,
    planned: DynamicValue,
) -> UpdateResourceResponse {
    adapter
        .update(
            Context::new(),
            UpdateResourceRequest {
                type_name: adapter.type_name().to_string(),
                prior_state: prior,
                config: planned.clone(),
                planned_state: planned,
            },
        )
        .await
}

pub async fn delete<R: StripeResource>(
    adapter: &ResourceAdapter<R>,
    prior: DynamicValue,
) -> DeleteResourceResponse {
    adapter
        .delete(
            Context::new(),
            DeleteResourceRequest {
                type_name: adapter.type_name().to_string(),
                prior_state: prior,
            },
        )
        .await
}

pub async fn validate<R: StripeResource>(
    adapter: &ResourceAdapter<R>,
    config: DynamicValue,
) -> Vec<Diagnostic> {
    adapter
        .validate(
            Context::new(),
            ValidateResourceConfigRequest {
                type_name: adapter.type_name().to_string(),
                config,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await
        .diagnostics
}

pub fn string_at(state: &DynamicValue, path: AttributePath) -> String {
    state.get_string(&path).unwrap_or_default()
}

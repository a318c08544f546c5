//! Managed resources
//!
//! A resource instance comes out of its [`ResourceFactory`](crate::ResourceFactory),
//! receives the provider data once through [`ResourceWithConfigure`], and is
//! then driven through validate and apply calls. Every call returns its
//! diagnostics alongside the new state; on errors the caller keeps whatever
//! state the response hands back.

use crate::context::Context;
use crate::schema::Schema;
use crate::types::{has_errors, ClientCapabilities, Diagnostic, DynamicValue};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[async_trait]
pub trait Resource: Send + Sync {
    /// Full type name, e.g. "stripe_product"; equal to the factory key
    fn type_name(&self) -> &str;

    async fn metadata(
        &self,
        ctx: Context,
        request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse;

    async fn schema(&self, ctx: Context, request: ResourceSchemaRequest) -> ResourceSchemaResponse;

    /// Plan-time checks on the configuration alone; unknown values are skipped
    async fn validate(
        &self,
        ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse;

    /// Create the remote object. The new state must have every computed
    /// attribute resolved.
    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse;

    /// Refresh; `new_state: None` drops the object from state
    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse;

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse;

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse;

    /// Resources that support `terraform import` return themselves here
    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        None
    }
}

pub struct ResourceMetadataRequest;

pub struct ResourceMetadataResponse {
    pub type_name: String,
}

pub struct ResourceSchemaRequest;

pub struct ResourceSchemaResponse {
    pub schema: Schema,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone)]
pub struct ValidateResourceConfigRequest {
    pub type_name: String,
    pub config: DynamicValue,
    pub client_capabilities: ClientCapabilities,
}

#[derive(Debug, Default)]
pub struct ValidateResourceConfigResponse {
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone)]
pub struct CreateResourceRequest {
    pub type_name: String,
    pub planned_state: DynamicValue,
    pub config: DynamicValue,
}

#[derive(Debug)]
pub struct CreateResourceResponse {
    pub new_state: DynamicValue,
    pub diagnostics: Vec<Diagnostic>,
}

impl CreateResourceResponse {
    /// Nothing was created
    pub fn failed(diagnostic: Diagnostic) -> Self {
        Self {
            new_state: DynamicValue::null(),
            diagnostics: vec![diagnostic],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReadResourceRequest {
    pub type_name: String,
    pub current_state: DynamicValue,
    pub client_capabilities: ClientCapabilities,
}

#[derive(Debug)]
pub struct ReadResourceResponse {
    /// None removes the resource from state
    pub new_state: Option<DynamicValue>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ReadResourceResponse {
    /// The object is gone remotely
    pub fn removed() -> Self {
        Self {
            new_state: None,
            diagnostics: vec![],
        }
    }

    /// Keep `current` when any diagnostic is an error, otherwise take `refreshed`
    pub fn refreshed_or_current(
        current: DynamicValue,
        refreshed: Option<DynamicValue>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let new_state = if has_errors(&diagnostics) {
            Some(current)
        } else {
            refreshed
        };
        Self {
            new_state,
            diagnostics,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpdateResourceRequest {
    pub type_name: String,
    pub prior_state: DynamicValue,
    pub planned_state: DynamicValue,
    pub config: DynamicValue,
}

#[derive(Debug)]
pub struct UpdateResourceResponse {
    pub new_state: DynamicValue,
    pub diagnostics: Vec<Diagnostic>,
}

impl UpdateResourceResponse {
    /// Keep `prior` when any diagnostic is an error, otherwise take `updated`
    pub fn updated_or_prior(
        prior: DynamicValue,
        updated: DynamicValue,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let new_state = if has_errors(&diagnostics) {
            prior
        } else {
            updated
        };
        Self {
            new_state,
            diagnostics,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeleteResourceRequest {
    pub type_name: String,
    pub prior_state: DynamicValue,
}

#[derive(Debug, Default)]
pub struct DeleteResourceResponse {
    pub diagnostics: Vec<Diagnostic>,
}

/// Receives `ConfigureProviderResponse::provider_data` right after the
/// factory builds the resource
#[async_trait]
pub trait ResourceWithConfigure: Resource {
    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse;
}

pub struct ConfigureResourceRequest {
    pub provider_data: Option<Arc<dyn Any + Send + Sync>>,
}

#[derive(Debug, Default)]
pub struct ConfigureResourceResponse {
    pub diagnostics: Vec<Diagnostic>,
}

#[async_trait]
pub trait ResourceWithImportState: Resource {
    /// Turn an import ID into enough state for the following read
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse;
}

#[derive(Debug, Clone)]
pub struct ImportResourceStateRequest {
    pub type_name: String,
    pub id: String,
    pub client_capabilities: ClientCapabilities,
}

#[derive(Debug, Default)]
pub struct ImportResourceStateResponse {
    pub imported_resources: Vec<ImportedResource>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug)]
pub struct ImportedResource {
    pub type_name: String,
    pub state: DynamicValue,
}

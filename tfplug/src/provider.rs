//! Provider trait and related types
//!
//! A provider validates and consumes its own configuration, then hands an
//! opaque `provider_data` value to every resource and data source it creates.

use crate::context::Context;
use crate::data_source::DataSourceWithConfigure;
use crate::resource::ResourceWithConfigure;
use crate::schema::Schema;
use crate::types::{ClientCapabilities, Diagnostic, DynamicValue};
use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Builds a fresh, unconfigured resource instance
pub type ResourceFactory = Box<dyn Fn() -> Box<dyn ResourceWithConfigure> + Send + Sync>;

/// Builds a fresh, unconfigured data source instance
pub type DataSourceFactory = Box<dyn Fn() -> Box<dyn DataSourceWithConfigure> + Send + Sync>;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider type name, the prefix of every resource type (e.g., "stripe")
    fn type_name(&self) -> &str;

    async fn metadata(
        &self,
        ctx: Context,
        request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse;

    async fn schema(&self, ctx: Context, request: ProviderSchemaRequest) -> ProviderSchemaResponse;

    /// Called once per run with the provider block configuration.
    /// `provider_data` is passed to every resource/data source `configure`
    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse;

    /// Resource factories keyed by full type name
    fn resources(&self) -> HashMap<String, ResourceFactory>;

    /// Data source factories keyed by full type name
    fn data_sources(&self) -> HashMap<String, DataSourceFactory>;
}

pub struct ProviderMetadataRequest;

pub struct ProviderMetadataResponse {
    pub type_name: String,
}

pub struct ProviderSchemaRequest;

pub struct ProviderSchemaResponse {
    pub schema: Schema,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ConfigureProviderRequest {
    pub terraform_version: String,
    pub config: DynamicValue,
    pub client_capabilities: ClientCapabilities,
}

#[derive(Default)]
pub struct ConfigureProviderResponse {
    pub diagnostics: Vec<Diagnostic>,
    pub provider_data: Option<Arc<dyn Any + Send + Sync>>,
}

/// Recover the concrete provider data inside a resource or data source
/// `configure`. `receiver` names the caller in the diagnostic detail.
pub fn downcast_provider_data<T: Any + Send + Sync>(
    provider_data: Option<Arc<dyn Any + Send + Sync>>,
    receiver: &str,
) -> Result<Arc<T>, Diagnostic> {
    let data = provider_data.ok_or_else(|| {
        Diagnostic::error(
            "No provider data",
            format!("No provider data was provided to the {}", receiver),
        )
    })?;
    data.downcast::<T>().map_err(|_| {
        Diagnostic::error(
            "Invalid provider data",
            format!(
                "The {} expected {} from the provider",
                receiver,
                std::any::type_name::<T>()
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Settings {
        endpoint: String,
    }

    #[test]
    fn downcast_recovers_provider_data() {
        let data: Arc<dyn Any + Send + Sync> = Arc::new(Settings {
            endpoint: "https://api.example.com".to_string(),
        });
        let settings = downcast_provider_data::<Settings>(Some(data), "resource").unwrap();
        assert_eq!(settings.endpoint, "https://api.example.com");
    }

    #[test]
    fn downcast_reports_missing_and_foreign_data() {
        let missing = downcast_provider_data::<Settings>(None, "data source").unwrap_err();
        assert_eq!(missing.summary, "No provider data");
        assert!(missing.detail.contains("data source"));

        let foreign: Arc<dyn Any + Send + Sync> = Arc::new(42u8);
        let wrong = downcast_provider_data::<Settings>(Some(foreign), "resource").unwrap_err();
        assert_eq!(wrong.summary, "Invalid provider data");
    }
}

//! tfplug - Terraform Plugin Framework for Rust
//!
//! The provider-facing half of a Terraform plugin: the value model, schemas,
//! planning helpers and the async traits providers, resources and data
//! sources implement.

// Core modules
pub mod context;
pub mod error;
pub mod logging;
pub mod schema;
pub mod types;

// Provider API modules
pub mod data_source;
pub mod provider;
pub mod resource;

// Helper modules
pub mod defaults;
pub mod import;
pub mod plan;
pub mod plan_modifier;
pub mod validator;

// Re-exports for convenience
pub use context::Context;
pub use data_source::{DataSource, DataSourceWithConfigure};
pub use error::{Result, TfplugError};
pub use import::import_state_passthrough_id;
pub use logging::LogLevel;
pub use plan::{plan_resource_change, PlannedChange};
pub use provider::{downcast_provider_data, DataSourceFactory, Provider, ResourceFactory};
pub use resource::{Resource, ResourceWithConfigure, ResourceWithImportState};
pub use schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
pub use types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

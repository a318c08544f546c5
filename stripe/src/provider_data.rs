//! Provider data structure passed to resources and data sources

use crate::api::Client;

#[derive(Clone)]
pub struct StripeProviderData {
    pub client: Client,
}

impl StripeProviderData {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

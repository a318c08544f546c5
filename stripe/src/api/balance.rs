//! Balance API (read-only)

use super::{ApiError, Client, FormParams};
use serde::Deserialize;
use std::collections::HashMap;
use tfplug::Context;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Balance {
    pub livemode: bool,
    pub available: Vec<Amount>,
    pub pending: Vec<Amount>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Amount {
    pub amount: i64,
    pub currency: String,
    pub source_types: HashMap<String, i64>,
}

pub struct BalanceApi<'a> {
    client: &'a Client,
}

impl<'a> BalanceApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /v1/balance
    pub async fn get(&self, ctx: &Context) -> Result<Balance, ApiError> {
        self.client.get(ctx, "/v1/balance", &FormParams::new()).await
    }
}

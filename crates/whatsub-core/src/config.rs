use std::fmt;

use crate::error::{Result, WhatsubError};

pub const ENV_API_TOKEN: &str = "AIRTABLE_API_TOKEN";
pub const ENV_BASE_ID: &str = "AIRTABLE_BASE_ID";
pub const ENV_TABLE_NAME: &str = "AIRTABLE_TABLE_NAME";
pub const ENV_API_BASE: &str = "AIRTABLE_API_BASE";

pub const DEFAULT_API_BASE: &str = "https://api.airtable.com";
pub const DEFAULT_TABLE: &str = "tblUsers";

/// Where the user base lives and how to authenticate against it. The token
/// is only ever sourced from the environment, never from arguments.
#[derive(Clone)]
pub struct AirtableConfig {
    pub api_base: String,
    pub api_token: String,
    pub base_id: String,
    pub table: String,
}

impl AirtableConfig {
    pub fn new(api_base: &str, api_token: &str, base_id: &str, table: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            base_id: base_id.to_string(),
            table: table.to_string(),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_token = lookup(ENV_API_TOKEN)
            .filter(|value| !value.trim().is_empty())
            .ok_or(WhatsubError::MissingCredential {
                env_var: ENV_API_TOKEN.to_string(),
            })?;
        let base_id = lookup(ENV_BASE_ID)
            .filter(|value| !value.trim().is_empty())
            .ok_or(WhatsubError::MissingCredential {
                env_var: ENV_BASE_ID.to_string(),
            })?;
        let table = lookup(ENV_TABLE_NAME).unwrap_or_else(|| DEFAULT_TABLE.to_string());
        let api_base = lookup(ENV_API_BASE).unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Ok(Self::new(&api_base, &api_token, &base_id, &table))
    }
}

impl fmt::Debug for AirtableConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AirtableConfig")
            .field("api_base", &self.api_base)
            .field("api_token", &"<redacted>")
            .field("base_id", &self.base_id)
            .field("table", &self.table)
            .finish()
    }
}

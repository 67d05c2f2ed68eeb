use chrono::Utc;
use serde_json::json;

use crate::config::AirtableConfig;
use crate::error::{Result, WhatsubError};
use crate::formula;
use crate::types::{FieldSpec, Record, RecordPage, SubscriptionType, TableSchema, UserFields};

/// Listing knobs forwarded as query parameters.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub filter_by_formula: Option<String>,
    pub max_records: Option<u32>,
    pub offset: Option<String>,
}

/// Typed operations on the user table. Unlike the raw fetcher, remote error
/// statuses surface as `WhatsubError::Api` so callers can react to them.
pub struct AirtableClient {
    http: reqwest::Client,
    config: AirtableConfig,
}

impl AirtableClient {
    pub fn new(config: AirtableConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(WhatsubError::ClientBuild)?;
        Ok(Self { http, config })
    }

    pub fn with_client(http: reqwest::Client, config: AirtableConfig) -> Self {
        Self { http, config }
    }

    fn records_url(&self) -> String {
        format!(
            "{}/v0/{}/{}",
            self.config.api_base,
            self.config.base_id,
            urlencoding::encode(&self.config.table)
        )
    }

    fn schema_url(&self, table_id: &str) -> String {
        format!(
            "{}/v0/meta/bases/{}/tables/{}",
            self.config.api_base,
            self.config.base_id,
            urlencoding::encode(table_id)
        )
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.config.api_token)
    }

    fn transport(&self, source: reqwest::Error) -> WhatsubError {
        WhatsubError::Transport {
            endpoint: self.config.api_base.clone(),
            source,
        }
    }

    /// Lists records from the configured table, honoring filter, limit and
    /// pagination offset.
    pub async fn list_records(&self, options: &ListOptions) -> Result<RecordPage> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(formula) = &options.filter_by_formula {
            query.push(("filterByFormula", formula.clone()));
        }
        if let Some(max) = options.max_records {
            query.push(("maxRecords", max.to_string()));
        }
        if let Some(offset) = &options.offset {
            query.push(("offset", offset.clone()));
        }
        let response = self
            .http
            .get(self.records_url())
            .header("Authorization", self.bearer())
            .query(&query)
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        let response = check_status("list records", response).await?;
        let body = response.text().await.map_err(|e| self.transport(e))?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Finds the first record whose Email column equals `email` exactly.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<Record>> {
        if email.trim().is_empty() {
            return Err(WhatsubError::MissingField {
                operation: "find user",
                field: "Email",
            });
        }
        let options = ListOptions {
            filter_by_formula: Some(formula::by_email(email)),
            ..Default::default()
        };
        let page = self.list_records(&options).await?;
        Ok(page.records.into_iter().next())
    }

    /// Creates a user row. Missing columns are filled with the sign-up
    /// defaults: empty name and picture, the free tier, zero usage and
    /// today's login stamp.
    pub async fn create_user(&self, fields: &UserFields) -> Result<Record> {
        required_email("create user", fields)?;
        let fields = with_create_defaults(fields);
        let response = self
            .http
            .post(self.records_url())
            .header("Authorization", self.bearer())
            .json(&json!({ "records": [{ "fields": fields }] }))
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        self.first_record("create user", response).await
    }

    /// Applies the set fields of `fields` to an existing record. Unset
    /// fields are left untouched on the remote side.
    pub async fn update_user(&self, record_id: &str, fields: &UserFields) -> Result<Record> {
        if record_id.trim().is_empty() {
            return Err(WhatsubError::MissingField {
                operation: "update user",
                field: "record id",
            });
        }
        let response = self
            .http
            .patch(self.records_url())
            .header("Authorization", self.bearer())
            .json(&json!({ "records": [{ "id": record_id, "fields": fields }] }))
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        self.first_record("update user", response).await
    }

    /// Stamps the Last Login column with today's date (YYYY-MM-DD).
    pub async fn touch_last_login(&self, record_id: &str) -> Result<Record> {
        let fields = UserFields {
            last_login: Some(today_stamp()),
            ..Default::default()
        };
        self.update_user(record_id, &fields).await
    }

    /// Updates the record matching the Email column, or creates one.
    pub async fn upsert_user(&self, fields: &UserFields) -> Result<Record> {
        let email = required_email("upsert user", fields)?;
        match self.find_user_by_email(email).await? {
            Some(existing) => self.update_user(&existing.id, fields).await,
            None => self.create_user(fields).await,
        }
    }

    /// Sign-in flow: auto-register unknown addresses, otherwise stamp the
    /// login time and return the refreshed record.
    pub async fn sign_in(&self, fields: &UserFields) -> Result<Record> {
        let email = required_email("sign in", fields)?;
        match self.find_user_by_email(email).await? {
            None => self.create_user(fields).await,
            Some(existing) => {
                self.touch_last_login(&existing.id).await?;
                self.find_user_by_email(email)
                    .await?
                    .ok_or(WhatsubError::EmptyResponse { operation: "sign in" })
            }
        }
    }

    /// Pushes column definitions to the table schema via the metadata API
    /// and returns the resulting schema.
    pub async fn update_table_schema(
        &self,
        table_id: &str,
        fields: &[FieldSpec],
    ) -> Result<TableSchema> {
        let response = self
            .http
            .patch(self.schema_url(table_id))
            .header("Authorization", self.bearer())
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        let response = check_status("update table schema", response).await?;
        let body = response.text().await.map_err(|e| self.transport(e))?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn first_record(
        &self,
        operation: &'static str,
        response: reqwest::Response,
    ) -> Result<Record> {
        let response = check_status(operation, response).await?;
        let body = response.text().await.map_err(|e| self.transport(e))?;
        let page: RecordPage = serde_json::from_str(&body)?;
        page.records
            .into_iter()
            .next()
            .ok_or(WhatsubError::EmptyResponse { operation })
    }
}

fn required_email<'a>(
    operation: &'static str,
    fields: &'a UserFields,
) -> Result<&'a str> {
    fields
        .email
        .as_deref()
        .filter(|email| !email.trim().is_empty())
        .ok_or(WhatsubError::MissingField {
            operation,
            field: "Email",
        })
}

fn with_create_defaults(fields: &UserFields) -> UserFields {
    UserFields {
        email: fields.email.clone(),
        name: fields.name.clone().or_else(|| Some(String::new())),
        profile_picture: fields.profile_picture.clone().or_else(|| Some(String::new())),
        subscription_type: fields.subscription_type.or(Some(SubscriptionType::Free)),
        whisper_minutes_used: fields.whisper_minutes_used.or(Some(0.0)),
        translation_characters_used: fields.translation_characters_used.or(Some(0)),
        last_login: fields.last_login.clone().or_else(|| Some(today_stamp())),
    }
}

pub fn today_stamp() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

async fn check_status(
    operation: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let code = status.as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<crate::types::ApiErrorBody>(&body) {
        Ok(envelope) => envelope.error.message().to_string(),
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => body,
    };
    Err(WhatsubError::Api {
        operation,
        status: code,
        message,
    })
}

//! In-memory double of the Airtable endpoints whatsub talks to: the records
//! listing/create/update routes and the table schema metadata route. Speaks
//! the same envelopes as the real service, including its error bodies.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
pub struct StoredRecord {
    pub id: String,
    #[serde(rename = "createdTime")]
    pub created_time: String,
    pub fields: Map<String, Value>,
}

#[derive(Clone, Debug)]
struct StoredSchema {
    name: String,
    fields: Vec<Value>,
}

#[derive(Default)]
struct BaseState {
    tables: HashMap<String, Vec<StoredRecord>>,
    schemas: HashMap<String, StoredSchema>,
}

/// One mock base: a bearer token, a base id and a fixed set of tables.
/// Requests against other bases or tables get the real service's 404s.
#[derive(Clone)]
pub struct MockAirtable {
    token: String,
    base_id: String,
    state: Arc<RwLock<BaseState>>,
}

impl MockAirtable {
    pub fn new(token: &str, base_id: &str, tables: &[&str]) -> Self {
        let mut state = BaseState::default();
        for table in tables {
            state.tables.insert(table.to_string(), Vec::new());
            state.schemas.insert(
                table.to_string(),
                StoredSchema {
                    name: table.to_string(),
                    fields: Vec::new(),
                },
            );
        }
        Self {
            token: token.to_string(),
            base_id: base_id.to_string(),
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Inserts records directly, returning the minted ids.
    pub async fn seed_records(&self, table: &str, fields: Vec<Value>) -> Vec<String> {
        let mut state = self.state.write().await;
        let records = state.tables.entry(table.to_string()).or_default();
        let mut ids = Vec::new();
        for value in fields {
            let record = mint_record(value);
            ids.push(record.id.clone());
            records.push(record);
        }
        ids
    }

    pub async fn records(&self, table: &str) -> Vec<StoredRecord> {
        let state = self.state.read().await;
        state.tables.get(table).cloned().unwrap_or_default()
    }
}

pub fn app(mock: MockAirtable) -> Router {
    Router::new()
        .route(
            "/v0/{base}/{table}",
            get(list_records).post(create_records).patch(update_records),
        )
        .route("/v0/meta/bases/{base}/tables/{table}", patch(update_schema))
        .with_state(mock)
}

pub async fn run(listener: TcpListener, mock: MockAirtable) -> Result<(), std::io::Error> {
    axum::serve(listener, app(mock)).await
}

fn mint_record(fields: Value) -> StoredRecord {
    let fields = match fields {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let suffix = Uuid::new_v4().simple().to_string();
    StoredRecord {
        id: format!("rec{}", &suffix[..14]),
        created_time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        fields,
    }
}

fn error_response(status: StatusCode, kind: &str, message: &str) -> Response {
    (
        status,
        Json(json!({ "error": { "type": kind, "message": message } })),
    )
        .into_response()
}

fn unauthorized() -> Response {
    error_response(
        StatusCode::UNAUTHORIZED,
        "AUTHENTICATION_REQUIRED",
        "Authentication required",
    )
}

fn base_not_found(base: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
        &format!("Could not find base {base}"),
    )
}

fn table_not_found(table: &str, base: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "TABLE_NOT_FOUND",
        &format!("Could not find table {table} in application {base}"),
    )
}

fn authorized(mock: &MockAirtable, headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {}", mock.token))
}

/// Parses the only formula shape the product sends: `{Field} = 'value'`
/// with `\'` escaping inside the literal.
fn parse_eq_formula(formula: &str) -> Option<(String, String)> {
    let rest = formula.trim().strip_prefix('{')?;
    let (field, rest) = rest.split_once('}')?;
    let rest = rest.trim_start().strip_prefix('=')?;
    let rest = rest.trim_start().strip_prefix('\'')?;

    let mut value = String::new();
    let mut chars = rest.chars();
    let mut closed = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('\'') => value.push('\''),
                Some(other) => {
                    value.push('\\');
                    value.push(other);
                }
                None => return None,
            },
            '\'' => {
                closed = true;
                break;
            }
            other => value.push(other),
        }
    }
    if !closed || !chars.as_str().trim().is_empty() {
        return None;
    }
    Some((field.to_string(), value))
}

fn field_matches(record: &StoredRecord, field: &str, expected: &str) -> bool {
    match record.fields.get(field) {
        Some(Value::String(actual)) => actual == expected,
        Some(other) => other.to_string() == expected,
        None => false,
    }
}

async fn list_records(
    State(mock): State<MockAirtable>,
    Path((base, table)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&mock, &headers) {
        return unauthorized();
    }
    if base != mock.base_id {
        return base_not_found(&base);
    }
    let state = mock.state.read().await;
    let Some(records) = state.tables.get(&table) else {
        return table_not_found(&table, &base);
    };

    let mut selected: Vec<&StoredRecord> = records.iter().collect();

    if let Some(formula) = params.get("filterByFormula") {
        let Some((field, value)) = parse_eq_formula(formula) else {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_FILTER_BY_FORMULA",
                "The formula for filtering records is invalid",
            );
        };
        selected.retain(|record| field_matches(record, &field, &value));
    }

    if let Some(offset) = params.get("offset") {
        match selected.iter().position(|record| &record.id == offset) {
            Some(position) => selected.drain(..=position),
            None => selected.drain(..),
        };
    }

    let mut next_offset = None;
    if let Some(raw) = params.get("maxRecords") {
        let Ok(max) = raw.parse::<usize>() else {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_VALUE_FOR_PARAMETER",
                "maxRecords must be a positive integer",
            );
        };
        if selected.len() > max {
            selected.truncate(max);
            next_offset = selected.last().map(|record| record.id.clone());
        }
    }

    let mut body = json!({ "records": selected });
    if let Some(offset) = next_offset {
        body["offset"] = json!(offset);
    }
    Json(body).into_response()
}

async fn create_records(
    State(mock): State<MockAirtable>,
    Path((base, table)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&mock, &headers) {
        return unauthorized();
    }
    if base != mock.base_id {
        return base_not_found(&base);
    }
    let mut state = mock.state.write().await;
    if !state.tables.contains_key(&table) {
        return table_not_found(&table, &base);
    }

    let Some(entries) = body.get("records").and_then(Value::as_array) else {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_REQUEST_UNKNOWN",
            "Could not parse the records payload",
        );
    };
    let mut created = Vec::new();
    for entry in entries {
        let Some(fields) = entry.get("fields").filter(|f| f.is_object()) else {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_REQUEST_UNKNOWN",
                "Each record needs a fields object",
            );
        };
        created.push(mint_record(fields.clone()));
    }

    let records = state.tables.entry(table).or_default();
    records.extend(created.iter().cloned());
    Json(json!({ "records": created })).into_response()
}

async fn update_records(
    State(mock): State<MockAirtable>,
    Path((base, table)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&mock, &headers) {
        return unauthorized();
    }
    if base != mock.base_id {
        return base_not_found(&base);
    }
    let mut state = mock.state.write().await;
    let Some(records) = state.tables.get_mut(&table) else {
        return table_not_found(&table, &base);
    };

    let Some(entries) = body.get("records").and_then(Value::as_array) else {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_REQUEST_UNKNOWN",
            "Could not parse the records payload",
        );
    };
    let mut updated = Vec::new();
    for entry in entries {
        let id = entry.get("id").and_then(Value::as_str).unwrap_or_default();
        let Some(record) = records.iter_mut().find(|record| record.id == id) else {
            return error_response(
                StatusCode::NOT_FOUND,
                "ROW_DOES_NOT_EXIST",
                &format!("Record not found: {id}"),
            );
        };
        if let Some(Value::Object(fields)) = entry.get("fields") {
            for (name, value) in fields {
                record.fields.insert(name.clone(), value.clone());
            }
        }
        updated.push(record.clone());
    }
    Json(json!({ "records": updated })).into_response()
}

async fn update_schema(
    State(mock): State<MockAirtable>,
    Path((base, table)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&mock, &headers) {
        return unauthorized();
    }
    if base != mock.base_id {
        return base_not_found(&base);
    }
    let mut state = mock.state.write().await;
    let Some(schema) = state.schemas.get_mut(&table) else {
        return table_not_found(&table, &base);
    };

    let Some(submitted) = body.get("fields").and_then(Value::as_array) else {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_REQUEST_UNKNOWN",
            "Could not parse the fields payload",
        );
    };
    for field in submitted {
        let Some(name) = field.get("name").and_then(Value::as_str) else {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_REQUEST_UNKNOWN",
                "Each field needs a name",
            );
        };
        let existing = schema
            .fields
            .iter_mut()
            .find(|f| f.get("name").and_then(Value::as_str) == Some(name));
        match existing {
            Some(slot) => *slot = field.clone(),
            None => schema.fields.push(field.clone()),
        }
    }
    Json(json!({ "id": table, "name": schema.name, "fields": schema.fields })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_ids_look_like_airtable_ids() {
        let record = mint_record(json!({ "Email": "a@b.c" }));
        assert!(record.id.starts_with("rec"));
        assert_eq!(record.id.len(), 17);
        assert!(record.created_time.ends_with('Z'));
    }

    #[test]
    fn stored_record_serializes_with_created_time() {
        let record = mint_record(json!({ "Email": "a@b.c" }));
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("createdTime").is_some());
        assert_eq!(value["fields"]["Email"], "a@b.c");
    }

    #[test]
    fn formula_parses_plain_equality() {
        let (field, value) = parse_eq_formula("{Email} = 'mina@example.com'").unwrap();
        assert_eq!(field, "Email");
        assert_eq!(value, "mina@example.com");
    }

    #[test]
    fn formula_unescapes_quotes() {
        let (_, value) = parse_eq_formula("{Email} = 'o\\'brien@example.com'").unwrap();
        assert_eq!(value, "o'brien@example.com");
    }

    #[test]
    fn formula_rejects_other_shapes() {
        assert!(parse_eq_formula("LOWER({Email}) = 'x'").is_none());
        assert!(parse_eq_formula("{Email} = 'unterminated").is_none());
        assert!(parse_eq_formula("{Email} = 'a' AND {Name} = 'b'").is_none());
    }

    #[test]
    fn numbers_match_by_display_form() {
        let record = mint_record(json!({ "Translation Characters Used": 4200 }));
        assert!(field_matches(&record, "Translation Characters Used", "4200"));
        assert!(!field_matches(&record, "Translation Characters Used", "4201"));
        assert!(!field_matches(&record, "Missing", "4200"));
    }
}

use serde::{Deserialize, Serialize};

/// One row of the user table, shaped like the Airtable record envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub id: String,
    #[serde(rename = "createdTime")]
    pub created_time: String,
    #[serde(default)]
    pub fields: UserFields,
}

/// A listing response. `offset` is present when more records remain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordPage {
    pub records: Vec<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
}

/// The user columns whatsub reads and writes. Every field is optional so a
/// partial update only touches what the caller set; unknown remote columns
/// are ignored on read and never clobbered on write.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserFields {
    #[serde(rename = "Email", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "Profile Picture", skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(rename = "Subscription Type", skip_serializing_if = "Option::is_none")]
    pub subscription_type: Option<SubscriptionType>,
    #[serde(rename = "Whisper Minutes Used", skip_serializing_if = "Option::is_none")]
    pub whisper_minutes_used: Option<f64>,
    #[serde(
        rename = "Translation Characters Used",
        skip_serializing_if = "Option::is_none"
    )]
    pub translation_characters_used: Option<u64>,
    #[serde(rename = "Last Login", skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
}

/// Subscription tier. Older rows carry lowercase values, so both spellings
/// deserialize; writes always use the canonical capitalized form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SubscriptionType {
    #[serde(alias = "free")]
    Free,
    #[serde(alias = "basic")]
    Basic,
    #[serde(alias = "premium")]
    Premium,
}

impl SubscriptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionType::Free => "Free",
            SubscriptionType::Basic => "Basic",
            SubscriptionType::Premium => "Premium",
        }
    }
}

/// One column definition in the table schema, as sent to the metadata API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<SelectOptions>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectOptions {
    pub choices: Vec<SelectChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectChoice {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Schema state of a table as returned by the metadata API.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TableSchema {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// The error envelope Airtable wraps failures in. Some endpoints send a
/// structured object, others a bare string code.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiErrorDetail {
    Full {
        #[serde(rename = "type")]
        kind: String,
        message: Option<String>,
    },
    Bare(String),
}

impl ApiErrorDetail {
    pub fn message(&self) -> &str {
        match self {
            ApiErrorDetail::Full {
                message: Some(message),
                ..
            } => message,
            ApiErrorDetail::Full { kind, .. } => kind,
            ApiErrorDetail::Bare(code) => code,
        }
    }
}

impl FieldSpec {
    fn select(name: &str, description: &str, choices: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_string(),
            field_type: "singleSelect".to_string(),
            description: Some(description.to_string()),
            options: Some(SelectOptions {
                choices: choices
                    .iter()
                    .map(|(name, color)| SelectChoice {
                        name: name.to_string(),
                        color: Some(color.to_string()),
                    })
                    .collect(),
            }),
        }
    }

    fn plain(name: &str, field_type: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
            description: Some(description.to_string()),
            options: None,
        }
    }

    /// The column set the subscription flow expects on the user table.
    pub fn subscription_preset() -> Vec<Self> {
        vec![
            Self::plain("Email", "email", "User email address"),
            Self::plain("Created At", "dateTime", "Account creation time"),
            Self::plain("Last Login", "dateTime", "Time of the last sign-in"),
            Self::select(
                "Subscription Status",
                "Current subscription state",
                &[
                    ("Active", "greenLight2"),
                    ("Inactive", "redLight2"),
                    ("Trial", "yellowLight2"),
                    ("Expired", "grayLight2"),
                ],
            ),
            Self::select(
                "Subscription Type",
                "Subscription tier",
                &[
                    ("Free", "grayLight2"),
                    ("Basic", "blueLight2"),
                    ("Premium", "purpleLight2"),
                ],
            ),
            Self::plain("Start Date", "date", "Subscription start"),
            Self::plain("End Date", "date", "Subscription end"),
        ]
    }
}

use crate::types::{Record, RecordPage, TableSchema};

/// Renders a listing page as human-readable lines, one user per entry.
pub fn format_records(page: &RecordPage) -> String {
    let mut output = String::new();
    for record in &page.records {
        output.push_str(&format_record(record));
        output.push('\n');
    }
    output.push_str(&format!("{} record(s)", page.records.len()));
    if page.offset.is_some() {
        output.push_str(" (more available)");
    }
    output.push('\n');
    output
}

pub fn format_record(record: &Record) -> String {
    let fields = &record.fields;
    let mut output = String::new();
    output.push_str(&format!(
        "• {}  [{}]\n",
        fields.email.as_deref().unwrap_or("(no email)"),
        fields
            .subscription_type
            .map(|tier| tier.as_str())
            .unwrap_or("no plan"),
    ));
    if let Some(name) = fields.name.as_deref().filter(|n| !n.is_empty()) {
        output.push_str(&format!("    name: {name}\n"));
    }
    output.push_str(&format!(
        "    whisper minutes: {}  translation chars: {}\n",
        fields.whisper_minutes_used.unwrap_or(0.0),
        fields.translation_characters_used.unwrap_or(0),
    ));
    if let Some(last_login) = fields.last_login.as_deref() {
        output.push_str(&format!("    last login: {last_login}\n"));
    }
    output.push_str(&format!("    id: {}\n", record.id));
    output
}

/// Renders the schema returned by a push: field names and types.
pub fn format_schema(schema: &TableSchema) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "table {} ({} fields)\n",
        schema.name,
        schema.fields.len()
    ));
    for field in &schema.fields {
        output.push_str(&format!("• {} ({})", field.name, field.field_type));
        if let Some(options) = &field.options {
            let choices: Vec<&str> = options
                .choices
                .iter()
                .map(|choice| choice.name.as_str())
                .collect();
            output.push_str(&format!(": {}", choices.join(", ")));
        }
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldSpec, SubscriptionType, UserFields};

    fn sample_page() -> RecordPage {
        RecordPage {
            records: vec![Record {
                id: "recAbc".to_string(),
                created_time: "2026-08-01T00:00:00.000Z".to_string(),
                fields: UserFields {
                    email: Some("mina@example.com".to_string()),
                    name: Some("Mina".to_string()),
                    subscription_type: Some(SubscriptionType::Premium),
                    whisper_minutes_used: Some(12.5),
                    translation_characters_used: Some(4200),
                    last_login: Some("2026-08-20".to_string()),
                    ..Default::default()
                },
            }],
            offset: None,
        }
    }

    #[test]
    fn listing_shows_email_plan_and_count() {
        let rendered = format_records(&sample_page());
        assert!(rendered.contains("mina@example.com"));
        assert!(rendered.contains("[Premium]"));
        assert!(rendered.contains("last login: 2026-08-20"));
        assert!(rendered.contains("1 record(s)"));
        assert!(!rendered.contains("more available"));
    }

    #[test]
    fn listing_flags_further_pages() {
        let mut page = sample_page();
        page.offset = Some("recNext".to_string());
        assert!(format_records(&page).contains("more available"));
    }

    #[test]
    fn empty_fields_render_placeholders() {
        let record = Record {
            id: "recEmpty".to_string(),
            created_time: "2026-08-01T00:00:00.000Z".to_string(),
            fields: UserFields::default(),
        };
        let rendered = format_record(&record);
        assert!(rendered.contains("(no email)"));
        assert!(rendered.contains("[no plan]"));
    }

    #[test]
    fn schema_lists_choices() {
        let schema = TableSchema {
            id: "tblUsers".to_string(),
            name: "Users".to_string(),
            fields: FieldSpec::subscription_preset(),
        };
        let rendered = format_schema(&schema);
        assert!(rendered.contains("table Users (7 fields)"));
        assert!(rendered.contains("• Email (email)"));
        assert!(rendered.contains("• Subscription Type (singleSelect): Free, Basic, Premium"));
    }
}

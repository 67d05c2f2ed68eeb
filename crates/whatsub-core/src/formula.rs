//! Builders for the `filterByFormula` query parameter.

/// `{Field} = 'value'` with single quotes in the value escaped, so an
/// address like `o'brien@example.com` cannot break out of the literal.
pub fn eq(field: &str, value: &str) -> String {
    format!("{{{}}} = '{}'", field, value.replace('\'', "\\'"))
}

pub fn by_email(email: &str) -> String {
    eq("Email", email)
}

use serde_json::Value;

/// Contact details resolved from an applicant's basic-field answers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contact {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

const FULL_NAME_ALIASES: &[&str] = &["full name", "fullname", "full_name", "name"];
const EMAIL_ALIASES: &[&str] = &["email", "email address", "e-mail"];
const PHONE_ALIASES: &[&str] = &["phone", "phone number", "mobile", "contact number"];

/// Scans an ordered list of basic-field answers for entries whose `label`
/// or `name` matches a known alias and pulls the string `value`.
/// Matching is case-insensitive; the first match per field wins.
#[must_use]
pub fn extract_contact(basic_answers: &Value) -> Contact {
    let mut contact = Contact::default();

    let Some(entries) = basic_answers.as_array() else {
        return contact;
    };

    for entry in entries {
        let Some(key) = field_key(entry) else {
            continue;
        };
        let Some(value) = entry.get("value").and_then(Value::as_str) else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        if contact.full_name.is_none() && FULL_NAME_ALIASES.contains(&key.as_str()) {
            contact.full_name = Some(value.to_string());
        } else if contact.email.is_none() && EMAIL_ALIASES.contains(&key.as_str()) {
            contact.email = Some(value.to_string());
        } else if contact.phone.is_none() && PHONE_ALIASES.contains(&key.as_str()) {
            contact.phone = Some(value.to_string());
        }
    }

    contact
}

fn field_key(entry: &Value) -> Option<String> {
    entry
        .get("label")
        .or_else(|| entry.get("name"))
        .and_then(Value::as_str)
        .map(|s| s.trim().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extracts_by_label() {
        let answers = json!([
            {"label": "Full Name", "value": "Jo Doe"},
            {"label": "Email", "value": "jo@x.com"},
            {"label": "Phone", "value": "+1 555 0100"},
        ]);
        let contact = extract_contact(&answers);
        assert_eq!(contact.full_name.as_deref(), Some("Jo Doe"));
        assert_eq!(contact.email.as_deref(), Some("jo@x.com"));
        assert_eq!(contact.phone.as_deref(), Some("+1 555 0100"));
    }

    #[test]
    fn test_extracts_by_name_key_and_alias() {
        let answers = json!([
            {"name": "fullname", "value": "Sam"},
            {"name": "E-Mail", "value": "sam@x.com"},
        ]);
        let contact = extract_contact(&answers);
        assert_eq!(contact.full_name.as_deref(), Some("Sam"));
        assert_eq!(contact.email.as_deref(), Some("sam@x.com"));
        assert_eq!(contact.phone, None);
    }

    #[test]
    fn test_first_match_wins() {
        let answers = json!([
            {"label": "Name", "value": "First"},
            {"label": "Full Name", "value": "Second"},
        ]);
        let contact = extract_contact(&answers);
        assert_eq!(contact.full_name.as_deref(), Some("First"));
    }

    #[test]
    fn test_ignores_blank_values_and_non_objects() {
        let answers = json!([
            "not an object",
            {"label": "Email", "value": "   "},
            {"label": "Email", "value": "real@x.com"},
        ]);
        let contact = extract_contact(&answers);
        assert_eq!(contact.email.as_deref(), Some("real@x.com"));
    }

    #[test]
    fn test_non_array_yields_empty() {
        assert_eq!(extract_contact(&json!({"label": "Email"})), Contact::default());
    }
}

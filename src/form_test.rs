use super::*;
use serde_json::json;

fn design_rules() -> FormRules {
    FormRules::default()
        .require("title", "Title")
        .with_file(FileRule::new("file", "Design file", true))
}

fn file_of(size: usize) -> SelectedFile {
    SelectedFile { name: "poster.png".into(), mime: "image/png".into(), bytes: vec![0; size] }
}

// =============================================================
// FormData
// =============================================================

#[test]
fn set_replaces_existing_value_in_place() {
    let mut form = FormData::new().with("name", "Acme").with("status", "active");
    form.set("name", "Acme Ltd");
    let fields: Vec<(&str, &str)> = form.fields().collect();
    assert_eq!(fields, vec![("name", "Acme Ltd"), ("status", "active")]);
}

#[test]
fn to_json_emits_string_fields() {
    let form = FormData::new().with("name", "Acme").with("phone", "123");
    assert_eq!(form.to_json(), json!({"name": "Acme", "phone": "123"}));
}

#[test]
fn from_record_prefills_listed_fields_only() {
    let record: Record = serde_json::from_value(json!({"id": 3, "name": "Acme", "status": "active"})).unwrap();
    let form = FormData::from_record(&record, &["name", "contact"]);
    assert_eq!(form.get("name"), Some("Acme"));
    assert_eq!(form.get("contact"), Some(""));
    assert_eq!(form.get("status"), None);
}

#[test]
fn parse_assignment_splits_on_first_equals() {
    assert_eq!(FormData::parse_assignment("note=a=b").unwrap(), ("note".into(), "a=b".into()));
    assert!(FormData::parse_assignment("novalue").is_err());
    assert!(FormData::parse_assignment("=x").is_err());
}

// =============================================================
// FormRules
// =============================================================

#[test]
fn empty_required_field_fails() {
    let form = FormData::new().with("title", "   ").with_file("file", file_of(10));
    let err = design_rules().validate(&form).unwrap_err();
    assert_eq!(err.user_message(), "Title is required");
}

#[test]
fn missing_required_file_fails() {
    let form = FormData::new().with("title", "Poster");
    let err = design_rules().validate(&form).unwrap_err();
    assert!(err.user_message().contains("Design file"));
}

#[test]
fn oversized_file_fails() {
    let rules = design_rules().with_max_upload(1024);
    let form = FormData::new().with("title", "Poster").with_file("file", file_of(1025));
    let err = rules.validate(&form).unwrap_err();
    assert!(matches!(err, PortalError::Validation(_)));
    assert!(err.user_message().contains("too large"));
}

#[test]
fn file_at_limit_passes() {
    let rules = design_rules().with_max_upload(1024);
    let form = FormData::new().with("title", "Poster").with_file("file", file_of(1024));
    assert!(rules.validate(&form).is_ok());
}

#[test]
fn default_ceiling_is_ten_mebibytes() {
    assert_eq!(FileRule::new("file", "File", false).max_bytes, 10 * 1024 * 1024);
}

#[test]
fn optional_file_may_be_absent() {
    let rules = FormRules::default().require("name", "Name").with_file(FileRule::new("attachment", "Attachment", false));
    assert!(rules.validate(&FormData::new().with("name", "x")).is_ok());
}

#[test]
fn update_rules_make_file_optional_but_keep_ceiling() {
    let rules = design_rules().with_max_upload(8).for_update();
    assert!(rules.validate(&FormData::new().with("title", "Poster")).is_ok());
    let big = FormData::new().with("title", "Poster").with_file("file", file_of(9));
    assert!(rules.validate(&big).is_err());
}

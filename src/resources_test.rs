use super::*;
use std::collections::HashSet;

#[test]
fn catalog_keys_and_endpoints_are_unique() {
    let specs = catalog();
    let keys: HashSet<&str> = specs.iter().map(|s| s.key).collect();
    let endpoints: HashSet<&str> = specs.iter().map(|s| s.endpoint).collect();
    assert_eq!(keys.len(), specs.len());
    assert_eq!(endpoints.len(), specs.len());
}

#[test]
fn find_resolves_known_keys() {
    assert_eq!(find("vendors").map(|s| s.endpoint), Some("/api/pr/vendors"));
    assert!(find("budgets").is_none());
}

#[test]
fn vendor_active_badge_label() {
    let active = VENDOR_STATUS.iter().find(|v| v.value == "active").unwrap();
    assert_eq!(active.label, "已合作");
}

#[test]
fn file_resources_offer_view_and_download() {
    for spec in catalog().into_iter().filter(ResourceSpec::has_files) {
        assert!(spec.table.actions.contains(&ActionKind::Download), "{}", spec.key);
        assert!(spec.table.actions.contains(&ActionKind::View), "{}", spec.key);
    }
}

#[test]
fn every_resource_can_edit_and_delete() {
    for spec in catalog() {
        assert!(spec.table.actions.contains(&ActionKind::Edit), "{}", spec.key);
        assert!(spec.table.actions.contains(&ActionKind::Delete), "{}", spec.key);
        assert!(!spec.rules.required.is_empty(), "{}", spec.key);
    }
}

#[test]
fn required_fields_are_offered_by_the_form() {
    for spec in catalog() {
        for req in &spec.rules.required {
            assert!(spec.form_fields.contains(&req.field), "{}: {}", spec.key, req.field);
        }
    }
}

#[test]
fn design_upload_is_required() {
    let rule = designs().rules.file.unwrap();
    assert!(rule.required);
    assert_eq!(rule.field, "file");
}

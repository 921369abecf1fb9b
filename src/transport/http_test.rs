use super::*;
use crate::config::HttpTimeouts;
use crate::form::SelectedFile;

// =============================================================
// decode_*
// =============================================================

#[test]
fn decode_list_accepts_bare_array() {
    let items = decode_list(200, r#"[{"id":1,"name":"Acme","status":"active"}]"#).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].text("name"), "Acme");
}

#[test]
fn decode_list_accepts_wrapped_array() {
    let items = decode_list(200, r#"{"success":true,"data":[{"id":1},{"id":2}]}"#).unwrap();
    assert_eq!(items.len(), 2);
}

#[test]
fn decode_list_treats_missing_data_as_empty() {
    assert!(decode_list(200, r#"{"success":true,"data":null}"#).unwrap().is_empty());
}

#[test]
fn decode_list_rejects_non_collection() {
    let err = decode_list(200, "<html>login</html>").unwrap_err();
    assert_eq!(err.error_code(), "E_DECODE");
}

#[test]
fn decode_list_surfaces_wrapped_failure() {
    let err = decode_list(200, r#"{"success":false,"error":"未登录"}"#).unwrap_err();
    assert_eq!(err.user_message(), "未登录");
}

#[test]
fn decode_record_requires_data() {
    assert!(decode_record(200, r#"{"success":true,"data":{"id":3}}"#).is_ok());
    let err = decode_record(200, r#"{"success":true}"#).unwrap_err();
    assert_eq!(err.error_code(), "E_DECODE");
}

#[test]
fn decode_optional_record_is_lenient() {
    assert_eq!(decode_optional_record(204, "").unwrap(), None);
    assert_eq!(decode_optional_record(200, "OK").unwrap(), None);
    let rec = decode_optional_record(201, r#"{"id":9,"name":"new"}"#).unwrap().unwrap();
    assert_eq!(rec.id().unwrap().as_str(), "9");
    assert!(decode_optional_record(200, r#"{"success":false,"message":"dup"}"#).is_err());
}

// =============================================================
// error_message
// =============================================================

#[test]
fn error_message_prefers_error_field() {
    assert_eq!(error_message(400, r#"{"error":"name required","message":"bad"}"#), "name required");
}

#[test]
fn error_message_falls_back_to_message_field() {
    assert_eq!(error_message(409, r#"{"message":"already exists"}"#), "already exists");
}

#[test]
fn error_message_uses_status_text_for_unparsable_body() {
    assert_eq!(error_message(502, "<html>Bad Gateway</html>"), "Bad Gateway");
    assert_eq!(error_message(404, r#"{"detail":"x"}"#), "Not Found");
    assert_eq!(error_message(599, ""), "HTTP 599");
}

// =============================================================
// client
// =============================================================

fn config() -> PortalConfig {
    PortalConfig {
        base_url: "http://portal.test".into(),
        session_cookie: Some("connect.sid=s%3Aabc".into()),
        timeouts: HttpTimeouts { request_secs: 1, connect_secs: 1 },
        ..PortalConfig::default()
    }
}

#[test]
fn file_url_is_absolute() {
    let transport = HttpTransport::new(&config()).unwrap();
    let url = transport.file_url("/api/design/designs", &RecordId::from(5), FileAction::Download);
    assert_eq!(url, "http://portal.test/api/design/designs/5/download");
}

#[test]
fn invalid_cookie_is_config_error() {
    let cfg = PortalConfig { session_cookie: Some("bad\ncookie".into()), ..config() };
    let err = HttpTransport::new(&cfg).err().unwrap();
    assert_eq!(err.error_code(), "E_CONFIG");
}

#[test]
fn multipart_rejects_malformed_mime() {
    let form = FormData::new().with("title", "x").with_file(
        "file",
        SelectedFile { name: "a.bin".into(), mime: "not a mime".into(), bytes: vec![1] },
    );
    assert!(multipart_form(&form).is_err());
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let cfg = PortalConfig { base_url: "http://127.0.0.1:9".into(), ..config() };
    let transport = HttpTransport::new(&cfg).unwrap();
    let err = transport.list("/api/pr/vendors").await.unwrap_err();
    assert_eq!(err.error_code(), "E_NETWORK");
}

use super::*;

#[test]
fn build_url_joins_base_and_path() {
    assert_eq!(build_url("http://localhost:8000/", "/api/portal/"), "http://localhost:8000/api/portal/");
    assert_eq!(build_url("http://localhost:8000", "api/portal/"), "http://localhost:8000/api/portal/");
}

#[test]
fn build_url_empty_base_keeps_path() {
    assert_eq!(build_url("  ", "/api/health/"), "/api/health/");
}

#[test]
fn build_url_absolute_path_ignores_base() {
    assert_eq!(
        build_url("http://localhost:8000", "https://cdn.tars.test/file.pdf"),
        "https://cdn.tars.test/file.pdf"
    );
    assert!(is_absolute_url("HTTP://example.test"));
    assert!(!is_absolute_url("/media/x.png"));
}

#[test]
fn error_message_reads_error_field() {
    let resp = ApiResponse::new(401, r#"{"error": "Invalid credentials"}"#);
    assert_eq!(resp.error_message().as_deref(), Some("Invalid credentials"));
}

#[test]
fn error_message_reads_detail_field() {
    let resp = ApiResponse::new(401, r#"{"detail": "Token is invalid or expired"}"#);
    assert_eq!(resp.error_message().as_deref(), Some("Token is invalid or expired"));
}

#[test]
fn error_message_none_for_non_json() {
    assert_eq!(ApiResponse::new(502, "<html>bad gateway</html>").error_message(), None);
    assert_eq!(ApiResponse::new(400, r#"{"error": "  "}"#).error_message(), None);
}

#[test]
fn error_for_status_passes_success() {
    let resp = ApiResponse::new(204, "");
    assert!(resp.clone().error_for_status().is_ok());
}

#[test]
fn error_for_status_truncates_long_bodies() {
    let body = "x".repeat(500);
    let err = ApiResponse::new(500, body).error_for_status().unwrap_err();
    match err {
        AuthError::Http { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message.len(), MAX_ERROR_CHARS);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn error_for_status_empty_body_uses_placeholder() {
    let err = ApiResponse::new(503, "   ").error_for_status().unwrap_err();
    assert_eq!(err, AuthError::Http { status: 503, message: "Request failed.".into() });
}

#[test]
fn json_decode_failure_is_decode_error() {
    let resp = ApiResponse::new(200, "not json");
    let err = resp.json::<serde_json::Value>().unwrap_err();
    assert!(matches!(err, AuthError::Decode(_)));
}

#[test]
fn request_debug_hides_bearer() {
    let req = ApiRequest::get("/api/portal/").with_bearer("secret-token");
    let debug = format!("{req:?}");
    assert!(debug.contains("/api/portal/"));
    assert!(!debug.contains("secret-token"));
}

#[test]
fn reqwest_transport_trims_base_url() {
    let transport = ReqwestTransport::new(" http://localhost:8000/ ", HttpTimeouts::default()).unwrap();
    assert_eq!(transport.base_url(), "http://localhost:8000");
}

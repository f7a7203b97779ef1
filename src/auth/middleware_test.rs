use super::*;
use crate::auth::client::REFRESH_PATH;
use crate::net::mock::{client_with, json_response, offline, signed_in_client};
use crate::net::types::SessionStatus;

fn portal_ok() -> Result<ApiResponse, AuthError> {
    json_response(200, serde_json::json!({ "classes": [], "resources": [] }))
}

fn unauthorized() -> Result<ApiResponse, AuthError> {
    json_response(401, serde_json::json!({ "detail": "Given token not valid for any token type" }))
}

#[tokio::test]
async fn attaches_stored_access_token() {
    let (client, mock) = signed_in_client("A1", "R1", vec![portal_ok()]).await;

    let resp = client.fetch_with_auth(&ApiRequest::get("/api/portal/")).await.unwrap();

    assert_eq!(resp.status, 200);
    assert_eq!(mock.request_count(), 1);
    assert_eq!(mock.requests()[0].bearer.as_deref(), Some("A1"));
}

#[tokio::test]
async fn expired_token_refreshes_once_and_retries_with_new_token() {
    let (client, mock) = signed_in_client(
        "A1",
        "R1",
        vec![unauthorized(), json_response(200, serde_json::json!({ "access": "A2" })), portal_ok()],
    )
    .await;

    let resp = client.fetch_with_auth(&ApiRequest::get("/api/portal/")).await.unwrap();

    assert_eq!(resp.status, 200);
    assert_eq!(resp.json::<serde_json::Value>().unwrap()["classes"], serde_json::json!([]));
    let sent = mock.requests();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0].path, "/api/portal/");
    assert_eq!(sent[0].bearer.as_deref(), Some("A1"));
    assert_eq!(sent[1].path, REFRESH_PATH);
    assert_eq!(sent[1].body, Some(serde_json::json!({ "refresh": "R1" })));
    assert_eq!(sent[2].path, "/api/portal/");
    assert_eq!(sent[2].bearer.as_deref(), Some("A2"));
    assert_eq!(client.store().access_token().await.unwrap().as_deref(), Some("A2"));
    assert_eq!(client.store().refresh_token().await.unwrap().as_deref(), Some("R1"));
}

#[tokio::test]
async fn second_401_expires_session_without_third_attempt() {
    let (client, mock) = signed_in_client(
        "A1",
        "R1",
        vec![
            unauthorized(),
            json_response(200, serde_json::json!({ "access": "A2" })),
            unauthorized(),
            portal_ok(),
        ],
    )
    .await;

    let err = client.fetch_with_auth(&ApiRequest::get("/api/portal/")).await.unwrap_err();

    assert_eq!(err, AuthError::SessionExpired);
    assert_eq!(mock.request_count(), 3);
    assert_eq!(mock.remaining(), 1);
    assert_eq!(mock.requests().iter().filter(|r| r.path == REFRESH_PATH).count(), 1);
    assert_eq!(client.store().access_token().await.unwrap(), None);
    assert_eq!(client.store().refresh_token().await.unwrap(), None);
    assert_eq!(client.store().user().await.unwrap(), None);
    assert_eq!(client.status(), SessionStatus::Anonymous);
}

#[tokio::test]
async fn rejected_refresh_expires_session() {
    let (client, mock) = signed_in_client("A1", "R1", vec![unauthorized(), unauthorized(), portal_ok()]).await;

    let err = client.fetch_with_auth(&ApiRequest::get("/api/portal/")).await.unwrap_err();

    assert_eq!(err, AuthError::SessionExpired);
    assert_eq!(mock.request_count(), 2);
    assert!(!client.is_authenticated().await.unwrap());
}

#[tokio::test]
async fn unreachable_refresh_expires_session() {
    let (client, _mock) = signed_in_client("A1", "R1", vec![unauthorized(), offline()]).await;

    let err = client.fetch_with_auth(&ApiRequest::get("/api/portal/")).await.unwrap_err();

    assert_eq!(err, AuthError::SessionExpired);
    assert_eq!(client.store().refresh_token().await.unwrap(), None);
}

#[tokio::test]
async fn missing_refresh_token_expires_session() {
    let (client, mock) = client_with(vec![unauthorized()]);
    client.store().set_access_token("A1").await.unwrap();

    let err = client.fetch_with_auth(&ApiRequest::get("/api/portal/")).await.unwrap_err();

    assert_eq!(err, AuthError::SessionExpired);
    assert_eq!(mock.request_count(), 1);
    assert_eq!(client.store().access_token().await.unwrap(), None);
}

#[tokio::test]
async fn no_access_token_sends_nothing() {
    let (client, mock) = client_with(vec![portal_ok()]);

    let err = client.fetch_with_auth(&ApiRequest::get("/api/portal/")).await.unwrap_err();

    assert_eq!(err, AuthError::NoAccessToken);
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn non_401_errors_pass_through_untouched() {
    let (client, mock) = signed_in_client("A1", "R1", vec![Ok(ApiResponse::new(500, "boom"))]).await;

    let resp = client.fetch_with_auth(&ApiRequest::get("/api/portal/")).await.unwrap();

    assert_eq!(resp.status, 500);
    assert_eq!(mock.request_count(), 1);
    assert!(client.is_authenticated().await.unwrap());
}

#[tokio::test]
async fn transport_failure_is_network_error_and_keeps_session() {
    let (client, _mock) = signed_in_client("A1", "R1", vec![offline()]).await;
    let err = client.fetch_with_auth(&ApiRequest::get("/api/portal/")).await.unwrap_err();
    assert!(matches!(err, AuthError::NetworkError(_)));
    assert!(client.is_authenticated().await.unwrap());
}

#[tokio::test]
async fn zero_limit_never_refreshes() {
    let (client, mock) = signed_in_client("A1", "R1", vec![unauthorized()]).await;
    let middleware = RefreshOnUnauthorized::with_limit(client.clone(), 0);

    let err = middleware.send(&ApiRequest::get("/api/portal/")).await.unwrap_err();

    assert_eq!(err, AuthError::SessionExpired);
    assert_eq!(mock.request_count(), 1);
}

#[tokio::test]
async fn request_body_is_preserved_on_retry() {
    let (client, mock) = signed_in_client(
        "A1",
        "R1",
        vec![
            unauthorized(),
            json_response(200, serde_json::json!({ "access": "A2" })),
            json_response(200, serde_json::json!({ "success": true, "download_count": 4 })),
        ],
    )
    .await;
    let request = ApiRequest::post("/api/resources/9/download/", serde_json::json!({}));

    client.fetch_with_auth(&request).await.unwrap();

    let sent = mock.requests();
    assert_eq!(sent[0].body, sent[2].body);
    assert_eq!(sent[2].bearer.as_deref(), Some("A2"));
}

#[test]
fn default_limit_is_one() {
    let (client, _mock) = client_with(vec![]);
    assert_eq!(client.authenticated().max_refreshes(), 1);
    assert_eq!(MAX_REFRESH_ATTEMPTS, 1);
}

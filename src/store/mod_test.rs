use super::*;
use crate::net::mock::alice;

fn pair(access: &str, refresh: &str) -> TokenPair {
    TokenPair { access: access.into(), refresh: refresh.into() }
}

#[tokio::test]
async fn empty_store_returns_absent_everywhere() {
    let store = TokenStore::in_memory();
    assert_eq!(store.access_token().await.unwrap(), None);
    assert_eq!(store.refresh_token().await.unwrap(), None);
    assert_eq!(store.user().await.unwrap(), None);
    assert_eq!(store.tokens().await.unwrap(), None);
    assert!(!store.is_authenticated().await.unwrap());
}

#[tokio::test]
async fn set_session_stores_tokens_and_user() {
    let store = TokenStore::in_memory();
    store.set_session(&pair("A1", "R1"), &alice()).await.unwrap();

    assert_eq!(store.get(TokenKind::Access).await.unwrap().as_deref(), Some("A1"));
    assert_eq!(store.get(TokenKind::Refresh).await.unwrap().as_deref(), Some("R1"));
    assert_eq!(store.tokens().await.unwrap(), Some(pair("A1", "R1")));
    assert_eq!(store.user().await.unwrap(), Some(alice()));
    assert!(store.is_authenticated().await.unwrap());
}

#[tokio::test]
async fn set_access_token_leaves_refresh_untouched() {
    let store = TokenStore::in_memory();
    store.set_session(&pair("A1", "R1"), &alice()).await.unwrap();
    store.set_access_token("A2").await.unwrap();

    assert_eq!(store.tokens().await.unwrap(), Some(pair("A2", "R1")));
}

#[tokio::test]
async fn user_round_trips_exactly() {
    let store = TokenStore::in_memory();
    store.set_user(&alice()).await.unwrap();
    assert_eq!(store.user().await.unwrap(), Some(alice()));
}

#[tokio::test]
async fn set_user_overwrites_wholesale() {
    let store = TokenStore::in_memory();
    store.set_user(&alice()).await.unwrap();
    let mut staff = alice();
    staff.is_staff = true;
    staff.email = "alice@staff.tars.test".into();
    store.set_user(&staff).await.unwrap();
    assert_eq!(store.user().await.unwrap(), Some(staff));
}

#[tokio::test]
async fn unreadable_user_is_treated_as_absent() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_many(&[(USER_KEY, "{not json".to_owned())]).await.unwrap();
    let store = TokenStore::new(backend);
    assert_eq!(store.user().await.unwrap(), None);
}

#[tokio::test]
async fn empty_token_value_counts_as_absent() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_many(&[(ACCESS_TOKEN_KEY, String::new())]).await.unwrap();
    let store = TokenStore::new(backend);
    assert!(!store.is_authenticated().await.unwrap());
}

#[tokio::test]
async fn clear_removes_all_three_keys() {
    let store = TokenStore::in_memory();
    store.set_session(&pair("A1", "R1"), &alice()).await.unwrap();
    store.set_user(&alice()).await.unwrap();

    store.clear().await.unwrap();

    assert_eq!(store.access_token().await.unwrap(), None);
    assert_eq!(store.refresh_token().await.unwrap(), None);
    assert_eq!(store.user().await.unwrap(), None);
}

#[tokio::test]
async fn clones_share_the_same_backend() {
    let store = TokenStore::in_memory();
    let other = store.clone();
    store.set_session(&pair("A1", "R1"), &alice()).await.unwrap();
    assert_eq!(other.access_token().await.unwrap().as_deref(), Some("A1"));
}

#[test]
fn token_kind_keys_match_storage_layout() {
    assert_eq!(TokenKind::Access.key(), "access_token");
    assert_eq!(TokenKind::Refresh.key(), "refresh_token");
    assert_eq!(USER_KEY, "user");
}

#[test]
fn from_kind_memory_builds_a_store() {
    let _store = TokenStore::from_kind(&StorageKind::Memory);
}

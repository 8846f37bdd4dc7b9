mod common;

use academic_console::{ApiClient, ClientConfig, ConsoleError, Credentials, FileTokenStore, Session};
use common::client_for;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn login_stores_token_and_later_requests_carry_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/iniciar-sesion"))
        .and(body_string_contains("username=rector"))
        .and(body_string_contains("password=secreto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-123",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/materias"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);

    let creds = client.login("rector", "secreto").await.unwrap();
    assert_eq!(creds, Credentials::bearer("tok-123"));
    assert!(client.session().is_authenticated().await);
    assert!(client.get_records("/materias").await.unwrap().is_empty());
}

#[tokio::test]
async fn bad_login_leaves_session_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/iniciar-sesion"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Credenciales incorrectas"})))
        .mount(&server)
        .await;
    let client = client_for(&server);

    let err = client.login("rector", "mal").await.unwrap_err();
    assert_eq!(err.user_message(), "Credenciales incorrectas");
    assert!(!client.session().is_authenticated().await);
}

#[tokio::test]
async fn unauthorized_response_ends_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/estudiantes"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expirado"})))
        .mount(&server)
        .await;
    let client = client_for(&server);
    client.session().login(Credentials::bearer("old")).await.unwrap();

    let err = client.get_json("/estudiantes").await.unwrap_err();
    assert!(matches!(err, ConsoleError::Unauthorized(ref m) if m == "Token expirado"));
    assert!(!client.session().is_authenticated().await);
}

#[tokio::test]
async fn empty_success_body_is_null() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/materias/9"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    let client = client_for(&server);
    client.delete("/materias/9").await.unwrap();
}

#[tokio::test]
async fn malformed_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/materias"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;
    let client = client_for(&server);
    assert!(matches!(client.get_json("/materias").await, Err(ConsoleError::Decode(_))));
}

#[tokio::test]
async fn trailing_slash_in_base_url_is_ignored() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/grados"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&server)
        .await;
    let config = ClientConfig::new(format!("{}/", server.uri()));
    let client = ApiClient::new(&config, Session::in_memory()).unwrap();
    assert_eq!(client.get_records("/grados").await.unwrap().len(), 1);
}

#[tokio::test]
async fn file_backed_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");

    let first = Session::new(Arc::new(FileTokenStore::new(&file)));
    first.login(Credentials::bearer("persisted")).await.unwrap();

    let second = Session::new(Arc::new(FileTokenStore::new(&file)));
    let restored = second.restore().await.unwrap();
    assert_eq!(restored, Some(Credentials::bearer("persisted")));

    second.logout().await.unwrap();
    let third = Session::new(Arc::new(FileTokenStore::new(&file)));
    assert_eq!(third.restore().await.unwrap(), None);
}

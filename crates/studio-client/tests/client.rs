//! The assembled client against mock PostgREST and backend servers.

use serde_json::json;
use std::sync::{Arc, Mutex};
use studio_client::{AuthChangeEvent, AuthUser, Config, MemoryStorage, Session, StudioClient, UploadOptions};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup() -> (MockServer, MockServer, StudioClient) {
    let rest = MockServer::start().await;
    let backend = MockServer::start().await;
    let config = Config {
        log_level: "debug".to_string(),
        rest_url: format!("{}/rest/v1", rest.uri()),
        backend_url: backend.uri(),
        api_key: "service-key".to_string(),
    };
    let client = StudioClient::new(&config, Box::new(MemoryStorage::new())).unwrap();
    client.auth().save_session(Session {
        access_token: "user-token".to_string(),
        refresh_token: "refresh".to_string(),
        user: AuthUser::new("writer-1"),
    });
    (rest, backend, client)
}

#[tokio::test]
async fn test_queries_use_service_key_not_user_token() {
    let (rest, _backend, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/scripts"))
        .and(header("Authorization", "Bearer service-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&rest)
        .await;

    let response = client.from("scripts").select("id").execute().await;
    assert_eq!(response.data, Some(json!([{"id": 1}])));
}

#[tokio::test]
async fn test_query_401_does_not_touch_session() {
    let (rest, _backend, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "JWT invalid", "code": "PGRST301"})))
        .mount(&rest)
        .await;

    let response = client.from("scripts").select("*").execute().await;
    assert_eq!(response.error.unwrap().code.as_deref(), Some("PGRST301"));
    assert_eq!(client.auth().access_token().as_deref(), Some("user-token"));
}

#[tokio::test]
async fn test_upload_401_signs_out_subscribers() {
    let (_rest, backend, client) = setup().await;
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    client
        .auth()
        .on_auth_state_change(move |event, _session| sink.lock().unwrap().push(event));

    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(header("Authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&backend)
        .await;

    let response = client
        .storage()
        .from("videos")
        .upload("cut.mp4", vec![0u8; 4], UploadOptions::default())
        .await;

    assert!(response.error.is_some());
    assert_eq!(
        *events.lock().unwrap(),
        vec![AuthChangeEvent::InitialSession, AuthChangeEvent::SignedOut]
    );
    assert!(client.auth().get_session().data.unwrap().session.is_none());
}

#[tokio::test]
async fn test_rpc_through_facade() {
    let (rest, _backend, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/advance_stage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"stage": "shoot"})))
        .expect(1)
        .mount(&rest)
        .await;

    let stage = client
        .rpc("advance_stage", json!({"script_id": 12}))
        .execute()
        .await
        .decode::<serde_json::Value>()
        .unwrap();
    assert_eq!(stage, Some(json!({"stage": "shoot"})));
}

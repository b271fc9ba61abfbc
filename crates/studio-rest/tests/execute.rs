//! End-to-end query execution against a mock PostgREST server.

use serde_json::json;
use studio_rest::{ApiError, CountMode, FilterOperator, PostgrestClient, SelectOptions};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup() -> (MockServer, PostgrestClient) {
    let server = MockServer::start().await;
    let client = PostgrestClient::new(&format!("{}/rest/v1", server.uri()), "service-key").unwrap();
    (server, client)
}

#[tokio::test]
async fn test_select_with_filters_and_count() {
    let (server, db) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/scripts"))
        .and(query_param("select", "id,title"))
        .and(query_param("status", "in.(draft,review)"))
        .and(query_param("owner", "not.is.null"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "10"))
        .and(header("Authorization", "Bearer service-key"))
        .and(header("Content-Type", "application/json"))
        .and(header("Prefer", "count=exact"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": 1, "title": "Intro"}, {"id": 2, "title": "Outro"}]))
                .insert_header("Content-Range", "0-1/2"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = db
        .from("scripts")
        .select_with(
            "id, title",
            SelectOptions {
                count: Some(CountMode::Exact),
                head: false,
            },
        )
        .in_("status", ["draft", "review"])
        .not("owner", FilterOperator::Is, "null")
        .range(0, 9)
        .execute()
        .await;

    assert!(response.is_ok(), "unexpected error: {:?}", response.error);
    assert_eq!(response.status, Some(200));
    assert_eq!(response.count, Some(2));
    assert_eq!(response.data.unwrap().as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_server_error_is_normalised() {
    let (server, db) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/scripts"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "x", "code": "42"})))
        .mount(&server)
        .await;

    let response = db.from("scripts").select("*").execute().await;

    assert_eq!(response.data, None);
    assert_eq!(response.status, Some(400));
    let error = response.error.unwrap();
    assert_eq!(error.message, "x");
    assert_eq!(error.code.as_deref(), Some("42"));
}

#[tokio::test]
async fn test_non_json_error_falls_back_to_status() {
    let (server, db) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html>missing</html>"))
        .mount(&server)
        .await;

    let error = db.from("nope").select("*").execute().await.error.unwrap();
    assert_eq!(error.message, "Not Found");
    assert_eq!(error.code.as_deref(), Some("404"));
}

#[tokio::test]
async fn test_maybe_single_over_the_wire() {
    let (server, db) = setup().await;

    Mock::given(method("GET"))
        .and(query_param("id", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("id", "eq.2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 2}, {"id": 3}])))
        .mount(&server)
        .await;

    let empty = db.from("scripts").select("*").eq("id", 1).maybe_single().execute().await;
    assert!(empty.is_ok());
    assert_eq!(empty.data, None);

    let many = db.from("scripts").select("*").eq("id", 2).maybe_single().execute().await;
    assert!(many.is_ok());
    assert_eq!(many.data, Some(json!({"id": 2})));
}

#[tokio::test]
async fn test_single_requests_object_media_type() {
    let (server, db) = setup().await;

    Mock::given(method("GET"))
        .and(header("Accept", "application/vnd.pgrst.object+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 9})))
        .expect(1)
        .mount(&server)
        .await;

    let response = db.from("scripts").select("*").eq("id", 9).single().execute().await;
    assert_eq!(response.data, Some(json!({"id": 9})));
}

#[tokio::test]
async fn test_insert_returns_representation() {
    let (server, db) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/scripts"))
        .and(body_json(json!({"title": "Intro", "status": "draft"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": 5, "title": "Intro"}])))
        .expect(1)
        .mount(&server)
        .await;

    let response = db
        .from("scripts")
        .insert(json!({"title": "Intro", "status": "draft"}))
        .select("*")
        .execute()
        .await;

    assert_eq!(response.status, Some(201));
    assert_eq!(response.data, Some(json!([{"id": 5, "title": "Intro"}])));

    let requests = server.received_requests().await.unwrap();
    let prefer = requests[0].headers.get("Prefer").unwrap();
    assert_eq!(prefer, "return=representation");
}

#[tokio::test]
async fn test_upsert_prefers_merge() {
    let (server, db) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/assignments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": 1}])))
        .mount(&server)
        .await;

    db.from("assignments")
        .upsert(json!({"script_id": 1, "editor_id": 7}))
        .select("id")
        .execute()
        .await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        requests[0].headers.get("Prefer").unwrap(),
        "resolution=merge-duplicates,return=representation"
    );
}

#[tokio::test]
async fn test_delete_without_select_has_no_data() {
    let (server, db) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/scripts"))
        .and(query_param("id", "eq.3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 3}])))
        .expect(1)
        .mount(&server)
        .await;

    let response = db.from("scripts").delete().eq("id", 3).execute().await;
    assert!(response.is_ok());
    assert_eq!(response.data, None);
    assert!(server.received_requests().await.unwrap()[0].headers.get("Prefer").is_none());
}

#[tokio::test]
async fn test_head_count_only() {
    let (server, db) = setup().await;

    Mock::given(method("HEAD"))
        .and(path("/rest/v1/scripts"))
        .respond_with(ResponseTemplate::new(200).insert_header("Content-Range", "*/42"))
        .expect(1)
        .mount(&server)
        .await;

    let response = db
        .from("scripts")
        .select_with(
            "*",
            SelectOptions {
                count: Some(CountMode::Exact),
                head: true,
            },
        )
        .execute()
        .await;

    assert!(response.is_ok());
    assert_eq!(response.data, None);
    assert_eq!(response.count, Some(42));
}

#[tokio::test]
async fn test_unparsable_success_body() {
    let (server, db) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("definitely not json"))
        .mount(&server)
        .await;

    let response = db.from("scripts").select("*").execute().await;
    assert_eq!(response.data, None);
    assert_eq!(
        response.error.unwrap().code.as_deref(),
        Some(ApiError::PARSE_ERROR)
    );
}

#[tokio::test]
async fn test_empty_success_body_is_null_data() {
    let (server, db) = setup().await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let response = db
        .from("scripts")
        .update(json!({"status": "approved"}))
        .eq("id", 4)
        .execute()
        .await;
    assert!(response.is_ok());
    assert_eq!(response.data, None);
    assert_eq!(response.status, Some(204));
}

#[tokio::test]
async fn test_rpc_posts_params() {
    let (server, db) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/stage_counts"))
        .and(body_json(json!({"team_id": 3})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"stage": "edit", "total": 4}])))
        .expect(1)
        .mount(&server)
        .await;

    let rows = db
        .rpc("stage_counts", json!({"team_id": 3}))
        .execute()
        .await
        .into_result()
        .unwrap();
    assert_eq!(rows, Some(json!([{"stage": "edit", "total": 4}])));
}

#[tokio::test]
async fn test_malformed_queries_are_not_sent() {
    let (server, db) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let response = db.from("scripts").select("*").range(9, 0).execute().await;
    assert_eq!(
        response.error.unwrap().code.as_deref(),
        Some(ApiError::INVALID_REQUEST)
    );
    assert_eq!(response.status, None);
}

#[tokio::test]
async fn test_network_failure() {
    let db = PostgrestClient::new("http://127.0.0.1:1/rest/v1", "service-key").unwrap();

    let response = db.from("scripts").select("*").execute().await;
    assert_eq!(response.data, None);
    assert_eq!(response.status, None);
    assert!(response.error.unwrap().is_network());
}

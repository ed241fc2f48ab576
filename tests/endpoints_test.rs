//! End-to-end tests of the typed LMS operations.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use satchel::endpoints::catalog::{self, ENDPOINTS};
use satchel::{
    CredentialStore, LmsApi, MemoryCredentialStore, RequestOptions, Role, Satchel, TestSubmission,
};

fn user_json(role: &str) -> serde_json::Value {
    json!({"_id": "u1", "name": "Ada", "email": "ada@school.test", "role": role})
}

fn api_for(server: &MockServer, token: Option<&str>) -> LmsApi {
    let store = match token {
        Some(t) => MemoryCredentialStore::with_token(t),
        None => MemoryCredentialStore::new(),
    };
    let gateway = Satchel::builder()
        .base_url(format!("{}/api", server.uri()))
        .credential_store(Arc::new(store))
        .build()
        .unwrap();
    LmsApi::new(gateway)
}

#[tokio::test]
async fn concurrent_current_user_with_expired_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .and(header("authorization", "Bearer new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": user_json("student")})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/users/refresh-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"accessToken": "new"}}))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server, Some("old"));
    let results = join_all((0..3).map(|_| api.get_current_user())).await;

    for result in results {
        let me = result.unwrap();
        assert_eq!(me.data.id, "u1");
        assert_eq!(me.data.role, Role::Student);
    }

    let gateway = api.gateway();
    assert_eq!(gateway.credentials().access_token().as_deref(), Some("new"));
    let keys = gateway.cache().keys();
    assert_eq!(keys.len(), 1);
    assert!(keys[0].contains("/users/me"));
}

#[tokio::test]
async fn login_stores_token_and_logout_clears_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/login"))
        .and(body_json(json!({"email": "ada@school.test", "password": "hunter2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"accessToken": "issued", "user": user_json("teacher")}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tests"))
        .and(header("authorization", "Bearer issued"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
            {"_id": "t1", "title": "Fractions", "durationMinutes": 30}
        ]})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/users/logout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "bye"})))
        .mount(&server)
        .await;

    let api = api_for(&server, None);
    let login = api.login("ada@school.test", "hunter2").await.unwrap();
    assert_eq!(login.data.user.role, Role::Teacher);
    assert_eq!(api.gateway().credentials().access_token().as_deref(), Some("issued"));

    let tests = api.list_tests().await.unwrap();
    assert_eq!(tests.data[0].duration_minutes, Some(30));
    assert!(!api.gateway().cache().is_empty());

    api.logout().await.unwrap();
    assert!(api.gateway().credentials().load().is_none());
    assert!(api.gateway().cache().is_empty());
}

#[tokio::test]
async fn logout_clears_locally_even_when_server_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let api = api_for(&server, Some("t"));
    let err = api.logout().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(api.gateway().credentials().load().is_none());
}

#[tokio::test]
async fn update_role_drops_cached_current_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": user_json("admin")})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/users/u2/role"))
        .and(body_json(json!({"role": "teacher"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"_id": "u2", "name": "Bo", "email": "bo@school.test", "role": "teacher"}
        })))
        .mount(&server)
        .await;

    let api = api_for(&server, Some("t"));
    api.get_current_user().await.unwrap();
    api.get_current_user().await.unwrap();

    let updated = api.update_role("u2", Role::Teacher).await.unwrap();
    assert_eq!(updated.data.role, Role::Teacher);

    api.get_current_user().await.unwrap();
}

#[tokio::test]
async fn submit_test_drops_cached_tests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tests/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {
            "_id": "t1", "title": "Fractions",
            "questions": [{"text": "1/2 + 1/4?", "options": ["3/4", "2/6"]}]
        }})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/tests/t1/submit"))
        .and(body_json(json!({"answers": [0]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"score": 1}})))
        .mount(&server)
        .await;

    let api = api_for(&server, Some("t"));
    let test = api.get_test("t1").await.unwrap();
    assert_eq!(test.data.questions.len(), 1);

    let result = api
        .submit_test("t1", &TestSubmission { answers: vec![0] })
        .await
        .unwrap();
    assert_eq!(result.data["score"], 1);

    api.get_test("t1").await.unwrap();
}

#[tokio::test]
async fn homework_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/homework/h1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {
            "_id": "h1", "title": "Essay", "dueDate": "2026-11-01"
        }})))
        .mount(&server)
        .await;

    let api = api_for(&server, Some("t"));
    let homework = api.get_homework("h1").await.unwrap();
    assert_eq!(homework.data.due_date.as_deref(), Some("2026-11-01"));
}

#[test]
fn catalog_paths_resolve_under_base_url() {
    let gateway = Satchel::builder()
        .base_url("https://lms.example.org/api/")
        .build()
        .unwrap();
    for endpoint in ENDPOINTS {
        let url = gateway.url_for(&endpoint.path_with("x"));
        assert!(url.starts_with("https://lms.example.org/api/"), "{url}");
        assert!(!url.contains("//users") && !url.contains("{id}"), "{url}");
    }
    assert_eq!(
        gateway.cache_key_for(catalog::LIST_TESTS.path, &RequestOptions::get()),
        "GET:https://lms.example.org/api/tests:"
    );
}

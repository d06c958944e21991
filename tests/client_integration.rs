mod common;

use std::sync::atomic::Ordering;

use authclient::models::{ErrorKind, MessageSource};
use common::{
    build_client, DATA_BODY, EXPIRED_BODY, LOGIN_PATH, NEW_TOKEN_BODY, REFRESH_PATH,
};
use mockito::{Matcher, Server};
use serde_json::{json, Value};

#[tokio::test]
async fn login_then_expired_token_refreshes_with_cookie() {
    let mut server = Server::new_async().await;

    let login = server
        .mock("POST", LOGIN_PATH)
        .match_body(Matcher::PartialJson(json!({"email": "a@b.c"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("set-cookie", "refreshToken=r1; Path=/; HttpOnly")
        .with_body(r#"{"isSuccess":true,"result":{"accessToken":"old"}}"#)
        .expect(1)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", REFRESH_PATH)
        .match_header("cookie", Matcher::Regex("refreshToken=r1".to_string()))
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(NEW_TOKEN_BODY)
        .expect(1)
        .create_async()
        .await;
    let expired = server
        .mock("GET", "/api/v1/data")
        .match_header("authorization", "Bearer old")
        .with_status(401)
        .with_body(EXPIRED_BODY)
        .expect(1)
        .create_async()
        .await;
    let data = server
        .mock("GET", "/api/v1/data")
        .match_header("authorization", "Bearer new")
        .with_status(200)
        .with_body(DATA_BODY)
        .expect(1)
        .create_async()
        .await;

    let (client, logouts) = build_client(&server.url());
    client
        .login(json!({"email": "a@b.c", "password": "pw"}))
        .await
        .expect("login succeeds");

    let response = client.get("/api/v1/data").await.expect("replayed call succeeds");
    let result: Value = response.result().expect("result");
    assert_eq!(result["id"], 1);

    login.assert_async().await;
    refresh.assert_async().await;
    expired.assert_async().await;
    data.assert_async().await;
    assert_eq!(client.credentials().token().as_deref(), Some("new"));
    assert_eq!(logouts.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_401s_trigger_one_refresh() {
    let mut server = Server::new_async().await;

    let refresh = server
        .mock("POST", REFRESH_PATH)
        .with_status(200)
        .with_body(NEW_TOKEN_BODY)
        .expect(1)
        .create_async()
        .await;
    let expired = server
        .mock("GET", Matcher::Regex(r"^/api/v1/items/\d$".to_string()))
        .match_header("authorization", "Bearer old")
        .with_status(401)
        .with_body(EXPIRED_BODY)
        .expect(3)
        .create_async()
        .await;
    let data = server
        .mock("GET", Matcher::Regex(r"^/api/v1/items/\d$".to_string()))
        .match_header("authorization", "Bearer new")
        .with_status(200)
        .with_body(DATA_BODY)
        .expect(3)
        .create_async()
        .await;

    let (client, logouts) = build_client(&server.url());
    client.credentials().set("old");

    // A 401 that lands after the refresh settled picks up the rotated token
    // from the store, so the refresh count is one either way.
    let calls: Vec<_> = (1..=3)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move { client.get(&format!("/api/v1/items/{}", i)).await })
        })
        .collect();
    for call in calls {
        call.await.expect("task").expect("call succeeds after refresh");
    }

    refresh.assert_async().await;
    expired.assert_async().await;
    data.assert_async().await;
    assert_eq!(client.metrics().refresh_count("success"), 1);
    assert_eq!(client.metrics().retry_count(), 3);
    assert_eq!(logouts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn wrong_password_never_refreshes() {
    let mut server = Server::new_async().await;

    let login = server
        .mock("POST", LOGIN_PATH)
        .with_status(401)
        .with_body(r#"{"status":401,"code":"INVALID_SIGNIN","message":"bad credentials","isSuccess":false}"#)
        .expect(1)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", REFRESH_PATH)
        .expect(0)
        .create_async()
        .await;

    let (client, logouts) = build_client(&server.url());
    let err = client
        .login(json!({"email": "a@b.c", "password": "wrong"}))
        .await
        .expect_err("login is rejected");

    login.assert_async().await;
    refresh.assert_async().await;
    assert_eq!(err.kind, ErrorKind::Transport);
    assert_eq!(err.code(), Some("INVALID_SIGNIN"));
    assert_eq!(err.message, "이메일 또는 비밀번호가 올바르지 않습니다.");
    assert_eq!(logouts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn refresh_failure_clears_session_and_logs_out() {
    let mut server = Server::new_async().await;

    let refresh = server
        .mock("POST", REFRESH_PATH)
        .with_status(500)
        .with_body(r#"{"status":500,"code":"INTERNAL_SERVER_ERROR","isSuccess":false}"#)
        .expect(1)
        .create_async()
        .await;
    let expired = server
        .mock("GET", "/api/v1/data")
        .with_status(401)
        .with_body(EXPIRED_BODY)
        .expect(1)
        .create_async()
        .await;

    let (client, logouts) = build_client(&server.url());
    client.credentials().set("old");

    let err = client.get("/api/v1/data").await.expect_err("refresh fails");

    refresh.assert_async().await;
    expired.assert_async().await;
    assert_eq!(err.kind, ErrorKind::RefreshFailure);
    assert_eq!(err.message, "세션이 만료되었습니다. 다시 로그인해주세요.");
    assert_eq!(logouts.load(Ordering::SeqCst), 1);
    assert!(!client.is_logged_in());
    assert_eq!(client.metrics().refresh_count("failure"), 1);
}

#[tokio::test]
async fn envelope_failure_on_200_is_an_application_error() {
    let mut server = Server::new_async().await;

    let m = server
        .mock("GET", "/api/v1/items/9")
        .with_status(200)
        .with_body(r#"{"status":404,"code":"NOT_FOUND","message":"no item","isSuccess":false,"result":null}"#)
        .expect(1)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", REFRESH_PATH)
        .expect(0)
        .create_async()
        .await;

    let (client, _) = build_client(&server.url());
    client.credentials().set("abc");
    let err = client.get("/api/v1/items/9").await.expect_err("application error");

    m.assert_async().await;
    refresh.assert_async().await;
    assert_eq!(err.kind, ErrorKind::Application);
    assert_eq!(err.http_status(), Some(200));
    assert_eq!(err.origin, MessageSource::CodeTable);
    assert_eq!(err.message, "대상을 찾을 수 없습니다.");
}

#[tokio::test]
async fn validation_detail_is_flattened() {
    let mut server = Server::new_async().await;

    let _m = server
        .mock("POST", "/api/v1/users")
        .with_status(400)
        .with_body(
            r#"{"status":400,"code":"VALIDATION_FAILED","message":"invalid","isSuccess":false,
                "result":{"email":["must be an email"],"name":["must not be blank"]}}"#,
        )
        .create_async()
        .await;

    let (client, _) = build_client(&server.url());
    let err = client
        .post("/api/v1/users", json!({"email": "nope", "name": ""}))
        .await
        .expect_err("validation error");

    assert_eq!(err.origin, MessageSource::Detail);
    assert_eq!(err.message, "must be an email, must not be blank");
}

#[tokio::test]
async fn non_json_bodies_pass_through() {
    let mut server = Server::new_async().await;

    let _m = server
        .mock("GET", "/api/v1/export")
        .with_status(200)
        .with_header("content-type", "text/csv")
        .with_body("a,b\n1,2\n")
        .create_async()
        .await;

    let (client, _) = build_client(&server.url());
    let response = client.get("/api/v1/export").await.expect("passes through");

    assert_eq!(response.text(), "a,b\n1,2\n");
    assert_eq!(
        response.headers.get("content-type").and_then(|v| v.to_str().ok()),
        Some("text/csv")
    );
}

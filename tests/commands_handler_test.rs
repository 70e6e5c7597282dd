//! Integration tests for the chat command and user routes
//!
//! Tests the HTTP surface the chat host talks to:
//! - follow / forget / show commands and their replies
//! - announcements to the notification channel
//! - followed-user listing and manual poll trigger
//! - the full router with and without an active notifier

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::util::ServiceExt;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lastfm_notifier::handlers;
use lastfm_notifier::state::AppState;
use lastfm_notifier::test_utils::*;

/// Helper to create a test router with the API routes
fn create_test_router(state: &AppState) -> Router {
    Router::new()
        .nest("/api", handlers::api_routes())
        .with_state(state.clone())
}

/// Helper to parse JSON response body
async fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: axum::response::Response,
) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn send_command(state: &AppState, room: &str, user: &str, text: &str) -> Vec<String> {
    let response = create_test_router(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/commands")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "room": room, "user": user, "text": text }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = parse_json_response(response).await;
    serde_json::from_value(body["replies"].clone()).unwrap()
}

async fn mock_lastfm() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("user", "shadowplay"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("user", "flaky"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(recent_tracks_body("Daft Punk", "Discovery", "One More Time")),
        )
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_follow_from_other_room_announces() {
    let server = mock_lastfm().await;
    let ctx = setup_test_app_state(&server.uri()).await;

    let replies = send_command(&ctx.state, "#general", "sam", "follow lastfm alice").await;

    assert_eq!(
        replies,
        vec![
            "alice is now being followed. I'll report back any new Scrobbles ASAP!".to_string(),
            "I'm currently watching the following users:\nalice\n".to_string(),
        ]
    );
    assert_eq!(
        ctx.chat.messages_to(TEST_NOTIFY_CHANNEL),
        vec!["sam has added alice to the Last.fm Notifier.".to_string()]
    );
    assert_eq!(ctx.state.registry.list().await, vec!["alice"]);
}

#[tokio::test]
async fn test_follow_in_notify_channel_stays_quiet() {
    let server = mock_lastfm().await;
    let ctx = setup_test_app_state(&server.uri()).await;

    let replies = send_command(&ctx.state, TEST_NOTIFY_CHANNEL, "sam", "follow lastfm alice").await;

    assert_eq!(replies.len(), 2);
    assert!(ctx.chat.messages().is_empty());
}

#[tokio::test]
async fn test_follow_unknown_user() {
    let server = mock_lastfm().await;
    let ctx = setup_test_app_state(&server.uri()).await;

    let replies = send_command(&ctx.state, "#general", "sam", "follow lastfm shadowplay").await;

    assert_eq!(replies.len(), 1);
    assert!(replies[0].starts_with("shadowplay could not be found on Last.fm!"));
    assert!(ctx.state.registry.list().await.is_empty());
    assert!(ctx.chat.messages().is_empty());
}

#[tokio::test]
async fn test_follow_when_lastfm_is_down() {
    let server = mock_lastfm().await;
    let ctx = setup_test_app_state(&server.uri()).await;

    let replies = send_command(&ctx.state, "#general", "sam", "follow lastfm flaky").await;

    assert_eq!(
        replies,
        vec!["Last.fm could not verify flaky right now. Try again in a bit.".to_string()]
    );
    assert!(ctx.state.registry.list().await.is_empty());
    assert!(ctx.chat.messages().is_empty());
}

#[tokio::test]
async fn test_follow_twice_is_idempotent() {
    let server = mock_lastfm().await;
    let ctx = setup_test_app_state_with_users(&server.uri(), r#"{"alice":"A+B+C"}"#).await;

    let replies = send_command(&ctx.state, "#general", "sam", "follow lastfm alice").await;

    assert_eq!(replies[0], "alice is already being followed.");
    assert_eq!(ctx.store.snapshot().await.as_deref(), Some(r#"{"alice":"A+B+C"}"#));
    assert!(ctx.chat.messages().is_empty());
}

#[tokio::test]
async fn test_forget_announces_and_lists() {
    let ctx = setup_test_app_state_with_users("http://127.0.0.1:9", r#"{"alice":null,"bob":null}"#).await;

    let replies = send_command(&ctx.state, "#general", "sam", "Forget LastFM alice").await;

    assert_eq!(
        replies,
        vec![
            "Who? Never heard of them.".to_string(),
            "I'm currently watching the following users:\nbob\n".to_string(),
        ]
    );
    assert_eq!(
        ctx.chat.messages_to(TEST_NOTIFY_CHANNEL),
        vec!["sam has removed alice from the Last.fm Notifier.".to_string()]
    );
}

#[tokio::test]
async fn test_forget_unknown_user_succeeds() {
    let ctx = setup_test_app_state("http://127.0.0.1:9").await;

    let replies = send_command(&ctx.state, TEST_NOTIFY_CHANNEL, "sam", "forget lastfm nobody").await;

    assert_eq!(replies[0], "Who? Never heard of them.");
    assert_eq!(replies[1], "I'm currently watching the following users:\n");
}

#[tokio::test]
async fn test_show_users_keeps_follow_order() {
    let ctx = setup_test_app_state_with_users(
        "http://127.0.0.1:9",
        r#"{"zoe":null,"alice":null,"mike":"A+B+C"}"#,
    )
    .await;

    let replies = send_command(&ctx.state, "#general", "sam", "show lastfm users").await;

    assert_eq!(
        replies,
        vec!["I'm currently watching the following users:\nzoe\nalice\nmike\n".to_string()]
    );
}

#[tokio::test]
async fn test_unrecognised_text_gets_no_reply() {
    let ctx = setup_test_app_state("http://127.0.0.1:9").await;

    let replies = send_command(&ctx.state, "#general", "sam", "what is lastfm").await;
    assert!(replies.is_empty());
}

#[tokio::test]
async fn test_list_and_get_users() {
    let ctx = setup_test_app_state_with_users("http://127.0.0.1:9", r#"{"alice":"A+B+C","bob":null}"#).await;
    let app = create_test_router(&ctx.state);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/users").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = parse_json_response(response).await;
    assert_eq!(
        body,
        json!([
            { "username": "alice", "last_song_id": "A+B+C" },
            { "username": "bob", "last_song_id": null },
        ])
    );

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/users/alice").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/api/users/carol").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_trigger_poll_returns_summary() {
    let server = mock_lastfm().await;
    let ctx = setup_test_app_state_with_users(&server.uri(), r#"{"alice":null}"#).await;

    let response = create_test_router(&ctx.state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/poll")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = parse_json_response(response).await;
    assert_eq!(body["checked"], 1);
    assert_eq!(body["seeded"], 1);
    assert_eq!(body["notified"], 0);
}

async fn get_health(app: Router) -> Value {
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    parse_json_response(response).await
}

#[tokio::test]
async fn test_health_reports_enabled_notifier() {
    let server = mock_lastfm().await;
    let ctx = setup_test_app_state(&server.uri()).await;

    let body = get_health(handlers::create_router(Some(ctx.state.clone()))).await;
    assert_eq!(body, json!({ "status": "ok", "notifier": "enabled" }));
}

#[tokio::test]
async fn test_health_reports_disabled_notifier() {
    let body = get_health(handlers::create_router(None)).await;
    assert_eq!(body, json!({ "status": "ok", "notifier": "disabled" }));
}

#[tokio::test]
async fn test_disabled_router_serves_no_api() {
    let response = handlers::create_router(None)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/commands")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "room": "#general", "user": "sam", "text": "show lastfm users" })
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_enabled_router_serves_commands() {
    let server = mock_lastfm().await;
    let ctx = setup_test_app_state_with_users(&server.uri(), r#"{"alice":null}"#).await;

    let response = handlers::create_router(Some(ctx.state.clone()))
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/commands")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "room": "#general", "user": "sam", "text": "show lastfm users" })
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = parse_json_response(response).await;
    assert_eq!(body["replies"].as_array().map(|r| r.len()), Some(1));
}

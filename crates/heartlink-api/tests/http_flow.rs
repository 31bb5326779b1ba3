//! Integration tests: drive the full router over in-memory HTTP and walk
//! the discover -> like -> match -> message lifecycle end to end.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use heartlink_api::{AppState, AppStateInner, router};
use heartlink_db::Database;

fn test_app() -> (Router, AppState) {
    let db = Database::open_in_memory().unwrap();
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: "test-secret".to_string(),
    });
    (router(state.clone()), state)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn put(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("PUT")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn register(app: &Router, username: &str) -> (i64, String) {
    let (status, body) = send(
        app,
        post(
            "/api/auth/register",
            None,
            &json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "longenoughpw",
                "first_name": username,
                "date_of_birth": "1994-03-11",
                "gender": "female",
                "interested_in": "male",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "registering {username}");
    (
        body["user"]["id"].as_i64().unwrap(),
        body["token"].as_str().unwrap().to_string(),
    )
}

async fn matched_pair(app: &Router) -> (i64, String, i64, String, i64) {
    let (alice, alice_token) = register(app, "alice").await;
    let (bob, bob_token) = register(app, "bob").await;
    send(
        app,
        post("/api/likes", Some(&alice_token), &json!({"liked_id": bob})),
    )
    .await;
    let (_, body) = send(
        app,
        post("/api/likes", Some(&bob_token), &json!({"liked_id": alice})),
    )
    .await;
    let match_id = body["match"]["id"].as_i64().unwrap();
    (alice, alice_token, bob, bob_token, match_id)
}

#[tokio::test]
async fn register_login_and_me() {
    let (app, _state) = test_app();
    let (id, token) = register(&app, "alice").await;

    let (status, body) = send(&app, get("/api/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"].as_i64().unwrap(), id);
    assert_eq!(body["username"], "alice");
    assert!(body.get("password").is_none());

    let (status, body) = send(
        &app,
        post(
            "/api/auth/login",
            None,
            &json!({"username": "alice", "password": "longenoughpw"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());

    let (status, _) = send(
        &app,
        post(
            "/api/auth/login",
            None,
            &json!({"username": "alice", "password": "wrong-password"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get("/api/auth/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get("/api/auth/me", Some("garbage"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_rejects_taken_names_and_weak_input() {
    let (app, _state) = test_app();
    register(&app, "alice").await;

    let (status, _) = send(
        &app,
        post(
            "/api/auth/register",
            None,
            &json!({
                "username": "alice",
                "email": "other@example.com",
                "password": "longenoughpw",
                "first_name": "Other",
                "date_of_birth": "1990-01-01",
                "gender": "male",
                "interested_in": "female",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        post(
            "/api/auth/register",
            None,
            &json!({
                "username": "different",
                "email": "alice@example.com",
                "password": "longenoughpw",
                "first_name": "Other",
                "date_of_birth": "1990-01-01",
                "gender": "male",
                "interested_in": "female",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        post(
            "/api/auth/register",
            None,
            &json!({
                "username": "carol",
                "email": "carol@example.com",
                "password": "short",
                "first_name": "Carol",
                "date_of_birth": "1990-01-01",
                "gender": "female",
                "interested_in": "male",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn like_match_and_message_flow() {
    let (app, _state) = test_app();
    let (alice, alice_token) = register(&app, "alice").await;
    let (bob, bob_token) = register(&app, "bob").await;

    // Alice sees Bob in her feed
    let (status, body) = send(&app, get("/api/discover", Some(&alice_token))).await;
    assert_eq!(status, StatusCode::OK);
    let feed = body.as_array().unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0]["id"].as_i64().unwrap(), bob);
    assert!(feed[0]["profile"].is_object());

    // First like, no match yet
    let (status, body) = send(
        &app,
        post("/api/likes", Some(&alice_token), &json!({"liked_id": bob})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["is_match"], json!(false));
    assert!(body["match"].is_null());

    // Bob likes back and the match forms, with Bob as the completing liker
    let (status, body) = send(
        &app,
        post("/api/likes", Some(&bob_token), &json!({"liked_id": alice})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["is_match"], json!(true));
    assert_eq!(body["match"]["user1_id"].as_i64().unwrap(), bob);
    assert_eq!(body["match"]["user2_id"].as_i64().unwrap(), alice);
    let match_id = body["match"]["id"].as_i64().unwrap();

    // Both feeds are now empty
    let (_, body) = send(&app, get("/api/discover", Some(&alice_token))).await;
    assert!(body.as_array().unwrap().is_empty());
    let (_, body) = send(&app, get("/api/discover", Some(&bob_token))).await;
    assert!(body.as_array().unwrap().is_empty());

    // Liking twice is a conflict
    let (status, _) = send(
        &app,
        post("/api/likes", Some(&alice_token), &json!({"liked_id": bob})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Alice writes first
    let uri = format!("/api/matches/{match_id}/messages");
    let (status, body) = send(
        &app,
        post(&uri, Some(&alice_token), &json!({"content": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["sender_id"].as_i64().unwrap(), alice);
    assert_eq!(body["receiver_id"].as_i64().unwrap(), bob);

    // Bob's match list reports one unread, and looking at the list twice
    // changes nothing
    for _ in 0..2 {
        let (status, body) = send(&app, get("/api/matches", Some(&bob_token))).await;
        assert_eq!(status, StatusCode::OK);
        let summary = &body.as_array().unwrap()[0];
        assert_eq!(summary["match"]["id"].as_i64().unwrap(), match_id);
        assert_eq!(summary["unread_count"], json!(1));
        assert_eq!(summary["last_message"]["content"], "hi");
        assert_eq!(summary["other_user"]["id"].as_i64().unwrap(), alice);
        assert_eq!(summary["other_user"]["username"], "alice");
    }

    // Opening the thread marks it read
    let (status, body) = send(&app, get(&uri, Some(&bob_token))).await;
    assert_eq!(status, StatusCode::OK);
    let thread = body.as_array().unwrap();
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0]["content"], "hi");

    let (_, body) = send(&app, get("/api/matches", Some(&bob_token))).await;
    assert_eq!(body.as_array().unwrap()[0]["unread_count"], json!(0));

    // Alice never had anything unread
    let (_, body) = send(&app, get("/api/matches", Some(&alice_token))).await;
    assert_eq!(body.as_array().unwrap()[0]["unread_count"], json!(0));
}

#[tokio::test]
async fn conversations_are_members_only() {
    let (app, _state) = test_app();
    let (_alice, alice_token, _bob, _bob_token, match_id) = matched_pair(&app).await;
    let (_carol, carol_token) = register(&app, "carol").await;

    let uri = format!("/api/matches/{match_id}/messages");

    let (status, _) = send(&app, get(&uri, Some(&carol_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        post(&uri, Some(&carol_token), &json!({"content": "let me in"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, get("/api/matches/999/messages", Some(&alice_token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, post(&uri, Some(&alice_token), &json!({"content": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get(&uri, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn likes_validate_their_target() {
    let (app, _state) = test_app();
    let (alice, alice_token) = register(&app, "alice").await;

    let (status, _) = send(
        &app,
        post("/api/likes", Some(&alice_token), &json!({"liked_id": alice})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post("/api/likes", Some(&alice_token), &json!({"liked_id": 4242})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn discover_honors_the_limit() {
    let (app, _state) = test_app();
    let (_viewer, viewer_token) = register(&app, "viewer").await;
    let (first, _) = register(&app, "first").await;
    let (second, _) = register(&app, "second").await;
    register(&app, "third").await;

    let (status, body) = send(&app, get("/api/discover?limit=2", Some(&viewer_token))).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|card| card["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![first, second]);
}

#[tokio::test]
async fn profile_round_trip() {
    let (app, _state) = test_app();
    let (_alice, token) = register(&app, "alice").await;

    let (status, body) = send(&app, get("/api/profile", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["last_active"].is_string());

    let (status, body) = send(
        &app,
        put(
            "/api/profile",
            Some(&token),
            &json!({"bio": "climber", "interests": ["bouldering"]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bio"], "climber");
    assert_eq!(body["interests"], json!(["bouldering"]));

    // A later partial update leaves earlier fields alone
    let (status, body) = send(
        &app,
        put("/api/profile", Some(&token), &json!({"city": "Lisbon"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bio"], "climber");
    assert_eq!(body["city"], "Lisbon");
}

#[tokio::test]
async fn verification_and_password_reset() {
    let (app, state) = test_app();
    register(&app, "alice").await;

    let token = state
        .db
        .get_user_by_username("alice")
        .unwrap()
        .unwrap()
        .verification_token
        .unwrap();

    let (status, body) = send(&app, get(&format!("/api/auth/verification/{token}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], json!(true));
    assert_eq!(body["is_verified"], json!(false));

    let (status, body) = send(&app, post("/api/auth/verify", None, &json!({"token": token}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["is_verified"], json!(true));

    // The token is single use
    let (status, _) = send(&app, get(&format!("/api/auth/verification/{token}"), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post(
            "/api/auth/forgot-password",
            None,
            &json!({"email": "alice@example.com"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Unknown addresses get the same answer
    let (status, _) = send(
        &app,
        post(
            "/api/auth/forgot-password",
            None,
            &json!({"email": "nobody@example.com"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let reset = state
        .db
        .get_user_by_username("alice")
        .unwrap()
        .unwrap()
        .verification_token
        .unwrap();

    let (status, _) = send(
        &app,
        post(
            "/api/auth/reset-password",
            None,
            &json!({"token": reset, "password": "brandnewpassword"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Old password out, new password in
    let (status, _) = send(
        &app,
        post(
            "/api/auth/login",
            None,
            &json!({"username": "alice", "password": "longenoughpw"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        post(
            "/api/auth/login",
            None,
            &json!({"username": "alice", "password": "brandnewpassword"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // A consumed reset token is dead
    let (status, _) = send(
        &app,
        post(
            "/api/auth/reset-password",
            None,
            &json!({"token": reset, "password": "anotherpassword1"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, Detail, Poll, PollResults, Token, User, Vote};
use tower::{Service, ServiceExt};

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str, token: Option<&str>) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

fn form_request(uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            http::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(body.to_string())
        .unwrap()
}

fn get_request(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

/// Send one request through a shared router so state persists between calls.
async fn send(app: &mut Router, request: Request<String>) -> axum::response::Response {
    ServiceExt::<Request<String>>::ready(app)
        .await
        .unwrap()
        .call(request)
        .await
        .unwrap()
}

/// Register and log in `username`, returning the access token.
async fn signed_in(app: &mut Router, username: &str) -> String {
    let resp = send(
        app,
        json_request(
            "POST",
            "/register",
            &format!(r#"{{"username":"{username}","password":"pw"}}"#),
            None,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(app, form_request("/login", &format!("username={username}&password=pw"))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let token: Token = body_json(resp).await;
    token.access_token
}

// --- register ---

#[tokio::test]
async fn register_returns_user() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/register",
            r#"{"username":"alice","password":"pw"}"#,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let user: User = body_json(resp).await;
    assert_eq!(user.username, "alice");
}

#[tokio::test]
async fn register_twice_returns_400() {
    let mut app = app();
    let body = r#"{"username":"alice","password":"pw"}"#;
    let resp = send(&mut app, json_request("POST", "/register", body, None)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&mut app, json_request("POST", "/register", body, None)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let detail: Detail = body_json(resp).await;
    assert_eq!(detail.detail, "Username already registered");
}

#[tokio::test]
async fn register_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/register", r#"{"username":"x"}"#, None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn register_syntax_error_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/register", "{not json", None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let detail: Detail = body_json(resp).await;
    assert!(!detail.detail.is_empty());
}

#[tokio::test]
async fn vote_with_syntax_error_returns_422() {
    let mut app = app();
    let token = signed_in(&mut app, "voter").await;
    let resp = send(&mut app, json_request("POST", "/polls/1/vote", "{\"option_id\":", Some(&token))).await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- login ---

#[tokio::test]
async fn login_returns_bearer_token() {
    let mut app = app();
    let token = signed_in(&mut app, "bob").await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn login_wrong_password_returns_400() {
    let mut app = app();
    signed_in(&mut app, "bob").await;

    let resp = send(&mut app, form_request("/login", "username=bob&password=nope")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_unknown_user_returns_400() {
    let resp = app()
        .oneshot(form_request("/login", "username=ghost&password=pw"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- polls ---

#[tokio::test]
async fn list_polls_empty() {
    let resp = app().oneshot(get_request("/polls")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let polls: Vec<Poll> = body_json(resp).await;
    assert!(polls.is_empty());
}

#[tokio::test]
async fn create_poll_without_token_returns_401() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/polls",
            r#"{"question":"Q","options":["A","B"]}"#,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_poll_with_unknown_token_returns_401() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/polls",
            r#"{"question":"Q","options":["A","B"]}"#,
            Some("not-a-session"),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn list_polls_paginates() {
    let mut app = app();
    let token = signed_in(&mut app, "carol").await;
    for i in 0..4 {
        let body = format!(r#"{{"question":"Q{i}","options":["A","B"]}}"#);
        let resp = send(&mut app, json_request("POST", "/polls", &body, Some(&token))).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = send(&mut app, get_request("/polls?skip=1&limit=2")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let polls: Vec<Poll> = body_json(resp).await;
    let questions: Vec<_> = polls.iter().map(|p| p.question.as_str()).collect();
    assert_eq!(questions, ["Q1", "Q2"]);
}

// --- votes and results ---

#[tokio::test]
async fn vote_on_unknown_poll_returns_404() {
    let mut app = app();
    let token = signed_in(&mut app, "dave").await;

    let resp = send(
        &mut app,
        json_request("POST", "/polls/42/vote", r#"{"option_id":1}"#, Some(&token)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn results_for_unknown_poll_returns_404() {
    let resp = app().oneshot(get_request("/polls/42/results")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full poll lifecycle ---

#[tokio::test]
async fn poll_lifecycle() {
    let mut app = app();
    let token = signed_in(&mut app, "erin").await;

    // create
    let resp = send(
        &mut app,
        json_request(
            "POST",
            "/polls",
            r#"{"question":"Favorite language?","options":["Rust","Go"]}"#,
            Some(&token),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let poll: Poll = body_json(resp).await;
    assert_eq!(poll.options.len(), 2);
    let rust = poll.options[0].id;

    // vote on an option that belongs to another poll
    let resp = send(
        &mut app,
        json_request(
            "POST",
            &format!("/polls/{}/vote", poll.id),
            r#"{"option_id":999}"#,
            Some(&token),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // vote
    let vote_body = format!(r#"{{"option_id":{rust}}}"#);
    let resp = send(
        &mut app,
        json_request("POST", &format!("/polls/{}/vote", poll.id), &vote_body, Some(&token)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let vote: Vote = body_json(resp).await;
    assert_eq!(vote.poll_id, poll.id);
    assert_eq!(vote.option_id, rust);

    // second vote by the same user is rejected
    let resp = send(
        &mut app,
        json_request("POST", &format!("/polls/{}/vote", poll.id), &vote_body, Some(&token)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // results
    let resp = send(&mut app, get_request(&format!("/polls/{}/results", poll.id))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let results: PollResults = body_json(resp).await;
    assert_eq!(results.question, "Favorite language?");
    let tallies: Vec<_> = results.results.iter().map(|r| (r.text.as_str(), r.votes)).collect();
    assert_eq!(tallies, [("Rust", 1), ("Go", 0)]);
}

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use axum_extra::extract::cookie::Key;
use serde_json::{Value, json};
use std::{
    fs,
    path::PathBuf,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use study_desk::db::StudyStorage;
use study_desk::router::{AppState, StaticAssets, study_router};
use tower::ServiceExt;

const ACCOUNT: &str = "owner";

struct TestApp {
    app: Router,
    storage: StudyStorage,
    db_path: PathBuf,
    static_dir: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.db_path);
        let _ = fs::remove_dir_all(&self.static_dir);
    }
}

async fn spawn_app(tag: &str) -> TestApp {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let stem = format!("study-desk-{tag}-{}-{}", std::process::id(), nanos);

    let mut db_path = std::env::temp_dir();
    db_path.push(format!("{stem}.sqlite"));
    let mut static_dir = std::env::temp_dir();
    static_dir.push(format!("{stem}-static"));
    fs::create_dir_all(&static_dir).expect("failed to create static dir");
    fs::write(static_dir.join("index.html"), "<h1>study</h1>").expect("failed to write index");
    fs::write(static_dir.join(".env"), "STUDY_SESSION_SECRET=topsecret")
        .expect("failed to write .env");
    fs::write(static_dir.join("checklist.db"), "SQLite format 3").expect("failed to write db copy");

    let database_url = format!("sqlite:{}", db_path.display());
    let storage = StudyStorage::connect(&database_url)
        .await
        .expect("failed to open database");
    let state = AppState::new(storage.clone(), Arc::from(ACCOUNT), Key::generate(), true);
    let assets = StaticAssets::new(&static_dir).hide_database_files("checklist.db");

    TestApp {
        app: study_router(state, assets),
        storage,
        db_path,
        static_dir,
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let resp = app.clone().oneshot(req).await.expect("request failed");
    let status = resp.status();
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or_default().to_string());
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, cookie, value)
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    builder.body(Body::empty()).expect("failed to build request")
}

fn post_json(uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

async fn login(app: &Router) -> String {
    let (status, cookie, body) = send(
        app,
        post_json("/api/auth/login", None, json!({ "username": ACCOUNT })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));
    cookie.expect("login did not set a session cookie")
}

#[tokio::test]
async fn login_with_unknown_username_is_unauthorized() {
    let t = spawn_app("login-unknown").await;
    let (status, cookie, _) = send(
        &t.app,
        post_json("/api/auth/login", None, json!({ "username": "intruder" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(cookie.is_none());
}

#[tokio::test]
async fn auth_status_follows_session() {
    let t = spawn_app("status").await;

    let (_, _, anon) = send(&t.app, get("/api/auth/status", None)).await;
    assert_eq!(anon, json!({ "loggedIn": false, "username": null }));

    let cookie = login(&t.app).await;
    let (_, _, me) = send(&t.app, get("/api/auth/status", Some(&cookie))).await;
    assert_eq!(me, json!({ "loggedIn": true, "username": ACCOUNT }));

    let (status, cleared, body) = send(
        &t.app,
        post_json("/api/auth/logout", Some(&cookie), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));
    assert_eq!(cleared.as_deref(), Some("study_session="));
}

#[tokio::test]
async fn tampered_cookie_is_not_a_session() {
    let t = spawn_app("tampered").await;
    let (_, _, anon) = send(
        &t.app,
        get("/api/auth/status", Some("study_session=not-encrypted")),
    )
    .await;
    assert_eq!(anon["loggedIn"], json!(false));
}

#[tokio::test]
async fn checklist_write_requires_session() {
    let t = spawn_app("checklist-forbidden").await;

    let (status, _, body) = send(
        &t.app,
        post_json("/api/checklist", None, json!({ "ch1": true })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], json!("FORBIDDEN"));

    let (_, _, stored) = send(&t.app, get("/api/checklist", None)).await;
    assert_eq!(stored, json!({}));
}

#[tokio::test]
async fn checklist_round_trips_after_login() {
    let t = spawn_app("checklist").await;
    let cookie = login(&t.app).await;

    let entries = json!({ "ch1": true, "ch2": false, "ch3": true });
    let (status, _, body) = send(
        &t.app,
        post_json("/api/checklist", Some(&cookie), entries.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (_, _, stored) = send(&t.app, get("/api/checklist", None)).await;
    assert_eq!(stored, entries);

    send(
        &t.app,
        post_json("/api/checklist", Some(&cookie), json!({ "ch1": false })),
    )
    .await;
    let (_, _, stored) = send(&t.app, get("/api/checklist", None)).await;
    assert_eq!(stored, json!({ "ch1": false, "ch2": false, "ch3": true }));
}

#[tokio::test]
async fn keyword_write_requires_session() {
    let t = spawn_app("keywords-forbidden").await;
    let (status, _, _) = send(
        &t.app,
        post_json(
            "/api/keywords/2021-1st",
            None,
            json!({ "subject": "math", "keywords": "A" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, _, view) = send(&t.app, get("/api/keywords/2021-1st?subject=math", None)).await;
    assert_eq!(view, json!({ "keywords": "", "isAggregated": false }));
}

#[tokio::test]
async fn keywords_round_trip_and_aggregate() {
    let t = spawn_app("keywords").await;
    let cookie = login(&t.app).await;

    for (subject, text) in [("math", "A\nB"), ("law", "C")] {
        let (status, _, _) = send(
            &t.app,
            post_json(
                "/api/keywords/2022-1st",
                Some(&cookie),
                json!({ "subject": subject, "keywords": text }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    // no subject: stored under the all-subjects row, which aggregation skips
    send(
        &t.app,
        post_json(
            "/api/keywords/2022-1st",
            Some(&cookie),
            json!({ "keywords": "stale" }),
        ),
    )
    .await;

    let (_, _, math) = send(&t.app, get("/api/keywords/2022-1st?subject=math", None)).await;
    assert_eq!(math, json!({ "keywords": "A\nB", "isAggregated": false }));

    let (_, _, all) = send(&t.app, get("/api/keywords/2022-1st", None)).await;
    assert_eq!(all, json!({ "keywords": "A\nB\nC", "isAggregated": true }));
}

#[tokio::test]
async fn multi_year_merges_keyword_counts() {
    let t = spawn_app("multi-year").await;
    let cookie = login(&t.app).await;

    for (exam, text) in [("2020-1st", "A\nB\nA"), ("2021-1st", "B\nC")] {
        send(
            &t.app,
            post_json(
                &format!("/api/keywords/{exam}"),
                Some(&cookie),
                json!({ "subject": "math", "keywords": text }),
            ),
        )
        .await;
    }

    let (status, _, report) = send(
        &t.app,
        get(
            "/api/keywords/multi-year?examType=1st&subject=math&years=2&baseYear=2021",
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        report,
        json!({
            "examIds": ["2020-1st", "2021-1st"],
            "subject": "math",
            "yearRange": "2020-2021",
            "mergedKeywords": { "A": 2, "B": 2, "C": 1 },
            "yearData": { "2020-1st": 3, "2021-1st": 2 }
        })
    );
}

#[tokio::test]
async fn multi_year_single_year_window() {
    let t = spawn_app("multi-year-one").await;
    let (status, _, report) = send(
        &t.app,
        get("/api/keywords/multi-year?examType=2nd&years=1&baseYear=2020", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["examIds"], json!(["2020-2nd"]));
    assert_eq!(report["subject"], json!("all"));
    assert_eq!(report["mergedKeywords"], json!({}));
}

#[tokio::test]
async fn multi_year_without_base_year_is_bad_request() {
    let t = spawn_app("multi-year-400").await;
    let (status, _, body) = send(
        &t.app,
        get("/api/keywords/multi-year?examType=1st&years=2", None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("BAD_REQUEST"));
}

#[tokio::test]
async fn static_assets_are_served_outside_api() {
    let t = spawn_app("static").await;

    let resp = t
        .app
        .clone()
        .oneshot(get("/index.html", None))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"<h1>study</h1>");

    let resp = t
        .app
        .clone()
        .oneshot(get("/api/nope", None))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn private_files_are_not_served() {
    let t = spawn_app("private-files").await;

    for uri in ["/.env", "/%2Eenv", "/checklist.db", "/checklist.db-wal"] {
        let resp = t
            .app
            .clone()
            .oneshot(get(uri, None))
            .await
            .expect("request failed");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri} was served");
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(!String::from_utf8_lossy(&body).contains("topsecret"));
    }
}

#[tokio::test]
async fn empty_subject_is_the_all_subjects_row() {
    let t = spawn_app("empty-subject").await;
    let cookie = login(&t.app).await;

    for (subject, text) in [("math", "A"), ("", "Z")] {
        let (status, _, _) = send(
            &t.app,
            post_json(
                "/api/keywords/2022-1st",
                Some(&cookie),
                json!({ "subject": subject, "keywords": text }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    // the empty-subject write landed on the all-subjects row, which reads skip
    let (_, _, view) = send(&t.app, get("/api/keywords/2022-1st?subject=", None)).await;
    assert_eq!(view, json!({ "keywords": "A", "isAggregated": true }));

    let (_, _, report) = send(
        &t.app,
        get(
            "/api/keywords/multi-year?examType=1st&subject=&years=1&baseYear=2022",
            None,
        ),
    )
    .await;
    assert_eq!(report["subject"], json!("all"));
    assert_eq!(report["mergedKeywords"], json!({ "A": 1 }));
}

#[tokio::test]
async fn store_failure_is_500_with_driver_message_and_no_rows() {
    let t = spawn_app("store-failure").await;
    let cookie = login(&t.app).await;

    sqlx::query(
        r#"CREATE TRIGGER reject_broken BEFORE INSERT ON checklist
           WHEN NEW.id = 'broken'
           BEGIN SELECT RAISE(ABORT, 'broken row rejected'); END"#,
    )
    .execute(t.storage.pool())
    .await
    .expect("failed to install trigger");

    let (status, _, body) = send(
        &t.app,
        post_json(
            "/api/checklist",
            Some(&cookie),
            json!({ "a-first": true, "broken": true, "z-last": false }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], json!("STORE_FAILURE"));
    let message = body["error"]["message"].as_str().unwrap_or_default();
    assert!(message.contains("broken row rejected"), "message: {message}");

    let (_, _, stored) = send(&t.app, get("/api/checklist", None)).await;
    assert_eq!(stored, json!({}));
}

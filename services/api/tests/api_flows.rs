//! End-to-end flows against a real database.
//!
//! Run with `DATABASE_URL` pointing at a Postgres server and `--ignored`.

mod common;

use std::io::Cursor;
use std::time::Duration;

use api::jwt::JwtService;
use api::password::hash_password;
use api::repositories::UserRepository;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{Datelike, Local, NaiveDate};
use common::{
    DEFAULT_PASSWORD, body_json, build_test_app, delete, get, login, patch, send, send_json,
    test_config,
};
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_first_login_creates_the_single_account(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(pool.clone(), test_config(dir.path()));

    let wrong = send_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        json!({ "password": "nope" }),
    )
    .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let token = login(&app, DEFAULT_PASSWORD).await;
    let profile = body_json(get(&app, "/api/auth/profile", Some(&token)).await).await;
    assert_eq!(profile["success"], true);
    assert_eq!(profile["user"]["username"], "couple");

    // Once the account exists a changed default no longer applies
    let mut config = test_config(dir.path());
    config.default_password = "changed-default".to_string();
    let restarted = build_test_app(pool.clone(), config);
    let response = send_json(
        &restarted,
        "POST",
        "/api/auth/login",
        None,
        json!({ "password": "changed-default" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    login(&restarted, DEFAULT_PASSWORD).await;

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(users, 1);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_resources_are_scoped_to_their_owner(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let secret = config.jwt_secret.clone();
    let app = build_test_app(pool.clone(), config);
    let token = login(&app, DEFAULT_PASSWORD).await;

    let created = send_json(
        &app,
        "POST",
        "/api/diaries",
        Some(&token),
        json!({ "title": "First date", "content": "Coffee", "mood": "love" }),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let diary = body_json(created).await;
    let id = diary["data"]["id"].as_str().unwrap().to_string();

    let hash = hash_password("other-password").await.unwrap();
    let other = UserRepository::new(pool.clone())
        .create_if_absent("someone-else", &hash)
        .await
        .unwrap();
    let other_token = JwtService::new(&secret, Duration::from_secs(600))
        .generate_token(other.id)
        .unwrap();

    let uri = format!("/api/diaries/{id}");
    assert_eq!(
        get(&app, &uri, Some(&other_token)).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        delete(&app, &uri, Some(&other_token)).await.status(),
        StatusCode::NOT_FOUND
    );
    let updated = send_json(
        &app,
        "PUT",
        &uri,
        Some(&other_token),
        json!({ "title": "Hijacked" }),
    )
    .await;
    assert_eq!(updated.status(), StatusCode::NOT_FOUND);
    let listed = body_json(get(&app, "/api/diaries", Some(&other_token)).await).await;
    assert_eq!(listed["pagination"]["total"], 0);

    let owned = get(&app, &uri, Some(&token)).await;
    assert_eq!(owned.status(), StatusCode::OK);
    let owned = body_json(owned).await;
    assert_eq!(owned["data"]["title"], "First date");
    assert_eq!(owned["data"]["content"], "Coffee");
    let missing = format!("/api/diaries/{}", uuid::Uuid::new_v4());
    assert_eq!(
        get(&app, &missing, Some(&token)).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        get(&app, "/api/diaries/not-a-uuid", Some(&token)).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_toggle_sets_and_clears_completion(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, test_config(dir.path()));
    let token = login(&app, DEFAULT_PASSWORD).await;

    let created = send_json(
        &app,
        "POST",
        "/api/todos",
        Some(&token),
        json!({ "content": "Book the restaurant", "priority": "high" }),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let todo = body_json(created).await;
    assert_eq!(todo["data"]["isCompleted"], false);
    assert!(todo["data"]["completedAt"].is_null());
    let uri = format!("/api/todos/{}/toggle", todo["data"]["id"].as_str().unwrap());

    let toggled = body_json(patch(&app, &uri, Some(&token)).await).await;
    assert_eq!(toggled["data"]["isCompleted"], true);
    assert!(toggled["data"]["completedAt"].is_string());

    let toggled = body_json(patch(&app, &uri, Some(&token)).await).await;
    assert_eq!(toggled["data"]["isCompleted"], false);
    assert!(toggled["data"]["completedAt"].is_null());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_upcoming_projects_recurring_dates(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, test_config(dir.path()));
    let token = login(&app, DEFAULT_PASSWORD).await;

    let today = Local::now().date_naive();
    let soon = today + chrono::Duration::days(5);
    let anniversary = NaiveDate::from_ymd_opt(soon.year() - 4, soon.month(), soon.day())
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(soon.year() - 4, soon.month(), 28).unwrap());
    let far = today + chrono::Duration::days(45);

    for (title, date, recurring) in [
        ("Anniversary", anniversary, true),
        ("Trip", far, false),
    ] {
        let response = send_json(
            &app,
            "POST",
            "/api/memorials",
            Some(&token),
            json!({ "title": title, "date": date.to_string(), "isRecurring": recurring }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let upcoming = body_json(get(&app, "/api/memorials/upcoming", Some(&token)).await).await;
    let items = upcoming["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Anniversary");
    let days = items[0]["daysUntil"].as_i64().unwrap();
    assert!((0..=30).contains(&days));

    let all = body_json(get(&app, "/api/memorials", Some(&token)).await).await;
    assert_eq!(all["data"].as_array().unwrap().len(), 2);
}

fn png(seed: u8) -> Vec<u8> {
    let image = RgbImage::from_pixel(64, 48, Rgb([seed, 120, 200]));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn upload_request(token: &str, title: &str, files: &[(&str, Vec<u8>)]) -> Request<Body> {
    const BOUNDARY: &str = "X-LOVE-NEST-FLOW";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\n{title}\r\n"
        )
        .as_bytes(),
    );
    for (name, data) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photos\"; filename=\"{name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/photos/upload")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn stored_files(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_upload_numbers_titles_and_delete_removes_files(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, test_config(dir.path()));
    let token = login(&app, DEFAULT_PASSWORD).await;

    let response = send(
        &app,
        upload_request(&token, "Title", &[("a.png", png(10)), ("b.png", png(20))]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let uploaded = body_json(response).await;
    let photos = uploaded["data"].as_array().unwrap();
    assert_eq!(photos.len(), 2);
    assert_eq!(photos[0]["title"], "Title 1");
    assert_eq!(photos[1]["title"], "Title 2");
    assert!(photos[0]["url"].as_str().unwrap().starts_with("/uploads/"));
    assert!(photos[0]["thumbnailUrl"].as_str().unwrap().starts_with("/uploads/"));

    // Originals plus thumbnails
    assert_eq!(stored_files(dir.path()), 4);
    let served = get(&app, photos[0]["thumbnailUrl"].as_str().unwrap(), None).await;
    assert_eq!(served.status(), StatusCode::OK);

    let uri = format!("/api/photos/{}", photos[0]["id"].as_str().unwrap());
    assert_eq!(delete(&app, &uri, Some(&token)).await.status(), StatusCode::OK);
    assert_eq!(stored_files(dir.path()), 2);
    assert_eq!(get(&app, &uri, Some(&token)).await.status(), StatusCode::NOT_FOUND);

    let listed = body_json(get(&app, "/api/photos", Some(&token)).await).await;
    assert_eq!(listed["pagination"]["total"], 1);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_rejected_upload_stores_nothing(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, test_config(dir.path()));
    let token = login(&app, DEFAULT_PASSWORD).await;

    let response = send(
        &app,
        upload_request(
            &token,
            "Broken",
            &[("good.png", png(1)), ("bad.png", b"not an image".to_vec())],
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(stored_files(dir.path()), 0);

    let listed = body_json(get(&app, "/api/photos", Some(&token)).await).await;
    assert_eq!(listed["pagination"]["total"], 0);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_settings_update_is_partial(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, test_config(dir.path()));
    let token = login(&app, DEFAULT_PASSWORD).await;

    let before = body_json(get(&app, "/api/auth/profile", Some(&token)).await).await;

    let response = send_json(
        &app,
        "PUT",
        "/api/auth/settings",
        Some(&token),
        json!({ "person1Name": "Alex", "person2Name": "", "loveStartDate": "2022-02-14" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let after = body_json(response).await;
    assert_eq!(after["user"]["person1Name"], "Alex");
    assert_eq!(after["user"]["person2Name"], before["user"]["person2Name"]);
    assert_eq!(after["user"]["loveStartDate"], "2022-02-14");
}

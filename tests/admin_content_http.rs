mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::app::{spawn_test_server, spawn_test_server_with_upload_limit};
use common::auth::{auth_header, session_cookie_header, setup_admin_and_login};
use common::fixtures::{seed_contact, seed_news, seed_teacher};
use common::http::{assert_json_error, request, request_bytes, response_json};

use school_site::content::ContentKind;

fn ids_of(body: &serde_json::Value) -> Vec<String> {
    body["data"]["records"]
        .as_array()
        .expect("records array")
        .iter()
        .map(|r| r["id"].as_str().expect("record id").to_string())
        .collect()
}

#[tokio::test]
async fn it_admin_content_requires_session() {
    let app = spawn_test_server().await;

    let response = request(&app.app, Method::GET, "/api/admin/content/news", None, &[]).await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_json_error(&body, "AUTH_UNAUTHORIZED");

    let response = request(
        &app.app,
        Method::POST,
        "/api/admin/content/news/bulk-delete",
        Some(json!({ "ids": ["x"] })),
        &[("authorization", auth_header("not-a-jwt"))],
    )
    .await;
    let (status, _, _) = response_json(response).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn it_session_cookie_authenticates_admin_api() {
    let app = spawn_test_server().await;
    let (_token, cookie) = setup_admin_and_login(&app.app).await;

    let response = request(
        &app.app,
        Method::GET,
        "/api/admin/content/contact-messages",
        None,
        &[("cookie", session_cookie_header(&cookie))],
    )
    .await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["kind"], "contact-message");
}

#[tokio::test]
async fn it_list_applies_filter_search_and_sort() {
    let app = spawn_test_server().await;
    let (token, _) = setup_admin_and_login(&app.app).await;
    let store = app.state.store();

    let first = seed_news(store, "Откриване на годината", "Opening", "events", true).await;
    let draft = seed_news(store, "Чернова", "Draft", "events", false).await;
    let club = seed_news(store, "Шахматен клуб", "Chess club", "clubs", true).await;
    let auth = [("authorization", auth_header(&token))];

    let response = request(&app.app, Method::GET, "/api/admin/content/news", None, &auth).await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(ids_of(&body), vec![club.clone(), draft.clone(), first.clone()]);
    assert_eq!(body["data"]["phase"]["state"], "loaded");

    let response = request(
        &app.app,
        Method::GET,
        "/api/admin/content/news?status=published&category=events",
        None,
        &auth,
    )
    .await;
    let (_, _, body) = response_json(response).await;
    assert_eq!(ids_of(&body), vec![first.clone()]);
    assert_eq!(body["data"]["visible"], 1);

    let response = request(
        &app.app,
        Method::GET,
        "/api/admin/content/news?q=%D0%A8%D0%90%D0%A5",
        None,
        &auth,
    )
    .await;
    let (_, _, body) = response_json(response).await;
    assert_eq!(ids_of(&body), vec![club.clone()]);

    let response = request(
        &app.app,
        Method::GET,
        "/api/admin/content/news?sort=createdAt&order=asc",
        None,
        &auth,
    )
    .await;
    let (_, _, body) = response_json(response).await;
    assert_eq!(ids_of(&body), vec![first, draft, club]);
}

#[tokio::test]
async fn it_unknown_kind_is_not_found() {
    let app = spawn_test_server().await;
    let (token, _) = setup_admin_and_login(&app.app).await;

    let response = request(
        &app.app,
        Method::GET,
        "/api/admin/content/users",
        None,
        &[("authorization", auth_header(&token))],
    )
    .await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_json_error(&body, "NOT_FOUND");
}

#[tokio::test]
async fn it_create_update_and_delete_record() {
    let app = spawn_test_server().await;
    let (token, _) = setup_admin_and_login(&app.app).await;
    let auth = [("authorization", auth_header(&token))];

    let response = request(
        &app.app,
        Method::POST,
        "/api/admin/content/teachers?locale=en",
        Some(json!({
            "name": { "bg": "Иван Петров", "en": "Ivan Petrov" },
            "subjects": ["Математика"],
            "sortOrder": 2,
            "published": true,
        })),
        &auth,
    )
    .await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["message"], "Record created.");
    let id = body["data"]["record"]["id"].as_str().unwrap().to_string();
    assert_eq!(app.state.store().count_documents(ContentKind::Teacher), 1);

    let response = request(
        &app.app,
        Method::PUT,
        &format!("/api/admin/content/teachers/{id}"),
        Some(json!({ "sortOrder": 7 })),
        &auth,
    )
    .await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["record"]["sortOrder"], 7);
    assert_eq!(body["data"]["record"]["name"]["en"], "Ivan Petrov");

    let response = request(
        &app.app,
        Method::DELETE,
        &format!("/api/admin/content/teachers/{id}"),
        None,
        &auth,
    )
    .await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(app.state.store().count_documents(ContentKind::Teacher), 0);

    let response = request(
        &app.app,
        Method::DELETE,
        &format!("/api/admin/content/teachers/{id}"),
        None,
        &auth,
    )
    .await;
    let (status, _, _) = response_json(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn it_create_rejects_invalid_fields() {
    let app = spawn_test_server().await;
    let (token, _) = setup_admin_and_login(&app.app).await;

    let response = request(
        &app.app,
        Method::POST,
        "/api/admin/content/news",
        Some(json!({ "title": 42 })),
        &[("authorization", auth_header(&token))],
    )
    .await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "INVALID_FIELDS");
    assert_eq!(app.state.store().count_documents(ContentKind::News), 0);
}

#[tokio::test]
async fn it_toggle_flips_status_and_localizes_message() {
    let app = spawn_test_server().await;
    let (token, _) = setup_admin_and_login(&app.app).await;
    let id = seed_teacher(app.state.store(), "Мария", 1, false).await;

    let response = request(
        &app.app,
        Method::POST,
        &format!("/api/admin/content/teachers/{id}/toggle"),
        Some(json!({ "current": false })),
        &[("authorization", auth_header(&token))],
    )
    .await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["record"]["published"], true);
    assert_eq!(body["data"]["message"], "Записът е публикуван.");
}

#[tokio::test]
async fn it_contact_messages_toggle_responded() {
    let app = spawn_test_server().await;
    let (token, _) = setup_admin_and_login(&app.app).await;
    let id = seed_contact(app.state.store(), "Прием").await;

    let response = request(
        &app.app,
        Method::POST,
        &format!("/api/admin/content/contact-messages/{id}/toggle"),
        Some(json!({ "current": false })),
        &[("authorization", auth_header(&token))],
    )
    .await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["record"]["responded"], true);
}

#[tokio::test]
async fn it_bulk_delete_only_touches_visible_selection() {
    let app = spawn_test_server().await;
    let (token, _) = setup_admin_and_login(&app.app).await;
    let store = app.state.store();

    let a = seed_news(store, "А", "A", "events", true).await;
    let b = seed_news(store, "Б", "B", "events", false).await;
    let c = seed_news(store, "В", "C", "clubs", true).await;

    let response = request(
        &app.app,
        Method::POST,
        "/api/admin/content/news/bulk-delete?locale=en",
        Some(json!({
            "ids": [a, b, "ghost"],
            "filter": { "publish": "published" },
        })),
        &[("authorization", auth_header(&token))],
    )
    .await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["succeeded"], 1);
    assert_eq!(body["data"]["failed"], 0);
    assert!(body["data"]["message"].as_str().unwrap().contains('1'));

    assert_eq!(store.count_documents(ContentKind::News), 2);
    let response = request(
        &app.app,
        Method::GET,
        "/api/admin/content/news",
        None,
        &[("authorization", auth_header(&token))],
    )
    .await;
    let (_, _, body) = response_json(response).await;
    let mut remaining = ids_of(&body);
    remaining.sort();
    let mut expected = vec![b, c];
    expected.sort();
    assert_eq!(remaining, expected);
}

#[tokio::test]
async fn it_bulk_delete_with_nothing_selected_is_rejected() {
    let app = spawn_test_server().await;
    let (token, _) = setup_admin_and_login(&app.app).await;
    seed_news(app.state.store(), "А", "A", "events", true).await;

    let response = request(
        &app.app,
        Method::POST,
        "/api/admin/content/news/bulk-delete",
        Some(json!({ "ids": ["ghost"] })),
        &[("authorization", auth_header(&token))],
    )
    .await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "EMPTY_SELECTION");
    assert_eq!(app.state.store().count_documents(ContentKind::News), 1);
}

#[tokio::test]
async fn it_bulk_status_updates_visible_ids() {
    let app = spawn_test_server().await;
    let (token, _) = setup_admin_and_login(&app.app).await;
    let store = app.state.store();

    let a = seed_news(store, "А", "A", "events", false).await;
    let b = seed_news(store, "Б", "B", "clubs", false).await;

    let response = request(
        &app.app,
        Method::POST,
        "/api/admin/content/news/bulk-status?locale=en",
        Some(json!({
            "ids": [a, b],
            "value": true,
            "filter": { "category": "events" },
        })),
        &[("authorization", auth_header(&token))],
    )
    .await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["updated"], 1);

    let response = request(&app.app, Method::GET, "/api/content/news", None, &[]).await;
    let (_, _, body) = response_json(response).await;
    let public = body["data"].as_array().unwrap();
    assert_eq!(public.len(), 1);
    assert_eq!(public[0]["id"], a);
}

#[tokio::test]
async fn it_bulk_blank_category_filter_selects_every_category() {
    let app = spawn_test_server().await;
    let (token, _) = setup_admin_and_login(&app.app).await;
    let store = app.state.store();

    let a = seed_news(store, "А", "A", "events", false).await;
    let b = seed_news(store, "Б", "B", "clubs", false).await;

    let response = request(
        &app.app,
        Method::POST,
        "/api/admin/content/news/bulk-status",
        Some(json!({
            "ids": [a, b],
            "value": true,
            "filter": { "category": "  ", "search": " " },
        })),
        &[("authorization", auth_header(&token))],
    )
    .await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["updated"], 2);

    let response = request(
        &app.app,
        Method::POST,
        "/api/admin/content/news/bulk-delete",
        Some(json!({ "ids": [a, b], "filter": { "category": "" } })),
        &[("authorization", auth_header(&token))],
    )
    .await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["succeeded"], 2);
    assert_eq!(app.state.store().count_documents(ContentKind::News), 0);
}

#[tokio::test]
async fn it_bulk_rejects_oversized_id_lists() {
    let app = spawn_test_server().await;
    let (token, _) = setup_admin_and_login(&app.app).await;
    let ids: Vec<String> = (0..501).map(|i| format!("id-{i}")).collect();

    let response = request(
        &app.app,
        Method::POST,
        "/api/admin/content/news/bulk-status",
        Some(json!({ "ids": ids, "value": true })),
        &[("authorization", auth_header(&token))],
    )
    .await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "TOO_MANY_IDS");
}

#[tokio::test]
async fn it_upload_stores_image_under_kind_bucket() {
    let app = spawn_test_server().await;
    let (token, _) = setup_admin_and_login(&app.app).await;
    let auth = [("authorization", auth_header(&token))];

    let png = vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3];
    let response = request_bytes(
        &app.app,
        "/api/admin/uploads/news?filename=photo.PNG",
        png.clone(),
        &auth,
    )
    .await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let url = body["data"]["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/static/uploads/news-images/"), "{url}");
    assert!(url.ends_with(".png"));
    assert_eq!(body["data"]["size"], png.len());

    let response = request(&app.app, Method::GET, &url, None, &[]).await;
    let served = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(served.as_ref(), png.as_slice());
}

#[tokio::test]
async fn it_upload_rejects_bad_requests() {
    let app = spawn_test_server_with_upload_limit(16).await;
    let (token, _) = setup_admin_and_login(&app.app).await;
    let auth = [("authorization", auth_header(&token))];

    let response = request_bytes(
        &app.app,
        "/api/admin/uploads/news?filename=script.exe",
        vec![1, 2, 3],
        &auth,
    )
    .await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_json_error(&body, "UNSUPPORTED_MEDIA_TYPE");

    let response = request_bytes(
        &app.app,
        "/api/admin/uploads/contact-messages?filename=a.png",
        vec![1, 2, 3],
        &auth,
    )
    .await;
    let (status, _, _) = response_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let response = request_bytes(
        &app.app,
        "/api/admin/uploads/teachers?filename=a.png",
        vec![0; 64],
        &auth,
    )
    .await;
    let (status, _, _) = response_json(response).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    let response = request_bytes(
        &app.app,
        "/api/admin/uploads/teachers?filename=a.png",
        vec![1, 2, 3],
        &[],
    )
    .await;
    let (status, _, _) = response_json(response).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

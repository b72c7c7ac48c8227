use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use bookmarks_api::app;
use bookmarks_api::bookmarks::BookmarkStore;
use bookmarks_api::db::Database;
use bookmarks_api::handler::AppState;
use bookmarks_api::model::NewBookmark;
use serde_json::{Value, json};
use tower::ServiceExt;

const API_TOKEN: &str = "test-api-token";

struct TestApp {
    router: Router,
    db: Arc<Database>,
    token: Option<&'static str>,
}

impl TestApp {
    async fn new() -> Self {
        Self::build(None).await
    }

    async fn with_token() -> Self {
        Self::build(Some(API_TOKEN)).await
    }

    async fn build(token: Option<&'static str>) -> Self {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let router = app(AppState::new(db.clone(), token));
        TestApp { router, db, token }
    }

    async fn seed(&self) -> Vec<i64> {
        let store = BookmarkStore::new(self.db.connection());
        let fixtures = [
            ("google", "https://www.google.com", "test description 1", 5),
            ("Thinkful", "https://www.thinkful.com", "test description 2", 4),
            ("espn", "https://espn.go.com", "test description 3", 4),
            ("freecodecamp", "https://freecodecamp.com", "test description 4", 5),
        ];

        let mut ids = Vec::new();
        for (title, url, description, rating) in fixtures {
            let bookmark = store
                .create(NewBookmark {
                    title: title.to_string(),
                    url: url.to_string(),
                    description: Some(description.to_string()),
                    rating,
                })
                .await
                .unwrap();
            ids.push(bookmark.id);
        }
        ids
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = self.token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.router.clone().oneshot(request).await.unwrap()
    }
}

async fn read_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn read_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

fn error_body(message: &str) -> Value {
    json!({ "error": { "message": message } })
}

#[tokio::test]
async fn test_list_empty_returns_empty_array() {
    let app = TestApp::new().await;
    let resp = app.send("GET", "/api/bookmarks", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_json(resp).await, json!([]));
}

#[tokio::test]
async fn test_list_returns_stored_bookmarks() {
    let app = TestApp::new().await;
    let ids = app.seed().await;

    let resp = app.send("GET", "/api/bookmarks", None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = read_json(resp).await;
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 4);
    assert_eq!(
        items[0],
        json!({
            "id": ids[0],
            "title": "google",
            "url": "https://www.google.com",
            "description": "test description 1",
            "rating": 5
        })
    );
}

#[tokio::test]
async fn test_get_by_id() {
    let app = TestApp::new().await;
    let ids = app.seed().await;

    let resp = app.send("GET", &format!("/api/bookmarks/{}", ids[1]), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert_eq!(body["title"], "Thinkful");
    assert_eq!(body["rating"], 4);
}

#[tokio::test]
async fn test_get_missing_returns_404() {
    let app = TestApp::new().await;

    for uri in ["/api/bookmarks/0009", "/api/bookmarks/123456", "/api/bookmarks/not-an-id"] {
        let resp = app.send("GET", uri, None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(read_json(resp).await, error_body("Bookmark doesn't exist"));
    }
}

#[tokio::test]
async fn test_xss_content_is_filtered_on_read() {
    let app = TestApp::new().await;
    let store = BookmarkStore::new(app.db.connection());
    let malicious = store
        .create(NewBookmark {
            title: r#"Naughty naughty very naughty <script>alert("xss");</script>"#.to_string(),
            url: "https://www.hackers.com".to_string(),
            description: Some(
                r#"Bad image <img src="https://url.to.file.which/does-not.exist" onerror="alert(document.cookie);">. But not <strong>all</strong> bad."#
                    .to_string(),
            ),
            rating: 1,
        })
        .await
        .unwrap();

    let expected_title = r#"Naughty naughty very naughty &lt;script&gt;alert("xss");&lt;/script&gt;"#;
    let expected_description =
        r#"Bad image <img src="https://url.to.file.which/does-not.exist">. But not <strong>all</strong> bad."#;

    let list = read_json(app.send("GET", "/api/bookmarks", None).await).await;
    assert_eq!(list[0]["title"], expected_title);
    assert_eq!(list[0]["description"], expected_description);

    let single = read_json(app.send("GET", &format!("/api/bookmarks/{}", malicious.id), None).await).await;
    assert_eq!(single["title"], expected_title);
    assert_eq!(single["description"], expected_description);
    assert_eq!(single["url"], "https://www.hackers.com");

    // raw text stays in the table
    let stored = store.get_by_id(malicious.id).await.unwrap().unwrap();
    assert!(stored.title.contains("<script>"));
}

#[tokio::test]
async fn test_create_returns_201_with_location() {
    let app = TestApp::new().await;
    let new_bookmark = json!({
        "title": "Test new bookmark",
        "url": "https://test.com",
        "description": "test description...",
        "rating": 3
    });

    let resp = app.send("POST", "/api/bookmarks", Some(new_bookmark.clone())).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = resp.headers()[header::LOCATION].to_str().unwrap().to_string();

    let body = read_json(resp).await;
    let id = body["id"].as_i64().unwrap();
    assert_eq!(location, format!("/bookmark/{id}"));
    assert_eq!(body["title"], new_bookmark["title"]);
    assert_eq!(body["url"], new_bookmark["url"]);
    assert_eq!(body["description"], new_bookmark["description"]);
    assert_eq!(body["rating"], 3);

    let fetched = read_json(app.send("GET", &format!("/api/bookmarks/{id}"), None).await).await;
    assert_eq!(fetched, body);
}

#[tokio::test]
async fn test_create_filters_xss_in_response() {
    let app = TestApp::new().await;
    let resp = app
        .send(
            "POST",
            "/api/bookmarks",
            Some(json!({
                "title": r#"Naughty naughty very naughty <script>alert("xss");</script>"#,
                "url": "https://www.hackers.com",
                "rating": 1
            })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = read_json(resp).await;
    assert_eq!(
        body["title"],
        r#"Naughty naughty very naughty &lt;script&gt;alert("xss");&lt;/script&gt;"#
    );
    assert_eq!(body["description"], Value::Null);
}

#[tokio::test]
async fn test_create_missing_fields() {
    let app = TestApp::new().await;
    let cases = [
        (json!({"url": "https://test.com", "rating": 1}), "'title' is required"),
        (json!({"title": "test-title", "rating": 1}), "'url' is required"),
        (json!({"title": "test-title", "url": "https://test.com"}), "'rating' is required"),
    ];

    for (body, message) in cases {
        let resp = app.send("POST", "/api/bookmarks", Some(body)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(resp).await, error_body(message));
    }

    let list = read_json(app.send("GET", "/api/bookmarks", None).await).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_create_invalid_rating_and_url() {
    let app = TestApp::new().await;

    let resp = app
        .send(
            "POST",
            "/api/bookmarks",
            Some(json!({"title": "test-title", "url": "https://test.com", "rating": "invalid"})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(resp).await, error_body("'rating' must be a number between 0 and 5"));

    let resp = app
        .send(
            "POST",
            "/api/bookmarks",
            Some(json!({"title": "test-title", "url": "htp://invalid-url", "rating": 1})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(resp).await, error_body("'url' must be a valid URL"));
}

#[tokio::test]
async fn test_create_malformed_json() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/bookmarks")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let resp = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = read_json(resp).await;
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn test_delete_existing() {
    let app = TestApp::new().await;
    let ids = app.seed().await;

    let resp = app.send("DELETE", &format!("/api/bookmarks/{}", ids[1]), None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(read_bytes(resp).await.is_empty());

    let list = read_json(app.send("GET", "/api/bookmarks", None).await).await;
    let remaining: Vec<i64> = list.as_array().unwrap().iter().map(|b| b["id"].as_i64().unwrap()).collect();
    assert_eq!(remaining, vec![ids[0], ids[2], ids[3]]);
}

#[tokio::test]
async fn test_delete_missing_returns_404() {
    let app = TestApp::new().await;
    let resp = app.send("DELETE", "/api/bookmarks/123", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(resp).await, error_body("Bookmark doesn't exist"));
}

#[tokio::test]
async fn test_patch_missing_returns_404() {
    let app = TestApp::new().await;
    let resp = app
        .send("PATCH", "/api/bookmarks/123456", Some(json!({"title": "x"})))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(resp).await, error_body("Bookmark doesn't exist"));
}

#[tokio::test]
async fn test_patch_all_fields() {
    let app = TestApp::new().await;
    let ids = app.seed().await;
    let uri = format!("/api/bookmarks/{}", ids[1]);
    let update = json!({
        "title": "updated bookmark title",
        "url": "https://test.com",
        "description": "updated bookmark content",
        "rating": 3
    });

    let resp = app.send("PATCH", &uri, Some(update.clone())).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(read_bytes(resp).await.is_empty());

    let fetched = read_json(app.send("GET", &uri, None).await).await;
    let mut expected = update;
    expected["id"] = json!(ids[1]);
    assert_eq!(fetched, expected);
}

#[tokio::test]
async fn test_patch_subset_leaves_other_fields() {
    let app = TestApp::new().await;
    let ids = app.seed().await;
    let uri = format!("/api/bookmarks/{}", ids[1]);
    let before = read_json(app.send("GET", &uri, None).await).await;

    let resp = app
        .send(
            "PATCH",
            &uri,
            Some(json!({
                "title": "updated bookmark title",
                "fieldToIgnore": "should not be in GET response"
            })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let after = read_json(app.send("GET", &uri, None).await).await;
    let mut expected = before;
    expected["title"] = json!("updated bookmark title");
    assert_eq!(after, expected);
    assert!(after.get("fieldToIgnore").is_none());
}

#[tokio::test]
async fn test_patch_without_known_fields_returns_400() {
    let app = TestApp::new().await;
    let ids = app.seed().await;
    let uri = format!("/api/bookmarks/{}", ids[1]);
    let message = "Request body must contain either 'title', 'url', 'description', or 'rating'";

    for body in [json!({}), json!({"irrelevantField": "foo"})] {
        let resp = app.send("PATCH", &uri, Some(body)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(resp).await, error_body(message));
    }
}

#[tokio::test]
async fn test_patch_rejects_invalid_values() {
    let app = TestApp::new().await;
    let ids = app.seed().await;
    let uri = format!("/api/bookmarks/{}", ids[0]);

    let resp = app.send("PATCH", &uri, Some(json!({"rating": 11}))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app.send("PATCH", &uri, Some(json!({"url": "htp://invalid-url"}))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let fetched = read_json(app.send("GET", &uri, None).await).await;
    assert_eq!(fetched["rating"], 5);
    assert_eq!(fetched["url"], "https://www.google.com");
}

#[tokio::test]
async fn test_end_to_end_lifecycle() {
    let app = TestApp::new().await;

    let resp = app
        .send(
            "POST",
            "/api/bookmarks",
            Some(json!({"title": "t", "url": "https://x.com", "rating": 3})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = resp.headers()[header::LOCATION].to_str().unwrap().to_string();
    let created = read_json(resp).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(location, format!("/bookmark/{id}"));

    let uri = format!("/api/bookmarks/{id}");
    let resp = app.send("GET", &uri, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_json(resp).await, created);

    let resp = app.send("DELETE", &uri, None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.send("GET", &uri, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app.send("DELETE", &uri, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unauthorized_requests_are_rejected() {
    let app = TestApp::with_token().await;
    let ids = app.seed().await;
    let item = format!("/api/bookmarks/{}", ids[1]);

    let requests = [
        ("GET", "/api/bookmarks".to_string(), None),
        (
            "POST",
            "/api/bookmarks".to_string(),
            Some(json!({"title": "test-title", "url": "http://some.thing.com", "rating": 1})),
        ),
        ("GET", item.clone(), None),
        ("DELETE", item.clone(), None),
        ("PATCH", item.clone(), Some(json!({"title": "x"}))),
    ];

    for (method, uri, body) in requests {
        let mut builder = Request::builder().method(method).uri(&uri);
        let request = match body {
            Some(body) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                builder.body(Body::from(body.to_string())).unwrap()
            }
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(read_json(resp).await, json!({ "error": "Unauthorized request" }));
    }

    // nothing was deleted
    let resp = app.send("GET", &item, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_token_is_rejected() {
    let app = TestApp::with_token().await;
    let request = Request::builder()
        .method("GET")
        .uri("/api/bookmarks")
        .header(header::AUTHORIZATION, "Bearer not-the-token")
        .body(Body::empty())
        .unwrap();

    let resp = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_healthcheck_is_open() {
    let app = TestApp::with_token().await;
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();

    let resp = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_json(resp).await, json!({ "status": "ok" }));
}

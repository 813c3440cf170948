use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use eh_core::types::{CreateEventInput, EventFields};
use eh_serve::assets::{AssetHost, ImageUpload, UploadError};
use eh_serve::config::Config;
use eh_serve::{AppState, app, build_hub};
use futures::future::BoxFuture;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "evhub-test-boundary";

#[derive(Default)]
struct FakeHost {
    uploads: Mutex<Vec<String>>,
    fail: bool,
}

impl FakeHost {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

impl AssetHost for FakeHost {
    fn upload(&self, image: ImageUpload) -> BoxFuture<'_, Result<String, UploadError>> {
        Box::pin(async move {
            if self.fail {
                return Err(UploadError::Rejected {
                    status: 503,
                    message: "asset host unavailable".to_string(),
                });
            }
            let url = format!("https://cdn.test/{}", image.file_name);
            self.uploads.lock().unwrap().push(url.clone());
            Ok(url)
        })
    }
}

struct TestApp {
    _dir: TempDir,
    state: AppState,
    host: Arc<FakeHost>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_host(FakeHost::default())
    }

    fn with_host(host: FakeHost) -> Self {
        Self::build(host, Config::default().max_upload_bytes)
    }

    fn with_upload_limit(max_upload_bytes: usize) -> Self {
        Self::build(FakeHost::default(), max_upload_bytes)
    }

    fn build(host: FakeHost, max_upload_bytes: usize) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            db_path: dir.path().join("events.db").to_string_lossy().to_string(),
            upload_dir: dir.path().join("uploads"),
            max_upload_bytes,
            ..Config::default()
        };
        let host = Arc::new(host);
        let state = AppState::new(config, host.clone());
        Self {
            _dir: dir,
            state,
            host,
        }
    }

    fn router(&self) -> Router {
        app(self.state.clone())
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = self.send(request).await;
        (status, serde_json::from_str(&body).unwrap())
    }

    async fn seed(&self, title: &str, tags: &[&str]) -> eh_core::types::Event {
        let hub = build_hub(&self.state).await.unwrap();
        hub.events()
            .create(CreateEventInput {
                fields: fields(title, tags),
                image: "https://cdn.test/seed.png".to_string(),
            })
            .unwrap()
    }
}

fn fields(title: &str, tags: &[&str]) -> EventFields {
    EventFields {
        title: title.to_string(),
        description: "A day of talks".to_string(),
        overview: "Talks and workshops".to_string(),
        venue: "Main Hall".to_string(),
        location: "Berlin, Germany".to_string(),
        date: "2024-06-14".to_string(),
        time: "09:00".to_string(),
        mode: "hybrid".to_string(),
        audience: "Developers".to_string(),
        agenda: vec!["Keynote".to_string()],
        organizer: "Dev Community".to_string(),
        tags: tags.iter().map(|tag| (*tag).to_string()).collect(),
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn form_fields<'a>(overrides: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
    let mut parts = vec![
        ("title", "Rust Belt Conf"),
        ("description", "A regional Rust conference"),
        ("overview", "Two days of talks"),
        ("venue", "Convention Center"),
        ("location", "Pittsburgh, USA"),
        ("date", "June 14, 2024"),
        ("time", "10:30"),
        ("mode", "offline"),
        ("audience", "Rustaceans"),
        ("agenda", r#"["Registration","Talks"]"#),
        ("organizer", "Rust Belt"),
        ("tags", r#"["rust","conference"]"#),
    ];
    for (key, value) in overrides {
        match parts.iter_mut().find(|(name, _)| name == key) {
            Some(part) => part.1 = *value,
            None => parts.push((*key, *value)),
        }
    }
    parts
}

fn multipart(fields: &[(&str, &str)], image: Option<&[u8]>) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"banner.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/events")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_list_events_empty() {
    let app = TestApp::new();
    let (status, body) = app.send_json(get("/api/events")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Events fetched successfully");
    assert_eq!(body["events"], json!([]));
}

#[tokio::test]
async fn test_create_event_via_multipart() {
    let app = TestApp::new();
    let (status, body) = app
        .send_json(multipart(&form_fields(&[]), Some(b"png-bytes".as_slice())))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Event created successfully");
    let event = &body["event"];
    assert_eq!(event["slug"], "rust-belt-conf");
    assert_eq!(event["date"], "2024-06-14");
    assert_eq!(event["image"], "https://cdn.test/banner.png");
    assert_eq!(event["tags"], json!(["rust", "conference"]));
    assert_eq!(event["agenda"], json!(["Registration", "Talks"]));
    assert!(event["id"].as_str().unwrap().starts_with("evt_"));
    assert_eq!(app.host.count(), 1);

    let (status, body) = app.send_json(get("/api/events/Rust-Belt-Conf")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Event retrieved successfully");
    assert_eq!(body["data"]["title"], "Rust Belt Conf");
}

#[tokio::test]
async fn test_create_event_accepts_large_banner() {
    let app = TestApp::new();
    let banner = vec![7u8; 3 * 1024 * 1024];
    let (status, body) = app
        .send_json(multipart(&form_fields(&[]), Some(banner.as_slice())))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["event"]["slug"], "rust-belt-conf");
    assert_eq!(app.host.count(), 1);
}

#[tokio::test]
async fn test_create_event_over_upload_limit() {
    let app = TestApp::with_upload_limit(64 * 1024);
    let banner = vec![7u8; 256 * 1024];
    let (status, body) = app
        .send_json(multipart(&form_fields(&[]), Some(banner.as_slice())))
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], "payload_too_large");
    assert_eq!(app.host.count(), 0);

    let (_, body) = app.send_json(get("/api/events")).await;
    assert_eq!(body["events"], json!([]));
}

#[tokio::test]
async fn test_create_event_requires_image() {
    let app = TestApp::new();
    let (status, body) = app.send_json(multipart(&form_fields(&[]), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Image file is required");
    assert_eq!(app.host.count(), 0);
}

#[tokio::test]
async fn test_invalid_submission_never_uploads() {
    let app = TestApp::new();
    let (status, body) = app
        .send_json(multipart(&form_fields(&[("time", "9am")]), Some(b"png".as_slice())))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_failed");
    assert_eq!(app.host.count(), 0);

    let (status, body) = app
        .send_json(multipart(&form_fields(&[("tags", "rust, conference")]), Some(b"png".as_slice())))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("tags"));
    assert_eq!(app.host.count(), 0);
}

#[tokio::test]
async fn test_upload_failure_persists_nothing() {
    let app = TestApp::with_host(FakeHost::failing());
    let (status, body) = app
        .send_json(multipart(&form_fields(&[]), Some(b"png".as_slice())))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Event creation failed");
    assert!(body["error"].as_str().unwrap().contains("asset host unavailable"));

    let (_, body) = app.send_json(get("/api/events")).await;
    assert_eq!(body["events"], json!([]));
}

#[tokio::test]
async fn test_duplicate_titles_get_distinct_slugs() {
    let app = TestApp::new();
    let (_, first) = app
        .send_json(multipart(&form_fields(&[]), Some(b"png".as_slice())))
        .await;
    let (status, second) = app
        .send_json(multipart(&form_fields(&[]), Some(b"png".as_slice())))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(first["event"]["slug"], second["event"]["slug"]);
    assert!(
        second["event"]["slug"]
            .as_str()
            .unwrap()
            .starts_with("rust-belt-conf-evt_")
    );
}

#[tokio::test]
async fn test_get_event_errors() {
    let app = TestApp::new();
    let (status, body) = app.send_json(get("/api/events/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Event not found");
    assert!(body["correlationId"].as_str().unwrap().starts_with("corr_"));

    let (status, body) = app.send_json(get("/api/events/%20")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Slug cannot be empty");
}

#[tokio::test]
async fn test_update_event_recomputes_slug_on_title_change() {
    let app = TestApp::new();
    app.seed("Go Meetup", &["go"]).await;

    let request = Request::builder()
        .method("PATCH")
        .uri("/api/events/go-meetup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "title": "Go Conference" }).to_string()))
        .unwrap();
    let (status, body) = app.send_json(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["slug"], "go-conference");

    let (status, _) = app.send_json(get("/api/events/go-meetup")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_similar_events_route() {
    let app = TestApp::new();
    let a = app.seed("Event A", &["go", "rust"]).await;
    let b = app.seed("Event B", &["rust", "cloud"]).await;
    app.seed("Event C", &["java"]).await;

    let (status, body) = app
        .send_json(get(&format!("/api/events/{}/similar", a.slug)))
        .await;
    assert_eq!(status, StatusCode::OK);
    let slugs: Vec<&str> = body["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|event| event["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, vec![b.slug.as_str()]);

    let (status, body) = app.send_json(get("/api/events/unknown/similar")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events"], json!([]));
}

#[tokio::test]
async fn test_booking_outcomes() {
    let app = TestApp::new();
    let event = app.seed("Booked Event", &["rust"]).await;

    let (status, body) = app
        .send_json(post_json(
            "/api/bookings",
            &json!({ "eventId": event.id.as_str(), "email": "not-an-email" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["reason"], "invalid_email");
    assert_eq!(body["error"], "Invalid email format");

    let (status, body) = app
        .send_json(post_json(
            "/api/bookings",
            &json!({ "eventId": "665f1c2e9b1e8a0012345678", "email": "ada@example.com" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "invalid_event_id");

    let ghost = eh_core::types::EventId::generate();
    let (status, body) = app
        .send_json(post_json(
            "/api/bookings",
            &json!({ "eventId": ghost.as_str(), "email": "ada@example.com" }),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["reason"], "event_not_found");

    let (status, body) = app
        .send_json(post_json(
            "/api/bookings",
            &json!({ "eventId": event.id.as_str(), "email": "Ada@Example.com" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["booking"]["email"], "ada@example.com");
    assert!(body.get("reason").is_none());

    let (status, body) = app
        .send_json(post_json(
            "/api/bookings",
            &json!({ "eventId": event.id.as_str().to_lowercase(), "email": "grace@example.com" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["booking"]["eventId"], event.id.as_str());

    let hub = build_hub(&app.state).await.unwrap();
    assert_eq!(hub.bookings().count_for_event(&event.id).unwrap(), 2);
}

#[tokio::test]
async fn test_home_page() {
    let app = TestApp::new();
    let (status, html) = app.send(get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Featured Events"));
    assert!(html.contains(r##"<a id="explore-btn" href="#events">Explore Events</a>"##));
    assert!(html.contains("No events available yet"));

    app.seed("Rust <Night>", &["rust"]).await;
    let (_, html) = app.send(get("/")).await;
    assert!(html.contains("Rust &lt;Night&gt;"));
    assert!(html.contains(r#"href="/events/rust-night""#));
}

#[tokio::test]
async fn test_event_page_and_booking_form() {
    let app = TestApp::new();
    let event = app.seed("Rust Meetup", &["rust"]).await;
    app.seed("Rust Workshop", &["rust", "training"]).await;

    let (status, html) = app.send(get(&format!("/events/{}", event.slug))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Be the first to book"));
    assert!(html.contains("Similar Events"));
    assert!(html.contains("rust-workshop"));

    let request = Request::builder()
        .method("POST")
        .uri(format!("/events/{}/book", event.slug))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("email=ada%40example.com"))
        .unwrap();
    let (status, html) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Thanks for Signing Up!"));
    assert!(html.contains("Join 1 people"));

    let request = Request::builder()
        .method("POST")
        .uri(format!("/events/{}/book", event.slug))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("email=nope"))
        .unwrap();
    let (status, html) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(html.contains("Invalid email format"));

    let (status, _) = app.send(get("/events/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_static_and_docs() {
    let app = TestApp::new();
    let response = app.router().oneshot(get("/static/styles.css")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
    assert!(response.headers().contains_key("x-correlation-id"));

    let (status, body) = app.send_json(get("/api/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/api/bookings").is_some());

    let (status, _) = app.send(get("/static/missing.css")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

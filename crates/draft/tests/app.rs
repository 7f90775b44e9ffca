//! Full request handling through the facade.

use draft::config::{ConfigLoader, DraftConfig};
use draft::prelude::*;
use draft_test::{TestClient, TestRequest};

fn app(config: &DraftConfig) -> Engine {
    let mut engine = draft::engine_from_config(config).unwrap();
    engine
        .get("/", |c| c.html(200, "index.html", &json!({ "title": "Draft" })))
        .unwrap();

    let mut api = engine.group("/api");
    api.use_middleware([handler_fn(|c: &mut Context| {
        if c.request().headers().get("authorization").is_none() {
            c.fail(401, "unauthorized");
            return;
        }
        c.next();
        c.set_header("x-api", "1");
    })]);
    api.get("/users/:id", |c| {
        let id = c.param("id").unwrap_or_default().to_owned();
        let mut body = H::new();
        body.insert("id".to_string(), json!(id));
        c.json(200, &body);
    })
    .unwrap();
    api.get("/crash", |_| panic!("database unavailable")).unwrap();
    engine
}

fn config_with_templates(dir: &std::path::Path) -> DraftConfig {
    std::fs::write(dir.join("index.html"), "<title>{{ title }}</title>").unwrap();
    let toml = format!(
        "[server]\npool_capacity = 8\n\n[templates]\nglob = \"{}/*.html\"\n",
        dir.display()
    );
    ConfigLoader::new()
        .with_string(&toml, "toml")
        .unwrap()
        .load()
        .unwrap()
}

#[tokio::test]
async fn test_configured_app() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_templates(dir.path());
    let client = TestClient::new(app(&config));

    client
        .get("/")
        .await
        .unwrap()
        .assert_status(200)
        .assert_content_type("text/html")
        .assert_body_eq("<title>Draft</title>");

    client
        .get("/api/users/42")
        .await
        .unwrap()
        .assert_status(401)
        .assert_body_eq(r#"{"message":"unauthorized"}"#);

    let response = client
        .send(TestRequest::get("/api/users/42").bearer_token("t"))
        .await
        .unwrap();
    response.assert_status(200).assert_body_eq(r#"{"id":"42"}"#);
    assert_eq!(response.header_str("x-api"), Some("1"));
}

#[tokio::test]
async fn test_default_stack_recovers_from_panics() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_templates(dir.path());
    let client = TestClient::new(app(&config)).with_default_header("authorization", "Bearer t");

    client
        .get("/api/crash")
        .await
        .unwrap()
        .assert_status(500)
        .assert_body_eq(r#"{"message":"Internal Server Error"}"#);

    let pool = client.dispatcher().pool();
    assert_eq!(pool.idle(), pool.allocated());
    assert_eq!(pool.capacity(), 8);
}

#[tokio::test]
async fn test_not_found_passes_through_middleware() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_templates(dir.path());
    let client = TestClient::new(app(&config)).with_default_header("authorization", "Bearer t");

    let response = client.get("/api/unknown").await.unwrap();
    response
        .assert_status(404)
        .assert_body_eq("404 NOT FOUND: /api/unknown");
    assert_eq!(response.header_str("x-api"), Some("1"));
}

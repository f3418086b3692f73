use anyhow::Result;
use axum::extract::Request;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::middleware::{from_fn, Next};
use axum::response::{Html, Response};
use axum::Router;
use std::path::PathBuf;
use tower_http::services::{ServeDir, ServeFile};

const PLACEHOLDER_INDEX: &str = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>GeoIP Heatmap</title>
  </head>
  <body style="font-family: system-ui; padding: 24px">
    <h1>GeoIP Heatmap</h1>
    <p>No front end is installed. Set <code>HEATMAP_STATIC_ROOT</code> or pass <code>--static-root</code> to a directory containing <code>index.html</code>.</p>
    <p>Heatmap points are available at <a href="/data"><code>/data</code></a>.</p>
  </body>
</html>
"#;

/// The map page polls `/data` itself, so its shell must never be cached.
fn cache_policy(content_type: &str) -> HeaderValue {
    if content_type.starts_with("text/html") {
        HeaderValue::from_static("no-store")
    } else {
        HeaderValue::from_static("public, max-age=3600")
    }
}

async fn set_cache_control(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    if !response.headers().contains_key(CACHE_CONTROL) {
        let policy = cache_policy(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default(),
        );
        response.headers_mut().insert(CACHE_CONTROL, policy);
    }
    response
}

fn front_end(root: PathBuf) -> Result<Router> {
    if !root.is_dir() {
        anyhow::bail!("static_root not found at {}", root.display());
    }
    let index = ServeFile::new(root.join("index.html"));
    let files = ServeDir::new(root)
        .append_index_html_on_directories(true)
        .not_found_service(index);
    Ok(Router::new()
        .fallback_service(files)
        .layer(from_fn(set_cache_control)))
}

async fn placeholder() -> Html<&'static str> {
    Html(PLACEHOLDER_INDEX)
}

/// Everything the API routes do not claim: the configured front end, or a
/// placeholder page pointing at `/data` when none is installed.
pub fn service(static_root: Option<PathBuf>) -> Result<Router> {
    match static_root {
        Some(root) => front_end(root),
        None => Ok(Router::new().fallback(placeholder)),
    }
}

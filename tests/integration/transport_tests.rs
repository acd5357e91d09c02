//! HTTP and browser transports against mock servers

use scrapyard::config::{BrowserConfig, HttpConfig};
use scrapyard::{BrowserTransport, FetchError, HttpTransport, Request, Transport};
use serde_json::json;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http() -> HttpTransport {
    HttpTransport::new(&HttpConfig::default()).unwrap()
}

#[tokio::test]
async fn test_http_get_returns_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header("user-agent", HttpConfig::default().user_agent.as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><title>Hi</title></html>")
                .insert_header("X-Page", "1"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/page", server.uri());
    let response = http().fetch(&Request::new(url.as_str())).await.unwrap();

    assert_eq!(response.status(), Some(200));
    assert_eq!(response.url().as_str(), url);
    assert_eq!(response.header("x-page"), Some("1"));
    assert_eq!(response.document().title().as_deref(), Some("Hi"));
}

#[tokio::test]
async fn test_http_reports_final_url_after_redirect() {
    let server = MockServer::start().await;
    let location = format!("{}/new", server.uri());
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", location.as_str()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
        .mount(&server)
        .await;

    let response = http()
        .fetch(&Request::new(format!("{}/old", server.uri())))
        .await
        .unwrap();

    assert_eq!(response.url().path(), "/new");
    assert_eq!(response.body(), "moved");
}

#[tokio::test]
async fn test_http_redirect_loop_is_a_transport_error() {
    let server = MockServer::start().await;
    let location = format!("{}/loop", server.uri());
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", location.as_str()))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&HttpConfig {
        max_redirects: 2,
        ..HttpConfig::default()
    })
    .unwrap();
    let err = transport
        .fetch(&Request::new(format!("{}/loop", server.uri())))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Transport { .. }), "{:?}", err);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_http_not_found_and_gone() {
    let server = MockServer::start().await;
    Mock::given(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    for page in ["/missing", "/gone"] {
        let url = format!("{}{}", server.uri(), page);
        let err = http().fetch(&Request::new(url.as_str())).await.unwrap_err();
        assert_eq!(err, FetchError::NotFound { url });
        assert!(!err.is_retryable());
    }
}

#[tokio::test]
async fn test_http_server_error_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(path("/boom"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let url = format!("{}/boom", server.uri());
    let err = http().fetch(&Request::new(url.as_str())).await.unwrap_err();

    assert_eq!(err, FetchError::Status { url, status: 503 });
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_http_post_sends_form_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("q=rust&page=2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("results"))
        .expect(1)
        .mount(&server)
        .await;

    let request = Request::new(format!("{}/search", server.uri()))
        .post()
        .with_body([("q", "rust"), ("page", "2")]);
    let response = http().fetch(&request).await.unwrap();

    assert_eq!(response.body(), "results");
}

#[tokio::test]
async fn test_http_timeout() {
    let server = MockServer::start().await;
    Mock::given(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(3)))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&HttpConfig {
        timeout_secs: 1,
        ..HttpConfig::default()
    })
    .unwrap();
    let url = format!("{}/slow", server.uri());
    let err = transport.fetch(&Request::new(url.as_str())).await.unwrap_err();

    assert_eq!(err, FetchError::Timeout { url });
}

#[tokio::test]
async fn test_http_connection_refused() {
    let err = http()
        .fetch(&Request::new("http://127.0.0.1:1/"))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Connect { .. }), "{:?}", err);
    assert!(err.is_retryable());
}

fn browser(remote_url: &str) -> BrowserTransport {
    BrowserTransport::new(&BrowserConfig {
        remote_url: Some(remote_url.to_string()),
        ..BrowserConfig::default()
    })
    .unwrap()
}

/// A DevTools endpoint advertising a websocket nothing listens on
async fn devtools_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Browser": "Chrome/120.0.0.0",
            "webSocketDebuggerUrl": "ws://127.0.0.1:1/devtools/browser/abc"
        })))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_browser_resolves_debugger_url() {
    let server = devtools_server().await;
    let transport = browser(&server.uri());

    let ws_url = transport
        .debugger_url(&format!("{}/", server.uri()))
        .await
        .unwrap();

    assert_eq!(ws_url, "ws://127.0.0.1:1/devtools/browser/abc");
}

#[tokio::test]
async fn test_browser_version_without_websocket_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Browser": "Chrome" })))
        .mount(&server)
        .await;

    let err = browser(&server.uri())
        .debugger_url(&server.uri())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Browser(_)), "{:?}", err);
}

#[tokio::test]
async fn test_browser_unreachable_is_retryable() {
    let server = devtools_server().await;
    let transport = browser(&server.uri());

    let err = transport
        .fetch(&Request::new("https://site.example/"))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Browser(_)), "{:?}", err);
    assert!(err.is_retryable());
    assert!(!transport.is_running().await);
    transport.close().await.unwrap();
}

#[tokio::test]
#[ignore = "needs a local Chrome"]
async fn test_browser_renders_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                "<html><head><title>Rendered</title></head></html>",
                "text/html",
            ),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_string("q=rust"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                "<html><head><title>Results</title></head></html>",
                "text/html",
            ),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport = BrowserTransport::new(&BrowserConfig::default()).unwrap();

    let page = transport
        .fetch(&Request::new(format!("{}/page", server.uri())))
        .await
        .unwrap();
    assert_eq!(page.status(), None);
    assert_eq!(page.document().title().as_deref(), Some("Rendered"));
    assert!(transport.is_running().await);

    let search = Request::new(format!("{}/search", server.uri()))
        .post()
        .with_body([("q", "rust")]);
    let results = transport.fetch(&search).await.unwrap();
    assert_eq!(results.url().path(), "/search");
    assert_eq!(results.document().title().as_deref(), Some("Results"));

    transport.close().await.unwrap();
    assert!(!transport.is_running().await);
}

//! Full runs built from TOML configuration against a mock site

use scrapyard::config::parse_config;
use scrapyard::crawler::{engine_from_config, run};
use scrapyard::TaskState;
use serde_json::{json, Value};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE_ONE: &str = r#"<html><body>
<div class="quote">
  <span class="text">Be yourself</span><small class="author">Oscar Wilde</small>
</div>
<div class="quote">
  <span class="text">So many books</span><small class="author">Frank Zappa</small>
</div>
<ul class="pager"><li class="next"><a href="/page/2/">Next</a></li></ul>
</body></html>"#;

const PAGE_TWO: &str = r#"<html><body>
<div class="quote">
  <span class="text">Be yourself</span><small class="author">Oscar Wilde</small>
</div>
<div class="quote"><span class="text">A room without books</span></div>
<ul class="pager"><li class="previous"><a href="/page/1/">Previous</a></li></ul>
</body></html>"#;

async fn quote_site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE_ONE))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page/2/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE_TWO))
        .expect(1)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_run_writes_json_and_csv() {
    let server = quote_site().await;
    let dir = tempdir().unwrap();
    let json_path = dir.path().join("quotes.json");
    let csv_path = dir.path().join("quotes.csv");

    let config = parse_config(&format!(
        r#"
[[scrap]]
name = "quotes"
seeds = ["{uri}/page/1/"]
item-selector = ".quote"
follow-selector = "li.next a"
unique-by = ["text"]

[[scrap.field]]
name = "text"
selector = ".text"

[[scrap.field]]
name = "author"
selector = ".author"

[[scrap.output]]
kind = "json"
path = "{json}"

[[scrap.output]]
kind = "csv"
path = "{csv}"
delimiter = ";"
"#,
        uri = server.uri(),
        json = json_path.display(),
        csv = csv_path.display()
    ))
    .unwrap();

    let engine = run(&config).await.unwrap();

    let task = engine.task("quotes").unwrap();
    assert_eq!(task.state(), TaskState::Done);
    assert_eq!(task.stats().fetched, 2);
    assert_eq!(task.stats().records_written, 4);
    assert_eq!(engine.failed_requests().count(), 0);

    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(
        written,
        json!([
            { "text": "Be yourself", "author": "Oscar Wilde" },
            { "text": "So many books", "author": "Frank Zappa" },
            { "text": "A room without books", "author": null },
        ])
    );

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "text;author",
            "Be yourself;Oscar Wilde",
            "So many books;Frank Zappa",
            "A room without books;",
        ]
    );
}

#[tokio::test]
async fn test_flaky_and_missing_pages() {
    let server = MockServer::start().await;
    Mock::given(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(path("/flaky"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><title>Finally</title></html>"),
        )
        .mount(&server)
        .await;
    Mock::given(path("/down"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let json_path = dir.path().join("titles.json");
    let config = parse_config(&format!(
        r#"
[engine]
retry-limit = 5

[[scrap]]
name = "titles"
seeds = ["{uri}/flaky", "{uri}/down", "{uri}/missing"]
retry-limit = 3
log-requests = false

[[scrap.field]]
name = "title"
selector = "title"

[[scrap.output]]
kind = "json"
path = "{json}"
"#,
        uri = server.uri(),
        json = json_path.display()
    ))
    .unwrap();

    let mut engine = engine_from_config(&config).unwrap();
    assert_eq!(engine.task("titles").unwrap().retry_limit(), 3);
    assert!(engine.task("titles").unwrap().middlewares().is_empty());

    engine.start().await.unwrap();

    let task = engine.task("titles").unwrap();
    assert_eq!(task.stats().fetched, 1);
    assert_eq!(task.stats().records_written, 1);
    assert_eq!(task.stats().dropped, 2);
    assert_eq!(task.stats().fetch_failures, 6);

    let failed: Vec<String> = engine
        .failed_requests()
        .map(|(_, f)| format!("{}:{}", f.request.url(), f.request.fail_count()))
        .collect();
    assert_eq!(
        failed,
        vec![
            format!("{}/missing:1", server.uri()),
            format!("{}/down:3", server.uri()),
        ]
    );

    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(written, json!([{ "title": "Finally" }]));
}

#[tokio::test]
async fn test_empty_config_runs_nothing() {
    let config = parse_config("").unwrap();
    let engine = run(&config).await.unwrap();
    assert!(engine.tasks().is_empty());
}

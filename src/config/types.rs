use serde::Deserialize;

/// Main configuration structure for Scrapyard
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub browser: Option<BrowserConfig>,

    /// Scrap definitions, one task each, run in file order
    #[serde(default, rename = "scrap")]
    pub scraps: Vec<ScrapConfig>,
}

/// Which transport fetches the pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Http,
    Browser,
}

/// Engine-wide behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EngineConfig {
    #[serde(default)]
    pub transport: TransportKind,

    /// Fetch attempts per request before it is dropped
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            retry_limit: default_retry_limit(),
        }
    }
}

/// Plain HTTP transport settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_redirects: default_max_redirects(),
        }
    }
}

/// Headless Chrome transport settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BrowserConfig {
    /// DevTools URL of an already running Chrome (`http://host:9222` or
    /// `ws://...`); a local Chrome is launched when unset
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Chrome binary to launch; detected when unset
    #[serde(default)]
    pub executable: Option<String>,

    /// Pause after each navigation so scripts can render the page
    #[serde(default)]
    pub wait_after_request_ms: u64,

    #[serde(default = "default_true")]
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            remote_url: None,
            executable: None,
            wait_after_request_ms: 0,
            headless: true,
        }
    }
}

/// One scrap: seeds, extraction rules, middlewares and outputs
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScrapConfig {
    pub name: String,

    pub seeds: Vec<String>,

    /// Each match becomes one record; the whole page when unset
    #[serde(default)]
    pub item_selector: Option<String>,

    /// Links matched by this selector are queued as follow-up requests
    #[serde(default)]
    pub follow_selector: Option<String>,

    /// Overrides `engine.retry-limit`
    #[serde(default)]
    pub retry_limit: Option<u32>,

    /// Fixed pause before every request
    #[serde(default)]
    pub delay_ms: u64,

    /// Minimum time between two requests to the same host
    #[serde(default)]
    pub min_domain_interval_ms: u64,

    #[serde(default = "default_true")]
    pub log_requests: bool,

    /// Skip records whose values for these fields were already written
    #[serde(default)]
    pub unique_by: Vec<String>,

    #[serde(default, rename = "field")]
    pub fields: Vec<FieldConfig>,

    #[serde(default, rename = "output")]
    pub outputs: Vec<OutputConfig>,
}

/// A named value extracted from each item
#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    pub name: String,

    pub selector: String,

    /// Read this attribute instead of the element text
    #[serde(default)]
    pub attr: Option<String>,
}

/// Where records of a scrap go
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OutputConfig {
    Json {
        path: String,
    },
    Csv {
        path: String,
        #[serde(default = "default_delimiter")]
        delimiter: String,
    },
    Sqlite {
        path: String,
        table: String,
    },
    Log,
}

fn default_retry_limit() -> u32 {
    3
}

fn default_user_agent() -> String {
    format!("scrapyard/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_redirects() -> usize {
    10
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_true() -> bool {
    true
}

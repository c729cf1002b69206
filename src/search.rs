use crate::config::Config;
use crate::error::AgentError;
use crate::utils::{clip, ensure_success};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Duration;
use tracing::debug;

const SERVICE: &str = "search";
pub const MAX_RESULTS: usize = 5;
pub const DEFAULT_TIME_RANGE: &str = "qdr:w";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum SearchType {
    #[default]
    Search,
    News,
}

// Anything the provider does not know as "news" is a plain web search.
impl From<String> for SearchType {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("news") {
            SearchType::News
        } else {
            SearchType::Search
        }
    }
}

impl SearchType {
    fn path(self) -> &'static str {
        match self {
            SearchType::Search => "search",
            SearchType::News => "news",
        }
    }

    fn results_key(self) -> &'static str {
        match self {
            SearchType::Search => "organic",
            SearchType::News => "news",
        }
    }
}

/// Arguments of the `search` tool as the model sends them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SearchArgs")]
pub struct SearchQuery {
    pub query: String,
    pub search_type: SearchType,
    pub time_range: String,
}

// Wire shape of the tool arguments. Every field is optional and `null` counts
// as absent, so a stray null never costs the query. `tbs` wins over
// `time_range` when both are sent.
#[derive(Deserialize, Default)]
#[serde(default)]
struct SearchArgs {
    query: Option<String>,
    search_type: Option<String>,
    tbs: Option<String>,
    time_range: Option<String>,
}

impl From<SearchArgs> for SearchQuery {
    fn from(args: SearchArgs) -> Self {
        Self {
            query: args.query.unwrap_or_default(),
            search_type: args.search_type.map(SearchType::from).unwrap_or_default(),
            time_range: args
                .tbs
                .or(args.time_range)
                .unwrap_or_else(default_time_range),
        }
    }
}

fn default_time_range() -> String {
    DEFAULT_TIME_RANGE.to_string()
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            search_type: SearchType::default(),
            time_range: default_time_range(),
        }
    }
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn news(mut self) -> Self {
        self.search_type = SearchType::News;
        self
    }

    pub fn time_range(mut self, time_range: impl Into<String>) -> Self {
        self.time_range = time_range.into();
        self
    }
}

/// Client for a Serper-style search API.
#[derive(Clone)]
pub struct SearchClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl SearchClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            base_url: config.search_base_url.clone(),
            api_key: config.search_api_key.clone(),
            http,
        })
    }

    /// Runs one search and returns the compressed digest of its top results.
    pub async fn search(&self, query: &SearchQuery) -> Result<String, AgentError> {
        let url = format!("{}/{}", self.base_url, query.search_type.path());
        let mut payload = serde_json::json!({ "q": query.query });
        if !query.time_range.is_empty() {
            payload["tbs"] = Value::String(query.time_range.clone());
        }

        debug!(%url, query = %query.query, tbs = %query.time_range, "searching");
        let resp = self
            .http
            .post(url)
            .header("X-API-KEY", &self.api_key)
            .json(&payload)
            .send()
            .await?;
        let resp = ensure_success(SERVICE, resp).await?;

        let text = resp.text().await?;
        let results: Value = serde_json::from_str(&text)
            .map_err(|e| AgentError::Decode(format!("search body: {}", e)))?;

        let digest = compress_results(query.search_type, &results);
        debug!(digest = %clip(&digest, 300), "search digest");
        Ok(digest)
    }
}

/// Formats at most [`MAX_RESULTS`] items of the relevant result array into a
/// plain-text digest, one block per item separated by a blank line.
pub fn compress_results(search_type: SearchType, results: &Value) -> String {
    let Some(items) = results.get(search_type.results_key()).and_then(Value::as_array) else {
        return String::new();
    };

    items
        .iter()
        .take(MAX_RESULTS)
        .map(format_item)
        .filter(|block| !block.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_item(item: &Value) -> String {
    const FIELDS: [(&str, &str); 5] = [
        ("Title", "title"),
        ("Source", "source"),
        ("Date", "date"),
        ("Link", "link"),
        ("Snippet", "snippet"),
    ];

    FIELDS
        .iter()
        .filter_map(|(label, key)| {
            item.get(*key)
                .and_then(Value::as_str)
                .map(|value| format!("{}: {}", label, value))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

use serde_json::Value;

/// Name the model uses to request a web search.
pub const SEARCH_TOOL: &str = "search";

#[derive(Clone)]
pub struct ToolRegistry {
    schemas: Value,
}

impl ToolRegistry {
    pub fn new() -> Self {
        // Single source of truth for "tools" schema the LLM sees
        let schemas = serde_json::json!([
            {
                "type": "function",
                "function": {
                    "name": SEARCH_TOOL,
                    "description":
                        "Search the web for information using Google Search. \
                         Use this tool when you need current events, news, or \
                         information not in your training data. Set \
                         search_type to 'news' for news articles and tbs to \
                         restrict the time range.",
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "query": {
                                "type": "string",
                                "description": "The search query"
                            },
                            "search_type": {
                                "type": "string",
                                "enum": ["search", "news"],
                                "description":
                                    "Type of search: 'search' (default) or 'news'",
                                "default": "search"
                            },
                            "tbs": {
                                "type": "string",
                                "description":
                                    "Time range: 'qdr:h' (past hour), 'qdr:d' \
                                     (past 24h), 'qdr:w' (past week), 'qdr:m' \
                                     (past month), 'qdr:y' (past year)",
                                "default": "qdr:w"
                            }
                        },
                        "required": ["query"]
                    }
                }
            }
        ]);
        Self { schemas }
    }

    pub fn schemas(&self) -> &Value {
        &self.schemas
    }

    pub fn supports(&self, name: &str) -> bool {
        name == SEARCH_TOOL
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

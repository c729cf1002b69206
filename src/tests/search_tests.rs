use crate::config::Config;
use crate::error::AgentError;
use crate::search::{SearchClient, SearchQuery, SearchType, compress_results};
use crate::utils::decode_or_default;
use httpmock::prelude::*;
use serde_json::{Value, json};

#[cfg(test)]
mod tests {
    use super::*;

    fn organic(n: usize) -> Value {
        let items: Vec<Value> = (1..=n)
            .map(|i| {
                json!({
                    "title": format!("Result {}", i),
                    "link": format!("https://example.com/{}", i),
                    "snippet": format!("Snippet {}", i),
                    "position": i
                })
            })
            .collect();
        json!({ "organic": items })
    }

    fn test_client(server: &MockServer) -> SearchClient {
        let config = Config::from_lookup(|key| match key {
            "SERPER_API_KEY" => Some("serper-key".to_string()),
            "SERPER_BASE_URL" => Some(server.base_url()),
            _ => None,
        })
        .unwrap();
        SearchClient::new(&config).unwrap()
    }

    #[test]
    fn test_empty_results_give_empty_digest() {
        assert_eq!(compress_results(SearchType::Search, &json!({ "organic": [] })), "");
        assert_eq!(compress_results(SearchType::News, &json!({ "organic": [] })), "");
        assert_eq!(compress_results(SearchType::Search, &json!({})), "");
    }

    #[test]
    fn test_only_first_five_results_kept_in_order() {
        let digest = compress_results(SearchType::Search, &organic(7));

        let blocks: Vec<&str> = digest.split("\n\n").collect();
        assert_eq!(blocks.len(), 5);
        for (i, block) in blocks.iter().enumerate() {
            assert!(block.starts_with(&format!("Title: Result {}\n", i + 1)));
        }
        assert!(!digest.contains("Result 6"));
        assert!(!digest.contains("Result 7"));
    }

    #[test]
    fn test_result_block_format() {
        let digest = compress_results(SearchType::Search, &organic(1));
        assert_eq!(
            digest,
            "Title: Result 1\nLink: https://example.com/1\nSnippet: Snippet 1"
        );
    }

    #[test]
    fn test_news_block_omits_missing_fields() {
        let results = json!({
            "news": [
                {
                    "title": "Storm hits coast",
                    "source": "Daily",
                    "date": "2 hours ago",
                    "link": "https://daily.example/storm",
                    "snippet": "Winds of 100km/h"
                },
                { "title": "No link here", "source": "Weekly" }
            ],
            "organic": [{ "title": "ignored" }]
        });

        let digest = compress_results(SearchType::News, &results);
        assert_eq!(
            digest,
            "Title: Storm hits coast\nSource: Daily\nDate: 2 hours ago\nLink: https://daily.example/storm\nSnippet: Winds of 100km/h\n\nTitle: No link here\nSource: Weekly"
        );
    }

    #[test]
    fn test_query_defaults_and_aliases() {
        let query: SearchQuery = decode_or_default(r#"{"query": "rust"}"#, "tool arguments");
        assert_eq!(query, SearchQuery::new("rust"));
        assert_eq!(query.time_range, "qdr:w");

        let query: SearchQuery = decode_or_default(
            r#"{"query": "rust", "search_type": "images", "time_range": "qdr:y"}"#,
            "tool arguments",
        );
        assert_eq!(query.search_type, SearchType::Search);
        assert_eq!(query.time_range, "qdr:y");

        let query: SearchQuery = decode_or_default("{", "tool arguments");
        assert_eq!(query, SearchQuery::default());
    }

    #[test]
    fn test_query_survives_null_and_duplicate_fields() {
        let query: SearchQuery = decode_or_default(r#"{"query": "x", "search_type": null}"#, "tool arguments");
        assert_eq!(query, SearchQuery::new("x"));

        let query: SearchQuery = decode_or_default(r#"{"query": "x", "tbs": null}"#, "tool arguments");
        assert_eq!(query, SearchQuery::new("x"));

        let query: SearchQuery = decode_or_default(
            r#"{"query": "x", "tbs": "qdr:d", "time_range": "qdr:w"}"#,
            "tool arguments",
        );
        assert_eq!(query, SearchQuery::new("x").time_range("qdr:d"));

        let query: SearchQuery = decode_or_default(r#"{"query": null, "search_type": "NEWS"}"#, "tool arguments");
        assert_eq!(query, SearchQuery::default().news());
    }

    #[tokio::test]
    async fn test_search_posts_to_search_endpoint() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/search")
                    .header("x-api-key", "serper-key")
                    .json_body(json!({ "q": "is the sky green", "tbs": "qdr:w" }));
                then.status(200).json_body(organic(3));
            })
            .await;

        let digest = test_client(&server)
            .search(&SearchQuery::new("is the sky green"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(digest.split("\n\n").count(), 3);
    }

    #[tokio::test]
    async fn test_news_search_uses_news_endpoint() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/news")
                    .json_body(json!({ "q": "election", "tbs": "qdr:d" }));
                then.status(200).json_body(json!({
                    "news": [{ "title": "Vote counted", "source": "Wire" }]
                }));
            })
            .await;

        let digest = test_client(&server)
            .search(&SearchQuery::new("election").news().time_range("qdr:d"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(digest, "Title: Vote counted\nSource: Wire");
    }

    #[tokio::test]
    async fn test_empty_time_range_is_not_sent() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/search").json_body(json!({ "q": "rust" }));
                then.status(200).json_body(json!({ "organic": [] }));
            })
            .await;

        let digest = test_client(&server)
            .search(&SearchQuery::new("rust").time_range(""))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(digest, "");
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/search");
                then.status(403).body("Unauthorized.");
            })
            .await;

        let err = test_client(&server)
            .search(&SearchQuery::new("rust"))
            .await
            .unwrap_err();

        match err {
            AgentError::Upstream {
                service,
                status,
                body,
            } => {
                assert_eq!(service, "search");
                assert_eq!(status, 403);
                assert_eq!(body, "Unauthorized.");
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }
}

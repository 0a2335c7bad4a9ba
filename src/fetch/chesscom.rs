//! chess.com Archive Client
//!
//! HTTP month source for the public game archive at
//! `{base_url}/pub/player/{nick}/games/{YYYY}/{MM}`.

use super::*;
use crate::games::normalize_nick;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// chess.com public archive client
pub struct ChessComClient {
    client: Client,
    config: FetchConfig,
}

/// Configuration for the archive client
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Base URL of the archive API (e.g., "https://api.chess.com")
    pub base_url: String,
    /// User agent sent with every request
    pub user_agent: String,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Maximum attempts per month
    pub max_retries: u32,
    /// Backoff unit in milliseconds; attempt `n` waits `n² × backoff_base_ms`
    pub backoff_base_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.chess.com".to_string(),
            user_agent: format!("chessmirror/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_ms: 10_000,
            max_retries: 3,
            backoff_base_ms: 1_000,
        }
    }
}

impl ChessComClient {
    /// Create a new archive client
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Archive URL of one month
    fn month_url(&self, nick: &str, year: i32, month: u32) -> String {
        format!(
            "{}/pub/player/{}/games/{:04}/{:02}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(&normalize_nick(nick)),
            year,
            month
        )
    }

    /// Wait before attempt `attempt` (1-based retries)
    ///
    /// A server-supplied `Retry-After` replaces the backoff but never exceeds
    /// the request timeout.
    fn retry_delay(&self, attempt: u32, retry_after_secs: Option<u64>) -> Duration {
        match retry_after_secs {
            Some(secs) => Duration::from_secs(secs)
                .min(Duration::from_millis(self.config.request_timeout_ms)),
            // Backoff: 1, 4, 9... units
            None => Duration::from_millis(self.config.backoff_base_ms * (attempt as u64).pow(2)),
        }
    }

    /// GET a month payload with retry logic
    ///
    /// `Ok(None)` means the archive has no such month.
    async fn get_with_retry(&self, url: &str) -> Result<Option<Value>, FetchError> {
        let mut last_error = FetchError::Unavailable;
        let mut retry_after = None;

        for attempt in 0..self.config.max_retries.max(1) {
            if attempt > 0 {
                tokio::time::sleep(self.retry_delay(attempt, retry_after.take())).await;
            }

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .json::<Value>()
                            .await
                            .map(Some)
                            .map_err(|e| FetchError::ParseError(e.to_string()));
                    } else if status == StatusCode::NOT_FOUND {
                        return Ok(None);
                    } else if status == StatusCode::TOO_MANY_REQUESTS {
                        retry_after = response
                            .headers()
                            .get("Retry-After")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.trim().parse::<u64>().ok());
                        last_error = FetchError::RateLimited;
                    } else if status.is_server_error() {
                        last_error = FetchError::ApiError {
                            status: status.as_u16(),
                        };
                    } else {
                        return Err(FetchError::ApiError {
                            status: status.as_u16(),
                        });
                    }
                    tracing::debug!(url, attempt, error = %last_error, "Archive request failed");
                }
                Err(e) => {
                    last_error = if e.is_timeout() {
                        FetchError::Timeout
                    } else if e.is_connect() {
                        FetchError::Unavailable
                    } else {
                        FetchError::Request(e)
                    };
                    tracing::debug!(url, attempt, error = %last_error, "Archive request failed");
                }
            }
        }

        Err(last_error)
    }
}

#[async_trait]
impl MonthSource for ChessComClient {
    fn name(&self) -> &str {
        "chess.com"
    }

    async fn fetch_month(&self, nick: &str, year: i32, month: u32) -> MonthBatch {
        let url = self.month_url(nick, year, month);

        match self.get_with_retry(&url).await {
            Ok(Some(payload)) => MonthBatch::from_payload(year, month, &payload),
            Ok(None) => {
                tracing::debug!(nick, year, month, "No archive for month");
                MonthBatch::new(year, month, Vec::new())
            }
            Err(e) => {
                tracing::warn!(nick, year, month, error = %e, "Can not fetch games for month");
                MonthBatch::empty(
                    year,
                    month,
                    FetchStatus::Failed {
                        error: e.to_string(),
                    },
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const MONTH_PATH: &str = "/pub/player/alice/games/2024/01";

    fn client_for(base_url: String, max_retries: u32) -> ChessComClient {
        ChessComClient::new(FetchConfig {
            base_url,
            request_timeout_ms: 2_000,
            max_retries,
            backoff_base_ms: 1,
            ..Default::default()
        })
        .unwrap()
    }

    fn games_body() -> String {
        serde_json::json!({
            "games": [
                { "url": "https://www.chess.com/game/live/1", "end_time": 1704103530 }
            ]
        })
        .to_string()
    }

    #[test]
    fn test_default_config() {
        let config = FetchConfig::default();
        assert_eq!(config.base_url, "https://api.chess.com");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.request_timeout_ms, 10_000);
        assert_eq!(config.backoff_base_ms, 1_000);
    }

    #[test]
    fn test_month_url_is_zero_padded() {
        let client = ChessComClient::new(FetchConfig {
            base_url: "https://api.chess.com/".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            client.month_url("Hikaru", 2024, 3),
            "https://api.chess.com/pub/player/hikaru/games/2024/03"
        );
        assert_eq!(
            client.month_url("a b", 2023, 11),
            "https://api.chess.com/pub/player/a%20b/games/2023/11"
        );
    }

    #[test]
    fn test_retry_delay() {
        let client = ChessComClient::new(FetchConfig {
            request_timeout_ms: 5_000,
            backoff_base_ms: 100,
            ..Default::default()
        })
        .unwrap();

        assert_eq!(client.retry_delay(1, None), Duration::from_millis(100));
        assert_eq!(client.retry_delay(3, None), Duration::from_millis(900));
        assert_eq!(client.retry_delay(1, Some(2)), Duration::from_secs(2));
        assert_eq!(client.retry_delay(1, Some(3600)), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_unreachable_archive_fails_open() {
        let client = ChessComClient::new(FetchConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_ms: 500,
            max_retries: 1,
            ..Default::default()
        })
        .unwrap();

        let batch = client.fetch_month("alice", 2024, 1).await;
        assert!(batch.games.is_empty());
        assert!(matches!(batch.status, FetchStatus::Failed { .. }));
    }

    #[tokio::test]
    async fn test_missing_month_is_empty() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", MONTH_PATH)
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let batch = client_for(server.url(), 3).fetch_month("Alice", 2024, 1).await;

        assert!(batch.is_ok());
        assert!(batch.games.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let mut server = Server::new_async().await;
        let failing = server
            .mock("GET", MONTH_PATH)
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", MONTH_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(games_body())
            .expect(1)
            .create_async()
            .await;

        let batch = client_for(server.url(), 3).fetch_month("alice", 2024, 1).await;

        assert!(batch.is_ok());
        assert_eq!(batch.games.len(), 1);
        failing.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", MONTH_PATH)
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let batch = client_for(server.url(), 2).fetch_month("alice", 2024, 1).await;

        assert_eq!(
            batch.status,
            FetchStatus::Failed {
                error: "API error 503".to_string()
            }
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_fails_without_retry() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", MONTH_PATH)
            .with_status(400)
            .expect(1)
            .create_async()
            .await;

        let batch = client_for(server.url(), 3).fetch_month("alice", 2024, 1).await;

        assert!(matches!(batch.status, FetchStatus::Failed { .. }));
        assert!(batch.games.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_wait_is_capped() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("GET", MONTH_PATH)
            .with_status(429)
            .with_header("Retry-After", "3600")
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", MONTH_PATH)
            .with_status(200)
            .with_body(games_body())
            .expect(1)
            .create_async()
            .await;

        let client = ChessComClient::new(FetchConfig {
            base_url: server.url(),
            request_timeout_ms: 200,
            max_retries: 2,
            backoff_base_ms: 1,
            ..Default::default()
        })
        .unwrap();

        let batch = tokio::time::timeout(Duration::from_secs(5), client.fetch_month("alice", 2024, 1))
            .await
            .unwrap();

        assert_eq!(batch.games.len(), 1);
        limited.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_on_last_attempt_does_not_wait() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", MONTH_PATH)
            .with_status(429)
            .with_header("Retry-After", "3600")
            .expect(1)
            .create_async()
            .await;

        let client = ChessComClient::new(FetchConfig {
            base_url: server.url(),
            request_timeout_ms: 60_000,
            max_retries: 1,
            ..Default::default()
        })
        .unwrap();

        let batch = tokio::time::timeout(Duration::from_secs(5), client.fetch_month("alice", 2024, 1))
            .await
            .unwrap();

        assert_eq!(
            batch.status,
            FetchStatus::Failed {
                error: "Rate limited".to_string()
            }
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_payload_without_games_array_is_malformed() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", MONTH_PATH)
            .with_status(200)
            .with_body(r#"{"games": {}}"#)
            .create_async()
            .await;

        let batch = client_for(server.url(), 3).fetch_month("alice", 2024, 1).await;
        assert_eq!(batch.status, FetchStatus::MalformedPayload);
    }

    #[tokio::test]
    async fn test_non_json_body_fails() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", MONTH_PATH)
            .match_header("user-agent", Matcher::Regex("^chessmirror/".to_string()))
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .expect(1)
            .create_async()
            .await;

        let batch = client_for(server.url(), 3).fetch_month("alice", 2024, 1).await;

        assert!(matches!(batch.status, FetchStatus::Failed { ref error } if error.starts_with("Parse error")));
        mock.assert_async().await;
    }
}

use std::thread;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::config::HttpConfig;

/// Upper bound of the random delay added to every backoff
const JITTER_MAX_MS: u64 = 250;

/// Anything that can hand out page markup for a URL.
///
/// `None` means the page could not be obtained after all retries.
pub trait PageSource: Sync {
    fn fetch_html(&self, url: &str) -> Option<String>;
}

/// What to do after one attempt
#[derive(Debug, PartialEq, Eq)]
pub enum Attempt {
    Page(String),
    Retry(Duration),
    GiveUp,
}

/// Decide the outcome of an HTTP response
///
/// 429 backs off exponentially, 5xx linearly, other 4xx are final.
pub fn decide(status: u16, body: String, attempt: u32, delay: Duration) -> Attempt {
    match status {
        200 if !body.is_empty() => Attempt::Page(body),
        429 => Attempt::Retry(delay * 2u32.saturating_pow(attempt)),
        400..=499 => Attempt::GiveUp,
        500.. => Attempt::Retry(delay * attempt),
        _ => Attempt::Retry(Duration::ZERO),
    }
}

/// Blocking HTTP fetcher with bounded retries
pub struct HttpFetcher {
    agent: ureq::Agent,
    user_agent: String,
    headers: Vec<(String, String)>,
    retries: u32,
    delay: Duration,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            user_agent: config.user_agent.clone(),
            headers: config
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            retries: config.retries.max(1),
            delay: Duration::from_millis(config.rate_limit_delay_ms),
        }
    }

    fn attempt(&self, url: &str, attempt: u32) -> Attempt {
        let mut request = self.agent.get(url);
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }
        request = request.header("User-Agent", &self.user_agent);

        let response = match request.call() {
            Ok(response) => response,
            Err(ureq::Error::BadUri(e)) => {
                warn!(url, error = %e, "Invalid URL");
                return Attempt::GiveUp;
            }
            Err(ureq::Error::Timeout(_)) => {
                warn!(url, attempt, "Timeout");
                return Attempt::Retry(self.delay * attempt);
            }
            Err(e) => {
                warn!(url, attempt, error = %e, "Request error");
                return Attempt::Retry(self.delay * attempt);
            }
        };

        let status = response.status().as_u16();
        let body = match response.into_body().read_to_string() {
            Ok(body) => body,
            Err(e) => {
                warn!(url, attempt, error = %e, "Failed to read body");
                return Attempt::Retry(self.delay * attempt);
            }
        };

        let outcome = decide(status, body, attempt, self.delay);
        match &outcome {
            Attempt::Retry(wait) if status == 429 => {
                warn!(url, wait_ms = wait.as_millis() as u64, "Rate limited");
            }
            Attempt::Retry(_) if status >= 500 => warn!(url, status, attempt, "Server error"),
            Attempt::GiveUp => warn!(url, status, "Client error"),
            _ => {}
        }
        outcome
    }
}

impl PageSource for HttpFetcher {
    fn fetch_html(&self, url: &str) -> Option<String> {
        for attempt in 1..=self.retries {
            match self.attempt(url, attempt) {
                Attempt::Page(html) => {
                    debug!(url, attempt, bytes = html.len(), "Fetched page");
                    return Some(html);
                }
                Attempt::GiveUp => break,
                Attempt::Retry(wait) if attempt < self.retries => {
                    let jitter = rand::thread_rng().gen_range(0..=JITTER_MAX_MS);
                    thread::sleep(wait + Duration::from_millis(jitter));
                }
                Attempt::Retry(_) => {}
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(500);

    #[test]
    fn test_decide_success() {
        assert_eq!(
            decide(200, "<html></html>".into(), 1, DELAY),
            Attempt::Page("<html></html>".into())
        );
    }

    #[test]
    fn test_decide_empty_body_retries() {
        assert_eq!(decide(200, String::new(), 1, DELAY), Attempt::Retry(Duration::ZERO));
    }

    #[test]
    fn test_decide_rate_limit_backs_off_exponentially() {
        assert_eq!(decide(429, String::new(), 1, DELAY), Attempt::Retry(Duration::from_secs(1)));
        assert_eq!(decide(429, String::new(), 3, DELAY), Attempt::Retry(Duration::from_secs(4)));
    }

    #[test]
    fn test_decide_client_error_gives_up() {
        assert_eq!(decide(404, "not found".into(), 1, DELAY), Attempt::GiveUp);
        assert_eq!(decide(403, String::new(), 2, DELAY), Attempt::GiveUp);
    }

    #[test]
    fn test_decide_server_error_backs_off_linearly() {
        assert_eq!(
            decide(503, String::new(), 2, DELAY),
            Attempt::Retry(Duration::from_secs(1))
        );
    }
}

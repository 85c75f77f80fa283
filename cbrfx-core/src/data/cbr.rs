//! CBR daily archive client.
//!
//! Fetches one day's JSON payload from the cbr-xml-daily archive. Handles
//! "not found" days, retries with exponential backoff on rate-limit and
//! server errors, honors `Retry-After`, and classifies everything else as
//! fatal.

use super::clock::{Sleeper, ThreadSleeper};
use super::provider::{FetchError, RatePayload, RateSource};
use super::retry::RetryPolicy;
use super::transport::{HttpTransport, ReqwestTransport, TransportSettings};
use chrono::{Datelike, NaiveDate};

const NOT_FOUND: u16 = 404;

/// Archive client over a transport, a sleeper and a retry policy.
pub struct CbrClient<T = ReqwestTransport, S = ThreadSleeper> {
    transport: T,
    sleeper: S,
    policy: RetryPolicy,
    url_template: String,
}

impl CbrClient<ReqwestTransport, ThreadSleeper> {
    /// Production client: pooled reqwest transport and the wall clock.
    pub fn from_settings(settings: &TransportSettings, policy: RetryPolicy) -> Result<Self, FetchError> {
        let transport = ReqwestTransport::new(settings)?;
        Ok(Self::new(transport, ThreadSleeper, policy, settings.base_url.clone()))
    }
}

impl<T: HttpTransport, S: Sleeper> CbrClient<T, S> {
    pub fn new(transport: T, sleeper: S, policy: RetryPolicy, url_template: impl Into<String>) -> Self {
        Self {
            transport,
            sleeper,
            policy,
            url_template: url_template.into(),
        }
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Build the archive URL for a day.
    pub fn day_url(&self, day: NaiveDate) -> String {
        archive_url(&self.url_template, day)
    }

    /// Execute the GET for `day` with retry logic.
    fn fetch_with_retry(&self, day: NaiveDate) -> Result<Option<RatePayload>, FetchError> {
        let url = self.day_url(day);
        let max_attempts = self.policy.max_attempts();
        let mut retry_after: Option<String> = None;
        let mut last_reason = String::new();

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let retry = attempt - 1;
                let delay = self
                    .policy
                    .delay_for(retry, retry_after.as_deref(), chrono::Utc::now());
                tracing::warn!(%day, retry, ?delay, reason = %last_reason, "retrying archive request");
                self.sleeper.sleep(delay);
            }

            tracing::debug!(%url, attempt, "GET");
            match self.transport.get(&url) {
                Ok(resp) => {
                    if resp.status == NOT_FOUND {
                        return Ok(None);
                    }

                    if self.policy.is_retryable_status(resp.status) {
                        last_reason = format!("HTTP {}", resp.status);
                        retry_after = resp.retry_after;
                        continue;
                    }

                    if !resp.is_success() {
                        return Err(FetchError::Fatal {
                            status: resp.status,
                            url,
                        });
                    }

                    return RatePayload::from_json(&resp.body).map(Some);
                }
                Err(e) => {
                    last_reason = e.to_string();
                    retry_after = None;
                }
            }
        }

        Err(FetchError::Transient {
            attempts: max_attempts,
            reason: last_reason,
        })
    }
}

impl<T: HttpTransport, S: Sleeper> RateSource for CbrClient<T, S> {
    fn name(&self) -> &str {
        "cbr_daily_archive"
    }

    fn fetch(&self, day: NaiveDate) -> Result<Option<RatePayload>, FetchError> {
        self.fetch_with_retry(day)
    }
}

/// Fill `{y}`, `{m}`, `{d}` in a URL template (zero-padded to 4/2/2 digits).
pub fn archive_url(template: &str, day: NaiveDate) -> String {
    template
        .replace("{y}", &format!("{:04}", day.year()))
        .replace("{m}", &format!("{:02}", day.month()))
        .replace("{d}", &format!("{:02}", day.day()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::clock::RecordingSleeper;
    use crate::data::transport::{HttpResponse, TransportError};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::time::Duration;

    const USD_BODY: &str = r#"{"Valute": {"USD": {"Value": 61.9057, "Nominal": 1}}}"#;

    /// Transport that replays a fixed script of outcomes.
    struct ScriptedTransport {
        script: RefCell<VecDeque<Result<HttpResponse, TransportError>>>,
        urls: RefCell<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<HttpResponse, TransportError>>) -> Self {
            Self {
                script: RefCell::new(script.into()),
                urls: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.urls.borrow().len()
        }
    }

    impl HttpTransport for ScriptedTransport {
        fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
            self.urls.borrow_mut().push(url.to_string());
            self.script
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Other("script exhausted".into())))
        }
    }

    fn client(
        script: Vec<Result<HttpResponse, TransportError>>,
    ) -> CbrClient<ScriptedTransport, RecordingSleeper> {
        CbrClient::new(
            ScriptedTransport::new(script),
            RecordingSleeper::new(),
            RetryPolicy::default(),
            "https://archive.test/{y}/{m}/{d}/daily_json.js",
        )
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 9).unwrap()
    }

    #[test]
    fn url_is_zero_padded() {
        let url = archive_url(
            "https://www.cbr-xml-daily.ru/archive/{y}/{m}/{d}/daily_json.js",
            NaiveDate::from_ymd_opt(2020, 3, 7).unwrap(),
        );
        assert_eq!(url, "https://www.cbr-xml-daily.ru/archive/2020/03/07/daily_json.js");
    }

    #[test]
    fn ok_payload_first_try() {
        let c = client(vec![Ok(HttpResponse::new(200, USD_BODY))]);
        let payload = c.fetch(day()).unwrap().unwrap();
        assert!(payload.valute.unwrap().contains_key("USD"));
        assert_eq!(c.name(), "cbr_daily_archive");
        assert_eq!(c.transport.calls(), 1);
        assert!(c.sleeper().calls().is_empty());
        assert_eq!(
            c.transport.urls.borrow()[0],
            "https://archive.test/2020/01/09/daily_json.js"
        );
    }

    #[test]
    fn not_found_is_absent_without_retry() {
        let c = client(vec![Ok(HttpResponse::new(404, "Not Found"))]);
        assert!(c.fetch(day()).unwrap().is_none());
        assert_eq!(c.transport.calls(), 1);
    }

    #[test]
    fn retries_server_errors_with_backoff() {
        let c = client(vec![
            Ok(HttpResponse::new(503, "")),
            Ok(HttpResponse::new(502, "")),
            Ok(HttpResponse::new(200, USD_BODY)),
        ]);
        assert!(c.fetch(day()).unwrap().is_some());
        assert_eq!(c.transport.calls(), 3);
        assert_eq!(
            c.sleeper().calls(),
            vec![Duration::from_millis(500), Duration::from_secs(1)]
        );
    }

    #[test]
    fn honors_retry_after_header() {
        let c = client(vec![
            Ok(HttpResponse::new(429, "").with_retry_after("3")),
            Ok(HttpResponse::new(200, USD_BODY)),
        ]);
        assert!(c.fetch(day()).unwrap().is_some());
        assert_eq!(c.sleeper().calls(), vec![Duration::from_secs(3)]);
    }

    #[test]
    fn exhausted_retries_are_transient() {
        let script = (0..6).map(|_| Ok(HttpResponse::new(500, ""))).collect();
        let c = client(script);
        let err = c.fetch(day()).unwrap_err();
        match err {
            FetchError::Transient { attempts, ref reason } => {
                assert_eq!(attempts, 6);
                assert_eq!(reason, "HTTP 500");
            }
            other => panic!("expected Transient, got {other:?}"),
        }
        assert_eq!(c.transport.calls(), 6);
        assert_eq!(c.sleeper().calls().len(), 5);
        assert_eq!(c.sleeper().total(), Duration::from_millis(500 + 1000 + 2000 + 4000 + 8000));
    }

    #[test]
    fn network_errors_are_retried() {
        let c = client(vec![
            Err(TransportError::Connect("refused".into())),
            Err(TransportError::Timeout("20s".into())),
            Ok(HttpResponse::new(200, USD_BODY)),
        ]);
        assert!(c.fetch(day()).unwrap().is_some());
        assert_eq!(c.transport.calls(), 3);
    }

    #[test]
    fn network_errors_exhaust_into_transient() {
        let script = (0..6)
            .map(|_| Err(TransportError::Connect("refused".into())))
            .collect();
        let err = client(script).fetch(day()).unwrap_err();
        assert!(matches!(err, FetchError::Transient { attempts: 6, .. }));
        assert!(err.to_string().contains("refused"));
    }

    #[test]
    fn other_statuses_are_fatal_without_retry() {
        let c = client(vec![Ok(HttpResponse::new(403, "Forbidden"))]);
        let err = c.fetch(day()).unwrap_err();
        assert!(matches!(err, FetchError::Fatal { status: 403, .. }));
        assert_eq!(c.transport.calls(), 1);
        assert!(c.sleeper().calls().is_empty());
    }

    #[test]
    fn undecodable_body_is_malformed() {
        let c = client(vec![Ok(HttpResponse::new(200, "<html></html>"))]);
        assert!(matches!(c.fetch(day()), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn no_retry_policy_makes_one_attempt() {
        let c = CbrClient::new(
            ScriptedTransport::new(vec![Ok(HttpResponse::new(503, ""))]),
            RecordingSleeper::new(),
            RetryPolicy::none(),
            "http://t/{y}{m}{d}",
        );
        assert!(matches!(
            c.fetch(day()),
            Err(FetchError::Transient { attempts: 1, .. })
        ));
        assert_eq!(c.transport.calls(), 1);
    }
}

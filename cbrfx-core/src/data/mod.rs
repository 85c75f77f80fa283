//! Archive access: transport, retry policy, payload extraction.

pub mod cbr;
pub mod clock;
pub mod extract;
pub mod provider;
pub mod retry;
pub mod transport;

pub use cbr::{archive_url, CbrClient};
pub use clock::{RecordingSleeper, Sleeper, ThreadSleeper};
pub use extract::extract_rate;
pub use provider::{FetchError, Quote, RatePayload, RateSource};
pub use retry::{parse_retry_after, RetryPolicy};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportError, TransportSettings};

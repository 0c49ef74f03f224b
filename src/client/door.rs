use core::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::instrument;

use super::types::{Capture, DEFAULT_TRACE_FIELD, Trace};
use super::{DoorErr, DoorResult};
use crate::plot::{Chart, PlotOptions, plot_trace};

pub const SERVER_ADDR: &str = "woodbad.pythonanywhere.com";
pub const SERVER_PORT: u16 = 80;

pub const DEFAULT_LABEL: &str = "value";
pub const DEFAULT_SEED: &str = "12345678";
pub const SEED_PARAM: &str = "seed";
pub const SEED_LENGTH: usize = 8;
pub const SEED_FILL: char = 'x';

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Server endpoint, which selects how hard the exercise is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Tier {
    #[default]
    Basic,
    Medium,
    Advanced,
}

impl Tier {
    pub fn path(&self) -> &'static str {
        match self {
            Tier::Basic => "passwordtrigger",
            Tier::Medium => "password",
            Tier::Advanced => "passworddiversify",
        }
    }
}

impl From<Tier> for String {
    fn from(value: Tier) -> Self {
        value.path().to_string()
    }
}

/// Raw values for a single guess, one per configured label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guess(Vec<Vec<u8>>);

impl Guess {
    pub fn new<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        Self(values.into_iter().map(|v| v.as_ref().to_vec()).collect())
    }

    pub fn values(&self) -> &[Vec<u8>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Guess {
    fn from(value: &str) -> Self {
        Self(vec![value.as_bytes().to_vec()])
    }
}

impl From<String> for Guess {
    fn from(value: String) -> Self {
        Self(vec![value.into_bytes()])
    }
}

impl From<&String> for Guess {
    fn from(value: &String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<&[&str]> for Guess {
    fn from(value: &[&str]) -> Self {
        Self::new(value)
    }
}

impl From<Vec<&str>> for Guess {
    fn from(value: Vec<&str>) -> Self {
        Self::new(value)
    }
}

impl From<Vec<String>> for Guess {
    fn from(value: Vec<String>) -> Self {
        Self::new(value)
    }
}

impl From<Vec<Vec<u8>>> for Guess {
    fn from(value: Vec<Vec<u8>>) -> Self {
        Self(value)
    }
}

impl fmt::Display for Guess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<_> = self.0.iter().map(|v| String::from_utf8_lossy(v)).collect();
        write!(f, "{}", joined.join(","))
    }
}

/// Builder for a [`Door`] client.
#[derive(Debug, Clone)]
pub struct DoorBuilder {
    address: String,
    path: String,
    labels: Vec<String>,
    seed: Option<String>,
    trace_field: String,
    timeout: Duration,
}

impl Default for DoorBuilder {
    fn default() -> Self {
        Self {
            address: format!("{}:{}", SERVER_ADDR, SERVER_PORT),
            path: Tier::default().into(),
            labels: vec![DEFAULT_LABEL.to_string()],
            seed: Some(DEFAULT_SEED.to_string()),
            trace_field: DEFAULT_TRACE_FIELD.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl DoorBuilder {
    /// `HOST:PORT` of the capture server
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn tier(mut self, tier: Tier) -> Self {
        self.path = tier.into();
        self
    }

    /// Custom URI path on the server, for endpoints outside the usual tiers
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into().trim_start_matches('/').to_string();
        self
    }

    /// Query parameter labels, one per value passed to `fetch_trace`
    pub fn labels<I, T>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Seed sent alongside every request; `None` omits the parameter entirely.
    ///
    /// Seeds shorter than eight characters are right-padded with `x`.
    pub fn seed(mut self, seed: Option<&str>) -> Self {
        self.seed = seed.map(pad_seed);
        self
    }

    /// Name of the response field holding the hex-encoded trace
    pub fn trace_field(mut self, field: impl Into<String>) -> Self {
        self.trace_field = field.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> DoorResult<Door> {
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;

        Ok(Door {
            address: self.address,
            path: self.path,
            labels: self.labels,
            seed: self.seed,
            trace_field: self.trace_field,
            client,
        })
    }
}

pub fn pad_seed(seed: &str) -> String {
    let mut padded = seed.to_string();
    let len = padded.chars().count();
    if len < SEED_LENGTH {
        padded.extend(std::iter::repeat_n(SEED_FILL, SEED_LENGTH - len));
    }

    padded
}

/// Guesses that try every digit at the position right after `prefix`, each padded out to `width`
/// characters with `fill`.
pub fn sweep_guesses(prefix: &str, width: usize, fill: char) -> Vec<String> {
    ('0'..='9')
        .map(|digit| {
            let mut guess = format!("{}{}", prefix, digit);
            let len = guess.chars().count();
            if len < width {
                guess.extend(std::iter::repeat_n(fill, width - len));
            }
            guess
        })
        .collect()
}

/// Body text for a non-200 response; a body that could not be read is noted in its place.
fn status_body<E: fmt::Display>(body: Result<String, E>) -> String {
    match body {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "unable to read body of failed response");
            format!("<unreadable response body: {}>", e)
        }
    }
}

/// HTTP client that requests side-channel captures from the door server.
#[derive(Debug, Clone)]
pub struct Door {
    address: String,
    path: String,
    labels: Vec<String>,
    seed: Option<String>,
    trace_field: String,
    client: reqwest::Client,
}

impl Door {
    pub fn builder() -> DoorBuilder {
        DoorBuilder::default()
    }

    /// Client for the given address with every other setting left at its default.
    pub fn new(address: impl Into<String>) -> DoorResult<Self> {
        Self::builder().address(address).build()
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn seed(&self) -> Option<&str> {
        self.seed.as_deref()
    }

    /// Hex-encodes each value under its label, followed by the seed (if configured).
    ///
    /// Parameters are always emitted in label order with `seed` last.
    pub fn encode_params(&self, guess: &Guess) -> DoorResult<Vec<(String, String)>> {
        if guess.len() != self.labels.len() {
            let err = DoorErr::Arity {
                expected: self.labels.len(),
                got: guess.len(),
            };
            tracing::error!(error = %err, "values must match the configured labels");
            return Err(err);
        }

        let mut params: Vec<(String, String)> = self
            .labels
            .iter()
            .zip(guess.values())
            .map(|(label, value)| (label.clone(), hex::encode(value)))
            .collect();

        if let Some(seed) = &self.seed {
            params.push((SEED_PARAM.to_string(), hex::encode(seed.as_bytes())));
        }

        Ok(params)
    }

    /// Builds the request URL for the configured path from already-encoded parameters.
    pub fn gen_url(&self, params: &[(String, String)]) -> String {
        let query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        format!("http://{}/{}?{}", self.address, self.path, query.join("&"))
    }

    #[instrument(skip(self, values), fields(path = %self.path))]
    /// Requests the side-channel capture for `values`.
    ///
    /// Values are passed raw; hex encoding happens here before the URL is built. A mismatch
    /// between the number of values and the number of labels fails before any request is sent.
    pub async fn fetch_trace(&self, values: impl Into<Guess>) -> DoorResult<Capture> {
        let guess = values.into();
        let params = self.encode_params(&guess)?;
        let url = self.gen_url(&params);

        tracing::debug!(%url, %guess, "requesting capture");
        let res = self.client.get(&url).send().await.inspect_err(|e| {
            tracing::error!(error = %e, "request to capture server failed");
        })?;

        let status = res.status();
        if status != StatusCode::OK {
            let body = status_body(res.text().await);
            tracing::error!(code = %status, %body, "non-200/OK response");
            return Err(DoorErr::Status { code: status, body });
        }

        let body = res.bytes().await?;
        let capture = Capture::parse(&body, &self.trace_field).inspect_err(|e| {
            tracing::error!(error = %e, "unusable capture response");
        })?;

        tracing::info!(
            %guess,
            samples = capture.trace.as_ref().map_or(0, Trace::len),
            result = capture.result().unwrap_or_default(),
            "capture received"
        );

        Ok(capture)
    }

    /// Fetches the capture for `values` and appends it to `chart`.
    ///
    /// Nothing is plotted when the fetch fails.
    pub async fn unlock(
        &self,
        chart: &mut Chart,
        values: impl Into<Guess>,
        options: &PlotOptions,
    ) -> DoorResult<()> {
        let capture = self.fetch_trace(values).await?;
        plot_trace(chart, &capture, options)?;

        Ok(())
    }
}

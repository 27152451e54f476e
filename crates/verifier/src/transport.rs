//! Challenge transport abstraction for testability.
//!
//! The [`ChallengeTransport`] trait hides the two network probes the verifier
//! needs: a DNS TXT lookup and an HTTPS GET of the well-known challenge file.
//! Production code uses [`NetworkTransport`] (hickory-resolver + reqwest);
//! tests substitute a static transport.
//!
//! Transport errors are returned as [`VerifierError::Transport`]; the verifier
//! treats them as a failed proof, never as an internal error.

use std::future::Future;

use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use tracing::debug;

use crate::config::VerifierConfig;
use crate::error::VerifierError;

/// Maximum challenge file size read from the response body.
const MAX_CHALLENGE_BODY_BYTES: usize = 4096;

/// Result of fetching the HTTPS challenge file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeResponse {
    /// Whether the response status was 2xx.
    pub success: bool,
    /// Response body (truncated to a small bound).
    pub body: String,
}

/// Network probes used to prove domain ownership.
///
/// The trait is `Send + Sync + 'static`, allowing safe sharing across async contexts.
pub trait ChallengeTransport: Send + Sync + 'static {
    /// Looks up TXT records at `name`.
    ///
    /// Returns one entry per record, each holding the record's character-strings.
    fn lookup_txt(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Vec<Vec<String>>, VerifierError>> + Send;

    /// Fetches the challenge file at `url`.
    fn fetch_challenge(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<ChallengeResponse, VerifierError>> + Send;
}

/// Production transport backed by `hickory-resolver` and `reqwest`.
pub struct NetworkTransport {
    resolver: TokioAsyncResolver,
    http: reqwest::Client,
}

impl NetworkTransport {
    /// Creates a transport using hickory's default upstream resolvers
    /// and an HTTPS client bounded by the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `VerifierError::Config` if the HTTP client cannot be built.
    pub fn new(config: &VerifierConfig) -> Result<Self, VerifierError> {
        let resolver =
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .redirect(reqwest::redirect::Policy::limited(3))
            .user_agent(concat!("scanward-verifier/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| VerifierError::Config {
                field: "http_timeout_secs".to_owned(),
                reason: format!("failed to build http client: {e}"),
            })?;

        Ok(Self { resolver, http })
    }
}

impl ChallengeTransport for NetworkTransport {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<Vec<String>>, VerifierError> {
        debug!(name, "looking up TXT records");
        let lookup = self
            .resolver
            .txt_lookup(name)
            .await
            .map_err(|e| VerifierError::Transport(format!("TXT lookup for {name} failed: {e}")))?;

        Ok(lookup
            .iter()
            .map(|txt| {
                txt.txt_data()
                    .iter()
                    .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                    .collect()
            })
            .collect())
    }

    async fn fetch_challenge(&self, url: &str) -> Result<ChallengeResponse, VerifierError> {
        debug!(url, "fetching challenge file");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| VerifierError::Transport(format!("GET {url} failed: {e}")))?;

        let success = response.status().is_success();
        let body = read_capped(response, MAX_CHALLENGE_BODY_BYTES)
            .await
            .map_err(|e| VerifierError::Transport(format!("reading body of {url} failed: {e}")))?;

        Ok(ChallengeResponse {
            success,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

/// Reads at most `cap` bytes of the body; the rest is never buffered.
async fn read_capped(
    mut response: reqwest::Response,
    cap: usize,
) -> Result<Vec<u8>, reqwest::Error> {
    let mut body = Vec::new();
    while body.len() < cap {
        let Some(chunk) = response.chunk().await? else {
            break;
        };
        let take = chunk.len().min(cap - body.len());
        body.extend_from_slice(&chunk[..take]);
    }
    Ok(body)
}

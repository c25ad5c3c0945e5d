//! Blocking client for the ESM Atlas folding endpoint.
//!
//! The endpoint takes the raw sequence as the request body and answers with a
//! PDB document whose B-factor column carries per-residue pLDDT.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;

use crate::config::PredictionConfig;
use crate::predict::{PredictionError, StructurePredictor};

/// Longest error body kept for diagnostics
const MAX_ERROR_BODY: usize = 200;

pub struct EsmFoldClient {
    client: Client,
    config: PredictionConfig,
}

impl EsmFoldClient {
    /// Build a client with the configured request timeout
    ///
    /// # Errors
    ///
    /// Returns `PredictionError::Client` if the HTTP client cannot be constructed.
    pub fn new(config: PredictionConfig) -> Result<Self, PredictionError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("knot-detector/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PredictionError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// One request, no retries
    fn submit(&self, sequence: &str) -> Result<String, Attempt> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .body(sequence.to_string())
            .send()
            .map_err(|e| Attempt::failed(PredictionError::Transport(e.to_string())))?;

        let status = response.status();
        if status.is_success() {
            return response
                .text()
                .map_err(|e| Attempt::failed(PredictionError::Transport(e.to_string())));
        }

        if status == StatusCode::PAYLOAD_TOO_LARGE {
            return Err(Attempt::failed(PredictionError::PayloadTooLarge {
                length: sequence.len(),
            }));
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let mut body = response.text().unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }

        Err(Attempt {
            error: PredictionError::Status {
                status: status.as_u16(),
                body,
            },
            retry_after,
        })
    }
}

/// A failed request and the server's requested delay, if any
struct Attempt {
    error: PredictionError,
    retry_after: Option<Duration>,
}

impl Attempt {
    fn failed(error: PredictionError) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

impl StructurePredictor for EsmFoldClient {
    fn predict(&self, sequence: &str) -> Result<String, PredictionError> {
        if sequence.len() > self.config.max_sequence_length {
            tracing::error!(
                "Sequence length {} exceeds the service limit of {} residues",
                sequence.len(),
                self.config.max_sequence_length
            );
            return Err(PredictionError::PayloadTooLarge {
                length: sequence.len(),
            });
        }

        let mut backoff = self.config.initial_backoff();
        let mut attempt = 0;

        loop {
            match self.submit(sequence) {
                Ok(text) => return Ok(text),
                Err(failure) => {
                    if !failure.error.is_retryable() || attempt >= self.config.max_retries {
                        return Err(failure.error);
                    }
                    attempt += 1;

                    // Never wait longer than a request may take
                    let wait = failure
                        .retry_after
                        .unwrap_or(backoff)
                        .min(self.config.timeout());
                    tracing::warn!(
                        "{}; retrying in {:.1}s (attempt {attempt}/{})",
                        failure.error,
                        wait.as_secs_f64(),
                        self.config.max_retries
                    );
                    thread::sleep(wait);
                    backoff = backoff.saturating_mul(2);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oversized_sequence_rejected_locally() {
        let config = PredictionConfig {
            // Unroutable endpoint: the request must never be sent
            endpoint: "http://192.0.2.1/fold".to_string(),
            max_sequence_length: 10,
            ..Default::default()
        };
        let client = EsmFoldClient::new(config).unwrap();

        let result = client.predict("MKTAYIAKQRQ");
        assert!(matches!(
            result,
            Err(PredictionError::PayloadTooLarge { length: 11 })
        ));
    }
}

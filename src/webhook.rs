// ABOUTME: Outbound POST of delivery payloads with bounded retry
// ABOUTME: Retries transport errors, 5xx, and 429; any other 4xx fails at once

use crate::{
    retry::{retry, thread_sleep, Backoff},
    DeliveryPayload, Error, Result,
};
use reqwest::blocking::Client;
use std::time::Duration;

pub struct WebhookClient {
    client: Client,
    url: String,
    backoff: Backoff,
}

enum AttemptError {
    Transport(reqwest::Error),
    Status(u16),
}

impl WebhookClient {
    pub fn new(url: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(WebhookClient {
            client,
            url,
            backoff: Backoff::webhook(),
        })
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST the payload, retrying transient failures. Success requires a 2xx
    /// acknowledgment from the endpoint.
    pub fn deliver(&self, payload: &DeliveryPayload) -> Result<()> {
        let mut attempts = 0;

        let result = retry(
            &self.backoff,
            |_| {
                attempts += 1;
                self.attempt(payload)
            },
            |e| match e {
                AttemptError::Transport(_) => true,
                AttemptError::Status(code) => *code >= 500 || *code == 429,
            },
            thread_sleep,
        );

        result.map_err(|e| Error::Delivery {
            status: match e {
                AttemptError::Status(code) => Some(code),
                AttemptError::Transport(_) => None,
            },
            attempts,
        })
    }

    /// Lightweight reachability probe for `status`: anything the endpoint
    /// answers below 500 counts as reachable.
    pub fn probe(&self) -> bool {
        let body = serde_json::json!({"test": true, "source": "granola-relay-probe"});
        match self.client.post(&self.url).json(&body).send() {
            Ok(resp) => resp.status().as_u16() < 500,
            Err(_) => false,
        }
    }

    fn attempt(&self, payload: &DeliveryPayload) -> std::result::Result<(), AttemptError> {
        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .map_err(AttemptError::Transport)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(AttemptError::Status(status.as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let retryable = |e: &AttemptError| match e {
            AttemptError::Transport(_) => true,
            AttemptError::Status(code) => *code >= 500 || *code == 429,
        };

        assert!(retryable(&AttemptError::Status(500)));
        assert!(retryable(&AttemptError::Status(503)));
        assert!(retryable(&AttemptError::Status(429)));
        assert!(!retryable(&AttemptError::Status(400)));
        assert!(!retryable(&AttemptError::Status(404)));
        assert!(!retryable(&AttemptError::Status(422)));
    }
}

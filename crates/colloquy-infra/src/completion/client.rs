//! HTTP completion client with at-most-one-in-flight semantics.
//!
//! `send` picks the endpoint variant from the turn's shape: attachments
//! present means the multimodal streaming variant, text-only means the
//! plain JSON variant. Each `send` replaces the client's cancellation token and
//! cancels the previous one, so a newer turn silences any older in-flight
//! request: the superseded call resolves `Ok(None)`, never an error and
//! never a stale answer.

use std::sync::Mutex;
use std::time::Duration;

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use secrecy::ExposeSecret;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use colloquy_core::completion::{CompletionService, CompletionTurn};
use colloquy_types::config::EndpointConfig;
use colloquy_types::error::RequestError;

use super::wire::{
    MultimodalRequest, TextRequest, extract_choice_answer, finalize_stream_answer,
    parse_stream_fragment,
};

pub struct HttpCompletionClient {
    http: reqwest::Client,
    config: EndpointConfig,
    /// Token of the in-flight request, replaced (and the old one cancelled)
    /// by every new `send`.
    slot: Mutex<CancellationToken>,
}

impl HttpCompletionClient {
    pub fn new(config: EndpointConfig) -> Result<Self, RequestError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RequestError::Http(e.to_string()))?;

        Ok(Self {
            http,
            config,
            slot: Mutex::new(CancellationToken::new()),
        })
    }

    /// Cancel whatever is in flight and install a fresh token for this
    /// request.
    fn begin_request(&self) -> CancellationToken {
        let mut slot = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        slot.cancel();
        let token = CancellationToken::new();
        *slot = token.clone();
        token
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let mut builder = self.http.post(url);
        if let Some(token) = &self.config.bearer_token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        builder
    }

    async fn dispatch(&self, turn: &CompletionTurn) -> Result<String, RequestError> {
        if turn.has_attachments {
            self.send_stream(&turn.text, &turn.images).await
        } else {
            self.send_text(&turn.text).await
        }
    }

    async fn send_text(&self, text: &str) -> Result<String, RequestError> {
        let response = self
            .request(&self.config.text_path)
            .json(&TextRequest::user_turn(text))
            .send()
            .await
            .map_err(|e| RequestError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| RequestError::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(RequestError::Status {
                code: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        extract_choice_answer(&body)
    }

    async fn send_stream(&self, text: &str, images: &[Vec<u8>]) -> Result<String, RequestError> {
        let response = self
            .request(&self.config.stream_path)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&MultimodalRequest::user_turn(text, images))
            .send()
            .await
            .map_err(|e| RequestError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RequestError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let mut events = response.bytes_stream().eventsource();
        let mut assembled = String::new();
        while let Some(event) = events.next().await {
            let event = event.map_err(|e| RequestError::Decode(e.to_string()))?;
            // An event may carry several data lines; each line is one
            // fragment on its own.
            for line in event.data.lines() {
                if let Some(fragment) = parse_stream_fragment(line) {
                    assembled.push_str(&fragment);
                }
            }
        }

        Ok(finalize_stream_answer(&assembled))
    }
}

impl CompletionService for HttpCompletionClient {
    async fn send(&self, turn: CompletionTurn) -> Result<Option<String>, RequestError> {
        if turn.is_empty() {
            return Err(RequestError::EmptyTurn);
        }

        let token = self.begin_request();
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("request superseded or cancelled");
                Ok(None)
            }
            result = self.dispatch(&turn) => result.map(Some),
        }
    }

    fn cancel(&self) {
        let slot = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        slot.cancel();
    }
}

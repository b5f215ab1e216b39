//! HTTP client for a remote batch embedding service.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::RagError;

use super::{Embedding, EmbeddingProvider, Representation};

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    representation: Representation,
    texts: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Embedding>,
}

/// Embedding provider backed by a remote HTTP endpoint.
///
/// Sends `POST {endpoint}` with a JSON body of
/// `{ "model", "representation", "texts" }` and expects
/// `{ "embeddings": [...] }` with one embedding per input text, in order.
/// Transport and protocol failures are surfaced as [`RagError::Embedding`];
/// there is no retry inside the client.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingProvider {
    client: Client,
    endpoint: Url,
    model: Option<String>,
    name: String,
}

impl HttpEmbeddingProvider {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: Client::new(),
            name: format!("http:{}", endpoint.host_str().unwrap_or("unknown")),
            endpoint,
            model: None,
        }
    }

    /// Model identifier forwarded to the service, if it hosts several.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Reuse an existing [`reqwest::Client`] (connection pooling, TLS config).
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(
        &self,
        texts: &[String],
        representation: Representation,
    ) -> Result<Vec<Embedding>, RagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbedRequest {
            model: self.model.as_deref(),
            representation,
            texts,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|err| RagError::Embedding(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RagError::Embedding(format!(
                "embedding service returned {status}"
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|err| RagError::Embedding(err.to_string()))?;

        if body.embeddings.len() != texts.len() {
            return Err(RagError::Embedding(format!(
                "requested {} embeddings, service returned {}",
                texts.len(),
                body.embeddings.len()
            )));
        }
        if let Some(stray) = body
            .embeddings
            .iter()
            .find(|embedding| embedding.representation() != representation)
        {
            return Err(RagError::Embedding(format!(
                "requested {representation} embeddings, service returned {}",
                stray.representation()
            )));
        }

        tracing::debug!(
            endpoint = %self.endpoint,
            %representation,
            batch = texts.len(),
            "embedded batch"
        );
        Ok(body.embeddings)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

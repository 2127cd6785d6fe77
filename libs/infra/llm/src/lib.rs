// [libs/infra/llm/src/lib.rs]
/*!
 * =================================================================
 * APARATO: NARROW LLM & VECTOR INDEX CONTRACTS (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: FRONTERA ESTRECHA HACIA EL MODELO DE LENGUAJE Y
 *                   EL ÍNDICE VECTORIAL
 *
 * El cliente LLM y el cliente del índice vectorial son los únicos
 * singletons de proceso además del broker (SPEC_FULL.md §9): se
 * crean en el primer uso y se destruyen al apagar el proceso. Todo
 * lo demás (contexto de petición, ítem de trabajo) vive por operación.
 *
 * La decodificación y validación JSON ocurren en la etapa de
 * pipeline que llama a `call_llm`, nunca dentro de este cliente —
 * este cliente solo conoce texto de entrada y texto de salida.
 * =================================================================
 */

use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("[LLM_CONFIG_FAULT]: missing API credential")]
    MissingCredential,
    #[error("[LLM_TRANSPORT_FAULT]: {0}")]
    Transport(String),
    #[error("[LLM_TIMEOUT_FAULT]: request exceeded {0:?}")]
    Timeout(Duration),
    #[error("[LLM_RESPONSE_FAULT]: {0}")]
    MalformedResponse(String),
}

#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    request_timeout: Duration,
}

impl LlmClient {
    pub fn new(api_key: Option<String>, base_url: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
            model,
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// The single narrow dependency every pipeline stage calls through:
    /// system prompt + user content in, raw completion text out. Any
    /// exception, timeout, or missing credential is surfaced as `LlmError`
    /// so the caller can fall back to its keyword pipeline.
    #[instrument(skip(self, system, user), fields(model = %self.model))]
    pub async fn call_llm(&self, system: &str, user: &str, max_tokens: u32) -> Result<String, LlmError> {
        let Some(api_key) = self.api_key.as_ref().filter(|k| !k.is_empty()) else {
            return Err(LlmError::MissingCredential);
        };

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });

        let response = tokio::time::timeout(
            self.request_timeout,
            self.http
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(api_key)
                .json(&body)
                .send(),
        )
        .await
        .map_err(|_| LlmError::Timeout(self.request_timeout))?
        .map_err(|e| LlmError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LlmError::Transport(format!("status {}", response.status())));
        }

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        parsed
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| LlmError::MalformedResponse("no choices[0].message.content".into()))
    }
}

/// `embed(text) → vector` — the narrow embedding contract (SPEC_FULL.md §9).
#[derive(Clone)]
pub struct EmbeddingClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

pub const EMBEDDING_DIM: usize = 384;

impl EmbeddingClient {
    pub fn new(api_key: Option<String>, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }

    #[instrument(skip(self, text))]
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let Some(api_key) = self.api_key.as_ref().filter(|k| !k.is_empty()) else {
            debug!("no embedding credential configured, returning zero vector");
            return Ok(vec![0.0; EMBEDDING_DIM]);
        };

        let response = self
            .http
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(api_key)
            .json(&serde_json::json!({ "input": text }))
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        parsed
            .pointer("/data/0/embedding")
            .and_then(|v| v.as_array())
            .map(|values| values.iter().filter_map(|x| x.as_f64()).map(|x| x as f32).collect())
            .ok_or_else(|| LlmError::MalformedResponse("no data[0].embedding".into()))
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct VectorSearchHit {
    pub id: String,
    pub score: f32,
    pub metadata: serde_json::Value,
}

/// `search(vector, k) → items` — the narrow vector-index contract.
#[derive(Clone)]
pub struct VectorIndexClient {
    http: reqwest::Client,
    base_url: String,
    collection: String,
}

impl VectorIndexClient {
    pub fn new(base_url: String, collection: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            collection,
        }
    }

    #[instrument(skip(self, record))]
    pub async fn upsert(&self, record: VectorRecord) -> Result<(), LlmError> {
        if self.base_url.is_empty() {
            warn!("vector index not configured, skipping upsert");
            return Ok(());
        }
        self.http
            .post(format!("{}/collections/{}/points", self.base_url, self.collection))
            .json(&record)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;
        Ok(())
    }

    #[instrument(skip(self, vector))]
    pub async fn search(&self, vector: Vec<f32>, k: usize) -> Result<Vec<VectorSearchHit>, LlmError> {
        if self.base_url.is_empty() {
            return Ok(Vec::new());
        }
        let response = self
            .http
            .post(format!("{}/collections/{}/search", self.base_url, self.collection))
            .json(&serde_json::json!({ "vector": vector, "limit": k }))
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        response
            .json::<Vec<VectorSearchHit>>()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))
    }
}

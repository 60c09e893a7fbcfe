//! Knowledge retrieval
//!
//! Similarity lookup over the practice knowledge base, behind a store trait
//! so the orchestrator can run against the hosted Supabase RPC functions or
//! an in-memory vector store. Lookup failures are logged, then absorbed into
//! a static fallback list; callers always get context back.

use crate::error::{PracticeError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Generic domain facts returned when the knowledge base is unreachable or
/// has nothing relevant.
pub const FALLBACK_CONTEXT: [&str; 3] = [
    "Dental practices typically target a 95% collection rate against production.",
    "Hygiene should account for roughly 25-30% of total practice production.",
    "Crown and bridge lab cases usually take 10-14 days from impression to delivery.",
];

/// One row from a similarity lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeRow {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Optional narrowing for a retrieval call.
#[derive(Debug, Clone, Default)]
pub struct RetrievalFilters {
    pub agent_id: Option<String>,
    pub bundle: Option<String>,
    pub category: Option<String>,
}

impl RetrievalFilters {
    pub fn for_agent(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: Some(agent_id.into()),
            ..Default::default()
        }
    }
}

/// Similarity-search backend.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Unscoped lookup; bundle/category filters apply here.
    async fn match_documents(
        &self,
        query: &str,
        count: usize,
        bundle: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<KnowledgeRow>>;

    /// Agent-scoped lookup. Bundle/category filters are intentionally not
    /// part of this path; the hosted RPC function does not accept them.
    async fn match_agent_documents(
        &self,
        query: &str,
        count: usize,
        agent_id: &str,
    ) -> Result<Vec<KnowledgeRow>>;
}

/// Retriever wrapping a store with the fallback policy.
pub struct KnowledgeRetriever {
    store: Arc<dyn KnowledgeStore>,
}

impl KnowledgeRetriever {
    pub fn new(store: Arc<dyn KnowledgeStore>) -> Self {
        Self { store }
    }

    /// Retrieve up to `count` context strings for a query.
    ///
    /// Any store error or empty result degrades to `FALLBACK_CONTEXT`; the
    /// underlying error is logged so operators can still see lookup health.
    pub async fn retrieve(
        &self,
        query: &str,
        count: usize,
        filters: &RetrievalFilters,
    ) -> Vec<String> {
        let result = match &filters.agent_id {
            Some(agent_id) => self.store.match_agent_documents(query, count, agent_id).await,
            None => {
                self.store
                    .match_documents(
                        query,
                        count,
                        filters.bundle.as_deref(),
                        filters.category.as_deref(),
                    )
                    .await
            }
        };

        match result {
            Ok(rows) if !rows.is_empty() => {
                debug!(count = rows.len(), "knowledge lookup returned context");
                rows.into_iter().map(|row| row.content).collect()
            }
            Ok(_) => {
                debug!(query, "knowledge lookup returned no rows, using fallback");
                fallback()
            }
            Err(err) => {
                warn!(query, error = %err, "knowledge lookup failed, using fallback");
                fallback()
            }
        }
    }
}

fn fallback() -> Vec<String> {
    FALLBACK_CONTEXT.iter().map(|s| s.to_string()).collect()
}

/// Knowledge store backed by Supabase RPC functions.
pub struct SupabaseKnowledgeStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseKnowledgeStore {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    async fn rpc(&self, function: &str, body: serde_json::Value) -> Result<Vec<KnowledgeRow>> {
        let url = format!("{}/rest/v1/rpc/{}", self.base_url.trim_end_matches('/'), function);
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| PracticeError::Retrieval(format!("RPC {} failed: {}", function, e)))?;

        if !response.status().is_success() {
            return Err(PracticeError::Retrieval(format!(
                "RPC {} returned {}",
                function,
                response.status()
            )));
        }

        response
            .json::<Vec<KnowledgeRow>>()
            .await
            .map_err(|e| PracticeError::Retrieval(format!("RPC {} bad payload: {}", function, e)))
    }
}

#[async_trait]
impl KnowledgeStore for SupabaseKnowledgeStore {
    async fn match_documents(
        &self,
        query: &str,
        count: usize,
        bundle: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<KnowledgeRow>> {
        let mut body = json!({
            "query_text": query,
            "match_count": count,
        });
        if let Some(bundle) = bundle {
            body["filter_bundle"] = json!(bundle);
        }
        if let Some(category) = category {
            body["filter_category"] = json!(category);
        }
        self.rpc("match_documents", body).await
    }

    async fn match_agent_documents(
        &self,
        query: &str,
        count: usize,
        agent_id: &str,
    ) -> Result<Vec<KnowledgeRow>> {
        let body = json!({
            "query_text": query,
            "match_count": count,
            "agent_id": agent_id,
        });
        self.rpc("match_agent_documents", body).await
    }
}

/// Embedding dimension for the in-memory store.
const EMBEDDING_DIM: usize = 256;

/// A document in the in-memory store.
#[derive(Debug, Clone)]
pub struct KnowledgeDocument {
    pub content: String,
    pub agent_id: Option<String>,
    pub bundle: Option<String>,
    pub category: Option<String>,
    embedding: Vec<f32>,
}

impl KnowledgeDocument {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let embedding = embed(&content);
        Self {
            content,
            agent_id: None,
            bundle: None,
            category: None,
            embedding,
        }
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_bundle(mut self, bundle: impl Into<String>) -> Self {
        self.bundle = Some(bundle.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// In-memory cosine-similarity store, used by tests and the CLI's offline
/// mode. Embeddings come from a deterministic token-hash projection, which
/// is enough for word-overlap relevance.
#[derive(Default)]
pub struct InMemoryKnowledgeStore {
    documents: Vec<KnowledgeDocument>,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_document(&mut self, document: KnowledgeDocument) {
        self.documents.push(document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn search<'a, F>(&'a self, query: &str, count: usize, accept: F) -> Vec<KnowledgeRow>
    where
        F: Fn(&KnowledgeDocument) -> bool,
    {
        let query_embedding = embed(query);
        let mut scored: Vec<(f32, &'a KnowledgeDocument)> = self
            .documents
            .iter()
            .filter(|doc| accept(doc))
            .map(|doc| (cosine_similarity(&query_embedding, &doc.embedding), doc))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(count);
        scored
            .into_iter()
            .map(|(score, doc)| {
                let mut metadata = HashMap::new();
                if let Some(agent_id) = &doc.agent_id {
                    metadata.insert("agent_id", agent_id.clone());
                }
                KnowledgeRow {
                    content: doc.content.clone(),
                    metadata: Some(json!({ "score": score, "tags": metadata })),
                }
            })
            .collect()
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn match_documents(
        &self,
        query: &str,
        count: usize,
        bundle: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<KnowledgeRow>> {
        Ok(self.search(query, count, |doc| {
            bundle.map_or(true, |b| doc.bundle.as_deref() == Some(b))
                && category.map_or(true, |c| doc.category.as_deref() == Some(c))
        }))
    }

    async fn match_agent_documents(
        &self,
        query: &str,
        count: usize,
        agent_id: &str,
    ) -> Result<Vec<KnowledgeRow>> {
        Ok(self.search(query, count, |doc| doc.agent_id.as_deref() == Some(agent_id)))
    }
}

/// Deterministic bag-of-words embedding: each lowercase token hashes to a
/// dimension, and the vector is L2-normalized by cosine_similarity later.
fn embed(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; EMBEDDING_DIM];
    for token in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let mut hash: u64 = 1469598103934665603; // FNV-1a offset basis
        for byte in token.bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(1099511628211);
        }
        vector[(hash % EMBEDDING_DIM as u64) as usize] += 1.0;
    }
    vector
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

//! Query orchestration
//!
//! Single-pass pipeline behind every assistant answer: retrieve knowledge
//! context, route the query, run the selected sub-pipelines one after
//! another, then assemble the typed sections and the narrative answer.
//! Every failure inside the pipeline is contained here; callers always get
//! a response back.

use crate::analysis::{analyze_kpis, KpiAnalysis};
use crate::data_source::PracticeDataSource;
use crate::error::Result;
use crate::lab_cases::{classify_lab_cases, LabCaseAnalysis};
use crate::metrics::MetricGoals;
use crate::recommendations::{generate_recommendations, Recommendation};
use crate::retrieval::{KnowledgeRetriever, KnowledgeStore, RetrievalFilters};
use crate::router::{AgentKind, QueryRouter};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

/// How many general context strings to retrieve up front.
const CONTEXT_MATCH_COUNT: usize = 5;

/// One typed block of an orchestrator response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ResponseSection {
    LabCases(LabCaseAnalysis),
    KpiAnalysis(KpiAnalysis),
    Recommendations(Vec<Recommendation>),
    KnowledgeContext(Vec<String>),
    Error(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorResponse {
    pub answer: String,
    pub sections: Vec<ResponseSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

impl std::fmt::Display for OrchestratorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.answer)?;
        for section in &self.sections {
            match section {
                ResponseSection::LabCases(analysis) => {
                    writeln!(f, "\n=== Lab Cases ===")?;
                    writeln!(f, "{}", analysis.summary)?;
                    for task in &analysis.tasks {
                        writeln!(f, "- [{:?}] {}", task.priority, task.description)?;
                    }
                }
                ResponseSection::KpiAnalysis(analysis) => {
                    writeln!(f, "\n=== KPI Analysis ({}) ===", analysis.timeframe)?;
                    for (metric, scored) in &analysis.metrics {
                        writeln!(
                            f,
                            "- {}: {:.1}% of goal ({:?})",
                            metric.label(),
                            scored.performance,
                            scored.status
                        )?;
                    }
                }
                ResponseSection::Recommendations(recs) => {
                    writeln!(f, "\n=== Recommendations ===")?;
                    for rec in recs {
                        writeln!(f, "- {} ({:?} priority)", rec.title, rec.priority)?;
                    }
                }
                ResponseSection::KnowledgeContext(context) => {
                    writeln!(f, "\n=== Knowledge Context ===")?;
                    for entry in context {
                        writeln!(f, "- {}", entry)?;
                    }
                }
                ResponseSection::Error(message) => {
                    writeln!(f, "\n=== Error ===")?;
                    writeln!(f, "{}", message)?;
                }
            }
        }
        if let Some(sources) = &self.sources {
            writeln!(f, "\nSources: {}", sources.join(", "))?;
        }
        Ok(())
    }
}

/// Everything one dispatch pass produced, before section assembly.
#[derive(Default)]
struct DispatchResults {
    lab: Option<LabCaseAnalysis>,
    kpis: Option<KpiAnalysis>,
    recommendations: Option<Vec<Recommendation>>,
}

pub struct Orchestrator {
    retriever: KnowledgeRetriever,
    router: QueryRouter,
    data_source: Arc<dyn PracticeDataSource>,
    goals: MetricGoals,
    /// Fixed classification date for tests; `None` means "today".
    today: Option<NaiveDate>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        data_source: Arc<dyn PracticeDataSource>,
        goals: MetricGoals,
    ) -> Self {
        Self {
            retriever: KnowledgeRetriever::new(store),
            router: QueryRouter::new(),
            data_source,
            goals,
            today: None,
        }
    }

    /// Pin the classification date (lab-case bucketing, task due dates).
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Answer a query. Never fails: pipeline errors become an apologetic
    /// answer with a single error section.
    pub async fn handle_query(&self, query: &str) -> OrchestratorResponse {
        info!(query, "orchestrator handling query");
        match self.run_pipeline(query).await {
            Ok(response) => response,
            Err(err) => {
                error!(query, error = %err, "pipeline failed");
                OrchestratorResponse {
                    answer: "I'm sorry, I wasn't able to complete that analysis. \
                             Please try again in a moment."
                        .to_string(),
                    sections: vec![ResponseSection::Error(err.to_string())],
                    sources: None,
                }
            }
        }
    }

    async fn run_pipeline(&self, query: &str) -> Result<OrchestratorResponse> {
        // Step 1: general knowledge context (lookup failures are already
        // absorbed into the fallback list by the retriever).
        let context = self
            .retriever
            .retrieve(query, CONTEXT_MATCH_COUNT, &RetrievalFilters::default())
            .await;

        // Step 2: routing over query + context.
        let agents = self.router.route(query, &context);
        info!(?agents, "routing decision");

        // Step 3: sequential dispatch.
        let mut results = DispatchResults::default();
        for agent in &agents {
            match agent {
                AgentKind::LabCaseManager => {
                    self.scoped_retrieval(query, "labCaseManager").await;
                    results.lab = Some(self.run_lab_pipeline(query).await?);
                }
                AgentKind::DataAnalysis => {
                    self.scoped_retrieval(query, "dataAnalysis").await;
                    let (kpis, recommendations) = self.run_analysis_pipeline(query).await?;
                    results.kpis = Some(kpis);
                    results.recommendations = recommendations;
                }
            }
        }

        // Steps 4-5: fixed-order assembly and answer composition.
        Ok(self.assemble(results, context))
    }

    /// Agent-scoped retrieval ahead of a sub-pipeline. Results are logged
    /// for diagnosis but not merged into the response.
    async fn scoped_retrieval(&self, query: &str, agent_id: &str) {
        let scoped = self
            .retriever
            .retrieve(query, 3, &RetrievalFilters::for_agent(agent_id))
            .await;
        debug!(agent_id, count = scoped.len(), "agent-scoped context retrieved");
    }

    async fn run_lab_pipeline(&self, query: &str) -> Result<LabCaseAnalysis> {
        let buckets = self.data_source.fetch_lab_cases(query).await?;
        let cases = buckets.ingest();
        Ok(classify_lab_cases(&cases, self.classification_date()))
    }

    async fn run_analysis_pipeline(
        &self,
        query: &str,
    ) -> Result<(KpiAnalysis, Option<Vec<Recommendation>>)> {
        let metrics = self.data_source.fetch_metrics(query).await?;
        let analysis = analyze_kpis(&metrics, &self.goals);
        let recommendations = if analysis.areas_for_improvement.is_empty() {
            None
        } else {
            Some(generate_recommendations(&analysis))
        };
        Ok((analysis, recommendations))
    }

    fn assemble(&self, results: DispatchResults, context: Vec<String>) -> OrchestratorResponse {
        let mut answer_parts = Vec::new();
        let mut sections = Vec::new();

        if let Some(lab) = results.lab {
            answer_parts.push(lab.summary.clone());
            sections.push(ResponseSection::LabCases(lab));
        }
        if let Some(kpis) = results.kpis {
            answer_parts.push(kpis.summary.clone());
            sections.push(ResponseSection::KpiAnalysis(kpis));
        }
        if let Some(recommendations) = results.recommendations {
            let titles: Vec<String> = recommendations
                .iter()
                .map(|rec| rec.title.clone())
                .collect();
            answer_parts.push(format!("Recommended next steps: {}.", titles.join("; ")));
            sections.push(ResponseSection::Recommendations(recommendations));
        }

        let sources = if context.is_empty() {
            None
        } else {
            Some(vec!["practice knowledge base".to_string()])
        };
        if !context.is_empty() {
            sections.push(ResponseSection::KnowledgeContext(context));
        }

        let answer = if answer_parts.is_empty() {
            "I couldn't find anything relevant to that question.".to_string()
        } else {
            answer_parts.join(" ")
        };

        OrchestratorResponse {
            answer,
            sections,
            sources,
        }
    }

    fn classification_date(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }
}

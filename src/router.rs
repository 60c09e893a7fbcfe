//! Query routing
//!
//! Decides which sub-agents a free-text query should reach by keyword
//! containment over the query plus any retrieved knowledge context. Routing
//! never returns an empty plan; analysis is the default destination.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AgentKind {
    LabCaseManager,
    DataAnalysis,
}

const LAB_KEYWORDS: &[&str] = &[
    "lab", "crown", "bridge", "denture", "implant", "veneer", "night guard",
    "retainer", "impression", "case",
];

const ANALYSIS_KEYWORDS: &[&str] = &[
    "kpi", "production", "collections", "hygiene", "revenue", "metric",
    "performance", "goal", "trend", "no-show", "no show", "cancellation",
    "patient count", "analysis",
];

// Secondary trigger: advice-seeking language routes to analysis too, since
// recommendations are generated off the KPI pipeline.
const ADVICE_KEYWORDS: &[&str] = &["recommendation", "recommend", "suggest", "advise"];

#[derive(Debug, Default)]
pub struct QueryRouter;

impl QueryRouter {
    pub fn new() -> Self {
        Self
    }

    /// Route a query given the knowledge context already retrieved for it.
    /// Returns an ordered, de-duplicated agent list; `[DataAnalysis]` when
    /// nothing matches.
    pub fn route(&self, query: &str, context: &[String]) -> Vec<AgentKind> {
        let mut haystack = query.to_lowercase();
        for ctx in context {
            haystack.push(' ');
            haystack.push_str(&ctx.to_lowercase());
        }

        let mut agents = Vec::new();
        if contains_any(&haystack, LAB_KEYWORDS) {
            agents.push(AgentKind::LabCaseManager);
        }
        if contains_any(&haystack, ANALYSIS_KEYWORDS) || contains_any(&haystack, ADVICE_KEYWORDS) {
            if !agents.contains(&AgentKind::DataAnalysis) {
                agents.push(AgentKind::DataAnalysis);
            }
        }

        if agents.is_empty() {
            agents.push(AgentKind::DataAnalysis);
        }
        agents
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

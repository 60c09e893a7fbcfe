use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use practice_brain::data_source::StaticDataSource;
use practice_brain::metrics::MetricGoals;
use practice_brain::orchestrator::Orchestrator;
use practice_brain::retrieval::{InMemoryKnowledgeStore, KnowledgeStore, SupabaseKnowledgeStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "practice-brain")]
#[command(about = "Practice insight assistant: KPI analysis, lab cases, recommendations")]
struct Args {
    /// The question in natural language
    query: String,

    /// Path to a JSON goal table (defaults to built-in goals)
    #[arg(short, long)]
    goals: Option<PathBuf>,

    /// Supabase project URL (or set SUPABASE_URL); offline store when unset
    #[arg(long)]
    supabase_url: Option<String>,

    /// Supabase anon key (or set SUPABASE_ANON_KEY)
    #[arg(long)]
    supabase_key: Option<String>,

    /// Emit the full response as JSON instead of the readable report
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    info!("practice-brain starting");
    info!("Query: {}", args.query);

    let goals = MetricGoals::load(args.goals.as_deref())?;

    let supabase_url = args
        .supabase_url
        .or_else(|| std::env::var("SUPABASE_URL").ok());
    let supabase_key = args
        .supabase_key
        .or_else(|| std::env::var("SUPABASE_ANON_KEY").ok());

    let store: Arc<dyn KnowledgeStore> = match (supabase_url, supabase_key) {
        (Some(url), Some(key)) => {
            info!("using Supabase knowledge store");
            Arc::new(SupabaseKnowledgeStore::new(url, key))
        }
        _ => {
            info!("no Supabase credentials, using offline knowledge store");
            Arc::new(InMemoryKnowledgeStore::new())
        }
    };

    let data_source = Arc::new(StaticDataSource::new(Utc::now().date_naive()));
    let orchestrator = Orchestrator::new(store, data_source, goals);

    let response = orchestrator.handle_query(&args.query).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", response);
    }

    Ok(())
}

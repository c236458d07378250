//! Implementations of the `generate`, `refine` and `check` commands.

use anyhow::{Context, Result};
use bookgraph_core::llm::{CompletionGateway, MockGateway, OpenAiGateway, RetryingGateway, Shape};
use bookgraph_core::types::MAX_RATING;
use bookgraph_core::{Feedback, KnowledgeGraph, Link, Node, SessionSnapshot, StructuralIssue};
use bookgraph_refine::{
    refine, ModelSelection, RefinementController, RefinementOutcome, RefinementPolicy,
    SummaryCache,
};
use std::path::Path;
use std::sync::Arc;

use crate::cli::Command;
use crate::config::BookgraphConfig;

/// Builds the gateway selected by the configuration.
///
/// The live gateway is wrapped in the retry decorator.
pub fn build_gateway(config: &BookgraphConfig) -> Result<Arc<dyn CompletionGateway>> {
    if config.llm.use_mock {
        tracing::info!("Using mock completion gateway");
        return Ok(Arc::new(mock_gateway()));
    }

    let openai = OpenAiGateway::new(config.openai_config()?)?;
    tracing::info!(base_url = %config.llm.base_url, "Using OpenAI-compatible gateway");
    Ok(Arc::new(RetryingGateway::with_policy(
        Arc::new(openai),
        config.retry_policy(),
    )))
}

/// Offline gateway answering every graph request with the same small graph
/// and every rating request with a middling score.
pub fn mock_gateway() -> MockGateway {
    let graph = KnowledgeGraph::new("Sample graph", "Canned offline answer")
        .with_node(Node::new(1, "Protagonist", "The main character"))
        .with_node(Node::new(2, "Conflict", "What stands in the way"))
        .with_node(Node::new(3, "Resolution", "How it ends"))
        .with_link(Link::new(1, "faces", 1, 2, "the hero represents the struggle"))
        .with_link(Link::new(2, "leads to", 2, 3, "the struggle represents change"));
    let feedback = Feedback {
        rating: 7,
        opinion: "Readable, could use more concepts".to_string(),
    };

    MockGateway::default()
        .with_default(KnowledgeGraph::NAME, serde_json::to_value(graph).unwrap_or_default())
        .with_default(Feedback::NAME, serde_json::to_value(feedback).unwrap_or_default())
}

/// Runs a non-config command.
pub async fn run(command: Command, config: &BookgraphConfig) -> Result<()> {
    let cache = SummaryCache::new(config.cache.capacity);

    match command {
        Command::Generate { book, model, output } => {
            let gateway = build_gateway(config)?;
            let model = model.unwrap_or_else(|| config.refine.generation_model.clone());
            let graph = generate(gateway.as_ref(), &cache, &book, &model).await?;
            write_output(&serde_json::to_string_pretty(&graph)?, output.as_deref())
        }
        Command::Refine {
            book,
            iterations,
            target_rating,
            generation_model,
            rating_model,
            num_ratings,
            output,
        } => {
            let mut policy = config.refinement_policy().with_num_ratings(num_ratings);
            if let Some(iterations) = iterations {
                policy.max_iterations = iterations;
            }
            if let Some(target) = target_rating {
                anyhow::ensure!(
                    target <= MAX_RATING,
                    "--target-rating must be between 0 and {MAX_RATING}"
                );
                policy.target_rating = Some(target);
            }
            let mut models = config.models();
            if let Some(model) = generation_model {
                models.generation = model;
            }
            if let Some(model) = rating_model {
                models.rating = model;
            }

            let gateway = build_gateway(config)?;
            let (outcome, snapshot) = refine_book(gateway, &book, &policy, &models).await?;
            eprintln!(
                "Refined '{book}': {} improvement(s), final rating {}/{MAX_RATING}{}",
                outcome.iterations,
                outcome.final_rating,
                if outcome.reached_target { ", target reached" } else { "" }
            );
            write_output(&snapshot.to_json_pretty()?, output.as_deref())
        }
        Command::Check { file } => {
            let issues = check_file(&file)?;
            if issues.is_empty() {
                println!("{}: well formed", file.display());
                return Ok(());
            }
            for issue in &issues {
                println!("{}: {issue}", file.display());
            }
            anyhow::bail!("{} structural issue(s) found", issues.len())
        }
        Command::Config { .. } => {
            anyhow::bail!("config commands are handled before configuration is loaded")
        }
    }
}

/// One-shot summary graph through the shared summary cache.
pub async fn generate(
    gateway: &dyn CompletionGateway,
    cache: &SummaryCache,
    book: &str,
    model: &str,
) -> Result<KnowledgeGraph> {
    let graph = cache
        .get_or_generate(book, model, gateway)
        .await
        .with_context(|| format!("generating a graph for '{book}'"))?;
    log_issues(&graph);

    let stats = cache.stats().await;
    tracing::debug!(
        hits = stats.hits,
        misses = stats.misses,
        entries = stats.entries,
        "Summary cache"
    );
    Ok(graph)
}

/// Runs a full refinement session and returns its outcome and history.
///
/// On failure the partial history is logged before the error is returned.
pub async fn refine_book(
    gateway: Arc<dyn CompletionGateway>,
    book: &str,
    policy: &RefinementPolicy,
    models: &ModelSelection,
) -> Result<(RefinementOutcome, SessionSnapshot)> {
    let mut controller = RefinementController::new(book, gateway);
    match refine(&mut controller, policy, models).await {
        Ok(outcome) => Ok((outcome, controller.snapshot())),
        Err(e) => {
            tracing::error!(
                session_id = %controller.session_id(),
                history_len = controller.len(),
                error = %e,
                "Refinement run failed"
            );
            Err(e).with_context(|| format!("refining the graph for '{book}'"))
        }
    }
}

/// Loads a graph file and returns its structural issues.
pub fn check_file(path: &Path) -> Result<Vec<StructuralIssue>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let graph: KnowledgeGraph = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a knowledge graph", path.display()))?;
    Ok(graph.structural_issues())
}

fn log_issues(graph: &KnowledgeGraph) {
    for issue in graph.structural_issues() {
        tracing::warn!(graph = %graph.name, %issue, "Structural issue");
    }
}

fn write_output(json: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), "Wrote output");
        }
        None => println!("{json}"),
    }
    Ok(())
}

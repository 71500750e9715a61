//! Knowledge base CLI commands: add, seed, search, remove.
//!
//! Mutating commands save the snapshot before returning.

use std::path::Path;

use anyhow::{Context, Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use storytailor_types::document::{DocumentId, NewDocument};

use super::{spinner, truncate};
use crate::state::AppState;

/// Add one fact, or one fact per non-empty line of `file`.
///
/// # Examples
///
/// ```bash
/// storytailor add "Rabbits can run up to 70 km/h." --source "Animal Encyclopedia"
/// storytailor add --file facts.txt --source "Class notes"
/// ```
pub async fn add(
    state: &AppState,
    text: Option<&str>,
    file: Option<&Path>,
    source: &str,
    json: bool,
) -> Result<()> {
    let texts = match (text, file) {
        (Some(text), _) => vec![text.to_string()],
        (None, Some(path)) => {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            facts_from_lines(&content)
        }
        (None, None) => bail!("either a fact or --file is required"),
    };
    if texts.is_empty() {
        bail!("no facts to add");
    }

    let documents: Vec<NewDocument> = texts
        .into_iter()
        .map(|t| NewDocument::new(t, source))
        .collect();

    let before = state.document_count().await;
    let progress = spinner("Embedding facts...", json);
    let added = state.service.add(&documents).await;
    progress.finish_and_clear();
    let added = state.persist(before, added).await?;

    if json {
        let out: Vec<_> = added
            .iter()
            .map(|d| serde_json::json!({ "id": d.id, "source": d.source, "text": d.text }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    for doc in &added {
        println!(
            "  {} {} {}",
            style("+").green().bold(),
            style(doc.id).dim(),
            truncate(&doc.text, 60)
        );
    }
    println!();
    println!(
        "  Added {} fact{} from '{}'",
        style(added.len()).bold(),
        if added.len() == 1 { "" } else { "s" },
        style(source).cyan()
    );
    println!();
    Ok(())
}

/// Add the built-in starter facts.
pub async fn seed(state: &AppState, json: bool) -> Result<()> {
    let before = state.document_count().await;
    let progress = spinner("Seeding knowledge base...", json);
    let added = state.service.seed_defaults().await;
    progress.finish_and_clear();
    let added = state.persist(before, added).await?;

    if json {
        println!("{}", serde_json::json!({ "added": added }));
        return Ok(());
    }

    println!();
    if added == 0 {
        println!(
            "  {} Starter facts already present.",
            style("i").blue().bold()
        );
    } else {
        println!(
            "  {} Added {} starter facts.",
            style("✓").green().bold(),
            style(added).bold()
        );
    }
    println!();
    Ok(())
}

/// Show the facts most similar to `query` with their scores, optionally
/// from one source only.
pub async fn search(
    state: &AppState,
    query: &str,
    limit: usize,
    source: Option<&str>,
    json: bool,
) -> Result<()> {
    let progress = spinner("Searching...", json);
    let results = match source {
        Some(source) => state.service.retrieve_from(query, limit, source).await,
        None => state.service.retrieve(query, limit).await,
    };
    progress.finish_and_clear();
    let results = results?;

    if json {
        let out: Vec<_> = results
            .iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.document.id,
                    "source": r.document.source,
                    "text": r.document.text,
                    "score": r.score,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if results.is_empty() {
        println!();
        match source {
            Some(source) => println!(
                "  {} No facts from '{}'.",
                style("i").blue().bold(),
                style(source).cyan()
            ),
            None => println!(
                "  {} Knowledge base is empty. Try 'storytailor seed'.",
                style("i").blue().bold()
            ),
        }
        println!();
        return Ok(());
    }

    let min_relevance = state.service.config().verification.min_relevance;
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Score").fg(Color::White),
        Cell::new("Fact").fg(Color::White),
        Cell::new("Source").fg(Color::White),
        Cell::new("Id").fg(Color::White),
    ]);

    for r in &results {
        let score_color = if r.score >= min_relevance {
            Color::Green
        } else if r.score > 0.0 {
            Color::Yellow
        } else {
            Color::DarkGrey
        };
        let id = r.document.id.to_string();
        table.add_row(vec![
            Cell::new(format!("{:.3}", r.score)).fg(score_color),
            Cell::new(truncate(&r.document.text, 60)),
            Cell::new(&r.document.source).fg(Color::Cyan),
            Cell::new(&id[..8]).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("  Results for '{}'", style(query).cyan().bold());
    println!();
    println!("{table}");
    println!();
    Ok(())
}

/// Delete a fact by its full id.
pub async fn remove(state: &AppState, id: &str, json: bool) -> Result<()> {
    let id: DocumentId = id
        .parse()
        .with_context(|| format!("'{id}' is not a document id"))?;

    let Some(removed) = state.service.remove(&id).await else {
        bail!("no document with id '{id}'");
    };
    state.save().await?;

    if json {
        println!("{}", serde_json::json!({ "removed": removed.id }));
        return Ok(());
    }

    println!();
    println!(
        "  {} Removed {}",
        style("✓").green().bold(),
        truncate(&removed.text, 60)
    );
    println!();
    Ok(())
}

/// Trimmed non-empty lines; `#` starts a comment line.
fn facts_from_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_owned)
        .collect()
}

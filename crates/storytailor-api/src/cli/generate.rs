//! Grounded story generation command.
//!
//! Ctrl+C cancels the request in flight instead of killing the process, so
//! the orchestrator logs the cancellation and nothing is half-written.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use tokio_util::sync::CancellationToken;

use storytailor_types::error::GroundingError;
use storytailor_types::story::{GeneratedStoryResult, StoryRequest};

use super::{GenerateArgs, spinner, truncate};
use crate::state::AppState;

/// Build the story request described by the command-line arguments.
pub fn build_request(args: &GenerateArgs) -> StoryRequest {
    let mut request = StoryRequest::new(args.age).with_preferences(args.preferences.clone());
    if let Some(goal) = &args.goal {
        request = request.with_learning_goal(goal.clone());
    }
    request.reading_level = args.reading_level;
    if args.no_grounding {
        request = request.ungrounded();
    }
    request
}

pub async fn generate(state: &AppState, args: &GenerateArgs, json: bool, quiet: bool) -> Result<()> {
    let request = build_request(args);

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let progress = spinner("Writing story...", json || quiet);
    let result = state
        .service
        .generate_story_with_grounding(&request, &cancel)
        .await;
    progress.finish_and_clear();
    ctrl_c.abort();

    let result = match result {
        Ok(result) => result,
        Err(GroundingError::Cancelled) => {
            if !quiet {
                eprintln!("  {}", style("Cancelled.").yellow());
            }
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let threshold = state.service.config().verification.verify_threshold;
    print_story(&result, threshold, quiet);
    Ok(())
}

fn print_story(result: &GeneratedStoryResult, threshold: f64, quiet: bool) {
    println!();
    println!("{}", result.story_text.trim());
    println!();
    if quiet {
        return;
    }

    println!("  {}", style("── Grounding ──").dim());
    if result.sources.is_empty() {
        println!("  Sources:    {}", style("none").dim());
    } else {
        println!("  Sources:    {}", style(result.sources.join(", ")).cyan());
    }
    if result.fact_checked {
        let confidence = style(format!("{:.2}", result.confidence_score));
        let confidence = if meets_threshold(result.confidence_score, threshold) {
            confidence.green()
        } else {
            confidence.yellow()
        };
        println!("  Confidence: {confidence}");
    } else {
        println!("  Confidence: {}", style("not fact checked").dim());
    }

    if result.claims.is_empty() {
        println!();
        return;
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Claim").fg(Color::White),
        Cell::new("Verified").fg(Color::White),
        Cell::new("Confidence").fg(Color::White),
        Cell::new("Source").fg(Color::White),
    ]);
    for claim in &result.claims {
        let verified = if claim.verdict.verified {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(truncate(&claim.claim, 50)),
            verified,
            Cell::new(format!("{:.2}", claim.verdict.confidence)),
            Cell::new(claim.verdict.matched_source.as_deref().unwrap_or("-")).fg(Color::Cyan),
        ]);
    }
    println!();
    println!("{table}");
    println!();
}

/// Whether a confidence reaches the configured verification threshold.
fn meets_threshold(confidence: f64, threshold: f64) -> bool {
    confidence >= threshold
}

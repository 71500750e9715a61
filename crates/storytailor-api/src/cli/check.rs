//! Fact check command.

use anyhow::Result;
use console::style;

use storytailor_types::verification::VerificationVerdict;

use super::spinner;
use crate::state::AppState;

/// Check one statement and print the verdict.
///
/// # Examples
///
/// ```bash
/// storytailor check "Rabbits can run fast"
/// ```
pub async fn check(state: &AppState, statement: &str, json: bool) -> Result<()> {
    let progress = spinner("Checking facts...", json);
    let verdict = state.service.fact_check(statement).await;
    progress.finish_and_clear();
    let verdict = verdict?;

    if json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
        return Ok(());
    }

    let threshold = state.service.config().verification.verify_threshold;
    print_verdict(statement, &verdict, threshold);
    Ok(())
}

fn print_verdict(statement: &str, verdict: &VerificationVerdict, threshold: f64) {
    let mark = if verdict.verified {
        style("✓ supported").green().bold()
    } else {
        style("✗ unsupported").red().bold()
    };

    println!();
    println!("  {}", style(statement).bold());
    println!();
    println!(
        "  {mark}  confidence {:.2} (threshold {threshold:.2})",
        verdict.confidence
    );
    if let Some(source) = &verdict.matched_source {
        println!("  Source:   {}", style(source).cyan());
    }
    if let Some(evidence) = &verdict.evidence_text {
        println!("  Evidence: {}", style(evidence).dim());
    }
    println!("  {}", style(&verdict.message).dim());
    println!();
}

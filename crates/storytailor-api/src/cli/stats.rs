//! Knowledge base summary command.

use anyhow::Result;
use console::style;

use crate::state::AppState;

pub async fn stats(state: &AppState, json: bool) -> Result<()> {
    let stats = state.service.stats().await;
    let config = state.service.config();

    if json {
        let out = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "knowledge": stats,
            "embedding_model": state.service.store().embedding_model(),
            "generator": state.service.generator_name(),
            "verify_threshold": config.verification.verify_threshold,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} StoryTailor v{}",
        style("📚").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("  {}", style("── Knowledge ──").dim());
    println!("  Documents:  {}", style(stats.total_documents).bold());
    println!("  Sources:    {}", style(stats.sources.len()).bold());
    for source in &stats.sources {
        println!("              {}", style(source).cyan());
    }
    println!("  Dimension:  {}", stats.dimension);
    println!();
    println!("  {}", style("── Backends ──").dim());
    println!(
        "  Embedder:   {}",
        state.service.store().embedding_model().unwrap_or("-")
    );
    println!("  Generator:  {}", state.service.generator_name());
    println!(
        "  Threshold:  {:.2} (min relevance {:.2})",
        config.verification.verify_threshold, config.verification.min_relevance
    );
    println!();
    println!(
        "  {}",
        style(format!("Data: {}", state.data_dir.display())).dim()
    );
    println!();
    Ok(())
}

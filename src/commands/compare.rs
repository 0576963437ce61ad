use anyhow::{Context, Result};

use blogmate::analytics::KeywordComparisonService;
use blogmate::config::Config;
use blogmate::utils::truncate_text;

use super::build_fetcher;

/// Failure reasons are cut to this many characters in the listing
const MAX_ERROR_CHARS: usize = 80;

pub async fn compare(config: &Config, keywords: Vec<String>, json: bool) -> Result<()> {
    let service = KeywordComparisonService::new(build_fetcher(config));
    let result = service
        .compare(&keywords)
        .await
        .context("Keyword comparison failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{}", result.to_summary());

    if !result.trends.is_empty() {
        println!("\n순위:");
        for (rank, series) in result.ranking() {
            println!(
                "{rank}. {} - {:.1}점 ({}, 모멘텀 {:+.1}%)",
                series.keyword(),
                series.total_score(),
                series.direction().korean_name(),
                series.momentum()
            );
        }
    }

    for failed in &result.failed {
        println!("실패: {} ({})", failed.keyword, truncate_text(&failed.error, MAX_ERROR_CHARS));
    }

    Ok(())
}

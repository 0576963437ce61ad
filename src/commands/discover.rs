use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use blogmate::cache::CacheManager;
use blogmate::config::Config;
use blogmate::discovery::{DiscoveryOptions, SmartDiscoveryService};
use blogmate::fetcher::BatchProcessor;
use blogmate::generators::KeywordExpander;
use blogmate::models::Grade;
use blogmate::progress::StageCallback;

use super::{build_autocomplete, build_fetcher};

/// Arguments of the `discover` command
#[derive(Debug, Clone)]
pub struct DiscoverParams {
    pub seed: String,
    pub min_grade: Option<Grade>,
    pub no_autocomplete: bool,
    pub no_cache: bool,
    pub top: usize,
    pub json: bool,
}

pub async fn discover(config: &Config, params: DiscoverParams, cancel: CancellationToken) -> Result<()> {
    let expander = KeywordExpander::new(config.discovery.max_variants, build_autocomplete(config));
    let batch = BatchProcessor::new(
        build_fetcher(config),
        config.discovery.batch_size,
        config.batch_delay(),
    );
    let cache = CacheManager::open(&config.cache.dir, config.cache_ttl())
        .map_err(blogmate::error::Error::from)
        .context("Failed to open cache directory")?;
    let mut service = SmartDiscoveryService::new(expander, batch, cache);

    let options = DiscoveryOptions {
        use_autocomplete: !params.no_autocomplete,
        min_grade: params.min_grade.unwrap_or(config.discovery.default_min_grade),
        use_cache: config.discovery.use_cache && !params.no_cache,
        cancellation: cancel,
    };

    if !params.json {
        println!("Smart Discovery: \"{}\"", params.seed);
        println!("================================");
    }

    // Progress goes to stderr so --json output stays parseable
    let callback: StageCallback = Box::new(|stage, step, total, percent| {
        eprintln!("[{percent:>5.1}%] ({step}/{total}) {stage}");
    });

    let result = service
        .discover(&params.seed, &options, Some(callback))
        .await
        .context("Smart discovery failed")?;

    if params.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("\n{}", result.to_summary());

    let top = result.top_opportunities(params.top);
    if top.is_empty() {
        println!("\n'{}' 등급 이상의 키워드가 없습니다.", options.min_grade);
        return Ok(());
    }

    println!("\n상위 {}개 키워드:\n", top.len());
    for (i, opportunity) in top.iter().enumerate() {
        println!("{}. {}", i + 1, opportunity.to_summary());
        println!("   {}", opportunity.grade_reason());
        println!();
    }

    Ok(())
}

use anyhow::{Context, Result};

use blogmate::cache::CacheManager;
use blogmate::config::Config;
use blogmate::utils::{format_bytes, truncate_text};

/// Keywords longer than this are shortened in the listing
const MAX_KEYWORD_CHARS: usize = 40;

fn open(config: &Config) -> Result<CacheManager> {
    CacheManager::open(&config.cache.dir, config.cache_ttl())
        .map_err(blogmate::error::Error::from)
        .context("Failed to open cache directory")
}

pub fn cache_stats(config: &Config, json: bool) -> Result<()> {
    let cache = open(config)?;
    let stats = cache.stats().map_err(blogmate::error::Error::from).context("Failed to read cache statistics")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Cache Statistics");
    println!("================");
    println!("  Directory:       {}", stats.cache_dir.display());
    println!("  Total entries:   {}", stats.total_entries);
    println!("  Valid entries:   {}", stats.valid_entries);
    println!("  Expired entries: {}", stats.expired_entries);
    println!("  Size:            {}", format_bytes(stats.total_size_bytes));

    let keywords = cache.list_cached_keywords();
    if !keywords.is_empty() {
        println!("\nCached keywords:");
        for entry in keywords {
            let status = if entry.expired { "expired" } else { "valid" };
            println!(
                "  {} ({status}, expires {})",
                truncate_text(&entry.keyword, MAX_KEYWORD_CHARS),
                entry.expires_at.format("%Y-%m-%d %H:%M")
            );
        }
    }

    Ok(())
}

pub fn cache_clear(config: &Config) -> Result<()> {
    let mut cache = open(config)?;
    let removed = cache.clear_all().map_err(blogmate::error::Error::from).context("Failed to clear cache")?;
    println!("Removed {removed} cache files");
    Ok(())
}

pub fn cache_clear_expired(config: &Config) -> Result<()> {
    let mut cache = open(config)?;
    let removed = cache
        .clear_expired()
        .map_err(blogmate::error::Error::from)
        .context("Failed to clear expired cache entries")?;
    println!("Removed {removed} expired cache entries");
    Ok(())
}

//! Candidate keyword generation
//!
//! - [`longtail`] - Template variants from a fixed modifier catalog
//! - [`autocomplete`] - Search suggestions from an external source

pub mod autocomplete;
pub mod longtail;

pub use autocomplete::{Autocomplete, NaverAutocomplete, SuggestionSource};
pub use longtail::{LongTailGenerator, ModifierCategory, MODIFIER_CATALOG};

use crate::error::Result;
use crate::utils::error::ValidationError;
use crate::utils::normalize_whitespace;
use longtail::UniqueKeywords;

/// Expands a seed into at most `max_variants` candidate keywords
#[derive(Debug, Clone, Default)]
pub struct KeywordExpander {
    longtail: LongTailGenerator,
    autocomplete: Autocomplete,
}

impl KeywordExpander {
    pub fn new(max_variants: usize, autocomplete: Autocomplete) -> Self {
        Self {
            longtail: LongTailGenerator::new(max_variants),
            autocomplete,
        }
    }

    /// Expander without an autocomplete source
    pub fn templates_only(max_variants: usize) -> Self {
        Self::new(max_variants, Autocomplete::Unavailable)
    }

    pub fn max_variants(&self) -> usize {
        self.longtail.max_variants()
    }

    /// Seed, then autocomplete suggestions, then template variants
    ///
    /// Deduplicated after merging and capped at `max_variants`. Autocomplete
    /// failures only shrink the list.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty or whitespace-only seed
    pub async fn expand(&self, seed: &str, use_autocomplete: bool) -> Result<Vec<String>> {
        let seed = normalize_whitespace(seed);
        if seed.is_empty() {
            return Err(ValidationError::EmptyField("seed_keyword").into());
        }

        let suggestions = if use_autocomplete {
            self.autocomplete.suggest(&seed).await
        } else {
            Vec::new()
        };

        let mut unique = UniqueKeywords::with_limit(self.max_variants());
        unique.push(&seed);
        for suggestion in &suggestions {
            unique.push(suggestion);
        }
        for variant in LongTailGenerator::variants(&seed) {
            if !unique.push(&variant) {
                break;
            }
        }

        let keywords = unique.into_vec();
        tracing::info!(
            seed = %seed,
            suggestions = suggestions.len(),
            total = keywords.len(),
            "Expanded seed keyword"
        );
        Ok(keywords)
    }
}

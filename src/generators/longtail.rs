//! Template-based long-tail keyword generation
//!
//! A seed is combined with a fixed catalog of Korean modifiers, both in front
//! ("{modifier} {seed}") and behind ("{seed} {modifier}").

use std::collections::HashSet;

use crate::error::Result;
use crate::utils::error::ValidationError;
use crate::utils::{normalize_keyword, normalize_whitespace};

/// Modifier category with its tokens
#[derive(Debug, Clone, Copy)]
pub struct ModifierCategory {
    pub name: &'static str,
    pub modifiers: &'static [&'static str],
}

/// Ordered modifier catalog
pub const MODIFIER_CATALOG: &[ModifierCategory] = &[
    ModifierCategory {
        name: "how_to",
        modifiers: &["방법", "하는법", "팁", "가이드", "노하우", "요령"],
    },
    ModifierCategory {
        name: "review",
        modifiers: &["후기", "리뷰", "사용법", "장단점", "실사용", "경험담"],
    },
    ModifierCategory {
        name: "comparison",
        modifiers: &["비교", "추천", "차이", "순위", "베스트", "랭킹"],
    },
    ModifierCategory {
        name: "problem",
        modifiers: &["해결", "오류", "안될때", "문제", "수리", "해결법"],
    },
    ModifierCategory {
        name: "timing",
        modifiers: &["시기", "타이밍", "언제", "시즌", "계절", "시점"],
    },
    ModifierCategory {
        name: "price",
        modifiers: &["가격", "가성비", "할인", "세일", "저렴한", "최저가"],
    },
    ModifierCategory {
        name: "quality",
        modifiers: &["좋은", "인기", "유명한", "인기있는", "믿을만한"],
    },
    ModifierCategory {
        name: "location",
        modifiers: &["근처", "주변", "베스트", "유명한"],
    },
    ModifierCategory {
        name: "diy",
        modifiers: &["DIY", "직접", "셀프", "만들기", "홈메이드", "수제"],
    },
    ModifierCategory {
        name: "beginner",
        modifiers: &["초보", "입문", "처음", "기초", "쉬운", "간단한"],
    },
];

/// Insertion-ordered collection that ignores case/whitespace duplicates
#[derive(Debug, Default)]
pub(crate) struct UniqueKeywords {
    seen: HashSet<String>,
    items: Vec<String>,
    limit: usize,
}

impl UniqueKeywords {
    pub(crate) fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Add a keyword; returns false once the limit is reached
    pub(crate) fn push(&mut self, keyword: &str) -> bool {
        if self.is_full() {
            return false;
        }
        let display = normalize_whitespace(keyword);
        if display.is_empty() {
            return true;
        }
        if self.seen.insert(normalize_keyword(&display)) {
            self.items.push(display);
        }
        !self.is_full()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.items.len() >= self.limit
    }

    pub(crate) fn into_vec(self) -> Vec<String> {
        self.items
    }
}

/// Generates long-tail variants of a seed keyword
#[derive(Debug, Clone)]
pub struct LongTailGenerator {
    max_variants: usize,
}

impl Default for LongTailGenerator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_VARIANTS)
    }
}

impl LongTailGenerator {
    pub const DEFAULT_MAX_VARIANTS: usize = 30;

    pub fn new(max_variants: usize) -> Self {
        Self {
            max_variants: max_variants.max(1),
        }
    }

    pub fn max_variants(&self) -> usize {
        self.max_variants
    }

    /// Template variants in catalog order
    ///
    /// Categories are visited round-robin (first modifier of every category,
    /// then the second, ...) so a capped list still spans the whole catalog.
    pub fn variants(seed: &str) -> impl Iterator<Item = String> + '_ {
        let rounds = MODIFIER_CATALOG
            .iter()
            .map(|c| c.modifiers.len())
            .max()
            .unwrap_or(0);

        (0..rounds).flat_map(move |round| {
            MODIFIER_CATALOG
                .iter()
                .filter_map(move |category| category.modifiers.get(round))
                .flat_map(move |modifier| [format!("{modifier} {seed}"), format!("{seed} {modifier}")])
        })
    }

    /// Seed followed by template variants, deduplicated and capped
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty or whitespace-only seed
    pub fn generate(&self, seed: &str) -> Result<Vec<String>> {
        let seed = normalize_whitespace(seed);
        if seed.is_empty() {
            return Err(ValidationError::EmptyField("seed_keyword").into());
        }

        let mut unique = UniqueKeywords::with_limit(self.max_variants);
        unique.push(&seed);
        for variant in Self::variants(&seed) {
            if !unique.push(&variant) {
                break;
            }
        }

        let result = unique.into_vec();
        tracing::debug!(seed = %seed, count = result.len(), "Generated long-tail variants");
        Ok(result)
    }

    /// Variants for several seeds, deduplicated across seeds (each seed capped separately)
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty list or an empty seed
    pub fn generate_from_multiple(&self, seeds: &[String]) -> Result<Vec<String>> {
        if seeds.is_empty() {
            return Err(ValidationError::NoKeywords.into());
        }

        let mut unique = UniqueKeywords::with_limit(self.max_variants * seeds.len());
        for seed in seeds {
            for variant in self.generate(seed)? {
                unique.push(&variant);
            }
        }
        Ok(unique.into_vec())
    }

    /// Drop keywords shorter than `min_chars` characters
    pub fn filter_by_quality(keywords: Vec<String>, min_chars: usize) -> Vec<String> {
        keywords
            .into_iter()
            .filter(|k| !k.trim().is_empty() && k.chars().count() >= min_chars)
            .collect()
    }
}

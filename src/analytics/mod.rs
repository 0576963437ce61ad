//! Analytics module: momentum, opportunity scoring and keyword comparison

pub mod comparison;
pub mod momentum;
pub mod opportunity;

pub use comparison::{ComparisonResult, KeywordComparisonService};
pub use momentum::MomentumCalculator;
pub use opportunity::{OpportunityScorer, BLOG_FRIENDLY_MODIFIERS};

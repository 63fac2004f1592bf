//! Prompt construction
//!
//! Turns client, campaign and ad-group inputs into the generation prompt.
//!
//! Template loading chain:
//! 1. `.adcopy/prompts/ad-copy.pmt` (user override)
//! 2. Embedded fallback in code
//!
//! Templates use Handlebars syntax. Industry-specific personas and rules come
//! from a static table keyed by normalised industry name.

mod builder;
pub mod embedded;
mod industry;

pub use builder::{PromptBuilder, PromptOptions, PromptVariables};
pub use industry::{INDUSTRY_PROFILES, IndustryProfile, normalize_industry, profile_for};

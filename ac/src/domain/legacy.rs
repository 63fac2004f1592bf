//! Adapter from loosely-typed legacy generation options
//!
//! Older callers pass flat option bags with free-text keyword lists and
//! optional everything. This is the single place where such a bag becomes
//! a [`GenerationRequest`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::request::{AdGroupContext, CampaignContext, ClientProfile, GenerationRequest};

/// Defaults applied when a legacy bag omits model settings
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDefaults {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            model: "openai:gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

/// Flat option bag accepted from legacy callers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyGenerationOptions {
    #[serde(alias = "clientId")]
    pub client_id: Option<String>,
    #[serde(alias = "clientName")]
    pub client_name: Option<String>,
    #[serde(alias = "clientContext")]
    pub client_context: Option<String>,
    pub industry: Option<String>,
    #[serde(alias = "targetPersona")]
    pub target_persona: Option<String>,
    #[serde(alias = "campaignName", alias = "campaign_name")]
    pub campaign: Option<String>,
    #[serde(alias = "campaignContext")]
    pub campaign_context: Option<String>,
    #[serde(alias = "adGroupName", alias = "ad_group_name")]
    pub ad_group: Option<String>,
    /// Keywords separated by commas, semicolons or newlines
    pub keywords: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    #[serde(alias = "maxTokens")]
    pub max_tokens: Option<u32>,
}

impl LegacyGenerationOptions {
    /// Convert into a typed request, filling gaps from `defaults`
    pub fn to_request(&self, defaults: &RequestDefaults) -> GenerationRequest {
        debug!(?self.campaign, ?self.ad_group, "LegacyGenerationOptions::to_request: called");
        let keywords = split_keywords(self.keywords.as_deref().unwrap_or_default());

        GenerationRequest {
            model: non_blank(&self.model).unwrap_or_else(|| defaults.model.clone()),
            client: ClientProfile {
                id: non_blank(&self.client_id).unwrap_or_default(),
                name: non_blank(&self.client_name).unwrap_or_default(),
                description: non_blank(&self.client_context).unwrap_or_default(),
                industry: non_blank(&self.industry),
                target_persona: non_blank(&self.target_persona),
                website: None,
            },
            campaign: CampaignContext {
                name: non_blank(&self.campaign).unwrap_or_default(),
                context: non_blank(&self.campaign_context).unwrap_or_default(),
            },
            ad_group: AdGroupContext {
                name: non_blank(&self.ad_group).unwrap_or_default(),
                keywords,
            },
            industry: non_blank(&self.industry),
            target_persona: non_blank(&self.target_persona),
            temperature: self
                .temperature
                .filter(|t| (0.0..=2.0).contains(t))
                .unwrap_or(defaults.temperature),
            max_tokens: self.max_tokens.filter(|m| *m > 0).unwrap_or(defaults.max_tokens),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Split a free-text keyword list, trimming and dropping duplicates
pub(crate) fn split_keywords(raw: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    raw.split([',', ';', '\n'])
        .map(|k| k.trim().trim_matches(|c| c == '"' || c == '[' || c == ']').trim())
        .filter(|k| !k.is_empty())
        .filter(|k| seen.insert(k.to_lowercase()))
        .map(str::to_string)
        .collect()
}

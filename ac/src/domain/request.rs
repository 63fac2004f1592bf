//! Generation request types

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A client (advertiser) profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClientProfile {
    pub id: String,
    pub name: String,
    /// Free-form business description used as prompt context
    pub description: String,
    pub industry: Option<String>,
    pub target_persona: Option<String>,
    pub website: Option<String>,
}

/// Campaign the ad group belongs to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignContext {
    pub name: String,
    /// Extra campaign notes (offer, season, landing page...)
    pub context: String,
}

/// The unit at which titles and descriptions are generated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdGroupContext {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Everything needed for one generation job
///
/// Built once per row and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model identifier, optionally prefixed with the provider (`openai:gpt-4o`)
    pub model: String,
    pub client: ClientProfile,
    pub campaign: CampaignContext,
    pub ad_group: AdGroupContext,
    pub industry: Option<String>,
    pub target_persona: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationRequest {
    /// Industry from the request, falling back to the client profile
    pub fn effective_industry(&self) -> Option<&str> {
        let industry = self
            .industry
            .as_deref()
            .or(self.client.industry.as_deref())
            .filter(|s| !s.trim().is_empty());
        debug!(?industry, "GenerationRequest::effective_industry: called");
        industry
    }

    /// Target persona from the request, falling back to the client profile
    pub fn effective_persona(&self) -> Option<&str> {
        self.target_persona
            .as_deref()
            .or(self.client.target_persona.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    /// Client context paragraph used in prompts
    pub fn client_context(&self) -> String {
        match (self.client.name.trim(), self.client.description.trim()) {
            ("", "") => String::new(),
            (name, "") => name.to_string(),
            ("", description) => description.to_string(),
            (name, description) => format!("{}: {}", name, description),
        }
    }

    /// Campaign context paragraph used in prompts
    pub fn campaign_context(&self) -> String {
        if self.campaign.context.trim().is_empty() {
            self.campaign.name.clone()
        } else {
            format!("{} - {}", self.campaign.name, self.campaign.context.trim())
        }
    }
}

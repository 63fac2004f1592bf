//! Prompt builder
//!
//! Renders the ad copy template from typed variables and the industry table.

use std::path::Path;

use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, warn};

use super::embedded;
use super::industry::{IndustryProfile, profile_for};
use crate::domain::{
    GenerationRequest, MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH, MIN_DESCRIPTION_LENGTH, REQUIRED_DESCRIPTIONS,
    REQUIRED_TITLES,
};

/// Name of the ad copy template
const TEMPLATE_NAME: &str = "ad-copy";

/// Inputs of a single prompt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptVariables {
    pub client_context: String,
    pub campaign_context: String,
    pub ad_group_name: String,
    pub keywords: Vec<String>,
    pub industry: Option<String>,
    pub target_persona: Option<String>,
}

impl PromptVariables {
    /// Derive prompt variables from a generation request
    pub fn from_request(request: &GenerationRequest) -> Self {
        debug!(ad_group = %request.ad_group.name, "PromptVariables::from_request: called");
        Self {
            client_context: request.client_context(),
            campaign_context: request.campaign_context(),
            ad_group_name: request.ad_group.name.clone(),
            keywords: request.ad_group.keywords.clone(),
            industry: request.effective_industry().map(str::to_string),
            target_persona: request.effective_persona().map(str::to_string),
        }
    }
}

/// Which optional prompt sections to include
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptOptions {
    pub include_industry_specifics: bool,
    pub include_persona_adaptation: bool,
    pub enhanced_validation: bool,
    pub strict_formatting: bool,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            include_industry_specifics: true,
            include_persona_adaptation: true,
            enhanced_validation: true,
            strict_formatting: true,
        }
    }
}

/// Context handed to the template engine
#[derive(Debug, Serialize)]
struct TemplateContext<'a> {
    persona: &'a str,
    client_context: &'a str,
    campaign_context: &'a str,
    ad_group_name: &'a str,
    keywords: String,
    industry: Option<&'a str>,
    target_persona: Option<&'a str>,
    title_count: usize,
    max_title_length: usize,
    description_count: usize,
    max_description_length: usize,
    min_description_length: usize,
    industry_rules: Vec<&'static str>,
    action_verbs: String,
    urgency_tactics: String,
    value_propositions: String,
    cta_examples: String,
    enhanced_validation: bool,
    strict_formatting: bool,
}

/// Builds generation prompts
///
/// Building is pure: the template is resolved once at construction and
/// rendering never touches the filesystem.
pub struct PromptBuilder {
    hbs: Handlebars<'static>,
    template: String,
    min_description_length: usize,
}

impl PromptBuilder {
    /// Create a builder, preferring `.adcopy/prompts/ad-copy.pmt` under `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        let path = root
            .as_ref()
            .join(".adcopy")
            .join("prompts")
            .join(format!("{}.pmt", TEMPLATE_NAME));
        debug!(?path, "PromptBuilder::new: called");

        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(template) => {
                    debug!(?path, "PromptBuilder::new: found user override");
                    return Self::with_template(template);
                }
                Err(e) => {
                    warn!(?path, error = %e, "PromptBuilder::new: failed to read override, using embedded");
                }
            }
        } else {
            debug!("PromptBuilder::new: no user override");
        }
        Self::embedded_only()
    }

    /// Create a builder that only uses the embedded template
    pub fn embedded_only() -> Self {
        debug!("PromptBuilder::embedded_only: called");
        Self::with_template(embedded::AD_COPY)
    }

    /// Create a builder from template text
    pub fn with_template(template: impl Into<String>) -> Self {
        let mut hbs = Handlebars::new();
        // Prompts are plain text, HTML escaping would mangle quotes
        hbs.register_escape_fn(handlebars::no_escape);
        Self {
            hbs,
            template: template.into(),
            min_description_length: MIN_DESCRIPTION_LENGTH,
        }
    }

    /// Override the minimum description length stated in the prompt
    pub fn with_min_description_length(mut self, min: usize) -> Self {
        self.min_description_length = min;
        self
    }

    /// System message to send alongside the prompt
    pub fn system_message(&self) -> &'static str {
        embedded::SYSTEM_MESSAGE
    }

    /// Build the prompt
    ///
    /// Never fails: a template render error falls back to an inline prompt.
    pub fn build(&self, vars: &PromptVariables, options: &PromptOptions) -> String {
        debug!(ad_group = %vars.ad_group_name, industry = ?vars.industry, ?options, "PromptBuilder::build: called");
        let profile = profile_for(vars.industry.as_deref());
        let context = self.context(vars, options, profile);

        match self.hbs.render_template(&self.template, &context) {
            Ok(prompt) => {
                debug!(len = prompt.len(), "PromptBuilder::build: rendered template");
                prompt
            }
            Err(e) => {
                warn!(error = %e, "PromptBuilder::build: template render failed, using inline prompt");
                self.fallback(&context)
            }
        }
    }

    fn context<'a>(
        &self,
        vars: &'a PromptVariables,
        options: &PromptOptions,
        profile: &'static IndustryProfile,
    ) -> TemplateContext<'a> {
        let keywords: Vec<&str> = vars
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect();
        let keywords = if keywords.is_empty() {
            vars.ad_group_name.clone()
        } else {
            keywords.join(", ")
        };

        let industry_rules = if options.include_industry_specifics {
            profile.rules.to_vec()
        } else {
            debug!("PromptBuilder::context: industry specifics disabled");
            Vec::new()
        };

        let target_persona = if options.include_persona_adaptation {
            vars.target_persona.as_deref().filter(|p| !p.trim().is_empty())
        } else {
            None
        };

        TemplateContext {
            persona: profile.persona,
            client_context: vars.client_context.trim(),
            campaign_context: vars.campaign_context.trim(),
            ad_group_name: vars.ad_group_name.trim(),
            keywords,
            industry: vars.industry.as_deref(),
            target_persona,
            title_count: REQUIRED_TITLES,
            max_title_length: MAX_TITLE_LENGTH,
            description_count: REQUIRED_DESCRIPTIONS,
            max_description_length: MAX_DESCRIPTION_LENGTH,
            min_description_length: self.min_description_length,
            industry_rules,
            action_verbs: profile.action_verbs.join(", "),
            urgency_tactics: profile.urgency_tactics.join(", "),
            value_propositions: profile.value_propositions.join(", "),
            cta_examples: profile
                .cta_examples
                .iter()
                .map(|c| format!("- {}", c))
                .collect::<Vec<_>>()
                .join("\n"),
            enhanced_validation: options.enhanced_validation,
            strict_formatting: options.strict_formatting,
        }
    }

    fn fallback(&self, context: &TemplateContext<'_>) -> String {
        format!(
            "{persona}\n\nWrite Google Ads copy for the ad group \"{ad_group}\" (keywords: {keywords}).\n\
             Produce exactly {titles} titles of at most {max_title} characters and exactly {descriptions} \
             descriptions of at most {max_description} characters.\n\
             Respond with a single JSON object: {{\"titles\": [...], \"descriptions\": [...]}}",
            persona = context.persona,
            ad_group = context.ad_group_name,
            keywords = context.keywords,
            titles = context.title_count,
            max_title = context.max_title_length,
            descriptions = context.description_count,
            max_description = context.max_description_length,
        )
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::embedded_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::profile_for;
    use tempfile::TempDir;

    fn running_vars() -> PromptVariables {
        PromptVariables {
            client_context: "Stride: independent running store".to_string(),
            campaign_context: "Spring sale".to_string(),
            ad_group_name: "Running shoes".to_string(),
            keywords: vec!["running shoes".to_string(), "marathon".to_string(), "trail".to_string()],
            industry: Some("e-commerce".to_string()),
            target_persona: None,
        }
    }

    #[test]
    fn test_ecommerce_prompt_contains_persona_and_urgency() {
        let prompt = PromptBuilder::embedded_only().build(&running_vars(), &PromptOptions::default());
        let profile = profile_for(Some("e-commerce"));

        assert!(prompt.contains(profile.persona));
        assert!(profile.urgency_tactics.iter().any(|t| prompt.contains(t)));
        assert!(prompt.contains("running shoes, marathon, trail"));
    }

    #[test]
    fn test_sections_in_order() {
        let prompt = PromptBuilder::embedded_only().build(&running_vars(), &PromptOptions::default());
        let order = [
            "You are an e-commerce",
            "## Business context",
            "## Mission",
            "## Hard technical constraints",
            "## Industry rules",
            "## Call-to-action examples",
            "## Output format",
        ];
        let positions: Vec<usize> = order.iter().map(|s| prompt.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{:?}", positions);
    }

    #[test]
    fn test_constraints_stated() {
        let prompt = PromptBuilder::embedded_only().build(&running_vars(), &PromptOptions::default());
        assert!(prompt.contains("Exactly 15 titles, each at most 30 characters"));
        assert!(prompt.contains("Exactly 4 descriptions, each at most 90 characters"));
        assert!(prompt.contains("at least 55 characters"));
        assert!(prompt.contains("{\"titles\": [\"...\", \"...\"], \"descriptions\": [\"...\", \"...\"]}"));
    }

    #[test]
    fn test_unknown_industry_uses_default() {
        let mut vars = running_vars();
        vars.industry = Some("quantum knitting".to_string());
        let prompt = PromptBuilder::embedded_only().build(&vars, &PromptOptions::default());
        assert!(prompt.contains(profile_for(None).persona));
    }

    #[test]
    fn test_persona_section_toggle() {
        let mut vars = running_vars();
        vars.target_persona = Some("amateur runners over 40".to_string());
        let builder = PromptBuilder::embedded_only();

        let with = builder.build(&vars, &PromptOptions::default());
        assert!(with.contains("## Audience"));
        assert!(with.contains("amateur runners over 40"));

        let options = PromptOptions {
            include_persona_adaptation: false,
            ..Default::default()
        };
        let without = builder.build(&vars, &options);
        assert!(!without.contains("## Audience"));
    }

    #[test]
    fn test_industry_section_toggle() {
        let options = PromptOptions {
            include_industry_specifics: false,
            ..Default::default()
        };
        let prompt = PromptBuilder::embedded_only().build(&running_vars(), &options);
        assert!(!prompt.contains("## Industry rules"));
        // Persona sentence is always present
        assert!(prompt.contains(profile_for(Some("e-commerce")).persona));
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = PromptBuilder::embedded_only();
        let a = builder.build(&running_vars(), &PromptOptions::default());
        let b = builder.build(&running_vars(), &PromptOptions::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_broken_template_falls_back() {
        let builder = PromptBuilder::with_template("{{#if persona}} never closed");
        let prompt = builder.build(&running_vars(), &PromptOptions::default());
        assert!(prompt.contains(profile_for(Some("e-commerce")).persona));
        assert!(prompt.contains("exactly 15 titles"));
        assert!(prompt.contains("{\"titles\": [...], \"descriptions\": [...]}"));
    }

    #[test]
    fn test_user_override_template() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".adcopy").join("prompts");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("ad-copy.pmt"), "Ads for {{ad_group_name}}").unwrap();

        let prompt = PromptBuilder::new(temp.path()).build(&running_vars(), &PromptOptions::default());
        assert_eq!(prompt, "Ads for Running shoes");
    }

    #[test]
    fn test_from_request() {
        use crate::domain::{AdGroupContext, CampaignContext, ClientProfile};

        let request = GenerationRequest {
            model: "openai:gpt-4o-mini".to_string(),
            client: ClientProfile {
                name: "Stride".to_string(),
                industry: Some("retail".to_string()),
                ..Default::default()
            },
            campaign: CampaignContext {
                name: "Spring".to_string(),
                context: String::new(),
            },
            ad_group: AdGroupContext {
                name: "Trail".to_string(),
                keywords: vec!["trail shoes".to_string()],
            },
            industry: None,
            target_persona: None,
            temperature: 0.7,
            max_tokens: 2000,
        };

        let vars = PromptVariables::from_request(&request);
        assert_eq!(vars.client_context, "Stride");
        assert_eq!(vars.industry.as_deref(), Some("retail"));
        assert_eq!(vars.ad_group_name, "Trail");
    }
}

//! Domain types shared by every stage of the generation pipeline

mod content;
mod legacy;
mod request;

pub use content::{
    AdCopy, ContentMetadata, GeneratedContent, MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH, MIN_DESCRIPTION_LENGTH,
    REQUIRED_DESCRIPTIONS, REQUIRED_TITLES,
};
pub use legacy::{LegacyGenerationOptions, RequestDefaults};
pub use request::{AdGroupContext, CampaignContext, ClientProfile, GenerationRequest};

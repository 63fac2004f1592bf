//! Cache key derivation

use tracing::debug;

use crate::domain::GenerationRequest;
use crate::llm::split_model_id;
use crate::prompts::normalize_industry;

/// Keywords that take part in the key
const KEY_KEYWORDS: usize = 3;

/// Derive the cache key of a request
///
/// Only the normalised industry, the first three sorted keywords, the model
/// name without provider prefix and whether a persona is set contribute.
pub fn cache_key(request: &GenerationRequest) -> String {
    let fingerprint = fingerprint(request);
    let key = format!("gen_{}", to_base36(rolling_hash(&fingerprint).unsigned_abs()));
    debug!(%fingerprint, %key, "cache_key: called");
    key
}

/// Human-readable string the key is hashed from
pub fn fingerprint(request: &GenerationRequest) -> String {
    let industry = request
        .effective_industry()
        .map(normalize_industry)
        .unwrap_or_else(|| "general".to_string());

    let mut keywords: Vec<String> = request
        .ad_group
        .keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    keywords.sort();
    keywords.truncate(KEY_KEYWORDS);

    let (_, model) = split_model_id(&request.model);
    let has_persona = request.effective_persona().is_some();

    format!(
        "{}|{}|{}|{}",
        industry,
        keywords.join(","),
        model.trim().to_lowercase(),
        has_persona
    )
}

/// 31-multiplier rolling hash over characters, wrapping at 32 bits
fn rolling_hash(text: &str) -> i32 {
    text.chars()
        .fold(0i32, |hash, c| hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(c as i32))
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AdGroupContext, CampaignContext, ClientProfile};

    fn request(keywords: &[&str]) -> GenerationRequest {
        GenerationRequest {
            model: "openai:gpt-4o-mini".to_string(),
            client: ClientProfile::default(),
            campaign: CampaignContext::default(),
            ad_group: AdGroupContext {
                name: "Shoes".to_string(),
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
            },
            industry: Some("E-commerce".to_string()),
            target_persona: None,
            temperature: 0.7,
            max_tokens: 2000,
        }
    }

    #[test]
    fn test_rolling_hash_known_values() {
        assert_eq!(rolling_hash(""), 0);
        assert_eq!(rolling_hash("a"), 97);
        assert_eq!(rolling_hash("ab"), 97 * 31 + 98);
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn test_fingerprint_normalisation() {
        let req = request(&["Trail", " marathon ", "running shoes", "zebra"]);
        assert_eq!(fingerprint(&req), "e-commerce|marathon,running shoes,trail|gpt-4o-mini|false");
    }

    #[test]
    fn test_key_format() {
        let key = cache_key(&request(&["trail"]));
        assert!(key.starts_with("gen_"));
        assert!(key[4..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_key_ignores_provider_prefix_and_unrelated_fields() {
        let a = request(&["trail", "marathon"]);
        let mut b = a.clone();
        b.model = "gpt-4o-mini".to_string();
        b.temperature = 0.2;
        b.campaign.name = "Other".to_string();
        assert_eq!(cache_key(&a), cache_key(&b));
    }

    #[test]
    fn test_key_depends_on_persona_and_model() {
        let a = request(&["trail"]);
        let mut b = a.clone();
        b.target_persona = Some("runners".to_string());
        assert_ne!(cache_key(&a), cache_key(&b));

        let mut c = a.clone();
        c.model = "anthropic:claude-sonnet-4".to_string();
        assert_ne!(cache_key(&a), cache_key(&c));
    }
}

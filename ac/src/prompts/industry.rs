//! Industry copywriting profiles
//!
//! Static table of per-industry personas and copy rules. Lookups normalise
//! the industry name and fall back to the `default` profile.

use tracing::debug;

/// Copywriting guidance for one industry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndustryProfile {
    pub key: &'static str,
    pub persona: &'static str,
    pub rules: &'static [&'static str],
    pub action_verbs: &'static [&'static str],
    pub urgency_tactics: &'static [&'static str],
    pub value_propositions: &'static [&'static str],
    pub cta_examples: &'static [&'static str],
}

const DEFAULT: IndustryProfile = IndustryProfile {
    key: "default",
    persona: "You are a senior Google Ads copywriter who turns search intent into clicks with clear, benefit-led ads.",
    rules: &[
        "Lead with the benefit the searcher cares about most",
        "Mirror the searcher's keywords naturally in headlines",
        "Give every description a clear next step",
        "Prefer concrete numbers over vague claims",
    ],
    action_verbs: &["Discover", "Get", "Try", "Start", "Save"],
    urgency_tactics: &["Limited-time offer", "Book today", "Spots are filling fast"],
    value_propositions: &["Trusted by thousands", "Fast, friendly service", "Quality guaranteed"],
    cta_examples: &["Get a free quote", "Learn more today", "Contact us now"],
};

const ECOMMERCE: IndustryProfile = IndustryProfile {
    key: "e-commerce",
    persona: "You are an e-commerce performance copywriter who writes product ads that convert browsers into buyers.",
    rules: &[
        "Name the product category and a standout feature",
        "Mention shipping, returns or price advantages when relevant",
        "Use urgency tied to stock or promotions, never fake scarcity",
        "Keep a shopping tone: concrete, visual, price-aware",
    ],
    action_verbs: &["Shop", "Buy", "Order", "Discover", "Save"],
    urgency_tactics: &["Free shipping ends soon", "While stocks last", "Today only"],
    value_propositions: &["Free returns", "Fast delivery", "Best price guaranteed", "Secure checkout"],
    cta_examples: &["Shop now", "Order today", "Browse the collection"],
};

const SAAS: IndustryProfile = IndustryProfile {
    key: "saas",
    persona: "You are a B2B SaaS demand-generation copywriter who makes software outcomes tangible in a few words.",
    rules: &[
        "Sell the outcome (time saved, revenue gained), not the feature list",
        "Mention a free trial or demo when the offer allows it",
        "Address the buyer's role and pain point directly",
    ],
    action_verbs: &["Automate", "Streamline", "Try", "Scale", "Boost"],
    urgency_tactics: &["Start your free trial today", "Set up in minutes", "Join this week's demo"],
    value_propositions: &["No credit card required", "Cancel anytime", "Integrates with your tools"],
    cta_examples: &["Start free trial", "Book a demo", "See pricing"],
};

const HEALTHCARE: IndustryProfile = IndustryProfile {
    key: "healthcare",
    persona: "You are a healthcare marketing copywriter who writes reassuring, compliant ads that build patient trust.",
    rules: &[
        "Never promise cures or guaranteed medical outcomes",
        "Emphasise qualified professionals and patient care",
        "Highlight convenience: appointments, location, availability",
    ],
    action_verbs: &["Book", "Consult", "Schedule", "Meet", "Care"],
    urgency_tactics: &["Appointments available this week", "Same-day visits", "Book online in 2 minutes"],
    value_propositions: &["Certified practitioners", "Covered by most insurers", "Patient-first care"],
    cta_examples: &["Book an appointment", "Call our clinic", "Schedule a consultation"],
};

const FINANCE: IndustryProfile = IndustryProfile {
    key: "finance",
    persona: "You are a financial services copywriter who writes precise, trustworthy ads that respect regulation.",
    rules: &[
        "State rates and fees accurately or not at all",
        "Lead with security, clarity and expertise",
        "Avoid absolute promises about returns",
    ],
    action_verbs: &["Compare", "Invest", "Apply", "Grow", "Protect"],
    urgency_tactics: &["Rates updated today", "Apply in 5 minutes", "Offer valid this month"],
    value_propositions: &["Regulated and secure", "Transparent fees", "Expert advisors"],
    cta_examples: &["Get your rate", "Apply online", "Speak to an advisor"],
};

const REAL_ESTATE: IndustryProfile = IndustryProfile {
    key: "real-estate",
    persona: "You are a real-estate copywriter who makes listings and agencies stand out in local searches.",
    rules: &[
        "Name the location early",
        "Highlight property type, size or standout amenity",
        "Invite a visit or valuation as the next step",
    ],
    action_verbs: &["Visit", "Find", "Sell", "Value", "Move"],
    urgency_tactics: &["New listings this week", "Book a viewing today", "Free valuation this month"],
    value_propositions: &["Local market experts", "Free home valuation", "Hundreds of listings"],
    cta_examples: &["Book a viewing", "Get a free valuation", "See listings"],
};

const EDUCATION: IndustryProfile = IndustryProfile {
    key: "education",
    persona: "You are an education marketing copywriter who inspires learners to enrol with clear, motivating ads.",
    rules: &[
        "Name the skill or qualification gained",
        "Mention format and duration (online, part-time, weeks)",
        "Speak to career or personal outcomes",
    ],
    action_verbs: &["Learn", "Enrol", "Master", "Join", "Train"],
    urgency_tactics: &["Enrolment closes soon", "Next session starts Monday", "Few seats left"],
    value_propositions: &["Certified courses", "Learn at your own pace", "Expert instructors"],
    cta_examples: &["Enrol today", "Download the syllabus", "Join a free class"],
};

const TRAVEL: IndustryProfile = IndustryProfile {
    key: "travel",
    persona: "You are a travel copywriter who sells escapes with vivid, deal-aware ads.",
    rules: &[
        "Name the destination or experience",
        "Pair emotion with a concrete deal or inclusion",
        "Mention flexibility (free cancellation) when offered",
    ],
    action_verbs: &["Explore", "Book", "Escape", "Discover", "Fly"],
    urgency_tactics: &["Last-minute deals", "Book by Sunday", "Limited rooms left"],
    value_propositions: &["Free cancellation", "Best price guarantee", "All-inclusive packages"],
    cta_examples: &["Book your trip", "See deals", "Plan your escape"],
};

const LOCAL_SERVICES: IndustryProfile = IndustryProfile {
    key: "local-services",
    persona: "You are a local-services copywriter who wins urgent, nearby customers with direct, credible ads.",
    rules: &[
        "Name the service and the area served",
        "Stress availability and response time",
        "Use trust signals: licensed, insured, reviews",
    ],
    action_verbs: &["Call", "Book", "Fix", "Hire", "Request"],
    urgency_tactics: &["Available 24/7", "Same-day service", "Call now for a fast quote"],
    value_propositions: &["Licensed and insured", "Upfront pricing", "5-star local reviews"],
    cta_examples: &["Call now", "Request a quote", "Book a visit"],
};

/// All profiles, default last
pub const INDUSTRY_PROFILES: &[IndustryProfile] = &[
    ECOMMERCE,
    SAAS,
    HEALTHCARE,
    FINANCE,
    REAL_ESTATE,
    EDUCATION,
    TRAVEL,
    LOCAL_SERVICES,
    DEFAULT,
];

/// Normalise an industry name to a profile key
pub fn normalize_industry(industry: &str) -> String {
    let normalized: String = industry
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() || c == '_' { '-' } else { c })
        .collect();

    let key = match normalized.as_str() {
        "ecommerce" | "e-commerce" | "retail" | "online-retail" | "shop" | "commerce" => "e-commerce",
        "saas" | "software" | "tech" | "technology" | "b2b-software" => "saas",
        "healthcare" | "health" | "medical" | "sante" | "santé" | "wellness" => "healthcare",
        "finance" | "financial-services" | "banking" | "insurance" | "fintech" => "finance",
        "real-estate" | "realestate" | "property" | "immobilier" => "real-estate",
        "education" | "training" | "e-learning" | "formation" => "education",
        "travel" | "tourism" | "hospitality" | "voyage" => "travel",
        "local-services" | "services" | "home-services" | "trades" => "local-services",
        other => other,
    };
    key.to_string()
}

/// Look up a profile; unknown or missing industries map to `default`
pub fn profile_for(industry: Option<&str>) -> &'static IndustryProfile {
    let key = industry.map(normalize_industry).unwrap_or_default();
    let profile = INDUSTRY_PROFILES
        .iter()
        .find(|p| p.key == key)
        .unwrap_or(&INDUSTRY_PROFILES[INDUSTRY_PROFILES.len() - 1]);
    debug!(?industry, profile = profile.key, "profile_for: called");
    profile
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_aliases() {
        assert_eq!(normalize_industry("E-Commerce"), "e-commerce");
        assert_eq!(normalize_industry(" ecommerce "), "e-commerce");
        assert_eq!(normalize_industry("Real Estate"), "real-estate");
        assert_eq!(normalize_industry("real_estate"), "real-estate");
        assert_eq!(normalize_industry("Technology"), "saas");
        assert_eq!(normalize_industry("Underwater basket weaving"), "underwater-basket-weaving");
    }

    #[test]
    fn test_profile_lookup_and_fallback() {
        assert_eq!(profile_for(Some("retail")).key, "e-commerce");
        assert_eq!(profile_for(Some("unknown")).key, "default");
        assert_eq!(profile_for(None).key, "default");
    }

    #[test]
    fn test_profiles_are_well_formed() {
        for profile in INDUSTRY_PROFILES {
            assert!((3..=5).contains(&profile.rules.len()), "{} rules", profile.key);
            assert!(!profile.persona.is_empty());
            assert!(!profile.action_verbs.is_empty());
            assert!(!profile.urgency_tactics.is_empty());
            assert!(!profile.value_propositions.is_empty());
            assert!(!profile.cta_examples.is_empty());
        }
        assert_eq!(INDUSTRY_PROFILES.last().unwrap().key, "default");
    }
}

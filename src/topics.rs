//! Keyword-based topic tagging of extracted policies.
//!
//! Maps a policy line to the general-plan elements it touches via a static
//! keyword table. Purely lexical; a policy matching no element is tagged
//! "Other".

/// General-plan elements and the keywords that signal them. Keywords are
/// matched as lowercase substrings, so stems like "evacuat" cover
/// "evacuate", "evacuation", etc.
pub const ELEMENT_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Land Use",
        &[
            "rural", "land use", "distance", "zoning", "slope", "development", "agriculture",
            "urban", "reserve", "line", "boundary", "buffer", "ordinance", "gateway", "road",
            "building",
        ],
    ),
    (
        "Circulation",
        &[
            "circulation", "travel", "transportation", "route", "traffic", "pedestrian", "vehic",
            "rider", "flexible", "parking", "bike", "trail", "connection", "transit", "walk",
            "shuttle",
        ],
    ),
    (
        "Safety",
        &[
            "safety", "evacuation", "fire", "wildfire", "emergency", "danger", "hazard", "fuel",
            "flood", "dam", "tank", "landslide", "voltage", "electric", "displace", "care",
            "shelter", "storm", "geolog", "fault", "seismic", "liquefaction", "safe", "respond",
            "operat", "assist", "leak",
        ],
    ),
    (
        "Wildfire",
        &[
            "emergency", "evacuat", "fire", "hazard", "disaster", "fuel", "flood", "resistant",
            "equipment", "suppression", "hydrant", "defensible", "preserv", "protection",
            "sprinkler", "danger", "gas", "ignition",
        ],
    ),
    (
        "Noise",
        &[
            "noise", "sensitive", "exposure", "generat", "barrier", "sound", "separat",
            "reduction", "nlr",
        ],
    ),
    (
        "Housing",
        &[
            "housing", "residential", "apartments", "dwelling", "family", "story", "unit",
            "density", "affordable", "rent", "condo", "income", "loan", "living", "habita",
            "homeless", "shelter",
        ],
    ),
    ("Agriculture", &["agriculture", "farming", "crops", "farm"]),
];

/// Tag a policy line with every element whose keyword list it matches,
/// falling back to "Other" when nothing matches.
pub fn tag_policy_topics(text: &str) -> Vec<&'static str> {
    let text_lower = text.to_lowercase();
    let tags: Vec<&'static str> = ELEMENT_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| text_lower.contains(kw)))
        .map(|(element, _)| *element)
        .collect();

    if tags.is_empty() {
        vec!["Other"]
    } else {
        tags
    }
}

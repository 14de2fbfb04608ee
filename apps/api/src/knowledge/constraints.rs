//! Plausibility constraints derived from categorical options.
//!
//! Constraints only bias generation: they are rendered into the context block
//! and used for an advisory post-hoc check. They never reject or rewrite output.

use serde::{Deserialize, Serialize};

/// Expected physical traits for an ethnicity key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthnicityTraits {
    pub key: String,
    pub typical_eyes: &'static [&'static str],
    pub typical_hair: &'static [&'static str],
}

/// Lighting vocabulary associated with a director or cinematic school.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorStyle {
    pub key: &'static str,
    pub description: &'static str,
    pub lighting_keywords: &'static [&'static str],
    pub color_palette: &'static [&'static str],
    pub mood: &'static str,
}

/// Expected vocabulary for one categorical key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintRule {
    Ethnicity(EthnicityTraits),
    Director(&'static DirectorStyle),
}

const FALLBACK_EYES: &[&str] = &["brown"];
const FALLBACK_HAIR: &[&str] = &["black"];

const ETHNICITY_TRAITS: &[(&str, &[&str], &[&str])] = &[
    (
        "East_Asian",
        &["black", "dark brown", "brown"],
        &["black", "dark brown"],
    ),
    (
        "Southeast_Asian",
        &["dark brown", "brown", "black"],
        &["black", "dark brown"],
    ),
    (
        "South_Asian",
        &["dark brown", "brown", "black"],
        &["black", "dark brown"],
    ),
    (
        "European",
        &["blue", "green", "brown", "hazel", "grey"],
        &["blonde", "brown", "black", "red", "auburn"],
    ),
    (
        "African",
        &["dark brown", "black", "brown"],
        &["black", "dark brown"],
    ),
    (
        "Middle_Eastern",
        &["brown", "dark brown", "hazel", "black"],
        &["black", "dark brown", "brown"],
    ),
    (
        "Latin_American",
        &["brown", "dark brown", "hazel", "green"],
        &["black", "dark brown", "brown"],
    ),
];

const DIRECTOR_STYLES: &[DirectorStyle] = &[
    DirectorStyle {
        key: "zhang_yimou",
        description: "Zhang Yimou cinema",
        lighting_keywords: &[
            "dramatic shadows",
            "rim lighting",
            "chiaroscuro",
            "high contrast",
            "volumetric light",
        ],
        color_palette: &["rich red", "gold", "deep shadows"],
        mood: "epic, theatrical, emotionally intense",
    },
    DirectorStyle {
        key: "wong_kar_wai",
        description: "Wong Kar-wai cinema",
        lighting_keywords: &[
            "neon glow",
            "saturated colors",
            "moody lighting",
            "color bleeding",
        ],
        color_palette: &["cyan", "magenta", "warm yellow"],
        mood: "nostalgic, melancholic, romantic",
    },
    DirectorStyle {
        key: "tsui_hark",
        description: "Tsui Hark wuxia",
        lighting_keywords: &["dynamic lighting", "flowing motion", "misty atmosphere"],
        color_palette: &["jade green", "misty white", "golden"],
        mood: "wuxia, martial arts, ethereal",
    },
    DirectorStyle {
        key: "cinematic",
        description: "cinematic film quality",
        lighting_keywords: &[
            "cinematic lighting",
            "film grain",
            "anamorphic lens flare",
            "shallow DOF",
        ],
        color_palette: &["natural tones", "film color grading"],
        mood: "professional, polished, theatrical",
    },
    DirectorStyle {
        key: "film_noir",
        description: "film noir",
        lighting_keywords: &[
            "low key lighting",
            "high contrast",
            "deep shadows",
            "venetian blind shadows",
        ],
        color_palette: &["black", "white", "grey"],
        mood: "mysterious, dramatic, suspenseful",
    },
];

/// Display label → internal key, covering ethnicity, director and design-style labels.
const LABEL_KEYS: &[(&str, &str)] = &[
    ("东亚", "East_Asian"),
    ("东南亚", "Southeast_Asian"),
    ("欧美", "European"),
    ("南亚", "South_Asian"),
    ("非洲", "African"),
    ("中东", "Middle_Eastern"),
    ("拉美", "Latin_American"),
    ("电影级", "cinematic"),
    ("张艺谋", "zhang_yimou"),
    ("王家卫", "wong_kar_wai"),
    ("徐克", "tsui_hark"),
    ("黑色电影", "film_noir"),
    ("温馨可爱", "cozy_cute"),
    ("现代简约", "modern_minimal"),
];

/// Translates a display label to its internal key. Unmapped labels pass through.
pub fn normalize(label: &str) -> &str {
    LABEL_KEYS
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, key)| *key)
        .unwrap_or(label)
}

/// Eye/hair vocabulary for an ethnicity key, with a generic fallback for unknown keys.
pub fn ethnicity_traits(key: &str) -> EthnicityTraits {
    let (eyes, hair) = ETHNICITY_TRAITS
        .iter()
        .find(|(k, _, _)| *k == key)
        .map(|(_, eyes, hair)| (*eyes, *hair))
        .unwrap_or((FALLBACK_EYES, FALLBACK_HAIR));

    EthnicityTraits {
        key: key.to_string(),
        typical_eyes: eyes,
        typical_hair: hair,
    }
}

pub fn director_style(key: &str) -> Option<&'static DirectorStyle> {
    DIRECTOR_STYLES.iter().find(|s| s.key == key)
}

/// Constraint rule for any categorical key. Director keys win; anything else is
/// treated as an ethnicity and falls back to the generic trait set.
pub fn constraints_for(key: &str) -> ConstraintRule {
    match director_style(key) {
        Some(style) => ConstraintRule::Director(style),
        None => ConstraintRule::Ethnicity(ethnicity_traits(key)),
    }
}

fn is_known_ethnicity(key: &str) -> bool {
    ETHNICITY_TRAITS.iter().any(|(k, _, _)| *k == key)
}

/// Renders the constraints block body for the ethnicity-like and style-like
/// options. Returns an empty string when neither yields a rule.
pub fn build_constraints_block(ethnicity: Option<&str>, style: Option<&str>) -> String {
    let mut lines = Vec::new();

    if let Some(label) = ethnicity {
        if let ConstraintRule::Ethnicity(traits) = constraints_for(normalize(label)) {
            lines.push(format!(
                "Ethnicity: {} - typical eye colors: {}; typical hair colors: {}",
                traits.key,
                take_joined(traits.typical_eyes, 3),
                take_joined(traits.typical_hair, 2),
            ));
        }
    }

    if let Some(label) = style {
        if let ConstraintRule::Director(info) = constraints_for(normalize(label)) {
            lines.push(format!(
                "Style: {} - lighting: {}; palette: {}; mood: {}",
                info.description,
                take_joined(info.lighting_keywords, 3),
                take_joined(info.color_palette, 2),
                info.mood,
            ));
        }
    }

    lines.join("\n")
}

fn take_joined(terms: &[&str], n: usize) -> String {
    terms.iter().take(n).copied().collect::<Vec<_>>().join(", ")
}

// ────────────────────────────────────────────────────────────────────────────
// Advisory consistency check
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyIssue {
    EthnicityEyeMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencySeverity {
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyWarning {
    pub kind: ConsistencyIssue,
    pub severity: ConsistencySeverity,
    pub message: String,
    pub suggestion: String,
}

/// Eye colours worth flagging when absent from an ethnicity's typical set.
const CHECKED_EYE_COLORS: &[&str] = &["blue", "green", "violet", "grey", "hazel"];

/// Scans generated text for eye colours implausible for the selected ethnicity.
/// Unknown ethnicities are not checked. Non-blocking.
pub fn check_consistency(ethnicity_label: &str, generated: &str) -> Vec<ConsistencyWarning> {
    let key = normalize(ethnicity_label);
    if !is_known_ethnicity(key) {
        return Vec::new();
    }

    let traits = ethnicity_traits(key);
    let text = generated.to_lowercase();

    CHECKED_EYE_COLORS
        .iter()
        .filter(|color| !traits.typical_eyes.contains(*color))
        .map(|color| format!("{color} eyes"))
        .filter(|phrase| text.contains(phrase.as_str()))
        .map(|phrase| ConsistencyWarning {
            kind: ConsistencyIssue::EthnicityEyeMismatch,
            severity: ConsistencySeverity::Warning,
            message: format!("'{phrase}' is atypical for {key}"),
            suggestion: format!("Consider: {} eyes", take_joined(traits.typical_eyes, 2)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_maps_known_labels() {
        assert_eq!(normalize("东亚"), "East_Asian");
        assert_eq!(normalize("王家卫"), "wong_kar_wai");
        assert_eq!(normalize("现代简约"), "modern_minimal");
    }

    #[test]
    fn test_normalize_is_identity_for_unknown() {
        assert_eq!(normalize("East_Asian"), "East_Asian");
        assert_eq!(normalize("something else"), "something else");
    }

    #[test]
    fn test_unknown_ethnicity_uses_fallback() {
        let traits = ethnicity_traits("Martian");
        assert_eq!(traits.typical_eyes, &["brown"]);
        assert_eq!(traits.typical_hair, &["black"]);
    }

    #[test]
    fn test_constraints_for_prefers_director_table() {
        match constraints_for("film_noir") {
            ConstraintRule::Director(style) => assert_eq!(style.mood, "mysterious, dramatic, suspenseful"),
            other => panic!("expected director rule, got {other:?}"),
        }
        assert!(matches!(
            constraints_for("African"),
            ConstraintRule::Ethnicity(_)
        ));
    }

    #[test]
    fn test_east_asian_block_mentions_only_dark_eyes() {
        let block = build_constraints_block(Some("East_Asian"), None);
        assert!(block.contains("black, dark brown, brown"));
        assert!(!block.contains("blue"));
        assert!(!block.contains("green"));
    }

    #[test]
    fn test_localized_ethnicity_label_is_normalized() {
        let block = build_constraints_block(Some("东亚"), None);
        assert!(block.starts_with("Ethnicity: East_Asian"));
    }

    #[test]
    fn test_unknown_style_is_omitted() {
        assert_eq!(build_constraints_block(None, Some("写实")), "");
    }

    #[test]
    fn test_style_block_lists_lighting_and_mood() {
        let block = build_constraints_block(None, Some("电影级"));
        assert!(block.contains("cinematic lighting, film grain, anamorphic lens flare"));
        assert!(block.contains("mood: professional, polished, theatrical"));
    }

    #[test]
    fn test_consistency_flags_blue_eyes_for_east_asian() {
        let warnings = check_consistency("东亚", "young woman, Blue Eyes, black hair");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, ConsistencyIssue::EthnicityEyeMismatch);
        assert_eq!(warnings[0].severity, ConsistencySeverity::Warning);
    }

    #[test]
    fn test_consistency_accepts_typical_eyes() {
        assert!(check_consistency("East_Asian", "dark brown eyes, almond eyes").is_empty());
        assert!(check_consistency("European", "green eyes, auburn hair").is_empty());
    }

    #[test]
    fn test_consistency_skips_unknown_ethnicity() {
        assert!(check_consistency("Martian", "violet eyes").is_empty());
    }
}

//! Generation domains and the element categories that matter for each.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the five supported generation contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Portrait,
    Art,
    Design,
    Product,
    Video,
}

impl Domain {
    pub const ALL: [Domain; 5] = [
        Domain::Portrait,
        Domain::Art,
        Domain::Design,
        Domain::Product,
        Domain::Video,
    ];

    /// Key used for `domain_id` in the fragment store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Portrait => "portrait",
            Domain::Art => "art",
            Domain::Design => "design",
            Domain::Product => "product",
            Domain::Video => "video",
        }
    }

    /// Natural-language name used in the instruction preamble.
    pub fn description(&self) -> &'static str {
        match self {
            Domain::Portrait => "portrait photography",
            Domain::Art => "artistic painting",
            Domain::Design => "graphic design",
            Domain::Product => "product photography",
            Domain::Video => "video scene",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown domain '{s}'"))
    }
}

/// Natural-language name for a raw domain key; unknown keys get a generic label.
pub fn describe_domain(domain: &str) -> &'static str {
    domain
        .parse::<Domain>()
        .map(|d| d.description())
        .unwrap_or("general visual")
}

const PORTRAIT_CATEGORIES: &[&str] = &[
    "gender",
    "ethnicity",
    "age_range",
    "eye_types",
    "hair_colors",
    "hair_styles",
    "skin_tones",
    "skin_textures",
    "face_shapes",
    "makeup_styles",
    "clothing_styles",
    "expressions",
    "poses",
    "lighting_techniques",
    "backgrounds",
    "photography_techniques",
];

const ART_CATEGORIES: &[&str] = &[
    "art_styles",
    "techniques",
    "color_palettes",
    "compositions",
    "brush_strokes",
    "textures",
    "moods",
    "subjects",
];

const DESIGN_CATEGORIES: &[&str] = &[
    "design_types",
    "color_schemes",
    "typography",
    "layouts",
    "visual_effects",
    "backgrounds",
    "decorative_elements",
];

const PRODUCT_CATEGORIES: &[&str] = &[
    "product_types",
    "lighting_setups",
    "backgrounds",
    "angles",
    "compositions",
    "materials",
    "reflections",
];

const VIDEO_CATEGORIES: &[&str] = &[
    "camera_movements",
    "transitions",
    "effects",
    "moods",
    "pacing",
    "color_grading",
    "lighting_techniques",
];

/// Ordered core categories for a domain key. Empty for unknown domains.
pub fn categories_for(domain: &str) -> &'static [&'static str] {
    match domain.parse::<Domain>() {
        Ok(Domain::Portrait) => PORTRAIT_CATEGORIES,
        Ok(Domain::Art) => ART_CATEGORIES,
        Ok(Domain::Design) => DESIGN_CATEGORIES,
        Ok(Domain::Product) => PRODUCT_CATEGORIES,
        Ok(Domain::Video) => VIDEO_CATEGORIES,
        Err(_) => &[],
    }
}

//! Typed per-domain generation options.
//!
//! Every option is a [`Choice`]: either `Auto` (unconstrained, omitted from
//! context and search) or a concrete value. On the wire `"auto"`, `"自动"`,
//! an empty string, `null` and a missing field all mean `Auto`.

use serde::{Deserialize, Serialize};

use crate::knowledge::domain::Domain;

const AUTO_LABELS: &[&str] = &["auto", "自动"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Choice {
    #[default]
    Auto,
    Value(String),
}

impl Choice {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || AUTO_LABELS.iter().any(|a| a.eq_ignore_ascii_case(trimmed)) {
            Choice::Auto
        } else {
            Choice::Value(trimmed.to_string())
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Choice::Auto => None,
            Choice::Value(v) => Some(v.as_str()),
        }
    }
}

impl From<Option<String>> for Choice {
    fn from(raw: Option<String>) -> Self {
        raw.as_deref().map(Choice::parse).unwrap_or_default()
    }
}

impl From<Choice> for Option<String> {
    fn from(choice: Choice) -> Self {
        match choice {
            Choice::Auto => None,
            Choice::Value(v) => Some(v),
        }
    }
}

impl From<&str> for Choice {
    fn from(raw: &str) -> Self {
        Choice::parse(raw)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortraitOptions {
    pub gender: Choice,
    pub ethnicity: Choice,
    pub style: Choice,
    pub lighting: Choice,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtOptions {
    pub art_style: Choice,
    pub technique: Choice,
    pub mood: Choice,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignOptions {
    pub design_type: Choice,
    #[serde(alias = "设计风格")]
    pub design_style: Choice,
    pub color_scheme: Choice,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductOptions {
    pub product_type: Choice,
    pub style: Choice,
    pub lighting: Choice,
    pub background: Choice,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoOptions {
    pub camera_movement: Choice,
    pub transition: Choice,
    pub mood: Choice,
    pub speed: Choice,
}

/// Options for one generation call; the variant fixes the domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainOptions {
    Portrait(PortraitOptions),
    Art(ArtOptions),
    Design(DesignOptions),
    Product(ProductOptions),
    Video(VideoOptions),
}

impl DomainOptions {
    /// All-`Auto` options for a domain.
    pub fn unconstrained(domain: Domain) -> Self {
        match domain {
            Domain::Portrait => DomainOptions::Portrait(PortraitOptions::default()),
            Domain::Art => DomainOptions::Art(ArtOptions::default()),
            Domain::Design => DomainOptions::Design(DesignOptions::default()),
            Domain::Product => DomainOptions::Product(ProductOptions::default()),
            Domain::Video => DomainOptions::Video(VideoOptions::default()),
        }
    }

    /// Decodes a loose JSON option map for the given domain. `null` means all `Auto`;
    /// unknown keys are ignored.
    pub fn from_json(domain: Domain, raw: serde_json::Value) -> Result<Self, serde_json::Error> {
        if raw.is_null() {
            return Ok(Self::unconstrained(domain));
        }
        Ok(match domain {
            Domain::Portrait => DomainOptions::Portrait(serde_json::from_value(raw)?),
            Domain::Art => DomainOptions::Art(serde_json::from_value(raw)?),
            Domain::Design => DomainOptions::Design(serde_json::from_value(raw)?),
            Domain::Product => DomainOptions::Product(serde_json::from_value(raw)?),
            Domain::Video => DomainOptions::Video(serde_json::from_value(raw)?),
        })
    }

    pub fn domain(&self) -> Domain {
        match self {
            DomainOptions::Portrait(_) => Domain::Portrait,
            DomainOptions::Art(_) => Domain::Art,
            DomainOptions::Design(_) => Domain::Design,
            DomainOptions::Product(_) => Domain::Product,
            DomainOptions::Video(_) => Domain::Video,
        }
    }

    /// Every option field in declaration order, including `Auto` ones.
    pub fn fields(&self) -> Vec<(&'static str, &Choice)> {
        match self {
            DomainOptions::Portrait(o) => vec![
                ("gender", &o.gender),
                ("ethnicity", &o.ethnicity),
                ("style", &o.style),
                ("lighting", &o.lighting),
            ],
            DomainOptions::Art(o) => vec![
                ("art_style", &o.art_style),
                ("technique", &o.technique),
                ("mood", &o.mood),
            ],
            DomainOptions::Design(o) => vec![
                ("design_type", &o.design_type),
                ("design_style", &o.design_style),
                ("color_scheme", &o.color_scheme),
            ],
            DomainOptions::Product(o) => vec![
                ("product_type", &o.product_type),
                ("style", &o.style),
                ("lighting", &o.lighting),
                ("background", &o.background),
            ],
            DomainOptions::Video(o) => vec![
                ("camera_movement", &o.camera_movement),
                ("transition", &o.transition),
                ("mood", &o.mood),
                ("speed", &o.speed),
            ],
        }
    }

    /// Non-`Auto` options in declaration order.
    pub fn selected(&self) -> Vec<(&'static str, &str)> {
        self.fields()
            .into_iter()
            .filter_map(|(name, choice)| choice.value().map(|v| (name, v)))
            .collect()
    }

    fn find(&self, field: &str) -> Option<&str> {
        self.fields()
            .into_iter()
            .find(|(name, _)| *name == field)
            .and_then(|(_, choice)| choice.value())
    }

    /// The ethnicity-like option, when the domain has one and it is set.
    pub fn ethnicity(&self) -> Option<&str> {
        self.find("ethnicity")
    }

    /// The style-like option: `style`, falling back to `lighting`.
    pub fn style(&self) -> Option<&str> {
        self.find("style").or_else(|| self.find("lighting"))
    }

    /// The design-style option, only present on the design domain.
    pub fn design_style(&self) -> Option<&str> {
        self.find("design_style")
    }
}

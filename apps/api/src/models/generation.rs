use serde::{Deserialize, Serialize};

/// One of the four independent output renderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    NaturalEn,
    NaturalCn,
    JsonEn,
    JsonCn,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::NaturalEn,
        Channel::NaturalCn,
        Channel::JsonEn,
        Channel::JsonCn,
    ];

    /// Name used inside the `=== name ===` delimiter.
    pub fn name(&self) -> &'static str {
        match self {
            Channel::NaturalEn => "natural_en",
            Channel::NaturalCn => "natural_cn",
            Channel::JsonEn => "json_en",
            Channel::JsonCn => "json_cn",
        }
    }

    pub fn delimiter(&self) -> String {
        format!("=== {} ===", self.name())
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Channel::JsonEn | Channel::JsonCn)
    }

    /// What the model is asked to produce for this channel.
    pub fn requirement(&self) -> &'static str {
        match self {
            Channel::NaturalEn => "English natural-language prompt (comma-separated descriptive phrases)",
            Channel::NaturalCn => "Chinese natural-language prompt (comma-separated descriptive phrases, written in Chinese)",
            Channel::JsonEn => "English structured JSON prompt",
            Channel::JsonCn => "Chinese structured JSON prompt (keys and values in Chinese)",
        }
    }

    pub fn from_name(name: &str) -> Option<Channel> {
        Channel::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// Which channels the caller wants. Defaults to English natural language only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSelection {
    #[serde(default = "default_true", rename = "output_natural_en")]
    pub natural_en: bool,
    #[serde(default, rename = "output_natural_cn")]
    pub natural_cn: bool,
    #[serde(default, rename = "output_json_en")]
    pub json_en: bool,
    #[serde(default, rename = "output_json_cn")]
    pub json_cn: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ChannelSelection {
    fn default() -> Self {
        Self {
            natural_en: true,
            natural_cn: false,
            json_en: false,
            json_cn: false,
        }
    }
}

impl ChannelSelection {
    pub fn all() -> Self {
        Self {
            natural_en: true,
            natural_cn: true,
            json_en: true,
            json_cn: true,
        }
    }

    pub fn none() -> Self {
        Self {
            natural_en: false,
            natural_cn: false,
            json_en: false,
            json_cn: false,
        }
    }

    pub fn contains(&self, channel: Channel) -> bool {
        match channel {
            Channel::NaturalEn => self.natural_en,
            Channel::NaturalCn => self.natural_cn,
            Channel::JsonEn => self.json_en,
            Channel::JsonCn => self.json_cn,
        }
    }

    /// Requested channels in canonical order.
    pub fn requested(&self) -> Vec<Channel> {
        Channel::ALL
            .into_iter()
            .filter(|c| self.contains(*c))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.requested().is_empty()
    }
}

/// Fixed four-slot output. Unrequested or unparseable channels are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    #[serde(rename = "prompt_natural_en")]
    pub natural_en: String,
    #[serde(rename = "prompt_natural_cn")]
    pub natural_cn: String,
    #[serde(rename = "prompt_json_en")]
    pub json_en: String,
    #[serde(rename = "prompt_json_cn")]
    pub json_cn: String,
}

impl GenerationResult {
    pub fn get(&self, channel: Channel) -> &str {
        match channel {
            Channel::NaturalEn => &self.natural_en,
            Channel::NaturalCn => &self.natural_cn,
            Channel::JsonEn => &self.json_en,
            Channel::JsonCn => &self.json_cn,
        }
    }

    pub fn set(&mut self, channel: Channel, value: String) {
        let slot = match channel {
            Channel::NaturalEn => &mut self.natural_en,
            Channel::NaturalCn => &mut self.natural_cn,
            Channel::JsonEn => &mut self.json_en,
            Channel::JsonCn => &mut self.json_cn,
        };
        *slot = value;
    }
}

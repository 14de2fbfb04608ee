use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Raw `elements` row as stored by the external fragment-store builder.
#[derive(Debug, Clone, FromRow)]
pub struct FragmentRow {
    pub element_id: String,
    pub domain_id: String,
    pub category_id: String,
    pub name: String,
    pub chinese_name: Option<String>,
    pub ai_prompt_template: Option<String>,
    pub keywords: Option<String>,
    pub reusability_score: Option<f64>,
}

/// A reusable prompt snippet tied to a domain/category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub id: String,
    pub domain: String,
    pub category: String,
    pub name: String,
    pub localized_name: Option<String>,
    pub template_text: String,
    pub keywords: Vec<String>,
    pub reusability_score: f64,
}

impl Fragment {
    /// Localized name when present, otherwise the canonical name.
    pub fn display_name(&self) -> &str {
        self.localized_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.name)
    }
}

impl From<FragmentRow> for Fragment {
    fn from(row: FragmentRow) -> Self {
        Fragment {
            id: row.element_id,
            domain: row.domain_id,
            category: row.category_id,
            name: row.name,
            localized_name: row.chinese_name,
            template_text: row.ai_prompt_template.unwrap_or_default(),
            keywords: decode_keywords(row.keywords.as_deref().unwrap_or("")),
            reusability_score: row.reusability_score.unwrap_or(0.0).max(0.0),
        }
    }
}

/// The keywords column holds either a JSON array or a comma-separated list.
pub fn decode_keywords(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }
    if let Ok(list) = serde_json::from_str::<Vec<String>>(raw) {
        return list;
    }
    raw.split([',', '，'])
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> FragmentRow {
        FragmentRow {
            element_id: "portrait_001".to_string(),
            domain_id: "portrait".to_string(),
            category_id: "lighting_techniques".to_string(),
            name: "rim_light".to_string(),
            chinese_name: Some("轮廓光".to_string()),
            ai_prompt_template: Some("rim lighting, glowing edges".to_string()),
            keywords: Some("[\"rim\", \"backlight\"]".to_string()),
            reusability_score: Some(0.9),
        }
    }

    #[test]
    fn test_row_converts_json_keywords() {
        let fragment = Fragment::from(row());
        assert_eq!(fragment.keywords, vec!["rim", "backlight"]);
        assert_eq!(fragment.display_name(), "轮廓光");
    }

    #[test]
    fn test_comma_keywords_are_split() {
        assert_eq!(decode_keywords("neon, glow ,，night"), vec!["neon", "glow", "night"]);
        assert!(decode_keywords("  ").is_empty());
    }

    #[test]
    fn test_missing_optional_columns_default() {
        let mut r = row();
        r.chinese_name = None;
        r.ai_prompt_template = None;
        r.reusability_score = Some(-1.0);
        let fragment = Fragment::from(r);
        assert_eq!(fragment.display_name(), "rim_light");
        assert_eq!(fragment.template_text, "");
        assert_eq!(fragment.reusability_score, 0.0);
    }
}

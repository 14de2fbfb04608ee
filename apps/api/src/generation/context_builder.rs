//! Context Builder — assembles the reference block injected into the
//! completion request.
//!
//! Block order is fixed: category samples → option-matched fragments →
//! consistency constraints → design-style flavour. Front-loaded text carries
//! more weight with the model, so the order must not change.
//! Empty blocks are dropped without a header. Nothing in here fails.

use tracing::debug;

use crate::fragments::store::FragmentStore;
use crate::generation::options::DomainOptions;
use crate::knowledge::constraints::build_constraints_block;
use crate::knowledge::domain::{categories_for, Domain};
use crate::knowledge::style_variables::{sample_flavor, Language, RandomSource};

const MAX_CATEGORIES: usize = 8;
const FRAGMENTS_PER_CATEGORY: u32 = 5;
const SAMPLES_PER_CATEGORY: usize = 3;
/// Category samples must be strictly shorter than this many characters.
const MAX_SAMPLE_CHARS: usize = 200;
const OPTION_SEARCH_LIMIT: u32 = 10;
const OPTION_MATCHES_SHOWN: usize = 5;
const MATCH_PREVIEW_CHARS: usize = 80;

/// Localized option value → canonical search term.
const SEARCH_TERMS: &[(&str, &str)] = &[
    ("女性", "female"),
    ("男性", "male"),
    ("东亚", "East_Asian"),
    ("欧美", "European"),
    ("自然光", "natural light"),
    ("电影光", "cinematic lighting"),
    ("霓虹", "neon"),
    ("戏剧", "dramatic"),
    ("电影级", "cinematic"),
    ("写实", "realistic"),
    ("梦幻", "ethereal"),
    ("赛博朋克", "cyberpunk"),
    ("水墨画", "ink wash"),
    ("油画", "oil painting"),
    ("现代简约", "modern minimal"),
    ("商务", "business"),
];

/// Search keywords for the selected options: canonical term then the original
/// value when a mapping exists, the raw value otherwise.
pub fn search_keywords(options: &DomainOptions) -> Vec<String> {
    let mut keywords = Vec::new();
    for (_, value) in options.selected() {
        match SEARCH_TERMS.iter().find(|(label, _)| *label == value) {
            Some((_, canonical)) => {
                keywords.push(canonical.to_string());
                keywords.push(value.to_string());
            }
            None => keywords.push(value.to_string()),
        }
    }
    keywords
}

/// Builds the full context block for one request.
pub async fn build_fragment_context(
    store: &FragmentStore,
    domain: &str,
    options: &DomainOptions,
    rng: &mut dyn RandomSource,
) -> String {
    // known domains are matched against the store by their canonical key
    let domain = domain
        .parse::<Domain>()
        .map(|d| d.as_str())
        .unwrap_or(domain);
    let mut blocks: Vec<String> = Vec::new();

    blocks.extend(category_samples(store, domain).await);

    if let Some(block) = option_matches(store, domain, options).await {
        blocks.push(block);
    }

    let constraints = build_constraints_block(options.ethnicity(), options.style());
    if !constraints.is_empty() {
        blocks.push(format!("[Consistency constraints]:\n{constraints}"));
    }

    if domain == Domain::Design.as_str() {
        if let Some(style) = options.design_style() {
            let flavor = sample_flavor(style, Language::En, rng);
            if !flavor.is_empty() {
                blocks.push(format!("[Design style reference ({style})]:\n{flavor}"));
            }
        }
    }

    debug!(
        "Built fragment context for {domain}: {} blocks, {} chars",
        blocks.len(),
        blocks.iter().map(|b| b.chars().count()).sum::<usize>()
    );

    blocks.join("\n")
}

/// One `[category]: a; b; c` line per category that has short samples.
async fn category_samples(store: &FragmentStore, domain: &str) -> Vec<String> {
    let mut categories: Vec<String> = categories_for(domain)
        .iter()
        .map(|c| c.to_string())
        .collect();
    if categories.is_empty() {
        categories = store.distinct_categories(domain).await;
    }

    let mut lines = Vec::new();
    for category in categories.iter().take(MAX_CATEGORIES) {
        let samples: Vec<String> = store
            .by_category(domain, category, FRAGMENTS_PER_CATEGORY)
            .await
            .into_iter()
            .map(|f| f.template_text)
            .filter(|t| !t.is_empty() && t.chars().count() < MAX_SAMPLE_CHARS)
            .take(SAMPLES_PER_CATEGORY)
            .collect();

        if !samples.is_empty() {
            lines.push(format!("[{category}]: {}", samples.join("; ")));
        }
    }
    lines
}

async fn option_matches(
    store: &FragmentStore,
    domain: &str,
    options: &DomainOptions,
) -> Option<String> {
    let keywords = search_keywords(options);
    if keywords.is_empty() {
        return None;
    }

    let matches: Vec<String> = store
        .search_by_keywords(&keywords, Some(domain), OPTION_SEARCH_LIMIT)
        .await
        .into_iter()
        .take(OPTION_MATCHES_SHOWN)
        .filter(|f| !f.template_text.is_empty())
        .map(|f| {
            let preview: String = f.template_text.chars().take(MATCH_PREVIEW_CHARS).collect();
            format!("{}: {preview}", f.display_name())
        })
        .collect();

    if matches.is_empty() {
        None
    } else {
        Some(format!(
            "[Fragments matching selected options]:\n{}",
            matches.join("\n")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragments::store::tests::{seed_store, SeedRow};
    use crate::generation::options::{Choice, DesignOptions, PortraitOptions};
    use crate::knowledge::style_variables::tests::ScriptedRandom;
    use serde_json::json;

    fn portrait_rows() -> Vec<SeedRow> {
        vec![
            ("e1", "portrait", "ethnicity", "east_asian", "东亚", "East Asian woman, soft features", "East_Asian", 0.9),
            ("e2", "portrait", "ethnicity", "nordic", "北欧", "Nordic man, pale skin", "European", 0.8),
            ("h1", "portrait", "hair_colors", "neon_hair", "霓虹发色", "neon pink hair, cyberpunk glow", "neon", 0.85),
            ("h2", "portrait", "hair_colors", "long", "长描述", LONG_TEMPLATE, "", 0.99),
            ("p1", "portrait", "lighting_techniques", "rim", "轮廓光", "rim light", "", 0.7),
            ("g1", "portrait", "gender", "female", "女性", "elegant woman", "female,女性", 0.6),
        ]
    }

    const LONG_TEMPLATE: &str = "an extremely long lighting description that keeps going and going \
        with many clauses about rim light, fill light, key light, bounce cards, diffusion frames, \
        practical lamps, color temperature, negative fill, and much more detail than fits a sample line";

    #[test]
    fn test_search_keywords_include_canonical_and_original() {
        let options = DomainOptions::from_json(
            Domain::Portrait,
            json!({"gender": "女性", "ethnicity": "自动", "lighting": "柔光箱"}),
        )
        .unwrap();
        assert_eq!(search_keywords(&options), vec!["female", "女性", "柔光箱"]);
    }

    #[tokio::test]
    async fn test_unknown_domain_without_store_is_empty() {
        let store = FragmentStore::unavailable();
        let options = DomainOptions::unconstrained(Domain::Art);
        let mut rng = ScriptedRandom::zeros();
        let context = build_fragment_context(&store, "sculpture", &options, &mut rng).await;
        assert_eq!(context, "");
    }

    #[tokio::test]
    async fn test_store_absent_still_renders_constraints() {
        let store = FragmentStore::unavailable();
        let options =
            DomainOptions::from_json(Domain::Portrait, json!({"ethnicity": "East_Asian"})).unwrap();
        let mut rng = ScriptedRandom::zeros();
        let context = build_fragment_context(&store, "portrait", &options, &mut rng).await;

        assert!(context.starts_with("[Consistency constraints]:\n"));
        assert!(context.contains("black, dark brown, brown"));
        assert!(!context.contains("blue"));
        assert!(!context.contains("green"));
    }

    #[tokio::test]
    async fn test_blocks_follow_fixed_order() {
        let (_dir, path) = seed_store(&portrait_rows()).await;
        let store = FragmentStore::open(&path).await;
        let options = DomainOptions::Portrait(PortraitOptions {
            gender: Choice::from("女性"),
            ethnicity: Choice::from("东亚"),
            style: Choice::from("电影级"),
            ..Default::default()
        });
        let mut rng = ScriptedRandom::zeros();
        let context = build_fragment_context(&store, "portrait", &options, &mut rng).await;

        let gender = context.find("[gender]: elegant woman").unwrap();
        let ethnicity = context
            .find("[ethnicity]: East Asian woman, soft features; Nordic man, pale skin")
            .unwrap();
        let hair = context
            .find("[hair_colors]: neon pink hair, cyberpunk glow")
            .unwrap();
        let matched = context.find("[Fragments matching selected options]:").unwrap();
        let constraints = context.find("[Consistency constraints]:").unwrap();

        assert!(gender < ethnicity && ethnicity < hair, "static category order");
        assert!(hair < matched && matched < constraints);
        assert!(context.contains("Style: cinematic film quality"));
        store.close().await;
    }

    #[tokio::test]
    async fn test_long_templates_excluded_from_samples() {
        let (_dir, path) = seed_store(&portrait_rows()).await;
        let store = FragmentStore::open(&path).await;
        let options = DomainOptions::unconstrained(Domain::Portrait);
        let mut rng = ScriptedRandom::zeros();
        let context = build_fragment_context(&store, "portrait", &options, &mut rng).await;

        assert!(!context.contains("extremely long lighting"));
        // only the first eight portrait categories are sampled
        assert!(!context.contains("[lighting_techniques]"));
        assert!(!context.contains("[Fragments matching selected options]"));
        store.close().await;
    }

    #[tokio::test]
    async fn test_matched_fragments_use_localized_name_and_preview() {
        let (_dir, path) = seed_store(&portrait_rows()).await;
        let store = FragmentStore::open(&path).await;
        let options =
            DomainOptions::from_json(Domain::Portrait, json!({"lighting": "霓虹"})).unwrap();
        let mut rng = ScriptedRandom::zeros();
        let context = build_fragment_context(&store, "portrait", &options, &mut rng).await;

        assert!(context.contains("[Fragments matching selected options]:\n霓虹发色: neon pink hair, cyberpunk glow"));
        store.close().await;
    }

    #[tokio::test]
    async fn test_domain_key_is_canonicalized_for_store_lookups() {
        let (_dir, path) = seed_store(&portrait_rows()).await;
        let store = FragmentStore::open(&path).await;
        let options = DomainOptions::unconstrained(Domain::Portrait);

        let mut rng = ScriptedRandom::zeros();
        let canonical = build_fragment_context(&store, "portrait", &options, &mut rng).await;
        let mut rng = ScriptedRandom::zeros();
        let mixed_case = build_fragment_context(&store, " Portrait ", &options, &mut rng).await;

        assert!(mixed_case.contains("[gender]: elegant woman"));
        assert_eq!(mixed_case, canonical);
        store.close().await;
    }

    #[tokio::test]
    async fn test_unknown_domain_falls_back_to_store_categories() {
        let rows: Vec<SeedRow> = vec![
            ("s1", "sculpture", "materials", "marble", "大理石", "white marble", "", 0.5),
            ("s2", "sculpture", "forms", "bust", "胸像", "classical bust", "", 0.4),
        ];
        let (_dir, path) = seed_store(&rows).await;
        let store = FragmentStore::open(&path).await;
        let options = DomainOptions::unconstrained(Domain::Art);
        let mut rng = ScriptedRandom::zeros();
        let context = build_fragment_context(&store, "sculpture", &options, &mut rng).await;

        assert_eq!(context, "[materials]: white marble\n[forms]: classical bust");
        store.close().await;
    }

    #[tokio::test]
    async fn test_design_style_flavor_is_last() {
        let store = FragmentStore::unavailable();
        let options = DomainOptions::Design(DesignOptions {
            design_style: Choice::from("现代简约"),
            ..Default::default()
        });
        let mut rng = ScriptedRandom::zeros();
        let context = build_fragment_context(&store, "design", &options, &mut rng).await;

        assert!(context.starts_with("[Design style reference (现代简约)]:\nColor palette (deep blue)"));
    }

    #[tokio::test]
    async fn test_flavor_only_for_design_domain() {
        let store = FragmentStore::unavailable();
        let options = DomainOptions::Design(DesignOptions {
            design_style: Choice::from("现代简约"),
            ..Default::default()
        });
        let mut rng = ScriptedRandom::zeros();
        let context = build_fragment_context(&store, "product", &options, &mut rng).await;
        assert_eq!(context, "");
    }
}

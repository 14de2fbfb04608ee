//! Design-style vocabularies and a randomized sampler over them.
//!
//! Only image-model-friendly content is kept: colour names, atmosphere and
//! lighting keywords, decoration concepts, and preference/avoid lists.
//! Output is presentation flavour; nothing downstream depends on a given draw.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::knowledge::constraints::normalize;

/// Source of uniform indices. Production code uses the thread RNG; tests
/// script the sequence.
pub trait RandomSource: Send + Sync {
    /// Returns an index in `0..bound`. Callers never pass `bound == 0`.
    fn next_index(&mut self, bound: usize) -> usize;
}

/// Process-wide unseeded generator. Every call is an independent draw.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_index(&mut self, bound: usize) -> usize {
        rand::rng().random_range(0..bound)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Cn,
}

/// A term list in both output languages.
#[derive(Debug)]
struct Terms {
    en: &'static [&'static str],
    cn: &'static [&'static str],
}

impl Terms {
    fn get(&self, lang: Language) -> &'static [&'static str] {
        match lang {
            Language::En => self.en,
            Language::Cn => self.cn,
        }
    }
}

#[derive(Debug)]
struct Palette {
    name_en: &'static str,
    name_cn: &'static str,
    colors: Terms,
}

#[derive(Debug)]
struct DesignStyle {
    key: &'static str,
    label: &'static str,
    palettes: &'static [Palette],
    atmosphere: Terms,
    lighting: Terms,
    decoration: Terms,
    avoid: Terms,
    prefer: Terms,
}

const DESIGN_STYLES: &[DesignStyle] = &[
    DesignStyle {
        key: "cozy_cute",
        label: "温馨可爱",
        palettes: &[
            Palette {
                name_en: "coral pink",
                name_cn: "珊瑚粉色系",
                colors: Terms {
                    en: &["peach pink", "light coral", "soft peach", "light pink", "rose pink"],
                    cn: &["蜜桃粉", "浅珊瑚", "桃子白", "浅粉红", "玫瑰粉"],
                },
            },
            Palette {
                name_en: "sky blue",
                name_cn: "天空蓝色系",
                colors: Terms {
                    en: &["sky blue", "light periwinkle", "mint blue", "fresh green", "pale mint"],
                    cn: &["天空蓝", "淡紫蓝", "薄荷蓝", "清新绿", "淡薄荷"],
                },
            },
            Palette {
                name_en: "mint green",
                name_cn: "薄荷绿色系",
                colors: Terms {
                    en: &["mint green", "tender grass green", "spring green", "fresh green"],
                    cn: &["薄荷绿", "嫩草绿", "春绿色", "清新绿"],
                },
            },
            Palette {
                name_en: "cream",
                name_cn: "奶油色系",
                colors: Terms {
                    en: &["cream white", "vanilla white", "peach white", "lemon white", "apricot white"],
                    cn: &["奶油白", "香草白", "桃子白", "柠檬白", "杏子白"],
                },
            },
        ],
        atmosphere: Terms {
            en: &["warm", "soft", "cozy", "gentle", "playful", "dreamy", "whimsical"],
            cn: &["温暖", "柔软", "温馨", "轻柔", "俏皮", "梦幻", "奇幻"],
        },
        lighting: Terms {
            en: &["soft diffused light", "warm ambient glow", "dreamy lighting", "gentle illumination"],
            cn: &["柔和漫射光", "温暖环境光", "梦幻光效", "轻柔照明"],
        },
        decoration: Terms {
            en: &["sparkles", "hearts", "clouds", "flowers", "balloons", "stars", "ribbons"],
            cn: &["星光", "爱心", "云朵", "花朵", "气球", "星星", "丝带"],
        },
        avoid: Terms {
            en: &["dark colors", "sharp edges", "harsh lighting", "cold tones", "complex patterns"],
            cn: &["深色", "尖锐边缘", "强烈光照", "冷色调", "复杂图案"],
        },
        prefer: Terms {
            en: &["pastel colors", "rounded shapes", "soft shadows", "warm tones", "simple cute elements"],
            cn: &["粉彩色", "圆润形状", "柔和阴影", "暖色调", "简单可爱元素"],
        },
    },
    DesignStyle {
        key: "modern_minimal",
        label: "现代简约",
        palettes: &[
            Palette {
                name_en: "deep blue",
                name_cn: "深蓝色系",
                colors: Terms {
                    en: &["deep charcoal blue", "rock blue", "medium blue gray"],
                    cn: &["深炭蓝", "岩石蓝", "中蓝灰"],
                },
            },
            Palette {
                name_en: "indigo",
                name_cn: "靛蓝色系",
                colors: Terms {
                    en: &["indigo", "purple", "light purple"],
                    cn: &["靛蓝", "紫色", "淡紫"],
                },
            },
            Palette {
                name_en: "deep green",
                name_cn: "深绿色系",
                colors: Terms {
                    en: &["deep green", "emerald green", "mint"],
                    cn: &["深绿", "翠绿", "薄荷"],
                },
            },
            Palette {
                name_en: "neutral gray",
                name_cn: "中性灰系",
                colors: Terms {
                    en: &["deep gray", "medium gray", "light gray"],
                    cn: &["深灰", "中灰", "浅灰"],
                },
            },
        ],
        atmosphere: Terms {
            en: &["professional", "clean", "minimal", "sophisticated", "elegant", "refined"],
            cn: &["专业", "干净", "简约", "精致", "优雅", "精炼"],
        },
        lighting: Terms {
            en: &["studio lighting", "subtle shadows", "even illumination", "soft ambient light"],
            cn: &["工作室灯光", "微妙阴影", "均匀照明", "柔和环境光"],
        },
        decoration: Terms {
            en: &["geometric lines", "dot patterns", "subtle gradients", "minimal shapes"],
            cn: &["几何线条", "点阵图案", "微妙渐变", "简约形状"],
        },
        avoid: Terms {
            en: &["bright saturated colors", "excessive decoration", "playful elements", "cluttered layout"],
            cn: &["鲜艳饱和色", "过度装饰", "俏皮元素", "杂乱布局"],
        },
        prefer: Terms {
            en: &["neutral tones", "geometric shapes", "minimal decoration", "clean lines", "ample whitespace"],
            cn: &["中性色调", "几何形状", "极简装饰", "干净线条", "充足留白"],
        },
    },
];

/// Internal keys of every design style with a vocabulary.
pub fn available_styles() -> Vec<&'static str> {
    DESIGN_STYLES.iter().map(|s| s.key).collect()
}

/// Accepts either the internal key or the display label.
fn find_style(name: &str) -> Option<&'static DesignStyle> {
    let key = normalize(name.trim());
    DESIGN_STYLES
        .iter()
        .find(|s| s.key == key || s.label == key)
}

/// Draws up to `n` distinct items in draw order (partial Fisher-Yates).
fn sample_subset(
    items: &[&'static str],
    n: usize,
    rng: &mut dyn RandomSource,
) -> Vec<&'static str> {
    let mut pool = items.to_vec();
    let k = n.min(pool.len());
    for i in 0..k {
        let j = i + rng.next_index(pool.len() - i);
        pool.swap(i, j);
    }
    pool.truncate(k);
    pool
}

fn pick_palette(style: &DesignStyle, rng: &mut dyn RandomSource) -> Option<&'static Palette> {
    if style.palettes.is_empty() {
        return None;
    }
    let palettes: &'static [Palette] = style.palettes;
    Some(&palettes[rng.next_index(palettes.len())])
}

fn leading(terms: &[&str], n: usize) -> String {
    terms.iter().take(n).copied().collect::<Vec<_>>().join(", ")
}

/// Structured flavour text for a design style: one random palette (first four
/// colours), random atmosphere/lighting/decoration subsets, and the leading
/// preferences and avoidances. Unknown styles yield an empty string.
pub fn sample_flavor(style_name: &str, lang: Language, rng: &mut dyn RandomSource) -> String {
    let Some(style) = find_style(style_name) else {
        return String::new();
    };

    let mut lines = Vec::new();

    if let Some(palette) = pick_palette(style, rng) {
        let colors = palette.colors.get(lang);
        let colors = colors[..colors.len().min(4)].join(", ");
        lines.push(match lang {
            Language::En => format!("Color palette ({}): {colors}", palette.name_en),
            Language::Cn => format!("配色方案（{}）：{colors}", palette.name_cn),
        });
    }

    let atmosphere = sample_subset(style.atmosphere.get(lang), 4, rng).join(", ");
    let lighting = sample_subset(style.lighting.get(lang), 2, rng).join(", ");
    let decoration = sample_subset(style.decoration.get(lang), 4, rng).join(", ");
    let prefer = leading(style.prefer.get(lang), 3);
    let avoid = leading(style.avoid.get(lang), 3);

    match lang {
        Language::En => {
            lines.push(format!("Atmosphere: {atmosphere}"));
            lines.push(format!("Lighting: {lighting}"));
            lines.push(format!("Decoration elements: {decoration}"));
            lines.push(format!("Design preference: {prefer}"));
            lines.push(format!("Avoid: {avoid}"));
        }
        Language::Cn => {
            lines.push(format!("氛围：{atmosphere}"));
            lines.push(format!("光影：{lighting}"));
            lines.push(format!("装饰元素：{decoration}"));
            lines.push(format!("设计偏好：{prefer}"));
            lines.push(format!("避免：{avoid}"));
        }
    }

    lines.join("\n")
}

/// Short comma-separated fragment list that can be appended to a prompt as-is.
pub fn prompt_enhancement(style_name: &str, lang: Language, rng: &mut dyn RandomSource) -> String {
    let Some(style) = find_style(style_name) else {
        return String::new();
    };

    let mut fragments: Vec<String> = Vec::new();

    if let Some(lead) = pick_palette(style, rng).and_then(|p| p.colors.get(lang).first()) {
        fragments.push(match lang {
            Language::En => format!("{lead} color scheme"),
            Language::Cn => format!("{lead}配色"),
        });
    }

    fragments.extend(
        sample_subset(style.atmosphere.get(lang), 2, rng)
            .into_iter()
            .map(str::to_string),
    );
    fragments.extend(
        sample_subset(style.lighting.get(lang), 1, rng)
            .into_iter()
            .map(str::to_string),
    );

    let decorations = sample_subset(style.decoration.get(lang), 2, rng);
    if !decorations.is_empty() {
        fragments.push(match lang {
            Language::En => format!("decorated with {}", decorations.join(" and ")),
            Language::Cn => format!("点缀{}", decorations.join("和")),
        });
    }

    fragments.join(", ")
}

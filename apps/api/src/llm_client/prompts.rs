// Instruction-payload construction for prompt generation.
// Section order is significant: preamble, options, reference material,
// consistency rules, expansion rules, output channels, worked example.

use crate::generation::options::DomainOptions;
use crate::knowledge::domain::describe_domain;
use crate::models::generation::ChannelSelection;

pub const CONSISTENCY_RULES: &str = "\
## Consistency rules (mandatory)
1. Ethnicity and eye colour must agree: East Asian subjects use dark brown eyes / almond eyes, never green or blue eyes.
2. Ethnicity and hair colour must agree: East Asian subjects typically have black hair or dark brown hair.
3. Era and clothing must agree: period scenes use traditional/period clothing, modern scenes use modern/contemporary clothing.
4. Style and lighting must agree: cinematic style uses cinematic lighting and dramatic shadows; natural style uses soft natural light.";

pub const FORMAT_RULES: &str = "\
## Format rules
1. Mark every section with its delimiter line, e.g. `=== natural_en ===`.
2. Natural-language channels: comma-separated descriptive phrases, rich in detail, covering subject, styling, lighting, composition and technical parameters.
3. JSON channels: structured key/value pairs grouped under subject / styling / lighting / scene / technical.";

pub const WORKED_EXAMPLE: &str = r#"## Example output
=== natural_en ===
professional Asian woman, full body shot, business formal attire, dark brown almond eyes, sleek black hair, natural makeup, soft window light, shallow depth of field, 85mm lens, 8K resolution

=== natural_cn ===
职业亚洲女性，全身照，商务正装，深棕色杏仁眼，黑色直发，自然妆容，柔和窗光，浅景深，85mm镜头，8K分辨率

=== json_en ===
{"subject": {"gender": "female", "ethnicity": "East Asian", "age": "adult"}, "styling": {"clothing": "business formal", "hair": "black sleek", "makeup": "natural"}, "lighting": {"type": "window light", "mood": "soft professional"}, "technical": {"lens": "85mm", "resolution": "8K"}}

=== json_cn ===
{"主体": {"性别": "女性", "人种": "东亚", "年龄": "成年"}, "造型": {"服装": "商务正装", "发型": "黑色直发", "妆容": "自然"}, "光影": {"类型": "窗光", "氛围": "柔和职业感"}, "技术": {"镜头": "85mm", "分辨率": "8K"}}"#;

const CLOSING: &str =
    "Generate detailed, professional prompts that follow the consistency rules.";

/// Expansion rules, tailored to the domain name.
pub fn expansion_rules(domain_name: &str) -> String {
    format!(
        "\
## Expansion rules (mandatory)
### Dimensions
Based on the user's description and the characteristics of {domain_name}, infer 3-8 elaboration dimensions that suit this request, scaled to the complexity of the input (for example clothing, hair, pose, background, expression, action, material, lighting, atmosphere, motion, texture, composition, colour tone), and enrich the prompt along them.
### Length
- Natural-language channels: 600-800 characters
- JSON channels: 1000-1200 characters
### Discipline
1. Only add, never alter: append detail to the core description and keep its meaning unchanged.
2. Avoid semantic duplication: do not repeat implied concepts (\"black stockings\" already implies stockings).
3. Front-load key elements: the main subject description belongs in the first 150 characters.
4. Layer the description: subject, then environment, then atmosphere, then technical parameters."
    )
}

/// Builds the single system message for a generation call.
pub fn build_system_prompt(
    domain: &str,
    options: &DomainOptions,
    context: &str,
    channels: &ChannelSelection,
    expand: bool,
) -> String {
    let domain_name = describe_domain(domain);
    let mut sections = vec![format!(
        "You are an expert prompt writer for {domain_name}.\n\
         Turn the user's description into a high-quality prompt for AI image generation."
    )];

    let selected = options.selected();
    if !selected.is_empty() {
        let listing = selected
            .iter()
            .map(|(key, value)| format!("- {key}: {value}"))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("## User-selected options\n{listing}"));
    }

    if !context.is_empty() {
        sections.push(format!(
            "## Professional reference material (prefer these descriptions)\n{context}\n\n\
             Base the prompt on the reference material above and keep its professional terminology."
        ));
    }

    sections.push(CONSISTENCY_RULES.to_string());

    if expand {
        sections.push(expansion_rules(domain_name));
    }

    let outputs = channels
        .requested()
        .iter()
        .map(|c| format!("- {}: {}", c.delimiter(), c.requirement()))
        .collect::<Vec<_>>()
        .join("\n");
    sections.push(format!("## Output channels\n{outputs}"));
    sections.push(FORMAT_RULES.to_string());
    sections.push(WORKED_EXAMPLE.to_string());
    sections.push(CLOSING.to_string());

    sections.join("\n\n")
}

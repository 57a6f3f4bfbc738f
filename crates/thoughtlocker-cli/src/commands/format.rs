use thoughtlocker::{PromptSpec, VersionRow, format_timestamp};

const MAX_NAME_WIDTH: usize = 30;
const MAX_TARGET_WIDTH: usize = 28;
const LINE_BUDGET: usize = 100;

pub fn print_spec_table(specs: &[PromptSpec]) {
    let name_width = column_width(specs.iter().map(|s| s.name.as_str()), MAX_NAME_WIDTH);
    let targets: Vec<String> = specs.iter().map(target_label).collect();
    let target_width = column_width(targets.iter().map(String::as_str), MAX_TARGET_WIDTH);
    let desc_budget = LINE_BUDGET.saturating_sub(2 + name_width + 2 + target_width + 2);

    for (spec, target) in specs.iter().zip(&targets) {
        let marker = if spec.enabled { ' ' } else { '-' };
        let name = truncate(&spec.name, name_width);
        let target = truncate(target, target_width);
        let desc = truncate(spec.description.as_deref().unwrap_or(""), desc_budget);

        println!("{marker} {name:<name_width$}  {target:<target_width$}  {desc}");
    }

    println!("\n{} prompts", specs.len());
}

pub fn version_line(version: &VersionRow) -> String {
    let occurred = version
        .occurred_at
        .as_ref()
        .map(format_timestamp)
        .unwrap_or_else(|| "-".to_owned());
    let checksum = version
        .spec
        .checksum
        .as_deref()
        .map(|c| c.chars().take(12).collect::<String>())
        .unwrap_or_else(|| "-".to_owned());

    format!(
        "{:>4}  {:<6}  {occurred}  {checksum}",
        version.version_seq,
        version.action.as_str()
    )
}

/// `provider/model`, or whichever half is known.
fn target_label(spec: &PromptSpec) -> String {
    match (spec.provider.as_deref(), spec.model.as_deref()) {
        (Some(p), Some(m)) => format!("{p}/{m}"),
        (Some(only), None) | (None, Some(only)) => only.to_owned(),
        (None, None) => String::new(),
    }
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, max: usize) -> usize {
    values.map(|v| v.chars().count()).max().unwrap_or(0).min(max)
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{truncated}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thoughtlocker::{VersionAction, parse_timestamp};

    #[test]
    fn truncate_short_string_unchanged() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn truncate_long_string_adds_ellipsis() {
        assert_eq!(truncate("hello world", 6), "hello…");
    }

    #[test]
    fn truncate_handles_unicode() {
        assert_eq!(truncate("café latte", 5), "café…");
    }

    #[test]
    fn target_label_combines_provider_and_model() {
        let mut spec = PromptSpec::new("x", "");
        assert_eq!(target_label(&spec), "");

        spec.model = Some("gpt-x".into());
        assert_eq!(target_label(&spec), "gpt-x");

        spec.provider = Some("openai".into());
        assert_eq!(target_label(&spec), "openai/gpt-x");
    }

    #[test]
    fn version_line_shows_seq_action_and_short_checksum() {
        let mut spec = PromptSpec::new("x", "");
        spec.checksum = Some("0123456789abcdef".into());
        let version = VersionRow {
            version_seq: 3,
            action: VersionAction::Update,
            occurred_at: parse_timestamp("2025-01-02T03:04:05Z"),
            spec,
        };

        assert_eq!(
            version_line(&version),
            "   3  update  2025-01-02T03:04:05.000000Z  0123456789ab"
        );
    }
}

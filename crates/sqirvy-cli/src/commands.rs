//! Command kinds and their fixed outputs.

use sqirvy_core::model_provider_list;

/// Query modes; each sends the input with its own system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// General question answering.
    Query,
    /// Planning.
    Plan,
    /// Source code generation.
    Code,
    /// Code review.
    Review,
}

impl Mode {
    /// System prompt embedded for this mode.
    pub const fn system_prompt(self) -> &'static str {
        match self {
            Self::Query => include_str!("../prompts/query.md"),
            Self::Plan => include_str!("../prompts/plan.md"),
            Self::Code => include_str!("../prompts/code.md"),
            Self::Review => include_str!("../prompts/review.md"),
        }
    }
}

/// The `models` listing: a header, one sorted `provider: model` line per
/// registered model, then a blank line.
pub fn format_model_list() -> String {
    let mut lines: Vec<String> = model_provider_list()
        .iter()
        .map(|pair| format!("  {:<10}: {}", pair.provider.as_str(), pair.model))
        .collect();
    lines.sort();

    let mut output = String::from("Supported Providers and Models:\n");
    for line in lines {
        output.push_str(&line);
        output.push('\n');
    }
    output.push('\n');
    output
}

/// The `version` output.
pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_list_format() {
        let listing = format_model_list();
        let lines: Vec<&str> = listing.lines().collect();

        assert_eq!(lines[0], "Supported Providers and Models:");
        assert!(lines.contains(&"  anthropic : claude-3-5-haiku-20241022"));
        assert!(lines.contains(&"  gemini    : gemini-2.5-flash"));
        assert!(lines.contains(&"  openai    : gpt-5"));
        assert!(listing.ends_with("\n\n"));

        let entries = &lines[1..lines.len() - 1];
        assert!(entries.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(lines.last(), Some(&""));
    }

    #[test]
    fn test_system_prompts_are_distinct() {
        let prompts = [Mode::Query, Mode::Plan, Mode::Code, Mode::Review]
            .map(Mode::system_prompt);
        for (index, prompt) in prompts.iter().enumerate() {
            assert!(!prompt.trim().is_empty());
            assert!(prompts[index + 1..].iter().all(|other| other != prompt));
        }
    }
}

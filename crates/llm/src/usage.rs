use super::provider::ProviderMessage;

/// Characters-per-token heuristic used when a provider reports no usage.
const APPROX_CHARS_PER_TOKEN: usize = 4;

/// Token accounting for one completed generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_tokens == 0
    }
}

/// Estimates usage for a finished stream from raw text lengths.
///
/// Providers only report usage on some stream variants, so completion
/// accounting falls back to a chars/4 approximation of prompt and response.
pub fn estimate_token_usage(history: &[ProviderMessage], response: &str) -> TokenUsage {
    let prompt_chars: usize = history
        .iter()
        .map(|message| message.content.chars().count())
        .sum();
    let completion_chars = response.chars().count();

    TokenUsage::new(
        (prompt_chars / APPROX_CHARS_PER_TOKEN) as u64,
        (completion_chars / APPROX_CHARS_PER_TOKEN) as u64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Role;

    #[test]
    fn estimate_counts_prompt_and_completion_separately() {
        let history = vec![
            ProviderMessage::new(Role::User, "a".repeat(40)),
            ProviderMessage::new(Role::Assistant, "b".repeat(20)),
        ];

        let usage = estimate_token_usage(&history, &"c".repeat(80));
        assert_eq!(usage.prompt_tokens, 15);
        assert_eq!(usage.completion_tokens, 20);
        assert_eq!(usage.total_tokens, 35);
    }

    #[test]
    fn empty_inputs_estimate_to_zero() {
        let usage = estimate_token_usage(&[], "");
        assert!(usage.is_empty());
    }
}

//! Token usage accounting for provider calls.

use serde::{Deserialize, Serialize};

/// Token usage and estimated cost for a single provider call.
///
/// Invariant: `total_tokens == prompt_tokens + completion_tokens`.
/// Every provider call that completes produces one of these - real
/// counts on success, all-zero on a caught transport failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens in the completion.
    pub completion_tokens: u32,
    /// Total tokens (prompt + completion).
    pub total_tokens: u32,
    /// Estimated cost in USD.
    pub estimated_cost: f64,
}

impl TokenUsage {
    /// Creates new token usage, deriving the total.
    pub fn new(prompt_tokens: u32, completion_tokens: u32, estimated_cost: f64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
            estimated_cost,
        }
    }

    /// Zero usage, returned when a provider call fails.
    pub fn zero() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn total_is_sum_of_parts() {
        let usage = TokenUsage::new(120, 80, 0.05);
        assert_eq!(usage.total_tokens, 200);
        assert_eq!(usage.prompt_tokens, 120);
        assert_eq!(usage.completion_tokens, 80);
    }

    #[test]
    fn zero_usage_is_empty() {
        let usage = TokenUsage::zero();
        assert_eq!(usage.total_tokens, 0);
        assert_eq!(usage.estimated_cost, 0.0);
    }

    proptest! {
        #[test]
        fn total_invariant_holds(prompt in 0u32..1_000_000, completion in 0u32..1_000_000) {
            let usage = TokenUsage::new(prompt, completion, 0.0);
            prop_assert_eq!(usage.total_tokens, prompt + completion);
        }
    }
}

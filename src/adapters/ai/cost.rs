//! Token cost estimation.
//!
//! Rates are static USD-per-1k-token figures. Real billing differs per
//! direction (input vs output); the single blended rate here exists for
//! budget visibility, not invoicing.

use crate::ports::AiModel;

/// Blended USD rate per 1000 tokens for a model.
pub fn rate_per_1k(model: AiModel) -> f64 {
    match model {
        AiModel::Gpt4oMini => 0.00015,
        AiModel::Gpt4o => 0.005,
        AiModel::Claude3Haiku => 0.00025,
        AiModel::Claude3Sonnet => 0.003,
    }
}

/// Estimated cost of a call in USD.
pub fn estimate_cost(model: AiModel, total_tokens: u32) -> f64 {
    f64::from(total_tokens) / 1000.0 * rate_per_1k(model)
}

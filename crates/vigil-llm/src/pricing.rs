//! USD cost tables and estimation
//!
//! Prices are per 1K tokens, keyed provider then model, with a `default`
//! entry per provider. Built-in values track public list pricing; the
//! config can override or extend any entry.

use indexmap::IndexMap;
use vigil_config::ModelPrice;

use crate::types::Usage;

/// Fallback price when neither the model nor its provider has an entry
const GLOBAL_DEFAULT: ModelPrice = ModelPrice {
    input_per_1k: 0.005,
    output_per_1k: 0.015,
};

/// Estimated tokens per character of prompt text
const CHARS_PER_TOKEN: f64 = 4.0;

/// Price lookup table
pub struct PriceTable {
    providers: IndexMap<String, IndexMap<String, ModelPrice>>,
}

impl PriceTable {
    /// Built-in prices merged with config overrides
    pub fn from_config(overrides: &IndexMap<String, IndexMap<String, ModelPrice>>) -> Self {
        let mut providers = builtin_prices();

        for (provider, models) in overrides {
            let entry = providers.entry(provider.clone()).or_default();
            for (model, price) in models {
                entry.insert(model.clone(), *price);
            }
        }

        Self { providers }
    }

    /// Price for a provider/model pair, with per-provider then global
    /// fallback
    pub fn price_for(&self, provider: &str, model: &str) -> ModelPrice {
        self.providers
            .get(provider)
            .and_then(|models| models.get(model).or_else(|| models.get("default")))
            .copied()
            .unwrap_or(GLOBAL_DEFAULT)
    }

    /// Conservative pre-flight cost upper bound
    ///
    /// Prompt tokens are estimated from character count; the completion
    /// side assumes the full `max_tokens` budget is consumed. Actual cost
    /// is settled later from real token counts, so overestimating here
    /// only makes the budget check stricter, never looser.
    pub fn estimate(&self, provider: &str, model: &str, prompt_chars: usize, max_tokens: u32) -> f64 {
        let price = self.price_for(provider, model);
        #[allow(clippy::cast_precision_loss)]
        let prompt_tokens = prompt_chars as f64 / CHARS_PER_TOKEN;
        prompt_tokens / 1000.0 * price.input_per_1k + f64::from(max_tokens) / 1000.0 * price.output_per_1k
    }

    /// Exact cost from reported token usage
    pub fn actual(&self, provider: &str, model: &str, usage: Usage) -> f64 {
        let price = self.price_for(provider, model);
        f64::from(usage.prompt_tokens) / 1000.0 * price.input_per_1k
            + f64::from(usage.completion_tokens) / 1000.0 * price.output_per_1k
    }
}

fn builtin_prices() -> IndexMap<String, IndexMap<String, ModelPrice>> {
    fn price(input_per_1k: f64, output_per_1k: f64) -> ModelPrice {
        ModelPrice {
            input_per_1k,
            output_per_1k,
        }
    }

    let mut table: IndexMap<String, IndexMap<String, ModelPrice>> = IndexMap::new();

    let anthropic = table.entry("anthropic".to_owned()).or_default();
    anthropic.insert("claude-opus-4-1".to_owned(), price(0.015, 0.075));
    anthropic.insert("claude-sonnet-4-5".to_owned(), price(0.003, 0.015));
    anthropic.insert("claude-haiku-4-5".to_owned(), price(0.001, 0.005));
    anthropic.insert("default".to_owned(), price(0.003, 0.015));

    let openai = table.entry("openai".to_owned()).or_default();
    openai.insert("gpt-4o".to_owned(), price(0.005, 0.015));
    openai.insert("gpt-4o-mini".to_owned(), price(0.000_15, 0.000_6));
    openai.insert("gpt-4-turbo".to_owned(), price(0.010, 0.030));
    openai.insert("default".to_owned(), price(0.005, 0.015));

    let google = table.entry("google".to_owned()).or_default();
    google.insert("gemini-1.5-pro".to_owned(), price(0.001_25, 0.005));
    google.insert("gemini-1.5-flash".to_owned(), price(0.000_075, 0.000_3));
    google.insert("default".to_owned(), price(0.001_25, 0.005));

    table
}

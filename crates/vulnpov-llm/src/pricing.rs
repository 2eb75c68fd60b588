/// Per-million-token USD pricing for the models this system knows how to cost. Unknown models
/// fall back to a conservative default rather than failing the run over a pricing gap.
#[derive(Debug, Clone, Copy)]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

const DEFAULT_PRICING: ModelPricing = ModelPricing {
    input_per_million: 3.0,
    output_per_million: 15.0,
};

pub fn pricing_for(model: &str) -> ModelPricing {
    match model {
        "claude-3-7-sonnet" | "claude37" => ModelPricing {
            input_per_million: 3.0,
            output_per_million: 15.0,
        },
        "claude-3-5-haiku" => ModelPricing {
            input_per_million: 0.8,
            output_per_million: 4.0,
        },
        "gpt-4o" => ModelPricing {
            input_per_million: 2.5,
            output_per_million: 10.0,
        },
        _ => DEFAULT_PRICING,
    }
}

pub fn cost_usd(pricing: ModelPricing, input_tokens: u64, output_tokens: u64) -> f64 {
    let input_cost = input_tokens as f64 / 1_000_000.0 * pricing.input_per_million;
    let output_cost = output_tokens as f64 / 1_000_000.0 * pricing.output_per_million;
    input_cost + output_cost
}

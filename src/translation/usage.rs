/*!
 * Token usage accounting and cost estimation.
 *
 * A tracker instance is owned by the translation service of a single job,
 * never shared between jobs, so concurrent runs cannot corrupt each other's
 * counters. Prices are a fixed per-provider per-million-token table.
 */

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::app_config::TranslationProvider;
use crate::providers::ChatUsage;

/// Per-million-token prices for one provider
#[derive(Debug, Clone, Copy)]
pub struct PriceTable {
    /// Price for prompt tokens served from the provider cache
    pub hit_per_mtok: f64,
    /// Price for prompt tokens that missed the cache
    pub miss_per_mtok: f64,
    /// Price for completion tokens
    pub output_per_mtok: f64,
}

impl PriceTable {
    /// Prices for the given provider's default model
    pub fn for_provider(provider: TranslationProvider) -> Self {
        match provider {
            // deepseek-chat: cache hits are ten times cheaper than misses
            TranslationProvider::DeepSeek => Self {
                hit_per_mtok: 0.028,
                miss_per_mtok: 0.28,
                output_per_mtok: 0.42,
            },
            // gpt-4o-mini has no cache split; input is input
            TranslationProvider::OpenAI => Self {
                hit_per_mtok: 0.15,
                miss_per_mtok: 0.15,
                output_per_mtok: 0.60,
            },
        }
    }
}

#[derive(Debug, Default, Clone)]
struct Counters {
    hit_tokens: u64,
    miss_tokens: u64,
    output_tokens: u64,
    request_count: u64,
}

/// A point-in-time view of accumulated usage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Prompt tokens served from the provider cache
    pub hit_tokens: u64,
    /// Prompt tokens that missed the cache
    pub miss_tokens: u64,
    /// Completion tokens
    pub output_tokens: u64,
    /// Number of completed API requests
    pub request_count: u64,
    /// Cache hit rate over prompt tokens, in percent
    pub hit_rate: f64,
    /// Estimated cost in dollars
    pub estimated_cost: f64,
}

impl UsageSnapshot {
    /// Total prompt tokens
    pub fn input_tokens(&self) -> u64 {
        self.hit_tokens + self.miss_tokens
    }
}

/// Job-scoped usage counters
#[derive(Debug)]
pub struct UsageTracker {
    counters: Mutex<Counters>,
    prices: PriceTable,
}

impl UsageTracker {
    /// Create a tracker priced for the given provider
    pub fn new(provider: TranslationProvider) -> Self {
        Self {
            counters: Mutex::new(Counters::default()),
            prices: PriceTable::for_provider(provider),
        }
    }

    /// Record the usage block of one completed request.
    ///
    /// Providers without a cache split report all prompt tokens as misses.
    pub fn record(&self, usage: &ChatUsage) {
        let mut counters = self.counters.lock();
        let hit = usage.prompt_cache_hit_tokens.unwrap_or(0);
        let miss = usage
            .prompt_cache_miss_tokens
            .unwrap_or_else(|| usage.prompt_tokens.saturating_sub(hit));

        counters.hit_tokens += hit;
        counters.miss_tokens += miss;
        counters.output_tokens += usage.completion_tokens;
        counters.request_count += 1;
    }

    /// Current usage totals with derived hit rate and cost
    pub fn snapshot(&self) -> UsageSnapshot {
        let counters = self.counters.lock().clone();
        let input_tokens = counters.hit_tokens + counters.miss_tokens;

        let hit_rate = if input_tokens > 0 {
            (counters.hit_tokens as f64 / input_tokens as f64) * 100.0
        } else {
            0.0
        };

        let cost = (counters.hit_tokens as f64 / 1_000_000.0) * self.prices.hit_per_mtok
            + (counters.miss_tokens as f64 / 1_000_000.0) * self.prices.miss_per_mtok
            + (counters.output_tokens as f64 / 1_000_000.0) * self.prices.output_per_mtok;

        UsageSnapshot {
            hit_tokens: counters.hit_tokens,
            miss_tokens: counters.miss_tokens,
            output_tokens: counters.output_tokens,
            request_count: counters.request_count,
            hit_rate: (hit_rate * 10.0).round() / 10.0,
            estimated_cost: (cost * 10_000.0).round() / 10_000.0,
        }
    }

    /// Reset all counters (called at job start)
    pub fn reset(&self) {
        *self.counters.lock() = Counters::default();
    }
}

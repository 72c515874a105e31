//! Per-tab hooks that may rewrite the augmentation context before generation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::tab::Tab;
use crate::llm::Generator;

#[async_trait]
pub trait TabStrategy: Send + Sync {
    /// Return the context to use for `tab`. Must not fail; fall back to `context`.
    async fn optimize(&self, context: &str, tab: Tab) -> String;
}

/// Passes the context through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityStrategy;

#[async_trait]
impl TabStrategy for IdentityStrategy {
    async fn optimize(&self, context: &str, _tab: Tab) -> String {
        context.to_string()
    }
}

/// Asks the generator to refresh budget projections with market benchmarks.
pub struct KpiBenchmarkStrategy {
    generator: Arc<dyn Generator>,
}

impl KpiBenchmarkStrategy {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl TabStrategy for KpiBenchmarkStrategy {
    async fn optimize(&self, context: &str, tab: Tab) -> String {
        let prompt = format!(
            "Improve projections using latest CAC/CTR benchmarks for: {}",
            context
        );
        match self.generator.complete(&prompt).await {
            Ok(improved) if !improved.trim().is_empty() => improved,
            Ok(_) => context.to_string(),
            Err(e) => {
                tracing::warn!("KPI benchmark pass failed for tab {}: {}", tab, e);
                context.to_string()
            }
        }
    }
}

/// Strategy registry: a default plus per-tab overrides.
#[derive(Clone)]
pub struct TabStrategies {
    default: Arc<dyn TabStrategy>,
    overrides: HashMap<Tab, Arc<dyn TabStrategy>>,
}

impl TabStrategies {
    pub fn new(default: Arc<dyn TabStrategy>) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    /// Identity everywhere except `budget_kpis`, which gets the benchmark pass.
    pub fn standard(generator: Arc<dyn Generator>) -> Self {
        Self::new(Arc::new(IdentityStrategy))
            .with(Tab::BudgetKpis, Arc::new(KpiBenchmarkStrategy::new(generator)))
    }

    pub fn with(mut self, tab: Tab, strategy: Arc<dyn TabStrategy>) -> Self {
        self.overrides.insert(tab, strategy);
        self
    }

    pub fn get(&self, tab: Tab) -> &Arc<dyn TabStrategy> {
        self.overrides.get(&tab).unwrap_or(&self.default)
    }
}

impl Default for TabStrategies {
    fn default() -> Self {
        Self::new(Arc::new(IdentityStrategy))
    }
}

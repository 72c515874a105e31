//! Go-to-market strategy generation on top of retrieval.
//!
//! - `StrategyInput` / `build_query`: structured input to retrieval query
//! - `Tab` and `build_prompt`: per-tab task instructions
//! - `TabStrategies`: per-tab prompt optimizers
//! - `StrategyService`: query → context → dashboard

mod input;
mod optimizer;
mod service;
mod tab;

pub use input::{build_query, StrategyInput};
pub use optimizer::{IdentityStrategy, KpiBenchmarkStrategy, TabStrategies, TabStrategy};
pub use service::{Dashboard, StrategyService};
pub use tab::{build_prompt, Tab};

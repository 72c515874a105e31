use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::rag::RagError;

/// Dashboard tabs, each generated from its own task instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    Personas,
    Messaging,
    Channels,
    Calendar,
    BudgetKpis,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Personas,
        Tab::Messaging,
        Tab::Channels,
        Tab::Calendar,
        Tab::BudgetKpis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Personas => "personas",
            Tab::Messaging => "messaging",
            Tab::Channels => "channels",
            Tab::Calendar => "calendar",
            Tab::BudgetKpis => "budget_kpis",
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            Tab::Personas => "Generate 2-3 personas with demographics, pains, and goals.",
            Tab::Messaging => "Write Google Ads, LinkedIn posts, and tweets aligned to personas.",
            Tab::Channels => "Rank channels with 1-2 line justifications.",
            Tab::Calendar => "Outline a 30-day content calendar with daily posts.",
            Tab::BudgetKpis => "Propose lean vs growth budgets with suggested KPIs.",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tab::ALL
            .into_iter()
            .find(|tab| tab.as_str() == s.trim())
            .ok_or_else(|| RagError::InvalidInput(format!("unknown tab '{}'", s)))
    }
}

/// Prompt for one tab: context, blank line, then the task.
pub fn build_prompt(context: &str, instruction: &str) -> String {
    let context = context.trim();
    if context.is_empty() {
        format!("Task: {}", instruction)
    } else {
        format!("{}\n\nTask: {}", context, instruction)
    }
}

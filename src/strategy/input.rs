use serde::{Deserialize, Serialize};

use crate::rag::RagError;

/// Business description submitted by the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyInput {
    pub business_idea: String,
    pub target_audience: String,
    pub value_proposition: String,
    /// Text already extracted from an uploaded document, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
}

impl StrategyInput {
    pub fn validate(&self) -> Result<(), RagError> {
        for (field, value) in [
            ("business_idea", &self.business_idea),
            ("target_audience", &self.target_audience),
            ("value_proposition", &self.value_proposition),
        ] {
            if value.trim().is_empty() {
                return Err(RagError::InvalidInput(format!("'{}' must not be empty", field)));
            }
        }
        Ok(())
    }
}

/// Retrieval query for a business description.
pub fn build_query(input: &StrategyInput) -> String {
    let mut query = format!(
        "Business: {} Audience: {} Value: {}",
        input.business_idea.trim(),
        input.target_audience.trim(),
        input.value_proposition.trim()
    );
    if let Some(doc) = input
        .extracted_text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        query.push_str(" Document: ");
        query.push_str(doc);
    }
    query
}

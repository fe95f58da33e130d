//! Build-time engine configuration.

use serde::{Deserialize, Serialize};

/// Global behavior switches attached when a schema is compiled.
///
/// Immutable after compilation; `ValidateOptions` may override the
/// per-call switches without touching the compiled state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Report title override; defaults to the schema root's declared name.
    pub title: Option<String>,
    /// Exact type matching instead of lax coercion.
    pub strict: bool,
    /// Whether model validation may read attributes from opaque host objects.
    pub from_attributes: bool,
    /// Maximum traversal depth before a recursion-limit error.
    pub recursion_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: None,
            strict: false,
            from_attributes: false,
            recursion_limit: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_round_trips_through_serde() {
        let config = EngineConfig {
            title: Some("Order".into()),
            strict: true,
            ..EngineConfig::default()
        };
        let encoded = serde_json::to_value(&config).unwrap();
        let decoded: EngineConfig = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, config);
    }
}

use serde::{Deserialize, Serialize};

/// Which heuristic variant the planner runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Bring as many stores as possible back into range.
    Balance,
    /// Prefer fewer, larger transfers: drain one source across destinations.
    MinimizeTransfers,
    /// Replenish the fastest-moving stores first.
    MaximizeTurnover,
}

/// What the caller wants the heuristic to weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyPriority {
    Cost,
    Speed,
    Balanced,
}

/// Planner configuration value object. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationStrategy {
    #[serde(rename = "type")]
    pub kind: StrategyKind,
    pub priority: StrategyPriority,
}

impl Default for OptimizationStrategy {
    fn default() -> Self {
        Self {
            kind: StrategyKind::Balance,
            priority: StrategyPriority::Balanced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_uses_the_wire_field_names() {
        let s: OptimizationStrategy =
            serde_json::from_str(r#"{"type":"maximize_turnover","priority":"cost"}"#).unwrap();
        assert_eq!(s.kind, StrategyKind::MaximizeTurnover);
        assert_eq!(s.priority, StrategyPriority::Cost);
    }

    #[test]
    fn unknown_strategy_kind_fails_to_parse() {
        let err = serde_json::from_str::<OptimizationStrategy>(
            r#"{"type":"teleport","priority":"cost"}"#,
        );
        assert!(err.is_err());
    }
}

// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};

pub const STATUS_TRUE: &str = "True";
pub const STATUS_FALSE: &str = "False";

/// A status condition as found on Extension resources and Flux objects
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl Condition {
    pub fn is_true(&self) -> bool {
        self.status == STATUS_TRUE
    }

    pub fn is_false(&self) -> bool {
        self.status == STATUS_FALSE
    }
}

/// Find a condition by type
pub fn find_condition<'a>(conditions: &'a [Condition], condition_type: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.condition_type == condition_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_flux_condition() {
        let condition: Condition = serde_json::from_value(serde_json::json!({
            "type": "Ready",
            "status": "False",
            "reason": "GitOperationFailed",
            "message": "authentication required",
            "lastTransitionTime": "2024-01-01T00:00:00Z",
            "observedGeneration": 1
        }))
        .unwrap();

        assert_eq!(condition.condition_type, "Ready");
        assert!(condition.is_false());
        assert_eq!(condition.message.as_deref(), Some("authentication required"));
    }

    #[test]
    fn test_find_condition() {
        let conditions = vec![
            Condition {
                condition_type: "Reconciling".to_string(),
                status: "True".to_string(),
                ..Default::default()
            },
            Condition {
                condition_type: "Ready".to_string(),
                status: "True".to_string(),
                ..Default::default()
            },
        ];

        assert!(find_condition(&conditions, "Ready").is_some_and(Condition::is_true));
        assert!(find_condition(&conditions, "Stalled").is_none());
    }
}

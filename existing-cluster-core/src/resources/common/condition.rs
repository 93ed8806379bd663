use std::fmt::Display;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
pub enum ConditionType {
    /// the resource is ready for use
    Ready,
    /// the last reconciliation of the resource succeeded
    Synced,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq, JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
pub enum ConditionReason {
    Available,
    Unavailable,
    Creating,
    Deleting,
    ReconcileSuccess,
    ReconcileError,
}

impl Display for ConditionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConditionReason::Available => f.write_str("resource is available for use"),
            ConditionReason::Unavailable => f.write_str("resource is not available for use"),
            ConditionReason::Creating => f.write_str("resource is being created"),
            ConditionReason::Deleting => f.write_str("resource is being deleted"),
            ConditionReason::ReconcileSuccess => f.write_str("reconcile succeeded"),
            ConditionReason::ReconcileError => f.write_str("reconcile failed"),
        }
    }
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: ConditionType,
    pub status: ConditionStatus,
    /// last time this condition transitioned from one status to another
    pub last_transition_time: DateTime<Utc>,
    /// machine readable reason for the condition's last transition
    pub reason: ConditionReason,
    /// human readable details of the condition's last transition
    pub message: Option<String>,
}

impl Condition {
    fn new(type_: ConditionType, status: ConditionStatus, reason: ConditionReason) -> Self {
        Self {
            type_,
            status,
            last_transition_time: Utc::now(),
            reason,
            message: None,
        }
    }

    pub fn available() -> Self {
        Self::new(
            ConditionType::Ready,
            ConditionStatus::True,
            ConditionReason::Available,
        )
    }

    pub fn unavailable() -> Self {
        Self::new(
            ConditionType::Ready,
            ConditionStatus::False,
            ConditionReason::Unavailable,
        )
    }

    pub fn creating() -> Self {
        Self::new(
            ConditionType::Ready,
            ConditionStatus::False,
            ConditionReason::Creating,
        )
    }

    pub fn deleting() -> Self {
        Self::new(
            ConditionType::Ready,
            ConditionStatus::False,
            ConditionReason::Deleting,
        )
    }

    pub fn reconcile_success() -> Self {
        Self::new(
            ConditionType::Synced,
            ConditionStatus::True,
            ConditionReason::ReconcileSuccess,
        )
    }

    pub fn reconcile_error(error: &impl Display) -> Self {
        Self::new(
            ConditionType::Synced,
            ConditionStatus::False,
            ConditionReason::ReconcileError,
        )
        .with_message(error.to_string())
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());

        self
    }

    /// Compares two conditions ignoring their transition time.
    pub fn equal(&self, other: &Condition) -> bool {
        self.type_ == other.type_
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// Merges `new` into `existing`, keeping at most one condition per type.
///
/// A condition equal to the one already present is skipped, so its
/// `last_transition_time` only moves when something actually changed.
pub fn set_conditions(existing: &mut Vec<Condition>, new: impl IntoIterator<Item = Condition>) {
    for condition in new {
        match existing.iter_mut().find(|c| c.type_ == condition.type_) {
            Some(current) if current.equal(&condition) => (),
            Some(current) => *current = condition,
            None => existing.push(condition),
        }
    }
}

pub fn get_condition(conditions: &[Condition], type_: ConditionType) -> Option<&Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{get_condition, set_conditions, Condition, ConditionReason, ConditionType};

    #[test]
    fn set_conditions_keeps_one_condition_per_type() {
        let mut conditions = vec![Condition::creating(), Condition::reconcile_success()];

        set_conditions(&mut conditions, [Condition::available()]);

        assert_eq!(conditions.len(), 2);
        assert_eq!(
            get_condition(&conditions, ConditionType::Ready).unwrap().reason,
            ConditionReason::Available
        );
    }

    #[test]
    fn set_conditions_preserves_transition_time_of_equal_condition() {
        let mut old = Condition::available();
        old.last_transition_time = Utc.with_ymd_and_hms(2019, 10, 1, 12, 0, 0).unwrap();
        let mut conditions = vec![old.clone()];

        set_conditions(&mut conditions, [Condition::available()]);

        assert_eq!(conditions, vec![old]);
    }

    #[test]
    fn set_conditions_replaces_changed_message() {
        let mut conditions = vec![Condition::reconcile_error(&"boom")];

        set_conditions(&mut conditions, [Condition::reconcile_error(&"bang")]);

        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].message.as_deref(), Some("bang"));
    }

    #[test]
    fn conditions_serialize_with_kubernetes_field_names() {
        let value = serde_json::to_value(Condition::reconcile_success()).unwrap();

        assert_eq!(value["type"], "Synced");
        assert_eq!(value["status"], "True");
        assert_eq!(value["reason"], "ReconcileSuccess");
        assert!(value.get("lastTransitionTime").is_some());
        assert!(value.get("message").is_none());
    }
}

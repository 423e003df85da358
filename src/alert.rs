//! Alert rules: ordered conditions that give a row or a cell a status and a badge.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

use crate::value::{display_string, strict_equals, to_number, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertOperator {
    Lt,
    Lte,
    Eq,
    Gt,
    Gte,
    Regex,
    /// Operator name the engine does not know; the rule never matches.
    #[serde(other)]
    Unsupported,
}

impl AlertOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertOperator::Lt => "lt",
            AlertOperator::Lte => "lte",
            AlertOperator::Eq => "eq",
            AlertOperator::Gt => "gt",
            AlertOperator::Gte => "gte",
            AlertOperator::Regex => "regex",
            AlertOperator::Unsupported => "unsupported",
        }
    }
}

/// Entry of `alerts[]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRule {
    pub field_name: String,
    #[serde(rename = "functionName")]
    pub operator: AlertOperator,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub badge: Option<String>,
}

impl AlertRule {
    pub fn new(
        field_name: impl Into<String>,
        operator: AlertOperator,
        value: Value,
        state: impl Into<String>,
        badge: impl Into<String>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            operator,
            value,
            state: Some(state.into()),
            badge: Some(badge.into()),
        }
    }
}

/// Outcome of evaluating the rules for a row or a cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertStatus {
    pub state: Option<String>,
    pub badge: Option<String>,
}

impl AlertStatus {
    pub fn is_set(&self) -> bool {
        self.state.is_some() || self.badge.is_some()
    }
}

/// A rule with its regex compiled once.
#[derive(Debug, Clone)]
struct CompiledRule {
    rule: AlertRule,
    pattern: Option<Regex>,
}

impl CompiledRule {
    fn new(rule: AlertRule) -> Self {
        let pattern = match rule.operator {
            AlertOperator::Regex => {
                let source = display_string(&rule.value);
                match RegexBuilder::new(&source).case_insensitive(true).build() {
                    Ok(re) => Some(re),
                    Err(e) => {
                        log::warn!(
                            "Alert rule on '{}' has an invalid pattern {:?}: {}",
                            rule.field_name,
                            source,
                            e
                        );
                        None
                    }
                }
            }
            _ => None,
        };
        Self { rule, pattern }
    }

    fn matches(&self, field_value: &Value) -> bool {
        let expected = &self.rule.value;
        match self.rule.operator {
            AlertOperator::Eq => strict_equals(field_value, expected),
            AlertOperator::Lt => loose_compare(field_value, expected) == Some(Ordering::Less),
            AlertOperator::Lte => matches!(
                loose_compare(field_value, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
            AlertOperator::Gt => loose_compare(field_value, expected) == Some(Ordering::Greater),
            AlertOperator::Gte => matches!(
                loose_compare(field_value, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            AlertOperator::Regex => self
                .pattern
                .as_ref()
                .is_some_and(|re| re.is_match(&display_string(field_value))),
            AlertOperator::Unsupported => false,
        }
    }
}

/// Relational comparison: two strings compare as text, anything else numerically.
/// `None` when either side is not a number.
fn loose_compare(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Value::String(x), Value::String(y)) = (a, b) {
        return Some(x.cmp(y));
    }
    to_number(a)?.partial_cmp(&to_number(b)?)
}

/// Ordered alert rules, ready for evaluation.
#[derive(Debug, Clone, Default)]
pub struct AlertRules {
    rules: Vec<CompiledRule>,
}

impl AlertRules {
    pub fn new(rules: &[AlertRule]) -> Self {
        Self {
            rules: rules.iter().cloned().map(CompiledRule::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Status from the first rule that matches.
    ///
    /// With a `target` field only rules on that field are considered. Rules on
    /// fields the row does not have are skipped.
    pub fn evaluate(&self, row: &Row, target: Option<&str>) -> AlertStatus {
        for compiled in &self.rules {
            let rule = &compiled.rule;
            if target.is_some_and(|t| t != rule.field_name) {
                continue;
            }
            let Some(field_value) = row.get(&rule.field_name) else {
                continue;
            };
            if compiled.matches(field_value) {
                return AlertStatus {
                    state: rule.state.clone(),
                    badge: rule.badge.clone(),
                };
            }
        }
        AlertStatus::default()
    }

    /// Row class name from the row-level status, e.g. `table-status-warn`.
    pub fn row_class_name(&self, row: &Row) -> Option<String> {
        self.evaluate(row, None)
            .state
            .filter(|s| !s.is_empty())
            .map(|state| format!("table-status-{}", state))
    }
}

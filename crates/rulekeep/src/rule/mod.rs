pub mod schema;
pub mod validate;

use std::path::Path;

pub use schema::{
    Action, ArchiveFormat, Condition, ConditionGroup, ConflictResolution, DateOp, KindOp,
    MatchType, Rule, SizeOp, SizeUnit, StringOp, TimeOp, TimeUnit,
};
pub use validate::validate_rule;

use crate::error::RuleError;

/// Parses and validates a rule list from JSON. Every rule is validated
/// before any is returned, so a single bad rule rejects the whole load.
pub fn load_rules_from_str(content: &str) -> Result<Vec<Rule>, RuleError> {
    let rules: Vec<Rule> = serde_json::from_str(content)?;
    for rule in &rules {
        validate_rule(rule)?;
    }
    Ok(rules)
}

pub fn load_rules<P: AsRef<Path>>(path: P) -> Result<Vec<Rule>, RuleError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| RuleError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    load_rules_from_str(&content)
}

/// Rewrites positions to be dense and unique, preserving the current order
/// (stable on equal positions). Call after any reorder, insert or delete for
/// one folder's rules; the invariant is that positions within a folder are
/// always 0..n.
pub fn normalize_positions(rules: &mut [Rule]) {
    rules.sort_by_key(|r| r.position);
    for (i, rule) in rules.iter_mut().enumerate() {
        rule.position = i as u32;
    }
}

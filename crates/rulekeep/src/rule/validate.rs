use crate::error::RuleError;
use crate::rule::schema::{Action, Condition, ConditionGroup, DateOp, Rule, SizeOp};

/// Validates a rule before it reaches the scheduler or the preview path.
/// Rejected rules never evaluate.
pub fn validate_rule(rule: &Rule) -> Result<(), RuleError> {
    if rule.name.trim().is_empty() {
        return Err(invalid(rule, "Rule name must not be empty"));
    }

    validate_group(&rule.conditions, rule)?;

    for action in &rule.actions {
        validate_action(action, rule)?;
    }

    Ok(())
}

fn invalid(rule: &Rule, reason: impl Into<String>) -> RuleError {
    RuleError::Invalid {
        id: rule.id.clone(),
        reason: reason.into(),
    }
}

fn validate_group(group: &ConditionGroup, rule: &Rule) -> Result<(), RuleError> {
    for condition in &group.conditions {
        validate_condition(condition, rule)?;
    }
    Ok(())
}

fn validate_condition(condition: &Condition, rule: &Rule) -> Result<(), RuleError> {
    match condition {
        Condition::Name { op, value, .. }
        | Condition::Extension { op, value, .. }
        | Condition::FullName { op, value, .. } => {
            if value.is_empty() {
                return Err(invalid(rule, "String condition value must not be empty"));
            }
            if op.is_regex() {
                regex::Regex::new(value).map_err(|e| RuleError::InvalidRegex {
                    id: rule.id.clone(),
                    pattern: value.clone(),
                    reason: e.to_string(),
                })?;
            }
        }
        Condition::Size { op, .. } => {
            if let SizeOp::Between { min, max } = op {
                if min > max {
                    return Err(invalid(
                        rule,
                        format!("Size range is inverted: min {} > max {}", min, max),
                    ));
                }
            }
        }
        Condition::DateCreated { op }
        | Condition::DateModified { op }
        | Condition::DateAdded { op } => match op {
            DateOp::Between { start, end } if start > end => {
                return Err(invalid(
                    rule,
                    format!("Date range is inverted: {} is after {}", start, end),
                ));
            }
            DateOp::InTheLast { amount, .. } | DateOp::NotInTheLast { amount, .. }
                if *amount == 0 =>
            {
                return Err(invalid(rule, "inTheLast amount must be at least 1"));
            }
            _ => {}
        },
        // A time window with start > end wraps past midnight and is legal.
        Condition::CurrentTime { .. } => {}
        Condition::Kind { .. } => {}
        Condition::ShellScript { command } => {
            if command.trim().is_empty() {
                return Err(invalid(rule, "Shell script command must not be empty"));
            }
        }
        Condition::Nested { group } => validate_group(group, rule)?,
    }
    Ok(())
}

fn validate_action(action: &Action, rule: &Rule) -> Result<(), RuleError> {
    match action {
        Action::Move { destination, .. }
        | Action::Copy { destination, .. }
        | Action::SortIntoSubfolder { destination, .. }
        | Action::Archive { destination, .. } => {
            if destination.trim().is_empty() {
                return Err(invalid(rule, "Destination pattern must not be empty"));
            }
        }
        Action::Rename { pattern, .. } => {
            if pattern.trim().is_empty() {
                return Err(invalid(rule, "Rename pattern must not be empty"));
            }
        }
        Action::RunScript { command } => {
            if command.trim().is_empty() {
                return Err(invalid(rule, "Script command must not be empty"));
            }
        }
        Action::Notify { message } => {
            if message.trim().is_empty() {
                return Err(invalid(rule, "Notification message must not be empty"));
            }
        }
        Action::OpenWith { app } => {
            if app.trim().is_empty() {
                return Err(invalid(rule, "Application path must not be empty"));
            }
        }
        Action::Pause { seconds } => {
            if *seconds == 0 {
                return Err(invalid(rule, "Pause duration must be at least 1 second"));
            }
        }
        Action::Unarchive { .. }
        | Action::Delete
        | Action::DeletePermanently
        | Action::Open
        | Action::ShowInFileManager
        | Action::MakePdfSearchable
        | Action::Continue
        | Action::Ignore => {}
    }
    Ok(())
}

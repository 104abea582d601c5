use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Local, Months, NaiveTime, Timelike};
use regex::Regex;

use crate::metadata::FileMetadata;
use crate::rule::{
    Condition, ConditionGroup, DateOp, KindOp, MatchType, Rule, SizeOp, SizeUnit, StringOp, TimeOp,
    TimeUnit,
};
use crate::script::ScriptRunner;

/// Evaluates condition trees against file metadata.
///
/// Evaluation is depth-first, left to right, and short-circuits per match
/// type: `all` stops at the first false element, `any` and `none` at the
/// first true one. Shell-script leaves after the short-circuit point are
/// therefore never invoked.
pub struct RuleMatcher {
    /// Pre-compiled regex patterns, keyed by the effective pattern string
    /// (case-insensitivity folded in at compile time).
    compiled_patterns: HashMap<String, Regex>,
    script_runner: Arc<dyn ScriptRunner>,
}

impl RuleMatcher {
    /// Builds a matcher for a rule snapshot, pre-compiling every regex the
    /// snapshot references. Patterns that fail to compile are absent from
    /// the cache and their conditions fail closed.
    pub fn for_rules(rules: &[Rule], script_runner: Arc<dyn ScriptRunner>) -> Self {
        let mut compiled_patterns = HashMap::new();
        for rule in rules {
            Self::collect_patterns(&rule.conditions, &mut compiled_patterns);
        }

        Self {
            compiled_patterns,
            script_runner,
        }
    }

    /// Matcher for a single rule or draft (preview path).
    pub fn for_rule(rule: &Rule, script_runner: Arc<dyn ScriptRunner>) -> Self {
        Self::for_rules(std::slice::from_ref(rule), script_runner)
    }

    fn collect_patterns(group: &ConditionGroup, patterns: &mut HashMap<String, Regex>) {
        for condition in &group.conditions {
            match condition {
                Condition::Name {
                    op,
                    value,
                    case_sensitive,
                }
                | Condition::Extension {
                    op,
                    value,
                    case_sensitive,
                }
                | Condition::FullName {
                    op,
                    value,
                    case_sensitive,
                } if op.is_regex() => {
                    let effective = effective_pattern(value, *case_sensitive);
                    if !patterns.contains_key(&effective) {
                        if let Ok(regex) = Regex::new(&effective) {
                            patterns.insert(effective, regex);
                        }
                    }
                }
                Condition::Nested { group } => {
                    Self::collect_patterns(group, patterns);
                }
                _ => {}
            }
        }
    }

    /// Recursively evaluates a group. Empty `all` and `none` groups are
    /// vacuously true; an empty `any` group is false.
    pub fn matches_group(&self, group: &ConditionGroup, meta: &FileMetadata) -> bool {
        let now = Local::now();
        self.matches_group_at(group, meta, now)
    }

    pub(crate) fn matches_group_at(
        &self,
        group: &ConditionGroup,
        meta: &FileMetadata,
        now: DateTime<Local>,
    ) -> bool {
        match group.match_type {
            MatchType::All => group
                .conditions
                .iter()
                .all(|c| self.matches_condition_at(c, meta, now)),
            MatchType::Any => group
                .conditions
                .iter()
                .any(|c| self.matches_condition_at(c, meta, now)),
            MatchType::None => !group
                .conditions
                .iter()
                .any(|c| self.matches_condition_at(c, meta, now)),
        }
    }

    /// Evaluates the top-level conditions of a group individually, for
    /// explain-why-it-matched previews.
    pub fn explain_group(&self, group: &ConditionGroup, meta: &FileMetadata) -> Vec<bool> {
        let now = Local::now();
        group
            .conditions
            .iter()
            .map(|c| self.matches_condition_at(c, meta, now))
            .collect()
    }

    /// Evaluates one leaf condition. Fails closed: a condition whose
    /// required metadata is unavailable returns false.
    pub fn matches_condition(&self, condition: &Condition, meta: &FileMetadata) -> bool {
        self.matches_condition_at(condition, meta, Local::now())
    }

    fn matches_condition_at(
        &self,
        condition: &Condition,
        meta: &FileMetadata,
        now: DateTime<Local>,
    ) -> bool {
        match condition {
            Condition::Name {
                op,
                value,
                case_sensitive,
            } => self.matches_string(&meta.name, *op, value, *case_sensitive),
            Condition::Extension {
                op,
                value,
                case_sensitive,
            } => self.matches_string(&meta.extension, *op, value, *case_sensitive),
            Condition::FullName {
                op,
                value,
                case_sensitive,
            } => self.matches_string(&meta.full_name, *op, value, *case_sensitive),
            Condition::Size { op, unit } => match meta.size {
                Some(size) => matches_size(size, *op, unit.multiplier()),
                None => false,
            },
            Condition::DateCreated { op } => matches_date(meta.created, *op, now),
            Condition::DateModified { op } => matches_date(meta.modified, *op, now),
            Condition::DateAdded { op } => matches_date(meta.added, *op, now),
            Condition::CurrentTime { op } => matches_time(now.time(), *op),
            Condition::Kind { op, kind } => match op {
                KindOp::Is => meta.kind == *kind,
                KindOp::IsNot => meta.kind != *kind,
            },
            Condition::ShellScript { command } => {
                matches!(self.script_runner.run(command, &meta.path), Ok(0))
            }
            Condition::Nested { group } => self.matches_group_at(group, meta, now),
        }
    }

    fn matches_string(
        &self,
        subject: &str,
        op: StringOp,
        value: &str,
        case_sensitive: bool,
    ) -> bool {
        if op.is_regex() {
            let effective = effective_pattern(value, case_sensitive);
            let Some(regex) = self.compiled_patterns.get(&effective) else {
                // Uncompilable pattern: fail closed.
                return false;
            };
            let hit = regex.is_match(subject);
            return match op {
                StringOp::Matches => hit,
                _ => !hit,
            };
        }

        let (subject, value) = if case_sensitive {
            (subject.to_string(), value.to_string())
        } else {
            (subject.to_lowercase(), value.to_lowercase())
        };

        match op {
            StringOp::Is => subject == value,
            StringOp::IsNot => subject != value,
            StringOp::Contains => subject.contains(&value),
            StringOp::DoesNotContain => !subject.contains(&value),
            StringOp::StartsWith => subject.starts_with(&value),
            StringOp::EndsWith => subject.ends_with(&value),
            StringOp::Matches | StringOp::DoesNotMatch => unreachable!("handled above"),
        }
    }
}

fn effective_pattern(value: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        value.to_string()
    } else {
        format!("(?i){}", value)
    }
}

fn matches_size(size: u64, op: SizeOp, multiplier: u64) -> bool {
    let size = size as f64;
    let scale = multiplier as f64;
    match op {
        SizeOp::Equals { value } => size == (value * scale).round(),
        SizeOp::NotEquals { value } => size != (value * scale).round(),
        SizeOp::GreaterThan { value } => size > value * scale,
        SizeOp::LessThan { value } => size < value * scale,
        SizeOp::GreaterOrEqual { value } => size >= value * scale,
        SizeOp::LessOrEqual { value } => size <= value * scale,
        SizeOp::Between { min, max } => size >= min * scale && size <= max * scale,
    }
}

fn matches_date(timestamp: Option<DateTime<Local>>, op: DateOp, now: DateTime<Local>) -> bool {
    let Some(ts) = timestamp else {
        return false;
    };
    let day = ts.date_naive();

    match op {
        DateOp::Is { date } => day == date,
        DateOp::IsBefore { date } => day < date,
        DateOp::IsAfter { date } => day > date,
        DateOp::Between { start, end } => day >= start && day <= end,
        DateOp::InTheLast { amount, unit } => match threshold(now, amount, unit) {
            Some(t) => ts >= t,
            None => false,
        },
        DateOp::NotInTheLast { amount, unit } => match threshold(now, amount, unit) {
            Some(t) => ts < t,
            None => false,
        },
    }
}

fn threshold(now: DateTime<Local>, amount: u32, unit: TimeUnit) -> Option<DateTime<Local>> {
    match unit {
        TimeUnit::Minutes => now.checked_sub_signed(Duration::minutes(amount as i64)),
        TimeUnit::Hours => now.checked_sub_signed(Duration::hours(amount as i64)),
        TimeUnit::Days => now.checked_sub_signed(Duration::days(amount as i64)),
        TimeUnit::Weeks => now.checked_sub_signed(Duration::weeks(amount as i64)),
        TimeUnit::Months => now.checked_sub_months(Months::new(amount)),
        TimeUnit::Years => now.checked_sub_months(Months::new(amount.saturating_mul(12))),
    }
}

fn matches_time(now: NaiveTime, op: TimeOp) -> bool {
    match op {
        // Clock equality is to the minute; second-exact never fires.
        TimeOp::Is { time } => now.hour() == time.hour() && now.minute() == time.minute(),
        TimeOp::IsBefore { time } => now < time,
        TimeOp::IsAfter { time } => now > time,
        TimeOp::Between { start, end } => {
            if start <= end {
                now >= start && now <= end
            } else {
                // Window wraps past midnight, e.g. 22:00 to 06:00.
                now >= start || now <= end
            }
        }
    }
}

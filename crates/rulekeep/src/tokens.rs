use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};

use crate::metadata::FileMetadata;

/// Everything `resolve` is allowed to see. Built once per file evaluation so
/// that resolution itself is pure: the same context and pattern always yield
/// the same string, in preview and in live execution alike.
#[derive(Debug, Clone)]
pub struct TokenContext {
    pub name: String,
    pub extension: String,
    pub full_name: String,
    /// Timestamp driving the date/time tokens: the file's creation time,
    /// falling back to modification time, falling back to `now`.
    pub timestamp: DateTime<Local>,
    /// Caller-supplied sequence number for `{counter}`.
    pub counter: u64,
    /// Pre-drawn value for `{random}`, stable for the lifetime of this
    /// context.
    pub random: String,
}

impl TokenContext {
    pub fn from_metadata(meta: &FileMetadata, counter: u64) -> Self {
        Self::build(meta, counter, draw_random())
    }

    /// Preview variant: `{random}` is derived from the file path so that
    /// re-running an unchanged preview yields identical output.
    pub fn deterministic(meta: &FileMetadata, counter: u64) -> Self {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        meta.path.hash(&mut hasher);
        let random = format!("{:08x}", (hasher.finish() & 0xffff_ffff) as u32);
        Self::build(meta, counter, random)
    }

    fn build(meta: &FileMetadata, counter: u64, random: String) -> Self {
        let timestamp = meta.created.or(meta.modified).unwrap_or_else(Local::now);
        Self {
            name: meta.name.clone(),
            extension: meta.extension.clone(),
            full_name: meta.full_name.clone(),
            timestamp,
            counter,
            random,
        }
    }
}

fn draw_random() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Resolves `{token}` and `{token:format}` placeholders in `pattern`.
///
/// Unknown or malformed tokens are left verbatim so a typo degrades to a
/// literal string instead of failing the pipeline.
pub fn resolve(pattern: &str, ctx: &TokenContext) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open..];

        let Some(close) = after_open.find('}') else {
            // Unterminated token, keep the remainder verbatim.
            out.push_str(after_open);
            return out;
        };

        let inner = &after_open[1..close];
        let (token, format) = match inner.split_once(':') {
            Some((t, f)) => (t, Some(f)),
            None => (inner, None),
        };

        match expand(token, format, ctx) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&after_open[..=close]),
        }

        rest = &after_open[close + 1..];
    }

    out.push_str(rest);
    out
}

fn expand(token: &str, format: Option<&str>, ctx: &TokenContext) -> Option<String> {
    let value = match token {
        "name" => ctx.name.clone(),
        "ext" => ctx.extension.clone(),
        "fullname" => ctx.full_name.clone(),
        "date" => format_timestamp(ctx, format, "%Y-%m-%d"),
        "time" => format_timestamp(ctx, format, "%H-%M-%S"),
        "year" => format_timestamp(ctx, format, "%Y"),
        "month" => format_timestamp(ctx, format, "%m"),
        "day" => format_timestamp(ctx, format, "%d"),
        "hour" => format_timestamp(ctx, format, "%H"),
        "minute" => format_timestamp(ctx, format, "%M"),
        "second" => format_timestamp(ctx, format, "%S"),
        "weekday" => format_timestamp(ctx, format, "%A"),
        "monthname" => format_timestamp(ctx, format, "%B"),
        "counter" => format_counter(ctx.counter, format),
        "random" => ctx.random.clone(),
        _ => return None,
    };
    Some(value)
}

/// Applies a strftime modifier when it is present and valid, otherwise the
/// token's default format. Invalid modifiers are ignored rather than failing.
fn format_timestamp(ctx: &TokenContext, format: Option<&str>, default: &str) -> String {
    let fmt = match format {
        Some(f) if f.contains('%') && is_valid_strftime(f) => f,
        _ => default,
    };
    ctx.timestamp.format(fmt).to_string()
}

fn is_valid_strftime(fmt: &str) -> bool {
    StrftimeItems::new(fmt).all(|item| !matches!(item, Item::Error))
}

/// `{counter:N}` zero-pads to width N.
fn format_counter(counter: u64, format: Option<&str>) -> String {
    match format.and_then(|f| f.parse::<usize>().ok()) {
        Some(width) => format!("{:0width$}", counter, width = width),
        None => counter.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_context() -> TokenContext {
        TokenContext {
            name: "invoice".to_string(),
            extension: "pdf".to_string(),
            full_name: "invoice.pdf".to_string(),
            timestamp: Local.with_ymd_and_hms(2024, 3, 7, 14, 5, 9).unwrap(),
            counter: 4,
            random: "1a2b3c4d".to_string(),
        }
    }

    #[test]
    fn test_name_and_ext_roundtrip() {
        let ctx = test_context();
        assert_eq!(resolve("{name}.{ext}", &ctx), "invoice.pdf");
        assert_eq!(resolve("{fullname}", &ctx), "invoice.pdf");
    }

    #[test]
    fn test_date_parts() {
        let ctx = test_context();
        assert_eq!(resolve("{year}/{month}/{day}", &ctx), "2024/03/07");
        assert_eq!(resolve("{date}", &ctx), "2024-03-07");
        assert_eq!(resolve("{time}", &ctx), "14-05-09");
        assert_eq!(
            resolve("{hour}:{minute}:{second}", &ctx),
            "14:05:09"
        );
        assert_eq!(resolve("{monthname}", &ctx), "March");
        assert_eq!(resolve("{weekday}", &ctx), "Thursday");
    }

    #[test]
    fn test_unknown_token_left_verbatim() {
        let ctx = test_context();
        assert_eq!(resolve("{unknown_token}", &ctx), "{unknown_token}");
        assert_eq!(
            resolve("/dest/{nope}/{name}", &ctx),
            "/dest/{nope}/invoice"
        );
    }

    #[test]
    fn test_malformed_token_left_verbatim() {
        let ctx = test_context();
        assert_eq!(resolve("prefix {name", &ctx), "prefix {name");
        assert_eq!(resolve("{}", &ctx), "{}");
        assert_eq!(resolve("no tokens here", &ctx), "no tokens here");
    }

    #[test]
    fn test_format_modifier_strftime() {
        let ctx = test_context();
        assert_eq!(resolve("{date:%d.%m.%Y}", &ctx), "07.03.2024");
        assert_eq!(resolve("{year:%y}", &ctx), "24");
    }

    #[test]
    fn test_unrecognized_modifier_ignored() {
        let ctx = test_context();
        // Not a strftime string: fall back to the token's default format.
        assert_eq!(resolve("{date:fancy}", &ctx), "2024-03-07");
        // Invalid specifier likewise.
        assert_eq!(resolve("{date:%Q%Z!}", &ctx), "2024-03-07");
        // Non-date tokens ignore modifiers entirely.
        assert_eq!(resolve("{name:upper}", &ctx), "invoice");
    }

    #[test]
    fn test_counter_and_padding() {
        let ctx = test_context();
        assert_eq!(resolve("{counter}", &ctx), "4");
        assert_eq!(resolve("{counter:3}", &ctx), "004");
    }

    #[test]
    fn test_random_stable_within_context() {
        let ctx = test_context();
        assert_eq!(resolve("{random}-{random}", &ctx), "1a2b3c4d-1a2b3c4d");
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let ctx = test_context();
        let a = resolve("/Documents/{year}/{month}/{name}.{ext}", &ctx);
        let b = resolve("/Documents/{year}/{month}/{name}.{ext}", &ctx);
        assert_eq!(a, b);
        assert_eq!(a, "/Documents/2024/03/invoice.pdf");
    }

    #[test]
    fn test_from_metadata_falls_back_to_modified() {
        let meta = crate::metadata::FileMetadata {
            path: "/in/a.txt".into(),
            name: "a".to_string(),
            extension: "txt".to_string(),
            full_name: "a.txt".to_string(),
            size: Some(1),
            created: None,
            modified: Some(Local.with_ymd_and_hms(2023, 12, 31, 8, 0, 0).unwrap()),
            added: None,
            kind: crate::metadata::FileKind::Text,
            is_dir: false,
        };

        let ctx = TokenContext::from_metadata(&meta, 0);
        assert_eq!(resolve("{year}", &ctx), "2023");
        assert_eq!(ctx.random.len(), 8);
    }
}

//! Dynamic variables: `{{$function arguments}}`.
//!
//! | Function | Arguments | Result |
//! |---|---|---|
//! | `guid` | none | fresh UUID v4 |
//! | `timestamp` | `[offset unit]` | Unix seconds |
//! | `datetime` | `[format] [offset unit]` | UTC date-time |
//! | `localDatetime` | `[format] [offset unit]` | local date-time |
//! | `randomInt` | `[min] [max]` | integer in `[min, max)` |
//! | `processEnv`, `dotEnv` | `[%]NAME` | environment value or empty |
//!
//! Formats are `rfc1123`, `iso8601` (the default) or a custom .NET-style
//! pattern such as `'yyyy-MM-dd'`. Offsets are a signed integer and a unit
//! from `ms s m h d w M y`, written `-1 d` or `-1d`.
//!
//! Unknown functions and malformed arguments never fail: the placeholder is
//! kept verbatim.

use super::{EnvProvider, ProcessEnv};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, Months, SecondsFormat, TimeDelta, Utc};
use log::trace;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use std::fmt;
use uuid::Uuid;

static OFFSET_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?\d+)\s*(ms|s|m|h|d|w|M|y)$").expect("Failed to compile offset regex")
});

static DEFAULT_RESOLVER: Lazy<DynamicResolver> = Lazy::new(DynamicResolver::new);

const RFC1123_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Resolves a dynamic variable against the process environment and the
/// current time.
///
/// # Arguments
///
/// * `name` - Function name without the `$` (e.g., "guid", "datetime")
/// * `args` - Raw argument text, if any
///
/// # Returns
///
/// The generated value, or the original `{{$name args}}` text when the
/// function is unknown or its arguments are malformed.
///
/// # Examples
///
/// ```
/// use restfile::variables::dynamic::resolve_dynamic_variable;
///
/// let id = resolve_dynamic_variable("guid", None);
/// assert_eq!(id.len(), 36);
///
/// let n: i64 = resolve_dynamic_variable("randomInt", Some("10 20")).parse().unwrap();
/// assert!((10..20).contains(&n));
///
/// assert_eq!(resolve_dynamic_variable("nope", Some("x")), "{{$nope x}}");
/// ```
pub fn resolve_dynamic_variable(name: &str, args: Option<&str>) -> String {
    DEFAULT_RESOLVER.resolve(name, args)
}

pub(crate) fn default_resolver() -> &'static DynamicResolver {
    &DEFAULT_RESOLVER
}

/// Evaluates dynamic variables with an injectable clock and environment.
pub struct DynamicResolver {
    now: Option<DateTime<Utc>>,
    env: Box<dyn EnvProvider>,
}

impl fmt::Debug for DynamicResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicResolver")
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

impl Default for DynamicResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicResolver {
    /// Resolver using the wall clock and the process environment.
    pub fn new() -> Self {
        Self {
            now: None,
            env: Box::new(ProcessEnv),
        }
    }

    /// Uses `env` for `processEnv`/`dotEnv` lookups.
    pub fn with_env(mut self, env: impl EnvProvider + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    /// Pins "now", making date and time functions deterministic.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    /// Resolves `{{$name args}}`, returning the placeholder text unchanged
    /// when it cannot be evaluated.
    pub fn resolve(&self, name: &str, args: Option<&str>) -> String {
        self.try_resolve(name, args)
            .unwrap_or_else(|| placeholder(name, args))
    }

    /// Resolves `{{$name args}}`, or `None` for unknown functions and
    /// malformed arguments.
    pub fn try_resolve(&self, name: &str, args: Option<&str>) -> Option<String> {
        let tokens = tokenize(args.unwrap_or(""));
        let value = match name {
            "guid" => Some(Uuid::new_v4().to_string()),
            "timestamp" => self.timestamp(&tokens),
            "datetime" => self.datetime(&tokens, false),
            "localDatetime" => self.datetime(&tokens, true),
            "randomInt" => random_int(&tokens),
            "processEnv" | "dotEnv" | "dotenv" => self.env_value(&tokens),
            _ => None,
        };
        if value.is_none() {
            trace!("dynamic variable ${} {:?} left unresolved", name, args);
        }
        value
    }

    fn timestamp(&self, tokens: &[Token]) -> Option<String> {
        let offset = parse_offset(tokens)?;
        let at = apply_offset(self.now(), offset)?;
        Some(at.timestamp().to_string())
    }

    fn datetime(&self, tokens: &[Token], local: bool) -> Option<String> {
        let (format, rest) = match tokens.split_first() {
            Some((first, rest)) if first.quoted || !starts_like_offset(&first.text) => {
                (Some(first), rest)
            }
            _ => (None, tokens),
        };
        let offset = parse_offset(rest)?;
        let at = apply_offset(self.now(), offset)?;

        let pattern = match format {
            Some(token) if !token.quoted && token.text.eq_ignore_ascii_case("rfc1123") => {
                return Some(at.format(RFC1123_FORMAT).to_string());
            }
            Some(token) if !token.quoted && token.text.eq_ignore_ascii_case("iso8601") => None,
            Some(token) => convert_custom_format(&token.text),
            None => None,
        };

        Some(match (pattern, local) {
            (Some(p), false) => at.format(&p).to_string(),
            (Some(p), true) => at.with_timezone(&Local).format(&p).to_string(),
            (None, false) => at.to_rfc3339_opts(SecondsFormat::Millis, true),
            (None, true) => at
                .with_timezone(&Local)
                .to_rfc3339_opts(SecondsFormat::Millis, false),
        })
    }

    fn env_value(&self, tokens: &[Token]) -> Option<String> {
        let name = tokens.first()?.text.trim_start_matches('%');
        if name.is_empty() {
            return None;
        }
        Some(self.env.get(name).unwrap_or_default())
    }
}

fn placeholder(name: &str, args: Option<&str>) -> String {
    match args.map(str::trim).filter(|a| !a.is_empty()) {
        Some(args) => format!("{{{{${} {}}}}}", name, args),
        None => format!("{{{{${}}}}}", name),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    text: String,
    quoted: bool,
}

/// Splits arguments on whitespace, keeping `'...'` and `"..."` together.
fn tokenize(args: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = args.trim().chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        if ch == '\'' || ch == '"' {
            chars.next();
            let text: String = chars.by_ref().take_while(|&c| c != ch).collect();
            tokens.push(Token { text, quoted: true });
        } else {
            let mut text = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                text.push(c);
                chars.next();
            }
            tokens.push(Token {
                text,
                quoted: false,
            });
        }
    }

    tokens
}

fn starts_like_offset(text: &str) -> bool {
    let digits = text.trim_start_matches(&['+', '-'][..]);
    digits.starts_with(|c: char| c.is_ascii_digit())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OffsetUnit {
    Millis,
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Offset {
    amount: i64,
    unit: OffsetUnit,
}

/// Parses the offset tokens. `Some(None)` means no offset; `None` means the
/// tokens are not a valid offset.
fn parse_offset(tokens: &[Token]) -> Option<Option<Offset>> {
    if tokens.is_empty() {
        return Some(None);
    }
    if tokens.iter().any(|t| t.quoted) {
        return None;
    }

    let joined = tokens
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let caps = OFFSET_REGEX.captures(&joined)?;
    let amount: i64 = caps[1].parse().ok()?;
    let unit = match &caps[2] {
        "ms" => OffsetUnit::Millis,
        "s" => OffsetUnit::Seconds,
        "m" => OffsetUnit::Minutes,
        "h" => OffsetUnit::Hours,
        "d" => OffsetUnit::Days,
        "w" => OffsetUnit::Weeks,
        "M" => OffsetUnit::Months,
        _ => OffsetUnit::Years,
    };
    Some(Some(Offset { amount, unit }))
}

fn apply_offset(base: DateTime<Utc>, offset: Option<Offset>) -> Option<DateTime<Utc>> {
    let Some(Offset { amount, unit }) = offset else {
        return Some(base);
    };

    let delta = match unit {
        OffsetUnit::Millis => TimeDelta::try_milliseconds(amount),
        OffsetUnit::Seconds => TimeDelta::try_seconds(amount),
        OffsetUnit::Minutes => TimeDelta::try_minutes(amount),
        OffsetUnit::Hours => TimeDelta::try_hours(amount),
        OffsetUnit::Days => TimeDelta::try_days(amount),
        OffsetUnit::Weeks => TimeDelta::try_weeks(amount),
        OffsetUnit::Months => return add_months(base, amount),
        OffsetUnit::Years => return add_months(base, amount.checked_mul(12)?),
    };
    base.checked_add_signed(delta?)
}

/// Calendar-aware month arithmetic; day-of-month clamps to the month's end.
fn add_months(base: DateTime<Utc>, amount: i64) -> Option<DateTime<Utc>> {
    let months = Months::new(u32::try_from(amount.unsigned_abs()).ok()?);
    if amount >= 0 {
        base.checked_add_months(months)
    } else {
        base.checked_sub_months(months)
    }
}

/// Translates a .NET-style date pattern (`yyyy-MM-dd HH:mm`) to strftime.
///
/// Returns `None` when the pattern contains no date or time field, or the
/// translation is not a valid strftime string.
fn convert_custom_format(pattern: &str) -> Option<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut recognised = false;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        if ch == '\'' || ch == '"' {
            i += 1;
            while i < chars.len() && chars[i] != ch {
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }
        if ch == '\\' {
            if let Some(&next) = chars.get(i + 1) {
                push_literal(&mut out, next);
            }
            i += 2;
            continue;
        }

        let run = chars[i..].iter().take_while(|&&c| c == ch).count();
        let directive = match (ch, run) {
            ('y', 1) => Some("%-y"),
            ('y', 2) => Some("%y"),
            ('y', _) => Some("%Y"),
            ('M', 1) => Some("%-m"),
            ('M', 2) => Some("%m"),
            ('M', 3) => Some("%b"),
            ('M', _) => Some("%B"),
            ('d', 1) => Some("%-d"),
            ('d', 2) => Some("%d"),
            ('d', 3) => Some("%a"),
            ('d', _) => Some("%A"),
            ('H', 1) => Some("%-H"),
            ('H', _) => Some("%H"),
            ('h', 1) => Some("%-I"),
            ('h', _) => Some("%I"),
            ('m', 1) => Some("%-M"),
            ('m', _) => Some("%M"),
            ('s', 1) => Some("%-S"),
            ('s', _) => Some("%S"),
            ('f', 1..=3) => Some("%3f"),
            ('f', 4..=6) => Some("%6f"),
            ('f', _) => Some("%9f"),
            ('t', _) => Some("%p"),
            ('z', 1 | 2) => Some("%z"),
            ('z', _) | ('K', _) => Some("%:z"),
            _ => None,
        };

        match directive {
            Some(directive) => {
                out.push_str(directive);
                recognised = true;
            }
            None => {
                for _ in 0..run {
                    push_literal(&mut out, ch);
                }
            }
        }
        i += run;
    }

    let valid = !StrftimeItems::new(&out).any(|item| matches!(item, Item::Error));
    (recognised && valid).then_some(out)
}

fn push_literal(out: &mut String, ch: char) {
    if ch == '%' {
        out.push_str("%%");
    } else {
        out.push(ch);
    }
}

fn random_int(tokens: &[Token]) -> Option<String> {
    let bounds = tokens
        .iter()
        .map(|t| t.text.parse::<i64>().ok())
        .collect::<Option<Vec<_>>>()?;

    let (min, max) = match bounds.as_slice() {
        [] => (0, i64::from(i32::MAX)),
        [max] => (0, *max),
        [min, max] => (*min, *max),
        _ => return None,
    };

    if max <= min {
        return Some(min.to_string());
    }
    Some(rand::thread_rng().gen_range(min..max).to_string())
}

//! Leaf rule strings and the checks they expand to
//!
//! A leaf rule looks like `string,required,min=1,max=128`: a base type tag,
//! then modifiers, each optionally carrying a `=argument`. The supported
//! modifiers follow go-playground/validator naming so existing schema files
//! keep their meaning.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::compiler::BaseType;

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
static URL_REGEX: OnceLock<Regex> = OnceLock::new();
static NUMERIC_REGEX: OnceLock<Regex> = OnceLock::new();
static ALPHA_REGEX: OnceLock<Regex> = OnceLock::new();
static ALPHANUM_REGEX: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
            .expect("Failed to compile email regex")
    })
}

fn url_regex() -> &'static Regex {
    URL_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://[^\s/?#]+[^\s]*$")
            .expect("Failed to compile url regex")
    })
}

fn numeric_regex() -> &'static Regex {
    NUMERIC_REGEX.get_or_init(|| {
        Regex::new(r"^[-+]?[0-9]+(?:\.[0-9]+)?$").expect("Failed to compile numeric regex")
    })
}

fn alpha_regex() -> &'static Regex {
    ALPHA_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z]+$").expect("Failed to compile alpha regex"))
}

fn alphanum_regex() -> &'static Regex {
    ALPHANUM_REGEX
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9]+$").expect("Failed to compile alphanum regex"))
}

/// Comparison used by the bound checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Min,
    Max,
    Len,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Bound {
    fn tag(self) -> &'static str {
        match self {
            Bound::Min => "min",
            Bound::Max => "max",
            Bound::Len => "len",
            Bound::Gt => "gt",
            Bound::Gte => "gte",
            Bound::Lt => "lt",
            Bound::Lte => "lte",
        }
    }

    fn holds(self, actual: f64, limit: f64) -> bool {
        match self {
            Bound::Min | Bound::Gte => actual >= limit,
            Bound::Max | Bound::Lte => actual <= limit,
            Bound::Len => actual == limit,
            Bound::Gt => actual > limit,
            Bound::Lt => actual < limit,
        }
    }

    fn describe(self, limit: f64, base: BaseType) -> String {
        match (self, base) {
            (Bound::Min | Bound::Gte, BaseType::String) => {
                format!("must be at least {} characters long", limit)
            }
            (Bound::Max | Bound::Lte, BaseType::String) => {
                format!("must be at most {} characters long", limit)
            }
            (Bound::Len, BaseType::String) => format!("must be exactly {} characters long", limit),
            (Bound::Gt, BaseType::String) => format!("must be longer than {} characters", limit),
            (Bound::Lt, BaseType::String) => format!("must be shorter than {} characters", limit),
            (Bound::Min | Bound::Gte, _) => format!("must be {} or greater", limit),
            (Bound::Max | Bound::Lte, _) => format!("must be {} or less", limit),
            (Bound::Len, _) => format!("must equal {}", limit),
            (Bound::Gt, _) => format!("must be greater than {}", limit),
            (Bound::Lt, _) => format!("must be less than {}", limit),
        }
    }
}

/// String format checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Uuid,
    Email,
    Url,
    Alpha,
    Alphanum,
    Numeric,
    Lowercase,
    Uppercase,
}

impl Format {
    fn parse(tag: &str) -> Option<Self> {
        match tag {
            "uuid" => Some(Format::Uuid),
            "email" => Some(Format::Email),
            "url" => Some(Format::Url),
            "alpha" => Some(Format::Alpha),
            "alphanum" => Some(Format::Alphanum),
            "numeric" => Some(Format::Numeric),
            "lowercase" => Some(Format::Lowercase),
            "uppercase" => Some(Format::Uppercase),
            _ => None,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Format::Uuid => "uuid",
            Format::Email => "email",
            Format::Url => "url",
            Format::Alpha => "alpha",
            Format::Alphanum => "alphanum",
            Format::Numeric => "numeric",
            Format::Lowercase => "lowercase",
            Format::Uppercase => "uppercase",
        }
    }

    fn matches(self, s: &str) -> bool {
        match self {
            // hyphenated form only, like the go validator's uuid tag
            Format::Uuid => s.len() == 36 && uuid::Uuid::try_parse(s).is_ok(),
            Format::Email => email_regex().is_match(s),
            Format::Url => url_regex().is_match(s),
            Format::Alpha => alpha_regex().is_match(s),
            Format::Alphanum => alphanum_regex().is_match(s),
            Format::Numeric => numeric_regex().is_match(s),
            Format::Lowercase => !s.is_empty() && s == s.to_lowercase(),
            Format::Uppercase => !s.is_empty() && s == s.to_uppercase(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Format::Uuid => "must be a valid UUID",
            Format::Email => "must be a valid email address",
            Format::Url => "must be a valid URL",
            Format::Alpha => "must contain only letters",
            Format::Alphanum => "must contain only letters and digits",
            Format::Numeric => "must be a numeric value",
            Format::Lowercase => "must be lowercase",
            Format::Uppercase => "must be uppercase",
        }
    }
}

/// Substring checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affix {
    Contains,
    StartsWith,
    EndsWith,
}

/// A single modifier of a leaf rule
#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    Bound(Bound, f64),
    Eq(String),
    Ne(String),
    OneOf(Vec<String>),
    Format(Format),
    Affix(Affix, String),
    /// Modifier with an argument that could not be interpreted
    InvalidArgument { tag: String, argument: String },
    Unsupported(String),
}

impl Check {
    fn parse(token: &str) -> Self {
        let (tag, argument) = match token.split_once('=') {
            Some((tag, argument)) => (tag, Some(argument)),
            None => (token, None),
        };

        let bound = match tag {
            "min" => Some(Bound::Min),
            "max" => Some(Bound::Max),
            "len" => Some(Bound::Len),
            "gt" => Some(Bound::Gt),
            "gte" => Some(Bound::Gte),
            "lt" => Some(Bound::Lt),
            "lte" => Some(Bound::Lte),
            _ => None,
        };
        if let Some(bound) = bound {
            return match argument.map(|arg| arg.parse::<f64>()) {
                Some(Ok(limit)) => Check::Bound(bound, limit),
                _ => Check::InvalidArgument {
                    tag: tag.to_string(),
                    argument: argument.unwrap_or_default().to_string(),
                },
            };
        }

        match (tag, argument) {
            ("eq", Some(arg)) => Check::Eq(arg.to_string()),
            ("ne", Some(arg)) => Check::Ne(arg.to_string()),
            ("oneof", Some(arg)) => Check::OneOf(split_oneof(arg)),
            ("contains", Some(arg)) => Check::Affix(Affix::Contains, arg.to_string()),
            ("startswith", Some(arg)) => Check::Affix(Affix::StartsWith, arg.to_string()),
            ("endswith", Some(arg)) => Check::Affix(Affix::EndsWith, arg.to_string()),
            ("eq" | "ne" | "oneof" | "contains" | "startswith" | "endswith", None) => {
                Check::InvalidArgument {
                    tag: tag.to_string(),
                    argument: String::new(),
                }
            }
            (tag, None) => match Format::parse(tag) {
                Some(format) => Check::Format(format),
                None => Check::Unsupported(token.to_string()),
            },
            _ => Check::Unsupported(token.to_string()),
        }
    }

    /// Apply the check to a present, correctly typed value
    fn apply(&self, base: BaseType, value: &Value) -> Option<String> {
        match self {
            Check::Bound(bound, limit) => {
                let actual = match (base, value) {
                    (BaseType::String, Value::String(s)) => s.chars().count() as f64,
                    (BaseType::Number, Value::Number(n)) => n.as_f64()?,
                    _ => return Some(format!("{} does not apply to {}", bound.tag(), base)),
                };
                (!bound.holds(actual, *limit)).then(|| bound.describe(*limit, base))
            }
            Check::Eq(expected) => {
                (!equals(value, expected)).then(|| format!("must equal {}", expected))
            }
            Check::Ne(unexpected) => {
                equals(value, unexpected).then(|| format!("must not equal {}", unexpected))
            }
            Check::OneOf(options) => {
                if base == BaseType::Boolean {
                    return Some(format!("oneof does not apply to {}", base));
                }
                (!options.iter().any(|option| equals(value, option)))
                    .then(|| format!("must be one of [{}]", options.join(" ")))
            }
            Check::Format(format) => match value {
                Value::String(s) => (!format.matches(s)).then(|| format.describe().to_string()),
                _ => Some(format!("{} does not apply to {}", format.tag(), base)),
            },
            Check::Affix(affix, needle) => match value {
                Value::String(s) => {
                    let (holds, verb) = match affix {
                        Affix::Contains => (s.contains(needle.as_str()), "contain"),
                        Affix::StartsWith => (s.starts_with(needle.as_str()), "start with"),
                        Affix::EndsWith => (s.ends_with(needle.as_str()), "end with"),
                    };
                    (!holds).then(|| format!("must {} '{}'", verb, needle))
                }
                _ => Some(format!("substring checks do not apply to {}", base)),
            },
            Check::InvalidArgument { tag, argument } => {
                Some(format!("invalid argument '{}' for rule '{}'", argument, tag))
            }
            Check::Unsupported(token) => Some(format!("unsupported rule '{}'", token)),
        }
    }
}

/// A parsed leaf rule string
#[derive(Debug, Clone, PartialEq)]
pub struct LeafRule {
    pub base: Option<BaseType>,
    pub required: bool,
    pub omit_empty: bool,
    pub checks: Vec<Check>,
}

impl LeafRule {
    pub fn parse(rule: &str) -> Self {
        let mut tokens = rule.split(',');
        let base = tokens.next().and_then(BaseType::parse);

        let mut required = false;
        let mut omit_empty = false;
        let mut checks = Vec::new();
        for token in tokens {
            match token {
                "" => {}
                "required" => required = true,
                "omitempty" => omit_empty = true,
                other => checks.push(Check::parse(other)),
            }
        }

        Self {
            base,
            required,
            omit_empty,
            checks,
        }
    }

    /// Evaluate the rule against an optional scalar value, returning every
    /// failure message
    pub fn evaluate(&self, value: Option<&Value>) -> Vec<String> {
        let Some(base) = self.base else {
            return vec!["rule is missing a base type".to_string()];
        };

        let value = match value {
            None | Some(Value::Null) => {
                return if self.required {
                    vec!["is required".to_string()]
                } else {
                    Vec::new()
                };
            }
            Some(value) => value,
        };

        if !matches_base(base, value) {
            return vec![self.type_mismatch(json_kind(value))];
        }

        if self.omit_empty && !self.required && is_empty_value(value) {
            return Vec::new();
        }

        self.checks
            .iter()
            .filter_map(|check| check.apply(base, value))
            .collect()
    }

    /// Message for a value whose kind does not match the base type
    pub fn type_mismatch(&self, actual: &str) -> String {
        match self.base {
            Some(base) => format!("expected a {}, got {}", base, actual),
            None => "rule is missing a base type".to_string(),
        }
    }
}

fn matches_base(base: BaseType, value: &Value) -> bool {
    matches!(
        (base, value),
        (BaseType::String, Value::String(_))
            | (BaseType::Number, Value::Number(_))
            | (BaseType::Boolean, Value::Bool(_))
    )
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Bool(b) => !b,
        _ => false,
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn equals(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        Value::Number(n) => match (n.as_f64(), expected.parse::<f64>()) {
            (Some(actual), Ok(expected)) => actual == expected,
            _ => false,
        },
        Value::Bool(b) => expected.parse::<bool>().is_ok_and(|expected| *b == expected),
        _ => false,
    }
}

/// Split a `oneof` argument on whitespace, keeping 'single quoted' phrases whole
fn split_oneof(argument: &str) -> Vec<String> {
    let mut options = Vec::new();
    let mut chars = argument.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '\'' {
            chars.next();
            let phrase: String = chars.by_ref().take_while(|&c| c != '\'').collect();
            options.push(phrase);
        } else {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                word.push(c);
                chars.next();
            }
            options.push(word);
        }
    }

    options
}

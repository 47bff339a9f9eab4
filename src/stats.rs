//! Column statistic formatting.
//!
//! Each configured rule is looked up by raw stat name and applied in a fixed
//! order: drop, rename, format. Stats without a rule pass through with their
//! value rendered as a plain string.
//!
//! Format strings use a small subset of the Python format mini-language:
//! `{}`, `{:,}`, `{:.2f}`, `{:,.2f}`, `{:d}` and `{:.1%}`, with optional
//! literal text around the placeholder.

use std::collections::HashMap;

use metadata_types::Stat;
use serde_json::Value;

use crate::config::StatFormatRule;
use crate::error::{ProxyError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberSpec {
    Plain,
    Grouped,
    Fixed { precision: usize, grouped: bool },
    Integer,
    Percent { precision: usize },
}

/// A parsed format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatFormat {
    prefix: String,
    suffix: String,
    spec: NumberSpec,
}

impl StatFormat {
    pub fn parse(format: &str) -> Option<Self> {
        let open = format.find('{')?;
        let close = open + format[open..].find('}')?;
        let inner = &format[open + 1..close];
        let spec = match inner.strip_prefix(':') {
            None if inner.is_empty() => NumberSpec::Plain,
            None => return None,
            Some(spec) => parse_spec(spec)?,
        };
        Some(Self {
            prefix: format[..open].to_string(),
            suffix: format[close + 1..].to_string(),
            spec,
        })
    }

    /// Render `value`. Non-numeric values are substituted unchanged.
    pub fn render(&self, value: &Value) -> String {
        let body = match (self.spec, number(value)) {
            (NumberSpec::Plain, _) | (_, None) => plain(value),
            (NumberSpec::Grouped, Some(Number::Int(i))) => group_digits(&i.to_string()),
            (NumberSpec::Grouped, Some(Number::Float(f))) => group_digits(&f.to_string()),
            (NumberSpec::Fixed { precision, grouped }, Some(n)) => {
                let fixed = format!("{:.*}", precision, n.as_f64());
                if grouped {
                    group_digits(&fixed)
                } else {
                    fixed
                }
            }
            (NumberSpec::Integer, Some(Number::Int(i))) => i.to_string(),
            (NumberSpec::Integer, Some(Number::Float(f))) if f.fract() == 0.0 => {
                format!("{f:.0}")
            }
            (NumberSpec::Integer, Some(Number::Float(_))) => plain(value),
            (NumberSpec::Percent { precision }, Some(n)) => {
                format!("{:.*}%", precision, n.as_f64() * 100.0)
            }
        };
        format!("{}{}{}", self.prefix, body, self.suffix)
    }
}

fn parse_spec(spec: &str) -> Option<NumberSpec> {
    match spec {
        "," => return Some(NumberSpec::Grouped),
        "d" => return Some(NumberSpec::Integer),
        _ => {}
    }
    let (grouped, rest) = match spec.strip_prefix(',') {
        Some(rest) => (true, rest),
        None => (false, spec),
    };
    let rest = rest.strip_prefix('.')?;
    if let Some(digits) = rest.strip_suffix('f') {
        return Some(NumberSpec::Fixed {
            precision: digits.parse().ok()?,
            grouped,
        });
    }
    if let Some(digits) = rest.strip_suffix('%') {
        if grouped {
            return None;
        }
        return Some(NumberSpec::Percent {
            precision: digits.parse().ok()?,
        });
    }
    None
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }
}

fn number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Number::Int)
            .or_else(|| n.as_f64().map(Number::Float)),
        Value::String(s) => s
            .parse::<i64>()
            .map(Number::Int)
            .ok()
            .or_else(|| s.parse::<f64>().ok().map(Number::Float)),
        _ => None,
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Insert thousands separators into the integer part of a rendered number.
fn group_digits(rendered: &str) -> String {
    let (sign, unsigned) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered),
    };
    let (int_part, frac_part) = match unsigned.find('.') {
        Some(dot) => unsigned.split_at(dot),
        None => (unsigned, ""),
    };
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}{frac_part}")
}

// ── Rule table ────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct StatRule {
    new_name: Option<String>,
    format: Option<StatFormat>,
    drop: bool,
}

/// Compiled statistics format spec.
#[derive(Debug, Clone, Default)]
pub struct StatRules {
    rules: HashMap<String, StatRule>,
}

impl StatRules {
    pub fn compile(spec: &HashMap<String, StatFormatRule>) -> Result<Self> {
        let mut rules = HashMap::with_capacity(spec.len());
        for (name, rule) in spec {
            let format = match &rule.format {
                Some(raw) => Some(StatFormat::parse(raw).ok_or_else(|| {
                    ProxyError::Config(format!("unsupported format '{raw}' for stat '{name}'"))
                })?),
                None => None,
            };
            rules.insert(
                name.clone(),
                StatRule {
                    new_name: rule.new_name.clone(),
                    format,
                    drop: rule.drop,
                },
            );
        }
        Ok(Self { rules })
    }

    /// Apply the rule for `stat_type`, or `None` when the stat is dropped.
    pub fn apply(
        &self,
        stat_type: &str,
        value: Option<&Value>,
        start_epoch: Option<i64>,
        end_epoch: Option<i64>,
    ) -> Option<Stat> {
        let rule = self.rules.get(stat_type);
        if rule.is_some_and(|r| r.drop) {
            return None;
        }

        let stat_type = rule
            .and_then(|r| r.new_name.clone())
            .unwrap_or_else(|| stat_type.to_string());
        let stat_val = value.filter(|v| !v.is_null()).map(|v| {
            match rule.and_then(|r| r.format.as_ref()) {
                Some(format) => format.render(v),
                None => plain(v),
            }
        });

        Some(Stat {
            stat_type,
            stat_val,
            start_epoch,
            end_epoch,
        })
    }
}

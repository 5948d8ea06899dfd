//! crates/focuspoint_core/src/plan/parser.rs
//!
//! Turns the model's near-JSON reply into a validated day plan.
//!
//! Parsing is layered. The reply is first parsed as-is. If that fails, the
//! first repair stage runs, in order:
//!
//! 1. [`strip_code_fences`] removes markdown fence markers,
//! 2. [`extract_object`] keeps the first balanced top-level `{...}` block,
//! 3. [`strip_trailing_commas`] drops commas directly before `}` or `]`.
//!
//! If the result still does not parse, the second stage runs once on top of it:
//!
//! 4. [`escape_stray_backslashes`] doubles backslashes that do not start a valid escape,
//! 5. [`strip_control_chars`] escapes raw newlines and tabs inside strings and drops other control characters.
//!
//! Whatever parses is then checked against the plan schema. Nothing is ever
//! invented: a reply that fails every stage is a malformed-response error.

use crate::domain::PlanItemKind;
use crate::error::AiError;
use crate::time::ClockTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// A validated plan item before it gets an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftItem {
    pub start: ClockTime,
    pub end: ClockTime,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: PlanItemKind,
    pub is_recommendation: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedPlan {
    pub items: Vec<DraftItem>,
    pub analysis: String,
}

#[derive(Deserialize)]
struct RawPlan {
    #[serde(alias = "items")]
    plan: Vec<RawItem>,
    #[serde(default)]
    analysis: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawItem {
    start: String,
    end: String,
    title: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, alias = "is_recommendation")]
    is_recommendation: bool,
}

pub fn parse_plan_response(raw: &str) -> Result<ParsedPlan, AiError> {
    if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
        return validate(value);
    }

    let first = strip_trailing_commas(&extract_object(&strip_code_fences(raw)));
    let first_err = match serde_json::from_str::<Value>(&first) {
        Ok(value) => {
            debug!("AI plan parsed after first repair stage");
            return validate(value);
        }
        Err(e) => e,
    };

    let second = strip_control_chars(&escape_stray_backslashes(&first));
    match serde_json::from_str::<Value>(&second) {
        Ok(value) => {
            debug!("AI plan parsed after second repair stage");
            validate(value)
        }
        Err(second_err) => Err(AiError::MalformedResponse(format!(
            "could not parse plan JSON ({first_err}; after repair: {second_err})"
        ))),
    }
}

/// Schema check of a parsed value. Items keep the order the model gave them.
pub fn validate(value: Value) -> Result<ParsedPlan, AiError> {
    let raw: RawPlan = serde_json::from_value(value)
        .map_err(|e| AiError::MalformedResponse(format!("plan does not match the schema: {e}")))?;
    if raw.plan.is_empty() {
        return Err(AiError::MalformedResponse("the AI returned an empty plan".into()));
    }

    let items = raw
        .plan
        .into_iter()
        .enumerate()
        .map(|(i, item)| validate_item(i, item))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ParsedPlan {
        items,
        analysis: raw.analysis.unwrap_or_default().trim().to_string(),
    })
}

fn validate_item(index: usize, item: RawItem) -> Result<DraftItem, AiError> {
    let bad = |what: String| AiError::MalformedResponse(format!("plan item {index}: {what}"));
    let title = item.title.trim().to_string();
    if title.is_empty() {
        return Err(bad("empty title".into()));
    }
    let start: ClockTime = item.start.parse().map_err(|e| bad(format!("{e}")))?;
    let end: ClockTime = item.end.parse().map_err(|e| bad(format!("{e}")))?;
    let kind: PlanItemKind = serde_json::from_value(Value::String(item.kind.trim().to_lowercase()))
        .map_err(|_| bad(format!("unknown type '{}'", item.kind)))?;
    Ok(DraftItem {
        start,
        end,
        title,
        kind,
        is_recommendation: item.is_recommendation,
    })
}

//=========================================================================================
// Repair passes
//=========================================================================================

/// Removes markdown code fences such as ```` ```json ```` and ```` ``` ````.
pub fn strip_code_fences(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find("```") {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 3..];
        // A language tag directly after an opening fence.
        let tag_len = rest
            .char_indices()
            .find(|(_, c)| !c.is_ascii_alphanumeric())
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        rest = &rest[tag_len..];
    }
    out.push_str(rest);
    out.trim().to_string()
}

/// Keeps the first balanced top-level object. Without a closing brace, keeps
/// everything from the first `{` so later passes still get a chance.
pub fn extract_object(s: &str) -> String {
    let Some(open) = s.find('{') else {
        return s.to_string();
    };
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in s[open..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return s[open..open + i + 1].to_string();
                }
            }
            _ => {}
        }
    }
    s[open..].to_string()
}

/// Drops a comma when the next non-whitespace character closes an object or array.
pub fn strip_trailing_commas(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escaped = false;
    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            out.push(c);
            continue;
        }
        if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Inside strings, doubles any backslash that does not begin a valid JSON escape.
/// Valid escapes are left alone so correctly escaped content survives.
pub fn escape_stray_backslashes(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 8);
    let mut in_string = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if !in_string {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
            i += 1;
            continue;
        }
        match c {
            '"' => {
                in_string = false;
                out.push(c);
            }
            '\\' => {
                let next = chars.get(i + 1).copied();
                let valid = match next {
                    Some('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't') => true,
                    Some('u') => chars
                        .get(i + 2..i + 6)
                        .is_some_and(|hex| hex.iter().all(|h| h.is_ascii_hexdigit())),
                    _ => false,
                };
                if valid {
                    out.push('\\');
                    if let Some(n) = next {
                        out.push(n);
                    }
                    i += 2;
                    continue;
                }
                out.push_str("\\\\");
            }
            _ => out.push(c),
        }
        i += 1;
    }
    out
}

/// Inside strings, raw newlines, carriage returns and tabs become escapes and
/// other control characters are dropped. Outside strings only JSON whitespace
/// control characters are kept.
pub fn strip_control_chars(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escaped = false;
    for c in s.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(c);
                continue;
            }
            match c {
                '\\' => {
                    escaped = true;
                    out.push(c);
                }
                '"' => {
                    in_string = false;
                    out.push(c);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if c.is_control() => {}
                c => out.push(c),
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '\n' | '\r' | '\t' => out.push(c),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

//! Inline-function ("protfunc") parser.
//!
//! Values may embed calls like `$add(1, 2)` or `$upper(torch)`. A value that
//! is exactly one call evaluates to the call's typed result; calls embedded in
//! longer text are substituted as text. Text values are then read as
//! literals: JSON, or Python-style literals (`'single quotes'`, `True`,
//! `False`, `None`, `(tuples)`).

use std::str::FromStr;

use serde_json::{Number, Value};

use protoforge_core::service::protfunc::{ParseOutcome, ProtfuncParser};
use protoforge_types::prototype::{Prototype, PrototypeField};

const DEFAULT_JUSTIFY_WIDTH: usize = 78;

/// Widest padding the justify functions accept.
const MAX_JUSTIFY_WIDTH: usize = u16::MAX as usize;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Call {
        name: String,
        args: Vec<String>,
        raw: String,
    },
}

struct Context<'a> {
    prototype: Option<&'a Prototype>,
    testing: bool,
    warnings: Vec<String>,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Byte offset just past the `)` closing the `(` at `open`, honoring nested
/// brackets and quotes.
fn matching_paren(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in s[open..].char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(' | '[' | '{') => depth += 1,
            (None, ')' | ']' | '}') => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split call arguments on top-level commas.
fn split_args(s: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for c in s.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(' | '[' | '{') => depth += 1,
            (None, ')' | ']' | '}') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                args.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    if !current.trim().is_empty() || !args.is_empty() {
        args.push(current.trim().to_string());
    }
    args
}

fn scan(s: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut pos = 0;

    while pos < s.len() {
        let rest = &s[pos..];
        let Some(dollar) = rest.find('$') else {
            text.push_str(rest);
            break;
        };
        text.push_str(&rest[..dollar]);
        let start = pos + dollar;
        let name_len = s[start + 1..]
            .find(|c: char| !is_ident_char(c))
            .unwrap_or(s.len() - start - 1);
        let open = start + 1 + name_len;

        let call_end = (name_len > 0 && s[open..].starts_with('('))
            .then(|| matching_paren(s, open))
            .flatten();
        match call_end {
            Some(end) => {
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Call {
                    name: s[start + 1..open].to_lowercase(),
                    args: split_args(&s[open + 1..end - 1]),
                    raw: s[start..end].to_string(),
                });
                pos = end;
            }
            None => {
                text.push('$');
                pos = start + 1;
            }
        }
    }
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    segments
}

/// Rewrite a Python-style literal as JSON. Returns `None` for unterminated
/// strings.
fn python_to_json(s: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                out.push('"');
                let mut closed = false;
                while let Some(inner) = chars.next() {
                    match inner {
                        '\\' => {
                            let escaped = chars.next()?;
                            if escaped == '\'' {
                                out.push('\'');
                            } else {
                                out.push('\\');
                                out.push(escaped);
                            }
                        }
                        q if q == c => {
                            closed = true;
                            break;
                        }
                        '"' => out.push_str("\\\""),
                        other => out.push(other),
                    }
                }
                if !closed {
                    return None;
                }
                out.push('"');
            }
            '(' => out.push('['),
            ')' | ']' | '}' => {
                let trimmed = out.trim_end().trim_end_matches(',').len();
                out.truncate(trimmed);
                out.push(if c == ')' { ']' } else { c });
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if !is_ident_char(next) {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                out.push_str(match word.as_str() {
                    "True" => "true",
                    "False" => "false",
                    "None" => "null",
                    other => other,
                });
            }
            other => out.push(other),
        }
    }
    Some(out)
}

fn parse_literal(s: &str) -> Result<Value, String> {
    let trimmed = s.trim();
    match serde_json::from_str(trimmed) {
        Ok(value) => Ok(value),
        Err(json_err) => python_to_json(trimmed)
            .and_then(|converted| serde_json::from_str(&converted).ok())
            .ok_or_else(|| json_err.to_string()),
    }
}

/// Read text as a literal, keeping it as a string when it isn't one.
fn literal_or_text(s: &str, warnings: Option<&mut Vec<String>>) -> Value {
    match parse_literal(s) {
        Ok(value) => value,
        Err(err) => {
            if let Some(warnings) = warnings
                && s.trim_start().starts_with(['[', '{', '('])
            {
                warnings.push(format!("could not parse '{}' as a literal ({err})", s.trim()));
            }
            Value::String(s.to_string())
        }
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn of(value: &Value) -> Option<Num> {
        match value {
            Value::Number(n) => n.as_i64().map(Num::Int).or_else(|| n.as_f64().map(Num::Float)),
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

fn float_value(f: f64) -> Result<Value, String> {
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| format!("{f} is not a finite number"))
}

fn arithmetic(
    a: &Value,
    b: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, String> {
    match (Num::of(a), Num::of(b)) {
        (Some(Num::Int(x)), Some(Num::Int(y))) => match int_op(x, y) {
            Some(r) => Ok(Value::from(r)),
            None => float_value(float_op(x as f64, y as f64)),
        },
        (Some(x), Some(y)) => float_value(float_op(x.as_f64(), y.as_f64())),
        _ => Err(format!("cannot combine {a} and {b}")),
    }
}

fn justify(args: &[Value], align: fn(&str, usize) -> String) -> Result<Value, String> {
    let text = args.first().map(value_to_text).unwrap_or_default();
    let width = match args.get(1) {
        Some(w) => w
            .as_u64()
            .map(|w| w as usize)
            .ok_or_else(|| format!("width must be a positive integer, not {w}"))?,
        None => DEFAULT_JUSTIFY_WIDTH,
    };
    if width > MAX_JUSTIFY_WIDTH {
        return Err(format!("width {width} exceeds the maximum of {MAX_JUSTIFY_WIDTH}"));
    }
    Ok(Value::String(align(&text, width)))
}

fn two_args<'a>(name: &str, args: &'a [Value]) -> Result<(&'a Value, &'a Value), String> {
    match args {
        [a, b] => Ok((a, b)),
        _ => Err(format!("${name} takes 2 arguments, got {}", args.len())),
    }
}

/// Parser for `$func(...)` calls and Python-style literals.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineProtfuncParser;

impl InlineProtfuncParser {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate text. The flag is true when the text was a single call and
    /// the value is that call's typed result.
    fn evaluate(&self, s: &str, ctx: &mut Context<'_>) -> (Value, bool) {
        let segments = scan(s.trim());
        if let [Segment::Call { name, args, raw }] = segments.as_slice() {
            return match self.call(name, args, ctx) {
                Some(value) => (value, true),
                None => (Value::String(raw.clone()), false),
            };
        }

        if !segments.iter().any(|seg| matches!(seg, Segment::Call { .. })) {
            return (Value::String(s.to_string()), false);
        }

        let mut out = String::new();
        for segment in scan(s) {
            match segment {
                Segment::Text(text) => out.push_str(&text),
                Segment::Call { name, args, raw } => match self.call(&name, &args, ctx) {
                    Some(value) => out.push_str(&value_to_text(&value)),
                    None => out.push_str(&raw),
                },
            }
        }
        (Value::String(out), false)
    }

    fn argument(&self, raw: &str, ctx: &mut Context<'_>) -> Value {
        match self.evaluate(raw, ctx) {
            (value, true) => value,
            (Value::String(text), false) => literal_or_text(&text, None),
            (value, false) => value,
        }
    }

    /// Run one call. Failures are recorded as warnings and return `None`.
    fn call(&self, name: &str, raw_args: &[String], ctx: &mut Context<'_>) -> Option<Value> {
        let args: Vec<Value> = raw_args.iter().map(|a| self.argument(a, ctx)).collect();
        let result = match name {
            "add" => two_args(name, &args).and_then(|(a, b)| match (a, b) {
                (Value::String(x), Value::String(y)) => Ok(Value::String(format!("{x}{y}"))),
                (Value::Array(x), Value::Array(y)) => {
                    Ok(Value::Array(x.iter().chain(y.iter()).cloned().collect()))
                }
                _ => arithmetic(a, b, i64::checked_add, |x, y| x + y),
            }),
            "sub" => two_args(name, &args)
                .and_then(|(a, b)| arithmetic(a, b, i64::checked_sub, |x, y| x - y)),
            "mult" => two_args(name, &args)
                .and_then(|(a, b)| arithmetic(a, b, i64::checked_mul, |x, y| x * y)),
            "div" => two_args(name, &args).and_then(|(a, b)| match (Num::of(a), Num::of(b)) {
                (Some(_), Some(y)) if y.as_f64() == 0.0 => Err("division by zero".to_string()),
                (Some(x), Some(y)) => float_value(x.as_f64() / y.as_f64()),
                _ => Err(format!("cannot divide {a} by {b}")),
            }),
            "toint" => match args.first() {
                Some(v) => match Num::of(v) {
                    Some(Num::Int(i)) => Ok(Value::from(i)),
                    Some(Num::Float(f)) => Ok(Value::from(f.trunc() as i64)),
                    None => value_to_text(v)
                        .trim()
                        .parse::<i64>()
                        .map(Value::from)
                        .map_err(|_| format!("cannot convert {v} to an integer")),
                },
                None => Err("$toint takes 1 argument".to_string()),
            },
            "upper" => Ok(Value::String(
                args.first().map(value_to_text).unwrap_or_default().to_uppercase(),
            )),
            "lower" => Ok(Value::String(
                args.first().map(value_to_text).unwrap_or_default().to_lowercase(),
            )),
            "left_justify" => justify(&args, |t, w| format!("{t:<w$}")),
            "right_justify" => justify(&args, |t, w| format!("{t:>w$}")),
            "center_justify" => justify(&args, |t, w| format!("{t:^w$}")),
            "protkey" => self.protkey(&args, ctx),
            "dbref" => match args.first().map(value_to_text) {
                Some(r) if r.trim().starts_with('#') && r.trim()[1..].parse::<u64>().is_ok() => {
                    let r = r.trim().to_string();
                    Ok(Value::String(if ctx.testing { format!("<obj {r}>") } else { r }))
                }
                Some(r) => Err(format!("$dbref expects a #dbref, got '{r}'")),
                None => Err("$dbref takes 1 argument".to_string()),
            },
            _ => Err(format!("unknown inline function '${name}'")),
        };

        result
            .map_err(|err| ctx.warnings.push(err))
            .ok()
    }

    fn protkey(&self, args: &[Value], ctx: &Context<'_>) -> Result<Value, String> {
        let field_name = args
            .first()
            .map(value_to_text)
            .ok_or_else(|| "$protkey takes 1 argument".to_string())?;
        let field = PrototypeField::from_str(&field_name)?;
        let prototype = ctx
            .prototype
            .ok_or_else(|| format!("$protkey({field_name}) needs a prototype"))?;
        prototype
            .get_field(field)
            .map(|v| v.to_json())
            .ok_or_else(|| format!("prototype has no '{field}' set"))
    }
}

impl ProtfuncParser for InlineProtfuncParser {
    fn parse(&self, value: &str, prototype: Option<&Prototype>, testing: bool) -> ParseOutcome {
        let mut ctx = Context {
            prototype,
            testing,
            warnings: Vec::new(),
        };

        let parsed = match self.evaluate(value, &mut ctx) {
            (value, true) => value,
            (Value::String(text), false) => literal_or_text(&text, Some(&mut ctx.warnings)),
            (value, false) => value,
        };

        ParseOutcome {
            value: parsed,
            warning: (!ctx.warnings.is_empty()).then(|| ctx.warnings.join("; ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(s: &str) -> ParseOutcome {
        InlineProtfuncParser::new().parse(s, None, true)
    }

    #[test]
    fn test_plain_text_stays_text() {
        let out = parse("a brass lamp");
        assert_eq!(out.value, json!("a brass lamp"));
        assert!(out.warning.is_none());
    }

    #[test]
    fn test_json_and_python_literals() {
        assert_eq!(parse("42").value, json!(42));
        assert_eq!(parse("[1, 2]").value, json!([1, 2]));
        assert_eq!(parse("{'hp': 10, 'alive': True}").value, json!({"hp": 10, "alive": true}));
        assert_eq!(parse("(1, 'a', None,)").value, json!([1, "a", null]));
        assert_eq!(parse("'it\\'s'").value, json!("it's"));
    }

    #[test]
    fn test_broken_literal_warns() {
        let out = parse("[1, 2");
        assert_eq!(out.value, json!("[1, 2"));
        assert!(out.warning.unwrap().contains("could not parse '[1, 2'"));
    }

    #[test]
    fn test_whole_call_is_typed() {
        assert_eq!(parse("$add(1, 2)").value, json!(3));
        assert_eq!(parse("$div(1, 2)").value, json!(0.5));
        assert_eq!(parse("$mult(2, 2.5)").value, json!(5.0));
        assert_eq!(parse("$sub(10, 4)").value, json!(6));
        assert_eq!(parse("$toint(3.9)").value, json!(3));
        assert_eq!(parse("$add('ab', 'cd')").value, json!("abcd"));
        assert_eq!(parse("$add([1], [2])").value, json!([1, 2]));
    }

    #[test]
    fn test_nested_calls() {
        assert_eq!(parse("$add($mult(2, 3), 1)").value, json!(7));
        assert_eq!(parse("$upper($lower(LaMp))").value, json!("LAMP"));
    }

    #[test]
    fn test_embedded_calls_substitute_text() {
        let out = parse("Lamp #$add(1, 1) of $upper(brass)");
        assert_eq!(out.value, json!("Lamp #2 of BRASS"));
        assert!(out.warning.is_none());
    }

    #[test]
    fn test_quoted_commas_are_one_argument() {
        assert_eq!(parse("$upper('a, b')").value, json!("A, B"));
    }

    #[test]
    fn test_justify() {
        assert_eq!(parse("$left_justify(ab, 4)").value, json!("ab  "));
        assert_eq!(parse("$right_justify(ab, 4)").value, json!("  ab"));
        assert_eq!(parse("$center_justify(ab, 6)").value, json!("  ab  "));
        let default = parse("$left_justify(x)").value;
        assert_eq!(default.as_str().unwrap().len(), DEFAULT_JUSTIFY_WIDTH);
    }

    #[test]
    fn test_justify_rejects_oversized_width() {
        let out = parse("$left_justify(x, 70000)");
        assert_eq!(out.value, json!("$left_justify(x, 70000)"));
        assert_eq!(
            out.warning.as_deref(),
            Some("width 70000 exceeds the maximum of 65535")
        );
        assert_eq!(
            parse("$center_justify(x, 65535)").value.as_str().map(|s| s.chars().count()),
            Some(65535)
        );
    }

    #[test]
    fn test_unknown_function_left_verbatim() {
        let out = parse("$frobnicate(1)");
        assert_eq!(out.value, json!("$frobnicate(1)"));
        assert!(out.warning.unwrap().contains("unknown inline function '$frobnicate'"));
    }

    #[test]
    fn test_division_by_zero_warns() {
        let out = parse("$div(1, 0)");
        assert_eq!(out.value, json!("$div(1, 0)"));
        assert_eq!(out.warning.as_deref(), Some("division by zero"));
    }

    #[test]
    fn test_multiple_warnings_joined() {
        let out = parse("$nope() and $div(1, 0)");
        assert_eq!(
            out.warning.as_deref(),
            Some("unknown inline function '$nope'; division by zero")
        );
    }

    #[test]
    fn test_dbref_testing_and_live() {
        let parser = InlineProtfuncParser::new();
        assert_eq!(parser.parse("$dbref(#5)", None, true).value, json!("<obj #5>"));
        assert_eq!(parser.parse("$dbref(#5)", None, false).value, json!("#5"));
        assert!(parser.parse("$dbref(five)", None, true).warning.is_some());
    }

    #[test]
    fn test_protkey_reads_prototype() {
        let proto = Prototype {
            key: Some("lamp".to_string()),
            aliases: vec!["light".to_string()],
            ..Default::default()
        };
        let parser = InlineProtfuncParser::new();
        assert_eq!(parser.parse("$protkey(key)", Some(&proto), true).value, json!("lamp"));
        assert_eq!(
            parser.parse("$protkey(aliases)", Some(&proto), true).value,
            json!(["light"])
        );
        assert!(parser.parse("$protkey(key)", None, true).warning.is_some());
        assert!(parser.parse("$protkey(home)", Some(&proto), true).warning.is_some());
    }

    #[test]
    fn test_dollar_without_call_is_text() {
        assert_eq!(parse("costs $5").value, json!("costs $5"));
        assert_eq!(parse("$upper(unclosed").value, json!("$upper(unclosed"));
    }
}

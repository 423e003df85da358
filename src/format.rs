//! Cell text: render templates, number masks and date patterns.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use std::error::Error as _;
use std::fmt::Write;
use tera::{Context, Tera};
use thiserror::Error;

use crate::types::FieldType;
use crate::value::{display_string, to_number};

/// Template used when a column has no render template of its own.
pub const DEFAULT_CELL_TEMPLATE: &str = "{{data}}";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template error: {0}")]
    Render(String),
}

impl From<tera::Error> for TemplateError {
    fn from(err: tera::Error) -> Self {
        // Tera keeps the useful part of the message in the source chain.
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(inner) = source {
            message = format!("{}: {}", message, inner);
            source = inner.source();
        }
        TemplateError::Render(message)
    }
}

/// Effective cell template: the configured one unless it is missing or too short to hold a tag.
pub fn effective_template(template: Option<&str>) -> &str {
    match template {
        Some(t) if t.chars().count() >= 3 => t,
        _ => DEFAULT_CELL_TEMPLATE,
    }
}

/// Render `template` with the cell value bound to `data`.
pub fn try_render_cell(
    template: Option<&str>,
    value: Option<&Value>,
) -> Result<String, TemplateError> {
    let template = effective_template(template);
    let mut context = Context::new();
    match value {
        Some(v) => context.insert("data", &display_string(v)),
        None => context.insert("data", ""),
    }
    Ok(Tera::one_off(template, &context, true)?)
}

/// Render a cell, showing the error message in place of output on failure.
pub fn render_cell(template: Option<&str>, value: Option<&Value>) -> String {
    try_render_cell(template, value).unwrap_or_else(|e| {
        log::warn!("{}", e);
        e.to_string()
    })
}

/// Render the table-level banner template with an empty context.
pub fn render_banner(template: &str) -> String {
    if template.is_empty() {
        return String::new();
    }
    Tera::one_off(template, &Context::new(), false)
        .map_err(TemplateError::from)
        .unwrap_or_else(|e| e.to_string())
}

/// Apply a `#` digit mask: every `#` takes the next digit of the value.
///
/// `apply_number_mask("5551234567", "(###) ###-####")` gives `(555) 123-4567`.
/// Mask positions without a digit left are dropped along with any literal
/// text that follows them.
pub fn apply_number_mask(value: &str, mask: &str) -> String {
    let mut digits = value.chars().filter(|c| c.is_ascii_digit());
    let mut out = String::with_capacity(mask.len());
    let mut pending_literal = String::new();
    for ch in mask.chars() {
        if ch == '#' {
            match digits.next() {
                Some(d) => {
                    out.push_str(&pending_literal);
                    pending_literal.clear();
                    out.push(d);
                }
                None => break,
            }
        } else {
            pending_literal.push(ch);
        }
    }
    out
}

/// Translate a day.js style pattern (`YYYY-MM-DD HH:mm`) into a chrono format string.
pub fn dayjs_to_chrono(pattern: &str) -> String {
    const TOKENS: &[(&str, &str)] = &[
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        ("M", "%-m"),
        ("DD", "%d"),
        ("D", "%-d"),
        ("dddd", "%A"),
        ("ddd", "%a"),
        ("HH", "%H"),
        ("H", "%-H"),
        ("hh", "%I"),
        ("h", "%-I"),
        ("mm", "%M"),
        ("m", "%-M"),
        ("ss", "%S"),
        ("s", "%-S"),
        ("SSS", "%3f"),
        ("A", "%p"),
        ("a", "%P"),
        ("ZZ", "%z"),
        ("Z", "%:z"),
    ];

    let mut out = String::new();
    let mut rest = pattern;
    'outer: while !rest.is_empty() {
        // [escaped text]
        if let Some(stripped) = rest.strip_prefix('[') {
            if let Some(close) = stripped.find(']') {
                out.push_str(&stripped[..close].replace('%', "%%"));
                rest = &stripped[close + 1..];
                continue;
            }
        }
        for (token, replacement) in TOKENS {
            if let Some(stripped) = rest.strip_prefix(token) {
                out.push_str(replacement);
                rest = stripped;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            if ch == '%' {
                out.push_str("%%");
            } else {
                out.push(ch);
            }
        }
        rest = chars.as_str();
    }
    out
}

/// Parse a cell value as a point in time.
///
/// Accepts RFC 3339, `YYYY-MM-DD[ HH:MM[:SS]]`, `YYYY/MM/DD` and epoch milliseconds.
pub fn parse_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Number(n) => {
            let millis = n.as_f64()?;
            Utc.timestamp_millis_opt(millis as i64)
                .single()
                .map(|dt| dt.naive_utc())
        }
        Value::String(s) => parse_datetime_str(s.trim()),
        _ => None,
    }
}

fn parse_datetime_str(s: &str) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, format) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    // Year and month only: "2024-03" does not satisfy %Y-%m-%d.
    if let Some((y, m)) = s.split_once('-') {
        if let (Ok(y), Ok(m)) = (y.parse::<i32>(), m.parse::<u32>()) {
            return NaiveDate::from_ymd_opt(y, m, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
        }
    }
    None
}

/// Text of a cell after applying the column format, if the type has one.
///
/// Number columns treat the format as a `#` mask and date columns as a day.js
/// pattern. Other types, and values the format does not apply to, fall back
/// to the rendered template.
pub fn format_cell(
    field_type: FieldType,
    format: Option<&str>,
    template: Option<&str>,
    value: Option<&Value>,
) -> String {
    let format = format.filter(|f| !f.is_empty());
    match (field_type, format, value) {
        (FieldType::Number, Some(mask), Some(v)) if to_number(v).is_some() => {
            apply_number_mask(&display_string(v), mask)
        }
        (FieldType::Date, Some(pattern), Some(v)) => match parse_datetime(v) {
            Some(dt) => {
                let mut out = String::new();
                match write!(out, "{}", dt.format(&dayjs_to_chrono(pattern))) {
                    Ok(()) => out,
                    Err(_) => render_cell(template, value),
                }
            }
            None => "Invalid Date".to_string(),
        },
        _ => render_cell(template, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_effective_template() {
        assert_eq!(effective_template(None), DEFAULT_CELL_TEMPLATE);
        assert_eq!(effective_template(Some("{}")), DEFAULT_CELL_TEMPLATE);
        assert_eq!(effective_template(Some("<b>{{data}}</b>")), "<b>{{data}}</b>");
    }

    #[test]
    fn test_render_cell_default_and_custom() {
        assert_eq!(render_cell(None, Some(&json!(42))), "42");
        assert_eq!(
            render_cell(Some("<b>{{ data }}</b>"), Some(&json!("hi"))),
            "<b>hi</b>"
        );
        // Values are escaped, the template markup is not.
        assert_eq!(
            render_cell(Some("<i>{{data}}</i>"), Some(&json!("a<b"))),
            "<i>a&lt;b</i>"
        );
        assert_eq!(render_cell(None, None), "");
    }

    #[test]
    fn test_render_cell_failure_shows_message() {
        let out = render_cell(Some("{{ data | no_such_filter }}"), Some(&json!(1)));
        assert!(out.starts_with("Template error"), "got: {}", out);
    }

    #[test]
    fn test_render_banner() {
        assert_eq!(render_banner("<h1>Devices</h1>"), "<h1>Devices</h1>");
        assert_eq!(render_banner(""), "");
        assert!(render_banner("{% if %}").starts_with("Template error"));
    }

    #[test]
    fn test_apply_number_mask() {
        assert_eq!(
            apply_number_mask("5551234567", "(###) ###-####"),
            "(555) 123-4567"
        );
        assert_eq!(apply_number_mask("12", "##-##"), "12");
        assert_eq!(apply_number_mask("1234", "## ##"), "12 34");
    }

    #[test]
    fn test_dayjs_to_chrono() {
        assert_eq!(dayjs_to_chrono("YYYY-MM-DD"), "%Y-%m-%d");
        assert_eq!(dayjs_to_chrono("DD/MM/YY HH:mm:ss"), "%d/%m/%y %H:%M:%S");
        assert_eq!(dayjs_to_chrono("[Day] D"), "Day %-d");
        assert_eq!(dayjs_to_chrono("100%"), "100%%");
    }

    #[test]
    fn test_parse_datetime() {
        let dt = parse_datetime(&json!("2024-03-05")).unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2024-03-05 00:00");
        let dt = parse_datetime(&json!("2024-03-05T10:20:30Z")).unwrap();
        assert_eq!(dt.format("%H:%M:%S").to_string(), "10:20:30");
        let dt = parse_datetime(&json!(0)).unwrap();
        assert_eq!(dt.format("%Y").to_string(), "1970");
        assert!(parse_datetime(&json!("2024-03")).is_some());
        assert!(parse_datetime(&json!("yesterday")).is_none());
        assert!(parse_datetime(&json!(true)).is_none());
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(
            format_cell(
                FieldType::Date,
                Some("DD.MM.YYYY"),
                None,
                Some(&json!("2024-03-05"))
            ),
            "05.03.2024"
        );
        assert_eq!(
            format_cell(FieldType::Date, Some("YYYY"), None, Some(&json!("soon"))),
            "Invalid Date"
        );
        assert_eq!(
            format_cell(FieldType::Number, Some("###-###"), None, Some(&json!(123456))),
            "123-456"
        );
        // Strings ignore the format and go through the template.
        assert_eq!(
            format_cell(FieldType::String, Some("###"), None, Some(&json!("abc"))),
            "abc"
        );
    }
}

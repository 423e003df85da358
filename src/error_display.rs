//! User-facing error message formatting.
//!
//! Uses typed error matching (serde_json categories, io::ErrorKind) rather than
//! string parsing to produce actionable messages.

use serde_json::error::Category;
use std::io;
use std::path::Path;

/// Format a serde_json error by its category, with the position when it has one.
pub fn user_message_from_json(err: &serde_json::Error) -> String {
    let position = if err.line() > 0 {
        format!(" (line {}, column {})", err.line(), err.column())
    } else {
        String::new()
    };
    match err.classify() {
        Category::Io => format!("Could not read JSON input{}.", position),
        Category::Syntax => format!("Invalid JSON syntax{}: {}", position, err),
        Category::Data => format!("JSON has an unexpected shape{}: {}", position, err),
        Category::Eof => format!("JSON input ends unexpectedly{}.", position),
    }
}

/// Format an io::Error as a user-facing message by matching on ErrorKind.
pub fn user_message_from_io(err: &io::Error, context: Option<&str>) -> String {
    use std::io::ErrorKind;

    let base: String = match err.kind() {
        ErrorKind::NotFound => "File or directory not found.".to_string(),
        ErrorKind::PermissionDenied => "Permission denied. Check read access.".to_string(),
        ErrorKind::InvalidData | ErrorKind::InvalidInput => {
            "Invalid or corrupted data.".to_string()
        }
        ErrorKind::UnexpectedEof => "Unexpected end of file.".to_string(),
        ErrorKind::Interrupted => "Operation interrupted.".to_string(),
        ErrorKind::OutOfMemory => "Out of memory.".to_string(),
        _ => err.to_string(),
    };

    match context {
        Some(ctx) if !ctx.is_empty() => format!("{} {}", base, ctx),
        _ => base,
    }
}

/// Format a color_eyre Report by downcasting to known error types.
/// Walks the cause chain to find an io::Error or serde_json::Error.
pub fn user_message_from_report(report: &color_eyre::eyre::Report, path: Option<&Path>) -> String {
    let with_path = |msg: String| match path {
        Some(p) => format!("Failed to load {}: {}", p.display(), msg),
        None => msg,
    };

    for cause in report.chain() {
        if let Some(json_err) = cause.downcast_ref::<serde_json::Error>() {
            return with_path(user_message_from_json(json_err));
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return with_path(user_message_from_io(io_err, None));
        }
    }

    // Fallback: first line of the display, avoiding long tracebacks
    let display = report.to_string();
    let first_line = display.lines().next().unwrap_or("An error occurred");
    with_path(first_line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::{eyre, Report};

    #[test]
    fn test_user_message_from_io_not_found() {
        let err = io::Error::new(io::ErrorKind::NotFound, "No such file");
        let msg = user_message_from_io(&err, None);
        assert!(
            msg.contains("not found"),
            "expected 'not found', got: {}",
            msg
        );
    }

    #[test]
    fn test_user_message_from_json_syntax() {
        let err = serde_json::from_str::<serde_json::Value>("{\"a\": }").unwrap_err();
        let msg = user_message_from_json(&err);
        assert!(msg.starts_with("Invalid JSON syntax"), "got: {}", msg);
        assert!(msg.contains("line 1"), "got: {}", msg);
    }

    #[test]
    fn test_user_message_from_json_eof() {
        let err = serde_json::from_str::<serde_json::Value>("[1, 2").unwrap_err();
        assert!(user_message_from_json(&err).contains("ends unexpectedly"));
    }

    #[test]
    fn test_user_message_from_report_with_path() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let report = Report::new(io_err);
        let msg = user_message_from_report(&report, Some(Path::new("rows.json")));
        assert!(msg.starts_with("Failed to load rows.json"), "got: {}", msg);
        assert!(msg.to_lowercase().contains("permission"), "got: {}", msg);

        let plain = user_message_from_report(&eyre!("first\nsecond"), None);
        assert_eq!(plain, "first");
    }
}

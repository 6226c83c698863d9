//! Shared output helpers: global flag checks, JSON printing, and the
//! few ANSI symbols the commands use.

use serde_json::Value;

/// Whether `--quiet` was passed (exported as an env var in main).
pub fn is_quiet() -> bool {
    std::env::var("NANDO_QUIET").is_ok()
}

/// Whether `--json` was passed.
pub fn is_json() -> bool {
    std::env::var("NANDO_JSON").is_ok()
}

/// Whether `--no-color` was passed or NO_COLOR is set.
pub fn no_color() -> bool {
    std::env::var("NANDO_NO_COLOR").is_ok() || std::env::var("NO_COLOR").is_ok()
}

/// Print a machine-readable JSON value to stdout.
pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(_) => println!("{value}"),
    }
}

/// Status symbols, colored unless disabled.
pub struct Styled {
    color: bool,
}

impl Styled {
    pub fn new() -> Self {
        Self { color: !no_color() }
    }

    pub fn ok_sym(&self) -> &'static str {
        if self.color {
            "\x1b[32m✓\x1b[0m"
        } else {
            "✓"
        }
    }

    pub fn warn_sym(&self) -> &'static str {
        if self.color {
            "\x1b[33m!\x1b[0m"
        } else {
            "!"
        }
    }

    pub fn err_sym(&self) -> &'static str {
        if self.color {
            "\x1b[31m✗\x1b[0m"
        } else {
            "✗"
        }
    }
}

impl Default for Styled {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols_without_color() {
        let s = Styled { color: false };
        assert_eq!(s.ok_sym(), "✓");
        assert_eq!(s.warn_sym(), "!");
        assert_eq!(s.err_sym(), "✗");
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&serde_json::json!({ "ok": true }));
    }
}

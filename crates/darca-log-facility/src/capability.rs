//! Terminal color detection
//!
//! Detection runs once when a registry is built; the result is kept as a plain
//! flag, and an unsupported terminal simply gets uncolored output.

use std::io::IsTerminal;

/// Whether standard output can display ANSI colors.
///
/// Honours `NO_COLOR` (any non-empty value disables color) and `TERM=dumb`.
pub fn detect_color_support() -> bool {
    color_allowed(
        std::env::var_os("NO_COLOR").as_deref(),
        std::env::var_os("TERM").as_deref(),
    ) && std::io::stdout().is_terminal()
}

fn color_allowed(no_color: Option<&std::ffi::OsStr>, term: Option<&std::ffi::OsStr>) -> bool {
    let disabled = no_color.is_some_and(|value| !value.is_empty());
    let dumb = term.is_some_and(|value| value == "dumb");
    !disabled && !dumb
}

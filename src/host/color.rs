//! ANSI color decisions for terminal output
//!
//! Priority, highest first: `NO_COLOR`, `CLICOLOR_FORCE=1`, the configured
//! choice, `CLICOLOR=0`, then whether stdout is a terminal.

use crate::models::config::ColorChoice;
use crate::models::report::Span;

pub const RESET: &str = "\x1b[0m";
/// Report headers: magenta + bold
pub const HEADER: &str = "\x1b[35m\x1b[1m";
/// Query matches: bold + underline + red, readable without color too
pub const MATCH: &str = "\x1b[1m\x1b[4m\x1b[31m";
/// Erase the current terminal line and return to column 0
pub const ERASE_LINE: &str = "\r\x1b[2K";

pub fn resolve_color(choice: ColorChoice) -> bool {
    use std::io::IsTerminal;
    resolve_color_inner(
        std::env::var_os("NO_COLOR").is_some(),
        std::env::var("CLICOLOR_FORCE").ok().as_deref(),
        choice,
        std::env::var("CLICOLOR").ok().as_deref(),
        std::io::stdout().is_terminal(),
    )
}

pub fn resolve_color_inner(
    no_color: bool,
    clicolor_force: Option<&str>,
    choice: ColorChoice,
    clicolor: Option<&str>,
    is_tty: bool,
) -> bool {
    if no_color {
        return false;
    }
    if clicolor_force == Some("1") {
        return true;
    }
    match choice {
        ColorChoice::Always => return true,
        ColorChoice::Never => return false,
        ColorChoice::Auto => {}
    }
    if clicolor == Some("0") {
        return false;
    }
    is_tty
}

/// Wrap each span of `text` in [`MATCH`] / [`RESET`]
///
/// Spans must be sorted and non-overlapping; spans that are out of range or
/// not on a char boundary are skipped.
pub fn paint_spans(text: &str, spans: &[Span]) -> String {
    let mut out = String::with_capacity(text.len() + spans.len() * 16);
    let mut cursor = 0;
    for span in spans {
        if span.start < cursor
            || span.end > text.len()
            || !text.is_char_boundary(span.start)
            || !text.is_char_boundary(span.end)
        {
            continue;
        }
        out.push_str(&text[cursor..span.start]);
        out.push_str(MATCH);
        out.push_str(&text[span.start..span.end]);
        out.push_str(RESET);
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    out
}

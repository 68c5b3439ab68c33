use std::ops::Range;

use crate::parser::error::ParseError;
use crate::parser::{inline, is_variable_name};
use crate::symbol::Symbol;

const DEFINE: &str = "!define";
const INCLUDE: &str = "!include";

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Split page markup into block-level symbols.
///
/// Directives are recognised at the start of a line; everything between
/// them is kept as Markdown with inline symbols.
pub fn parse_symbols(source: &str) -> Result<Vec<Symbol>, Vec<ParseError>> {
    let mut state = ParseState::new(source);
    state.process_lines();
    state.finalize()
}

// ---------------------------------------------------------------------------
// Parse state
// ---------------------------------------------------------------------------

struct ParseState<'a> {
    source: &'a str,
    symbols: Vec<Symbol>,
    /// Start of the Markdown text not yet turned into a symbol.
    text_start: usize,
    errors: Vec<ParseError>,
}

impl<'a> ParseState<'a> {
    fn new(source: &'a str) -> Self {
        ParseState {
            source,
            symbols: Vec::new(),
            text_start: 0,
            errors: Vec::new(),
        }
    }

    fn process_lines(&mut self) {
        let mut pos = 0;

        while pos < self.source.len() {
            let line_end = line_end(self.source, pos);
            let line = &self.source[pos..line_end];

            if let Some(rest) = directive(line, DEFINE) {
                self.flush_text(pos);
                let rest_start = line_end - rest.len();
                pos = self.parse_define(pos, rest_start);
                continue;
            }

            if let Some(rest) = directive(line, INCLUDE) {
                self.flush_text(pos);
                self.parse_include(rest, pos..line_end);
                pos = next_line(self.source, line_end);
                self.text_start = pos;
                continue;
            }

            pos = next_line(self.source, line_end);
        }

        self.flush_text(self.source.len());
    }

    /// Parse `!define NAME {value}` starting at `start`. Returns the position
    /// where scanning resumes.
    fn parse_define(&mut self, start: usize, rest_start: usize) -> usize {
        let source = self.source;
        let first_end = line_end(source, start);
        let skip_line = next_line(source, first_end);

        let name_start = skip_blanks(source, rest_start);
        let name_end = source[name_start..first_end]
            .find(|c: char| c.is_whitespace() || open_delimiter(c).is_some())
            .map(|p| name_start + p)
            .unwrap_or(first_end);
        let name = &source[name_start..name_end];

        if !is_variable_name(name) {
            self.errors.push(
                ParseError::error(
                    format!("invalid variable name '{}'", name),
                    start..first_end,
                )
                .with_note("variable names use letters, digits, '_' and '.'"),
            );
            self.text_start = skip_line;
            return skip_line;
        }

        let open_pos = skip_blanks(source, name_end);
        let Some(close) = source[open_pos..]
            .chars()
            .next()
            .and_then(open_delimiter)
        else {
            self.errors.push(ParseError::error(
                format!("expected '{{', '(' or '[' after variable name '{}'", name),
                start..first_end,
            ));
            self.text_start = skip_line;
            return skip_line;
        };

        let open = source.as_bytes()[open_pos] as char;
        let Some(close_pos) = find_matching(source, open_pos + 1, open, close) else {
            self.errors.push(
                ParseError::error(
                    format!("unterminated definition of '{}'", name),
                    start..source.len(),
                )
                .with_note(format!("missing closing '{}'", close)),
            );
            self.text_start = source.len();
            return source.len();
        };

        self.symbols.push(Symbol::Define {
            name: name.to_string(),
            value: source[open_pos + 1..close_pos].to_string(),
            span: start..close_pos + 1,
        });

        // Whatever follows the closing delimiter stays ordinary text.
        self.text_start = close_pos + 1;
        next_line(source, line_end(source, close_pos))
    }

    fn parse_include(&mut self, rest: &str, span: Range<usize>) {
        let mut seamless = false;
        let mut page = None;

        for arg in rest.split_whitespace() {
            match arg {
                "-seamless" => seamless = true,
                flag if flag.starts_with('-') => {}
                name => {
                    page = Some(name.to_string());
                    break;
                }
            }
        }

        match page {
            Some(page) => self.symbols.push(Symbol::Include {
                page,
                seamless,
                span,
            }),
            None => self
                .errors
                .push(ParseError::error("!include without a page name", span)),
        }
    }

    /// Turn the pending text up to `end` into a Markup symbol.
    fn flush_text(&mut self, end: usize) {
        if self.text_start < end {
            let text = &self.source[self.text_start..end];
            if !text.trim().is_empty() {
                self.symbols.push(Symbol::Markup(inline::parse_inlines(
                    text,
                    self.text_start,
                    true,
                )));
            }
        }
        self.text_start = end;
    }

    fn finalize(self) -> Result<Vec<Symbol>, Vec<ParseError>> {
        if self.errors.is_empty() {
            Ok(self.symbols)
        } else {
            Err(self.errors)
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// If `line` starts with `keyword` as a whole word, return what follows it.
fn directive<'l>(line: &'l str, keyword: &str) -> Option<&'l str> {
    let rest = line.strip_prefix(keyword)?;
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() => Some(rest),
        Some(_) => None,
    }
}

fn line_end(source: &str, pos: usize) -> usize {
    source[pos..]
        .find('\n')
        .map(|p| pos + p)
        .unwrap_or(source.len())
}

fn next_line(source: &str, line_end: usize) -> usize {
    (line_end + 1).min(source.len())
}

/// Skip spaces and tabs (not newlines).
fn skip_blanks(source: &str, pos: usize) -> usize {
    source[pos..]
        .find(|c: char| c != ' ' && c != '\t')
        .map(|p| pos + p)
        .unwrap_or(source.len())
}

fn open_delimiter(c: char) -> Option<char> {
    match c {
        '{' => Some('}'),
        '(' => Some(')'),
        '[' => Some(']'),
        _ => None,
    }
}

/// Find the delimiter closing an `open` that precedes `from`. Nested pairs
/// of the same kind are skipped.
fn find_matching(source: &str, from: usize, open: char, close: char) -> Option<usize> {
    let mut depth = 1usize;
    for (offset, c) in source[from..].char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(from + offset);
            }
        }
    }
    None
}

//! Script compression for static resources
//!
//! A light-weight minifier: it understands string literals, regex literals
//! and comments but nothing else about script syntax, so each level only
//! performs rewrites that cannot change meaning inside those literals.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CompressionLevel {
    /// Leave the script untouched
    None,
    /// Drop comments, indentation and blank lines
    Debuggable,
    /// Also collapse whitespace
    Normal,
    /// Also join statements onto fewer lines
    Ultra,
}

impl CompressionLevel {
    /// Maps a numeric level; anything above 3 is `Ultra`.
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => CompressionLevel::None,
            1 => CompressionLevel::Debuggable,
            2 => CompressionLevel::Normal,
            _ => CompressionLevel::Ultra,
        }
    }

    pub fn level(self) -> u8 {
        self as u8
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        CompressionLevel::Debuggable
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompressionLevel::None => "none",
            CompressionLevel::Debuggable => "debuggable",
            CompressionLevel::Normal => "normal",
            CompressionLevel::Ultra => "ultra",
        };
        f.write_str(name)
    }
}

pub fn compress_script(script: &str, level: CompressionLevel) -> String {
    if level == CompressionLevel::None {
        return script.to_string();
    }

    let stripped = strip_comments(script);
    let mut lines: Vec<String> = Vec::new();

    for line in stripped.lines() {
        let mut line = line.trim_start().to_string();
        if level >= CompressionLevel::Normal {
            line = collapse_whitespace(line.trim_end());
        }
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }

    if level >= CompressionLevel::Ultra {
        lines = join_lines(lines);
    }

    let mut output = lines.join("\n");
    if !output.is_empty() {
        output.push('\n');
    }
    output
}

/// Remove `//` and `/* */` comments that are not inside string literals.
/// Line breaks are kept so line-based passes still see statement ends.
fn strip_comments(script: &str) -> String {
    let mut output = String::with_capacity(script.len());
    let mut chars = script.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            output.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    output.push(escaped);
                }
            } else if c == q || c == '\n' {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => {
                quote = Some(c);
                output.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = '\0';
                for next in chars.by_ref() {
                    if next == '\n' {
                        output.push('\n');
                    }
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
            }
            '/' if regex_allowed(&output) => copy_regex(&mut chars, &mut output),
            _ => output.push(c),
        }
    }

    output
}

/// Collapse runs of whitespace outside string literals to one space.
fn collapse_whitespace(line: &str) -> String {
    let mut output = String::with_capacity(line.len());
    let mut chars = line.chars();
    let mut quote: Option<char> = None;
    let mut in_space = false;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            output.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    output.push(escaped);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }

        if c.is_whitespace() {
            if !in_space {
                output.push(' ');
                in_space = true;
            }
            continue;
        }

        in_space = false;
        if c == '/' && regex_allowed(&output) {
            copy_regex(&mut chars, &mut output);
            continue;
        }
        if c == '"' || c == '\'' {
            quote = Some(c);
        }
        output.push(c);
    }

    output
}

/// Keywords after which a `/` opens a regex literal rather than dividing.
const REGEX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

/// Whether a `/` following `before` starts a regex literal.
fn regex_allowed(before: &str) -> bool {
    let before = before.trim_end();
    match before.chars().next_back() {
        None => true,
        Some(c) if "(,=:[!&|?{};+-*%<>~^".contains(c) => true,
        Some(c) if is_identifier_char(c) => {
            let start = before
                .char_indices()
                .rev()
                .take_while(|(_, c)| is_identifier_char(*c))
                .last()
                .map_or(0, |(i, _)| i);
            REGEX_KEYWORDS.contains(&&before[start..])
        }
        _ => false,
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Copies a regex literal whose opening `/` has just been read, up to and
/// including the closing `/`. Flags are left to the caller.
fn copy_regex<I>(chars: &mut I, output: &mut String)
where
    I: Iterator<Item = char>,
{
    output.push('/');
    let mut in_class = false;
    while let Some(c) = chars.next() {
        if c == '\n' {
            // Unterminated; let the line passes carry on from here
            output.push(c);
            return;
        }
        output.push(c);
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    output.push(escaped);
                }
            }
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => return,
            _ => {}
        }
    }
}

fn join_lines(lines: Vec<String>) -> Vec<String> {
    let mut joined: Vec<String> = Vec::new();
    let mut pending = false;

    for line in lines {
        match joined.last_mut() {
            Some(last) if pending => last.push_str(&line),
            _ => joined.push(line),
        }
        pending = joined
            .last()
            .is_some_and(|last| last.ends_with(';') || last.ends_with('{') || last.ends_with(','));
    }

    joined
}

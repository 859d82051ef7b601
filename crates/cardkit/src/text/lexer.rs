//! Line unfolding and content-line tokenization.
//!
//! All three textual versions share the folding rule: a physical line
//! starting with a space or tab continues the previous logical line.
//! Parameter grammar differs per version and is handled here.

use std::collections::VecDeque;
use std::io::BufRead;

use crate::core::{Parameter, Parameters, VCardVersion};

use super::error::{ParseError, ParseErrorKind, ParseResult};

/// Produces logical lines from a byte source.
///
/// Line endings may be CRLF, LF, or CR. Unfolding discards the single
/// leading whitespace byte of each continuation line. Raw physical
/// lines are also exposed for quoted-printable soft-break joining.
pub struct LineScanner<R: BufRead> {
    reader: R,
    pending: VecDeque<String>,
    lookahead: Option<String>,
    physical_line: usize,
    eof: bool,
}

impl<R: BufRead> LineScanner<R> {
    /// Creates a scanner over the source.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
            lookahead: None,
            physical_line: 0,
            eof: false,
        }
    }

    /// Reads the next physical line, stripping the line terminator.
    ///
    /// ## Errors
    /// Fails when the underlying source fails.
    pub fn next_physical(&mut self) -> std::io::Result<Option<String>> {
        if let Some(line) = self.lookahead.take() {
            self.physical_line += 1;
            return Ok(Some(line));
        }
        let line = self.fill_physical()?;
        if line.is_some() {
            self.physical_line += 1;
        }
        Ok(line)
    }

    fn peek_physical(&mut self) -> std::io::Result<Option<&str>> {
        if self.lookahead.is_none() {
            self.lookahead = self.fill_physical()?;
        }
        Ok(self.lookahead.as_deref())
    }

    fn fill_physical(&mut self) -> std::io::Result<Option<String>> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Ok(Some(line));
            }
            if self.eof {
                return Ok(None);
            }

            let mut buf = String::new();
            let read = self.reader.read_line(&mut buf)?;
            if read == 0 {
                self.eof = true;
                continue;
            }

            if buf.ends_with('\n') {
                buf.pop();
            }
            if buf.ends_with('\r') {
                buf.pop();
            }

            // A bare CR inside the chunk is also a line terminator.
            if buf.contains('\r') {
                for piece in buf.split('\r') {
                    self.pending.push_back(piece.to_string());
                }
            } else {
                self.pending.push_back(buf);
            }
        }
    }

    /// Reads the next logical (unfolded) line.
    ///
    /// Returns the line and the physical line number it started on.
    /// Empty lines are skipped.
    ///
    /// ## Errors
    /// Fails when the underlying source fails.
    pub fn next_logical(&mut self) -> std::io::Result<Option<(String, usize)>> {
        loop {
            let Some(mut line) = self.next_physical()? else {
                return Ok(None);
            };
            let start = self.physical_line;

            if line.is_empty() {
                continue;
            }

            while let Some(next) = self.peek_physical()? {
                if next.starts_with([' ', '\t']) {
                    let continuation = self
                        .lookahead
                        .take()
                        .unwrap_or_default();
                    self.physical_line += 1;
                    line.push_str(&continuation[1..]);
                } else {
                    break;
                }
            }

            return Ok(Some((line, start)));
        }
    }
}

/// A tokenized content line before scribe dispatch.
#[derive(Debug, Clone)]
pub struct ContentLine {
    /// Property group, if present (non-empty).
    pub group: Option<String>,
    /// Property name (uppercase).
    pub name: String,
    /// Parameters in order of appearance.
    pub params: Parameters,
    /// Raw value string, exactly as on the logical line.
    pub value: String,
}

/// Parses a logical line into its components.
///
/// Format: `[group "."] name *(";" param) ":" value`. The parameter
/// grammar is version-dependent: 2.1 allows bare values (assigned to
/// TYPE) and no quoting; 3.0/4.0 allow quoted values, comma-separated
/// multi-values, and RFC 6868 caret escapes.
///
/// ## Errors
/// Fails when the colon separator is missing or the property name is
/// not a valid token.
pub fn parse_content_line(
    line: &str,
    line_num: usize,
    version: VCardVersion,
) -> ParseResult<ContentLine> {
    let colon_pos = find_value_separator(line).ok_or_else(|| {
        ParseError::new(
            ParseErrorKind::MissingColon,
            line_num,
            "missing colon separator",
        )
    })?;

    let (name_params, value) = line.split_at(colon_pos);
    let value = &value[1..];

    let (group, name_params) = parse_group(name_params);

    let (name, params_str) = match name_params.find(';') {
        Some(semi_pos) => (&name_params[..semi_pos], Some(&name_params[semi_pos + 1..])),
        None => (name_params, None),
    };

    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ParseError::new(
            ParseErrorKind::InvalidPropertyName,
            line_num,
            format!("invalid property name: {name}"),
        ));
    }

    let params = match params_str {
        Some(params_str) => parse_parameters(params_str, version),
        None => Parameters::new(),
    };

    Ok(ContentLine {
        group: group.map(String::from),
        name: name.to_ascii_uppercase(),
        params,
        value: value.to_string(),
    })
}

/// Finds the colon separating name/params from the value, skipping
/// quoted parameter values.
fn find_value_separator(line: &str) -> Option<usize> {
    let mut in_quotes = false;

    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ':' if !in_quotes => return Some(i),
            _ => {}
        }
    }

    None
}

/// Splits an optional group prefix off the name.
fn parse_group(s: &str) -> (Option<&str>, &str) {
    if let Some(dot_pos) = s.find('.') {
        let potential_group = &s[..dot_pos];
        if !potential_group.is_empty()
            && potential_group
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return (Some(potential_group), &s[dot_pos + 1..]);
        }
    }
    (None, s)
}

fn parse_parameters(s: &str, version: VCardVersion) -> Parameters {
    let mut params = Parameters::new();

    for piece in split_param_items(s, version) {
        match piece.split_once('=') {
            Some((name, raw_values)) => {
                let values = if version == VCardVersion::V2_1 {
                    vec![raw_values.to_string()]
                } else {
                    split_param_values(raw_values)
                };
                params.push(Parameter::multi(name, values));
            }
            // 2.1 allows bare values; they accumulate under TYPE.
            None if !piece.is_empty() => {
                params.put("TYPE", piece);
            }
            None => {}
        }
    }

    params
}

/// Splits the parameter section on unquoted semicolons.
fn split_param_items(s: &str, version: VCardVersion) -> Vec<String> {
    if version == VCardVersion::V2_1 {
        return s.split(';').map(String::from).collect();
    }

    let mut items = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in s.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ';' if !in_quotes => items.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    items.push(current);
    items
}

/// Parses a 3.0/4.0 parameter value list: comma-separated, individually
/// quotable, with RFC 6868 caret escapes.
fn split_param_values(s: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => values.push(std::mem::take(&mut current)),
            '^' => match chars.peek() {
                Some('n') => {
                    chars.next();
                    current.push('\n');
                }
                Some('\'') => {
                    chars.next();
                    current.push('"');
                }
                Some('^') => {
                    chars.next();
                    current.push('^');
                }
                _ => current.push('^'),
            },
            _ => current.push(c),
        }
    }

    values.push(current);
    values
}

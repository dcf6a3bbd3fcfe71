//! The untyped text-array parser.
//!
//! Parses PostgreSQL's brace-delimited array literal grammar into a flat
//! element list plus dimension metadata, with no knowledge of the element
//! type. Element substrings come out raw: quoting and escaping are resolved
//! here, so element decoders never see an unescaped quote character.
//!
//! ## Grammar
//!
//! ```text
//! literal   := bounds? array
//! bounds    := ( '[' int ':' int ']' )+ '='
//! array     := '{' items? '}'
//! items     := item ( ',' item )*
//! item      := array | quoted | unquoted
//! ```
//!
//! Elements are returned in row-major order (the order they appear in the
//! literal). The unquoted literal `NULL` marks a SQL null; a quoted
//! `"NULL"` is the four-character string, which is why every element carries
//! a `quoted` flag.
//!
//! ## Usage
//!
//! ```rust
//! use pg_array::parse_untyped_text_array;
//!
//! let parsed = parse_untyped_text_array("{{1,2},{3,4}}").unwrap();
//! assert_eq!(parsed.elements.len(), 4);
//! assert_eq!(parsed.dimensions.len(), 2);
//! assert_eq!(parsed.dimensions[0].length, 2);
//! ```

use crate::error::{Error, Result};
use crate::value::Dimension;

/// A single raw element substring from an array literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextElement {
    /// The element body with quoting and escaping already removed.
    pub value: String,
    /// Whether the element was quoted in the literal.
    pub quoted: bool,
}

impl TextElement {
    /// Whether this element is the SQL null marker (unquoted `NULL`,
    /// case-insensitive).
    pub fn is_null(&self) -> bool {
        !self.quoted && self.value.eq_ignore_ascii_case("NULL")
    }
}

/// The output of the untyped parser: a flat element list in row-major order
/// plus the inferred dimension descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UntypedTextArray {
    pub elements: Vec<TextElement>,
    pub dimensions: Vec<Dimension>,
}

/// Parses an array literal into raw elements and dimensions.
///
/// The empty literal `{}` (and nests of empty braces, which PostgreSQL
/// normalizes) yields zero dimensions and zero elements. Inconsistent
/// nesting, unbalanced braces, or trailing input all fail with
/// [`Error::Syntax`] carrying the byte position of the offending character.
///
/// # Errors
///
/// Returns [`Error::Syntax`] for any departure from the grammar; the whole
/// parse is fatal, there is no partial recovery.
pub fn parse_untyped_text_array(src: &str) -> Result<UntypedTextArray> {
    Parser::new(src).parse()
}

/// What kind of children an open brace level holds. A level may hold
/// scalars or sub-arrays, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LevelKind {
    Unknown,
    Scalars,
    Arrays,
}

#[derive(Debug)]
struct Level {
    count: i32,
    kind: LevelKind,
}

impl Level {
    fn new() -> Self {
        Level {
            count: 0,
            kind: LevelKind::Unknown,
        }
    }
}

struct Parser<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Parser { input, position: 0 }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn next_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.position += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.next_char() {
            Some(ch) if ch == expected => Ok(()),
            Some(ch) => Err(Error::syntax(
                self.position - ch.len_utf8(),
                format!("expected '{expected}', found '{ch}'"),
            )),
            None => Err(Error::syntax(
                self.position,
                format!("expected '{expected}', found end of input"),
            )),
        }
    }

    fn parse(mut self) -> Result<UntypedTextArray> {
        self.skip_whitespace();

        let explicit = if self.peek_char() == Some('[') {
            Some(self.parse_bounds_prefix()?)
        } else {
            None
        };

        self.skip_whitespace();
        self.expect('{')?;

        let mut elements: Vec<TextElement> = Vec::new();
        // Brace-derived length per nesting depth, recorded when the first
        // level at that depth closes and checked against every sibling.
        let mut lengths: Vec<Option<i32>> = vec![None];
        // Every scalar must sit at the same depth, the innermost one.
        let mut scalar_depth: Option<usize> = None;
        let mut stack: Vec<Level> = vec![Level::new()];

        loop {
            self.skip_whitespace();
            match self.peek_char() {
                Some('}') => {
                    self.next_char();
                    let depth = stack.len();
                    let closed = stack.pop().expect("level stack never empty here");
                    self.record_length(&mut lengths, depth, closed.count)?;

                    let Some(parent) = stack.last_mut() else {
                        break;
                    };
                    if parent.kind == LevelKind::Scalars {
                        return Err(Error::syntax(
                            self.position - 1,
                            "cannot mix scalars and sub-arrays at one nesting level",
                        ));
                    }
                    parent.kind = LevelKind::Arrays;
                    parent.count += 1;
                    self.expect_separator()?;
                }
                Some('{') => {
                    if stack.last().map(|l| l.kind) == Some(LevelKind::Scalars) {
                        return Err(Error::syntax(
                            self.position,
                            "cannot mix scalars and sub-arrays at one nesting level",
                        ));
                    }
                    self.next_char();
                    stack.push(Level::new());
                    if stack.len() > lengths.len() {
                        lengths.resize(stack.len(), None);
                    }
                }
                Some(',') => {
                    return Err(Error::syntax(self.position, "unexpected ','"));
                }
                Some(_) => {
                    let depth = stack.len();
                    let level = stack.last_mut().expect("level stack never empty here");
                    if level.kind == LevelKind::Arrays {
                        return Err(Error::syntax(
                            self.position,
                            "cannot mix scalars and sub-arrays at one nesting level",
                        ));
                    }
                    match scalar_depth {
                        None => scalar_depth = Some(depth),
                        Some(expected) if expected != depth => {
                            return Err(Error::syntax(
                                self.position,
                                "multidimensional arrays must have sub-arrays with matching dimensions",
                            ));
                        }
                        Some(_) => {}
                    }
                    let elem = self.parse_element()?;
                    level.kind = LevelKind::Scalars;
                    level.count += 1;
                    elements.push(elem);
                    self.expect_separator()?;
                }
                None => {
                    return Err(Error::syntax(
                        self.position,
                        "unexpected end of input, unbalanced '{'",
                    ));
                }
            }
        }

        self.skip_whitespace();
        if let Some(ch) = self.peek_char() {
            return Err(Error::syntax(
                self.position,
                format!("unexpected '{ch}' after array literal"),
            ));
        }

        // PostgreSQL normalizes arrays with no elements to zero dimensions.
        if elements.is_empty() {
            if let Some(explicit) = &explicit {
                let product: i64 = explicit.iter().map(|d| i64::from(d.length)).product();
                if product != 0 {
                    return Err(Error::syntax(
                        self.position,
                        "specified array dimensions do not match array contents",
                    ));
                }
            }
            return Ok(UntypedTextArray {
                elements,
                dimensions: Vec::new(),
            });
        }

        let parsed: Vec<i32> = lengths
            .into_iter()
            .map(|l| l.expect("every opened level records a length on close"))
            .collect();

        let dimensions = match explicit {
            Some(explicit) => {
                let matches = explicit.len() == parsed.len()
                    && explicit.iter().zip(&parsed).all(|(d, &l)| d.length == l);
                if !matches {
                    return Err(Error::syntax(
                        self.position,
                        "specified array dimensions do not match array contents",
                    ));
                }
                explicit
            }
            None => parsed
                .into_iter()
                .map(|length| Dimension {
                    length,
                    lower_bound: 1,
                })
                .collect(),
        };

        Ok(UntypedTextArray {
            elements,
            dimensions,
        })
    }

    /// After an element or a closed sub-array: either a ',' introducing the
    /// next sibling or the '}' that closes the level (left unconsumed).
    fn expect_separator(&mut self) -> Result<()> {
        self.skip_whitespace();
        match self.peek_char() {
            Some(',') => {
                self.next_char();
                self.skip_whitespace();
                match self.peek_char() {
                    Some('}') => Err(Error::syntax(self.position, "unexpected '}' after ','")),
                    None => Err(Error::syntax(self.position, "unexpected end of input")),
                    Some(_) => Ok(()),
                }
            }
            Some('}') => Ok(()),
            Some(ch) => Err(Error::syntax(
                self.position,
                format!("expected ',' or '}}', found '{ch}'"),
            )),
            None => Err(Error::syntax(
                self.position,
                "unexpected end of input, unbalanced '{'",
            )),
        }
    }

    fn record_length(
        &self,
        lengths: &mut [Option<i32>],
        depth: usize,
        count: i32,
    ) -> Result<()> {
        match lengths[depth - 1] {
            None => {
                lengths[depth - 1] = Some(count);
                Ok(())
            }
            Some(expected) if expected == count => Ok(()),
            Some(_) => Err(Error::syntax(
                self.position - 1,
                "multidimensional arrays must have sub-arrays with matching dimensions",
            )),
        }
    }

    fn parse_element(&mut self) -> Result<TextElement> {
        if self.peek_char() == Some('"') {
            self.parse_quoted_element()
        } else {
            self.parse_unquoted_element()
        }
    }

    fn parse_quoted_element(&mut self) -> Result<TextElement> {
        self.next_char(); // opening quote
        let mut value = String::new();
        loop {
            match self.next_char() {
                Some('"') => {
                    return Ok(TextElement {
                        value,
                        quoted: true,
                    })
                }
                Some('\\') => match self.next_char() {
                    Some(ch) => value.push(ch),
                    None => {
                        return Err(Error::syntax(
                            self.position,
                            "unexpected end of input in quoted element",
                        ))
                    }
                },
                Some(ch) => value.push(ch),
                None => {
                    return Err(Error::syntax(
                        self.position,
                        "unterminated quoted element",
                    ))
                }
            }
        }
    }

    fn parse_unquoted_element(&mut self) -> Result<TextElement> {
        let start = self.position;
        while let Some(ch) = self.peek_char() {
            match ch {
                ',' | '}' => break,
                '{' | '"' | '\\' => {
                    return Err(Error::syntax(
                        self.position,
                        format!("'{ch}' is not allowed in an unquoted element"),
                    ))
                }
                _ => {
                    self.next_char();
                }
            }
        }
        let value = self.input[start..self.position].trim_end();
        if value.is_empty() {
            return Err(Error::syntax(start, "empty unquoted element"));
        }
        Ok(TextElement {
            value: value.to_string(),
            quoted: false,
        })
    }

    /// Parses the explicit `[lb:ub]...=` dimension-bound prefix.
    fn parse_bounds_prefix(&mut self) -> Result<Vec<Dimension>> {
        let mut dimensions = Vec::new();
        while self.peek_char() == Some('[') {
            self.next_char();
            let lower = self.parse_int()?;
            self.expect(':')?;
            let upper = self.parse_int()?;
            self.expect(']')?;
            if upper < lower {
                return Err(Error::syntax(
                    self.position,
                    "dimension upper bound is less than lower bound",
                ));
            }
            let length = upper
                .checked_sub(lower)
                .and_then(|span| span.checked_add(1))
                .ok_or_else(|| {
                    Error::syntax(self.position, "dimension bounds out of range")
                })?;
            dimensions.push(Dimension {
                length,
                lower_bound: lower,
            });
        }
        self.expect('=')?;
        Ok(dimensions)
    }

    fn parse_int(&mut self) -> Result<i32> {
        let start = self.position;
        if self.peek_char() == Some('-') {
            self.next_char();
        }
        while matches!(self.peek_char(), Some(ch) if ch.is_ascii_digit()) {
            self.next_char();
        }
        self.input[start..self.position]
            .parse::<i32>()
            .map_err(|_| Error::syntax(start, "invalid integer in dimension bounds"))
    }
}

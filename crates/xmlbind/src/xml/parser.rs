//! Markup parser producing [`Fragment`] trees

use crate::error::{Error, ErrorKind, Result, Span};
use crate::lexer::Cursor;
use crate::xml::model::{Attribute, Fragment};

/// Configuration for the markup parser
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Skip `<!-- -->` comments instead of rejecting them
    pub ignore_comments: bool,
    /// Drop whitespace-only text instead of keeping it as a leaf value
    pub ignore_whitespace: bool,
    /// Skip `<? ?>` processing instructions instead of rejecting them
    pub ignore_processing_instructions: bool,
    /// Maximum element nesting depth (0 means unlimited)
    pub max_depth: u16,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            ignore_comments: true,
            ignore_whitespace: true,
            ignore_processing_instructions: true,
            max_depth: 256,
        }
    }
}

impl ParseOptions {
    /// Options that reject every node kind the tree cannot represent
    pub const fn strict() -> Self {
        Self {
            ignore_comments: false,
            ignore_whitespace: false,
            ignore_processing_instructions: false,
            max_depth: 256,
        }
    }

    pub const fn with_ignore_comments(mut self, ignore: bool) -> Self {
        self.ignore_comments = ignore;
        self
    }

    pub const fn with_ignore_whitespace(mut self, ignore: bool) -> Self {
        self.ignore_whitespace = ignore;
        self
    }

    pub const fn with_ignore_processing_instructions(mut self, ignore: bool) -> Self {
        self.ignore_processing_instructions = ignore;
        self
    }

    pub const fn with_max_depth(mut self, max_depth: u16) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Kinds of markup node, used to report structural mismatches
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NodeKind {
    Element,
    EndTag,
    Text,
    Comment,
    ProcessingInstruction,
    Declaration,
    EndOfInput,
}

impl NodeKind {
    const fn describe(self) -> &'static str {
        match self {
            Self::Element => "element",
            Self::EndTag => "end tag",
            Self::Text => "text",
            Self::Comment => "comment",
            Self::ProcessingInstruction => "processing instruction",
            Self::Declaration => "declaration",
            Self::EndOfInput => "end of input",
        }
    }
}

/// Text collected inside one element
#[derive(Default)]
struct TextContent {
    buffer: String,
    significant: bool,
}

impl TextContent {
    fn push(&mut self, text: &str, significant: bool) {
        self.buffer.push_str(text);
        self.significant |= significant;
    }
}

/// Markup parser
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    options: ParseOptions,
    depth: u16,
}

impl<'a> Parser<'a> {
    /// Create a new parser with default options
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_options(input, ParseOptions::default())
    }

    pub const fn with_options(input: &'a [u8], options: ParseOptions) -> Self {
        Self {
            cursor: Cursor::new(input),
            options,
            depth: 0,
        }
    }

    /// Parse a complete document and return its root element
    pub fn parse(&mut self) -> Result<Fragment> {
        self.skip_bom();
        self.skip_misc(true)?;

        match self.peek_kind() {
            NodeKind::Element => {}
            found => return Err(self.mismatch(NodeKind::Element, found)),
        }
        let root = self.parse_element()?;

        self.skip_misc(false)?;
        if !self.cursor.is_eof() {
            let found = self.peek_kind();
            return Err(self.mismatch(NodeKind::EndOfInput, found));
        }

        Ok(root)
    }

    /// Skip whitespace, comments, processing instructions and (in the prolog)
    /// the XML declaration and doctype
    fn skip_misc(&mut self, prolog: bool) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            match self.peek_kind() {
                NodeKind::Comment => self.skip_comment(NodeKind::Element)?,
                NodeKind::ProcessingInstruction => {
                    if prolog && self.cursor.starts_with(b"<?xml") && self.at_declaration() {
                        self.cursor.advance_by(2);
                        self.skip_until(b"?>")?;
                    } else {
                        self.skip_processing_instruction(NodeKind::Element)?;
                    }
                }
                NodeKind::Declaration if prolog => self.skip_doctype()?,
                _ => return Ok(()),
            }
        }
    }

    fn parse_element(&mut self) -> Result<Fragment> {
        self.expect_byte(b'<')?;
        let name = self.parse_name()?;
        let attributes = self.parse_attributes()?;
        self.enter()?;

        if self.cursor.consume(b'/') {
            self.expect_byte(b'>')?;
            self.leave();
            return Ok(Fragment {
                name,
                value: None,
                attributes,
                children: Vec::new(),
            });
        }
        self.expect_byte(b'>')?;

        let mut children = Vec::new();
        let mut text = TextContent::default();

        loop {
            match self.peek_kind() {
                NodeKind::EndTag => break,
                NodeKind::EndOfInput => return Err(self.malformed("unterminated element")),
                NodeKind::Comment => self.skip_comment(Self::expected_after(&text))?,
                NodeKind::ProcessingInstruction => {
                    self.skip_processing_instruction(Self::expected_after(&text))?;
                }
                NodeKind::Declaration => {
                    if self.cursor.starts_with(b"<![CDATA[") {
                        let cdata = self.parse_cdata()?;
                        text.push(&cdata, true);
                    } else {
                        return Err(
                            self.mismatch(Self::expected_after(&text), NodeKind::Declaration)
                        );
                    }
                }
                NodeKind::Element => {
                    if text.significant {
                        return Err(self.mismatch(NodeKind::EndTag, NodeKind::Element));
                    }
                    text.buffer.clear();
                    children.push(self.parse_element()?);
                }
                NodeKind::Text => {
                    let chunk = self.parse_text()?;
                    let significant = !chunk.trim().is_empty();
                    text.push(&chunk, significant);
                }
            }
        }

        self.parse_end_tag(&name)?;
        self.leave();

        let value = if text.significant
            || (!self.options.ignore_whitespace && children.is_empty() && !text.buffer.is_empty())
        {
            Some(text.buffer)
        } else {
            None
        };

        Ok(Fragment {
            name,
            value,
            attributes,
            children,
        })
    }

    /// What the element content expects next, for mismatch reports
    fn expected_after(text: &TextContent) -> NodeKind {
        if text.significant {
            NodeKind::EndTag
        } else {
            NodeKind::Element
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth = self.depth.saturating_add(1);
        if self.options.max_depth != 0 && self.depth > self.options.max_depth {
            return Err(self.malformed(&format!(
                "max depth exceeded: {}",
                self.options.max_depth
            )));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn parse_end_tag(&mut self, name: &str) -> Result<()> {
        self.cursor.advance_by(2);
        let close_name = self.parse_name()?;
        if close_name != name {
            return Err(self.malformed(&format!(
                "mismatched closing tag: expected </{name}>, found </{close_name}>"
            )));
        }
        self.cursor.skip_whitespace();
        self.expect_byte(b'>')
    }

    fn parse_attributes(&mut self) -> Result<Vec<Attribute>> {
        let mut attrs = Vec::new();

        loop {
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/') | Some(b'>') => break,
                Some(_) => {}
                None => return Err(self.malformed("unexpected end of input")),
            }

            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;
            attrs.push(Attribute { name, value });
        }

        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(b'"') => b'"',
            Some(b'\'') => b'\'',
            _ => return Err(self.malformed("expected quoted attribute value")),
        };
        self.cursor.advance();

        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance();
                let text = self.bytes_to_string(raw)?;
                return self.decode_entities(&text);
            }
            if b == b'<' {
                return Err(self.malformed("'<' in attribute value"));
            }
            self.cursor.advance();
        }

        Err(self.malformed("unterminated attribute value"))
    }

    fn parse_text(&mut self) -> Result<String> {
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }

        let raw = self.cursor.slice_from(start);
        let text = self.bytes_to_string(raw)?;
        self.decode_entities(&text)
    }

    fn parse_cdata(&mut self) -> Result<String> {
        self.cursor.advance_by(b"<![CDATA[".len());
        let start = self.cursor.pos();
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(b"]]>") {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance_by(3);
                return self.bytes_to_string(raw);
            }
            self.cursor.advance();
        }
        Err(self.malformed("unterminated CDATA section"))
    }

    fn parse_name(&mut self) -> Result<String> {
        let start = self.cursor.pos();

        let Some(first) = self.cursor.current() else {
            return Err(self.malformed("expected name"));
        };
        if !is_name_start(first) {
            return Err(self.malformed("invalid name"));
        }

        self.cursor.advance();
        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        let raw = self.cursor.slice_from(start);
        self.bytes_to_string(raw)
    }

    fn peek_kind(&self) -> NodeKind {
        match self.cursor.current() {
            None => NodeKind::EndOfInput,
            Some(b'<') => match self.cursor.peek(1) {
                Some(b'/') => NodeKind::EndTag,
                Some(b'?') => NodeKind::ProcessingInstruction,
                Some(b'!') if self.cursor.starts_with(b"<!--") => NodeKind::Comment,
                Some(b'!') => NodeKind::Declaration,
                _ => NodeKind::Element,
            },
            Some(_) => NodeKind::Text,
        }
    }

    /// `<?xml` followed by whitespace, not a PI target such as `<?xml-stylesheet`
    fn at_declaration(&self) -> bool {
        matches!(
            self.cursor.peek(5),
            Some(b' ' | b'\t' | b'\r' | b'\n' | b'?')
        )
    }

    fn skip_comment(&mut self, expected: NodeKind) -> Result<()> {
        if !self.options.ignore_comments {
            return Err(self.mismatch(expected, NodeKind::Comment));
        }
        self.cursor.advance_by(4);
        self.skip_until(b"-->")
    }

    fn skip_processing_instruction(&mut self, expected: NodeKind) -> Result<()> {
        if !self.options.ignore_processing_instructions {
            return Err(self.mismatch(expected, NodeKind::ProcessingInstruction));
        }
        self.cursor.advance_by(2);
        self.skip_until(b"?>")
    }

    fn skip_doctype(&mut self) -> Result<()> {
        // an internal subset may contain '>' inside brackets
        let mut bracket_depth = 0usize;
        while let Some(b) = self.cursor.current() {
            self.cursor.advance();
            match b {
                b'[' => bracket_depth += 1,
                b']' => bracket_depth = bracket_depth.saturating_sub(1),
                b'>' if bracket_depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(self.malformed("unterminated declaration"))
    }

    fn skip_bom(&mut self) {
        if self.cursor.starts_with(&[0xEF, 0xBB, 0xBF]) {
            self.cursor.advance_by(3);
        }
    }

    fn skip_until(&mut self, pattern: &[u8]) -> Result<()> {
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(pattern) {
                self.cursor.advance_by(pattern.len());
                return Ok(());
            }
            self.cursor.advance();
        }
        Err(self.malformed("unterminated markup"))
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.consume(expected) {
            Ok(())
        } else {
            Err(self.malformed(&format!("expected '{}'", char::from(expected))))
        }
    }

    fn here(&self) -> Span {
        let pos = self.cursor.position();
        Span::new(pos, pos)
    }

    fn malformed(&self, message: &str) -> Error {
        Error::with_message(ErrorKind::MalformedInput, self.here(), message)
    }

    fn mismatch(&self, expected: NodeKind, found: NodeKind) -> Error {
        Error::new(
            ErrorKind::StructuralMismatch {
                expected: expected.describe().to_string(),
                found: found.describe().to_string(),
            },
            self.here(),
        )
    }

    fn bytes_to_string(&self, bytes: &[u8]) -> Result<String> {
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| self.malformed("invalid utf-8"))
    }

    fn decode_entities(&self, input: &str) -> Result<String> {
        if !input.contains('&') {
            return Ok(input.to_string());
        }

        let mut result = String::with_capacity(input.len());
        let mut chars = input.chars();
        while let Some(ch) = chars.next() {
            if ch != '&' {
                result.push(ch);
                continue;
            }

            let mut entity = String::new();
            let mut terminated = false;
            for next in chars.by_ref() {
                if next == ';' {
                    terminated = true;
                    break;
                }
                entity.push(next);
            }
            if !terminated {
                return Err(self.malformed("unterminated entity reference"));
            }

            let decoded = match entity.as_str() {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => decode_numeric_entity(&entity),
            };

            match decoded {
                Some(ch) => result.push(ch),
                None => return Err(self.malformed(&format!("invalid entity: &{entity};"))),
            }
        }

        Ok(result)
    }
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}

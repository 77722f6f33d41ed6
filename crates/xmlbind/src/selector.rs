//! Compact element selectors: `Name[#Index]?([Key=Value(,Key=Value)*])?`
//!
//! The name is matched case-insensitively. Each bracketed constraint must
//! hold: the reserved key `value` tests the element's text, any other key
//! tests the first attribute with that name. Values compare exactly.
//!
//! The `#Index` segment is parsed and kept but does not take part in
//! matching.

use std::fmt;
use std::str::FromStr;

use tracing::trace;

use crate::document::ElementRef;
use crate::error::{Error, ErrorKind, Result, Span};
use crate::xml::model::names_eq;

/// Reserved constraint key addressing the element's text value
pub const VALUE_KEY: &str = "value";

/// What a constraint compares against
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Value,
    Attribute(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Constraint {
    pub target: Target,
    pub expected: String,
}

impl Constraint {
    fn holds(&self, element: &ElementRef<'_>) -> bool {
        let actual = match &self.target {
            Target::Value => element.value(),
            Target::Attribute(name) => element.attribute(name),
        };
        actual == Some(self.expected.as_str())
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Target::Value => write!(f, "{VALUE_KEY}={}", self.expected),
            Target::Attribute(name) => write!(f, "{name}={}", self.expected),
        }
    }
}

/// Parsed selector
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    name: String,
    index: Option<i64>,
    constraints: Vec<Constraint>,
}

impl Selector {
    /// Selector matching any element with this name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
            constraints: Vec::new(),
        }
    }

    /// Add an attribute constraint
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, expected: impl Into<String>) -> Self {
        self.constraints.push(Constraint {
            target: Target::Attribute(name.into()),
            expected: expected.into(),
        });
        self
    }

    /// Add a text value constraint
    #[must_use]
    pub fn with_value(mut self, expected: impl Into<String>) -> Self {
        self.constraints.push(Constraint {
            target: Target::Value,
            expected: expected.into(),
        });
        self
    }

    pub fn parse(selector: &str) -> Result<Self> {
        let invalid = |reason: &str| {
            Error::with_message(
                ErrorKind::InvalidSelector {
                    selector: selector.to_string(),
                },
                Span::empty(),
                format!("invalid selector '{selector}': {reason}"),
            )
        };

        let name_end = selector.find(['#', '[']).unwrap_or(selector.len());
        let (name, mut rest) = selector.split_at(name_end);
        if name.is_empty() {
            return Err(invalid("missing element name"));
        }

        let mut index = None;
        if let Some(after_hash) = rest.strip_prefix('#') {
            let index_end = after_hash.find('[').unwrap_or(after_hash.len());
            let (digits, tail) = after_hash.split_at(index_end);
            index = Some(
                digits
                    .parse::<i64>()
                    .map_err(|_| invalid("index is not an integer"))?,
            );
            rest = tail;
        }

        let mut constraints = Vec::new();
        if let Some(after_bracket) = rest.strip_prefix('[') {
            let (body, tail) = after_bracket
                .split_once(']')
                .ok_or_else(|| invalid("unterminated '['"))?;
            if !tail.is_empty() {
                return Err(invalid("unexpected text after ']'"));
            }
            if body.contains('[') {
                return Err(invalid("nested '['"));
            }
            if !body.is_empty() {
                for pair in body.split(',') {
                    let (key, expected) = pair
                        .split_once('=')
                        .ok_or_else(|| invalid("constraint without '='"))?;
                    if key.is_empty() {
                        return Err(invalid("constraint without key"));
                    }
                    let target = if names_eq(key, VALUE_KEY) {
                        Target::Value
                    } else {
                        Target::Attribute(key.to_string())
                    };
                    constraints.push(Constraint {
                        target,
                        expected: expected.to_string(),
                    });
                }
            }
        } else if !rest.is_empty() {
            return Err(invalid("unexpected trailing text"));
        }

        Ok(Self {
            name: name.to_string(),
            index,
            constraints,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `#Index` segment, if present; it has no effect on matching
    pub const fn index(&self) -> Option<i64> {
        self.index
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Test one element against this selector
    pub fn matches(&self, element: ElementRef<'_>) -> bool {
        let matched = names_eq(element.name(), &self.name)
            && self
                .constraints
                .iter()
                .all(|constraint| constraint.holds(&element));
        trace!(selector = %self, element = element.name(), matched, "selector test");
        matched
    }
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(index) = self.index {
            write!(f, "#{index}")?;
        }
        if !self.constraints.is_empty() {
            write!(f, "[")?;
            for (i, constraint) in self.constraints.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{constraint}")?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

/// Parse `selector` and test it against `element`
pub fn matches(element: ElementRef<'_>, selector: &str) -> Result<bool> {
    Ok(Selector::parse(selector)?.matches(element))
}

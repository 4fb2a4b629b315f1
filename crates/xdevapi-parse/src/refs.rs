//! Column, function and document-path reference values.

use core::fmt;

use crate::processor::PathProcessor;

/// Reference to a table column, optionally qualified.
///
/// A set `schema` implies a set `table`; the parser never builds a
/// schema-qualified reference without a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub schema: Option<String>,
    pub table: Option<String>,
    pub name: String,
}

impl ColumnRef {
    /// Unqualified column.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: None,
            name: name.into(),
        }
    }

    /// `table.column`.
    #[must_use]
    pub fn with_table(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: Some(table.into()),
            name: name.into(),
        }
    }

    /// `schema.table.column`.
    #[must_use]
    pub fn with_schema(
        schema: impl Into<String>,
        table: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            schema: Some(schema.into()),
            table: Some(table.into()),
            name: name.into(),
        }
    }
}

/// Reference to a callable, optionally schema-qualified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRef {
    pub schema: Option<String>,
    pub name: String,
}

impl FunctionRef {
    /// Unqualified function name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    /// `schema.function`.
    #[must_use]
    pub fn with_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }
}

/// One step of a document path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathElement {
    /// `.name` member access.
    Member(String),
    /// `.*` any-member wildcard.
    AnyMember,
    /// `[n]` array index.
    Index(u32),
    /// `[*]` any-index wildcard.
    AnyIndex,
    /// `**` descend-anywhere wildcard.
    AnyPath,
}

/// Parsed document path, e.g. `$.address.line[0]`.
///
/// An empty path refers to the whole document. A non-empty path never
/// ends with [`PathElement::AnyPath`]; the parsers reject that shape.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocPath {
    pub elements: Vec<PathElement>,
}

impl DocPath {
    /// Empty path (whole document).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    /// Appends one element.
    pub fn push(&mut self, element: PathElement) {
        self.elements.push(element);
    }

    /// Number of path steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True for the whole-document path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Replays the path steps into `prc` in order.
    pub fn process(&self, prc: &mut dyn PathProcessor) {
        for element in &self.elements {
            match element {
                PathElement::Member(name) => prc.member(name),
                PathElement::AnyMember => prc.any_member(),
                PathElement::Index(idx) => prc.index(*idx),
                PathElement::AnyIndex => prc.any_index(),
                PathElement::AnyPath => prc.any_path(),
            }
        }
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for element in &self.elements {
            match element {
                PathElement::Member(name) => {
                    if !name.is_empty()
                        && name
                            .chars()
                            .all(|c| c.is_ascii_alphanumeric() || c == '_')
                    {
                        write!(f, ".{name}")?;
                    } else {
                        write!(f, ".`{}`", name.replace('`', "``"))?;
                    }
                }
                PathElement::AnyMember => f.write_str(".*")?,
                PathElement::Index(idx) => write!(f, "[{idx}]")?,
                PathElement::AnyIndex => f.write_str("[*]")?,
                PathElement::AnyPath => f.write_str("**")?,
            }
        }
        Ok(())
    }
}

//! Processor (visitor) interfaces the parsers report through.
//!
//! Parsing produces no tree by default. Each grammar production reports
//! straight into a processor; implementations override the callbacks
//! they care about and every method has a no-op default body.
//!
//! Branch selectors (`scalar`, `arr`, `doc`, `op`, `call`, `list_el`,
//! `key_val`) return `Option<&mut _>`. Returning `None` skips the
//! reporting of that subtree; the parser still consumes the subtree's
//! tokens and never invokes callbacks on a declined branch.
//!
//! Callbacks balance: one `list_end` per `list_begin`, one `doc_end` per
//! `doc_begin`, and each expression node reports through exactly one of
//! the scalar/array/document/operator/reference channels.

use crate::refs::{ColumnRef, DocPath, FunctionRef};

/// Receiver for scalar values.
pub trait ScalarProcessor {
    fn null(&mut self) {}
    fn str(&mut self, _value: &str) {}
    fn num_int(&mut self, _value: i64) {}
    fn num_uint(&mut self, _value: u64) {}
    fn num_float(&mut self, _value: f32) {}
    fn num_double(&mut self, _value: f64) {}
    fn yesno(&mut self, _value: bool) {}
    /// Raw bytes with no further interpretation. Carries hex strings,
    /// CAST type descriptors and IN-list string blobs.
    fn octets(&mut self, _value: &[u8]) {}
}

/// Receiver for an ordered sequence of `El`-reported values.
pub trait ListProcessor<El: ?Sized> {
    fn list_begin(&mut self) {}
    /// Reporter for the next element, or `None` to skip it.
    fn list_el(&mut self) -> Option<&mut El> {
        None
    }
    fn list_end(&mut self) {}
}

/// Receiver for a key/value document of `El`-reported values.
pub trait DocProcessor<El: ?Sized> {
    fn doc_begin(&mut self) {}
    /// Reporter for the value under `key`, or `None` to skip it.
    fn key_val(&mut self, _key: &str) -> Option<&mut El> {
        None
    }
    fn doc_end(&mut self) {}
}

/// Receiver for document-path steps.
pub trait PathProcessor {
    fn member(&mut self, _name: &str) {}
    fn any_member(&mut self) {}
    fn index(&mut self, _idx: u32) {}
    fn any_index(&mut self) {}
    fn any_path(&mut self) {}
}

/// List reporter whose elements are full expressions.
pub type ExprList = dyn ListProcessor<dyn ExprProcessor>;
/// Document reporter whose values are full expressions.
pub type ExprDoc = dyn DocProcessor<dyn ExprProcessor>;

/// Receiver for one expression.
///
/// Operator applications report the operator name first; arguments
/// follow as elements of the returned list, left operand first.
pub trait ExprProcessor {
    /// The expression is a scalar literal.
    fn scalar(&mut self) -> Option<&mut dyn ScalarProcessor> {
        None
    }
    /// The expression is an array literal.
    fn arr(&mut self) -> Option<&mut ExprList> {
        None
    }
    /// The expression is a document literal.
    fn doc(&mut self) -> Option<&mut ExprDoc> {
        None
    }
    /// The expression applies the named operator to the listed arguments.
    fn op(&mut self, _name: &str) -> Option<&mut ExprList> {
        None
    }
    /// The expression calls a named function with the listed arguments.
    fn call(&mut self, _func: &FunctionRef) -> Option<&mut ExprList> {
        None
    }
    /// The expression names a column, optionally with a path into its
    /// document value.
    fn column_ref(&mut self, _col: &ColumnRef, _path: Option<&DocPath>) {}
    /// The expression is a path into the current document.
    fn path_ref(&mut self, _path: &DocPath) {}
    /// Named placeholder `:name`.
    fn named_param(&mut self, _name: &str) {}
    /// Positional placeholder `?`; positions count from 1 per parse.
    fn pos_param(&mut self, _position: u16) {}
    /// Session variable `@name`.
    fn variable(&mut self, _name: &str) {}
}

/// List reporter whose elements are JSON values.
pub type JsonList = dyn ListProcessor<dyn JsonProcessor>;
/// Document reporter whose values are JSON values.
pub type JsonDoc = dyn DocProcessor<dyn JsonProcessor>;

/// Receiver for one JSON value: scalar, array or document only.
pub trait JsonProcessor {
    fn scalar(&mut self) -> Option<&mut dyn ScalarProcessor> {
        None
    }
    fn arr(&mut self) -> Option<&mut JsonList> {
        None
    }
    fn doc(&mut self) -> Option<&mut JsonDoc> {
        None
    }
}

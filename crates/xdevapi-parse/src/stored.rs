//! Owned expression values: capture a processed expression, replay it
//! later.
//!
//! [`StoredExpr`] is the materialized form of one processor callback
//! sequence. [`StoredBuilder`] implements the processor interfaces and
//! records whatever is reported into it; [`StoredExpr::process`] plays a
//! value back into any processor, producing the same callback sequence
//! the original parse would have produced.

use crate::processor::{
    DocProcessor, ExprDoc, ExprList, ExprProcessor, JsonDoc, JsonList, JsonProcessor,
    ListProcessor, ScalarProcessor,
};
use crate::refs::{ColumnRef, DocPath, FunctionRef};

/// A scalar literal in stored form.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredScalar {
    Null,
    Str(String),
    Int(i64),
    Uint(u64),
    Float(f32),
    Double(f64),
    Bool(bool),
    Octets(Vec<u8>),
}

impl StoredScalar {
    /// Replays this scalar into `prc`.
    pub fn process(&self, prc: &mut dyn ScalarProcessor) {
        match self {
            Self::Null => prc.null(),
            Self::Str(value) => prc.str(value),
            Self::Int(value) => prc.num_int(*value),
            Self::Uint(value) => prc.num_uint(*value),
            Self::Float(value) => prc.num_float(*value),
            Self::Double(value) => prc.num_double(*value),
            Self::Bool(value) => prc.yesno(*value),
            Self::Octets(value) => prc.octets(value),
        }
    }
}

/// An expression captured as an owned tree.
///
/// Exclusively owned and acyclic; dropping a node drops its subtree.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredExpr {
    /// Operator application: name, then arguments in reported order.
    Op(String, Vec<StoredExpr>),
    /// Function call with arguments.
    Call(FunctionRef, Vec<StoredExpr>),
    /// Column reference with optional document path.
    ColumnRef(ColumnRef, Option<DocPath>),
    /// Path into the current document.
    PathRef(DocPath),
    /// Named placeholder `:name`.
    NamedParam(String),
    /// Positional placeholder, 1-based.
    PosParam(u16),
    /// Session variable `@name`.
    Variable(String),
    /// Scalar literal.
    Scalar(StoredScalar),
    /// Array literal.
    Arr(Vec<StoredExpr>),
    /// Document literal as ordered key/value pairs.
    Doc(Vec<(String, StoredExpr)>),
}

impl StoredExpr {
    /// Replays this expression into `prc`, honoring declined branches
    /// the same way a live parse does.
    pub fn process(&self, prc: &mut dyn ExprProcessor) {
        match self {
            Self::Op(name, args) => {
                if let Some(list) = prc.op(name) {
                    Self::process_list(args, list);
                }
            }
            Self::Call(func, args) => {
                if let Some(list) = prc.call(func) {
                    Self::process_list(args, list);
                }
            }
            Self::ColumnRef(col, path) => prc.column_ref(col, path.as_ref()),
            Self::PathRef(path) => prc.path_ref(path),
            Self::NamedParam(name) => prc.named_param(name),
            Self::PosParam(position) => prc.pos_param(*position),
            Self::Variable(name) => prc.variable(name),
            Self::Scalar(scalar) => {
                if let Some(sp) = prc.scalar() {
                    scalar.process(sp);
                }
            }
            Self::Arr(items) => {
                if let Some(list) = prc.arr() {
                    Self::process_list(items, list);
                }
            }
            Self::Doc(entries) => {
                if let Some(doc) = prc.doc() {
                    doc.doc_begin();
                    for (key, value) in entries {
                        if let Some(ep) = doc.key_val(key) {
                            value.process(ep);
                        }
                    }
                    doc.doc_end();
                }
            }
        }
    }

    fn process_list(items: &[StoredExpr], list: &mut ExprList) {
        list.list_begin();
        for item in items {
            if let Some(ep) = list.list_el() {
                item.process(ep);
            }
        }
        list.list_end();
    }
}

/// One node under construction inside [`StoredBuilder`].
#[derive(Debug)]
enum Frame {
    Op {
        name: String,
        args: Vec<StoredExpr>,
    },
    Call {
        func: FunctionRef,
        args: Vec<StoredExpr>,
    },
    Arr {
        items: Vec<StoredExpr>,
    },
    Doc {
        entries: Vec<(String, StoredExpr)>,
        pending_key: Option<String>,
    },
}

/// Processor that captures the reported expression as a [`StoredExpr`].
///
/// Accepts every branch it is offered. Feed it a complete, balanced
/// callback sequence (one top-level expression), then take the value
/// with [`StoredBuilder::build`].
#[derive(Debug, Default)]
pub struct StoredBuilder {
    frames: Vec<Frame>,
    result: Option<StoredExpr>,
}

impl StoredBuilder {
    /// Empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The captured expression, or `None` when nothing was reported.
    #[must_use]
    pub fn build(self) -> Option<StoredExpr> {
        self.result
    }

    /// Routes a finished node into the enclosing frame, or makes it the
    /// result at top level.
    fn complete(&mut self, node: StoredExpr) {
        match self.frames.last_mut() {
            Some(Frame::Op { args, .. } | Frame::Call { args, .. }) => args.push(node),
            Some(Frame::Arr { items }) => items.push(node),
            Some(Frame::Doc {
                entries,
                pending_key,
            }) => {
                // A value with no preceding key_val has nowhere to go.
                if let Some(key) = pending_key.take() {
                    entries.push((key, node));
                }
            }
            None => self.result = Some(node),
        }
    }

    fn close_list(&mut self) {
        match self.frames.pop() {
            Some(Frame::Op { name, args }) => self.complete(StoredExpr::Op(name, args)),
            Some(Frame::Call { func, args }) => self.complete(StoredExpr::Call(func, args)),
            Some(Frame::Arr { items }) => self.complete(StoredExpr::Arr(items)),
            Some(frame @ Frame::Doc { .. }) => self.frames.push(frame),
            None => {}
        }
    }

    fn close_doc(&mut self) {
        match self.frames.pop() {
            Some(Frame::Doc { entries, .. }) => self.complete(StoredExpr::Doc(entries)),
            Some(other) => self.frames.push(other),
            None => {}
        }
    }
}

impl ScalarProcessor for StoredBuilder {
    fn null(&mut self) {
        self.complete(StoredExpr::Scalar(StoredScalar::Null));
    }
    fn str(&mut self, value: &str) {
        self.complete(StoredExpr::Scalar(StoredScalar::Str(value.to_string())));
    }
    fn num_int(&mut self, value: i64) {
        self.complete(StoredExpr::Scalar(StoredScalar::Int(value)));
    }
    fn num_uint(&mut self, value: u64) {
        self.complete(StoredExpr::Scalar(StoredScalar::Uint(value)));
    }
    fn num_float(&mut self, value: f32) {
        self.complete(StoredExpr::Scalar(StoredScalar::Float(value)));
    }
    fn num_double(&mut self, value: f64) {
        self.complete(StoredExpr::Scalar(StoredScalar::Double(value)));
    }
    fn yesno(&mut self, value: bool) {
        self.complete(StoredExpr::Scalar(StoredScalar::Bool(value)));
    }
    fn octets(&mut self, value: &[u8]) {
        self.complete(StoredExpr::Scalar(StoredScalar::Octets(value.to_vec())));
    }
}

impl ExprProcessor for StoredBuilder {
    fn scalar(&mut self) -> Option<&mut dyn ScalarProcessor> {
        Some(self)
    }
    fn arr(&mut self) -> Option<&mut ExprList> {
        self.frames.push(Frame::Arr { items: Vec::new() });
        Some(self)
    }
    fn doc(&mut self) -> Option<&mut ExprDoc> {
        self.frames.push(Frame::Doc {
            entries: Vec::new(),
            pending_key: None,
        });
        Some(self)
    }
    fn op(&mut self, name: &str) -> Option<&mut ExprList> {
        self.frames.push(Frame::Op {
            name: name.to_string(),
            args: Vec::new(),
        });
        Some(self)
    }
    fn call(&mut self, func: &FunctionRef) -> Option<&mut ExprList> {
        self.frames.push(Frame::Call {
            func: func.clone(),
            args: Vec::new(),
        });
        Some(self)
    }
    fn column_ref(&mut self, col: &ColumnRef, path: Option<&DocPath>) {
        self.complete(StoredExpr::ColumnRef(col.clone(), path.cloned()));
    }
    fn path_ref(&mut self, path: &DocPath) {
        self.complete(StoredExpr::PathRef(path.clone()));
    }
    fn named_param(&mut self, name: &str) {
        self.complete(StoredExpr::NamedParam(name.to_string()));
    }
    fn pos_param(&mut self, position: u16) {
        self.complete(StoredExpr::PosParam(position));
    }
    fn variable(&mut self, name: &str) {
        self.complete(StoredExpr::Variable(name.to_string()));
    }
}

impl ListProcessor<dyn ExprProcessor> for StoredBuilder {
    fn list_el(&mut self) -> Option<&mut (dyn ExprProcessor + 'static)> {
        Some(self)
    }
    fn list_end(&mut self) {
        self.close_list();
    }
}

impl DocProcessor<dyn ExprProcessor> for StoredBuilder {
    fn key_val(&mut self, key: &str) -> Option<&mut (dyn ExprProcessor + 'static)> {
        if let Some(Frame::Doc { pending_key, .. }) = self.frames.last_mut() {
            *pending_key = Some(key.to_string());
        }
        Some(self)
    }
    fn doc_end(&mut self) {
        self.close_doc();
    }
}

impl JsonProcessor for StoredBuilder {
    fn scalar(&mut self) -> Option<&mut dyn ScalarProcessor> {
        Some(self)
    }
    fn arr(&mut self) -> Option<&mut JsonList> {
        self.frames.push(Frame::Arr { items: Vec::new() });
        Some(self)
    }
    fn doc(&mut self) -> Option<&mut JsonDoc> {
        self.frames.push(Frame::Doc {
            entries: Vec::new(),
            pending_key: None,
        });
        Some(self)
    }
}

impl ListProcessor<dyn JsonProcessor> for StoredBuilder {
    fn list_el(&mut self) -> Option<&mut (dyn JsonProcessor + 'static)> {
        Some(self)
    }
    fn list_end(&mut self) {
        self.close_list();
    }
}

impl DocProcessor<dyn JsonProcessor> for StoredBuilder {
    fn key_val(&mut self, key: &str) -> Option<&mut (dyn JsonProcessor + 'static)> {
        if let Some(Frame::Doc { pending_key, .. }) = self.frames.last_mut() {
            *pending_key = Some(key.to_string());
        }
        Some(self)
    }
    fn doc_end(&mut self) {
        self.close_doc();
    }
}

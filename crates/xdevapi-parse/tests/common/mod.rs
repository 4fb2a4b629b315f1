#![allow(dead_code)]

use xdevapi_parse::processor::{ExprDoc, ExprList, JsonDoc, JsonList};
use xdevapi_parse::{
    ColumnRef, DocPath, DocProcessor, ExprParser, ExprProcessor, FunctionRef, JsonParser,
    JsonProcessor, ListProcessor, ParseError, ParserMode, ScalarProcessor, StoredExpr,
};

pub fn parse_doc(input: &str) -> StoredExpr {
    ExprParser::new(input, ParserMode::Document)
        .and_then(|p| p.parse_stored())
        .unwrap_or_else(|e| panic!("Failed to parse (document mode): {input}\nError: {e}"))
}

pub fn parse_table(input: &str) -> StoredExpr {
    ExprParser::new(input, ParserMode::Table)
        .and_then(|p| p.parse_stored())
        .unwrap_or_else(|e| panic!("Failed to parse (table mode): {input}\nError: {e}"))
}

pub fn doc_err(input: &str) -> ParseError {
    ExprParser::new(input, ParserMode::Document)
        .and_then(|p| p.parse_stored())
        .expect_err(&format!("Expected parse error for: {input}"))
}

pub fn table_err(input: &str) -> ParseError {
    ExprParser::new(input, ParserMode::Table)
        .and_then(|p| p.parse_stored())
        .expect_err(&format!("Expected parse error for: {input}"))
}

pub fn parse_json(input: &str) -> StoredExpr {
    JsonParser::new(input)
        .and_then(|p| p.parse_stored())
        .unwrap_or_else(|e| panic!("Failed to parse JSON: {input}\nError: {e}"))
}

pub fn json_err(input: &str) -> ParseError {
    JsonParser::new(input)
        .and_then(|p| p.parse_stored())
        .expect_err(&format!("Expected JSON parse error for: {input}"))
}

/// Records every processor callback as one readable line, in call
/// order. Every branch selector accepts, so the full parse is visible.
#[derive(Debug, Default)]
pub struct CallLog {
    pub calls: Vec<String>,
}

impl CallLog {
    fn push(&mut self, call: impl Into<String>) {
        self.calls.push(call.into());
    }
}

impl ScalarProcessor for CallLog {
    fn null(&mut self) {
        self.push("null");
    }

    fn str(&mut self, value: &str) {
        self.push(format!("str({value})"));
    }

    fn num_int(&mut self, value: i64) {
        self.push(format!("int({value})"));
    }

    fn num_uint(&mut self, value: u64) {
        self.push(format!("uint({value})"));
    }

    fn num_float(&mut self, value: f32) {
        self.push(format!("float({value})"));
    }

    fn num_double(&mut self, value: f64) {
        self.push(format!("double({value})"));
    }

    fn yesno(&mut self, value: bool) {
        self.push(format!("bool({value})"));
    }

    fn octets(&mut self, value: &[u8]) {
        self.push(format!("octets({})", String::from_utf8_lossy(value)));
    }
}

impl ListProcessor<dyn ExprProcessor> for CallLog {
    fn list_begin(&mut self) {
        self.push("list_begin");
    }

    fn list_el(&mut self) -> Option<&mut (dyn ExprProcessor + 'static)> {
        self.push("el");
        Some(self)
    }

    fn list_end(&mut self) {
        self.push("list_end");
    }
}

impl DocProcessor<dyn ExprProcessor> for CallLog {
    fn doc_begin(&mut self) {
        self.push("doc_begin");
    }

    fn key_val(&mut self, key: &str) -> Option<&mut (dyn ExprProcessor + 'static)> {
        self.push(format!("key({key})"));
        Some(self)
    }

    fn doc_end(&mut self) {
        self.push("doc_end");
    }
}

impl ExprProcessor for CallLog {
    fn scalar(&mut self) -> Option<&mut dyn ScalarProcessor> {
        Some(self)
    }

    fn arr(&mut self) -> Option<&mut ExprList> {
        Some(self)
    }

    fn doc(&mut self) -> Option<&mut ExprDoc> {
        Some(self)
    }

    fn op(&mut self, name: &str) -> Option<&mut ExprList> {
        self.push(format!("op({name})"));
        Some(self)
    }

    fn call(&mut self, func: &FunctionRef) -> Option<&mut ExprList> {
        match &func.schema {
            Some(schema) => self.push(format!("call({schema}.{})", func.name)),
            None => self.push(format!("call({})", func.name)),
        }
        Some(self)
    }

    fn column_ref(&mut self, col: &ColumnRef, path: Option<&DocPath>) {
        let mut rendered = String::new();
        if let Some(schema) = &col.schema {
            rendered.push_str(schema);
            rendered.push('.');
        }
        if let Some(table) = &col.table {
            rendered.push_str(table);
            rendered.push('.');
        }
        rendered.push_str(&col.name);
        if let Some(path) = path {
            rendered.push_str("->");
            rendered.push_str(&path.to_string());
        }
        self.push(format!("col({rendered})"));
    }

    fn path_ref(&mut self, path: &DocPath) {
        self.push(format!("path({path})"));
    }

    fn named_param(&mut self, name: &str) {
        self.push(format!("param(:{name})"));
    }

    fn pos_param(&mut self, position: u16) {
        self.push(format!("param({position})"));
    }

    fn variable(&mut self, name: &str) {
        self.push(format!("var({name})"));
    }
}

impl ListProcessor<dyn JsonProcessor> for CallLog {
    fn list_begin(&mut self) {
        self.push("list_begin");
    }

    fn list_el(&mut self) -> Option<&mut (dyn JsonProcessor + 'static)> {
        self.push("el");
        Some(self)
    }

    fn list_end(&mut self) {
        self.push("list_end");
    }
}

impl DocProcessor<dyn JsonProcessor> for CallLog {
    fn doc_begin(&mut self) {
        self.push("doc_begin");
    }

    fn key_val(&mut self, key: &str) -> Option<&mut (dyn JsonProcessor + 'static)> {
        self.push(format!("key({key})"));
        Some(self)
    }

    fn doc_end(&mut self) {
        self.push("doc_end");
    }
}

impl JsonProcessor for CallLog {
    fn scalar(&mut self) -> Option<&mut dyn ScalarProcessor> {
        Some(self)
    }

    fn arr(&mut self) -> Option<&mut JsonList> {
        Some(self)
    }

    fn doc(&mut self) -> Option<&mut JsonDoc> {
        Some(self)
    }
}

/// Records the live callback sequence, then replays the captured tree
/// of the same parse and requires an identical sequence.
pub fn assert_replay_matches(input: &str, mode: ParserMode) {
    let parser = ExprParser::new(input, mode)
        .unwrap_or_else(|e| panic!("Failed to tokenize: {input}\nError: {e}"));
    let mut live = CallLog::default();
    parser
        .parse(&mut live)
        .unwrap_or_else(|e| panic!("Failed to parse: {input}\nError: {e}"));
    let stored = parser
        .parse_stored()
        .unwrap_or_else(|e| panic!("Failed to re-parse: {input}\nError: {e}"));
    let mut replayed = CallLog::default();
    stored.process(&mut replayed);
    assert_eq!(
        live.calls, replayed.calls,
        "live and replayed callback sequences differ for: {input}"
    );
}

/// Every `list_begin`/`doc_begin` must close with its matching end,
/// properly nested and never closing more than was opened.
pub fn assert_balanced(calls: &[String]) {
    let mut stack = Vec::new();
    for call in calls {
        match call.as_str() {
            "list_begin" => stack.push("list"),
            "doc_begin" => stack.push("doc"),
            "list_end" => assert_eq!(stack.pop(), Some("list"), "unbalanced list_end in {calls:?}"),
            "doc_end" => assert_eq!(stack.pop(), Some("doc"), "unbalanced doc_end in {calls:?}"),
            _ => {}
        }
    }
    assert!(stack.is_empty(), "unclosed containers in {calls:?}");
}

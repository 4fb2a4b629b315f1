#![allow(dead_code)]

use xdevapi_uri::{Endpoint, Target, UriError, UriParts};

pub fn uri(input: &str) -> UriParts {
    UriParts::from_uri(input)
        .unwrap_or_else(|e| panic!("Failed to parse URI: {input}\nError: {e}"))
}

pub fn conn(input: &str) -> UriParts {
    UriParts::from_connection_string(input)
        .unwrap_or_else(|e| panic!("Failed to parse connection string: {input}\nError: {e}"))
}

pub fn uri_err(input: &str) -> UriError {
    UriParts::from_uri(input).expect_err(&format!("Expected URI parse error for: {input}"))
}

pub fn conn_err(input: &str) -> UriError {
    UriParts::from_connection_string(input)
        .expect_err(&format!("Expected connection-string parse error for: {input}"))
}

pub fn address(host: &str, port: Option<u16>) -> Endpoint {
    Endpoint {
        priority: None,
        target: Target::Address {
            host: host.to_string(),
            port,
        },
    }
}

pub fn address_prio(priority: u16, host: &str, port: Option<u16>) -> Endpoint {
    Endpoint {
        priority: Some(priority),
        target: Target::Address {
            host: host.to_string(),
            port,
        },
    }
}

pub fn socket(path: &str) -> Endpoint {
    Endpoint {
        priority: None,
        target: Target::Socket(path.to_string()),
    }
}

pub fn pipe(name: &str) -> Endpoint {
    Endpoint {
        priority: None,
        target: Target::Pipe(name.to_string()),
    }
}

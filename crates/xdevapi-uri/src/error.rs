//! Error type with position and surrounding-text snippets.

use thiserror::Error;

/// Bytes of already-consumed input kept in a diagnostic.
pub(crate) const SEEN_LIMIT: usize = 64;
/// Bytes of upcoming input kept in a diagnostic.
pub(crate) const AHEAD_LIMIT: usize = 8;

/// Failure while parsing a connection URI or connection string.
///
/// Renders as `After seeing '…', looking at '…': <reason>` with the
/// snippets clipped to fixed sizes and `...`-marked when truncated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("After seeing '{seen}', looking at '{ahead}': {kind}")]
pub struct UriError {
    /// Byte offset into the raw input where parsing stopped.
    pub position: usize,
    /// Clipped rendering of the input before `position`.
    pub seen: String,
    /// Clipped rendering of the input at `position`.
    pub ahead: String,
    /// What went wrong.
    pub kind: UriErrorKind,
}

/// The reason a URI or connection string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum UriErrorKind {
    #[error("empty connection string")]
    Empty,
    #[error("expected 'mysqlx://' scheme")]
    MissingScheme,
    #[error("unknown scheme '{0}', expected 'mysqlx'")]
    UnknownScheme(String),
    #[error("malformed percent encoding")]
    BadPercentEncoding,
    #[error("expected a host")]
    ExpectedHost,
    #[error("invalid port '{0}', expected a decimal number in 0..=65535")]
    InvalidPort(String),
    #[error("a port is not allowed after a socket or pipe endpoint")]
    PortNotAllowed,
    #[error("invalid IPv6 literal '{0}'")]
    InvalidIpv6(String),
    #[error("unterminated host list, expected ']'")]
    UnterminatedHostList,
    #[error("unterminated '(...)' group, expected ')'")]
    UnterminatedGroup,
    #[error("unknown host attribute '{0}', expected 'address' or 'priority'")]
    UnknownHostAttribute(String),
    #[error("invalid priority '{0}', expected a number in 0..=100")]
    InvalidPriority(String),
    #[error("unterminated list in the value of '{0}', expected ']'")]
    UnterminatedValueList(String),
    #[error("unexpected fragment, '#' is not supported")]
    UnexpectedFragment,
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("unexpected end of input, expected {0}")]
    UnexpectedEnd(&'static str),
    #[error("unexpected trailing input")]
    TrailingInput,
}

impl UriError {
    /// Builds an error at byte `position` of `input`, clipping the
    /// snippets around it.
    pub(crate) fn at(input: &str, position: usize, kind: UriErrorKind) -> Self {
        Self {
            position,
            seen: clip_seen(input, position),
            ahead: clip_ahead(input, position),
            kind,
        }
    }
}

fn clip_seen(input: &str, position: usize) -> String {
    let seen = input.get(..position).unwrap_or("");
    if seen.len() <= SEEN_LIMIT {
        return seen.to_string();
    }
    let mut start = seen.len() - SEEN_LIMIT;
    while !seen.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &seen[start..])
}

fn clip_ahead(input: &str, position: usize) -> String {
    let ahead = input.get(position..).unwrap_or("");
    if ahead.len() <= AHEAD_LIMIT {
        return ahead.to_string();
    }
    let mut end = AHEAD_LIMIT;
    while !ahead.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &ahead[..end])
}

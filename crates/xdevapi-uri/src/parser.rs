//! The connection-URI state machine.
//!
//! Parsing advances strictly forward through SCHEME, AUTHORITY, PATH,
//! QUERY and FRAGMENT; a fragment is always rejected. The authority is
//! scanned once for an unencoded `@` to split off the user info, then
//! rescanned as one endpoint or a bracketed endpoint list.

use tracing::{debug, trace};

use crate::error::{UriError, UriErrorKind};
use crate::processor::UriProcessor;
use crate::scan::Scan;

/// Characters that end the authority part.
const AUTHORITY_END: [char; 3] = ['/', '?', '#'];

pub(crate) struct UriParser<'s, 'p> {
    scan: Scan<'s>,
    prc: &'p mut dyn UriProcessor,
}

impl<'s, 'p> UriParser<'s, 'p> {
    pub(crate) fn parse(
        input: &'s str,
        prc: &'p mut dyn UriProcessor,
        require_scheme: bool,
    ) -> Result<(), UriError> {
        debug!(require_scheme, len = input.len(), "parsing connection string");
        if input.is_empty() {
            return Err(UriError::at(input, 0, UriErrorKind::Empty));
        }
        let mut parser = Self {
            scan: Scan::new(input),
            prc,
        };
        parser.parse_scheme(require_scheme)?;
        parser.parse_authority()?;
        parser.parse_path()?;
        parser.parse_query()?;
        if parser.scan.looking_at_raw('#')? {
            return Err(parser.scan.error(UriErrorKind::UnexpectedFragment));
        }
        if !parser.scan.at_end() {
            return Err(parser.scan.error(UriErrorKind::TrailingInput));
        }
        Ok(())
    }

    fn error_at(&self, position: usize, kind: UriErrorKind) -> UriError {
        UriError::at(self.scan.input(), position, kind)
    }

    fn expect_raw(&mut self, ch: char, what: &'static str) -> Result<(), UriError> {
        if self.scan.eat_raw(ch)? {
            return Ok(());
        }
        Err(match self.scan.peek()? {
            Some(unit) => self.scan.error(UriErrorKind::UnexpectedChar(unit.ch)),
            None => self.scan.error(UriErrorKind::UnexpectedEnd(what)),
        })
    }

    fn skip_raw_spaces(&mut self) -> Result<(), UriError> {
        while self.scan.eat_raw(' ')? {}
        Ok(())
    }

    // SCHEME

    fn parse_scheme(&mut self, require_scheme: bool) -> Result<(), UriError> {
        let mut probe = self.scan.clone();
        let mut name = String::new();
        while let Some(unit) = probe.peek()? {
            if unit.encoded || !(unit.ch.is_ascii_alphanumeric() || "+-.".contains(unit.ch)) {
                break;
            }
            probe.next()?;
            name.push(unit.ch);
        }
        let has_scheme =
            probe.eat_raw(':')? && probe.eat_raw('/')? && probe.eat_raw('/')?;
        if !has_scheme {
            if require_scheme {
                return Err(self.scan.error(UriErrorKind::MissingScheme));
            }
            trace!("no scheme, parsing as bare connection string");
            return Ok(());
        }
        if name != "mysqlx" {
            return Err(self.scan.error(UriErrorKind::UnknownScheme(name)));
        }
        self.scan = probe;
        Ok(())
    }

    // AUTHORITY

    fn parse_authority(&mut self) -> Result<(), UriError> {
        if self.scan.raw_ahead('@', &AUTHORITY_END)? {
            let user = self.scan.take_until_raw(&[':', '@'])?;
            self.prc.user(&user);
            if self.scan.eat_raw(':')? {
                let password = self.scan.take_until_raw(&['@'])?;
                self.prc.password(&password);
            }
            self.expect_raw('@', "'@'")?;
        }
        self.parse_endpoints()?;
        match self.scan.peek()? {
            None => Ok(()),
            Some(unit) if unit.is_raw_any(&AUTHORITY_END) => Ok(()),
            Some(unit) => Err(self.scan.error(UriErrorKind::UnexpectedChar(unit.ch))),
        }
    }

    fn parse_endpoints(&mut self) -> Result<(), UriError> {
        let Some(first) = self.scan.peek()? else {
            return Err(self.scan.error(UriErrorKind::ExpectedHost));
        };
        if first.is_raw('[') {
            if self.bracket_is_ipv6()? {
                let host = self.parse_bracketed_ipv6()?;
                let port = self.parse_optional_port(&AUTHORITY_END)?;
                self.prc.host(None, &host, port);
                trace!(host = %host, "parsed single IPv6 endpoint");
            } else {
                self.parse_endpoint_list()?;
            }
            return Ok(());
        }
        if first.is_raw('(') {
            return self.parse_grouped_endpoint();
        }
        if first.encoded && first.ch == '/' {
            return self.parse_encoded_socket();
        }
        if first.is_raw('\\') {
            return self.parse_pipe();
        }

        let start = self.scan.pos();
        let host = self
            .scan
            .take_until_raw(&[':', ',', '/', '?', '#'])?;
        if host.is_empty() {
            return Err(self.error_at(start, UriErrorKind::ExpectedHost));
        }
        let port = self.parse_optional_port(&AUTHORITY_END)?;
        self.prc.host(None, &host, port);
        trace!(host = %host, port = ?port, "parsed single endpoint");
        Ok(())
    }

    /// Distinguishes `[::1]` (one IPv6 host) from `[h1,h2,...]` (an
    /// endpoint list) by probing the bracket content. Unterminated
    /// brackets answer "list" and fail there with the right error.
    fn bracket_is_ipv6(&self) -> Result<bool, UriError> {
        let mut probe = self.scan.clone();
        probe.next()?;
        let mut content = String::new();
        while let Some(unit) = probe.next()? {
            if unit.is_raw(']') {
                return Ok(is_ipv6_literal(&content));
            }
            if unit.is_raw_any(&AUTHORITY_END) {
                break;
            }
            content.push(unit.ch);
        }
        Ok(false)
    }

    /// Consumes `[hex:...:hex]` and returns the bracket content.
    fn parse_bracketed_ipv6(&mut self) -> Result<String, UriError> {
        let start = self.scan.pos();
        self.scan.next()?;
        let content = self.scan.take_until_raw(&[']'])?;
        if !self.scan.eat_raw(']')? {
            return Err(self.error_at(start, UriErrorKind::UnterminatedHostList));
        }
        if !is_ipv6_literal(&content) {
            return Err(self.error_at(start, UriErrorKind::InvalidIpv6(content)));
        }
        Ok(content)
    }

    /// `[elem, elem, ...]` with plain, bracketed-IPv6 and
    /// `(address=..., priority=N)` elements.
    fn parse_endpoint_list(&mut self) -> Result<(), UriError> {
        let open = self.scan.pos();
        self.scan.next()?;
        loop {
            self.skip_raw_spaces()?;
            let Some(unit) = self.scan.peek()? else {
                return Err(self.error_at(open, UriErrorKind::UnterminatedHostList));
            };
            if unit.is_raw('(') {
                self.parse_keyed_endpoint()?;
            } else if unit.is_raw('[') {
                let host = self.parse_bracketed_ipv6()?;
                let port = self.parse_optional_port(&[',', ']'])?;
                self.prc.host(None, &host, port);
            } else {
                let start = self.scan.pos();
                let host = self.scan.take_until_raw(&[':', ',', ']'])?;
                if host.is_empty() {
                    return Err(self.error_at(start, UriErrorKind::ExpectedHost));
                }
                let port = self.parse_optional_port(&[',', ']'])?;
                self.prc.host(None, &host, port);
            }
            self.skip_raw_spaces()?;
            if self.scan.eat_raw(',')? {
                continue;
            }
            if self.scan.eat_raw(']')? {
                return Ok(());
            }
            return Err(self.error_at(open, UriErrorKind::UnterminatedHostList));
        }
    }

    /// `(address=host[:port], priority=N)`; keys are case-insensitive
    /// and may come in either order.
    fn parse_keyed_endpoint(&mut self) -> Result<(), UriError> {
        let open = self.scan.pos();
        self.scan.next()?;
        let mut address: Option<(String, Option<u16>)> = None;
        let mut priority: Option<u16> = None;
        loop {
            self.skip_raw_spaces()?;
            let key_start = self.scan.pos();
            let key = self.scan.take_until_raw(&['=', ',', ')', ']'])?;
            self.expect_raw('=', "'='")?;
            match key.trim().to_ascii_lowercase().as_str() {
                "address" => address = Some(self.parse_keyed_address()?),
                "priority" => priority = Some(self.parse_priority()?),
                _ => {
                    return Err(self.error_at(
                        key_start,
                        UriErrorKind::UnknownHostAttribute(key.trim().to_string()),
                    ));
                }
            }
            self.skip_raw_spaces()?;
            if self.scan.eat_raw(',')? {
                continue;
            }
            if self.scan.eat_raw(')')? {
                break;
            }
            return Err(self.error_at(open, UriErrorKind::UnterminatedGroup));
        }
        let Some((host, port)) = address else {
            return Err(self.error_at(open, UriErrorKind::ExpectedHost));
        };
        self.prc.host(priority, &host, port);
        Ok(())
    }

    fn parse_keyed_address(&mut self) -> Result<(String, Option<u16>), UriError> {
        self.skip_raw_spaces()?;
        if self.scan.looking_at_raw('[')? {
            let host = self.parse_bracketed_ipv6()?;
            let port = self.parse_optional_port(&[',', ')', ']'])?;
            return Ok((host, port));
        }
        let start = self.scan.pos();
        let host = self.scan.take_until_raw(&[':', ',', ')', ']'])?;
        let host = host.trim_end().to_string();
        if host.is_empty() {
            return Err(self.error_at(start, UriErrorKind::ExpectedHost));
        }
        let port = self.parse_optional_port(&[',', ')', ']'])?;
        Ok((host, port))
    }

    fn parse_priority(&mut self) -> Result<u16, UriError> {
        self.skip_raw_spaces()?;
        let start = self.scan.pos();
        let text = self.scan.take_until_raw(&[',', ')', ']'])?;
        let text = text.trim_end();
        let parsed = text
            .bytes()
            .all(|b| b.is_ascii_digit())
            .then(|| text.parse::<u16>().ok())
            .flatten();
        match parsed {
            Some(value) if !text.is_empty() && value <= 100 => Ok(value),
            _ => Err(self.error_at(start, UriErrorKind::InvalidPriority(text.to_string()))),
        }
    }

    /// `(...)` authority group: a raw socket path or pipe name.
    fn parse_grouped_endpoint(&mut self) -> Result<(), UriError> {
        let open = self.scan.pos();
        self.scan.next()?;
        let Some(content) = self.scan.take_raw_until(')') else {
            return Err(self.error_at(open, UriErrorKind::UnterminatedGroup));
        };
        if content.is_empty() {
            return Err(self.error_at(open, UriErrorKind::ExpectedHost));
        }
        self.report_local_endpoint(content);
        self.reject_port()
    }

    /// Percent-encoded socket path directly in the authority, e.g.
    /// `%2Fvar%2Frun%2Fmysqlx.sock`.
    fn parse_encoded_socket(&mut self) -> Result<(), UriError> {
        let path = self.scan.take_until_raw(&[':', '/', '?', '#'])?;
        self.prc.socket(None, &path);
        trace!(path = %path, "parsed socket endpoint");
        self.reject_port()
    }

    /// Bare `\\.\name` named pipe in the authority.
    fn parse_pipe(&mut self) -> Result<(), UriError> {
        let start = self.scan.pos();
        let text = self.scan.take_until_raw(&[':', '/', '?', '#'])?;
        let Some(name) = text.strip_prefix("\\\\.\\") else {
            return Err(self.error_at(start, UriErrorKind::ExpectedHost));
        };
        if name.is_empty() {
            return Err(self.error_at(start, UriErrorKind::ExpectedHost));
        }
        self.prc.pipe(None, name);
        self.reject_port()
    }

    fn report_local_endpoint(&mut self, content: &str) {
        if let Some(pipe) = content.strip_prefix("\\\\.\\") {
            self.prc.pipe(None, pipe);
        } else {
            self.prc.socket(None, content);
            trace!(path = %content, "parsed socket endpoint");
        }
    }

    /// Sockets and pipes take no port.
    fn reject_port(&mut self) -> Result<(), UriError> {
        if self.scan.looking_at_raw(':')? {
            return Err(self.scan.error(UriErrorKind::PortNotAllowed));
        }
        Ok(())
    }

    /// Consumes `:port` when a `:` follows; strict decimal, range-checked.
    fn parse_optional_port(&mut self, stops: &[char]) -> Result<Option<u16>, UriError> {
        if !self.scan.eat_raw(':')? {
            return Ok(None);
        }
        let start = self.scan.pos();
        let text = self.scan.take_until_raw(stops)?;
        let port = text
            .bytes()
            .all(|b| b.is_ascii_digit())
            .then(|| text.parse::<u16>().ok())
            .flatten();
        match port {
            Some(port) if !text.is_empty() => Ok(Some(port)),
            _ => Err(self.error_at(start, UriErrorKind::InvalidPort(text))),
        }
    }

    // PATH

    fn parse_path(&mut self) -> Result<(), UriError> {
        if !self.scan.eat_raw('/')? {
            return Ok(());
        }
        let schema = self.scan.take_until_raw(&['?', '#', '/'])?;
        if self.scan.looking_at_raw('/')? {
            // The path holds at most the default schema segment.
            return Err(self.scan.error(UriErrorKind::UnexpectedChar('/')));
        }
        if !schema.is_empty() {
            self.prc.schema(&schema);
            trace!(schema = %schema, "parsed default schema");
        }
        Ok(())
    }

    // QUERY

    fn parse_query(&mut self) -> Result<(), UriError> {
        if !self.scan.eat_raw('?')? {
            return Ok(());
        }
        loop {
            if self.scan.at_end() || self.scan.looking_at_raw('#')? {
                return Ok(());
            }
            let key_start = self.scan.pos();
            let key = self.scan.take_until_raw(&['=', '&', '#'])?;
            if key.is_empty() {
                return Err(self.error_at(key_start, UriErrorKind::UnexpectedEnd("a query key")));
            }
            if self.scan.eat_raw('=')? {
                self.parse_query_value(&key)?;
            } else {
                // Bare key: present, no value. Distinct from `key=`.
                self.prc.key_val(&key);
            }
            if !self.scan.eat_raw('&')? {
                return Ok(());
            }
        }
    }

    fn parse_query_value(&mut self, key: &str) -> Result<(), UriError> {
        if self.scan.looking_at_raw('[')? {
            return self.parse_query_list(key);
        }
        if self.scan.looking_at_raw('(')? {
            let open = self.scan.pos();
            self.scan.next()?;
            let Some(raw) = self.scan.take_raw_until(')') else {
                return Err(self.error_at(open, UriErrorKind::UnterminatedGroup));
            };
            self.prc.key_val_str(key, raw);
            return Ok(());
        }
        let value = self.scan.take_until_raw(&['&', '#'])?;
        self.prc.key_val_str(key, &value);
        Ok(())
    }

    fn parse_query_list(&mut self, key: &str) -> Result<(), UriError> {
        let open = self.scan.pos();
        self.scan.next()?;
        let mut values = Vec::new();
        if !self.scan.eat_raw(']')? {
            loop {
                let value = self.scan.take_until_raw(&[',', ']', '&', '#'])?;
                values.push(value);
                if self.scan.eat_raw(',')? {
                    continue;
                }
                if self.scan.eat_raw(']')? {
                    break;
                }
                return Err(self.error_at(
                    open,
                    UriErrorKind::UnterminatedValueList(key.to_string()),
                ));
            }
        }
        self.prc.key_val_list(key, &values);
        Ok(())
    }
}

/// IPv6 literal content: hex digits, `:` and `.` only, at least one `:`.
fn is_ipv6_literal(content: &str) -> bool {
    !content.is_empty()
        && content.contains(':')
        && content
            .chars()
            .all(|c| c.is_ascii_hexdigit() || c == ':' || c == '.')
}

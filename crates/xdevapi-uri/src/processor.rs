//! Processor (visitor) interface the URI parser reports through, plus a
//! ready-made collector for callers who want the parts as plain values.

/// Receiver for the parts of a connection URI.
///
/// Every method has a no-op default body; implementations override what
/// they care about. Callbacks arrive in input order: user and password
/// first (when present), then one call per endpoint, then the default
/// schema, then one call per query pair.
///
/// `priority` is `None` for endpoints listed without an explicit
/// priority; explicit priorities are in `0..=100`.
pub trait UriProcessor {
    fn user(&mut self, _name: &str) {}
    fn password(&mut self, _password: &str) {}
    /// A TCP endpoint, with `port` when one was given.
    fn host(&mut self, _priority: Option<u16>, _host: &str, _port: Option<u16>) {}
    /// A unix-socket endpoint identified by its filesystem path.
    fn socket(&mut self, _priority: Option<u16>, _path: &str) {}
    /// A Windows named-pipe endpoint.
    fn pipe(&mut self, _priority: Option<u16>, _name: &str) {}
    /// The default schema from the path segment.
    fn schema(&mut self, _schema: &str) {}
    /// A query key with no `=` at all ("present, no value").
    fn key_val(&mut self, _key: &str) {}
    /// A query key with a single value (possibly empty, from `key=`).
    fn key_val_str(&mut self, _key: &str, _value: &str) {}
    /// A query key with a `[a,b,c]` list value.
    fn key_val_list(&mut self, _key: &str, _values: &[String]) {}
}

/// Where one endpoint entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// TCP host with an optional port.
    Address { host: String, port: Option<u16> },
    /// Unix socket path.
    Socket(String),
    /// Windows named pipe.
    Pipe(String),
}

/// One endpoint from the authority part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Explicit priority, `None` when unspecified (insertion order).
    pub priority: Option<u16>,
    pub target: Target,
}

/// The value side of one query pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// Key present without `=`.
    Flag,
    /// Single value, possibly empty.
    One(String),
    /// Bracketed `[a,b,c]` list.
    Many(Vec<String>),
}

/// Collecting processor that keeps every reported part as owned data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriParts {
    pub user: Option<String>,
    pub password: Option<String>,
    pub endpoints: Vec<Endpoint>,
    pub schema: Option<String>,
    /// Query pairs in input order; keys may repeat.
    pub query: Vec<(String, QueryValue)>,
}

impl UriParts {
    /// Parses `input` as a full `mysqlx://` URI into parts.
    ///
    /// # Errors
    ///
    /// Propagates any [`UriError`](crate::UriError) from the parse,
    /// including a missing scheme.
    pub fn from_uri(input: &str) -> Result<Self, crate::UriError> {
        let mut parts = Self::default();
        crate::parse_uri(input, &mut parts)?;
        Ok(parts)
    }

    /// Parses `input` as a connection string (scheme optional).
    ///
    /// # Errors
    ///
    /// Propagates any [`UriError`](crate::UriError) from the parse.
    pub fn from_connection_string(input: &str) -> Result<Self, crate::UriError> {
        let mut parts = Self::default();
        crate::parse_connection_string(input, &mut parts)?;
        Ok(parts)
    }

    /// The value(s) recorded for `key`, when the key appeared.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl UriProcessor for UriParts {
    fn user(&mut self, name: &str) {
        self.user = Some(name.to_string());
    }

    fn password(&mut self, password: &str) {
        self.password = Some(password.to_string());
    }

    fn host(&mut self, priority: Option<u16>, host: &str, port: Option<u16>) {
        self.endpoints.push(Endpoint {
            priority,
            target: Target::Address {
                host: host.to_string(),
                port,
            },
        });
    }

    fn socket(&mut self, priority: Option<u16>, path: &str) {
        self.endpoints.push(Endpoint {
            priority,
            target: Target::Socket(path.to_string()),
        });
    }

    fn pipe(&mut self, priority: Option<u16>, name: &str) {
        self.endpoints.push(Endpoint {
            priority,
            target: Target::Pipe(name.to_string()),
        });
    }

    fn schema(&mut self, schema: &str) {
        self.schema = Some(schema.to_string());
    }

    fn key_val(&mut self, key: &str) {
        self.query.push((key.to_string(), QueryValue::Flag));
    }

    fn key_val_str(&mut self, key: &str, value: &str) {
        self.query
            .push((key.to_string(), QueryValue::One(value.to_string())));
    }

    fn key_val_list(&mut self, key: &str, values: &[String]) {
        self.query
            .push((key.to_string(), QueryValue::Many(values.to_vec())));
    }
}

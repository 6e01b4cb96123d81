//! DNS error taxonomy and the scoped guard that converts arbitrary failures
//! into one.
//!
//! Grounded on `pymads.errors.ErrorConverter`, a context manager that
//! converts any non-`DnsError` exception raised inside its `with` block into
//! a `DnsError` tagged with a default rcode. The Rust shape is a
//! higher-order `with_guard` rather than a `Drop` guard: unlike Python's
//! `__exit__`, a `Drop` impl can't change the `Result` an async function is
//! about to return, so the conversion has to happen at the point the
//! fallible closure finishes, not some time later when the guard value is
//! dropped.

use std::fmt;

/// The response code taxonomy from spec section 4.4, RFC 1035 section 4.1.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsErrorKind {
    NoError,
    FormErr,
    ServFail,
    NxDomain,
    NotImp,
    Refused,
    YxDomain,
    YxRrSet,
    NxRrSet,
    NotAuth,
    NotZone,
    BadVers,
    BadSig,
    BadKey,
    BadTime,
}

impl DnsErrorKind {
    /// The 4-bit RCODE carried in the header's `rcode` field.
    pub fn rcode(self) -> u16 {
        match self {
            DnsErrorKind::NoError => 0,
            DnsErrorKind::FormErr => 1,
            DnsErrorKind::ServFail => 2,
            DnsErrorKind::NxDomain => 3,
            DnsErrorKind::NotImp => 4,
            DnsErrorKind::Refused => 5,
            DnsErrorKind::YxDomain => 6,
            DnsErrorKind::YxRrSet => 7,
            DnsErrorKind::NxRrSet => 8,
            DnsErrorKind::NotAuth => 9,
            DnsErrorKind::NotZone => 10,
            DnsErrorKind::BadVers => 11,
            DnsErrorKind::BadSig => 12,
            DnsErrorKind::BadKey => 13,
            DnsErrorKind::BadTime => 14,
        }
    }
}

impl fmt::Display for DnsErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DnsErrorKind::NoError => "NOERROR",
            DnsErrorKind::FormErr => "FORMERR",
            DnsErrorKind::ServFail => "SERVFAIL",
            DnsErrorKind::NxDomain => "NXDOMAIN",
            DnsErrorKind::NotImp => "NOTIMPL",
            DnsErrorKind::Refused => "REFUSED",
            DnsErrorKind::YxDomain => "YXDOMAIN",
            DnsErrorKind::YxRrSet => "YXRRSET",
            DnsErrorKind::NxRrSet => "NXRRSET",
            DnsErrorKind::NotAuth => "NOTAUTH",
            DnsErrorKind::NotZone => "NOTZONE",
            DnsErrorKind::BadVers => "BADVERS",
            DnsErrorKind::BadSig => "BADSIG",
            DnsErrorKind::BadKey => "BADKEY",
            DnsErrorKind::BadTime => "BADTIME",
        };
        f.write_str(s)
    }
}

/// A tagged DNS error carrying the rcode that should be sent back to the
/// client, plus a human-readable cause for logging.
#[derive(Debug, Clone)]
pub struct DnsError {
    pub kind: DnsErrorKind,
    cause: String,
}

impl DnsError {
    pub fn new(kind: DnsErrorKind, cause: impl Into<String>) -> Self {
        Self {
            kind,
            cause: cause.into(),
        }
    }

    pub fn kind(&self) -> DnsErrorKind {
        self.kind
    }

    pub fn cause(&self) -> &str {
        &self.cause
    }

    #[allow(non_snake_case)]
    pub fn FormErr(cause: impl Into<String>) -> Self {
        Self::new(DnsErrorKind::FormErr, cause)
    }

    #[allow(non_snake_case)]
    pub fn ServFail(cause: impl Into<String>) -> Self {
        Self::new(DnsErrorKind::ServFail, cause)
    }

    #[allow(non_snake_case)]
    pub fn NxDomain(cause: impl Into<String>) -> Self {
        Self::new(DnsErrorKind::NxDomain, cause)
    }
}

impl fmt::Display for DnsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.cause)
    }
}

impl std::error::Error for DnsError {}

impl From<DnsErrorKind> for DnsError {
    fn from(kind: DnsErrorKind) -> Self {
        Self::new(kind, kind.to_string())
    }
}

/// Convert a `Result` the way the scope exit of
/// `pymads.errors.ErrorConverter.__exit__` would: a `DnsError` passes
/// through unchanged; anything else is wrapped in one tagged with
/// `default_kind`, logging the original cause at DEBUG unless `quiet`.
/// This is the non-closure half of [`with_guard`], used directly by
/// callers (like [`crate::consumer`]) that already hold an awaited async
/// result and have no synchronous closure to hand the guard.
pub fn convert<T, E>(default_kind: DnsErrorKind, quiet: bool, result: Result<T, E>) -> Result<T, DnsError>
where
    E: Into<GuardCause>,
{
    result.map_err(|err| {
        let cause: GuardCause = err.into();
        match cause {
            GuardCause::Dns(e) => e,
            GuardCause::Other(msg) => {
                if !quiet {
                    tracing::debug!(cause = %msg, default_kind = %default_kind, "converting non-DNS failure to DnsError");
                }
                DnsError::new(default_kind, msg)
            }
        }
    })
}

/// Run `f`, converting any error it returns into a [`DnsError`] tagged with
/// `default_kind` unless it already is one. Mirrors
/// `pymads.errors.ErrorConverter.__exit__`: a `DnsError` raised inside the
/// guarded block passes through unchanged; anything else gets wrapped and,
/// unless `quiet` is set, its original cause is logged at DEBUG before being
/// discarded.
pub fn with_guard<T, E, F>(default_kind: DnsErrorKind, quiet: bool, f: F) -> Result<T, DnsError>
where
    E: Into<GuardCause>,
    F: FnOnce() -> Result<T, E>,
{
    convert(default_kind, quiet, f())
}

/// What [`with_guard`] converts: either a [`DnsError`] that passes through
/// untouched, or anything else that gets stringified and wrapped.
pub enum GuardCause {
    Dns(DnsError),
    Other(String),
}

impl From<DnsError> for GuardCause {
    fn from(e: DnsError) -> Self {
        GuardCause::Dns(e)
    }
}

impl From<String> for GuardCause {
    fn from(e: String) -> Self {
        GuardCause::Other(e)
    }
}

impl From<&str> for GuardCause {
    fn from(e: &str) -> Self {
        GuardCause::Other(e.to_string())
    }
}

impl From<std::io::Error> for GuardCause {
    fn from(e: std::io::Error) -> Self {
        GuardCause::Other(e.to_string())
    }
}

/// Configuration for a guard scope: the rcode to fall back to, and whether
/// to suppress DEBUG-level logging of the original (pre-conversion) cause.
/// Mirrors spec section 4.4's `{ default_kind, quiet_next }`.
#[derive(Debug, Clone, Copy)]
pub struct ErrorConverter {
    pub default_kind: DnsErrorKind,
    pub quiet: bool,
}

impl ErrorConverter {
    pub fn new(default_kind: DnsErrorKind) -> Self {
        Self {
            default_kind,
            quiet: false,
        }
    }

    pub fn quiet(self, quiet: bool) -> Self {
        Self { quiet, ..self }
    }

    pub fn guard<T, E, F>(&self, f: F) -> Result<T, DnsError>
    where
        E: Into<GuardCause>,
        F: FnOnce() -> Result<T, E>,
    {
        with_guard(self.default_kind, self.quiet, f)
    }

    /// [`convert`] bound to this converter's configured kind and quietness.
    pub fn convert<T, E>(&self, result: Result<T, E>) -> Result<T, DnsError>
    where
        E: Into<GuardCause>,
    {
        convert(self.default_kind, self.quiet, result)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn passes_through_existing_dns_error() {
        let result: Result<(), DnsError> =
            with_guard(DnsErrorKind::ServFail, true, || -> Result<(), DnsError> {
                Err(DnsError::NxDomain("no record"))
            });
        assert_eq!(result.unwrap_err().kind(), DnsErrorKind::NxDomain);
    }

    #[test]
    fn converts_foreign_error_to_default_kind() {
        let result: Result<(), DnsError> =
            with_guard(DnsErrorKind::FormErr, true, || -> Result<(), String> {
                Err("garbage input".to_string())
            });
        assert_eq!(result.unwrap_err().kind(), DnsErrorKind::FormErr);
    }

    #[test]
    fn success_is_a_no_op() {
        let result = with_guard(DnsErrorKind::ServFail, true, || -> Result<u32, String> {
            Ok(7)
        });
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn every_kind_has_a_distinct_rcode() {
        use DnsErrorKind::*;
        let kinds = [
            NoError, FormErr, ServFail, NxDomain, NotImp, Refused, YxDomain, YxRrSet, NxRrSet,
            NotAuth, NotZone, BadVers, BadSig, BadKey, BadTime,
        ];
        let mut codes: Vec<u16> = kinds.iter().map(|k| k.rcode()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }
}

//! External configuration surface (spec.md §6 "Configuration").

use crate::validation::QueryLimits;

/// Memory ceilings applied to a request before/while it is parsed and
/// compiled (spec.md §6 "memoryLimits"). `0` means unlimited, matching
/// [`QueryLimits`]'s convention.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MemoryLimits {
    /// Maximum accepted length, in bytes, of the whole raw request body
    /// (document source plus operation name and variables as received over
    /// the wire, before any JSON decoding happens).
    pub max_request_body_size: usize,
    /// Maximum accepted length, in bytes, of the raw variables JSON text
    /// once split out from the request body.
    pub max_variable_size: usize,
    /// Maximum number of live subscription operations a single connection
    /// may keep open at once.
    pub max_subscriptions_per_connection: usize,
}

impl MemoryLimits {
    /// No limits at all.
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub(crate) fn exceeds(limit: usize, value: usize) -> bool {
        limit != 0 && value > limit
    }
}

/// Process-wide configuration for a runtime instance (spec.md §6
/// "ServerConfig"). Constructed once by the host and shared across requests.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// DoS-protection limits applied at compile time and during execution.
    pub query_limits: QueryLimits,
    /// Ceilings applied to raw request bytes before parsing.
    pub memory_limits: MemoryLimits,
    /// `true` in production: strips [`crate::error::GraphError::extensions`] and
    /// panic diagnostics from responses (spec.md §6, §7 item 6).
    pub production_mode: bool,
    /// `true` if `__schema`/`__type` introspection root fields should be served.
    pub introspection_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            query_limits: QueryLimits::unlimited(),
            memory_limits: MemoryLimits::unlimited(),
            production_mode: false,
            introspection_enabled: true,
        }
    }
}

impl ServerConfig {
    /// A configuration with every limit disabled and introspection on, suitable
    /// for tests and local development.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// A configuration tuned for a production deployment: every limit stays at
    /// whatever the caller sets, but diagnostics are stripped and this toggles
    /// `production_mode` on.
    pub fn production(query_limits: QueryLimits, memory_limits: MemoryLimits) -> Self {
        ServerConfig {
            query_limits,
            memory_limits,
            production_mode: true,
            introspection_enabled: false,
        }
    }
}

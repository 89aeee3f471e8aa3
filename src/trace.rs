//! `tracing` integration, gated behind the non-default `tracing` Cargo feature so
//! the hot path costs nothing when a host doesn't opt in.
//!
//! Grounded on the teacher's `macros/tracing.rs`, which wraps each tracing level
//! in a macro that compiles to nothing without the feature, so call sites never
//! need their own `#[cfg(feature = "tracing")]`.

#[doc(hidden)]
#[macro_export]
macro_rules! __dynagql_trace_internal {
    ($trace_type:ident; $($element:expr),*) => {{
        #[cfg(feature = "tracing")]
        tracing::$trace_type!($($element),*);
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __dynagql_trace_debug {
    ($($element:expr),*) => {{
        $crate::__dynagql_trace_internal!(debug; $($element),*)
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __dynagql_trace_info {
    ($($element:expr),*) => {{
        $crate::__dynagql_trace_internal!(info; $($element),*)
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __dynagql_trace_warn {
    ($($element:expr),*) => {{
        $crate::__dynagql_trace_internal!(warn; $($element),*)
    }};
}

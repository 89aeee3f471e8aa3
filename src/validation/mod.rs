//! DoS-protection document-walk rules (spec.md §4.D, §5), a Rust-native reading of
//! the teacher's `validation/rules/*` shape (one rule, one concern) applied to
//! counting instead of structural well-formedness.

pub mod limits;

pub use self::limits::QueryLimits;

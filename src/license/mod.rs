//! License expression handling.
//!
//! - [`expression`]: parses license expressions and simplifies them as
//!   boolean formulas over license keys.
//! - [`cumulative`]: combines the expressions of many files into one.

pub mod cumulative;
pub mod expression;

pub use cumulative::cumulative_license;
pub use expression::{ExpressionError, LicenseExpr};

use std::collections::BTreeSet;

use tracing::warn;

use crate::license::expression::LicenseExpr;
use crate::models::FileRecord;

/// Combine every license expression of `files` into one simplified expression.
///
/// Each distinct expression is wrapped in parentheses and joined with `AND`.
/// Returns `None` when there is nothing to combine or the combined expression
/// does not parse.
pub fn cumulative_license<'a, I>(files: I) -> Option<String>
where
    I: IntoIterator<Item = &'a FileRecord>,
{
    let licenses: BTreeSet<&str> = files
        .into_iter()
        .flat_map(|f| f.license.expressions.iter().map(String::as_str))
        .collect();

    let combined = licenses
        .iter()
        .map(|le| format!(" ( {} )", le))
        .collect::<Vec<_>>()
        .join(" AND ");

    match LicenseExpr::parse(&combined) {
        Ok(Some(expr)) => Some(expr.simplify().to_string()),
        Ok(None) => None,
        Err(e) => {
            warn!("Could not combine license expressions: {}", e);
            None
        }
    }
}

//! Collecting many fallible state writes into diagnostics

use std::fmt::Display;
use tfplug::Diagnostic;

/// One error diagnostic per failed result, summary set to the error text.
/// Successful results contribute nothing.
pub fn call_set<E: Display>(results: impl IntoIterator<Item = Result<(), E>>) -> Vec<Diagnostic> {
    results
        .into_iter()
        .filter_map(Result::err)
        .map(|e| Diagnostic::error(e.to_string(), ""))
        .collect()
}

/// Error diagnostic for a failed Stripe call
pub fn api_error(action: &str, err: impl Display) -> Diagnostic {
    Diagnostic::error(format!("Failed to {}", action), err.to_string())
}

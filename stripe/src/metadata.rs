//! Metadata reconciliation
//!
//! Stripe merges metadata on update: keys that are sent are set, a key sent
//! with an empty value is deleted, and keys that are not sent are left as
//! they are. Removing a key in configuration therefore has to be sent as an
//! explicit empty value.

use std::collections::HashMap;

/// Keys and values to send so that the remote metadata becomes `desired`.
///
/// Every desired entry is included, changed or not, and every key only in
/// `previous` maps to `""`.
pub fn reconcile(
    previous: &HashMap<String, String>,
    desired: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut diff = desired.clone();
    for key in previous.keys() {
        if !desired.contains_key(key) {
            diff.insert(key.clone(), String::new());
        }
    }
    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// What Stripe does with the diff on its side
    fn apply(previous: &HashMap<String, String>, diff: &HashMap<String, String>) -> HashMap<String, String> {
        let mut result = previous.clone();
        for (k, v) in diff {
            if v.is_empty() {
                result.remove(k);
            } else {
                result.insert(k.clone(), v.clone());
            }
        }
        result
    }

    fn arb_metadata() -> impl Strategy<Value = HashMap<String, String>> {
        prop::collection::hash_map("[a-e]{1,2}", "[a-z0-9]{1,6}", 0..6)
    }

    #[test]
    fn update_and_remove() {
        let diff = reconcile(
            &map(&[("a", "1"), ("b", "2")]),
            &map(&[("b", "3"), ("c", "4")]),
        );
        assert_eq!(diff, map(&[("a", ""), ("b", "3"), ("c", "4")]));
    }

    #[test]
    fn unchanged_keys_are_still_sent() {
        let diff = reconcile(&map(&[("team", "billing")]), &map(&[("team", "billing")]));
        assert_eq!(diff, map(&[("team", "billing")]));
    }

    #[test]
    fn clearing_everything() {
        let diff = reconcile(&map(&[("a", "1"), ("b", "2")]), &HashMap::new());
        assert_eq!(diff, map(&[("a", ""), ("b", "")]));
    }

    #[test]
    fn both_empty() {
        assert!(reconcile(&HashMap::new(), &HashMap::new()).is_empty());
    }

    proptest! {
        #[test]
        fn applying_diff_yields_desired(previous in arb_metadata(), desired in arb_metadata()) {
            let diff = reconcile(&previous, &desired);
            prop_assert_eq!(apply(&previous, &diff), desired);
        }

        #[test]
        fn empty_previous_sends_desired(desired in arb_metadata()) {
            prop_assert_eq!(reconcile(&HashMap::new(), &desired), desired);
        }

        #[test]
        fn empty_desired_deletes_everything(previous in arb_metadata()) {
            let diff = reconcile(&previous, &HashMap::new());
            prop_assert_eq!(diff.len(), previous.len());
            prop_assert!(diff.values().all(String::is_empty));
        }

        #[test]
        fn second_pass_sends_only_desired(previous in arb_metadata(), desired in arb_metadata()) {
            prop_assert_eq!(reconcile(&previous, &desired), reconcile(&previous, &desired));

            let remote = apply(&previous, &reconcile(&previous, &desired));
            prop_assert_eq!(reconcile(&remote, &desired), desired);
        }
    }
}

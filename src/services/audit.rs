//! Mutation protocol helpers: integer coercion, free-text normalization
//! and join-table diffing. The change-log emission itself lives in the
//! logs repository so it can share the mutation's transaction.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// Old values collected during a partial update, keyed by the Finnish
/// field label used in the change log. Insertion order is preserved so
/// log rows come out in field order.
#[derive(Debug, Default, Clone)]
pub struct OldValues(pub IndexMap<String, Option<String>>);

impl OldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, field: &str, old: Option<String>) {
        self.0.insert(field.to_string(), old);
    }

    pub fn record_i32(&mut self, field: &str, old: Option<i32>) {
        self.0.insert(field.to_string(), old.map(|v| v.to_string()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Constraints for [`check_int`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IntOpts<'a> {
    pub zeros_allowed: bool,
    pub negative_values: bool,
    pub allowed: &'a [i32],
}

impl<'a> IntOpts<'a> {
    pub fn lenient() -> Self {
        Self {
            zeros_allowed: true,
            negative_values: false,
            allowed: &[],
        }
    }

    pub fn positive() -> Self {
        Self {
            zeros_allowed: false,
            negative_values: false,
            allowed: &[],
        }
    }

    pub fn allowed(values: &'a [i32]) -> Self {
        Self {
            zeros_allowed: true,
            negative_values: false,
            allowed: values,
        }
    }
}

/// Coerce a JSON value into an integer under the given constraints.
/// Accepts numbers and numeric strings; anything else yields `None`.
pub fn check_int(value: Option<&Value>, opts: IntOpts) -> Option<i32> {
    let value = value?;
    let parsed: i32 = match value {
        Value::Number(n) => i32::try_from(n.as_i64()?).ok()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    if !opts.zeros_allowed && parsed == 0 {
        return None;
    }
    if !opts.negative_values && parsed < 0 {
        return None;
    }
    if !opts.allowed.is_empty() && !opts.allowed.contains(&parsed) {
        return None;
    }
    Some(parsed)
}

/// Like [`check_int`] but turns a failed coercion into a 400 with the
/// given Finnish message.
pub fn require_int(value: Option<&Value>, opts: IntOpts, msg: &str) -> ApiResult<i32> {
    check_int(value, opts).ok_or_else(|| ApiError::BadRequest(msg.to_string()))
}

/// Parse a path id. Non-numeric ids are user error.
pub fn parse_id(raw: &str) -> ApiResult<i32> {
    raw.parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::BadRequest(format!("Virheellinen tunniste {}.", raw)))
}

/// Normalize a short free-text field: trim, escape HTML, map empty
/// strings and JSON null to None.
pub fn clean_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(html_escape::encode_safe(trimmed).into_owned())
            }
        }
        _ => None,
    }
}

/// Normalize a long description: entities arriving from the editor are
/// decoded back so stored text is not double-escaped.
pub fn clean_description(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(html_escape::decode_html_entities(trimmed).into_owned())
            }
        }
        _ => None,
    }
}

/// Extract a relation id. Editors send either a bare id or an
/// `{"id": n, "name": ...}` object; zero and null both mean "unset".
pub fn rel_id(value: Option<&Value>) -> Option<i32> {
    match value {
        Some(Value::Object(map)) => check_int(map.get("id"), IntOpts::positive()),
        other => check_int(other, IntOpts::positive()),
    }
}

/// Extract a list of relation ids from an array of ids or id objects.
/// A missing field yields None so callers can tell "absent" from "empty".
pub fn rel_id_list(value: Option<&Value>) -> Option<Vec<i32>> {
    match value {
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .filter_map(|item| rel_id(Some(item)))
                .collect(),
        ),
        _ => None,
    }
}

/// Compare two nullable strings treating empty string and None as equal.
pub fn str_differ(a: Option<&str>, b: Option<&str>) -> bool {
    fn norm(v: Option<&str>) -> Option<&str> {
        match v {
            Some("") | None => None,
            Some(s) => Some(s),
        }
    }
    norm(a) != norm(b)
}

/// Compute the changes needed to turn `existing` into `new`:
/// `(to_add, to_remove)` by id set difference.
pub fn join_changes(existing: &[i32], new: &[i32]) -> (Vec<i32>, Vec<i32>) {
    let to_add: Vec<i32> = new
        .iter()
        .filter(|id| !existing.contains(id))
        .copied()
        .collect();
    let to_remove: Vec<i32> = existing
        .iter()
        .filter(|id| !new.contains(id))
        .copied()
        .collect();
    (to_add, to_remove)
}

/// Link-list diff by URL, for the old-values record.
pub fn join_link_changes(
    existing: &[crate::models::refs::Link],
    new: &[crate::models::refs::Link],
) -> (Vec<String>, Vec<String>) {
    let urls = |links: &[crate::models::refs::Link]| -> Vec<String> {
        links.iter().map(|l| l.link.clone()).collect()
    };
    let old_urls = urls(existing);
    let new_urls = urls(new);
    let to_add = new_urls
        .iter()
        .filter(|u| !old_urls.contains(u))
        .cloned()
        .collect();
    let to_remove = old_urls
        .iter()
        .filter(|u| !new_urls.contains(u))
        .cloned()
        .collect();
    (to_add, to_remove)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn check_int_accepts_numbers_and_numeric_strings() {
        assert_eq!(check_int(Some(&json!(7)), IntOpts::lenient()), Some(7));
        assert_eq!(check_int(Some(&json!("7")), IntOpts::lenient()), Some(7));
        assert_eq!(check_int(Some(&json!("abc")), IntOpts::lenient()), None);
        assert_eq!(check_int(None, IntOpts::lenient()), None);
    }

    #[test]
    fn check_int_enforces_constraints() {
        assert_eq!(check_int(Some(&json!(0)), IntOpts::positive()), None);
        assert_eq!(check_int(Some(&json!(-1)), IntOpts::lenient()), None);
        assert_eq!(
            check_int(
                Some(&json!(-1)),
                IntOpts {
                    zeros_allowed: true,
                    negative_values: true,
                    allowed: &[],
                }
            ),
            Some(-1)
        );
        assert_eq!(check_int(Some(&json!(4)), IntOpts::allowed(&[1, 2, 3])), None);
        assert_eq!(
            check_int(Some(&json!(2)), IntOpts::allowed(&[1, 2, 3])),
            Some(2)
        );
    }

    #[test]
    fn clean_string_normalizes_empty_to_none() {
        assert_eq!(clean_string(Some(&json!(""))), None);
        assert_eq!(clean_string(Some(&json!("  "))), None);
        assert_eq!(clean_string(Some(&json!(" x "))), Some("x".to_string()));
        assert_eq!(clean_string(None), None);
    }

    #[test]
    fn clean_string_escapes_html() {
        // encode_safe also escapes the slash.
        assert_eq!(
            clean_string(Some(&json!("<b>x</b>"))),
            Some("&lt;b&gt;x&lt;&#x2F;b&gt;".to_string())
        );
        assert_eq!(
            clean_string(Some(&json!("a & b"))),
            Some("a &amp; b".to_string())
        );
    }

    #[test]
    fn str_differ_treats_empty_as_null() {
        assert!(!str_differ(Some(""), None));
        assert!(!str_differ(None, None));
        assert!(str_differ(Some("a"), None));
        assert!(str_differ(Some("a"), Some("b")));
        assert!(!str_differ(Some("a"), Some("a")));
    }

    #[test]
    fn rel_id_accepts_objects_and_scalars() {
        assert_eq!(rel_id(Some(&json!({"id": 3, "name": "x"}))), Some(3));
        assert_eq!(rel_id(Some(&json!(3))), Some(3));
        assert_eq!(rel_id(Some(&json!({"id": 0}))), None);
        assert_eq!(rel_id(Some(&json!(null))), None);
        assert_eq!(rel_id(None), None);
    }

    #[test]
    fn rel_id_list_needs_an_array() {
        assert_eq!(
            rel_id_list(Some(&json!([{"id": 1}, 2, {"id": 0}]))),
            Some(vec![1, 2])
        );
        assert_eq!(rel_id_list(Some(&json!("x"))), None);
        assert_eq!(rel_id_list(None), None);
    }

    #[test]
    fn join_changes_computes_set_difference() {
        let (add, remove) = join_changes(&[1, 2, 3], &[2, 3, 4]);
        assert_eq!(add, vec![4]);
        assert_eq!(remove, vec![1]);

        let (add, remove) = join_changes(&[], &[1]);
        assert_eq!(add, vec![1]);
        assert!(remove.is_empty());
    }
}

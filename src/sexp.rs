//! Property-list helpers over `lexpr` values.
//!
//! Both the tracker feed and the config file are s-expression plists
//! (`(:key value :key value ...)`).  Keys may come back from the parser as
//! `Value::Keyword("key")` or as `Value::Symbol(":key")`; both are accepted.

use lexpr::Value;

/// Whether a value is a plist key equal to `key` (without the colon).
fn is_key(value: &Value, key: &str) -> bool {
    match value {
        Value::Keyword(k) => k.as_ref() == key,
        Value::Symbol(s) => s.strip_prefix(':') == Some(key),
        _ => false,
    }
}

/// Look up the value following `:key` in a plist.
/// Walks key/value pairs, so a keyword in value position never matches.
/// Returns `None` for non-lists or missing keys.
pub fn plist_get<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let mut current = value;
    while let Value::Cons(pair) = current {
        let Value::Cons(next) = pair.cdr() else {
            return None;
        };
        if is_key(pair.car(), key) {
            return Some(next.car());
        }
        current = next.cdr();
    }
    None
}

/// Iterate the `(key, value)` pairs of a plist, keys without the colon.
pub fn plist_entries(value: &Value) -> Vec<(String, &Value)> {
    let mut out = Vec::new();
    let mut current = value;
    while let Value::Cons(pair) = current {
        let key = match pair.car() {
            Value::Keyword(k) => Some(k.to_string()),
            Value::Symbol(s) => s.strip_prefix(':').map(str::to_string),
            _ => None,
        };
        match (key, pair.cdr()) {
            (Some(k), Value::Cons(next)) => {
                out.push((k, next.car()));
                current = next.cdr();
            }
            _ => current = pair.cdr(),
        }
    }
    out
}

/// `nil`, `()` and `#nil` all read as nil.
pub fn is_nil(value: &Value) -> bool {
    match value {
        Value::Nil | Value::Null => true,
        Value::Symbol(s) => s.as_ref() == "nil",
        _ => false,
    }
}

/// Render an atom as a bare string: keywords lose their colon, strings their
/// quotes.
pub fn atom_string(value: &Value) -> Option<String> {
    match value {
        Value::Keyword(v) => Some(v.to_string()),
        Value::Symbol(v) => {
            let s: &str = v;
            Some(s.strip_prefix(':').unwrap_or(s).to_string())
        }
        Value::String(v) => Some(v.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "t" } else { "nil" }.to_string()),
        Value::Nil | Value::Null => Some("nil".to_string()),
        Value::Char(c) => Some(c.to_string()),
        _ => None,
    }
}

/// Numeric value of an atom.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
}

/// Elements of a proper list or vector.  Nil is the empty list.
pub fn list_items(value: &Value) -> Option<Vec<&Value>> {
    if is_nil(value) {
        return Some(Vec::new());
    }
    if let Value::Vector(items) = value {
        return Some(items.iter().collect());
    }
    let mut out = Vec::new();
    let mut current = value;
    loop {
        match current {
            Value::Cons(pair) => {
                out.push(pair.car());
                current = pair.cdr();
            }
            v if is_nil(v) => return Some(out),
            _ => return None,
        }
    }
}

/// Extract a keyword value as a string.
pub fn get_keyword(value: &Value, key: &str) -> Option<String> {
    plist_get(value, key).and_then(atom_string)
}

/// Extract a boolean value. Treats nil as false and anything else as true.
pub fn get_bool(value: &Value, key: &str) -> Option<bool> {
    plist_get(value, key).map(|v| !is_nil(v) && !matches!(v, Value::Bool(false)))
}

/// Escape a string for s-expression output.
pub fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_keyword_from_plist() {
        let v = lexpr::from_str("(:thumb :mirrored :midline 0.5)").unwrap();
        assert_eq!(get_keyword(&v, "thumb"), Some("mirrored".to_string()));
        assert_eq!(plist_get(&v, "midline").and_then(as_f64), Some(0.5));
    }

    #[test]
    fn test_get_keyword_missing() {
        let v = lexpr::from_str("(:a 1)").unwrap();
        assert_eq!(get_keyword(&v, "b"), None);
        let empty = lexpr::from_str("()").unwrap();
        assert_eq!(get_keyword(&empty, "a"), None);
    }

    #[test]
    fn test_keyword_values_are_not_keys() {
        let v = lexpr::from_str("(:confirm :rotate :midline 0.4)").unwrap();
        assert_eq!(get_keyword(&v, "confirm"), Some("rotate".to_string()));
        assert_eq!(get_keyword(&v, "rotate"), None);
        assert_eq!(plist_get(&v, "midline").and_then(as_f64), Some(0.4));

        let v = lexpr::from_str("(:confirm :rotate :rotate :drop)").unwrap();
        assert_eq!(get_keyword(&v, "rotate"), Some("drop".to_string()));
    }

    #[test]
    fn test_key_without_value() {
        let v = lexpr::from_str("(:a 1 :b)").unwrap();
        assert_eq!(plist_get(&v, "b"), None);
    }

    #[test]
    fn test_get_bool() {
        let v = lexpr::from_str("(:on t :off nil)").unwrap();
        assert_eq!(get_bool(&v, "on"), Some(true));
        assert_eq!(get_bool(&v, "off"), Some(false));
        assert_eq!(get_bool(&v, "other"), None);
    }

    #[test]
    fn test_nested_plist() {
        let v = lexpr::from_str("(:hold-ms (:left 150 :up 300))").unwrap();
        let inner = plist_get(&v, "hold-ms").unwrap();
        assert_eq!(plist_get(inner, "left").and_then(as_f64), Some(150.0));
        assert_eq!(plist_get(inner, "up").and_then(as_f64), Some(300.0));
    }

    #[test]
    fn test_plist_entries_in_order() {
        let v = lexpr::from_str("(:left 1 :right 2)").unwrap();
        let keys: Vec<String> = plist_entries(&v).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["left".to_string(), "right".to_string()]);
    }

    #[test]
    fn test_list_items() {
        let v = lexpr::from_str("(0.5 0.25 0)").unwrap();
        let items = list_items(&v).unwrap();
        let nums: Vec<f64> = items.iter().filter_map(|v| as_f64(v)).collect();
        assert_eq!(nums, vec![0.5, 0.25, 0.0]);

        let nil = lexpr::from_str("nil").unwrap();
        assert!(list_items(&nil).unwrap().is_empty());

        let atom = lexpr::from_str("42").unwrap();
        assert!(list_items(&atom).is_none());
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_string("a\\b"), "a\\\\b");
    }
}

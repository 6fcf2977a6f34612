//! Recursive backfill of missing configuration keys.

use toml::{Table, Value};

/// Insert every key of `defaults` missing from `target`, recursing into tables.
///
/// Existing values are never overwritten, including when the existing value has a
/// different type than the default. Returns the dotted paths of the keys added, in
/// the order they were inserted.
pub fn merge_missing(target: &mut Table, defaults: &Table) -> Vec<String> {
    let mut added = Vec::new();
    merge_inner(target, defaults, "", &mut added);
    added
}

fn merge_inner(target: &mut Table, defaults: &Table, prefix: &str, added: &mut Vec<String>) {
    for (key, default_value) in defaults {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match target.get_mut(key) {
            None => {
                target.insert(key.clone(), default_value.clone());
                added.push(path);
            }
            Some(Value::Table(existing)) => {
                if let Value::Table(default_table) = default_value {
                    merge_inner(existing, default_table, &path, added);
                }
            }
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(raw: &str) -> Table {
        toml::from_str(raw).expect("parse toml")
    }

    #[test]
    fn adds_missing_keys_recursively() {
        let mut target = table("initialized = true\n[web]\ntimeout_secs = 5\n");
        let defaults = table(
            "initialized = false\n[web]\ntimeout_secs = 20\nmax_output_chars = 40000\n[llm]\nmax_steps = 10\n",
        );

        let added = merge_missing(&mut target, &defaults);

        assert_eq!(added, vec!["llm", "web.max_output_chars"]);
        assert_eq!(target["initialized"].as_bool(), Some(true));
        assert_eq!(target["web"]["timeout_secs"].as_integer(), Some(5));
        assert_eq!(target["web"]["max_output_chars"].as_integer(), Some(40000));
        assert_eq!(target["llm"]["max_steps"].as_integer(), Some(10));
    }

    #[test]
    fn never_overwrites_lists_or_mismatched_types() {
        let mut target = table("tags = [\"a\"]\nweb = \"flat\"\n");
        let defaults = table("tags = [\"x\", \"y\"]\n[web]\ntimeout_secs = 20\n");

        let added = merge_missing(&mut target, &defaults);

        assert!(added.is_empty());
        assert_eq!(target["tags"].as_array().map(Vec::len), Some(1));
        assert_eq!(target["web"].as_str(), Some("flat"));
    }

    #[test]
    fn complete_table_is_unchanged() {
        let defaults = table("a = 1\n[b]\nc = 2\n");
        let mut target = defaults.clone();
        assert!(merge_missing(&mut target, &defaults).is_empty());
        assert_eq!(target, defaults);
    }
}

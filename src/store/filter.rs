//! Field-equality document filters.

use serde_json::{Map, Value};

/// Conjunction of `path == value` conditions. Paths are dot-separated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// A filter matching every document.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((path.into(), value.into()));
        self
    }

    pub fn matches(&self, body: &Value) -> bool {
        self.conditions.iter().all(|(path, expected)| {
            body.pointer(&to_pointer(path))
                .is_some_and(|actual| actual == expected)
        })
    }

    /// Nested object form, suitable for JSONB containment (`@>`).
    pub fn to_containment(&self) -> Value {
        let mut root = Map::new();
        for (path, expected) in &self.conditions {
            let segments: Vec<&str> = path.split('.').collect();
            insert_path(&mut root, &segments, expected.clone());
        }
        Value::Object(root)
    }
}

fn insert_path(map: &mut Map<String, Value>, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [last] => {
            map.insert((*last).to_string(), value);
        }
        [head, rest @ ..] => {
            let child = map
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(child) = child {
                insert_path(child, rest, value);
            }
        }
    }
}

fn to_pointer(path: &str) -> String {
    path.split('.')
        .map(|segment| segment.replace('~', "~0").replace('/', "~1"))
        .fold(String::new(), |mut pointer, segment| {
            pointer.push('/');
            pointer.push_str(&segment);
            pointer
        })
}

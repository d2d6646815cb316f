//! Deep merge of a user TOML document over the embedded defaults.

use toml::{Value, map::Map};

/// Overlay `user` on `defaults`.
///
/// Tables merge key by key; any other user value replaces the default
/// outright, arrays included. Type checking is left to deserialization.
pub fn merge(defaults: Value, user: Value) -> Value {
    match (defaults, user) {
        (Value::Table(mut existing), Value::Table(inner)) => {
            merge_into_table(&mut existing, inner);
            Value::Table(existing)
        }
        (_, user) => user,
    }
}

fn merge_into_table(table: &mut Map<String, Value>, other: Map<String, Value>) {
    for (name, inner) in other {
        let merged = match table.remove(&name) {
            Some(existing) => merge(existing, inner),
            None => inner,
        };
        table.insert(name, merged);
    }
}

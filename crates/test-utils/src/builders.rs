#![allow(dead_code)]

use devrig::config::{resolve, Configuration};
use toml::value::Table;
use toml::Value;

/// Builder for partial configuration fragments, resolved over the defaults
/// exactly like user input would be.
pub struct ConfigBuilder {
    table: Table,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            table: Table::new(),
        }
    }

    /// Set a value at a dotted key path, creating intermediate tables.
    ///
    /// `set("client.scripts.src", strings(&["a.js"]))` mirrors the TOML
    /// fragment `[client.scripts] src = ["a.js"]`.
    pub fn set(mut self, dotted_key: &str, value: Value) -> Self {
        let mut current = &mut self.table;
        let mut parts = dotted_key.split('.').peekable();

        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                current.insert(part.to_string(), value);
                break;
            }
            let entry = current
                .entry(part.to_string())
                .or_insert_with(|| Value::Table(Table::new()));
            current = match entry {
                Value::Table(table) => table,
                other => {
                    *other = Value::Table(Table::new());
                    match other {
                        Value::Table(table) => table,
                        _ => unreachable!(),
                    }
                }
            };
        }

        self
    }

    pub fn root(self, root: &str) -> Self {
        self.set("root", Value::String(root.to_string()))
    }

    pub fn prefix(self, prefix: &str) -> Self {
        self.set("prefix", Value::String(prefix.to_string()))
    }

    pub fn exclude(self, names: &[&str]) -> Self {
        self.set("exclude", strings(names))
    }

    pub fn only(self, names: &[&str]) -> Self {
        self.set("only", strings(names))
    }

    pub fn warn_exclusions(self, value: bool) -> Self {
        self.set("warn_exclusions", Value::Boolean(value))
    }

    /// The raw fragment, as user input would arrive.
    pub fn value(self) -> Value {
        Value::Table(self.table)
    }

    /// The fragment resolved over the defaults.
    pub fn build(self) -> Configuration {
        resolve(self.value()).expect("Failed to resolve test configuration")
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience: a TOML array of strings.
pub fn strings(items: &[&str]) -> Value {
    Value::Array(items.iter().map(|s| Value::String(s.to_string())).collect())
}

//! The shared execution environment: bindings plus the output buffer.

use indexmap::IndexMap;

use crate::value::Value;

/// Variable bindings and the append-only output sequence of one run.
///
/// The executor keeps exactly one of these behind a mutex; every binding
/// update and output append goes through it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    bindings: IndexMap<String, Value>,
    output: Vec<String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an environment pre-seeded with `bindings`.
    pub fn with_bindings<I, K>(bindings: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Environment {
            bindings: bindings.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            output: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Binds `name`, replacing any previous value. New names keep insertion
    /// order.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// Appends one line to the output buffer.
    pub fn emit(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }

    pub fn bindings(&self) -> &IndexMap<String, Value> {
        &self.bindings
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn into_parts(self) -> (IndexMap<String, Value>, Vec<String>) {
        (self.bindings, self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebinding_keeps_first_insertion_position() {
        let mut env = Environment::with_bindings([("a", Value::Int(1)), ("b", Value::Int(2))]);
        env.bind("a", Value::Int(3));
        let names: Vec<&str> = env.bindings().keys().map(String::as_str).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(env.get("a"), Some(&Value::Int(3)));
        assert_eq!(env.get("zzz"), None);
    }

    #[test]
    fn output_is_append_only() {
        let mut env = Environment::new();
        env.emit("one");
        env.emit(String::from("two"));
        let (_, output) = env.into_parts();
        assert_eq!(output, ["one", "two"]);
    }
}

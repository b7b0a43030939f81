use crate::error::EvalError;
use crate::value::Value;
use std::collections::HashMap;

/// Prefix reserved for engine internals (`_tt_modules`, `_tt_utf8`, ...).
/// User-supplied bindings must not use it.
pub const RESERVED_PREFIX: &str = "_tt_";

/// A stack of name→value scope frames.
///
/// `if`/`for`/`while` bodies evaluate in the *same* frame as their
/// enclosing block (Python has no block scope), while `apply` pushes a new
/// frame: reads fall through to enclosing frames but writes always land in
/// the top frame, mirroring the nested-function-closure semantics the
/// original engine gets from generating a nested Python function per
/// `{% apply %}`.
#[derive(Debug, Default, Clone)]
pub struct Environment {
    frames: Vec<HashMap<String, Value>>,
}

impl Environment {
    pub fn new() -> Self {
        Self { frames: vec![HashMap::new()] }
    }

    pub fn push_scope(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.frames.pop();
        if self.frames.is_empty() {
            self.frames.push(HashMap::new());
        }
    }

    /// Defines or overwrites `name` in the current (top) frame.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let frame = self.frames.last_mut().expect("environment always has a frame");
        frame.insert(name.into(), value);
    }

    /// Installs a binding directly at the base (engine-default) frame, used
    /// once at environment construction for builtins/escape functions.
    pub fn set_base(&mut self, name: impl Into<String>, value: Value) {
        self.frames[0].insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Rejects a caller-supplied binding whose name collides with the
    /// reserved engine-internal prefix.
    pub fn bind_caller_kwarg(&mut self, name: &str, value: Value) -> Result<(), EvalError> {
        if name.starts_with(RESERVED_PREFIX) {
            return Err(EvalError::ReservedIdentifier(name.to_string()));
        }
        self.set(name, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_scope_reads_fall_through_writes_stay_local() {
        let mut env = Environment::new();
        env.set("x", Value::Number(1.0));
        env.push_scope();
        assert_eq!(env.get("x").unwrap().as_f64(), Some(1.0));
        env.set("y", Value::Number(2.0));
        env.pop_scope();
        assert!(env.get("y").is_none());
        assert_eq!(env.get("x").unwrap().as_f64(), Some(1.0));
    }

    #[test]
    fn rejects_reserved_prefix_kwargs() {
        let mut env = Environment::new();
        let err = env.bind_caller_kwarg("_tt_modules", Value::Null);
        assert!(matches!(err, Err(EvalError::ReservedIdentifier(_))));
    }
}

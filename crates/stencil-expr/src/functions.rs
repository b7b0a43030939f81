//! Builtins always available to expressions, installed ahead of the
//! Loader namespace and caller kwargs (a caller kwarg of the same name
//! shadows a builtin, per the environment's layering order).
use crate::error::EvalError;
use crate::value::Value;

pub fn install_builtins(env: &mut crate::environment::Environment) {
    env.set_base("range", Value::native(range));
    env.set_base("len", Value::native(len));
    env.set_base("str", Value::native(str_fn));
}

fn range(args: &[Value]) -> Result<Value, EvalError> {
    let (start, stop, step) = match args {
        [Value::Number(stop)] => (0.0, *stop, 1.0),
        [Value::Number(start), Value::Number(stop)] => (*start, *stop, 1.0),
        [Value::Number(start), Value::Number(stop), Value::Number(step)] => (*start, *stop, *step),
        _ => return Err(EvalError::TypeError("range() expects 1-3 numeric arguments".to_string())),
    };
    if step == 0.0 {
        return Err(EvalError::TypeError("range() step must not be zero".to_string()));
    }
    let mut out = Vec::new();
    let mut i = start;
    if step > 0.0 {
        while i < stop {
            out.push(Value::Number(i));
            i += step;
        }
    } else {
        while i > stop {
            out.push(Value::Number(i));
            i += step;
        }
    }
    Ok(Value::List(out))
}

fn len(args: &[Value]) -> Result<Value, EvalError> {
    let v = args
        .first()
        .ok_or_else(|| EvalError::TypeError("len() expects 1 argument".to_string()))?;
    let n = match v {
        Value::Str(s) => s.chars().count(),
        Value::Bytes(b) => b.len(),
        Value::List(l) => l.len(),
        Value::Map(m) => m.len(),
        other => return Err(EvalError::TypeError(format!("len() not supported for {other:?}"))),
    };
    Ok(Value::Number(n as f64))
}

fn str_fn(args: &[Value]) -> Result<Value, EvalError> {
    let v = args
        .first()
        .ok_or_else(|| EvalError::TypeError("str() expects 1 argument".to_string()))?;
    Ok(Value::Str(v.stringify()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;

    #[test]
    fn range_single_arg_matches_python_semantics() {
        let r = range(&[Value::Number(3.0)]).unwrap();
        match r {
            Value::List(v) => assert_eq!(v.len(), 3),
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn len_counts_chars_not_bytes() {
        let r = len(&[Value::Str("héllo".to_string())]).unwrap();
        assert_eq!(r.as_f64(), Some(5.0));
    }

    #[test]
    fn builtins_installed_in_base_frame() {
        let mut env = Environment::new();
        install_builtins(&mut env);
        assert!(env.get("range").is_some());
    }
}

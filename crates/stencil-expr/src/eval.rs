use crate::ast::{BinaryOp, Expr, Literal, UnaryOp};
use crate::environment::Environment;
use crate::error::EvalError;
use crate::value::Value;

/// Evaluates a parsed expression against `env`.
pub fn evaluate(expr: &Expr, env: &Environment) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(Literal::Null) => Ok(Value::Null),
        Expr::Literal(Literal::Bool(b)) => Ok(Value::Bool(*b)),
        Expr::Literal(Literal::Number(n)) => Ok(Value::Number(*n)),
        Expr::Literal(Literal::Str(s)) => Ok(Value::Str(s.clone())),
        Expr::Ident(name) => env
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnknownIdentifier(name.clone())),
        Expr::List(items) => {
            let values = items
                .iter()
                .map(|e| evaluate(e, env))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(values))
        }
        Expr::Attr { base, name } => {
            let base_val = evaluate(base, env)?;
            match &base_val {
                Value::Map(m) => Ok(m.get(name).cloned().unwrap_or(Value::Null)),
                _ => Err(EvalError::TypeError(format!(
                    "cannot access attribute '{name}' on {base_val:?}"
                ))),
            }
        }
        Expr::Index { base, index } => {
            let base_val = evaluate(base, env)?;
            let index_val = evaluate(index, env)?;
            index_value(&base_val, &index_val)
        }
        Expr::Call { callee, args } => {
            let callee_val = evaluate(callee, env)?;
            let arg_vals = args
                .iter()
                .map(|a| evaluate(a, env))
                .collect::<Result<Vec<_>, _>>()?;
            match callee_val {
                Value::Native(f) => f(&arg_vals),
                other => Err(EvalError::NotCallable(format!("{other:?}"))),
            }
        }
        Expr::Unary { op, expr } => {
            let v = evaluate(expr, env)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!v.is_truthy())),
                UnaryOp::Neg => v
                    .as_f64()
                    .map(|n| Value::Number(-n))
                    .ok_or_else(|| EvalError::TypeError(format!("cannot negate {v:?}"))),
            }
        }
        Expr::Binary { op, lhs, rhs } => evaluate_binary(*op, lhs, rhs, env),
    }
}

fn evaluate_binary(op: BinaryOp, lhs: &Expr, rhs: &Expr, env: &Environment) -> Result<Value, EvalError> {
    // `and`/`or` short-circuit, so rhs is only evaluated when needed.
    if op == BinaryOp::And {
        let l = evaluate(lhs, env)?;
        if !l.is_truthy() {
            return Ok(l);
        }
        return evaluate(rhs, env);
    }
    if op == BinaryOp::Or {
        let l = evaluate(lhs, env)?;
        if l.is_truthy() {
            return Ok(l);
        }
        return evaluate(rhs, env);
    }

    let l = evaluate(lhs, env)?;
    let r = evaluate(rhs, env)?;

    match op {
        BinaryOp::Eq => Ok(Value::Bool(values_equal(&l, &r))),
        BinaryOp::Ne => Ok(Value::Bool(!values_equal(&l, &r))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => compare(op, &l, &r),
        BinaryOp::Add => add(&l, &r),
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => arithmetic(op, &l, &r),
        BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
    }
}

fn values_equal(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Bytes(a), Value::Bytes(b)) => a == b,
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        _ => false,
    }
}

fn compare(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, EvalError> {
    let ordering = match (l, r) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => {
            return Err(EvalError::TypeError(format!(
                "cannot compare {l:?} and {r:?}"
            )));
        }
    }
    .ok_or_else(|| EvalError::TypeError("unorderable values (NaN?)".to_string()))?;

    use std::cmp::Ordering::*;
    let result = match op {
        BinaryOp::Lt => ordering == Less,
        BinaryOp::Le => ordering != Greater,
        BinaryOp::Gt => ordering == Greater,
        BinaryOp::Ge => ordering != Less,
        _ => unreachable!(),
    };
    Ok(Value::Bool(result))
}

fn add(l: &Value, r: &Value) -> Result<Value, EvalError> {
    match (l, r) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (Value::List(a), Value::List(b)) => {
            let mut v = a.clone();
            v.extend(b.clone());
            Ok(Value::List(v))
        }
        _ => Err(EvalError::TypeError(format!("cannot add {l:?} and {r:?}"))),
    }
}

fn arithmetic(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, EvalError> {
    let (a, b) = match (l.as_f64(), r.as_f64()) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(EvalError::TypeError(format!("cannot apply {op:?} to {l:?} and {r:?}"))),
    };
    match op {
        BinaryOp::Sub => Ok(Value::Number(a - b)),
        BinaryOp::Mul => Ok(Value::Number(a * b)),
        BinaryOp::Div => {
            if b == 0.0 {
                Err(EvalError::DivisionByZero)
            } else {
                Ok(Value::Number(a / b))
            }
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                Err(EvalError::DivisionByZero)
            } else {
                Ok(Value::Number(a % b))
            }
        }
        _ => unreachable!(),
    }
}

fn index_value(base: &Value, index: &Value) -> Result<Value, EvalError> {
    match (base, index) {
        (Value::List(items), Value::Number(n)) => {
            let i = *n as i64;
            let idx = if i < 0 { items.len() as i64 + i } else { i };
            if idx < 0 || idx as usize >= items.len() {
                return Err(EvalError::IndexError(format!("index {i} out of range")));
            }
            Ok(items[idx as usize].clone())
        }
        (Value::Map(m), Value::Str(k)) => Ok(m.get(k).cloned().unwrap_or(Value::Null)),
        (Value::Str(s), Value::Number(n)) => {
            let i = *n as i64;
            let chars: Vec<char> = s.chars().collect();
            let idx = if i < 0 { chars.len() as i64 + i } else { i };
            if idx < 0 || idx as usize >= chars.len() {
                return Err(EvalError::IndexError(format!("index {i} out of range")));
            }
            Ok(Value::Str(chars[idx as usize].to_string()))
        }
        _ => Err(EvalError::TypeError(format!("cannot index {base:?} with {index:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    fn eval_str(src: &str, env: &Environment) -> Value {
        evaluate(&parse_expr(src).unwrap(), env).unwrap()
    }

    #[test]
    fn arithmetic_precedence_evaluates_correctly() {
        let env = Environment::new();
        assert_eq!(eval_str("1 + 2 * 3", &env).as_f64(), Some(7.0));
    }

    #[test]
    fn comparisons_and_boolean_logic() {
        let mut env = Environment::new();
        env.set("n", Value::Number(0.0));
        assert_eq!(eval_str("n > 0", &env).is_truthy(), false);
        assert_eq!(eval_str("n == 0", &env).is_truthy(), true);
    }

    #[test]
    fn list_indexing_and_negative_index() {
        let env = Environment::new();
        assert_eq!(eval_str("[1,2,3][0]", &env).as_f64(), Some(1.0));
        assert_eq!(eval_str("[1,2,3][-1]", &env).as_f64(), Some(3.0));
    }

    #[test]
    fn division_by_zero_is_an_eval_error() {
        let env = Environment::new();
        let err = evaluate(&parse_expr("1/0").unwrap(), &env);
        assert!(matches!(err, Err(EvalError::DivisionByZero)));
    }

    #[test]
    fn unknown_identifier_is_an_eval_error() {
        let env = Environment::new();
        let err = evaluate(&parse_expr("nope").unwrap(), &env);
        assert!(matches!(err, Err(EvalError::UnknownIdentifier(_))));
    }
}

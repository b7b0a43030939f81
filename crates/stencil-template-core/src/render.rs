//! Walks a compiled `Instr` tree against a render-time `Environment`,
//! producing the final output bytes.
use crate::error::RenderError;
use crate::instr::{Instr, Stmt};
use stencil_expr::{evaluate, EvalError, Environment, ForTarget, Value};

/// Propagation signal for `break`/`continue`. `Apply` is a scope boundary
/// that loops cannot see through: a loop above an `apply` never observes a
/// `Break`/`Continue` raised inside it, matching the original engine's
/// per-`apply` nested-function semantics.
enum Flow {
    Normal,
    Break,
    Continue,
}

pub fn render(root: &Instr, env: &mut Environment) -> Result<Vec<u8>, RenderError> {
    let mut out = Vec::new();
    match root {
        Instr::Root(body) => {
            exec_block(body, env, &mut out)?;
        }
        other => {
            exec_one(other, env, &mut out)?;
        }
    }
    Ok(out)
}

fn exec_block(body: &[Instr], env: &mut Environment, out: &mut Vec<u8>) -> Result<Flow, RenderError> {
    for instr in body {
        match exec_one(instr, env, out)? {
            Flow::Normal => {}
            flow => return Ok(flow),
        }
    }
    Ok(Flow::Normal)
}

fn exec_one(instr: &Instr, env: &mut Environment, out: &mut Vec<u8>) -> Result<Flow, RenderError> {
    match instr {
        Instr::Root(body) => {
            exec_block(body, env, out)?;
        }
        Instr::Append(bytes) => out.extend_from_slice(bytes),
        Instr::EmitExpr { expr, raw, autoescape, location } => {
            let value = evaluate(expr, env).map_err(|e| match &e {
                EvalError::UnknownIdentifier(name) if name == "_tt_modules" => {
                    RenderError::MissingModules { location: location.clone() }
                }
                _ => RenderError::Eval { location: location.clone(), source: e },
            })?;
            let mut bytes = match &value {
                Value::Bytes(b) => b.clone(),
                other => other.stringify().into_bytes(),
            };
            if !raw {
                if let Some(fn_name) = autoescape.name() {
                    let escaped = apply_escape(fn_name, &bytes, env, location)?;
                    bytes = escaped;
                }
            }
            out.extend_from_slice(&bytes);
        }
        Instr::Exec { stmt, location } => match stmt {
            Stmt::Set(name, expr) => {
                let value = evaluate(expr, env)
                    .map_err(|e| RenderError::Eval { location: location.clone(), source: e })?;
                env.set(name.clone(), value);
            }
            Stmt::Break => return Ok(Flow::Break),
            Stmt::Continue => return Ok(Flow::Continue),
            Stmt::Noop => {}
        },
        Instr::If { branches, else_body, location } => {
            for (cond, body) in branches {
                let value = evaluate(cond, env)
                    .map_err(|e| RenderError::Eval { location: location.clone(), source: e })?;
                if value.is_truthy() {
                    return exec_block(body, env, out);
                }
            }
            return exec_block(else_body, env, out);
        }
        Instr::For { target, iterable, body, else_body, location } => {
            let iter_value = evaluate(iterable, env)
                .map_err(|e| RenderError::Eval { location: location.clone(), source: e })?;
            let mut broke = false;
            match (&target, iter_value) {
                (ForTarget::Single(name), Value::List(items)) => {
                    for item in items {
                        env.set(name.clone(), item);
                        match exec_block(body, env, out)? {
                            Flow::Break => {
                                broke = true;
                                break;
                            }
                            Flow::Continue | Flow::Normal => {}
                        }
                    }
                }
                (ForTarget::Pair(k, v), Value::Map(m)) => {
                    for (key, value) in m {
                        env.set(k.clone(), Value::Str(key));
                        env.set(v.clone(), value);
                        match exec_block(body, env, out)? {
                            Flow::Break => {
                                broke = true;
                                break;
                            }
                            Flow::Continue | Flow::Normal => {}
                        }
                    }
                }
                (ForTarget::Single(name), Value::Map(m)) => {
                    for (key, _) in m {
                        env.set(name.clone(), Value::Str(key));
                        match exec_block(body, env, out)? {
                            Flow::Break => {
                                broke = true;
                                break;
                            }
                            Flow::Continue | Flow::Normal => {}
                        }
                    }
                }
                _ => {
                    return Err(RenderError::Eval {
                        location: location.clone(),
                        source: EvalError::TypeError("for-loop target/iterable mismatch".to_string()),
                    });
                }
            }
            if !broke {
                return exec_block(else_body, env, out);
            }
        }
        Instr::While { cond, body, else_body, location } => {
            let mut broke = false;
            loop {
                let value = evaluate(cond, env)
                    .map_err(|e| RenderError::Eval { location: location.clone(), source: e })?;
                if !value.is_truthy() {
                    break;
                }
                match exec_block(body, env, out)? {
                    Flow::Break => {
                        broke = true;
                        break;
                    }
                    Flow::Continue | Flow::Normal => {}
                }
            }
            if !broke {
                return exec_block(else_body, env, out);
            }
        }
        Instr::Try { body, except, finally_body, .. } => {
            let mut local = Vec::new();
            let result = exec_block(body, env, &mut local).map(|flow| {
                out.extend_from_slice(&local);
                flow
            });
            let result = match result {
                Ok(flow) => Ok(flow),
                Err(err) => match except {
                    Some(except_body) => {
                        let mut except_out = Vec::new();
                        exec_block(except_body, env, &mut except_out).map(|flow| {
                            out.extend_from_slice(&except_out);
                            flow
                        })
                    }
                    None => Err(err),
                },
            };
            // `finally` always runs, even if `body` or `except` raised; if it
            // raises too, its error wins over whatever `result` already held.
            exec_block(finally_body, env, out)?;
            return result;
        }
        Instr::Apply { callable, body, location } => {
            env.push_scope();
            let mut inner = Vec::new();
            let flow = exec_block(body, env, &mut inner);
            env.pop_scope();
            flow?;
            let func = evaluate(callable, env)
                .map_err(|e| RenderError::Eval { location: location.clone(), source: e })?;
            let result = match func {
                Value::Native(f) => f(&[Value::Bytes(inner)])
                    .map_err(|e| RenderError::Eval { location: location.clone(), source: e })?,
                other => {
                    return Err(RenderError::Eval {
                        location: location.clone(),
                        source: EvalError::NotCallable(format!("{other:?}")),
                    });
                }
            };
            out.extend_from_slice(&result.stringify().into_bytes());
        }
    }
    Ok(Flow::Normal)
}

fn apply_escape(
    fn_name: &str,
    bytes: &[u8],
    env: &Environment,
    location: &stencil_types::SourceLocation,
) -> Result<Vec<u8>, RenderError> {
    let func = env.get(fn_name).cloned().ok_or_else(|| RenderError::Eval {
        location: location.clone(),
        source: EvalError::UnknownFunction(fn_name.to_string()),
    })?;
    match func {
        Value::Native(f) => {
            let input = Value::Str(String::from_utf8_lossy(bytes).into_owned());
            let result = f(&[input])
                .map_err(|e| RenderError::Eval { location: location.clone(), source: e })?;
            Ok(result.stringify().into_bytes())
        }
        other => Err(RenderError::Eval {
            location: location.clone(),
            source: EvalError::NotCallable(format!("{other:?}")),
        }),
    }
}


//! The `datetime` handle installed in every evaluation environment, backed
//! by `chrono`. Expressions reach it as `datetime.date(...)`,
//! `datetime.time(...)`, `datetime.datetime(...)`, `datetime.timedelta(...)`
//! — each a `Value::Native` constructor stored under a `Value::Map`, since
//! the expression sublanguage has no notion of a "module" beyond attribute
//! access on a map.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use stencil_expr::{EvalError, Value};
use std::collections::HashMap;

/// Builds the `datetime` namespace value.
pub fn datetime_handle() -> Value {
    let mut ns = HashMap::new();
    ns.insert("date".to_string(), Value::native(date_ctor));
    ns.insert("time".to_string(), Value::native(time_ctor));
    ns.insert("datetime".to_string(), Value::native(datetime_ctor));
    ns.insert("timedelta".to_string(), Value::native(timedelta_ctor));
    ns.insert("now".to_string(), Value::native(now_ctor));
    Value::Map(ns)
}

fn arg_i64(args: &[Value], i: usize, what: &str) -> Result<i64, EvalError> {
    args.get(i)
        .and_then(Value::as_f64)
        .map(|n| n as i64)
        .ok_or_else(|| EvalError::TypeError(format!("{what}() expects numeric arguments")))
}

/// `datetime.date(year, month, day)` → ISO-8601 date string.
fn date_ctor(args: &[Value]) -> Result<Value, EvalError> {
    let (y, m, d) = (arg_i64(args, 0, "date")?, arg_i64(args, 1, "date")?, arg_i64(args, 2, "date")?);
    let date = NaiveDate::from_ymd_opt(y as i32, m as u32, d as u32)
        .ok_or_else(|| EvalError::TypeError(format!("invalid date {y}-{m}-{d}")))?;
    Ok(Value::Str(date.format("%Y-%m-%d").to_string()))
}

/// `datetime.time(hour, minute, second)` → ISO-8601 time string.
fn time_ctor(args: &[Value]) -> Result<Value, EvalError> {
    let (h, mi, s) = (arg_i64(args, 0, "time")?, arg_i64(args, 1, "time")?, arg_i64(args, 2, "time")?);
    let time = NaiveTime::from_hms_opt(h as u32, mi as u32, s as u32)
        .ok_or_else(|| EvalError::TypeError(format!("invalid time {h}:{mi}:{s}")))?;
    Ok(Value::Str(time.format("%H:%M:%S").to_string()))
}

/// `datetime.datetime(year, month, day, hour, minute, second)` → ISO-8601 timestamp string.
fn datetime_ctor(args: &[Value]) -> Result<Value, EvalError> {
    let (y, mo, d) = (arg_i64(args, 0, "datetime")?, arg_i64(args, 1, "datetime")?, arg_i64(args, 2, "datetime")?);
    let (h, mi, s) = (
        args.get(3).and_then(Value::as_f64).unwrap_or(0.0) as i64,
        args.get(4).and_then(Value::as_f64).unwrap_or(0.0) as i64,
        args.get(5).and_then(Value::as_f64).unwrap_or(0.0) as i64,
    );
    let date = NaiveDate::from_ymd_opt(y as i32, mo as u32, d as u32)
        .ok_or_else(|| EvalError::TypeError(format!("invalid date {y}-{mo}-{d}")))?;
    let time = NaiveTime::from_hms_opt(h as u32, mi as u32, s as u32)
        .ok_or_else(|| EvalError::TypeError(format!("invalid time {h}:{mi}:{s}")))?;
    let dt = NaiveDateTime::new(date, time);
    Ok(Value::Str(dt.format("%Y-%m-%dT%H:%M:%S").to_string()))
}

/// `datetime.timedelta(days, seconds)` → total seconds as a number, the
/// closest single-value analogue of Python's `timedelta` for this
/// engine's numeric `Value` type.
fn timedelta_ctor(args: &[Value]) -> Result<Value, EvalError> {
    let days = args.first().and_then(Value::as_f64).unwrap_or(0.0);
    let seconds = args.get(1).and_then(Value::as_f64).unwrap_or(0.0);
    Ok(Value::Number(days * 86_400.0 + seconds))
}

/// `datetime.now()` → the current local timestamp, ISO-8601 formatted.
fn now_ctor(_args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Str(Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(ns: &Value, name: &str, args: &[Value]) -> Value {
        match ns {
            Value::Map(m) => match m.get(name).unwrap() {
                Value::Native(f) => f(args).unwrap(),
                _ => panic!("not callable"),
            },
            _ => panic!("not a namespace"),
        }
    }

    #[test]
    fn date_formats_iso8601() {
        let ns = datetime_handle();
        let v = call(&ns, "date", &[Value::Number(2024.0), Value::Number(3.0), Value::Number(5.0)]);
        assert_eq!(v.as_str(), Some("2024-03-05"));
    }

    #[test]
    fn timedelta_totals_seconds() {
        let ns = datetime_handle();
        let v = call(&ns, "timedelta", &[Value::Number(1.0), Value::Number(30.0)]);
        assert_eq!(v.as_f64(), Some(86_430.0));
    }
}

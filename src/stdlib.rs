use std::io::Write;

use crate::{
    diagnostics::{Diagnostic, DiagnosticKind, Result, SourceSpan, ThistleError},
    environment::EnvironmentRef,
    value::{Arity, Primitive, Value, ValueKind},
};

/// Seeds the root frame with the standard bindings: the boolean constants
/// and every primitive operator under its surface name. Called exactly once
/// per interpreted buffer, on the global frame only.
pub fn install(env: &EnvironmentRef) {
    let mut scope = env.borrow_mut();
    scope.define("#t".into(), Value::bool(true));
    scope.define("#f".into(), Value::bool(false));
    for op in Primitive::ALL {
        scope.define(op.name().into(), Value::primitive(op));
    }
}

impl Primitive {
    /// Applies the operator to already-evaluated arguments. Arguments are
    /// never lazily evaluated, so `and`/`or` do not short-circuit.
    pub fn call(self, args: &[Value], out: &mut dyn Write, span: SourceSpan) -> Result<Value> {
        ensure_arity(self, args, span)?;
        match self {
            Primitive::Add => {
                let operands = int_args(self, args, span)?;
                fold_checked(self, &operands, span, i64::checked_add).map(Value::int)
            }
            Primitive::Sub => {
                let operands = int_args(self, args, span)?;
                checked(self, operands[0].checked_sub(operands[1]), span).map(Value::int)
            }
            Primitive::Mul => {
                let operands = int_args(self, args, span)?;
                fold_checked(self, &operands, span, i64::checked_mul).map(Value::int)
            }
            Primitive::Div => {
                let operands = int_args(self, args, span)?;
                nonzero_divisor(self, operands[1], span)?;
                Ok(Value::int(floor_div(operands[0], operands[1])))
            }
            Primitive::Mod => {
                let operands = int_args(self, args, span)?;
                nonzero_divisor(self, operands[1], span)?;
                Ok(Value::int(floor_mod(operands[0], operands[1])))
            }
            Primitive::Eq => {
                let operands = int_args(self, args, span)?;
                Ok(Value::bool(operands.iter().all(|n| *n == operands[0])))
            }
            Primitive::Gt => {
                let operands = int_args(self, args, span)?;
                Ok(Value::bool(operands[0] > operands[1]))
            }
            Primitive::Lt => {
                let operands = int_args(self, args, span)?;
                Ok(Value::bool(operands[0] < operands[1]))
            }
            Primitive::And => {
                let operands = bool_args(self, args, span)?;
                Ok(Value::bool(operands.iter().all(|b| *b)))
            }
            Primitive::Or => {
                let operands = bool_args(self, args, span)?;
                Ok(Value::bool(operands.iter().any(|b| *b)))
            }
            Primitive::Not => {
                let operands = bool_args(self, args, span)?;
                Ok(Value::bool(!operands[0]))
            }
            Primitive::PrintNum => {
                let operands = int_args(self, args, span)?;
                writeln!(out, "{}", operands[0])?;
                Ok(Value::unit())
            }
            Primitive::PrintBool => {
                let operands = bool_args(self, args, span)?;
                writeln!(out, "{}", if operands[0] { "#t" } else { "#f" })?;
                Ok(Value::unit())
            }
        }
    }
}

fn ensure_arity(op: Primitive, args: &[Value], span: SourceSpan) -> Result<()> {
    let message = match op.arity() {
        Arity::Exactly(expected) if args.len() != expected => format!(
            "`{}` expects {expected} argument(s), received {}",
            op.name(),
            args.len()
        ),
        Arity::AtLeast(min) if args.len() < min => format!(
            "`{}` expects at least {min} arguments, received {}",
            op.name(),
            args.len()
        ),
        _ => return Ok(()),
    };
    Err(Diagnostic::new(DiagnosticKind::Arity, message)
        .with_span(span)
        .into())
}

fn int_args(op: Primitive, args: &[Value], span: SourceSpan) -> Result<Vec<i64>> {
    args.iter()
        .map(|value| match &*value.0 {
            ValueKind::Int(n) => Ok(*n),
            _ => Err(operand_error(op, "Int", value, span)),
        })
        .collect()
}

fn bool_args(op: Primitive, args: &[Value], span: SourceSpan) -> Result<Vec<bool>> {
    args.iter()
        .map(|value| match &*value.0 {
            ValueKind::Bool(b) => Ok(*b),
            _ => Err(operand_error(op, "Bool", value, span)),
        })
        .collect()
}

fn operand_error(op: Primitive, expected: &str, found: &Value, span: SourceSpan) -> ThistleError {
    Diagnostic::new(
        DiagnosticKind::Type,
        format!(
            "`{}` expects {expected} operands, found {}",
            op.name(),
            found.type_name()
        ),
    )
    .with_span(span)
    .into()
}

fn nonzero_divisor(op: Primitive, divisor: i64, span: SourceSpan) -> Result<()> {
    if divisor == 0 {
        return Err(Diagnostic::new(
            DiagnosticKind::Type,
            format!("`{}` division by zero", op.name()),
        )
        .with_span(span)
        .into());
    }
    Ok(())
}

fn fold_checked(
    op: Primitive,
    operands: &[i64],
    span: SourceSpan,
    fold: fn(i64, i64) -> Option<i64>,
) -> Result<i64> {
    let mut acc = operands[0];
    for operand in &operands[1..] {
        acc = checked(op, fold(acc, *operand), span)?;
    }
    Ok(acc)
}

fn checked(op: Primitive, result: Option<i64>, span: SourceSpan) -> Result<i64> {
    result.ok_or_else(|| {
        Diagnostic::new(
            DiagnosticKind::Type,
            format!("integer overflow in `{}`", op.name()),
        )
        .with_span(span)
        .into()
    })
}

// Quotient and remainder both floor toward negative infinity, unlike Rust's
// truncating `/` and `%`.
fn floor_div(a: i64, b: i64) -> i64 {
    let quotient = a / b;
    if a % b != 0 && (a < 0) != (b < 0) {
        quotient - 1
    } else {
        quotient
    }
}

fn floor_mod(a: i64, b: i64) -> i64 {
    let remainder = a % b;
    if remainder != 0 && (remainder < 0) != (b < 0) {
        remainder + b
    } else {
        remainder
    }
}

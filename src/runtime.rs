use std::{
    io::{self, Write},
    rc::Rc,
};

use crate::{
    ast::{Expr, ExprKind},
    diagnostics::{Diagnostic, DiagnosticKind, Result, SourceSpan},
    environment::{Environment, EnvironmentRef},
    parser,
    value::{Closure, Value, ValueKind},
};

/// Evaluates one source buffer against a fresh global frame, discarding the
/// final value. This is the per-buffer entry point hosts call; each buffer
/// gets its own interpreter and shares nothing with the previous one.
pub fn interpret(source: &str) -> Result<()> {
    let mut interpreter = Interpreter::new();
    interpreter.eval_source(source)?;
    Ok(())
}

pub struct Interpreter {
    env: EnvironmentRef,
    out: Box<dyn Write>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Builds an interpreter writing print side effects to a host-owned sink.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        let env = Environment::new();
        crate::stdlib::install(&env);
        Self { env, out }
    }

    /// Parses the buffer and evaluates each top-level form in order against
    /// the shared global frame, so a `define` in an earlier form is visible
    /// to later forms. Returns the last form's value. An error aborts the
    /// buffer; side effects already performed are not rolled back.
    pub fn eval_source(&mut self, source: &str) -> Result<Value> {
        let forms = parser::parse_program(source)?;
        let mut last_value = Value::unit();
        for form in &forms {
            last_value = self.evaluate(form)?;
        }
        Ok(last_value)
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match &expr.kind {
            ExprKind::Int(n) => Ok(Value::int(*n)),
            ExprKind::Symbol(name) => Environment::get(&self.env, name, expr.span),
            ExprKind::List(items) => self.eval_list(items, expr.span),
        }
    }

    fn eval_list(&mut self, items: &[Expr], span: SourceSpan) -> Result<Value> {
        let Some((head, operands)) = items.split_first() else {
            return Err(Diagnostic::new(DiagnosticKind::Type, "cannot evaluate empty list")
                .with_span(span)
                .into());
        };
        if let ExprKind::Symbol(name) = &head.kind {
            match name.as_str() {
                "define" => return self.eval_define(operands, span),
                "fun" => return self.eval_fun(operands, span),
                "if" => return self.eval_if(operands, span),
                _ => {}
            }
        }
        let callee = self.evaluate(head)?;
        let mut args = Vec::with_capacity(operands.len());
        for operand in operands {
            args.push(self.evaluate(operand)?);
        }
        self.call(callee, args, span)
    }

    fn eval_define(&mut self, operands: &[Expr], span: SourceSpan) -> Result<Value> {
        let [name_expr, value_expr] = operands else {
            return Err(Diagnostic::new(
                DiagnosticKind::Arity,
                format!("`define` expects 2 forms, received {}", operands.len()),
            )
            .with_span(span)
            .into());
        };
        let ExprKind::Symbol(name) = &name_expr.kind else {
            return Err(Diagnostic::new(
                DiagnosticKind::Type,
                "`define` expects a symbol name",
            )
            .with_span(name_expr.span)
            .into());
        };
        let value = self.evaluate(value_expr)?;
        self.env.borrow_mut().define(name.clone(), value);
        Ok(Value::unit())
    }

    // `(fun (param...) body...)` — the body is not evaluated here; it is
    // paired with the current frame so the closure sees bindings added to
    // that frame after its creation.
    fn eval_fun(&mut self, operands: &[Expr], span: SourceSpan) -> Result<Value> {
        let Some((params_expr, body)) = operands.split_first() else {
            return Err(Diagnostic::new(
                DiagnosticKind::Arity,
                "`fun` expects a parameter list",
            )
            .with_span(span)
            .into());
        };
        let ExprKind::List(param_exprs) = &params_expr.kind else {
            return Err(Diagnostic::new(
                DiagnosticKind::Type,
                "`fun` expects a parameter list",
            )
            .with_span(params_expr.span)
            .into());
        };
        let mut params = Vec::with_capacity(param_exprs.len());
        for param in param_exprs {
            let ExprKind::Symbol(name) = &param.kind else {
                return Err(Diagnostic::new(
                    DiagnosticKind::Type,
                    "`fun` parameters must be symbols",
                )
                .with_span(param.span)
                .into());
            };
            params.push(name.clone());
        }
        Ok(Value::closure(Closure {
            params,
            body: body.to_vec(),
            env: Rc::clone(&self.env),
        }))
    }

    fn eval_if(&mut self, operands: &[Expr], span: SourceSpan) -> Result<Value> {
        let [condition, then_branch, else_branch] = operands else {
            return Err(Diagnostic::new(
                DiagnosticKind::Arity,
                format!("`if` expects 3 forms, received {}", operands.len()),
            )
            .with_span(span)
            .into());
        };
        let test = self.evaluate(condition)?;
        let ValueKind::Bool(test) = &*test.0 else {
            return Err(Diagnostic::new(
                DiagnosticKind::Type,
                "if test-exp didn't return bool",
            )
            .with_span(condition.span)
            .into());
        };
        // Exactly one branch is evaluated; the untaken branch must produce
        // no side effects.
        if *test {
            self.evaluate(then_branch)
        } else {
            self.evaluate(else_branch)
        }
    }

    fn call(&mut self, callee: Value, args: Vec<Value>, span: SourceSpan) -> Result<Value> {
        match &*callee.0 {
            ValueKind::Primitive(op) => op.call(&args, self.out.as_mut(), span),
            ValueKind::Closure(fun) => {
                if args.len() != fun.params.len() {
                    return Err(Diagnostic::new(
                        DiagnosticKind::Arity,
                        format!(
                            "function expects {} argument(s), received {}",
                            fun.params.len(),
                            args.len()
                        ),
                    )
                    .with_span(span)
                    .into());
                }
                // Lexical scoping: the call frame chains to the closure's
                // captured frame, never to the call site.
                let frame = Environment::with_parent(Rc::clone(&fun.env));
                for (name, value) in fun.params.iter().zip(args) {
                    frame.borrow_mut().define(name.clone(), value);
                }
                let prev = Rc::clone(&self.env);
                self.env = frame;
                let mut result = Ok(Value::unit());
                for expr in &fun.body {
                    result = self.evaluate(expr);
                    if result.is_err() {
                        break;
                    }
                }
                self.env = prev;
                result
            }
            _ => Err(Diagnostic::new(
                DiagnosticKind::Type,
                format!("value is not callable: found {}", callee.type_name()),
            )
            .with_span(span)
            .into()),
        }
    }
}

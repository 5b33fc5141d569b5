use strata_core::schema::Value;
use strata_core::{Error, Result};

use proc_macro2::Span;
use std::fmt;
use syn::spanned::Spanned;
use tracing::trace;

/// One method call of a builder chain.
pub(super) struct Call<'a> {
    method: String,
    args: Vec<&'a syn::Expr>,
    span: Span,
}

/// A `|b| { ... }` argument.
pub(super) struct Closure<'a> {
    param: String,
    body: &'a syn::Expr,
}

/// Splits `b.x(..).y(..);` into its calls, checking the chain starts at
/// `receiver`.
pub(super) fn chain<'a>(stmt: &'a syn::Stmt, receiver: &str) -> Result<Vec<Call<'a>>> {
    let mut expr = match stmt {
        syn::Stmt::Expr(expr, _) => expr,
        other => return Err(invalid(other.span(), "expected a builder call")),
    };

    let mut calls = vec![];
    loop {
        match expr {
            syn::Expr::MethodCall(call) => {
                calls.push(Call {
                    method: call.method.to_string(),
                    args: call.args.iter().collect(),
                    span: call.method.span(),
                });
                expr = &*call.receiver;
            }
            syn::Expr::Path(path) if path.path.is_ident(receiver) && !calls.is_empty() => break,
            other => {
                return Err(invalid(
                    other.span(),
                    format!("expected a call on `{receiver}`"),
                ))
            }
        }
    }

    calls.reverse();
    Ok(calls)
}

pub(super) fn invalid(span: Span, message: impl fmt::Display) -> Error {
    let start = span.start();
    Error::invalid_snapshot(format!(
        "{message} (line {}, column {})",
        start.line,
        start.column + 1
    ))
}

impl<'a> Call<'a> {
    pub(super) fn name(&self) -> &str {
        &self.method
    }

    pub(super) fn trace(&self, receiver: &str) {
        trace!(receiver, method = %self.method, line = self.span.start().line, "replaying call");
    }

    /// Checks the call has exactly `count` arguments.
    pub(super) fn arity(&self, count: usize) -> Result<()> {
        if self.args.len() == count {
            Ok(())
        } else {
            Err(invalid(
                self.span,
                format!(
                    "`{}` takes {count} argument(s) but {} were given",
                    self.method,
                    self.args.len()
                ),
            ))
        }
    }

    pub(super) fn unknown(&self, receiver: &str) -> Error {
        invalid(
            self.span,
            format!("unknown call `{}` on {receiver}", self.method),
        )
    }

    fn arg(&self, index: usize) -> Result<&'a syn::Expr> {
        self.args.get(index).copied().ok_or_else(|| {
            invalid(
                self.span,
                format!("`{}` is missing argument {}", self.method, index + 1),
            )
        })
    }

    fn expected(&self, index: usize, what: &str) -> Error {
        let span = self.args.get(index).map_or(self.span, |arg| arg.span());
        invalid(
            span,
            format!("argument {} of `{}` must be {what}", index + 1, self.method),
        )
    }

    pub(super) fn string(&self, index: usize) -> Result<String> {
        match self.arg(index)? {
            syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(lit),
                ..
            }) => Ok(lit.value()),
            _ => Err(self.expected(index, "a string literal")),
        }
    }

    /// `None` or `Some("..")`
    pub(super) fn opt_string(&self, index: usize) -> Result<Option<String>> {
        match self.arg(index)? {
            syn::Expr::Path(path) if path.path.is_ident("None") => Ok(None),
            syn::Expr::Call(call) if is_path(&call.func, "Some") && call.args.len() == 1 => {
                match &call.args[0] {
                    syn::Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Str(lit),
                        ..
                    }) => Ok(Some(lit.value())),
                    _ => Err(self.expected(index, "`None` or `Some` of a string literal")),
                }
            }
            _ => Err(self.expected(index, "`None` or `Some` of a string literal")),
        }
    }

    /// `&["A", "B"]`
    pub(super) fn strings(&self, index: usize) -> Result<Vec<String>> {
        self.array(index)?
            .map(|elem| match elem {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(lit),
                    ..
                }) => Ok(lit.value()),
                _ => Err(self.expected(index, "an array of string literals")),
            })
            .collect()
    }

    /// `&[true, false]`
    pub(super) fn bools(&self, index: usize) -> Result<Vec<bool>> {
        self.array(index)?
            .map(|elem| match elem {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Bool(lit),
                    ..
                }) => Ok(lit.value),
                _ => Err(self.expected(index, "an array of `bool` literals")),
            })
            .collect()
    }

    fn array(&self, index: usize) -> Result<impl Iterator<Item = &'a syn::Expr>> {
        let mut expr = self.arg(index)?;
        if let syn::Expr::Reference(reference) = expr {
            expr = &*reference.expr;
        }
        match expr {
            syn::Expr::Array(array) => Ok(array.elems.iter()),
            _ => Err(self.expected(index, "an array")),
        }
    }

    pub(super) fn boolean(&self, index: usize) -> Result<bool> {
        match self.arg(index)? {
            syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Bool(lit),
                ..
            }) => Ok(lit.value),
            _ => Err(self.expected(index, "`true` or `false`")),
        }
    }

    /// An integer literal fitting `T`, possibly negated.
    pub(super) fn integer<T: TryFrom<i128>>(&self, index: usize) -> Result<T> {
        let (negative, expr) = negation(self.arg(index)?);
        let value = match expr {
            syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Int(lit),
                ..
            }) => lit.base10_parse::<i128>().ok(),
            _ => None,
        };
        value
            .map(|value| if negative { -value } else { value })
            .and_then(|value| T::try_from(value).ok())
            .ok_or_else(|| self.expected(index, "an integer literal in range"))
    }

    /// `Type::I32`: the variant named by a two-segment path.
    pub(super) fn variant<T>(
        &self,
        index: usize,
        ty: &str,
        from_name: impl Fn(&str) -> Option<T>,
    ) -> Result<T> {
        let variant = match self.arg(index)? {
            syn::Expr::Path(path) => enum_variant(&path.path, ty),
            _ => None,
        };
        variant
            .and_then(|name| from_name(&name))
            .ok_or_else(|| self.expected(index, &format!("a `{ty}` variant")))
    }

    /// A literal as written by the generator.
    pub(super) fn value(&self, index: usize) -> Result<Value> {
        literal_value(self.arg(index)?)
            .ok_or_else(|| self.expected(index, "a literal value"))
    }

    pub(super) fn closure(&self, index: usize) -> Result<Closure<'a>> {
        let syn::Expr::Closure(closure) = self.arg(index)? else {
            return Err(self.expected(index, "a closure"));
        };
        let param = match closure.inputs.iter().collect::<Vec<_>>().as_slice() {
            [syn::Pat::Ident(param)] => param.ident.to_string(),
            _ => return Err(self.expected(index, "a closure taking one builder")),
        };
        Ok(Closure {
            param,
            body: &*closure.body,
        })
    }
}

impl<'a> Closure<'a> {
    /// Hands each statement of the body, split into calls, to `f`.
    pub(super) fn replay(&self, mut f: impl FnMut(&[Call<'a>]) -> Result<()>) -> Result<()> {
        let syn::Expr::Block(block) = self.body else {
            return Err(invalid(self.body.span(), "expected a block"));
        };
        for stmt in &block.block.stmts {
            f(&chain(stmt, &self.param)?)?;
        }
        Ok(())
    }
}

fn is_path(expr: &syn::Expr, name: &str) -> bool {
    matches!(expr, syn::Expr::Path(path) if path.path.is_ident(name))
}

fn enum_variant(path: &syn::Path, ty: &str) -> Option<String> {
    let segments: Vec<_> = path.segments.iter().collect();
    match segments.as_slice() {
        [enum_name, variant] if enum_name.ident == ty => Some(variant.ident.to_string()),
        _ => None,
    }
}

fn negation(expr: &syn::Expr) -> (bool, &syn::Expr) {
    match expr {
        syn::Expr::Unary(syn::ExprUnary {
            op: syn::UnOp::Neg(_),
            expr,
            ..
        }) => (true, &**expr),
        expr => (false, expr),
    }
}

fn literal_value(expr: &syn::Expr) -> Option<Value> {
    let (negative, expr) = negation(expr);

    let lit = match expr {
        syn::Expr::Lit(syn::ExprLit { lit, .. }) => lit,
        // b"..".to_vec()
        syn::Expr::MethodCall(call) if call.method == "to_vec" && call.args.is_empty() => {
            return match &*call.receiver {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::ByteStr(lit),
                    ..
                }) if !negative => Some(Value::Bytes(lit.value())),
                _ => None,
            };
        }
        syn::Expr::Path(path) if !negative => {
            return match enum_variant(&path.path, "Value")?.as_str() {
                "Null" => Some(Value::Null),
                _ => None,
            };
        }
        _ => return None,
    };

    match lit {
        syn::Lit::Str(lit) if !negative => Some(Value::String(lit.value())),
        syn::Lit::ByteStr(lit) if !negative => Some(Value::Bytes(lit.value())),
        syn::Lit::Bool(lit) if !negative => Some(Value::Bool(lit.value)),
        syn::Lit::Int(lit) => match lit.suffix() {
            "" | "i64" | "i32" => {
                let value = lit.base10_parse::<i128>().ok()?;
                let value = if negative { -value } else { value };
                i64::try_from(value).ok().map(Value::I64)
            }
            "u64" if !negative => lit.base10_parse::<u64>().ok().map(Value::U64),
            "f64" => float(lit.base10_digits(), negative),
            _ => None,
        },
        syn::Lit::Float(lit) => match lit.suffix() {
            "" | "f64" => float(lit.base10_digits(), negative),
            _ => None,
        },
        _ => None,
    }
}

fn float(digits: &str, negative: bool) -> Option<Value> {
    let value: f64 = digits.parse().ok()?;
    Some(Value::F64(if negative { -value } else { value }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(source: &str) -> Option<Value> {
        literal_value(&syn::parse_str(source).unwrap())
    }

    #[test]
    fn literal_values() {
        assert_eq!(value("Value::Null"), Some(Value::Null));
        assert_eq!(value("true"), Some(Value::Bool(true)));
        assert_eq!(value("-3i64"), Some(Value::I64(-3)));
        assert_eq!(value("-9223372036854775808i64"), Some(Value::I64(i64::MIN)));
        assert_eq!(value("18446744073709551615u64"), Some(Value::U64(u64::MAX)));
        assert_eq!(value("1.5f64"), Some(Value::F64(1.5)));
        assert_eq!(value("-2f64"), Some(Value::F64(-2.0)));
        assert_eq!(value(r#""a\"b""#), Some(Value::String("a\"b".to_string())));
        assert_eq!(value(r#"b"\0A".to_vec()"#), Some(Value::Bytes(vec![0, 65])));
    }

    #[test]
    fn non_literals_are_rejected() {
        assert_eq!(value("x"), None);
        assert_eq!(value("-true"), None);
        assert_eq!(value("Value::Opaque"), None);
        assert_eq!(value("1u8"), None);
        assert_eq!(value("f(1)"), None);
    }
}

//! Белый список между разобранным деревом и вычислителем.
//!
//! Каждая форма [`Node`] сопоставляется явно. Всё, для чего у вычислителя нет
//! ветки, отклоняется здесь до начала арифметики: за пределы закрытого набора
//! [`Expr`] ничего не проходит.

use crate::ast::{Constant, Expr, Function, Node};
use crate::error::{CalcError, CalcResult};

/// Проверить дерево и построить выражение для вычисления
///
/// # Параметры
/// - `node`: разобранное дерево
pub fn check(node: &Node) -> CalcResult<Expr> {
    check_node(node).inspect_err(|e| log::debug!("rejected: {e}"))
}

fn check_node(node: &Node) -> CalcResult<Expr> {
    Ok(match node {
        Node::Number(n) => Expr::Number(*n),
        Node::Str(s) => {
            return Err(CalcError::Unsupported(format!("string literal {s:?}")));
        }
        Node::Name(name) => {
            if let Some(c) = Constant::from_name(name) {
                Expr::Const(c)
            } else if Function::from_name(name).is_some() {
                return Err(CalcError::Unsupported(format!(
                    "function `{name}` used as a value"
                )));
            } else {
                Expr::Var(name.clone())
            }
        }
        Node::Unary { op, operand } => Expr::Unary {
            op: *op,
            expr: Box::new(check_node(operand)?),
        },
        Node::Binary { op, lhs, rhs } => Expr::Binary {
            op: *op,
            lhs: Box::new(check_node(lhs)?),
            rhs: Box::new(check_node(rhs)?),
        },
        Node::Call { callee, args } => check_call(callee, args)?,
        Node::Factorial(operand) => Expr::Call {
            func: Function::Factorial,
            arg: Box::new(check_node(operand)?),
        },
        Node::Attribute { attr, .. } => {
            return Err(CalcError::Unsupported(format!("attribute access `.{attr}`")));
        }
        Node::Subscript { .. } => {
            return Err(CalcError::Unsupported("subscript".to_string()));
        }
        Node::Group(inner) => Expr::Group(Box::new(check_node(inner)?)),
    })
}

fn check_call(callee: &Node, args: &[Node]) -> CalcResult<Expr> {
    let Node::Name(name) = callee else {
        return Err(CalcError::Unsupported(
            "call of a computed expression".to_string(),
        ));
    };
    let Some(func) = Function::from_name(name) else {
        return Err(CalcError::Unsupported(format!("call to `{name}`")));
    };
    match args {
        [arg] => Ok(Expr::Call {
            func,
            arg: Box::new(check_node(arg)?),
        }),
        _ => Err(CalcError::Unsupported(format!(
            "`{name}` called with {} arguments",
            args.len()
        ))),
    }
}

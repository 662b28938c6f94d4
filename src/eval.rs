use super::ast::*;
use crate::error::{CalcError, CalcResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Имя, под которым в выражении доступно значение памяти
pub const MEMORY_NAME: &str = "mem";

/// Наибольший аргумент факториала, результат которого конечен в f64
const MAX_FACTORIAL: f64 = 170.0;

/// Режим углов для тригонометрии
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleMode {
    Degrees,
    #[default]
    Radians,
}

impl AngleMode {
    pub fn toggled(self) -> Self {
        match self {
            AngleMode::Degrees => AngleMode::Radians,
            AngleMode::Radians => AngleMode::Degrees,
        }
    }
}

/// Контекст вычисления (переменные, режим углов, память)
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Значения переменных
    pub vars: HashMap<String, f64>,
    pub angle_mode: AngleMode,
    /// Сохранённое значение памяти, доступное как `mem`
    pub memory: Option<f64>,
}

impl Context {
    /// Создать новый контекст
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_angle_mode(mut self, angle_mode: AngleMode) -> Self {
        self.angle_mode = angle_mode;
        self
    }

    /// Привязать переменную
    ///
    /// # Параметры
    /// - `name`: имя переменной
    /// - `value`: значение
    pub fn with_var(mut self, name: impl Into<String>, value: f64) -> Self {
        self.vars.insert(name.into(), value);
        self
    }

    pub fn with_memory(mut self, memory: f64) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Найти значение имени
    ///
    /// # Параметры
    /// - `name`: имя из выражения
    fn lookup(&self, name: &str) -> CalcResult<f64> {
        if let Some(v) = self.vars.get(name) {
            return Ok(*v);
        }
        match (name, self.memory) {
            (MEMORY_NAME, Some(m)) => Ok(m),
            _ => Err(CalcError::UnresolvedIdentifier(name.to_string())),
        }
    }

    /// Преобразовать угол в радианы, если нужно
    ///
    /// # Параметры
    /// - `x`: угол
    fn arg_radians(&self, x: f64) -> f64 {
        match self.angle_mode {
            AngleMode::Degrees => x.to_radians(),
            AngleMode::Radians => x,
        }
    }

    /// Перевести угол-результат из радиан в текущий режим
    ///
    /// # Параметры
    /// - `x`: угол в радианах
    fn result_angle(&self, x: f64) -> f64 {
        match self.angle_mode {
            AngleMode::Degrees => x.to_degrees(),
            AngleMode::Radians => x,
        }
    }
}

/// Результат операции должен быть конечным
///
/// # Параметры
/// - `operation`: имя операции для сообщения
/// - `v`: результат
fn finite(operation: &str, v: f64) -> CalcResult<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CalcError::domain(operation, "result is not finite"))
    }
}

/// Вычислить выражение
///
/// # Параметры
/// - `expr`: выражение
/// - `ctx`: контекст
pub fn eval_expr(expr: &Expr, ctx: &Context) -> CalcResult<f64> {
    use BinOp::*;
    Ok(match expr {
        Expr::Number(n) => finite("number", *n)?,
        Expr::Const(c) => c.value(),
        Expr::Var(name) => finite(name, ctx.lookup(name)?)?,
        Expr::Group(inner) => eval_expr(inner, ctx)?,
        Expr::Unary { op, expr } => {
            let v = eval_expr(expr, ctx)?;
            match op {
                UniOp::Neg => -v,
                UniOp::Plus => v,
            }
        }
        Expr::Binary { op, lhs, rhs } => {
            let l = eval_expr(lhs, ctx)?;
            let r = eval_expr(rhs, ctx)?;
            match op {
                Add => finite("+", l + r)?,
                Sub => finite("-", l - r)?,
                Mul => finite("*", l * r)?,
                Div => {
                    if r == 0.0 {
                        return Err(CalcError::domain("/", "division by zero"));
                    }
                    finite("/", l / r)?
                }
                Mod => floored_mod(l, r)?,
                Pow => pow(l, r)?,
            }
        }
        Expr::Call { func, arg } => eval_func(*func, eval_expr(arg, ctx)?, ctx)?,
    })
}

/// Остаток со знаком делителя
///
/// # Параметры
/// - `l`: делимое
/// - `r`: делитель
fn floored_mod(l: f64, r: f64) -> CalcResult<f64> {
    if r == 0.0 {
        return Err(CalcError::domain("%", "modulo by zero"));
    }
    let m = l % r;
    if m != 0.0 && (m < 0.0) != (r < 0.0) {
        Ok(m + r)
    } else {
        Ok(m)
    }
}

fn pow(base: f64, exponent: f64) -> CalcResult<f64> {
    if base == 0.0 && exponent < 0.0 {
        return Err(CalcError::domain("**", "zero raised to a negative power"));
    }
    if base < 0.0 && exponent.fract() != 0.0 {
        return Err(CalcError::domain(
            "**",
            "negative base with fractional exponent",
        ));
    }
    finite("**", base.powf(exponent))
}

/// Факториал (только для неотрицательных целых)
///
/// # Параметры
/// - `x`: значение
fn fact(x: f64) -> CalcResult<f64> {
    if x < 0.0 || x.fract() != 0.0 {
        return Err(CalcError::domain(
            "factorial",
            "operand must be a non-negative integer",
        ));
    }
    if x > MAX_FACTORIAL {
        return Err(CalcError::domain("factorial", "result is not finite"));
    }
    Ok((2..=x as u64).fold(1.0, |acc, i| acc * i as f64))
}

/// Вычислить функцию
///
/// # Параметры
/// - `func`: функция
/// - `x`: значение аргумента
/// - `ctx`: контекст
fn eval_func(func: Function, x: f64, ctx: &Context) -> CalcResult<f64> {
    let name = func.name();
    let require = |ok: bool, reason: &str| {
        if ok {
            Ok(())
        } else {
            Err(CalcError::domain(name, reason))
        }
    };
    let x = if func.takes_angle() {
        ctx.arg_radians(x)
    } else {
        x
    };
    let v = match func {
        Function::Sin => x.sin(),
        Function::Cos => x.cos(),
        Function::Tan => x.tan(),
        Function::Sec => 1.0 / x.cos(),
        Function::Csc => 1.0 / x.sin(),
        Function::Cot => 1.0 / x.tan(),
        Function::Asin => {
            require((-1.0..=1.0).contains(&x), "argument outside [-1, 1]")?;
            x.asin()
        }
        Function::Acos => {
            require((-1.0..=1.0).contains(&x), "argument outside [-1, 1]")?;
            x.acos()
        }
        Function::Atan => x.atan(),
        Function::Sinh => x.sinh(),
        Function::Cosh => x.cosh(),
        Function::Tanh => x.tanh(),
        Function::Asinh => x.asinh(),
        Function::Acosh => {
            require(x >= 1.0, "argument below 1")?;
            x.acosh()
        }
        Function::Atanh => {
            require(x.abs() < 1.0, "argument outside (-1, 1)")?;
            x.atanh()
        }
        Function::Log | Function::Log10 => {
            require(x > 0.0, "logarithm of a non-positive number")?;
            x.log10()
        }
        Function::Ln => {
            require(x > 0.0, "logarithm of a non-positive number")?;
            x.ln()
        }
        Function::Sqrt => {
            require(x >= 0.0, "square root of a negative number")?;
            x.sqrt()
        }
        Function::Cbrt => x.cbrt(),
        Function::Exp => x.exp(),
        Function::Abs => x.abs(),
        Function::Ceil => x.ceil(),
        Function::Floor => x.floor(),
        Function::Factorial => fact(x)?,
    };
    let v = if func.returns_angle() {
        ctx.result_angle(v)
    } else {
        v
    };
    finite(name, v)
}

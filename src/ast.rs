use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Бинарные операторы
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Mod,
}

impl BinOp {
    /// Запись оператора в строгой грамматике
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Pow => "**",
            BinOp::Mod => "%",
        }
    }
}

/// Унарные операторы
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UniOp {
    Neg,
    Plus,
}

/// Именованные константы
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constant {
    Pi,
    E,
}

impl Constant {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pi" => Some(Constant::Pi),
            "e" => Some(Constant::E),
            _ => None,
        }
    }

    pub fn value(self) -> f64 {
        match self {
            Constant::Pi => std::f64::consts::PI,
            Constant::E => std::f64::consts::E,
        }
    }
}

/// Разрешённые функции.
///
/// Имена в нижнем регистре общие для парсера, белого списка и препроцессора.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Sec,
    Csc,
    Cot,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
    /// Десятичный логарифм
    Log,
    Log10,
    /// Натуральный логарифм
    Ln,
    Sqrt,
    Cbrt,
    Exp,
    Abs,
    Ceil,
    Floor,
    Factorial,
}

impl Function {
    /// Найти функцию по имени
    ///
    /// # Параметры
    /// - `name`: имя в выражении
    pub fn from_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Тригонометрическая функция, аргумент которой зависит от режима углов
    pub fn takes_angle(self) -> bool {
        matches!(
            self,
            Function::Sin
                | Function::Cos
                | Function::Tan
                | Function::Sec
                | Function::Csc
                | Function::Cot
        )
    }

    /// Обратная тригонометрическая функция: результат является углом
    pub fn returns_angle(self) -> bool {
        matches!(self, Function::Asin | Function::Acos | Function::Atan)
    }
}

/// Разобранное дерево.
///
/// Парсер строит его для любого синтаксически корректного ввода, включая
/// конструкции, которые вычислитель никогда не выполняет (строки, атрибуты,
/// индексы, вызовы произвольных имён).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Число
    Number(f64),
    /// Строковый литерал
    Str(String),
    /// Имя
    Name(String),
    /// Унарная операция
    Unary {
        op: UniOp,
        operand: Box<Node>,
    },
    /// Бинарная операция
    Binary {
        op: BinOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    /// Вызов `callee(args...)`
    Call {
        callee: Box<Node>,
        args: Vec<Node>,
    },
    /// Постфиксный факториал `x!`
    Factorial(Box<Node>),
    /// Доступ к атрибуту `value.attr`
    Attribute {
        value: Box<Node>,
        attr: String,
    },
    /// Индекс `value[index]`
    Subscript {
        value: Box<Node>,
        index: Box<Node>,
    },
    /// Скобки
    Group(Box<Node>),
}

/// Выражение, прошедшее белый список.
///
/// Набор вариантов закрыт: всё, что здесь есть, вычислитель умеет считать.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Число
    Number(f64),
    /// Константа (pi, e)
    Const(Constant),
    /// Переменная из контекста
    Var(String),
    /// Унарная операция
    Unary {
        /// Оператор
        op: UniOp,
        /// Операнд
        expr: Box<Expr>,
    },
    /// Бинарная операция
    Binary {
        /// Оператор
        op: BinOp,
        /// Левый операнд
        lhs: Box<Expr>,
        /// Правый операнд
        rhs: Box<Expr>,
    },
    /// Вызов функции
    Call {
        /// Функция
        func: Function,
        /// Аргумент
        arg: Box<Expr>,
    },
    /// Скобки
    Group(Box<Expr>),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{n}"),
            Expr::Const(Constant::Pi) => write!(f, "pi"),
            Expr::Const(Constant::E) => write!(f, "e"),
            Expr::Var(name) => write!(f, "{name}"),
            Expr::Unary { op: UniOp::Neg, expr } => write!(f, "-{expr}"),
            Expr::Unary { op: UniOp::Plus, expr } => write!(f, "+{expr}"),
            Expr::Binary { op, lhs, rhs } => write!(f, "{lhs} {} {rhs}", op.symbol()),
            Expr::Call { func, arg } => write!(f, "{func}({arg})"),
            Expr::Group(inner) => write!(f, "({inner})"),
        }
    }
}

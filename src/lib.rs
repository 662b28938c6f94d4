//! Безопасный вычислитель выражений для калькулятора.
//!
//! Путь запроса: текст в свободной нотации -> [`preprocess()`] -> строгая
//! грамматика -> [`parser::parse`] -> [`whitelist::check`] ->
//! [`eval::eval_expr`] -> число или [`CalcError`].
//!
//! ```
//! use safecalc::{calculate, AngleMode, Context};
//!
//! let ctx = Context::new().with_var("x", 3.0);
//! assert_eq!(calculate("2x + 1", &ctx).unwrap(), 7.0);
//!
//! let deg = Context::new().with_angle_mode(AngleMode::Degrees);
//! assert!((calculate("sin 90", &deg).unwrap() - 1.0).abs() < 1e-12);
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod eval;
pub mod format;
pub mod parser;
pub mod preprocess;
pub mod session;
pub mod whitelist;

pub use config::{Config, ConfigError};
pub use error::{CalcError, CalcResult, ErrorKind};
pub use eval::{AngleMode, Context};
pub use format::format_value;
pub use preprocess::{Rule, preprocess};
pub use session::{HistoryEntry, Session};

/// Вычислить выражение в строгой грамматике (без препроцессора)
///
/// # Параметры
/// - `text`: нормализованное выражение
/// - `ctx`: контекст
pub fn evaluate(text: &str, ctx: &Context) -> CalcResult<f64> {
    let tree = parser::parse(text)?;
    let expr = whitelist::check(&tree)?;
    log::debug!("evaluating {expr}");
    eval::eval_expr(&expr, ctx)
}

/// Нормализовать и вычислить пользовательский ввод
///
/// # Параметры
/// - `input`: текст в свободной нотации
/// - `ctx`: контекст
pub fn calculate(input: &str, ctx: &Context) -> CalcResult<f64> {
    evaluate(&preprocess(input), ctx)
}

use serde::{Deserialize, Serialize};
use strum_macros::Display;
use thiserror::Error;

/// Класс ошибки, по которому вызывающая сторона выбирает сообщение
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Syntax,
    UnsupportedConstruct,
    Domain,
    UnresolvedIdentifier,
}

/// Ошибки разбора и вычисления
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    /// Текст не разбирается грамматикой
    #[error("syntax error at offset {position}: unexpected `{fragment}`")]
    Syntax { position: usize, fragment: String },
    /// Конструкция вне белого списка
    #[error("unsupported construct: {0}")]
    Unsupported(String),
    /// Операция не определена для данных операндов
    #[error("domain error in {operation}: {reason}")]
    Domain { operation: String, reason: String },
    /// Имя не является ни константой, ни переменной контекста
    #[error("unresolved identifier `{0}`")]
    UnresolvedIdentifier(String),
}

impl CalcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CalcError::Syntax { .. } => ErrorKind::Syntax,
            CalcError::Unsupported(_) => ErrorKind::UnsupportedConstruct,
            CalcError::Domain { .. } => ErrorKind::Domain,
            CalcError::UnresolvedIdentifier(_) => ErrorKind::UnresolvedIdentifier,
        }
    }

    pub(crate) fn domain(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::Domain {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

pub type CalcResult<T> = Result<T, CalcError>;

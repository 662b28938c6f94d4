use crate::eval::AngleMode;
use thiserror::Error;

pub const ANGLE_MODE_VAR: &str = "SAFECALC_ANGLE_MODE";
pub const HISTORY_LIMIT_VAR: &str = "SAFECALC_HISTORY_LIMIT";

/// Сколько записей истории хранится по умолчанию
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var} must be `deg` or `rad`, got {value:?}")]
    AngleMode { var: &'static str, value: String },
    #[error("{var} must be a positive integer, got {value:?}")]
    HistoryLimit { var: &'static str, value: String },
}

/// Настройки калькулятора
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub angle_mode: AngleMode,
    pub history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            angle_mode: AngleMode::Degrees,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Разобрать режим углов: `deg`/`degrees` или `rad`/`radians`
///
/// # Параметры
/// - `value`: строка из окружения или командной строки
pub fn parse_angle_mode(value: &str) -> Option<AngleMode> {
    match value.trim().to_ascii_lowercase().as_str() {
        "deg" | "degrees" => Some(AngleMode::Degrees),
        "rad" | "radians" => Some(AngleMode::Radians),
        _ => None,
    }
}

impl Config {
    /// Прочитать настройки из окружения (и `.env`, если он есть)
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("loaded {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Прочитать настройки через функцию поиска переменных
    ///
    /// # Параметры
    /// - `lookup`: имя переменной -> значение
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        if let Some(value) = lookup(ANGLE_MODE_VAR) {
            config.angle_mode = parse_angle_mode(&value).ok_or(ConfigError::AngleMode {
                var: ANGLE_MODE_VAR,
                value,
            })?;
        }
        if let Some(value) = lookup(HISTORY_LIMIT_VAR) {
            config.history_limit = match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::HistoryLimit {
                        var: HISTORY_LIMIT_VAR,
                        value,
                    });
                }
            };
        }
        Ok(config)
    }
}

//! Состояние калькулятора между вычислениями: память, история, режим углов.

use crate::config::Config;
use crate::error::CalcResult;
use crate::eval::{AngleMode, Context};
use crate::format::format_value;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Запись истории
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Текст в том виде, как его ввёл пользователь
    pub input: String,
    pub value: f64,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.input, format_value(self.value))
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    angle_mode: AngleMode,
    memory: f64,
    last: Option<f64>,
    history: VecDeque<HistoryEntry>,
    history_limit: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self {
            angle_mode: config.angle_mode,
            memory: 0.0,
            last: None,
            history: VecDeque::new(),
            history_limit: config.history_limit.max(1),
        }
    }

    pub fn angle_mode(&self) -> AngleMode {
        self.angle_mode
    }

    pub fn set_angle_mode(&mut self, angle_mode: AngleMode) {
        self.angle_mode = angle_mode;
    }

    /// Переключить градусы/радианы и вернуть новый режим
    pub fn toggle_angle_mode(&mut self) -> AngleMode {
        self.angle_mode = self.angle_mode.toggled();
        self.angle_mode
    }

    /// Контекст для вычисления с текущим режимом и памятью
    pub fn context(&self) -> Context {
        Context::new()
            .with_angle_mode(self.angle_mode)
            .with_memory(self.memory)
    }

    /// Вычислить строку в свободной нотации.
    ///
    /// При ошибке история, память и последний результат не меняются.
    ///
    /// # Параметры
    /// - `input`: текст пользователя
    pub fn evaluate(&mut self, input: &str) -> CalcResult<f64> {
        let ctx = self.context();
        self.evaluate_in(input, &ctx)
    }

    /// То же, что [`Session::evaluate`], но с переданным контекстом
    ///
    /// # Параметры
    /// - `input`: текст пользователя
    /// - `ctx`: контекст вычисления
    pub fn evaluate_in(&mut self, input: &str, ctx: &Context) -> CalcResult<f64> {
        let value = crate::calculate(input, ctx)?;
        self.last = Some(value);
        self.push_history(HistoryEntry {
            input: input.trim().to_string(),
            value,
        });
        Ok(value)
    }

    fn push_history(&mut self, entry: HistoryEntry) {
        if self.history.len() == self.history_limit {
            self.history.pop_front();
        }
        self.history.push_back(entry);
    }

    pub fn last(&self) -> Option<f64> {
        self.last
    }

    /// Записи истории, от старых к новым
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// MC
    pub fn memory_clear(&mut self) {
        self.memory = 0.0;
    }

    /// MR
    pub fn memory_recall(&self) -> f64 {
        self.memory
    }

    /// M+
    pub fn memory_add(&mut self, value: f64) {
        self.memory += value;
        log::debug!("memory = {}", self.memory);
    }

    /// M-
    pub fn memory_subtract(&mut self, value: f64) {
        self.memory -= value;
        log::debug!("memory = {}", self.memory);
    }
}

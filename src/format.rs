/// Число знаков после запятой при выводе
const DECIMALS: usize = 10;

/// Целые значения до этой величины печатаются без дробной части
const INTEGER_LIMIT: f64 = 1e15;

/// Отформатировать результат для вывода.
///
/// Целые печатаются без `.0`, остальные округляются до 10 знаков без хвостовых
/// нулей.
///
/// # Параметры
/// - `value`: результат вычисления
pub fn format_value(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < INTEGER_LIMIT {
        return format!("{}", value as i64);
    }
    if value.abs() >= INTEGER_LIMIT {
        return format!("{value:e}");
    }
    let formatted = format!("{:.*}", DECIMALS, value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

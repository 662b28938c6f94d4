//! Препроцессор нотации: переписывает `2x`, `x^2`, `sin x` в строгую грамматику.
//!
//! Правила применяются по порядку, каждое к результату предыдущего. Повторное
//! применение всей цепочки к уже нормализованному тексту ничего не меняет.

use crate::ast::{Constant, Function};
use crate::eval::MEMORY_NAME;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

lazy_static! {
    /// Имена функций через `|`, длинные раньше коротких
    static ref FUNCTION_NAMES: String = {
        let mut names: Vec<&str> = Function::iter().map(Function::name).collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        names.join("|")
    };

    /// Число вплотную к букве или `(`
    static ref NUMBER_ADJACENT: Regex = Regex::new(r"\b(\d+(?:\.\d+)?)([A-Za-z_(])").unwrap();

    /// Идентификатор ровно из двух букв
    static ref LETTER_PAIR: Regex = Regex::new(r"\b([A-Za-z])([A-Za-z])\b").unwrap();

    /// `)` перед `(` (возможно через пробелы), буквой или цифрой
    static ref GROUP_ADJACENT: Regex = Regex::new(r"\)(\s*)([(A-Za-z0-9_])").unwrap();

    /// Имя функции, пробелы и аргумент без скобок
    static ref FUNCTION_SPACE: Regex = Regex::new(&format!(
        r"\b({})\s+([A-Za-z_][A-Za-z0-9_]*|\d+(?:\.\d+)?)",
        *FUNCTION_NAMES
    ))
    .unwrap();

    /// Число вплотную к имени функции
    static ref NUMBER_FUNCTION: Regex = Regex::new(&format!(
        r"\b(\d+(?:\.\d+)?)({})\b",
        *FUNCTION_NAMES
    ))
    .unwrap();

    /// Идентификатор вплотную к `(`
    static ref IDENT_PAREN: Regex = Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\(").unwrap();
}

/// Имя, которое правила не разбивают и не считают переменной
fn is_reserved(name: &str) -> bool {
    Function::from_name(name).is_some() || Constant::from_name(name).is_some()
}

/// Имя перед `(`, которое означает умножение, а не вызов: одна буква,
/// константа или `mem`. Остальные имена остаются вызовами и проверяются
/// белым списком.
fn is_factor(name: &str) -> bool {
    (name.len() == 1 && name.starts_with(|c: char| c.is_ascii_alphabetic()))
        || Constant::from_name(name).is_some()
        || name == MEMORY_NAME
}

/// Правило переписывания
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Rule {
    /// `a ^ b` -> `a ** b`
    PowerOperator,
    /// `2x` -> `2*x`, `2(x+1)` -> `2*(x+1)`
    NumberAdjacency,
    /// `xy` -> `x*y`
    LetterPair,
    /// `(x)(y)` -> `(x)*(y)`, `(x) (y)` -> `(x)*(y)`, `(x)2` -> `(x)*2`
    GroupAdjacency,
    /// `sin x` -> `sin(x)`
    FunctionArgument,
    /// `2sin(x)` -> `2*sin(x)`.
    ///
    /// В полной цепочке уже покрыто [`Rule::NumberAdjacency`], которое стоит
    /// раньше; само по себе срабатывает только при отдельном применении.
    NumberFunction,
    /// `x(y+1)` -> `x*(y+1)`, `pi(2)` -> `pi*(2)`; `foo(1)` остаётся вызовом
    IdentifierParen,
}

impl Rule {
    /// Применить одно правило
    ///
    /// # Параметры
    /// - `input`: текст
    pub fn apply(self, input: &str) -> String {
        match self {
            Rule::PowerOperator => input.replace('^', "**"),
            Rule::NumberAdjacency => NUMBER_ADJACENT
                .replace_all(input, "${1}*${2}")
                .into_owned(),
            Rule::LetterPair => LETTER_PAIR
                .replace_all(input, |caps: &Captures| {
                    if is_reserved(&caps[0]) {
                        caps[0].to_string()
                    } else {
                        format!("{}*{}", &caps[1], &caps[2])
                    }
                })
                .into_owned(),
            Rule::GroupAdjacency => GROUP_ADJACENT
                .replace_all(input, |caps: &Captures| {
                    if caps[1].is_empty() || &caps[2] == "(" {
                        format!(")*{}", &caps[2])
                    } else {
                        caps[0].to_string()
                    }
                })
                .into_owned(),
            Rule::FunctionArgument => function_arguments(input),
            Rule::NumberFunction => NUMBER_FUNCTION
                .replace_all(input, "${1}*${2}")
                .into_owned(),
            Rule::IdentifierParen => IDENT_PAREN
                .replace_all(input, |caps: &Captures| {
                    if is_factor(&caps[1]) {
                        format!("{}*(", &caps[1])
                    } else {
                        caps[0].to_string()
                    }
                })
                .into_owned(),
        }
    }
}

/// `sin x` -> `sin(x)`.
///
/// Аргумент, который сам является функцией, не оборачивается. Если сразу за
/// аргументом идёт `(` (в том числе через пробелы), между ними ставится `*`,
/// иначе получилось бы `)(`.
fn function_arguments(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    let mut copied = 0;
    let mut pos = 0;
    while let Some(caps) = FUNCTION_SPACE.captures_at(input, pos) {
        let (Some(whole), Some(func), Some(arg)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            break;
        };
        if Function::from_name(arg.as_str()).is_some() {
            pos = arg.start();
            continue;
        }
        out.push_str(&input[copied..whole.start()]);
        out.push_str(func.as_str());
        out.push('(');
        out.push_str(arg.as_str());
        out.push(')');
        if input[whole.end()..].trim_start().starts_with('(') {
            out.push('*');
        }
        copied = whole.end();
        pos = whole.end();
    }
    out.push_str(&input[copied..]);
    out
}

/// Нормализовать пользовательскую запись
///
/// # Параметры
/// - `input`: текст в свободной нотации
pub fn preprocess(input: &str) -> String {
    let out = Rule::iter().fold(input.to_string(), |text, rule| rule.apply(&text));
    if out != input {
        log::debug!("normalized {input:?} -> {out:?}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_rule(rule: Rule, cases: &[(&str, &str)]) {
        for (input, expected) in cases {
            assert_eq!(rule.apply(input), *expected, "{rule:?} on {input:?}");
        }
    }

    #[test]
    fn test_rule_order() {
        let order: Vec<Rule> = Rule::iter().collect();
        assert_eq!(
            order,
            vec![
                Rule::PowerOperator,
                Rule::NumberAdjacency,
                Rule::LetterPair,
                Rule::GroupAdjacency,
                Rule::FunctionArgument,
                Rule::NumberFunction,
                Rule::IdentifierParen,
            ]
        );
    }

    #[test]
    fn test_power_operator() {
        check_rule(
            Rule::PowerOperator,
            &[("x^2", "x**2"), ("2**3^2", "2**3**2"), ("2**3", "2**3")],
        );
    }

    #[test]
    fn test_number_adjacency() {
        check_rule(
            Rule::NumberAdjacency,
            &[
                ("2x", "2*x"),
                ("2(x+1)", "2*(x+1)"),
                ("2.5y", "2.5*y"),
                ("3y + 2x", "3*y + 2*x"),
                ("x2", "x2"),
                ("log10(x)", "log10(x)"),
                ("2 + x", "2 + x"),
            ],
        );
    }

    #[test]
    fn test_letter_pair() {
        check_rule(
            Rule::LetterPair,
            &[
                ("xy", "x*y"),
                ("a + bc", "a + b*c"),
                ("xyz", "xyz"),
                ("pi", "pi"),
                ("ln", "ln"),
                ("x", "x"),
            ],
        );
    }

    #[test]
    fn test_group_adjacency() {
        check_rule(
            Rule::GroupAdjacency,
            &[
                ("(x)(y)", "(x)*(y)"),
                ("(x+1)(y+2)", "(x+1)*(y+2)"),
                ("(x+1)2", "(x+1)*2"),
                ("(a)b", "(a)*b"),
                ("(x) (y)", "(x)*(y)"),
                ("(x)  (y)", "(x)*(y)"),
                ("(x) y", "(x) y"),
                ("(x) 2", "(x) 2"),
            ],
        );
    }

    #[test]
    fn test_function_argument() {
        check_rule(
            Rule::FunctionArgument,
            &[
                ("sin x", "sin(x)"),
                ("cos x", "cos(x)"),
                ("log 10", "log(10)"),
                ("exp 2.5", "exp(2.5)"),
                ("asin x", "asin(x)"),
                ("sin(x)", "sin(x)"),
                ("sin x(y)", "sin(x)*(y)"),
                ("sin cos x", "sin cos(x)"),
                ("sin x (y)", "sin(x)* (y)"),
                ("basin x", "basin x"),
            ],
        );
    }

    #[test]
    fn test_number_function() {
        check_rule(
            Rule::NumberFunction,
            &[
                ("2sin(x)", "2*sin(x)"),
                ("3ln(x)", "3*ln(x)"),
                ("2sine", "2sine"),
                ("x2sin(x)", "x2sin(x)"),
            ],
        );
    }

    #[test]
    fn test_identifier_paren() {
        check_rule(
            Rule::IdentifierParen,
            &[
                ("x(y+1)", "x*(y+1)"),
                ("sin(x)", "sin(x)"),
                ("pi(2)", "pi*(2)"),
                ("mem(2)", "mem*(2)"),
                ("ab(c)", "ab(c)"),
                ("__import__(1)", "__import__(1)"),
                ("exec(x)", "exec(x)"),
                ("x2(3)", "x2(3)"),
                ("x**(-1)", "x**(-1)"),
            ],
        );
    }

    #[test]
    fn test_combined_rules() {
        let cases = [
            ("2x + 1", "2*x + 1"),
            ("x^2", "x**2"),
            ("(x)(y)", "(x)*(y)"),
            ("sin x", "sin(x)"),
            ("2xy", "2*x*y"),
            ("x^2 + 2x + 1", "x**2 + 2*x + 1"),
            ("2x^2 + 3x + 4", "2*x**2 + 3*x + 4"),
            ("x^3 - 2x^2 + x - 1", "x**3 - 2*x**2 + x - 1"),
            ("x^(-1)", "x**(-1)"),
            ("2sin x", "2*sin(x)"),
            ("2sin(x)", "2*sin(x)"),
            ("sin xy", "sin(x)*y"),
            ("xy(z)", "x*y*(z)"),
            ("2(x)(y)", "2*(x)*(y)"),
            ("2pi", "2*pi"),
            ("(x+1) (x-1)", "(x+1)*(x-1)"),
            ("sin x (y)", "sin(x)* (y)"),
            ("__import__(1)", "__import__(1)"),
            ("cos(x) + sin(x)", "cos(x) + sin(x)"),
            ("1/x", "1/x"),
        ];
        for (input, expected) in cases {
            assert_eq!(preprocess(input), expected, "on {input:?}");
        }
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "2x + 1",
            "x^2 + 2x + 1",
            "(x)(y)",
            "sin x",
            "sin x(y)",
            "sin cos x",
            "2xy(z)^3",
            "(x+1)2y",
            "2.5ab + ln 3",
            "x2y",
            "__import__('os').system('ls')",
            "1e5",
            "3!",
            "",
            "   ",
            "(((",
            "mem(2)",
            "sqrt 16 + cbrt 27",
        ];
        for input in inputs {
            let once = preprocess(input);
            assert_eq!(preprocess(&once), once, "on {input:?}");
        }
    }

    /// Детерминированный xorshift64
    struct XorShift(u64);

    impl XorShift {
        fn next(&mut self) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0
        }

        fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
            items[(self.next() % items.len() as u64) as usize]
        }
    }

    #[test]
    fn test_idempotent_on_generated_inputs() {
        let tokens = [
            "x", "y", "2", "1.5", "sin", "ln", "pi", " ", "(", ")", "^", "+", "*", "-",
        ];
        let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);
        for _ in 0..5000 {
            let len = 1 + (rng.next() % 12) as usize;
            let input: String = (0..len).map(|_| rng.pick(&tokens)).collect();
            let once = preprocess(&input);
            assert_eq!(preprocess(&once), once, "on {input:?}");
        }
    }

    #[test]
    fn test_total() {
        for input in ["", ")(", "^^", "sin", "2", "ü2x", "∑x"] {
            let _ = preprocess(input);
        }
    }
}

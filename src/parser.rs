use super::ast::*;
use crate::error::{CalcError, CalcResult};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace0, one_of},
    combinator::{all_consuming, map, map_res, opt, recognize},
    error::{Error, ErrorKind as NomErrorKind, ParseError},
    multi::separated_list0,
    sequence::{delimited, pair, preceded},
};

/// Максимальная глубина дерева: скобки, знаки, цепочки операторов и `!`
const MAX_DEPTH: usize = 128;

/// Сила связывания унарных `+`/`-`: слабее `**`, сильнее `*`
const PREFIX_BP: u8 = 2;

/// Оборачивает парсер, чтобы игнорировать пробелы вокруг.
///
/// # Параметры
/// - `inner`: внутренний парсер
fn ws<'a, F, O, E>(mut inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O, E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: ParseError<&'a str>,
{
    move |input| {
        let (input, _) = multispace0(input)?;
        let (input, out) = inner.parse(input)?;
        let (input, _) = multispace0(input)?;
        Ok((input, out))
    }
}

fn skip_ws(input: &str) -> IResult<&str, &str> {
    multispace0(input)
}

/// Парсер идентификатора (имя переменной или функции)
///
/// # Параметры
/// - `input`: строка для парсинга
fn ident(input: &str) -> IResult<&str, String> {
    let first = |c: char| c.is_ascii_alphabetic() || c == '_';
    let rest = |c: char| c.is_ascii_alphanumeric() || c == '_';
    map(
        |i| ws(recognize(pair(take_while1(first), take_while(rest))))(i),
        |s: &str| s.to_string(),
    )
    .parse(input)
}

/// Парсер числа: `12`, `1.5`, `.5`, `2.`, `1e-3`.
///
/// `inf` и `nan` числами не считаются.
///
/// # Параметры
/// - `input`: строка для парсинга
fn number(input: &str) -> IResult<&str, Node> {
    let mantissa = alt((
        recognize(pair(digit1, opt(pair(char('.'), digit0)))),
        recognize(pair(char('.'), digit1)),
    ));
    let exponent = opt((one_of("eE"), opt(one_of("+-")), digit1));
    map_res(ws(recognize(pair(mantissa, exponent))), |s: &str| {
        s.parse::<f64>().map(Node::Number)
    })
    .parse(input)
}

/// Парсер строкового литерала в одинарных или двойных кавычках
///
/// # Параметры
/// - `input`: строка для парсинга
fn string(input: &str) -> IResult<&str, Node> {
    map(
        ws(alt((
            delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
            delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
        ))),
        |s: &str| Node::Str(s.to_string()),
    )
    .parse(input)
}

/// Узел и высота его поддерева
type Parsed = (Node, usize);

/// Ошибка превышения глубины дерева; `Failure` останавливает перебор `alt`
fn too_deep(input: &str) -> nom::Err<Error<&str>> {
    nom::Err::Failure(Error::new(input, NomErrorKind::TooLarge))
}

/// Проверить, что поддерево высоты `height` на глубине `depth` не слишком глубоко
fn within_depth(input: &str, depth: usize, height: usize) -> Result<(), nom::Err<Error<&str>>> {
    if depth + height > MAX_DEPTH {
        Err(too_deep(input))
    } else {
        Ok(())
    }
}

/// Парсер атомарных выражений (число, строка, имя, скобки)
///
/// # Параметры
/// - `input`: строка для парсинга
/// - `depth`: глубина узла в дереве
fn primary(input: &str, depth: usize) -> IResult<&str, Parsed> {
    within_depth(input, depth, 1)?;
    alt((
        map(number, |n| (n, 1)),
        map(string, |s| (s, 1)),
        map(ident, |name| (Node::Name(name), 1)),
        map(
            delimited(ws(char('(')), |i| expr(i, depth + 1), ws(char(')'))),
            |(inner, height)| (Node::Group(Box::new(inner)), height + 1),
        ),
    ))
    .parse(input)
}

/// Постфиксная часть после атома
enum Suffix {
    Call(Vec<Node>),
    Attribute(String),
    Index(Node),
    Bang,
}

/// Суффикс и высота его собственных поддеревьев (аргументов, индекса)
fn suffix(input: &str, depth: usize) -> IResult<&str, (Suffix, usize)> {
    alt((
        map(
            delimited(
                ws(char('(')),
                separated_list0(ws(char(',')), |i| expr(i, depth + 1)),
                ws(char(')')),
            ),
            |args: Vec<Parsed>| {
                let height = args.iter().map(|(_, h)| *h).max().unwrap_or(0);
                (Suffix::Call(args.into_iter().map(|(n, _)| n).collect()), height)
            },
        ),
        map(preceded(ws(char('.')), ident), |attr| {
            (Suffix::Attribute(attr), 0)
        }),
        map(
            delimited(ws(char('[')), |i| expr(i, depth + 1), ws(char(']'))),
            |(index, height)| (Suffix::Index(index), height),
        ),
        map(ws(char('!')), |_| (Suffix::Bang, 0)),
    ))
    .parse(input)
}

/// Парсер атома с цепочкой вызовов, атрибутов, индексов и `!`
///
/// # Параметры
/// - `input`: строка для парсинга
/// - `depth`: глубина узла в дереве
fn postfix(input: &str, depth: usize) -> IResult<&str, Parsed> {
    let (mut input, (mut node, mut height)) = primary(input, depth)?;
    loop {
        let (rest, (s, inner)) = match suffix(input, depth) {
            Ok(parsed) => parsed,
            Err(nom::Err::Error(_)) => break,
            Err(e) => return Err(e),
        };
        height = height.max(inner) + 1;
        within_depth(input, depth, height)?;
        node = match s {
            Suffix::Call(args) => Node::Call {
                callee: Box::new(node),
                args,
            },
            Suffix::Attribute(attr) => Node::Attribute {
                value: Box::new(node),
                attr,
            },
            Suffix::Index(index) => Node::Subscript {
                value: Box::new(node),
                index: Box::new(index),
            },
            Suffix::Bang => Node::Factorial(Box::new(node)),
        };
        input = rest;
    }
    Ok((input, (node, height)))
}

/// Возвращает запись, приоритет и тип бинарного оператора в начале `input`
///
/// # Параметры
/// - `input`: остаток строки
fn binding(input: &str) -> Option<(&'static str, u8, BinOp, bool)> {
    const TABLE: [(&str, u8, BinOp, bool); 6] = [
        ("**", 3, BinOp::Pow, true),
        ("+", 0, BinOp::Add, false),
        ("-", 0, BinOp::Sub, false),
        ("*", 1, BinOp::Mul, false),
        ("/", 1, BinOp::Div, false),
        ("%", 1, BinOp::Mod, false),
    ];
    TABLE
        .into_iter()
        .find(|(symbol, ..)| input.starts_with(symbol))
}

/// Парсер выражения (с поддержкой приоритетов)
///
/// # Параметры
/// - `input`: строка для парсинга
/// - `depth`: глубина узла в дереве
fn expr(input: &str, depth: usize) -> IResult<&str, Parsed> {
    expr_bp(input, 0, depth)
}

/// Парсер выражения с учетом приоритетов (precedence climbing).
///
/// Высота каждого построенного поддерева вместе с его глубиной не превышает
/// [`MAX_DEPTH`], поэтому обход дерева дальше по конвейеру ограничен.
///
/// # Параметры
/// - `input`: строка для парсинга
/// - `min_bp`: минимальный приоритет
/// - `depth`: глубина узла в дереве
fn expr_bp(input: &str, min_bp: u8, depth: usize) -> IResult<&str, Parsed> {
    within_depth(input, depth, 1)?;
    let (after_sign, sign) = opt(ws(alt((char('+'), char('-'))))).parse(input)?;
    let (mut input, (mut lhs, mut height)) = match sign {
        Some(c) => {
            let (rest, (operand, h)) = expr_bp(after_sign, PREFIX_BP, depth + 1)?;
            let op = if c == '-' { UniOp::Neg } else { UniOp::Plus };
            let node = Node::Unary {
                op,
                operand: Box::new(operand),
            };
            (rest, (node, h + 1))
        }
        None => postfix(after_sign, depth)?,
    };

    loop {
        let (trimmed, _) = skip_ws(input)?;
        let Some((symbol, bp, op, right_assoc)) = binding(trimmed) else {
            break;
        };
        if bp < min_bp {
            break;
        }
        let next_min = if right_assoc { bp } else { bp + 1 };
        let (rest, (rhs, rhs_height)) = expr_bp(&trimmed[symbol.len()..], next_min, depth + 1)?;
        height = height.max(rhs_height) + 1;
        within_depth(trimmed, depth, height)?;
        lhs = Node::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        };
        input = rest;
    }
    Ok((input, (lhs, height)))
}

fn syntax_error(text: &str, rest: &str) -> CalcError {
    let fragment = if rest.is_empty() {
        "end of input".to_string()
    } else {
        rest.chars().take(16).collect()
    };
    CalcError::Syntax {
        position: text.len() - rest.len(),
        fragment,
    }
}

/// Разобрать строку целиком в дерево
///
/// # Параметры
/// - `text`: нормализованное выражение
pub fn parse(text: &str) -> CalcResult<Node> {
    match all_consuming(ws(|i| expr(i, 0))).parse(text) {
        Ok((_, (node, _))) => {
            log::trace!("parsed {text:?} into {node:?}");
            Ok(node)
        }
        Err(nom::Err::Failure(e)) if e.code == NomErrorKind::TooLarge => Err(CalcError::Syntax {
            position: text.len() - e.input.len(),
            fragment: format!("nesting deeper than {MAX_DEPTH}"),
        }),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(syntax_error(text, e.input)),
        Err(nom::Err::Incomplete(_)) => Err(syntax_error(text, "")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Box<Node> {
        Box::new(Node::Number(n))
    }

    fn name(s: &str) -> Box<Node> {
        Box::new(Node::Name(s.to_string()))
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse("42").unwrap(), Node::Number(42.0));
        assert_eq!(parse(" 1.5 ").unwrap(), Node::Number(1.5));
        assert_eq!(parse(".25").unwrap(), Node::Number(0.25));
        assert_eq!(parse("1e3").unwrap(), Node::Number(1000.0));
        assert_eq!(parse("2.5E-1").unwrap(), Node::Number(0.25));
        assert_eq!(parse("inf").unwrap(), Node::Name("inf".into()));
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse("1 + 2 * 3").unwrap(),
            Node::Binary {
                op: BinOp::Add,
                lhs: num(1.0),
                rhs: Box::new(Node::Binary {
                    op: BinOp::Mul,
                    lhs: num(2.0),
                    rhs: num(3.0),
                }),
            }
        );
        assert_eq!(
            parse("10 - 4 - 3").unwrap(),
            Node::Binary {
                op: BinOp::Sub,
                lhs: Box::new(Node::Binary {
                    op: BinOp::Sub,
                    lhs: num(10.0),
                    rhs: num(4.0),
                }),
                rhs: num(3.0),
            }
        );
    }

    #[test]
    fn test_power_is_right_associative_and_binds_tighter_than_negation() {
        assert_eq!(
            parse("2**3**2").unwrap(),
            Node::Binary {
                op: BinOp::Pow,
                lhs: num(2.0),
                rhs: Box::new(Node::Binary {
                    op: BinOp::Pow,
                    lhs: num(3.0),
                    rhs: num(2.0),
                }),
            }
        );
        assert_eq!(
            parse("-2**2").unwrap(),
            Node::Unary {
                op: UniOp::Neg,
                operand: Box::new(Node::Binary {
                    op: BinOp::Pow,
                    lhs: num(2.0),
                    rhs: num(2.0),
                }),
            }
        );
        assert_eq!(
            parse("2**-1").unwrap(),
            Node::Binary {
                op: BinOp::Pow,
                lhs: num(2.0),
                rhs: Box::new(Node::Unary {
                    op: UniOp::Neg,
                    operand: num(1.0),
                }),
            }
        );
    }

    #[test]
    fn test_calls_and_postfix() {
        assert_eq!(
            parse("sin(x)").unwrap(),
            Node::Call {
                callee: name("sin"),
                args: vec![Node::Name("x".into())],
            }
        );
        assert_eq!(parse("5!").unwrap(), Node::Factorial(num(5.0)));
        assert_eq!(
            parse("os.system('ls')").unwrap(),
            Node::Call {
                callee: Box::new(Node::Attribute {
                    value: name("os"),
                    attr: "system".into(),
                }),
                args: vec![Node::Str("ls".into())],
            }
        );
        assert_eq!(
            parse("a[0]").unwrap(),
            Node::Subscript {
                value: name("a"),
                index: num(0.0),
            }
        );
    }

    #[test]
    fn test_syntax_errors() {
        for text in ["", "(1 + 2", "1 +", "2 3", "2^3", "1 + * 2", ")", "sin(", "'open"] {
            let err = parse(text).unwrap_err();
            assert!(
                matches!(err, CalcError::Syntax { .. }),
                "{text:?} gave {err:?}"
            );
        }
        assert_eq!(
            parse("2 3").unwrap_err(),
            CalcError::Syntax {
                position: 2,
                fragment: "3".into()
            }
        );
    }

    #[test]
    fn test_nesting_limit() {
        let too_deep = |text: &str| {
            matches!(
                parse(text),
                Err(CalcError::Syntax { ref fragment, .. }) if fragment.starts_with("nesting")
            )
        };
        let parens = format!("{}1{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert!(too_deep(&parens));
        assert!(too_deep(&format!("{}1", "-".repeat(5000))));
        assert!(too_deep(&format!("0{}", "!".repeat(100_000))));
        assert!(too_deep(&format!("2{}", "**2".repeat(5000))));
        assert!(too_deep(&format!("1{}", "+1".repeat(100_000))));
        assert!(too_deep(&format!("{}x", "sin(".repeat(5000))));

        let ok = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert!(parse(&ok).is_ok());
        assert!(parse(&format!("{}1", "-".repeat(20))).is_ok());
        assert!(parse(&format!("3{}", "!".repeat(20))).is_ok());
        assert!(parse(&format!("1{}", "+1".repeat(50))).is_ok());
    }
}

use anyhow::{Context as _, Result};
use clap::Parser;
use safecalc::{
    AngleMode, CalcResult, Config, Context, ErrorKind, Session, format_value, preprocess,
};
use serde::Serialize;
use std::io::{self, BufRead, IsTerminal, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Evaluate calculator expressions without ever executing code
#[derive(Parser, Debug)]
#[command(name = "safecalc", version, about)]
struct Args {
    /// Expression to evaluate; lines are read from stdin when omitted
    expr: Option<String>,
    /// Interpret trigonometric arguments in degrees
    #[arg(long, conflicts_with = "radians")]
    degrees: bool,
    /// Interpret trigonometric arguments in radians
    #[arg(long)]
    radians: bool,
    /// Print results as JSON objects
    #[arg(long)]
    json: bool,
    /// Bind a variable, e.g. `--var x=3`
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_binding)]
    vars: Vec<(String, f64)>,
}

/// Разобрать `name=value`
///
/// # Параметры
/// - `s`: аргумент командной строки
fn parse_binding(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {s:?}"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad value for {name}: {e}"))?;
    if !value.is_finite() {
        return Err(format!("value for {name} must be finite"));
    }
    Ok((name.trim().to_string(), value))
}

/// Результат одной строки для вывода в JSON
#[derive(Serialize)]
#[serde(untagged)]
enum Report<'a> {
    Value {
        input: &'a str,
        normalized: String,
        value: f64,
    },
    Error {
        input: &'a str,
        normalized: String,
        kind: ErrorKind,
        message: String,
    },
}

fn print_outcome(json: bool, input: &str, outcome: &CalcResult<f64>) -> Result<()> {
    if json {
        let normalized = preprocess(input);
        let report = match outcome {
            Ok(value) => Report::Value {
                input,
                normalized,
                value: *value,
            },
            Err(e) => Report::Error {
                input,
                normalized,
                kind: e.kind(),
                message: e.to_string(),
            },
        };
        println!("{}", serde_json::to_string(&report)?);
    } else {
        match outcome {
            Ok(value) => println!("{}", format_value(*value)),
            Err(e) => eprintln!("error[{}]: {e}", e.kind()),
        }
    }
    Ok(())
}

struct Shell {
    session: Session,
    vars: Vec<(String, f64)>,
    json: bool,
}

impl Shell {
    fn context(&self) -> Context {
        self.vars
            .iter()
            .fold(self.session.context(), |ctx, (name, value)| {
                ctx.with_var(name.clone(), *value)
            })
    }

    /// Вычислить строку; `false`, если вычисление не удалось
    ///
    /// # Параметры
    /// - `line`: ввод пользователя
    fn eval_line(&mut self, line: &str) -> Result<bool> {
        let ctx = self.context();
        let outcome = self.session.evaluate_in(line, &ctx);
        print_outcome(self.json, line, &outcome)?;
        Ok(outcome.is_ok())
    }

    /// Выполнить команду `:...`; `false` означает выход
    ///
    /// # Параметры
    /// - `command`: текст после `:`
    fn command(&mut self, command: &str) -> bool {
        match command {
            "mc" => self.session.memory_clear(),
            "mr" => println!("{}", format_value(self.session.memory_recall())),
            "m+" | "m-" => match self.session.last() {
                Some(v) if command == "m+" => self.session.memory_add(v),
                Some(v) => self.session.memory_subtract(v),
                None => eprintln!("no result to store yet"),
            },
            "mode" => {
                let mode = match self.session.toggle_angle_mode() {
                    AngleMode::Degrees => "deg",
                    AngleMode::Radians => "rad",
                };
                println!("angle mode: {mode}");
            }
            "history" => {
                for entry in self.session.history() {
                    println!("{entry}");
                }
            }
            "clear" => self.session.clear_history(),
            "quit" | "q" => return false,
            "help" => println!(":mc :mr :m+ :m- :mode :history :clear :quit"),
            other => eprintln!("unknown command :{other}"),
        }
        true
    }

    fn repl(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let interactive = stdin.is_terminal();
        let mut lines = stdin.lock().lines();
        loop {
            if interactive {
                print!("> ");
                io::stdout().flush()?;
            }
            let Some(line) = lines.next() else { break };
            let line = line.context("failed to read stdin")?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(command) = line.strip_prefix(':') {
                if !self.command(command.trim()) {
                    break;
                }
                continue;
            }
            self.eval_line(line)?;
        }
        Ok(())
    }
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mut config = Config::from_env().context("invalid configuration")?;
    if args.degrees {
        config.angle_mode = AngleMode::Degrees;
    } else if args.radians {
        config.angle_mode = AngleMode::Radians;
    }
    log::debug!("starting with {config:?}");

    let mut shell = Shell {
        session: Session::new(&config),
        vars: args.vars,
        json: args.json,
    };
    match args.expr.as_deref() {
        Some(expr) => {
            if shell.eval_line(expr)? {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        None => {
            shell.repl()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

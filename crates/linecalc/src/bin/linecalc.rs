use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use linecalc_engine::store::JsonFileStore;
use linecalc_engine::{Engine, LineResult, Settings, TextBuffer};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "linecalc", version, about = "Evaluate a calculator notepad line by line")]
struct Cli {
    /// Notepad file; reads stdin when omitted or `-`.
    file: Option<PathBuf>,

    /// JSON or YAML settings file (camelCase keys).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Persist the session snapshot to this JSON file.
    #[arg(long)]
    session: Option<PathBuf>,

    /// Print copy text instead of display text.
    #[arg(long)]
    copy: bool,

    /// Number locale, e.g. `de-DE`.
    #[arg(long)]
    locale: Option<String>,

    /// Maximum fraction digits.
    #[arg(long)]
    precision: Option<usize>,

    /// Do not continue lines that start with an operator from the line above.
    #[arg(long = "no-continuation")]
    no_continuation: bool,

    /// Raise log verbosity (-v debug, -vv trace). `RUST_LOG` wins when set.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.settings {
            Some(path) => Settings::load(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => Settings::default(),
        };
        if let Some(locale) = &self.locale {
            settings.locale = locale.clone();
        }
        if let Some(precision) = self.precision {
            settings.precision = precision;
        }
        if self.no_continuation {
            settings.cont_prev_line = false;
        }
        Ok(settings)
    }

    fn read_input(&self) -> Result<String> {
        match &self.file {
            Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display())),
            _ => {
                let mut text = String::new();
                io::stdin()
                    .read_to_string(&mut text)
                    .context("reading stdin")?;
                Ok(text)
            }
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn answer(result: &LineResult, copy: bool) -> Option<String> {
    match result {
        LineResult::Empty => None,
        LineResult::Value {
            display, copy_text, ..
        } => Some(if copy { copy_text.clone() } else { display.clone() }),
        LineResult::Error { message, .. } => Some(format!("error: {message}")),
        LineResult::Plot { expression } => Some(format!("plot: {expression}")),
    }
}

/// Lines on the left, answers aligned in a column on the right.
fn render<B: TextBuffer + ?Sized>(buffer: &B, results: &[LineResult], copy: bool) -> String {
    let lines: Vec<&str> = (0..buffer.line_count())
        .map(|i| buffer.line(i).unwrap_or("").trim_end())
        .collect();
    let width = lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .min(60);

    let mut out = String::new();
    for (line, result) in lines.iter().zip(results) {
        match answer(result, copy) {
            Some(answer) => out.push_str(&format!("{line:<width$}  {answer}\n")),
            None => {
                out.push_str(line);
                out.push('\n');
            }
        }
    }
    out
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = cli.settings()?;
    let mut text = cli.read_input()?;
    if text.ends_with('\n') {
        text.pop();
    }

    let mut engine = Engine::new();
    if let Some(path) = &cli.session {
        engine = engine.with_store(JsonFileStore::new(path));
        engine
            .resume()
            .with_context(|| format!("reading session {}", path.display()))?;
    }
    let results = engine.run_pass(text.as_str(), &settings);
    print!("{}", render(text.as_str(), &results, cli.copy));
    Ok(())
}

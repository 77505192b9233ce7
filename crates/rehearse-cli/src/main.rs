//! Rehearse CLI - Command line interface for rehearse test suites

use std::fs;
use std::path::{Path, PathBuf};

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::prelude::*;

use rehearse_analysis::{
    completion_context, AnalyzedFile, Analyzer, AnalyzerConfig, Diagnostic, FsResolver, Severity,
};
use rehearse_ast::Position;
use rehearse_lexer::tokenize;

#[derive(Parser)]
#[command(name = "rehearse")]
#[command(about = "Analyzer for rehearse database test suites", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Report only the strict parse error for broken files
    #[arg(long, global = true)]
    no_recovery: bool,

    /// Log analysis decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze files and report diagnostics
    Check {
        /// Input file(s)
        files: Vec<PathBuf>,
    },
    /// Print the symbol table as JSON
    Symbols {
        /// Input file
        file: PathBuf,
        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,
    },
    /// Print the completion context at a position as JSON
    Complete {
        /// Input file
        file: PathBuf,
        /// 1-based line
        line: u32,
        /// 1-based column
        column: u32,
    },
    /// Print the token stream
    Tokens {
        /// Input file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = AnalyzerConfig::default().with_recovery(!cli.no_recovery);
    match cli.command {
        Commands::Check { files } => cmd_check(&files, config),
        Commands::Symbols { file, pretty } => cmd_symbols(&file, config, pretty),
        Commands::Complete { file, line, column } => {
            cmd_complete(&file, config, Position::at(line, column))
        }
        Commands::Tokens { file } => cmd_tokens(&file),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn read_source(file: &Path) -> String {
    match fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {}", file.display(), e);
            std::process::exit(1);
        }
    }
}

fn analyze_file(file: &Path, source: &str, config: AnalyzerConfig) -> AnalyzedFile {
    Analyzer::new(config)
        .with_resolver(FsResolver::new())
        .analyze(Some(file), source)
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match json {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_check(files: &[PathBuf], config: AnalyzerConfig) {
    let mut all_ok = true;

    for file in files {
        let source = match fs::read_to_string(file) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error reading {}: {}", file.display(), e);
                all_ok = false;
                continue;
            }
        };

        let analyzed = analyze_file(file, &source, config.clone());
        for diagnostic in &analyzed.diagnostics {
            report_diagnostic(&source, file, diagnostic);
        }

        if analyzed.has_errors() {
            eprintln!(
                "✗ {} - {} problems",
                file.display(),
                analyzed.diagnostics.len()
            );
            all_ok = false;
        } else {
            let symbols = &analyzed.symbols;
            println!(
                "✓ {} - {} queries, {} tests",
                file.display(),
                symbols.queries.len(),
                symbols.tests.len()
            );
        }
    }

    if !all_ok {
        std::process::exit(1);
    }
}

fn cmd_symbols(file: &Path, config: AnalyzerConfig, pretty: bool) {
    let source = read_source(file);
    let analyzed = analyze_file(file, &source, config);
    print_json(&analyzed.symbols, pretty);
}

fn cmd_complete(file: &Path, config: AnalyzerConfig, pos: Position) {
    let source = read_source(file);
    let analyzed = analyze_file(file, &source, config);
    let context = completion_context(&analyzed, pos);
    debug!(%pos, found = context.is_some(), "completion request");
    print_json(&context, true);
}

fn cmd_tokens(file: &Path) {
    let source = read_source(file);
    for token in tokenize(&source) {
        if token.is_trivia() {
            continue;
        }
        let kind = format!("{:?}", token.kind);
        println!(
            "{:>4}:{:<4} {:<16} {:?}",
            token.pos.line, token.pos.column, kind, token.text
        );
    }
}

fn report_diagnostic(source: &str, file: &Path, diagnostic: &Diagnostic) {
    let name = file.to_string_lossy().to_string();
    let (kind, color) = match diagnostic.severity {
        Severity::Error => (ReportKind::Error, Color::Red),
        Severity::Warning => (ReportKind::Warning, Color::Yellow),
        Severity::Info | Severity::Hint => (ReportKind::Advice, Color::Blue),
    };
    let start = diagnostic.span.start.byte_offset as usize;
    let end = (diagnostic.span.end.byte_offset as usize).max(start);

    let printed = Report::build(kind, name.clone(), start)
        .with_code(&diagnostic.code)
        .with_message(&diagnostic.message)
        .with_label(
            Label::new((name.clone(), start..end))
                .with_message(&diagnostic.message)
                .with_color(color),
        )
        .finish()
        .eprint((name, Source::from(source)));
    if let Err(e) = printed {
        eprintln!("{}", diagnostic);
        debug!(error = %e, "failed to render report");
    }
}

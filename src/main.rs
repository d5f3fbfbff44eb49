use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use tracing_subscriber::EnvFilter;

use sqlrewrite::mode::Mode;
use sqlrewrite::report::{FileResult, Report};

/// sqlrewrite - Analyze SQL statements for client-side batch rewriting.
/// Shows which parameterized INSERTs can be sent as one multi-row statement.
#[derive(Parser, Debug)]
#[command(name = "sqlrewrite", version, about)]
struct Cli {
    /// Files or directories to analyze. Use "-" to read from stdin.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Treat backslash as an ordinary character in string literals.
    #[arg(long)]
    no_backslash_escapes: bool,

    /// Server sql_mode, e.g. "STRICT_TRANS_TABLES,NO_BACKSLASH_ESCAPES".
    #[arg(long)]
    sql_mode: Option<String>,

    /// Do not rewrite batched INSERTs into multi-row statements.
    #[arg(long)]
    no_rewrite_batched_statements: bool,

    /// Allow batches to be sent as ";"-joined multi-statement queries.
    #[arg(long)]
    allow_multi_queries: bool,

    /// Exit with status 1 if a parameterized INSERT is not rewritable.
    #[arg(long)]
    check: bool,

    /// Print segments and rewrite template of every statement.
    #[arg(long)]
    explain: bool,

    /// Glob patterns to exclude.
    #[arg(long)]
    exclude: Vec<String>,

    /// Verbose output (debug logging).
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only).
    #[arg(short, long)]
    quiet: bool,

    /// Force color output.
    #[arg(long)]
    force_color: bool,

    /// Disable color output.
    #[arg(long)]
    no_color: bool,

    /// Number of threads for parallel processing (0 = all cores).
    #[arg(short = 't', long, default_value_t = 0)]
    threads: usize,

    /// Disable multi-threaded processing.
    #[arg(long)]
    single_process: bool,

    /// Path to config file (sqlrewrite.toml or pyproject.toml).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let is_stdin = cli.files.len() == 1 && cli.files[0].as_os_str() == "-";

    let base_mode = sqlrewrite::load_config(&cli.files, cli.config.as_deref())
        .context("Configuration error")?;
    let files = cli.files.clone();
    let mode = merge_cli(cli, base_mode);

    let report = if is_stdin {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("Error reading stdin")?;
        let mut report = Report::new();
        report.add(FileResult::analyzed(
            PathBuf::from("-"),
            sqlrewrite::analyze_script(&source, &mode),
        ));
        report
    } else {
        sqlrewrite::run(&files, &mode)
    };

    if !mode.quiet {
        print_results(&report, &mode).context("Error writing output")?;
        eprintln!("{}", report.summary());
    }
    report.print_errors();

    Ok(if report.has_errors() {
        ExitCode::from(2)
    } else if mode.check && report.check_failures() > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

/// Command-line flags override values from the config file.
fn merge_cli(cli: Cli, base: Mode) -> Mode {
    Mode {
        no_backslash_escapes: cli.no_backslash_escapes || base.no_backslash_escapes,
        sql_mode: cli.sql_mode.or(base.sql_mode),
        rewrite_batched_statements: !cli.no_rewrite_batched_statements
            && base.rewrite_batched_statements,
        allow_multi_queries: cli.allow_multi_queries || base.allow_multi_queries,
        exclude: if cli.exclude.is_empty() {
            base.exclude
        } else {
            cli.exclude
        },
        check: cli.check,
        explain: cli.explain,
        verbose: cli.verbose,
        quiet: cli.quiet,
        no_color: cli.no_color,
        force_color: cli.force_color,
        threads: cli.threads,
        single_process: cli.single_process,
        ..base
    }
}

fn color_choice(mode: &Mode) -> ColorChoice {
    if mode.force_color {
        ColorChoice::Always
    } else if mode.color() && io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

fn print_results(report: &Report, mode: &Mode) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(color_choice(mode));
    let options = mode.batch_options();
    for result in &report.results {
        for stmt in &result.statements {
            write!(
                stdout,
                "{}:{} params={} ",
                result.path.display(),
                stmt.line,
                stmt.parameter_count()
            )?;
            let color = if stmt.blocker().is_none() {
                Color::Green
            } else if stmt.fails_check() {
                Color::Red
            } else {
                Color::Yellow
            };
            stdout.set_color(ColorSpec::new().set_fg(Some(color)))?;
            write!(stdout, "{}", stmt.status_text())?;
            stdout.reset()?;
            writeln!(stdout)?;
            if mode.explain {
                write!(stdout, "{}", stmt.explain(&options))?;
            }
        }
    }
    stdout.flush()
}

use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::thread;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use clap::error::ErrorKind;
use clap::Parser as ClapParser;
use env_logger::Builder;
use log::{debug, error, info};
use memmap2::Mmap;

use nad_interpreter as nad;

use nad::ast_printer::AstPrinter;
use nad::session::{Mode, Session, INTERPRETER_STACK_SIZE};

const USAGE: &str = "Usage: nad-interpreter [script]";

#[derive(ClapParser, Debug)]
#[command(version, about = "Nad language interpreter", long_about = None)]
pub struct Cli {
    /// Script to run; starts the interactive prompt when omitted
    script: Option<PathBuf>,

    /// Enable logging to app.log
    #[arg(long)]
    log: bool,

    /// Print the script's tokens as JSON lines instead of running it
    #[arg(long, conflicts_with = "ast")]
    tokens: bool,

    /// Print the script's syntax tree instead of running it
    #[arg(long)]
    ast: bool,
}

/// Maps the script into memory and validates it as UTF‑8.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;

    let len = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?
        .len();

    if len == 0 {
        info!("{:?} is empty", filename);
        return Ok(String::new());
    }

    // SAFETY: the map is read once and dropped before this function returns.
    let map = unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

    let source = std::str::from_utf8(&map)
        .context(format!("{:?} is not valid UTF-8", filename))?
        .to_owned();

    info!("Read {} bytes from {:?}", source.len(), filename);

    Ok(source)
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'nad_interpreter::' from module path
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("nad_interpreter::").unwrap_or(module);
            writeln!(
                buf,
                "[{} {}:{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// `>> ` prompt: every line is a separate program sharing one global scope.
fn run_prompt() -> Result<()> {
    info!("Starting interactive prompt");

    let mut session = Session::new(Mode::Interactive);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        print!(">> ");
        stdout.flush().context("Failed to flush stdout")?;

        line.clear();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        if read == 0 {
            debug!("End of input, leaving prompt");
            println!();
            break;
        }

        session.run(line.trim_end_matches(['\n', '\r']));
        session.reset();
    }

    Ok(())
}

fn dump_tokens(session: &mut Session, source: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();

    for token in session.scan(source) {
        let json = serde_json::to_string(&token).context("Failed to serialize token")?;
        writeln!(stdout, "{}", json)?;
    }

    Ok(())
}

fn dump_ast(session: &mut Session, source: &str) -> Result<()> {
    if let Some(statements) = session.parse(source) {
        let printed = AstPrinter::print_program(&statements);
        debug!("AST:\n{}", printed);
        if !printed.is_empty() {
            println!("{}", printed);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(_) => {
            println!("{}", USAGE);
            process::exit(1);
        }
    };

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    // deep Nad recursion needs more than the main thread's stack
    let worker = thread::Builder::new()
        .name("interpreter".into())
        .stack_size(INTERPRETER_STACK_SIZE)
        .spawn(move || run(args))
        .context("Failed to spawn interpreter thread")?;

    worker
        .join()
        .map_err(|_| anyhow!("Interpreter thread panicked"))?
}

fn run(args: Cli) -> Result<()> {
    let Some(script) = args.script else {
        if args.tokens || args.ast {
            println!("{}", USAGE);
            process::exit(1);
        }
        return run_prompt();
    };

    let source = match read_file(&script) {
        Ok(source) => source,
        Err(e) => {
            error!("{:#}", e);
            println!("Cannot open the source code.");
            process::exit(1);
        }
    };

    let mut session = Session::new(Mode::File);

    if args.tokens {
        dump_tokens(&mut session, &source)?;
    } else if args.ast {
        dump_ast(&mut session, &source)?;
    } else {
        session.run(&source);
    }

    let code = session.exit_code();
    info!("Exiting with code {}", code);
    process::exit(code);
}

//! Lantern CLI entry point.

use std::env;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use lantern_engine::BufferHost;
use lantern_foundation::EngineConfig;
use lantern_runtime::{Repl, Session, TerminalHost, run_batch};

/// CLI configuration parsed from arguments.
#[derive(Default)]
struct CliConfig {
    game: Option<PathBuf>,
    batch_mode: bool,
    show_help: bool,
    show_version: bool,
    debug: bool,
    no_echo: bool,
    plain: bool,
    undo: Option<usize>,
    seed: Option<u64>,
    max_depth: Option<usize>,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn parse_value<T: std::str::FromStr>(
    args: &[String],
    i: &mut usize,
    flag: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    *i += 1;
    let Some(raw) = args.get(*i) else {
        return Err(format!("{flag} requires a value").into());
    };
    raw.parse()
        .map_err(|_| format!("invalid {flag} value: {raw}").into())
}

fn parse_args(args: &[String]) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let mut config = CliConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "-b" | "--batch" => config.batch_mode = true,
            "--debug" => config.debug = true,
            "--no-echo" => config.no_echo = true,
            "--plain" => config.plain = true,
            "--undo" => config.undo = Some(parse_value(args, &mut i, "--undo")?),
            "--seed" => config.seed = Some(parse_value(args, &mut i, "--seed")?),
            "--max-depth" => config.max_depth = Some(parse_value(args, &mut i, "--max-depth")?),
            arg if arg.starts_with('-') => {
                return Err(format!("unknown option: {arg}").into());
            }
            path => {
                if config.game.is_some() {
                    return Err(format!("only one game file may be given, got another: {path}").into());
                }
                config.game = Some(PathBuf::from(path));
            }
        }
        i += 1;
    }

    Ok(config)
}

fn engine_config(cli: &CliConfig) -> EngineConfig {
    let mut config = EngineConfig::default().with_echo_commands(!cli.no_echo);
    if let Some(undo) = cli.undo {
        config = config.with_undo_capacity(undo);
    }
    if let Some(seed) = cli.seed {
        config = config.with_rng_seed(seed);
    }
    if let Some(depth) = cli.max_depth {
        config = config.with_max_call_depth(depth);
    }
    config
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn run(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let cli = parse_args(&args)?;

    if cli.show_help {
        print_help();
        return Ok(());
    }
    if cli.show_version {
        println!("lantern {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    init_logging(cli.debug);
    let Some(game) = cli.game.as_deref() else {
        return Err("no game file given (try --help)".into());
    };
    let config = engine_config(&cli);

    if cli.batch_mode {
        let session = Session::open(game, config, BufferHost::new())?;
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        run_batch(session, stdin.lock(), &mut stdout)?;
        return Ok(());
    }

    // rustyline reads the tty directly; the stdin lock only answers questions.
    let host = TerminalHost::new(io::stdin().lock(), io::stdout())
        .with_ansi(!cli.plain)
        .with_diagnostics(cli.debug);
    let session = Session::open(game, config, host)?;
    let mut repl = Repl::new(session)?;
    repl.run()?;
    println!();
    Ok(())
}

fn print_help() {
    println!(
        "\x1b[1mLantern\x1b[0m - Text adventure interpreter

\x1b[1mUSAGE:\x1b[0m
    lantern [OPTIONS] GAME.asl

\x1b[1mOPTIONS:\x1b[0m
    -h, --help         Print help information
    -V, --version      Print version information
    -b, --batch        Read commands from standard input, print plain text
    --no-echo          Do not echo each command before its response
    --plain            No colors or styles
    --undo N           Keep N turns of undo history (default 20)
    --seed N           Seed for random numbers (default 0)
    --max-depth N      Deepest procedure and function nesting (default 64)
    --debug            Show script diagnostics and debug logging

\x1b[1mIN-GAME COMMANDS:\x1b[0m
    save FILE          Save the game
    restore FILE       Restore a saved game
    undo               Take back the last turn
    quit               Leave the game
    Ctrl+D             Leave the game

\x1b[1mEXAMPLES:\x1b[0m
    lantern castle.asl                  Play castle.asl
    lantern -b castle.asl < walk.txt    Play a list of commands
    RUST_LOG=lantern::script=warn lantern castle.asl"
    );
}

mod debug_report;

use charge::{Config, DirectorySource, Engine, ScriptRegistry};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

fn main() {
    let cli = match parse_args() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let config = engine_config(Config::from_env(), &cli);
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(log_level(&config))
        .with_ansi(cli.color)
        .init();

    let mut engine = Engine::new(config);
    let report = match &cli.scripts {
        Some(dir) => engine.load_scripts(&DirectorySource::new(dir)),
        None => engine.load_scripts(&ScriptRegistry::new()),
    };
    if cli.verbose {
        debug_report::print_load(&report, cli.color);
    }
    engine.build_cache();

    if cli.rules {
        debug_report::print_rules(&engine.rule_table(), cli.color);
        return;
    }

    if let Err(err) = converse(&mut engine, &cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// Apply command-line overrides on top of the environment defaults.
fn engine_config(mut config: Config, cli: &CliConfig) -> Config {
    if cli.debug {
        config.debug = true;
    }
    if let Some(depth) = cli.depth {
        config.depth_limit = depth;
    }
    config
}

fn log_level(config: &Config) -> LevelFilter {
    if config.debug { LevelFilter::DEBUG } else { LevelFilter::WARN }
}

/// Answer stdin line by line until end of input.
fn converse(engine: &mut Engine, cli: &CliConfig) -> io::Result<()> {
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let mut stdout = io::stdout();

    loop {
        if interactive {
            write!(stdout, "{}> ", cli.user)?;
            stdout.flush()?;
        }

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let message = line.trim_end_matches(['\r', '\n']);

        let details = engine.reply_verbose(&cli.user, message);
        writeln!(stdout, "{}", details.reply)?;
        if cli.verbose {
            debug_report::print_reply(&details, cli.color);
        }
    }
    Ok(())
}

struct CliConfig {
    scripts: Option<PathBuf>,
    user: String,
    depth: Option<usize>,
    debug: bool,
    rules: bool,
    verbose: bool,
    color: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut cli = CliConfig {
        scripts: None,
        user: "user".to_string(),
        depth: None,
        debug: false,
        rules: false,
        verbose: false,
        color: io::stderr().is_terminal(),
    };
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("charge {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => cli.color = true,
            "--no-color" => cli.color = false,
            "--debug" => cli.debug = true,
            "--rules" => cli.rules = true,
            "--verbose" | "-v" => cli.verbose = true,
            "--scripts" | "-s" => {
                let value = args.next().ok_or_else(|| "error: --scripts expects a directory".to_string())?;
                cli.scripts = Some(PathBuf::from(value));
            }
            "--user" | "-u" => {
                cli.user = args.next().ok_or_else(|| "error: --user expects a name".to_string())?;
            }
            "--depth" => {
                let value = args.next().ok_or_else(|| "error: --depth expects a number".to_string())?;
                cli.depth = Some(parse_depth(&value)?);
            }
            _ if arg.starts_with("--scripts=") => {
                cli.scripts = Some(PathBuf::from(arg.trim_start_matches("--scripts=")));
            }
            _ if arg.starts_with("--user=") => {
                cli.user = arg.trim_start_matches("--user=").to_string();
            }
            _ if arg.starts_with("--depth=") => {
                cli.depth = Some(parse_depth(arg.trim_start_matches("--depth="))?);
            }
            _ => {
                return Err(format!("error: unknown argument '{arg}'\n\n{}", help_text()));
            }
        }
    }

    if cli.user.trim().is_empty() {
        return Err("error: --user must not be empty".to_string());
    }

    Ok(cli)
}

fn parse_depth(value: &str) -> Result<usize, String> {
    value.parse().map_err(|_| format!("error: invalid --depth '{value}' (expected a non-negative number)"))
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "charge {version}

Rule-based chatbot. Reads one message per line from stdin and prints one reply
per line (an empty line when nothing matched).

Usage:
  charge [OPTIONS]

Options:
  -s, --scripts <dir>        Load every *.json rule file in <dir>.
  -u, --user <name>          Name of the user talking to the bot. Default: user
  --depth <n>                Nesting limit for replies. Default: {depth}
  --debug                    Turn on debug logging (also CHARGE_DEBUG=1).
  --rules                    Print the rule table in priority order and exit.
  -v, --verbose              Print the load report and per-reply details to stderr.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Exit codes:
  0  Success.
  1  I/O error.
  2  Invalid arguments.
",
        version = env!("CARGO_PKG_VERSION"),
        depth = charge::DEFAULT_DEPTH_LIMIT
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli() -> CliConfig {
        CliConfig {
            scripts: None,
            user: "user".to_string(),
            depth: None,
            debug: false,
            rules: false,
            verbose: false,
            color: false,
        }
    }

    #[test]
    fn debug_from_environment_raises_log_level() {
        let config = engine_config(Config::default().with_debug(true), &cli());
        assert!(config.debug);
        assert_eq!(log_level(&config), LevelFilter::DEBUG);
    }

    #[test]
    fn flags_override_environment() {
        let flags = CliConfig { debug: true, depth: Some(3), ..cli() };
        let config = engine_config(Config::default().with_depth_limit(9), &flags);

        assert_eq!(config.depth_limit, 3);
        assert_eq!(log_level(&config), LevelFilter::DEBUG);
        assert_eq!(log_level(&engine_config(Config::default(), &cli())), LevelFilter::WARN);
    }
}

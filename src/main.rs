//! vtyterm - a vty-style management shell
//!
//! Runs the line-editing and command engine either on the local console or
//! as a small TCP server.
//!
//! # Quick Start
//!
//! ```text
//! vtyterm                 # Console session
//! vtyterm -l              # Serve on the configured address
//! vtyterm -a 0.0.0.0:2323 # Serve on a specific address
//! ```
//!
//! # Line editing
//!
//! | Key | Action |
//! |-----|--------|
//! | ←/→, Ctrl+B/F | Move cursor |
//! | Home/End, Ctrl+A/E | Jump to start/end |
//! | ↑/↓, Ctrl+P/N | Recall history |
//! | Backspace / Delete, Ctrl+D | Delete backward / forward |
//! | Tab | Complete command |
//! | Enter | Run command |

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crossterm::event::{self, Event};
use crossterm::terminal;
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vtyterm::commands;
use vtyterm::config::{self, Config as VtyConfig};
use vtyterm::net::Reactor;
use vtyterm::ui::{ConsoleInput, KeyMapper};
use vtyterm::{SessionRegistry, SessionStatus, Terminal};

/// Command line options
#[derive(Default)]
struct Options {
    /// Serve over TCP instead of the console
    listen: bool,
    /// Listen address override
    address: Option<String>,
    /// Config file override
    config_path: Option<PathBuf>,
    /// Force echo off
    no_echo: bool,
    /// Write the default config and exit
    init_config: bool,
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_help() {
    eprintln!("vtyterm {} - vty-style management shell", VERSION);
    eprintln!();
    eprintln!("Usage: vtyterm [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  (default)             Interactive session on this console");
    eprintln!("  -l, --listen          Serve sessions over TCP");
    eprintln!("  -a, --address <ADDR>  Listen address (implies --listen)");
    eprintln!("  -c, --config <PATH>   Config file (default: ~/.vtyterm/config.toml)");
    eprintln!("      --no-echo         Start sessions with echo disabled");
    eprintln!("      --init-config     Write the default config file and exit");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Log file: ~/.vtyterm/vtyterm.log (level via RUST_LOG)");
}

fn parse_args() -> Result<Options, String> {
    let args: Vec<String> = env::args().collect();
    let mut options = Options::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                eprintln!("vtyterm {}", VERSION);
                std::process::exit(0);
            }
            "-l" | "--listen" => options.listen = true,
            "-a" | "--address" => {
                i += 1;
                let addr = args.get(i).ok_or("Missing address argument")?;
                options.address = Some(addr.clone());
                options.listen = true;
            }
            "-c" | "--config" => {
                i += 1;
                let path = args.get(i).ok_or("Missing config path argument")?;
                options.config_path = Some(PathBuf::from(path));
            }
            "--no-echo" => options.no_echo = true,
            "--init-config" => options.init_config = true,
            arg => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
        }
        i += 1;
    }

    Ok(options)
}

fn init_logging() {
    let Some(dir) = config::config_dir() else {
        return;
    };
    let _ = std::fs::create_dir_all(&dir);

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("vtyterm.log"))
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let options = match parse_args() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging();
    info!("vtyterm {} starting...", VERSION);

    if options.init_config {
        VtyConfig::default().save()?;
        eprintln!("Wrote default configuration");
        return Ok(());
    }

    let mut config = match &options.config_path {
        Some(path) => VtyConfig::load_from(path)?,
        None => VtyConfig::load(),
    };
    if options.no_echo {
        config.session.echo = false;
    }
    if let Some(addr) = &options.address {
        config.listen.address = addr.clone();
    }

    let tree = commands::build_tree()?;
    let terminal = Terminal::new(tree, config.terminal_settings());
    let mut registry = SessionRegistry::new(terminal);

    if options.listen {
        run_server(&config, &mut registry)
    } else {
        run_console(&mut registry)
    }
}

/// Serve TCP clients until SIGINT or SIGTERM
fn run_server(config: &VtyConfig, registry: &mut SessionRegistry) -> anyhow::Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&shutdown))?;
    }

    let mut reactor = Reactor::bind(&config.listen.address)?;
    eprintln!("vtyterm listening on {}", reactor.local_addr()?);
    reactor.run(registry, &shutdown)?;
    info!("Server stopped");
    Ok(())
}

/// Leaves raw mode when dropped
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// One session on the local console
fn run_console(registry: &mut SessionRegistry) -> anyhow::Result<()> {
    let _raw = RawModeGuard::enable()?;
    let id = registry.open(Box::new(io::stdout()));

    loop {
        let bytes = match event::read()? {
            Event::Key(key) => match KeyMapper::map(&key) {
                ConsoleInput::Bytes(bytes) => bytes,
                ConsoleInput::Interrupt => break,
                ConsoleInput::Ignore => continue,
            },
            Event::Paste(text) => text.into_bytes(),
            _ => continue,
        };

        match registry.deliver_bytes(id, &bytes) {
            Ok(SessionStatus::Open) => {}
            Ok(SessionStatus::CloseRequested) => break,
            Err(e) => {
                error!("{}", e);
                break;
            }
        }
    }

    registry.on_connection_closed(id)?;
    let mut stdout = io::stdout();
    write!(stdout, "\r\n")?;
    stdout.flush()?;
    Ok(())
}

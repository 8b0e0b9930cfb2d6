//! Built-in command set
//!
//! A small tree used by the `vtyterm` binary: enough to exercise modes,
//! history and session options from a real terminal.

use crate::cmd::{Args, CommandTree, Container};
use crate::core::Session;
use crate::error::TreeError;

/// Mode entered by `configure terminal`
pub const CONFIGURE_MODE: &str = "configure";

/// Build the default command tree
pub fn build_tree() -> Result<CommandTree, TreeError> {
    let mut tree = CommandTree::new();
    let root = tree.root_mut();

    root.container("show", "Show running system information")?
        .leaf("version", "Show software version", show_version)?
        .leaf("history", "Show command history of this session", show_history)?
        .leaf("terminal", "Show terminal options", show_terminal)?;

    root.container("terminal", "Set terminal line parameters")?
        .leaf("echo", "Echo typed characters", |s, _| {
            s.set_echo(true);
            Ok(())
        })?
        .leaf("no-echo", "Stop echoing typed characters", |s, _| {
            s.set_echo(false);
            Ok(())
        })?;

    root.leaf("echo", "Print the given text", |s, args| {
        s.write_line(&args.joined());
        Ok(())
    })?;

    root.container(CONFIGURE_MODE, "Configuration commands")?
        .leaf("terminal", "Configure from the terminal", |s, _| {
            s.enter(&[CONFIGURE_MODE]);
            Ok(())
        })?
        .leaf("exit", "Leave configuration mode", |s, _| {
            s.leave();
            Ok(())
        })?;

    root.leaf("quit", "Close this session", quit)?;

    // Snapshot the top level for `help` before adding it
    let listing = describe(tree.root());
    tree.root_mut().leaf("help", "List available commands", move |s, _| {
        for line in &listing {
            s.write_line(line);
        }
        Ok(())
    })?;

    Ok(tree)
}

/// One aligned `name  help` line per child
pub fn describe(container: &Container) -> Vec<String> {
    let width = container.entries().map(|(name, _)| name.len()).max().unwrap_or(0);
    container
        .entries()
        .map(|(name, help)| format!("  {:<width$}  {}", name, help, width = width))
        .collect()
}

fn show_version(s: &mut Session, _args: &Args) -> anyhow::Result<()> {
    s.write_line(&format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")));
    Ok(())
}

fn show_history(s: &mut Session, _args: &Args) -> anyhow::Result<()> {
    let lines: Vec<String> = s
        .history()
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>4}  {}", i + 1, line))
        .collect();
    for line in lines {
        s.write_line(&line);
    }
    Ok(())
}

fn show_terminal(s: &mut Session, _args: &Args) -> anyhow::Result<()> {
    let echo = if s.echo_enabled() { "on" } else { "off" };
    let history = s.history();
    let summary = format!(
        "Session {}\nEcho: {}\nHistory: {}/{}",
        s.id(),
        echo,
        history.len(),
        history.capacity()
    );
    s.write_line(&summary);
    Ok(())
}

fn quit(s: &mut Session, _args: &Args) -> anyhow::Result<()> {
    s.write_line("Bye.");
    s.request_close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CaptureSink, SessionId, Terminal, TerminalSettings};

    fn run(lines: &[u8]) -> (Session, Vec<u8>) {
        let terminal = Terminal::new(build_tree().unwrap(), TerminalSettings::default());
        let sink = CaptureSink::new();
        let mut session = terminal.new_session(SessionId(3), Box::new(sink.clone()));
        terminal.handle_bytes(&mut session, lines);
        (session, sink.take())
    }

    fn text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn test_show_version() {
        let (_, out) = run(b"show version\r");
        assert!(text(&out).contains(&format!("vtyterm {}\r\n", env!("CARGO_PKG_VERSION"))));
    }

    #[test]
    fn test_show_history_lists_current_line() {
        let (_, out) = run(b"echo hi\rshow history\r");
        let out = text(&out);
        assert!(out.contains("hi\r\n"));
        assert!(out.contains("   1  echo hi\r\n   2  show history\r\n"));
    }

    #[test]
    fn test_terminal_no_echo() {
        let (session, out) = run(b"terminal no-echo\rshow terminal\r");
        assert!(!session.echo_enabled());
        let out = text(&out);
        assert!(out.contains("Echo: off\r\n"));
        // The second line was not echoed
        assert!(!out.contains("show terminal"));
    }

    #[test]
    fn test_configure_mode() {
        let (session, out) = run(b"configure terminal\r");
        assert_eq!(session.position(), [CONFIGURE_MODE]);
        assert!(text(&out).ends_with("vty(configure)> "));

        let (session, _) = run(b"configure terminal\rexit\r");
        assert!(session.position().is_empty());
    }

    #[test]
    fn test_help_lists_top_level() {
        let (_, out) = run(b"help\r");
        let out = text(&out);
        assert!(out.contains("  configure  Configuration commands\r\n"));
        assert!(out.contains("  show       Show running system information\r\n"));
    }

    #[test]
    fn test_quit_requests_close() {
        let (session, out) = run(b"quit\r");
        assert!(session.close_requested());
        assert!(text(&out).ends_with("Bye.\r\n"));
    }
}

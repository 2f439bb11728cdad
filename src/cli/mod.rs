//! Interactive client for the session endpoints, used by `apolices_cli`.

pub mod connectivity;

use anyhow::Result;
use rustyline::error::ReadlineError;

use crate::identity::SessionUser;
use connectivity::AuthClient;

pub const HELP: &str = "Commands:\n  login <email> <password>   start a session\n  whoami                     show the current user\n  admin?                     is the current user an admin\n  logout                     end the session\n  help                       show this help\n  quit | exit                leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Login { email: String, password: String },
    WhoAmI,
    IsAdmin,
    Logout,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_command(line: &str) -> ReplCommand {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else { return ReplCommand::Empty; };
    match cmd.to_ascii_lowercase().as_str() {
        "login" => match (parts.next(), parts.next()) {
            (Some(email), Some(password)) => ReplCommand::Login { email: email.to_string(), password: password.to_string() },
            _ => ReplCommand::Unknown("usage: login <email> <password>".to_string()),
        },
        "whoami" | "me" => ReplCommand::WhoAmI,
        "admin?" => ReplCommand::IsAdmin,
        "logout" => ReplCommand::Logout,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        other => ReplCommand::Unknown(format!("unknown command: {}", other)),
    }
}

pub fn describe_user(user: Option<&SessionUser>) -> String {
    match user {
        Some(u) => format!("{} <{}> · {}", u.name, u.email, u.role),
        None => "not logged in".to_string(),
    }
}

/// Run one command; returns false when the loop should stop.
async fn execute(client: &AuthClient, cmd: ReplCommand) -> Result<bool> {
    match cmd {
        ReplCommand::Login { email, password } => match client.login(&email, &password).await? {
            Some(u) => println!("logged in: {}", describe_user(Some(&u))),
            None => println!("Credenciais inválidas"),
        },
        ReplCommand::WhoAmI => println!("{}", describe_user(client.current_user().await.as_ref())),
        ReplCommand::IsAdmin => println!("{}", if client.is_admin().await { "yes" } else { "no" }),
        ReplCommand::Logout => {
            let next = client.logout().await?;
            println!("logged out; login page: {}", next);
        }
        ReplCommand::Help => println!("{}", HELP),
        ReplCommand::Quit => return Ok(false),
        ReplCommand::Empty => {}
        ReplCommand::Unknown(msg) => println!("{}", msg),
    }
    Ok(true)
}

pub fn run_repl(rt: &tokio::runtime::Runtime, client: &AuthClient) -> Result<()> {
    let mut rl = rustyline::DefaultEditor::new()?;
    println!("connected to {} (type 'help')", client.base());
    loop {
        let line = match rl.readline("apolices> ") {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if !line.trim().is_empty() {
            let _ = rl.add_history_entry(line.as_str());
        }
        match rt.block_on(execute(client, parse_command(&line))) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => eprintln!("error: {e:#}"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;

    #[test]
    fn parses_commands() {
        assert_eq!(
            parse_command("login a@x.com p"),
            ReplCommand::Login { email: "a@x.com".into(), password: "p".into() }
        );
        assert!(matches!(parse_command("login a@x.com"), ReplCommand::Unknown(_)));
        assert_eq!(parse_command("  WHOAMI "), ReplCommand::WhoAmI);
        assert_eq!(parse_command("admin?"), ReplCommand::IsAdmin);
        assert_eq!(parse_command("exit"), ReplCommand::Quit);
        assert_eq!(parse_command(""), ReplCommand::Empty);
        assert!(matches!(parse_command("drop"), ReplCommand::Unknown(_)));
    }

    #[test]
    fn describes_users() {
        let u = SessionUser { email: "a@x.com".into(), name: "A".into(), role: Role::Admin };
        assert_eq!(describe_user(Some(&u)), "A <a@x.com> · admin");
        assert_eq!(describe_user(None), "not logged in");
    }
}

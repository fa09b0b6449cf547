use std::io::{BufRead, IsTerminal};

use anyhow::{bail, Context, Result};
use bpaf::Bpaf;
use registry_browser_sdk::models::session::{LoginOutcome, SessionManager, SessionState};
use registry_browser_sdk::providers::registry::LoginService;
use registry_browser_sdk::providers::storage::SessionStore;
use tracing::instrument;

use crate::config::Config;
use crate::utils::message;

// Log in to the registry
#[derive(Debug, Bpaf, Clone)]
pub struct Login {
    /// Username, prompted for if not given
    #[bpaf(short, long, argument("USERNAME"))]
    pub username: Option<String>,

    /// Read the password from the first line of stdin instead of prompting
    #[bpaf(long)]
    pub password_stdin: bool,
}

fn can_prompt() -> bool {
    std::io::stdin().is_terminal() && std::io::stderr().is_terminal()
}

impl Login {
    fn username(&self) -> Result<String> {
        if let Some(username) = &self.username {
            return Ok(username.clone());
        }
        if !can_prompt() {
            bail!("Cannot prompt for a username, pass it with '--username'");
        }
        Ok(inquire::Text::new("Username:").prompt()?)
    }

    fn password(&self) -> Result<String> {
        if self.password_stdin {
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("Could not read the password from stdin")?;
            return Ok(line.trim_end_matches(['\r', '\n']).to_string());
        }
        if !can_prompt() {
            bail!("Cannot prompt for a password, pass it with '--password-stdin'");
        }
        Ok(inquire::Password::new("Password:")
            .without_confirmation()
            .prompt()?)
    }

    #[instrument(name = "login", skip_all)]
    pub async fn handle<S: SessionStore>(
        self,
        session: SessionManager<S>,
        service: &impl LoginService,
    ) -> Result<()> {
        let username = self.username()?;
        let password = self.password()?;
        let logged_in = login_message(session, service, &username, &password).await?;
        message::updated(logged_in);
        Ok(())
    }
}

/// Log in and describe the result, a rejected login is an error.
async fn login_message<S: SessionStore>(
    mut session: SessionManager<S>,
    service: &impl LoginService,
    username: &str,
    password: &str,
) -> Result<String> {
    let outcome = session
        .login(service, username, password)
        .await
        .context("Could not store the session")?;

    match outcome {
        LoginOutcome::LoggedIn(session) => Ok(format!("Logged in as '{}'", session.username)),
        LoginOutcome::Rejected(error) => Err(error.into()),
    }
}

// Forget the stored session
#[derive(Debug, Bpaf, Clone)]
pub struct Logout {}

impl Logout {
    #[instrument(name = "logout", skip_all)]
    pub fn handle<S: SessionStore>(self, mut session: SessionManager<S>) -> Result<()> {
        session.logout().context("Could not remove the stored session")?;
        message::updated("Logged out");
        Ok(())
    }
}

// Show the session and registry in use
#[derive(Debug, Bpaf, Clone)]
pub struct Status {}

impl Status {
    #[instrument(name = "status", skip_all)]
    pub fn handle<S: SessionStore>(
        self,
        mut session: SessionManager<S>,
        config: &Config,
    ) -> Result<()> {
        let state = session
            .restore()
            .context("Could not read the stored session")?;
        println!("{}", status_message(&state, config));
        Ok(())
    }
}

fn status_message(state: &SessionState, config: &Config) -> String {
    let session = match state.username() {
        Some(username) => format!("Logged in as '{username}'"),
        None => "Not logged in".to_string(),
    };
    [
        session,
        format!("Registry: {}", config.registry_url),
        format!("Configure npm with: {}", config.npm_hint()),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;
    use registry_browser_sdk::models::session::Session;
    use registry_browser_sdk::providers::mock::{fake_token, MemorySessionStore, MockRegistry};
    use registry_browser_sdk::providers::storage::SessionKey;

    use super::*;

    fn config() -> Config {
        Config {
            registry_url: "http://localhost:4873".to_string(),
            api_path: "-/verdaccio".to_string(),
            scope: Some("acme".to_string()),
            session_file: PathBuf::from("session.toml"),
            config_dir: PathBuf::from("."),
            user_agent: None,
            extra_headers: BTreeMap::new(),
            connect_timeout_secs: 15,
            request_timeout_secs: 60,
        }
    }

    #[tokio::test]
    async fn login_reports_username() {
        let token = fake_token(Utc::now() + Duration::hours(1));
        let registry = MockRegistry::new().with_login("alice", &token);

        let message = login_message(
            SessionManager::new(MemorySessionStore::new()),
            &registry,
            "alice",
            "secret",
        )
        .await
        .unwrap();
        assert_eq!(message, "Logged in as 'alice'");
    }

    #[tokio::test]
    async fn rejected_login_is_an_error() {
        let registry = MockRegistry::new().with_login_error("bad username/password, access denied");

        let error = login_message(
            SessionManager::new(MemorySessionStore::new()),
            &registry,
            "alice",
            "wrong",
        )
        .await
        .unwrap_err();
        assert_eq!(
            error.to_string(),
            "Unable to login: bad username/password, access denied"
        );
    }

    #[tokio::test]
    async fn empty_password_is_rejected() {
        let registry = MockRegistry::new();

        let error = login_message(
            SessionManager::new(MemorySessionStore::new()),
            &registry,
            "alice",
            "",
        )
        .await
        .unwrap_err();
        assert_eq!(
            error.to_string(),
            "Unable to login: Username or password can't be empty!"
        );
        assert!(registry.calls().is_empty());
    }

    #[test]
    fn status_when_logged_in() {
        let state = SessionState::Authenticated(Session {
            username: "alice".to_string(),
            token: "token".to_string(),
        });
        assert_eq!(
            status_message(&state, &config()),
            [
                "Logged in as 'alice'",
                "Registry: http://localhost:4873",
                "Configure npm with: npm set @acme:registry http://localhost:4873",
            ]
            .join("\n")
        );
    }

    #[test]
    fn status_clears_expired_session() {
        let token = fake_token(Utc::now() - Duration::hours(1));
        let mut session = SessionManager::new(MemorySessionStore::with_session("alice", &token));

        let state = session.restore().unwrap();
        assert!(status_message(&state, &config()).starts_with("Not logged in\n"));
        assert_eq!(session.store().value(SessionKey::Token), None);
    }

    #[test]
    fn logout_is_idempotent() {
        Logout {}
            .handle(SessionManager::new(MemorySessionStore::new()))
            .unwrap();
    }
}

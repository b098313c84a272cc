//! One-time Trakt authorization and credential store maintenance.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dialoguer::{Confirm, Input, Password, console::Term};
use nowshowing_config::{
    constants::{DEFAULT_CREDENTIALS_PATH, DEFAULT_REDIRECT_URI},
    credentials::{CredentialStore, Credentials},
    oauth::{OAuthError, TraktOAuth},
};
use nowshowing_core::http::{DEFAULT_TIMEOUT, build_client};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "nowshowing-init",
    about = "One-time Trakt/TMDB credential setup for nowshowing"
)]
struct Cli {
    /// Credential store to read and write
    #[arg(
        long,
        global = true,
        env = "NOWSHOWING_CONFIG",
        default_value = DEFAULT_CREDENTIALS_PATH
    )]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Prompt for credentials and authorize the app with Trakt
    Setup {
        /// Overwrite an existing store without asking
        #[arg(long)]
        force: bool,
    },
    /// Exchange the stored refresh token for a new token pair
    Refresh,
    /// Print the stored credentials with secrets redacted
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let store = CredentialStore::new(&cli.config);

    match cli.command {
        Command::Setup { force } => setup(&store, force).await,
        Command::Refresh => refresh(&store).await,
        Command::Show => show(&store),
    }
}

async fn setup(store: &CredentialStore, force: bool) -> Result<()> {
    let term = Term::stderr();
    let existing = store.load_or_default().with_context(|| {
        format!("failed to read {}", store.path().display())
    })?;

    if store.exists() && !force {
        let overwrite = Confirm::new()
            .with_prompt(format!(
                "{} already exists. Re-run setup and replace its tokens?",
                store.path().display()
            ))
            .default(false)
            .interact_on(&term)?;
        if !overwrite {
            println!("Aborted; {} was not modified.", store.path().display());
            return Ok(());
        }
    }

    let mut credentials = Credentials {
        trakt_username: prompt_text(&term, "Trakt username", &existing.trakt_username)?,
        client_id: prompt_text(&term, "Trakt client ID", &existing.client_id)?,
        client_secret: prompt_secret(
            &term,
            "Trakt client secret",
            &existing.client_secret,
        )?,
        redirect_uri: prompt_text(
            &term,
            "Redirect URI",
            if existing.redirect_uri.is_empty() {
                DEFAULT_REDIRECT_URI
            } else {
                &existing.redirect_uri
            },
        )?,
        tmdb_api_key: prompt_secret(&term, "TMDB API key", &existing.tmdb_api_key)?,
        access_token: None,
        refresh_token: None,
    };
    store
        .save(&credentials)
        .with_context(|| format!("failed to write {}", store.path().display()))?;

    let http = build_client(DEFAULT_TIMEOUT).context("failed to build HTTP client")?;
    let oauth = TraktOAuth::new(http, &credentials);
    let authorize = oauth.authorize_url()?;

    println!();
    println!("Open this URL in a browser and approve the application:");
    println!();
    println!("  {authorize}");
    println!();

    let pasted: String = Input::new()
        .with_prompt("Paste the URL you were redirected to (or the code shown)")
        .interact_text_on(&term)?;
    let code = TraktOAuth::code_from_input(&pasted)
        .context("could not find an authorization code")?;

    let tokens = oauth
        .exchange_code(&code)
        .await
        .context("Trakt rejected the authorization code")?;
    credentials.access_token = Some(tokens.access_token);
    credentials.refresh_token = tokens.refresh_token;
    store
        .save(&credentials)
        .with_context(|| format!("failed to write {}", store.path().display()))?;

    println!("Authorized. Tokens saved to {}.", store.path().display());
    Ok(())
}

async fn refresh(store: &CredentialStore) -> Result<()> {
    let credentials = store.load()?;
    let Some(refresh_token) = credentials
        .refresh_token
        .as_deref()
        .filter(|token| !token.trim().is_empty())
    else {
        return Err(OAuthError::MissingRefreshToken.into());
    };

    let http = build_client(DEFAULT_TIMEOUT).context("failed to build HTTP client")?;
    let tokens = TraktOAuth::new(http, &credentials)
        .refresh(refresh_token)
        .await
        .context("token refresh failed")?;
    store.update_tokens(tokens.access_token, tokens.refresh_token)?;

    println!("Access token refreshed in {}.", store.path().display());
    Ok(())
}

fn show(store: &CredentialStore) -> Result<()> {
    let credentials = store.load()?;
    let rendered = serde_json::to_string_pretty(&credentials.redacted())?;
    println!("{}", store.path().display());
    println!("{rendered}");
    Ok(())
}

fn prompt_text(term: &Term, prompt: &str, current: &str) -> Result<String> {
    let mut input = Input::<String>::new().with_prompt(prompt);
    if !current.is_empty() {
        input = input.default(current.to_string());
    }
    let value = input.interact_text_on(term)?;
    let value = value.trim().to_string();
    if value.is_empty() {
        bail!("{prompt} must not be empty");
    }
    Ok(value)
}

/// Hidden input; an empty answer keeps the stored value.
fn prompt_secret(term: &Term, prompt: &str, current: &str) -> Result<String> {
    let label = if current.is_empty() {
        prompt.to_string()
    } else {
        format!("{prompt} (leave empty to keep current)")
    };
    let value = Password::new()
        .with_prompt(label)
        .allow_empty_password(!current.is_empty())
        .interact_on(term)?;
    let value = value.trim();
    if value.is_empty() {
        if current.is_empty() {
            bail!("{prompt} must not be empty");
        }
        return Ok(current.to_string());
    }
    Ok(value.to_string())
}

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::{Value, json};
use tars_portal::auth::AuthClient;
use tars_portal::config::{ConfigError, PortalConfig, StorageKind};
use tars_portal::error::AuthError;
use tars_portal::net::api::PortalApi;
use tars_portal::net::transport::{ApiRequest, Method};
use tars_portal::net::types::{Credentials, UserProfile};
use tars_portal::state::{Admission, PortalLoader, PortalView, RouteGuard, SessionGate};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("missing password; pass --password or set PORTAL_PASSWORD")]
    MissingPassword,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("not signed in; log in first (redirect to {0})")]
    Redirect(String),
}

#[derive(Parser, Debug)]
#[command(name = "tars-portal", about = "Member portal session CLI")]
struct Cli {
    /// Overrides PORTAL_API_BASE_URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Session file; implies file storage.
    #[arg(long)]
    storage_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long, env = "PORTAL_USERNAME")]
        username: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    Logout,
    /// Show the restored session and what the route guard would do.
    Status,
    /// Re-fetch the signed-in user's profile.
    Profile,
    /// Mint a new access token from the stored refresh token.
    Refresh,
    /// Load the member portal (classes and resources).
    Portal,
    /// Record a resource download and print its link.
    Download {
        resource_id: i64,
    },
    /// Authenticated request against an arbitrary API path.
    Fetch {
        path: String,
        #[arg(long, value_enum, default_value_t = HttpMethod::Get)]
        method: HttpMethod,
        #[arg(long)]
        data: Option<String>,
    },
    Health,
    Info,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::Get,
            HttpMethod::Post => Method::Post,
            HttpMethod::Put => Method::Put,
            HttpMethod::Patch => Method::Patch,
            HttpMethod::Delete => Method::Delete,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = PortalConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.api_base_url = base_url.trim().trim_end_matches('/').to_owned();
    }
    if let Some(path) = cli.storage_path {
        config.storage = StorageKind::File(path);
    }

    let client = AuthClient::from_config(&config)?;
    let gate = SessionGate::new(client.clone(), config.restore_timeout());
    let guard = RouteGuard::new(config.login_path.clone());
    gate.restore().await;

    match cli.command {
        Command::Login { username, password } => {
            let password = password.ok_or(CliError::MissingPassword)?;
            let response = gate.login(&Credentials::new(username, password)).await?;
            print_json(&json!({
                "message": response.message,
                "display_name": response.user.display_name(),
                "user": response.user,
            }))
        }
        Command::Logout => {
            gate.logout().await?;
            print_json(&json!({ "logged_out": true }))
        }
        Command::Status => {
            let snapshot = gate.snapshot();
            let tokens_stored = client.store().tokens().await?.is_some();
            print_json(&json!({
                "display_name": snapshot.user.as_ref().map(UserProfile::display_name),
                "session": snapshot,
                "route": guard.decide(&snapshot),
                "status": client.status(),
                "tokens_stored": tokens_stored,
            }))
        }
        Command::Profile => {
            admit(&guard, &gate).await?;
            let user = gate.refresh_profile().await?;
            print_json(&user)
        }
        Command::Refresh => {
            client.refresh_token().await?;
            print_json(&json!({ "refreshed": true }))
        }
        Command::Portal => {
            admit(&guard, &gate).await?;
            let loader = portal_loader(&client, &config);
            match loader.load().await {
                PortalView::Redirect(to) => Err(CliError::Redirect(to)),
                PortalView::Ready(page) => print_json(&page),
            }
        }
        Command::Download { resource_id } => {
            admit(&guard, &gate).await?;
            let loader = portal_loader(&client, &config);
            let mut page = match loader.load().await {
                PortalView::Redirect(to) => return Err(CliError::Redirect(to)),
                PortalView::Ready(page) => page,
            };
            let url = loader.track_download(&mut page, resource_id).await;
            let count = page.resource(resource_id).map(|r| r.download_count);
            print_json(&json!({ "resource_id": resource_id, "url": url, "download_count": count }))
        }
        Command::Fetch { path, method, data } => {
            admit(&guard, &gate).await?;
            let mut request = ApiRequest::new(method.into(), path);
            if let Some(raw) = data {
                request = request.with_body(serde_json::from_str(&raw)?);
            }
            let response = client.fetch_with_auth(&request).await?;
            let body = serde_json::from_str::<Value>(&response.body).unwrap_or(Value::String(response.body));
            print_json(&json!({ "status": response.status, "body": body }))
        }
        Command::Health => print_json(&PortalApi::new(client).health().await?),
        Command::Info => print_json(&PortalApi::new(client).info().await?),
    }
}

async fn admit(guard: &RouteGuard, gate: &SessionGate) -> Result<(), CliError> {
    match guard.wait_for_admission(gate).await {
        Admission::Admit => Ok(()),
        Admission::Redirect(to) => Err(CliError::Redirect(to)),
        Admission::Pending => Err(CliError::Redirect(guard.login_path().to_owned())),
    }
}

fn portal_loader(client: &AuthClient, config: &PortalConfig) -> PortalLoader {
    PortalLoader::new(PortalApi::new(client.clone()), config.api_base_url.clone(), config.login_path.clone())
        .with_fallback(config.restore_timeout())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dojo-Auth command-line client
//!
//! Signs in to the dojo API, keeps the session in a local file, and runs
//! the same guard checks the website uses.

use clap::{Args, Parser, Subcommand, ValueEnum};
use dojo_auth::{
    config::Config,
    error::{AuthError, DEFAULT_ERROR_MESSAGE},
    guards::{self, Guard, PrivilegeRequirement, RouteRequest},
    models::{
        AdminLoginCredentials, LoginCredentials, NewAdminUser, Privilege, Registration, Role,
    },
    services::Navigator,
    AppState,
};
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "dojo-auth", about = "Dojo website session client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in as a regular user
    Login(LoginArgs),
    /// Sign in as an administrator
    LoginAdmin(AdminLoginArgs),
    /// Create an account and sign in
    Register(RegisterArgs),
    /// Verify the stored session and print the current user
    Whoami,
    /// Refresh the stored profile from the API
    Profile,
    /// Exchange the session token for a fresh one
    Refresh,
    /// Close the session
    Logout,
    /// Manage admin users
    Users(UsersCommand),
    /// Evaluate a route guard against the stored session
    CheckRoute(CheckRouteArgs),
}

#[derive(Args, Debug)]
struct LoginArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "DOJO_PASSWORD")]
    password: String,
}

#[derive(Args, Debug)]
struct AdminLoginArgs {
    #[command(flatten)]
    login: LoginArgs,
    /// Second factor code
    #[arg(long)]
    code: Option<String>,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long, env = "DOJO_PASSWORD")]
    password: String,
    #[arg(long)]
    confirm_password: String,
    #[arg(long)]
    age: Option<u8>,
    #[arg(long)]
    phone: Option<String>,
}

#[derive(Args, Debug)]
struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Subcommand, Debug)]
enum UsersSubcommand {
    /// List registered users
    List,
    /// Create an admin or webmaster account
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, value_parser = parse_role)]
        role: Role,
    },
}

#[derive(Args, Debug)]
struct CheckRouteArgs {
    /// Requested URL
    url: String,
    #[arg(long, value_enum, default_value_t = GuardKind::Auth)]
    guard: GuardKind,
    /// Required privilege (repeatable, privilege guard only)
    #[arg(long = "privilege", value_parser = parse_privilege)]
    privileges: Vec<Privilege>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GuardKind {
    Auth,
    Admin,
    SuperAdmin,
    Privilege,
    NoAuth,
}

impl GuardKind {
    fn guard(self) -> Guard {
        match self {
            GuardKind::Auth => guards::auth_guard,
            GuardKind::Admin => guards::admin_guard,
            GuardKind::SuperAdmin => guards::super_admin_guard,
            GuardKind::Privilege => guards::privilege_guard,
            GuardKind::NoAuth => guards::no_auth_guard,
        }
    }
}

fn parse_role(raw: &str) -> Result<Role, String> {
    raw.parse()
}

fn parse_privilege(raw: &str) -> Result<Privilege, String> {
    raw.parse()
}

/// Reports navigation requests; a terminal has nowhere to go.
struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, path: &str) {
        tracing::info!(path, "Navigation requested");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<AuthError>() {
                Some(auth_err) => eprintln!(
                    "error ({:?}): {}",
                    auth_err.kind(),
                    auth_err.user_message(DEFAULT_ERROR_MESSAGE)
                ),
                None => eprintln!("error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing::debug!(api_url = %config.api_url, session_file = %config.session_file.display(), "Configuration loaded");

    let state = AppState::new(config, Arc::new(LogNavigator))?;
    let auth = &state.auth;

    match cli.command {
        Command::Login(args) => {
            let credentials = LoginCredentials {
                email: args.email,
                password: args.password,
            };
            let response = auth.login(&credentials).await?;
            print_json(&response.user)?;
        }
        Command::LoginAdmin(args) => {
            let credentials = AdminLoginCredentials {
                email: args.login.email,
                password: args.login.password,
                two_factor_code: args.code,
            };
            let response = auth.login_admin(&credentials).await?;
            print_json(&response.admin)?;
        }
        Command::Register(args) => {
            let data = Registration {
                name: args.name,
                email: args.email,
                password: args.password,
                confirm_password: args.confirm_password,
                age: args.age,
                phone: args.phone,
            };
            let response = auth.register(&data).await?;
            print_json(&response.user)?;
        }
        Command::Whoami => {
            restore(&state).await?;
            match auth.current_user() {
                Some(user) => print_json(&user)?,
                None => println!("not signed in"),
            }
        }
        Command::Profile => {
            restore(&state).await?;
            auth.fetch_profile().await?;
            print_json(&auth.current_user())?;
        }
        Command::Refresh => {
            restore(&state).await?;
            auth.refresh_token().await?;
            println!("token refreshed");
        }
        Command::Logout => {
            auth.logout();
            println!("signed out");
        }
        Command::Users(users) => {
            restore(&state).await?;
            match users.command {
                UsersSubcommand::List => {
                    let list = state.admin.list_users().await?;
                    print_json(&list)?;
                }
                UsersSubcommand::Create {
                    name,
                    email,
                    password,
                    role,
                } => {
                    let created = state
                        .admin
                        .create_admin_user(&NewAdminUser {
                            name,
                            email,
                            password,
                            role,
                        })
                        .await?;
                    print_json(&created.user)?;
                }
            }
        }
        Command::CheckRoute(args) => {
            restore(&state).await?;
            let mut route = RouteRequest::new(args.url);
            if !args.privileges.is_empty() {
                route = route.with_privilege(PrivilegeRequirement::All(args.privileges));
            }

            let outcome = (args.guard.guard())(&auth.snapshot(), &route);
            match outcome.redirect() {
                None => println!("proceed"),
                Some(redirect) => println!("redirect {}", redirect.to_url()),
            }
        }
    }

    Ok(())
}

/// Load the persisted session and wait for its verification.
async fn restore(state: &AppState) -> anyhow::Result<()> {
    if let Some(verification) = state.auth.restore_session() {
        verification.await?;
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize logging on stderr (JSON when `DOJO_LOG_FORMAT=json`).
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("dojo_auth=debug,info"));

    let json = std::env::var("DOJO_LOG_FORMAT").is_ok_and(|f| f == "json");
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

use std::sync::Arc;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vendex_core::MIGRATOR;
use vendex_core::auth::{
    AuthCrypto, AuthService, TokenCodec, ensure_default_roles,
};
use vendex_core::mailer::{HttpMailer, LogMailer, Mailer};
use vendex_core::store::ports::{
    ConfirmationTokenStore, IssuedTokenStore, RoleStore, UserStore,
};
use vendex_core::store::{
    PgConfirmationTokenStore, PgIssuedTokenStore, PgRoleStore, PgUserStore,
};

use vendex_server::{AppState, create_app, infra::config::Config};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "vendex-server")]
#[command(
    about = "User registration and authentication service for the Vendex platform"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(subcommand)]
    Db(DbCommand),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(command) = cli.command {
        match command {
            Command::Db(DbCommand::Migrate) => {
                run_db_migrate(&cli.serve).await?;
                return Ok(());
            }
        }
    }

    run_server(cli.serve).await
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<Config> {
    let mut config =
        Config::from_env().context("failed to load configuration")?;

    if let Some(port) = args.port {
        config.server_port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server_host = host;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(config)
}

async fn connect_database(config: &Config) -> anyhow::Result<PgPool> {
    let database_url = config.database_url.as_deref().ok_or_else(|| {
        error!("DATABASE_URL must be provided for PostgreSQL connections");
        anyhow::anyhow!("No PostgreSQL connection configuration found")
    })?;

    if !(database_url.starts_with("postgres://")
        || database_url.starts_with("postgresql://"))
    {
        error!("Only PostgreSQL database URLs are supported");
        anyhow::bail!(
            "Invalid database URL: must start with postgres:// or postgresql://"
        );
    }

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("failed to connect to PostgreSQL")?;

    info!("Successfully connected to PostgreSQL");
    Ok(pool)
}

async fn run_db_migrate(args: &ServeArgs) -> anyhow::Result<()> {
    let config = load_runtime_config(args)?;
    let pool = connect_database(&config).await?;

    MIGRATOR
        .run(&pool)
        .await
        .context("database migration failed")?;
    info!("Database migrations applied successfully");
    Ok(())
}

async fn wire_app_resources(
    config: Arc<Config>,
    pool: PgPool,
) -> anyhow::Result<AppState> {
    MIGRATOR
        .run(&pool)
        .await
        .context("database migration failed")?;
    info!("Database schema initialized successfully");

    let crypto = Arc::new(
        AuthCrypto::new(
            config.auth_password_pepper.as_bytes(),
            config.auth_token_digest_key.as_bytes(),
        )
        .context("failed to initialize authentication crypto helpers")?,
    );
    let codec = Arc::new(
        TokenCodec::new(&config.auth_token_secret)
            .context("AUTH_TOKEN_SECRET must be valid base64")?,
    );

    let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool.clone()));
    let roles: Arc<dyn RoleStore> = Arc::new(PgRoleStore::new(pool.clone()));
    let issued_tokens: Arc<dyn IssuedTokenStore> =
        Arc::new(PgIssuedTokenStore::new(pool.clone()));
    let confirmation_tokens: Arc<dyn ConfirmationTokenStore> =
        Arc::new(PgConfirmationTokenStore::new(pool));

    ensure_default_roles(roles.as_ref())
        .await
        .context("failed to seed default roles")?;

    let mailer: Arc<dyn Mailer> = match config.mail_gateway_url.as_deref() {
        Some(gateway_url) => {
            Arc::new(HttpMailer::new(gateway_url, config.mail_from.clone()))
        }
        None => {
            warn!(
                "MAIL_GATEWAY_URL not set - verification emails will only be logged"
            );
            Arc::new(LogMailer)
        }
    };

    let auth_service = Arc::new(AuthService::new(
        users,
        roles,
        issued_tokens,
        confirmation_tokens,
        crypto,
        codec,
        mailer,
        config.app_base_url.clone(),
    ));

    Ok(AppState::new(auth_service, config))
}

async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let config = Arc::new(load_runtime_config(&args)?);
    let pool = connect_database(&config).await?;
    let state = wire_app_resources(Arc::clone(&config), pool).await?;

    let app = create_app(state);

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Starting Vendex server on {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use pcx_api::{
    auth::{AuthConfig, AuthService},
    config::{self, AppConfig},
    db::{self, DbPool},
    services::accounts::{AccountService, RegisterInput},
};
use serde::Serialize;
use tracing::debug;

#[derive(Parser)]
#[command(name = "pcx", about = "PCX marketplace administration", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate,
    /// Create a staff identity
    CreateStaff(StaffArgs),
    /// Grant staff rights to an existing identity
    PromoteStaff(PromoteArgs),
    /// Register a customer or vendor account
    Register(RegisterArgs),
}

#[derive(Args)]
struct StaffArgs {
    username: String,
    password: String,
}

#[derive(Args)]
struct PromoteArgs {
    username: String,
}

#[derive(Args)]
struct RegisterArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    password: String,
    #[arg(long, default_value = "customer", help = "customer or vendor")]
    kind: String,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    mobile: Option<String>,
    #[arg(long)]
    address: Option<String>,
}

#[derive(Serialize)]
struct StaffSummary {
    id: uuid::Uuid,
    username: String,
    is_staff: bool,
}

struct CliContext {
    db: Arc<DbPool>,
    config: AppConfig,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load configuration")?;
        config::init_tracing(config.log_level(), false);
        debug!("connecting to {}", config.database_url);
        let db = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;
        Ok(Self {
            db: Arc::new(db),
            config,
        })
    }

    fn accounts(&self) -> AccountService {
        let auth = Arc::new(AuthService::new(
            AuthConfig::from(&self.config),
            self.db.clone(),
        ));
        AccountService::new(self.db.clone(), auth)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize().await?;

    match cli.command {
        Commands::Migrate => {
            db::run_migrations(&context.db)
                .await
                .context("migration failed")?;
            println!("Migrations applied");
        }
        Commands::CreateStaff(args) => {
            let user = context
                .accounts()
                .create_staff(&args.username, &args.password)
                .await
                .context("failed to create staff user")?;
            render(
                cli.json,
                &StaffSummary {
                    id: user.id,
                    username: user.username.clone(),
                    is_staff: user.is_staff,
                },
                || format!("Staff user {} created (id {})", user.username, user.id),
            )?;
        }
        Commands::PromoteStaff(args) => {
            let user = context
                .accounts()
                .promote_staff(&args.username)
                .await
                .context("failed to promote user")?;
            render(
                cli.json,
                &StaffSummary {
                    id: user.id,
                    username: user.username.clone(),
                    is_staff: user.is_staff,
                },
                || format!("{} is now staff", user.username),
            )?;
        }
        Commands::Register(args) => {
            let account = context
                .accounts()
                .register(RegisterInput {
                    username: Some(args.username),
                    password: Some(args.password),
                    registration_type: Some(args.kind),
                    email: args.email,
                    mobile: args.mobile,
                    address: args.address,
                })
                .await
                .context("registration failed")?;
            render(cli.json, &account, || {
                format!("{} (user {})", account.message, account.user_id)
            })?;
        }
    }

    Ok(())
}

fn render<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use url::Url;
use user_crud::config::{load_settings, Settings};
use user_crud::domain::{User, UserUpdate};
use user_crud::framework::{Engine, QueryParams};
use user_crud::query::QueryClient;
use user_crud::runtime::{setup_tracing, ApiSystem};
use user_crud::screen::{ListView, UserListScreen};
use user_crud::seed::run_seed;
use user_crud::validation::{validate, Field, FieldErrors, UserDraft};

#[derive(Parser, Debug)]
#[command(name = "user-crud", about = "User records over a mock REST API")]
struct Cli {
    /// Base URL of the API (overrides settings).
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the mock API from the JSON database.
    Serve {
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Write COUNT generated users to the database file.
    Seed {
        count: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List users.
    List {
        /// `asc` or `desc` by creation time.
        #[arg(long)]
        order: Option<String>,
    },
    Get {
        id: String,
    },
    Create {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        gender: String,
        #[arg(long)]
        age: String,
    },
    /// Change the given fields of a user.
    Update {
        id: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        age: Option<String>,
    },
    Delete {
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();

    let cli = Cli::parse();
    let mut settings = load_settings()?;
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }

    match cli.command {
        Command::Serve { bind, db } => {
            if let Some(bind) = bind {
                settings.bind_addr = bind;
            }
            if let Some(db) = db {
                settings.db_path = db;
            }
            serve(&settings).await?;
        }
        Command::Seed { count, output } => {
            let output = output.unwrap_or(settings.seed_output);
            let written = run_seed(&count, &output)?;
            println!("Wrote {written} users to {}", output.display());
        }
        Command::List { order } => {
            let order = order.unwrap_or(settings.list_order.clone());
            list(&settings, &order).await?;
        }
        Command::Get { id } => {
            let user = engine(&settings)?.fetch(&id, &QueryParams::new()).await?;
            print_json(&user)?;
        }
        Command::Create {
            first_name,
            last_name,
            gender,
            age,
        } => {
            let draft = UserDraft {
                first_name,
                last_name,
                gender,
                age,
            };
            let data = checked(validate(&draft))?;
            let user = engine(&settings)?.create(&data).await?;
            print_json(&user)?;
        }
        Command::Update {
            id,
            first_name,
            last_name,
            gender,
            age,
        } => {
            let engine = engine(&settings)?;
            let current = engine.fetch(&id, &QueryParams::new()).await?;
            let mut draft = UserDraft::from_user(&current);
            for (field, value) in [
                (Field::FirstName, first_name),
                (Field::LastName, last_name),
                (Field::Gender, gender),
                (Field::Age, age),
            ] {
                if let Some(value) = value {
                    draft.set(field, value);
                }
            }
            let data = checked(validate(&draft))?;
            let changes = UserUpdate::from_changes(&current, &data);
            if changes.is_empty() {
                println!("Nothing to update");
                return Ok(());
            }
            let user = engine.update(&id, &changes).await?;
            print_json(&user)?;
        }
        Command::Delete { id } => {
            let receipt = engine(&settings)?.delete(&id).await?;
            println!("{}", receipt.status);
        }
    }

    Ok(())
}

async fn serve(settings: &Settings) -> Result<()> {
    let system = ApiSystem::start(settings).await?;
    info!(url = %system.base_url(), db = %settings.db_path.display(), "Serving");
    system
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

async fn list(settings: &Settings, order: &str) -> Result<()> {
    let client = Arc::new(QueryClient::new(Arc::new(engine(settings)?)));
    let screen = UserListScreen::new(client, order);
    screen.mount().await?;

    match screen.view() {
        ListView::Table(rows) => {
            println!("{:<38} {:<7} {:<20} {:<20} {:>3}", "ID", "GENDER", "FIRST NAME", "LAST NAME", "AGE");
            for row in rows {
                println!(
                    "{:<38} {:<7} {:<20} {:<20} {:>3}",
                    row.id, row.gender, row.first_name, row.last_name, row.age
                );
            }
        }
        ListView::Empty => println!("No users yet"),
        ListView::Loading | ListView::Error => bail!("users could not be loaded"),
    }
    Ok(())
}

fn engine(settings: &Settings) -> Result<Engine<User>> {
    let base = Url::parse(&settings.api_url)
        .with_context(|| format!("invalid api_url `{}`", settings.api_url))?;
    Ok(Engine::new(base, "users"))
}

fn checked<T>(result: Result<T, FieldErrors>) -> Result<T> {
    result.or_else(|errors| {
        for error in errors.values() {
            eprintln!("{}: {}", error.field, error.message);
        }
        bail!("{} invalid field(s); nothing was sent", errors.len())
    })
}

fn print_json(user: &User) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(user)?);
    Ok(())
}

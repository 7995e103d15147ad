use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warbler_server::db::{
    seed::{seed_demo_data, SeedSummary, DEMO_PASSWORD},
    Database,
};

/// Warbler Database Utility
///
/// Creates, seeds, empties and inspects the Warbler SQLite database.
#[derive(Parser, Debug)]
#[command(name = "warbler-migrate")]
#[command(about = "Set up and maintain the Warbler database", long_about = None)]
struct Args {
    /// Database to operate on (`sqlite://path`, `sqlite::memory:` or a file path)
    #[arg(
        short,
        long,
        env = "DATABASE_URL",
        default_value = "sqlite://warbler.db",
        global = true
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Create any missing tables and indexes
    Init,
    /// Create the schema and add demo users, messages, follows and likes
    Seed,
    /// Delete every row from every table
    Reset {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Verify the schema and print row counts
    Check,
}

fn connect_database(url: &str) -> Result<Database> {
    println!("Connecting to database: {}", url);
    let db = Database::new(url).context("Failed to open database")?;
    db.initialize().context("Failed to create schema")?;
    println!("Database connection successful - schema ready");
    Ok(db)
}

fn display_counts(db: &Database) -> Result<()> {
    println!();
    println!("Table row counts");
    println!("================");
    for (table, count) in db.table_counts()? {
        println!("  {:<10} {}", table, count);
    }
    Ok(())
}

fn display_seed_summary(summary: &SeedSummary) {
    println!();
    if *summary == SeedSummary::default() {
        println!("Database already has users - demo data not added.");
        return;
    }
    println!("Seed Summary");
    println!("============");
    println!("Users: {}", summary.users);
    println!("Messages: {}", summary.messages);
    println!("Follows: {}", summary.follows);
    println!("Likes: {}", summary.likes);
    println!();
    println!("Every demo user's password is '{}'.", DEMO_PASSWORD);
}

fn confirm(prompt: &str) -> Result<bool> {
    println!("{} (y/N): ", prompt);
    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .context("Failed to read confirmation")?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn run(command: &Command, db: &Database) -> Result<()> {
    match command {
        Command::Init => {
            println!("Schema is up to date.");
        }
        Command::Seed => {
            let summary = seed_demo_data(db)?;
            display_seed_summary(&summary);
        }
        Command::Reset { yes } => {
            let prompt = "This will delete ALL users, messages, follows and likes. Continue?";
            if !yes && !confirm(prompt)? {
                println!("Reset cancelled.");
                return Ok(());
            }
            db.reset()?;
            println!("All tables emptied.");
        }
        Command::Check => display_counts(db)?,
    }
    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warbler_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    println!("Warbler Database Utility");
    println!("========================");
    println!();

    let db = connect_database(&args.database_url)?;
    run(&args.command, &db)?;
    tracing::debug!("{:?} finished", args.command);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_db() -> Database {
        connect_database("sqlite::memory:").expect("Failed to create in-memory database")
    }

    #[test]
    fn test_parse_subcommands() {
        let args = Args::try_parse_from(["warbler-migrate", "reset", "--yes"]).unwrap();
        assert_eq!(args.command, Command::Reset { yes: true });

        let args = Args::try_parse_from([
            "warbler-migrate",
            "check",
            "--database-url",
            "sqlite::memory:",
        ])
        .unwrap();
        assert_eq!(args.command, Command::Check);
        assert_eq!(args.database_url, "sqlite::memory:");

        assert!(Args::try_parse_from(["warbler-migrate", "upgrade"]).is_err());
    }

    #[test]
    fn test_seed_then_reset() {
        let db = memory_db();

        run(&Command::Seed, &db).unwrap();
        let counts = db.table_counts().unwrap();
        assert!(counts.iter().any(|(table, count)| *table == "users" && *count > 0));

        run(&Command::Reset { yes: true }, &db).unwrap();
        assert!(db.table_counts().unwrap().iter().all(|(_, count)| *count == 0));
    }

    #[test]
    fn test_init_and_check_on_empty_database() {
        let db = memory_db();
        run(&Command::Init, &db).unwrap();
        run(&Command::Check, &db).unwrap();
    }
}

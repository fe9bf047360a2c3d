//! Create an ADMIN account directly in the database.
//!
//! Usage: create-admin <EMAIL> <PASSWORD> [DISPLAY NAME]

use portfolio_cms::config::{AdminSeed, AppConfig};
use portfolio_cms::db::{self, PgStore};
use portfolio_cms::seed::{seed_admin, SeedOutcome};
use std::env;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().skip(1).collect();
    let (email, password) = match (args.first(), args.get(1)) {
        (Some(email), Some(password)) => (email.clone(), password.clone()),
        _ => {
            eprintln!("Usage: create-admin <EMAIL> <PASSWORD> [DISPLAY NAME]");
            std::process::exit(1);
        }
    };
    let display_name = if args.len() > 2 {
        args[2..].join(" ")
    } else {
        "Administrator".to_string()
    };

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    let Some(db_config) = config.database.as_ref() else {
        eprintln!("DATABASE_URL must be set");
        std::process::exit(1);
    };

    let pool = match db::init_pool(db_config).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Could not connect to database: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = db::run_migrations(&pool).await {
        eprintln!("Migrations failed: {}", e);
        std::process::exit(1);
    }

    let store = PgStore::new(pool);
    let seed = AdminSeed {
        email,
        password,
        display_name,
    };

    match seed_admin(&store, &seed, config.bcrypt_cost).await {
        Ok(SeedOutcome::Created(user)) => {
            println!("\nAdmin created");
            println!("Email : {}", user.email);
            println!("Name  : {}", user.display_name);
            println!("Id    : {}\n", user.id);
        }
        Ok(SeedOutcome::AlreadyExists(user)) => {
            println!("A user with email {} already exists ({})", user.email, user.role);
        }
        Err(e) => {
            eprintln!("Error creating admin: {}", e);
            std::process::exit(1);
        }
    }
}

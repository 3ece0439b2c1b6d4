//! CLI tool to manage user accounts.
//!
//! Usage:
//!   cargo run --bin manage-users -- list
//!   cargo run --bin manage-users -- create-admin --email <email> --password <password> \
//!       --first-name <name> --last-name <name>
//!   cargo run --bin manage-users -- backfill-companies

use std::env;

use handi_lib::auth::hash_password;
use handi_lib::config::Config;
use handi_lib::db::DbPool;
use handi_lib::db::users::NewUser;
use handi_lib::models::Role;
use handi_lib::models::user::MIN_PASSWORD_LENGTH;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let command = &args[1];
    if matches!(command.as_str(), "help" | "--help" | "-h") {
        print_usage();
        return;
    }

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match DbPool::new(&config).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error connecting to database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = pool.run_migrations().await {
        eprintln!("Error running migrations: {}", e);
        std::process::exit(1);
    }

    match command.as_str() {
        "list" | "ls" => list_users(&pool).await,
        "create-admin" => create_admin(&pool, &args).await,
        "backfill-companies" => backfill_companies(&pool).await,
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            std::process::exit(1);
        }
    }
}

/// Value following `--name`, if present.
fn flag_value(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .skip(2)
        .position(|a| a == name)
        .and_then(|i| args.get(i + 3))
        .cloned()
}

fn required_flag(args: &[String], name: &str) -> String {
    match flag_value(args, name) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => {
            eprintln!("Error: {} is required", name);
            std::process::exit(1);
        }
    }
}

async fn list_users(pool: &DbPool) {
    let users = match pool.list_users().await {
        Ok(u) => u,
        Err(e) => {
            eprintln!("Error listing users: {}", e);
            std::process::exit(1);
        }
    };

    if users.is_empty() {
        println!("No users found.");
        return;
    }

    println!();
    println!(
        "{:<36} {:<32} {:<24} {:<10} {:<36}",
        "ID", "EMAIL", "NAME", "ROLE", "COMPANY"
    );
    println!("{}", "-".repeat(142));

    for user in users {
        let mut name = user.full_name();
        if name.chars().count() > 22 {
            name = format!("{}...", name.chars().take(19).collect::<String>());
        }
        let company = user
            .company_id
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<36} {:<32} {:<24} {:<10} {:<36}",
            user.id, user.email, name, user.role, company
        );
    }
    println!();
}

async fn create_admin(pool: &DbPool, args: &[String]) {
    let email = required_flag(args, "--email").to_lowercase();
    let password = required_flag(args, "--password");
    let first_name = required_flag(args, "--first-name");
    let last_name = required_flag(args, "--last-name");

    if !email.contains('@') {
        eprintln!("Error: '{}' is not a valid email address", email);
        std::process::exit(1);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        eprintln!(
            "Error: password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        );
        std::process::exit(1);
    }

    let password_hash = match hash_password(&password) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            std::process::exit(1);
        }
    };

    let new_user = NewUser {
        email,
        password_hash,
        first_name,
        last_name,
        role: Role::Admin,
        company_id: None,
    };

    match pool.insert_user(new_user).await {
        Ok(user) => {
            println!();
            println!("Admin account created.");
            println!();
            println!("  ID:    {}", user.id);
            println!("  Email: {}", user.email);
            println!("  Name:  {}", user.full_name());
            println!();
        }
        Err(e) => {
            eprintln!("Error creating admin: {}", e);
            std::process::exit(1);
        }
    }
}

async fn backfill_companies(pool: &DbPool) {
    match pool.backfill_recruiter_companies().await {
        Ok(0) => println!("Every recruiter with offers already has a company."),
        Ok(n) => println!("Attached {} recruiter(s) to the company of their latest offer.", n),
        Err(e) => {
            eprintln!("Error backfilling companies: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!(
        r#"
Handi User Management

USAGE:
    manage-users <COMMAND> [OPTIONS]

COMMANDS:
    list, ls              List all accounts
    create-admin          Create an ADMIN account
    backfill-companies    Attach recruiters without a company to their latest offer's company
    help                  Show this help message

OPTIONS (create-admin):
    --email <EMAIL>            Login email (stored lowercase)
    --password <PASSWORD>      At least {} characters
    --first-name <NAME>        First name
    --last-name <NAME>         Last name

ENVIRONMENT:
    RUST_ENV         Required: 'development' or 'production'
    DATABASE_URL     Database connection string

EXAMPLES:
    # List accounts
    manage-users list

    # Create the first administrator
    manage-users create-admin --email admin@handi.fr --password 'change-me-now' \
        --first-name Ada --last-name Admin
"#,
        MIN_PASSWORD_LENGTH
    );
}

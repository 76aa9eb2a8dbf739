//! # Seed Data Generator
//!
//! Populates the database with staff, customers and trips for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./tripdesk_dev.db with 40 customers (default)
//! cargo run -p tripdesk-db --bin seed
//!
//! # Custom amount
//! cargo run -p tripdesk-db --bin seed -- --count 200
//!
//! # Specify database path
//! cargo run -p tripdesk-db --bin seed -- --db ./data/tripdesk.db
//! ```
//!
//! ## Generated Data
//! - One admin, one operations user and three sales users (150.00 to 250.00
//!   per head)
//! - One trip per destination, departing a month apart
//! - Customers named from a fixed list, each with a unique email

use chrono::{Duration, NaiveDate};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tripdesk_core::{NewCustomer, NewTrip, NewUser, UserRole};
use tripdesk_db::{Database, DbConfig};

/// (code prefix, name, destination, base price in major units, nights)
const TRIPS: &[(&str, &str, &str, i64, i64)] = &[
    ("IST", "Istanbul Highlights", "Istanbul", 10_000, 7),
    ("CAP", "Cappadocia Balloons", "Nevsehir", 12_500, 4),
    ("ANT", "Antalya Coast", "Antalya", 9_000, 10),
    ("BOD", "Bodrum Sailing", "Bodrum", 15_000, 7),
    ("EPH", "Ephesus and Pamukkale", "Izmir", 8_500, 5),
    ("TRB", "Black Sea Plateaus", "Trabzon", 11_000, 6),
];

const SALES: &[(&str, i64)] = &[
    ("Ayla Sahin", 15_000),
    ("Berk Aydin", 20_000),
    ("Cem Ozturk", 25_000),
];

const FIRST_NAMES: &[&str] = &[
    "Deniz", "Elif", "Mert", "Zeynep", "Emre", "Selin", "Burak", "Ece", "Kaan", "Derya",
];

const LAST_NAMES: &[&str] = &[
    "Yilmaz", "Kaya", "Demir", "Celik", "Sahin", "Yildiz", "Arslan", "Dogan",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 40;
    let mut db_path = String::from("./tripdesk_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(40);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("TripDesk Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of customers to generate (default: 40)");
                println!("  -d, --db <PATH>    Database file path (default: ./tripdesk_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(database = %db_path, customers = count, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.customers().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has customers, skipping seed");
        return Ok(());
    }

    // Staff
    db.users()
        .insert(&NewUser {
            name: "Office Admin".to_string(),
            email: "admin@agency.example".to_string(),
            role: UserRole::Admin,
            commission_per_head_cents: None,
        })
        .await?;
    db.users()
        .insert(&NewUser {
            name: "Operations Desk".to_string(),
            email: "ops@agency.example".to_string(),
            role: UserRole::Operations,
            commission_per_head_cents: None,
        })
        .await?;
    for (name, rate) in SALES {
        let local = name.split_whitespace().next().unwrap_or(*name).to_lowercase();
        db.users()
            .insert(&NewUser {
                name: name.to_string(),
                email: format!("{local}@agency.example"),
                role: UserRole::Sales,
                commission_per_head_cents: Some(*rate),
            })
            .await?;
    }
    info!(staff = SALES.len() + 2, "Staff created");

    // Trips
    let first_departure = NaiveDate::from_ymd_opt(2026, 5, 1).ok_or("invalid seed date")?;
    for (idx, (prefix, name, destination, price, nights)) in TRIPS.iter().enumerate() {
        let departure = first_departure + Duration::days(30 * idx as i64);
        let trip = NewTrip {
            code: format!("{prefix}-{}", departure.format("%Y-%m")),
            name: name.to_string(),
            destination: destination.to_string(),
            departure_date: departure,
            return_date: departure + Duration::days(*nights),
            base_price_cents: price * 100,
            capacity: 30,
        };

        if let Err(e) = db.trips().insert(&trip).await {
            warn!(code = %trip.code, error = %e, "Failed to insert trip");
        }
    }
    info!(trips = TRIPS.len(), "Trips created");

    // Customers
    let mut generated = 0;
    for seed in 0..count {
        let first = FIRST_NAMES[seed % FIRST_NAMES.len()];
        let last = LAST_NAMES[(seed / FIRST_NAMES.len()) % LAST_NAMES.len()];

        let customer = NewCustomer {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: Some(format!(
                "{}.{}.{seed}@mail.example",
                first.to_lowercase(),
                last.to_lowercase()
            )),
            phone: Some(format!("+90 555 {:03} {:04}", seed % 1000, seed)),
            ..NewCustomer::default()
        };

        match db.customers().insert(&customer).await {
            Ok(_) => generated += 1,
            Err(e) => warn!(error = %e, "Failed to insert customer"),
        }
    }

    info!(customers = generated, "Seed complete");
    db.close().await;

    Ok(())
}

//! Database seeder for Centime development and testing.
//!
//! Seeds a demo user with the default category tree, three wallets, and a
//! handful of incomes, expenses, and one transfer. Entries go through the
//! repositories, so the seeded wallet balances always equal the incomes
//! booked into them adjusted by the transfer.
//!
//! Usage: cargo run --bin seeder

use std::str::FromStr;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use centime_core::auth::hash_password;
use centime_db::entities::categories;
use centime_db::repositories::{
    CategoryRepository, CreateExpenseInput, CreateIncomeInput, CreateWalletInput,
    ExpenseRepository, IncomeRepository, UserRepository, WalletRepository,
};

/// Demo account email (consistent for all seeds)
const DEMO_EMAIL: &str = "demo@centime.dev";
/// Demo account password
const DEMO_PASSWORD: &str = "demo-password";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = centime_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    let users = UserRepository::new(db.clone());
    if users
        .find_by_email(DEMO_EMAIL)
        .await
        .expect("Failed to query users")
        .is_some()
    {
        println!("  Demo user already exists, skipping...");
        return;
    }

    println!("Seeding demo user...");
    let password_hash = hash_password(DEMO_PASSWORD).expect("Failed to hash demo password");
    let user = users
        .create(DEMO_EMAIL, &password_hash, "Demo User")
        .await
        .expect("Failed to insert demo user");
    println!("  Created demo user: {DEMO_EMAIL} / {DEMO_PASSWORD}");

    println!("Seeding default categories...");
    let count = CategoryRepository::new(db.clone())
        .seed_defaults(user.id)
        .await
        .expect("Failed to seed default categories");
    println!("  Created {count} category groups");

    println!("Seeding wallets...");
    let wallets = WalletRepository::new(db.clone());
    let cash = seed_wallet(&wallets, user.id, "Cash", "💵", true).await;
    let bank = seed_wallet(&wallets, user.id, "Bank Account", "🏦", true).await;
    let savings = seed_wallet(&wallets, user.id, "Savings", "🐖", false).await;

    println!("Seeding incomes...");
    let incomes = IncomeRepository::new(db.clone());
    let salary = category_id_by_name(&db, user.id, "💰 Lương").await;
    let freelance = category_id_by_name(&db, user.id, "Freelance").await;
    let other_income = category_id_by_name(&db, user.id, "💵 Thu nhập khác").await;

    seed_income(&incomes, user.id, salary, Some(bank), "1500.00", "Monthly salary", 20).await;
    seed_income(
        &incomes,
        user.id,
        freelance,
        Some(cash),
        "250.50",
        "Freelance project",
        10,
    )
    .await;
    seed_income(
        &incomes,
        user.id,
        other_income,
        Some(savings),
        "90.00",
        "Birthday gift",
        5,
    )
    .await;

    println!("Transferring 200.00 from Bank Account to Cash...");
    wallets
        .transfer(user.id, bank, cash, Decimal::from_str("200.00").unwrap())
        .await
        .expect("Failed to seed transfer");

    println!("Seeding expenses...");
    let expenses = ExpenseRepository::new(db.clone());
    let family = category_id_by_name(&db, user.id, "🏡 Gia đình").await;
    let health = category_id_by_name(&db, user.id, "❤️ Sức khỏe").await;
    let fun = category_id_by_name(&db, user.id, "🕹️ Giải trí").await;

    seed_expense(&expenses, user.id, family, Some(cash), "45.25", "Groceries", 8).await;
    seed_expense(&expenses, user.id, fun, Some(bank), "12.00", "Cinema", 3).await;
    seed_expense(&expenses, user.id, health, None, "30.00", "Pharmacy", 1).await;

    println!("Seeding complete!");
}

/// Looks up a seeded category by its display name.
async fn category_id_by_name(db: &DatabaseConnection, user_id: Uuid, name: &str) -> Uuid {
    categories::Entity::find()
        .filter(categories::Column::UserId.eq(user_id))
        .filter(categories::Column::Name.eq(name))
        .one(db)
        .await
        .expect("Failed to query categories")
        .unwrap_or_else(|| panic!("Default category missing: {name}"))
        .id
}

async fn seed_wallet(
    repo: &WalletRepository,
    user_id: Uuid,
    name: &str,
    icon: &str,
    included_in_total: bool,
) -> Uuid {
    let wallet = repo
        .create_wallet(CreateWalletInput {
            user_id,
            name: name.to_string(),
            icon: Some(icon.to_string()),
            color: None,
            included_in_total: Some(included_in_total),
        })
        .await
        .unwrap_or_else(|e| panic!("Failed to insert wallet {name}: {e}"));
    println!("  Created wallet: {name}");
    wallet.id
}

async fn seed_income(
    repo: &IncomeRepository,
    user_id: Uuid,
    category_id: Uuid,
    wallet_id: Option<Uuid>,
    amount: &str,
    description: &str,
    days_ago: i64,
) {
    repo.create_income(CreateIncomeInput {
        user_id,
        category_id,
        wallet_id,
        amount: Decimal::from_str(amount).unwrap(),
        description: Some(description.to_string()),
        date: Utc::now().date_naive() - Duration::days(days_ago),
    })
    .await
    .unwrap_or_else(|e| panic!("Failed to insert income {description}: {e}"));
    println!("  Recorded income: {description} ({amount})");
}

async fn seed_expense(
    repo: &ExpenseRepository,
    user_id: Uuid,
    category_id: Uuid,
    wallet_id: Option<Uuid>,
    amount: &str,
    description: &str,
    days_ago: i64,
) {
    repo.create_expense(CreateExpenseInput {
        user_id,
        category_id,
        wallet_id,
        amount: Decimal::from_str(amount).unwrap(),
        description: Some(description.to_string()),
        date: Utc::now().date_naive() - Duration::days(days_ago),
    })
    .await
    .unwrap_or_else(|e| panic!("Failed to insert expense {description}: {e}"));
    println!("  Recorded expense: {description} ({amount})");
}

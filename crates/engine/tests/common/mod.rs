#![allow(dead_code)]

use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};
use uuid::Uuid;

use engine::{Account, Engine, NewAccount, NewTransaction, Transaction, TransactionType};
use migration::MigratorTrait;

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

pub async fn engine_with_file_db() -> (Engine, String, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("reconciler_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();

    (engine, url, path)
}

pub async fn install_failing_trigger(db: &DatabaseConnection, name: &str, event: &str) {
    db.execute_unprepared(&format!(
        "CREATE TRIGGER {name} BEFORE {event} BEGIN SELECT RAISE(ABORT, 'injected failure'); END;"
    ))
    .await
    .unwrap();
}

pub async fn drop_trigger(db: &DatabaseConnection, name: &str) {
    db.execute_unprepared(&format!("DROP TRIGGER {name};"))
        .await
        .unwrap();
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn account(engine: &Engine, name: &str) -> Account {
    engine
        .register_account(NewAccount {
            account_name: name.to_string(),
            account_number: format!("{name}-{}", Uuid::new_v4().simple()),
            bank_name: "First Bank".to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
}

pub fn movement(
    kind: TransactionType,
    account_id: Uuid,
    amount: &str,
    post_date: Option<NaiveDate>,
    value_date: Option<NaiveDate>,
) -> NewTransaction {
    NewTransaction {
        date: post_date.unwrap_or_else(|| date(2024, 1, 1)),
        description: format!("{} {amount}", kind.as_str()),
        amount: amount.parse().unwrap(),
        kind,
        source_account_id: account_id,
        target_account_id: None,
        post_date,
        value_date,
    }
}

pub async fn ingest_one(engine: &Engine, input: NewTransaction) -> Transaction {
    engine
        .ingest_transactions(vec![input])
        .await
        .unwrap()
        .pop()
        .unwrap()
}

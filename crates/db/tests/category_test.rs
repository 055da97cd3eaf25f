//! Integration tests for category seeding, reactivation and deletion.

mod common;

use std::sync::Arc;

use chrono::Utc;
use rust_decimal_macros::dec;
use sana_db::entities::sea_orm_active_enums::CategoryType;
use sana_db::repositories::{
    CategoryError, CategoryRepository, NewTransaction, TransactionError, TransactionRepository,
};
use sana_shared::types::CurrencyCode;

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn test_concurrent_first_requests_seed_once() {
    let db = common::connect().await;
    let user = common::unique_user();
    let repo = CategoryRepository::new(db);
    let lock = Arc::new(tokio::sync::Mutex::new(()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let repo = repo.clone();
            let user = user.clone();
            let lock = Arc::clone(&lock);
            tokio::spawn(async move {
                repo.seed_defaults_if_empty(&user, &CurrencyCode::usd(), &lock)
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut seeded = 0;
    for handle in handles {
        if handle.await.unwrap() {
            seeded += 1;
        }
    }
    assert_eq!(seeded, 1);

    let expense = repo.list(&user, Some(CategoryType::Expense)).await.unwrap();
    let own_expense = expense
        .iter()
        .filter(|c| c.user_id.as_deref() == Some(user.as_str()))
        .count();
    assert_eq!(own_expense, 6);
}

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn test_delete_then_recreate_reactivates_row() {
    let db = common::connect().await;
    let user = common::unique_user();
    let repo = CategoryRepository::new(db.clone());
    let transactions = TransactionRepository::new(db);

    let coffee = repo
        .upsert(&user, &CurrencyCode::usd(), "Coffee", CategoryType::Expense)
        .await
        .unwrap();
    transactions
        .create(
            &user,
            NewTransaction {
                amount: dec!(4.50),
                currency: CurrencyCode::usd(),
                category_id: coffee.id,
                date: Utc::now(),
                note: None,
            },
            &|_: &str, _: &str| rust_decimal::Decimal::ONE,
            &CurrencyCode::usd(),
        )
        .await
        .unwrap();
    assert_eq!(repo.usage_count(&user, coffee.id).await.unwrap(), 1);

    assert_eq!(repo.delete(&user, coffee.id).await.unwrap(), 1);
    assert_eq!(repo.usage_count(&user, coffee.id).await.unwrap(), 0);
    let listed = repo.list(&user, Some(CategoryType::Expense)).await.unwrap();
    assert!(listed.iter().all(|c| c.id != coffee.id));
    assert!(matches!(
        transactions
            .create(
                &user,
                NewTransaction {
                    amount: dec!(3.00),
                    currency: CurrencyCode::usd(),
                    category_id: coffee.id,
                    date: Utc::now(),
                    note: None,
                },
                &|_: &str, _: &str| rust_decimal::Decimal::ONE,
                &CurrencyCode::usd(),
            )
            .await,
        Err(TransactionError::CategoryNotFound(_))
    ));

    let again = repo
        .upsert(&user, &CurrencyCode::usd(), "Coffee", CategoryType::Expense)
        .await
        .unwrap();
    assert_eq!(again.id, coffee.id);
    assert!(again.is_active);
}

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn test_cannot_delete_foreign_category() {
    let db = common::connect().await;
    let owner = common::unique_user();
    let stranger = common::unique_user();
    let repo = CategoryRepository::new(db);

    let rent = repo
        .upsert(&owner, &CurrencyCode::usd(), "Rent", CategoryType::Expense)
        .await
        .unwrap();

    assert!(matches!(
        repo.delete(&stranger, rent.id).await,
        Err(CategoryError::Forbidden(_))
    ));
}

//! Integration tests for the PostgreSQL stores
//!
//! These start a PostgreSQL container and need Docker:
//!
//! ```bash
//! cargo test -p test_utils -- --ignored
//! ```

use std::sync::Arc;

use rust_decimal_macros::dec;

use core_kernel::{Amount, PortError, UserId};
use domain_loyalty::{InsertOutcome, OrderStatus, OrderStore, UserPort, WithdrawOutcome};
use test_utils::{
    assert_newest_first, create_isolated_test_database, OrderNumberFixtures, TemporalFixtures,
    TestDatabase, TestOrderBuilder, TestWithdrawalBuilder, UserFixtures,
};

async fn database() -> TestDatabase {
    create_isolated_test_database()
        .await
        .expect("Failed to start PostgreSQL container")
}

async fn new_user(db: &TestDatabase) -> UserId {
    db.user_store()
        .create_user(&UserFixtures::login(), "$argon2id$test")
        .await
        .unwrap()
        .expect("fresh login")
        .id
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_users_are_unique_by_login() {
    let db = database().await;
    let users = db.user_store();

    let created = users.create_user("alice", "hash").await.unwrap().unwrap();
    assert!(users.create_user("alice", "other").await.unwrap().is_none());

    let found = users.find_user_by_login("alice").await.unwrap().unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(found.password_hash, "hash");
    assert!(users.find_user_by_login("bob").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_order_number_belongs_to_one_user() {
    let db = database().await;
    let store = db.order_store();
    let alice = new_user(&db).await;
    let bob = new_user(&db).await;

    let order = TestOrderBuilder::new().with_owner(alice).build();
    assert_eq!(store.insert_order(&order).await.unwrap(), InsertOutcome::Inserted);

    let stolen = TestOrderBuilder::new().with_owner(bob).build();
    assert_eq!(store.insert_order(&stolen).await.unwrap(), InsertOutcome::Conflict);

    let stored = store.get_order(&order.number).await.unwrap().unwrap();
    assert_eq!(stored.owner, alice);
    assert_eq!(stored.status, OrderStatus::New);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_terminal_orders_are_never_rewritten() {
    let db = database().await;
    let store = db.order_store();
    let alice = new_user(&db).await;

    let mut order = TestOrderBuilder::new().with_owner(alice).build();
    store.insert_order(&order).await.unwrap();

    order.status = OrderStatus::Processed;
    order.accrual = Amount::new(dec!(500));
    store.update_order(&order).await.unwrap();

    order.status = OrderStatus::Invalid;
    order.accrual = Amount::ZERO;
    let err = store.update_order(&order).await.unwrap_err();
    assert!(err.is_conflict(), "unexpected error: {err:?}");

    let stored = store.get_order(&order.number).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Processed);
    assert_eq!(stored.accrual, Amount::new(dec!(500)));

    let missing = TestOrderBuilder::new()
        .with_number(OrderNumberFixtures::valid(1))
        .with_owner(alice)
        .build();
    assert!(matches!(
        store.update_order(&missing).await,
        Err(PortError::NotFound { .. })
    ));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_pending_selection_and_listing_order() {
    let db = database().await;
    let store = db.order_store();
    let alice = new_user(&db).await;

    for (i, status) in [
        OrderStatus::New,
        OrderStatus::Processing,
        OrderStatus::Processed,
        OrderStatus::Invalid,
        OrderStatus::New,
    ]
    .into_iter()
    .enumerate()
    {
        let mut builder = TestOrderBuilder::new()
            .with_number(OrderNumberFixtures::valid(i))
            .with_owner(alice)
            .uploaded_at(TemporalFixtures::minutes_later(i as i64));
        builder = if status == OrderStatus::Processed {
            builder.processed(dec!(10))
        } else {
            builder.with_status(status)
        };
        store.insert_order(&builder.build()).await.unwrap();
    }

    let pending = store.list_orders_pending_reconciliation(10).await.unwrap();
    let numbers: Vec<_> = pending.iter().map(|o| o.number.clone()).collect();
    assert_eq!(
        numbers,
        vec![
            OrderNumberFixtures::valid(0),
            OrderNumberFixtures::valid(1),
            OrderNumberFixtures::valid(4),
        ]
    );

    let limited = store.list_orders_pending_reconciliation(2).await.unwrap();
    assert_eq!(limited.len(), 2);

    let listed = store.list_orders_for_user(alice).await.unwrap();
    assert_eq!(listed.len(), 5);
    assert_newest_first(&listed);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_withdrawal_outcomes() {
    let db = database().await;
    let store = db.order_store();
    let alice = new_user(&db).await;

    let order = TestOrderBuilder::new().with_owner(alice).processed(dec!(500)).build();
    store.insert_order(&order).await.unwrap();

    let too_much = TestWithdrawalBuilder::new().with_owner(alice).with_sum(dec!(500.01)).build();
    assert!(matches!(
        store.insert_withdrawal_checked(&too_much).await.unwrap(),
        WithdrawOutcome::InsufficientFunds { available } if available == Amount::new(dec!(500))
    ));

    let withdrawal = TestWithdrawalBuilder::new().with_owner(alice).with_sum(dec!(120.5)).build();
    match store.insert_withdrawal_checked(&withdrawal).await.unwrap() {
        WithdrawOutcome::Recorded { balance } => {
            assert_eq!(balance.current, Amount::new(dec!(379.5)));
            assert_eq!(balance.withdrawn, Amount::new(dec!(120.5)));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let again = TestWithdrawalBuilder::new().with_owner(alice).with_sum(dec!(1)).build();
    assert_eq!(
        store.insert_withdrawal_checked(&again).await.unwrap(),
        WithdrawOutcome::DuplicateReference
    );

    let history = store.list_withdrawals_for_user(alice).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].sum, Amount::new(dec!(120.5)));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_concurrent_withdrawals_never_overdraw() {
    let db = database().await;
    let store = Arc::new(db.order_store());
    let alice = new_user(&db).await;

    let order = TestOrderBuilder::new().with_owner(alice).processed(dec!(100)).build();
    store.insert_order(&order).await.unwrap();

    let mut handles = Vec::new();
    for seed in 0..20u64 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let withdrawal = TestWithdrawalBuilder::new()
                .with_order(OrderNumberFixtures::from_seed(seed))
                .with_owner(alice)
                .with_sum(dec!(30))
                .build();
            store.insert_withdrawal_checked(&withdrawal).await.unwrap()
        }));
    }

    let mut recorded = 0;
    for handle in handles {
        if matches!(handle.await.unwrap(), WithdrawOutcome::Recorded { .. }) {
            recorded += 1;
        }
    }
    assert_eq!(recorded, 3);

    let history = store.list_withdrawals_for_user(alice).await.unwrap();
    let total = Amount::try_sum(history.iter().map(|w| &w.sum)).unwrap();
    assert_eq!(total, Amount::new(dec!(90)));
}

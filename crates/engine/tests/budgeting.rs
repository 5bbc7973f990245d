use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{BudgetStatus, Engine, EngineError, RequestContext};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection, Uuid) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let user_id = seed_user(&db, "alice").await;
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db, user_id)
}

async fn seed_user(db: &DatabaseConnection, username: &str) -> Uuid {
    let id = Uuid::new_v4();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (id, username, email, password, role) VALUES (?, ?, ?, ?, ?)",
        vec![
            id.to_string().into(),
            username.into(),
            format!("{username}@example.com").into(),
            "password".into(),
            "user".into(),
        ],
    ))
    .await
    .unwrap();
    id
}

fn august(user_id: Uuid) -> RequestContext {
    RequestContext::new(user_id, NaiveDate::from_ymd_opt(2026, 8, 1).unwrap())
}

async fn count(db: &DatabaseConnection, table: &str) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            format!("SELECT COUNT(*) AS n FROM {table}"),
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "n").unwrap()
}

#[tokio::test]
async fn create_and_read_current_budget() {
    let (engine, _db, user_id) = engine_with_db().await;
    let ctx = august(user_id);

    engine.new_budget(ctx, 1000_00).await.unwrap();

    let budget = engine.current_budget(ctx).await.unwrap();
    assert_eq!(budget.amount_minor, 1000_00);
    assert_eq!(budget.period, ctx.period);
    assert_eq!(budget.status, BudgetStatus::Incomplete);
}

#[tokio::test]
async fn duplicate_budget_for_same_period() {
    let (engine, _db, user_id) = engine_with_db().await;
    let ctx = august(user_id);

    engine.new_budget(ctx, 1000_00).await.unwrap();
    let err = engine.new_budget(ctx, 2000_00).await.unwrap_err();

    assert_eq!(err, EngineError::Duplicate("Budget already exists".to_string()));
    assert_eq!(err.to_string(), "Budget already exists");
}

#[tokio::test]
async fn other_users_and_periods_do_not_conflict() {
    let (engine, db, user_id) = engine_with_db().await;
    let bob = seed_user(&db, "bob").await;

    engine.new_budget(august(user_id), 1000_00).await.unwrap();
    engine.new_budget(august(bob), 1000_00).await.unwrap();

    let september = RequestContext::new(user_id, NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
    engine.new_budget(september, 1500_00).await.unwrap();

    assert_eq!(count(&db, "budgets").await, 3);
}

#[tokio::test]
async fn current_budget_requires_an_existing_budget() {
    let (engine, _db, user_id) = engine_with_db().await;

    let err = engine.current_budget(august(user_id)).await.unwrap_err();
    assert_eq!(err, EngineError::NotFound("Budget does not exist".to_string()));
}

#[tokio::test]
async fn update_current_budget_touches_amount_only() {
    let (engine, _db, user_id) = engine_with_db().await;
    let ctx = august(user_id);

    let budget_id = engine.new_budget(ctx, 1000_00).await.unwrap();
    engine
        .new_envelope(ctx, "Rent", None, 1000_00, true)
        .await
        .unwrap();
    let budget = engine.current_budget(ctx).await.unwrap();
    assert_eq!(budget.status, BudgetStatus::Complete);

    let updated_id = engine.update_current_budget(ctx, 2000_00).await.unwrap();
    assert_eq!(updated_id, budget_id);

    // The scoped update leaves the derived status to the next allocation
    // change, even though the totals no longer match.
    let budget = engine.current_budget(ctx).await.unwrap();
    assert_eq!(budget.amount_minor, 2000_00);
    assert_eq!(budget.status, BudgetStatus::Complete);
}

#[tokio::test]
async fn update_current_budget_requires_an_existing_budget() {
    let (engine, _db, user_id) = engine_with_db().await;

    let err = engine
        .update_current_budget(august(user_id), 2000_00)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotFound("Budget does not exist".to_string()));
}

#[tokio::test]
async fn allocations_drive_budget_status() {
    let (engine, _db, user_id) = engine_with_db().await;
    let ctx = august(user_id);
    engine.new_budget(ctx, 1000_00).await.unwrap();

    // Allocate the full amount: complete.
    let rent = engine
        .new_envelope(ctx, "Rent", Some("monthly rent"), 1000_00, true)
        .await
        .unwrap();
    let budget = engine.current_budget(ctx).await.unwrap();
    assert_eq!(budget.status, BudgetStatus::Complete);

    // Shrink the allocation: incomplete.
    engine
        .update_envelope(rent.allocation_id, "Rent", Some("monthly rent"), 500_00, true)
        .await
        .unwrap();
    let budget = engine.current_budget(ctx).await.unwrap();
    assert_eq!(budget.status, BudgetStatus::Incomplete);

    // Overshoot with a second allocation: invalid.
    let food = engine
        .new_envelope(ctx, "Food", None, 600_00, false)
        .await
        .unwrap();
    let budget = engine.current_budget(ctx).await.unwrap();
    assert_eq!(budget.status, BudgetStatus::Invalid);

    // Invalid is not terminal: bringing the total back down re-derives.
    engine
        .update_envelope(food.allocation_id, "Food", None, 100_00, false)
        .await
        .unwrap();
    let budget = engine.current_budget(ctx).await.unwrap();
    assert_eq!(budget.status, BudgetStatus::Incomplete);
}

#[tokio::test]
async fn update_budget_status_is_idempotent() {
    let (engine, _db, user_id) = engine_with_db().await;
    let ctx = august(user_id);
    let budget_id = engine.new_budget(ctx, 1000_00).await.unwrap();

    engine.update_budget_status(budget_id, 400_00).await.unwrap();
    let budget = engine.current_budget(ctx).await.unwrap();
    assert_eq!(budget.status, BudgetStatus::Incomplete);

    engine.update_budget_status(budget_id, 400_00).await.unwrap();
    let budget = engine.current_budget(ctx).await.unwrap();
    assert_eq!(budget.status, BudgetStatus::Incomplete);

    engine.update_budget_status(budget_id, 1000_00).await.unwrap();
    let budget = engine.current_budget(ctx).await.unwrap();
    assert_eq!(budget.status, BudgetStatus::Complete);
}

#[tokio::test]
async fn duplicate_envelope_name_rolls_back_both_rows() {
    let (engine, db, user_id) = engine_with_db().await;
    let ctx = august(user_id);
    engine.new_budget(ctx, 1000_00).await.unwrap();

    engine
        .new_envelope(ctx, "Rent", None, 400_00, true)
        .await
        .unwrap();
    let err = engine
        .new_envelope(ctx, "Rent", None, 100_00, false)
        .await
        .unwrap_err();

    assert_eq!(err, EngineError::Duplicate("Envelope already exists".to_string()));
    assert_eq!(count(&db, "envelopes").await, 1);
    assert_eq!(count(&db, "allocations").await, 1);

    // The status still reflects only the first allocation.
    let budget = engine.current_budget(ctx).await.unwrap();
    assert_eq!(budget.status, BudgetStatus::Incomplete);
}

#[tokio::test]
async fn renaming_onto_an_existing_envelope_rolls_back() {
    let (engine, db, user_id) = engine_with_db().await;
    let ctx = august(user_id);
    engine.new_budget(ctx, 1000_00).await.unwrap();

    engine
        .new_envelope(ctx, "Rent", None, 400_00, true)
        .await
        .unwrap();
    let food = engine
        .new_envelope(ctx, "Food", None, 100_00, false)
        .await
        .unwrap();

    let err = engine
        .update_envelope(food.allocation_id, "Rent", None, 900_00, false)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::Duplicate("Envelope already exists".to_string()));

    // The failed rename rolls the whole unit back: both envelopes keep
    // their names and the allocation its amount.
    assert_eq!(count(&db, "envelopes").await, 2);
    assert_eq!(count(&db, "allocations").await, 2);
    let page = engine
        .envelopes(engine.current_user_budget(ctx).await.unwrap().budget_id, 1, 10, "name", "asc")
        .await
        .unwrap();
    let names: Vec<&str> = page.content.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Food", "Rent"]);
    assert_eq!(page.content[0].amount_minor, 100_00);

    // And the status still reflects the original 500_00 total.
    let budget = engine.current_budget(ctx).await.unwrap();
    assert_eq!(budget.status, BudgetStatus::Incomplete);
}

#[tokio::test]
async fn negative_allocation_amounts_are_rejected_up_front() {
    let (engine, db, user_id) = engine_with_db().await;
    let ctx = august(user_id);
    engine.new_budget(ctx, 1000_00).await.unwrap();

    let err = engine
        .new_envelope(ctx, "Rent", None, -1, true)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("amount_minor must be >= 0".to_string())
    );
    assert_eq!(count(&db, "envelopes").await, 0);

    let rent = engine
        .new_envelope(ctx, "Rent", None, 400_00, true)
        .await
        .unwrap();
    let err = engine
        .update_envelope(rent.allocation_id, "Rent", None, -1, true)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("amount_minor must be >= 0".to_string())
    );
}

#[tokio::test]
async fn envelope_creation_requires_a_budget() {
    let (engine, db, user_id) = engine_with_db().await;

    let err = engine
        .new_envelope(august(user_id), "Rent", None, 400_00, true)
        .await
        .unwrap_err();

    assert_eq!(err, EngineError::NotFound("Budget does not exist".to_string()));
    assert_eq!(count(&db, "envelopes").await, 0);
    assert_eq!(count(&db, "allocations").await, 0);
}

#[tokio::test]
async fn update_envelope_with_unknown_allocation_leaves_store_unmodified() {
    let (engine, _db, user_id) = engine_with_db().await;
    let ctx = august(user_id);
    let budget_id = engine.new_budget(ctx, 1000_00).await.unwrap();
    engine
        .new_envelope(ctx, "Rent", None, 400_00, true)
        .await
        .unwrap();

    let err = engine
        .update_envelope(Uuid::new_v4(), "Other", None, 900_00, false)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotFound("Envelope does not exist".to_string()));

    let page = engine
        .envelopes(budget_id, 1, 10, "name", "asc")
        .await
        .unwrap();
    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0].name, "Rent");
    assert_eq!(page.content[0].amount_minor, 400_00);

    let budget = engine.current_budget(ctx).await.unwrap();
    assert_eq!(budget.status, BudgetStatus::Incomplete);
}

#[tokio::test]
async fn listing_pages_are_one_based() {
    let (engine, _db, user_id) = engine_with_db().await;
    let ctx = august(user_id);
    let budget_id = engine.new_budget(ctx, 100_000_00).await.unwrap();

    for n in 1..=12 {
        engine
            .new_envelope(ctx, &format!("envelope-{n:02}"), None, 100_00, false)
            .await
            .unwrap();
    }

    let page = engine
        .envelopes(budget_id, 1, 10, "name", "asc")
        .await
        .unwrap();
    assert_eq!(page.number_of_elements, 10);
    assert_eq!(page.total_elements, 12);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.current_page, 1);
    assert!(page.first);
    assert!(!page.last);
    assert_eq!(page.content[0].name, "envelope-01");

    let page = engine
        .envelopes(budget_id, 2, 10, "name", "asc")
        .await
        .unwrap();
    assert_eq!(page.number_of_elements, 2);
    assert_eq!(page.current_page, 2);
    assert!(!page.first);
    assert!(page.last);
    assert_eq!(page.content[0].name, "envelope-11");
}

#[tokio::test]
async fn listing_rejects_unknown_sort_fields() {
    let (engine, _db, user_id) = engine_with_db().await;
    let ctx = august(user_id);
    let budget_id = engine.new_budget(ctx, 1000_00).await.unwrap();

    let err = engine
        .envelopes(budget_id, 1, 10, "unknown", "asc")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::NotFound("Sort by unknown is not allowed".to_string())
    );

    let err = engine
        .envelopes(budget_id, 1, 10, "name", "sideways")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::NotFound("Sort direction sideways is not allowed".to_string())
    );
}

#[tokio::test]
async fn listing_sorts_on_the_allocation_amount() {
    let (engine, _db, user_id) = engine_with_db().await;
    let ctx = august(user_id);
    let budget_id = engine.new_budget(ctx, 1000_00).await.unwrap();

    engine
        .new_envelope(ctx, "Food", None, 100_00, false)
        .await
        .unwrap();
    engine
        .new_envelope(ctx, "Rent", None, 300_00, true)
        .await
        .unwrap();
    engine
        .new_envelope(ctx, "Fun", None, 200_00, false)
        .await
        .unwrap();

    let page = engine
        .envelopes(budget_id, 1, 10, "amount", "DESC")
        .await
        .unwrap();
    let amounts: Vec<i64> = page.content.iter().map(|e| e.amount_minor).collect();
    assert_eq!(amounts, vec![300_00, 200_00, 100_00]);
}

#[tokio::test]
async fn listing_excludes_inactive_envelopes() {
    let (engine, db, user_id) = engine_with_db().await;
    let ctx = august(user_id);
    let budget_id = engine.new_budget(ctx, 1000_00).await.unwrap();

    engine
        .new_envelope(ctx, "Rent", None, 400_00, true)
        .await
        .unwrap();
    engine
        .new_envelope(ctx, "Food", None, 100_00, false)
        .await
        .unwrap();

    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE envelopes SET status = ? WHERE name = ?",
        vec!["inactive".into(), "Food".into()],
    ))
    .await
    .unwrap();

    let page = engine
        .envelopes(budget_id, 1, 10, "name", "asc")
        .await
        .unwrap();
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.content[0].name, "Rent");
}

//! Database and schema tests
//!
//! Tests SQLite migrations, menu seeding, and repository behavior against
//! in-memory databases.
//!
//! Tests are serialized because repositories resolve their pool through
//! the global shared-pool override.

use chrono::{DateTime, Utc};
use di::{Injectable, ServiceCollection, ServiceProvider};
use restaurant_chatbot_api::infrastructure::database::DatabaseConnection;
use restaurant_chatbot_api::infrastructure::entities::{
    Message, OrderStatus, OrderStatusUpdate,
};
use restaurant_chatbot_api::infrastructure::repositories::{
    DbConversationRepository, DbMenuRepository, DbOrderRepository,
};
use restaurant_chatbot_api::infrastructure::seed;
use restaurant_chatbot_api::infrastructure::traits::{
    ConversationRepository, MenuRepository, OrderRepository,
};
use serial_test::serial;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicU32, Ordering};

/// Counter for unique test database URIs
static TEST_DB_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Setup test database with migrations and returns pool.
/// Shared-cache in-memory SQLite so every pooled connection sees the
/// same database.
async fn setup_test_db() -> SqlitePool {
    let db_num = TEST_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let db_url = format!("sqlite:file:dbtest{}?mode=memory&cache=shared", db_num);

    let pool = SqlitePool::connect(&db_url).await.unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();

    DatabaseConnection::set_shared_pool(pool.clone());

    pool
}

fn cleanup_test_db() {
    DatabaseConnection::clear_shared_pool();
}

/// Repositories resolved through DI, backed by the shared test pool.
fn build_provider() -> ServiceProvider {
    ServiceCollection::new()
        .add(DatabaseConnection::transient())
        .add(DbMenuRepository::transient())
        .add(DbOrderRepository::transient())
        .add(DbConversationRepository::transient())
        .build_provider()
        .unwrap()
}

async fn insert_order_row(
    pool: &SqlitePool,
    id: &str,
    status: &str,
    total: f64,
    created_at: &str,
) {
    sqlx::query(
        "INSERT INTO orders (id, customer_name, customer_phone, items, total_amount, status, created_at, updated_at) VALUES (?, 'Jane', '0300-1234567', '[\"Fries\"]', ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(total)
    .bind(status)
    .bind(created_at)
    .bind(created_at)
    .execute(pool)
    .await
    .unwrap();
}

#[tokio::test]
#[serial]
async fn test_database_migrations_work() {
    let pool = setup_test_db().await;

    let result = sqlx::query("SELECT name FROM sqlite_master WHERE type='table'")
        .fetch_all(&pool)
        .await
        .unwrap();

    // menu_items, orders, conversations (plus sqlx bookkeeping)
    assert!(result.len() >= 3);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_seeding_inserts_metadata_and_tagged_items() {
    let pool = setup_test_db().await;

    seed::seed_menu_if_empty(&pool).await.unwrap();

    // Exactly one restaurant metadata row.
    let (info_count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM menu_items WHERE doc_type = 'restaurant_info'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(info_count, 1);

    // Every other row is an item with a category tag.
    let (untagged,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM menu_items WHERE doc_type = 'item' AND category = ''",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(untagged, 0);

    // Nested categories carry a subcategory tag.
    let (pizza_untagged,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM menu_items WHERE category = 'Pizza' AND subcategory IS NULL",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(pizza_untagged, 0);

    // Deals are tagged with their group.
    let (deal_count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM menu_items WHERE category = 'deals' AND subcategory IS NOT NULL",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(deal_count >= 2);

    // Plain string entries double as their own description.
    let (name, description): (String, String) = sqlx::query_as(
        "SELECT name, description FROM menu_items WHERE name = 'Mineral Water'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(name, description);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_seeding_skips_populated_store() {
    let pool = setup_test_db().await;

    seed::seed_menu_if_empty(&pool).await.unwrap();
    let (before,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM menu_items")
        .fetch_one(&pool)
        .await
        .unwrap();

    seed::seed_menu_if_empty(&pool).await.unwrap();
    let (after,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM menu_items")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(before, after);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_menu_items_exclude_metadata_and_filter_by_category() {
    let pool = setup_test_db().await;
    seed::seed_menu_if_empty(&pool).await.unwrap();

    let provider = build_provider();
    let menu = provider.get_required::<dyn MenuRepository>();

    let all = menu.menu_items(None).await.unwrap();
    assert!(!all.is_empty());
    let (item_count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM menu_items WHERE doc_type = 'item'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(all.len() as i64, item_count);

    let pizzas = menu.menu_items(Some("Pizza")).await.unwrap();
    assert!(!pizzas.is_empty());
    assert!(pizzas.iter().all(|item| item.category == "Pizza"));
    assert!(pizzas.iter().all(|item| item.subcategory.is_some()));

    let none = menu.menu_items(Some("Sushi")).await.unwrap();
    assert!(none.is_empty());

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_menu_search_is_case_insensitive_substring() {
    let pool = setup_test_db().await;
    seed::seed_menu_if_empty(&pool).await.unwrap();

    let provider = build_provider();
    let menu = provider.get_required::<dyn MenuRepository>();

    let hits = menu.search("PEPPERONI").await.unwrap();
    assert!(hits.iter().any(|item| item.name == "Pepperoni Pizza"));

    // Description matches count too.
    let hits = menu.search("molten").await.unwrap();
    assert!(hits.iter().any(|item| item.name == "Chocolate Lava Cake"));

    let hits = menu.search("no such dish").await.unwrap();
    assert!(hits.is_empty());

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_restaurant_info_round_trip() {
    let pool = setup_test_db().await;
    seed::seed_menu_if_empty(&pool).await.unwrap();

    let provider = build_provider();
    let menu = provider.get_required::<dyn MenuRepository>();

    let info = menu.restaurant_info().await.unwrap();
    assert_eq!(
        info.get("name").and_then(|v| v.as_str()),
        Some("Broadway Pizza")
    );

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_restaurant_info_empty_when_absent() {
    let _pool = setup_test_db().await;

    let provider = build_provider();
    let menu = provider.get_required::<dyn MenuRepository>();

    assert!(menu.restaurant_info().await.unwrap().is_empty());

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_conversation_save_load_round_trip() {
    let _pool = setup_test_db().await;

    let provider = build_provider();
    let conversations = provider.get_required::<dyn ConversationRepository>();

    let messages = vec![
        Message::user("I'd like a pizza"),
        Message::assistant("Great choice!"),
    ];

    conversations.save("jane doe", &messages).await.unwrap();
    let loaded = conversations.load("jane doe").await.unwrap();

    assert_eq!(loaded, messages);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_conversation_double_save_keeps_one_record() {
    let pool = setup_test_db().await;

    let provider = build_provider();
    let conversations = provider.get_required::<dyn ConversationRepository>();

    conversations
        .save("jane doe", &[Message::user("first")])
        .await
        .unwrap();
    conversations
        .save("jane doe", &[Message::user("first"), Message::assistant("second")])
        .await
        .unwrap();

    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM conversations WHERE customer_key = 'jane doe'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 1);

    // The stored transcript is the most recent save.
    let loaded = conversations.load("jane doe").await.unwrap();
    assert_eq!(loaded.len(), 2);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_conversation_load_unknown_customer_is_empty() {
    let _pool = setup_test_db().await;

    let provider = build_provider();
    let conversations = provider.get_required::<dyn ConversationRepository>();

    assert!(conversations.load("nobody").await.unwrap().is_empty());

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_conversation_delete_is_idempotent() {
    let pool = setup_test_db().await;

    let provider = build_provider();
    let conversations = provider.get_required::<dyn ConversationRepository>();

    conversations
        .save("jane doe", &[Message::user("hello")])
        .await
        .unwrap();

    conversations.delete("jane doe").await.unwrap();
    // Deleting again is a no-op.
    conversations.delete("jane doe").await.unwrap();

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM conversations")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_customers_lists_all_conversation_keys() {
    let _pool = setup_test_db().await;

    let provider = build_provider();
    let conversations = provider.get_required::<dyn ConversationRepository>();

    conversations.save("jane doe", &[Message::user("hi")]).await.unwrap();
    conversations.save("paulo", &[Message::user("hola")]).await.unwrap();

    let mut customers = conversations.customers().await.unwrap();
    customers.sort();
    assert_eq!(customers, vec!["jane doe".to_owned(), "paulo".to_owned()]);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_create_order_starts_pending_with_opaque_id() {
    let _pool = setup_test_db().await;

    let provider = build_provider();
    let orders = provider.get_required::<dyn OrderRepository>();

    let order_id = orders
        .create_order("Jane", "0300-1234567", &["Pepperoni Pizza".to_owned()], 0.0)
        .await
        .unwrap();
    assert!(uuid::Uuid::parse_str(&order_id).is_ok());

    let all = orders.orders(None).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, order_id);
    assert_eq!(all[0].status, OrderStatus::Pending);
    assert_eq!(all[0].items, vec!["Pepperoni Pizza".to_owned()]);
    assert_eq!(all[0].total_amount, 0.0);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_orders_filter_by_status() {
    let pool = setup_test_db().await;

    insert_order_row(&pool, "11111111-1111-1111-1111-111111111111", "pending", 0.0, "2026-08-01T12:00:00+00:00").await;
    insert_order_row(&pool, "22222222-2222-2222-2222-222222222222", "completed", 1500.0, "2026-08-01T13:00:00+00:00").await;
    insert_order_row(&pool, "33333333-3333-3333-3333-333333333333", "cancelled", 0.0, "2026-08-02T09:00:00+00:00").await;

    let provider = build_provider();
    let orders = provider.get_required::<dyn OrderRepository>();

    let all = orders.orders(None).await.unwrap();
    assert_eq!(all.len(), 3);

    let completed = orders.orders(Some(OrderStatus::Completed)).await.unwrap();
    assert_eq!(completed.len(), 1);
    assert!(completed.iter().all(|o| o.status == OrderStatus::Completed));

    let pending = orders.orders(Some(OrderStatus::Pending)).await.unwrap();
    assert_eq!(pending.len(), 1);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_update_status_with_invalid_id_leaves_store_unchanged() {
    let pool = setup_test_db().await;
    insert_order_row(&pool, "11111111-1111-1111-1111-111111111111", "pending", 0.0, "2026-08-01T12:00:00+00:00").await;

    let provider = build_provider();
    let orders = provider.get_required::<dyn OrderRepository>();

    let outcome = orders
        .update_status("definitely-not-a-uuid", OrderStatus::Completed)
        .await
        .unwrap();
    assert_eq!(outcome, OrderStatusUpdate::NotFound);

    let (status,): (String,) = sqlx::query_as("SELECT status FROM orders")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "pending");

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_update_status_with_unknown_id_is_not_found() {
    let _pool = setup_test_db().await;

    let provider = build_provider();
    let orders = provider.get_required::<dyn OrderRepository>();

    let outcome = orders
        .update_status("99999999-9999-9999-9999-999999999999", OrderStatus::Completed)
        .await
        .unwrap();
    assert_eq!(outcome, OrderStatusUpdate::NotFound);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_update_status_transitions_without_guard() {
    let pool = setup_test_db().await;
    insert_order_row(&pool, "11111111-1111-1111-1111-111111111111", "completed", 900.0, "2026-08-01T12:00:00+00:00").await;

    let provider = build_provider();
    let orders = provider.get_required::<dyn OrderRepository>();

    // Staff may set any status at any time; completed back to pending is
    // allowed.
    let outcome = orders
        .update_status("11111111-1111-1111-1111-111111111111", OrderStatus::Pending)
        .await
        .unwrap();
    assert_eq!(outcome, OrderStatusUpdate::Updated);

    let (status,): (String,) = sqlx::query_as("SELECT status FROM orders")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "pending");

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_stats_group_by_status_and_completed_days() {
    let pool = setup_test_db().await;

    insert_order_row(&pool, "11111111-1111-1111-1111-111111111111", "completed", 1500.0, "2026-08-01T12:00:00+00:00").await;
    insert_order_row(&pool, "22222222-2222-2222-2222-222222222222", "completed", 500.0, "2026-08-01T18:30:00+00:00").await;
    insert_order_row(&pool, "33333333-3333-3333-3333-333333333333", "completed", 2000.0, "2026-08-02T11:00:00+00:00").await;
    insert_order_row(&pool, "44444444-4444-4444-4444-444444444444", "pending", 9999.0, "2026-08-02T11:30:00+00:00").await;

    let provider = build_provider();
    let orders = provider.get_required::<dyn OrderRepository>();

    let stats = orders.stats().await.unwrap();

    let completed = stats
        .status_stats
        .iter()
        .find(|s| s.status == OrderStatus::Completed)
        .unwrap();
    assert_eq!(completed.count, 3);
    let pending = stats
        .status_stats
        .iter()
        .find(|s| s.status == OrderStatus::Pending)
        .unwrap();
    assert_eq!(pending.count, 1);

    // Pending revenue never reaches the daily rollup; days ascend.
    assert_eq!(stats.daily_stats.len(), 2);
    assert_eq!(stats.daily_stats[0].day, "2026-08-01");
    assert_eq!(stats.daily_stats[0].revenue, 2000.0);
    assert_eq!(stats.daily_stats[0].count, 2);
    assert_eq!(stats.daily_stats[1].day, "2026-08-02");
    assert_eq!(stats.daily_stats[1].revenue, 2000.0);
    assert_eq!(stats.daily_stats[1].count, 1);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_order_timestamps_round_trip() {
    let _pool = setup_test_db().await;

    let provider = build_provider();
    let orders = provider.get_required::<dyn OrderRepository>();

    let before: DateTime<Utc> = Utc::now();
    orders
        .create_order("Jane", "0300-1234567", &["Fries".to_owned()], 0.0)
        .await
        .unwrap();

    let all = orders.orders(None).await.unwrap();
    assert!(all[0].created_at >= before - chrono::Duration::seconds(1));
    assert_eq!(all[0].created_at, all[0].updated_at);

    cleanup_test_db();
}

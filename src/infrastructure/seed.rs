//! First-startup menu seeding

use log::info;
use serde_json::Value;
use sqlx::SqlitePool;

/// `doc_type` of the single restaurant metadata row.
pub const RESTAURANT_INFO_TYPE: &str = "restaurant_info";

const MENU_DEFINITION: &str = include_str!("../../data/menu.json");

/// Seeds the menu store from the embedded definition if it is empty.
/// A populated store is left untouched.
pub async fn seed_menu_if_empty(pool: &SqlitePool) -> anyhow::Result<()> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM menu_items")
        .fetch_one(pool)
        .await?;

    if count > 0 {
        return Ok(());
    }

    load_menu_data(pool).await
}

async fn load_menu_data(pool: &SqlitePool) -> anyhow::Result<()> {
    let menu_data: Value = serde_json::from_str(MENU_DEFINITION)?;

    insert_restaurant_info(pool, &menu_data["restaurant"]).await?;
    let mut inserted = 1usize;

    if let Some(categories) = menu_data["menu"].as_object() {
        for (category, items) in categories {
            match items {
                // Nested categories like Pizza group items by subcategory.
                Value::Object(subcategories) => {
                    for (subcategory, subitems) in subcategories {
                        for item in subitems.as_array().into_iter().flatten() {
                            insert_item(pool, item, category, Some(subcategory)).await?;
                            inserted += 1;
                        }
                    }
                }
                Value::Array(items) => {
                    for item in items {
                        insert_item(pool, item, category, None).await?;
                        inserted += 1;
                    }
                }
                _ => {}
            }
        }
    }

    if let Some(deal_groups) = menu_data["deals"].as_object() {
        for (deal_type, deals) in deal_groups {
            for deal in deals.as_array().into_iter().flatten() {
                insert_item(pool, deal, "deals", Some(deal_type)).await?;
                inserted += 1;
            }
        }
    }

    info!("seeded menu store with {inserted} documents");
    Ok(())
}

async fn insert_restaurant_info(pool: &SqlitePool, info: &Value) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO menu_items (doc_type, name, description, category, extra) VALUES (?, '', '', '', ?)",
    )
    .bind(RESTAURANT_INFO_TYPE)
    .bind(info.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

async fn insert_item(
    pool: &SqlitePool,
    item: &Value,
    category: &str,
    subcategory: Option<&str>,
) -> anyhow::Result<()> {
    let (name, description, extra) = match item {
        Value::Object(fields) => {
            let name = fields
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_owned();
            let description = fields
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            let mut extra = fields.clone();
            extra.remove("name");
            extra.remove("description");
            (name, description, Value::Object(extra))
        }
        // Plain string entries double as their own description.
        Value::String(name) => (name.clone(), name.clone(), Value::Object(Default::default())),
        other => (
            other.to_string(),
            String::new(),
            Value::Object(Default::default()),
        ),
    };

    sqlx::query(
        "INSERT INTO menu_items (doc_type, name, description, category, subcategory, extra) VALUES ('item', ?, ?, ?, ?, ?)",
    )
    .bind(name)
    .bind(description)
    .bind(category)
    .bind(subcategory)
    .bind(extra.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

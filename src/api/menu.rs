//! Menu browsing endpoints

use crate::infrastructure::traits::MenuRepository;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use di_axum::Inject;
use serde::Deserialize;
use serde_json::{Map, Value};

pub fn router() -> Router {
    Router::new()
        .route("/", get(menu_items))
        .route("/search", get(search))
        .route("/info", get(restaurant_info))
}

#[derive(Deserialize, Debug)]
struct MenuQuery {
    category: Option<String>,
}

#[derive(Deserialize, Debug)]
struct SearchQuery {
    q: String,
}

async fn menu_items(
    Inject(menu): Inject<dyn MenuRepository>,
    Query(query): Query<MenuQuery>,
) -> Result<Json<schemas::MenuItemList>, StatusCode> {
    let items = menu
        .menu_items(query.category.as_deref())
        .await
        .map_err(|()| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(schemas::MenuItemList { items }))
}

async fn search(
    Inject(menu): Inject<dyn MenuRepository>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<schemas::MenuItemList>, StatusCode> {
    let items = menu
        .search(&query.q)
        .await
        .map_err(|()| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(schemas::MenuItemList { items }))
}

async fn restaurant_info(
    Inject(menu): Inject<dyn MenuRepository>,
) -> Result<Json<Map<String, Value>>, StatusCode> {
    menu.restaurant_info()
        .await
        .map(Json)
        .map_err(|()| StatusCode::INTERNAL_SERVER_ERROR)
}

pub mod schemas {
    use crate::infrastructure::entities::MenuItem;
    use serde::Serialize;

    #[derive(Serialize, Debug)]
    pub struct MenuItemList {
        pub items: Vec<MenuItem>,
    }
}

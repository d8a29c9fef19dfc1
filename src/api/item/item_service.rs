//! A service for interacting with items.
//!
//! Absence is part of the contract, not an error: reading or updating a
//! missing item yields [`None`], deleting one yields `false`. The error
//! channel is reserved for infrastructure failures.

use crate::{
    api::item::item_repository::{self, Item, NewItem, UpdateItem},
    infra::{
        database::{DbConnection, Tx},
        error::ApiResult,
        pagination::PaginationParams,
        validation::Valid,
    },
};
use futures::Stream;
use std::time::Duration;
use tracing::instrument;

/// Creates a new item.
#[instrument(skip(tx))]
pub async fn create_item(tx: &mut Tx, new_item: Valid<NewItem>) -> ApiResult<Item> {
    item_repository::create_item(tx, new_item).await
}

/// Read an item.
#[instrument(skip(tx))]
pub async fn read_item(tx: &mut Tx, id: i64) -> ApiResult<Option<Item>> {
    item_repository::fetch_item(tx, id).await
}

/// Lists items in insertion order.
#[instrument(skip(tx))]
pub async fn list_items(tx: &mut Tx, params: &PaginationParams) -> ApiResult<Vec<Item>> {
    item_repository::list_items(tx, params).await
}

/// Updates the set fields of an item, leaving the rest untouched.
#[instrument(skip(tx))]
pub async fn update_item(tx: &mut Tx, id: i64, update: Valid<UpdateItem>) -> ApiResult<Option<Item>> {
    item_repository::update_item(tx, id, update).await
}

/// Deletes an item, returning whether it existed.
#[instrument(skip(tx))]
pub async fn delete_item(tx: &mut Tx, id: i64) -> ApiResult<bool> {
    item_repository::delete_item(tx, id).await
}

/// Streams items in insertion order.
#[instrument(skip(conn))]
pub fn stream_items(
    conn: DbConnection,
    params: PaginationParams,
    throttle: Duration,
) -> impl Stream<Item = ApiResult<Item>> {
    item_repository::stream_items(conn, params, throttle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    fn new_item(nom: &str, prix: f64) -> Valid<NewItem> {
        Valid::new(NewItem {
            nom: nom.to_string(),
            prix,
        })
        .unwrap()
    }

    #[sqlx::test]
    async fn create_item_assigns_an_id(db: SqlitePool) {
        let mut tx = db.begin().await.unwrap();
        let item = create_item(&mut tx, new_item("Test Item", 9.99))
            .await
            .unwrap();
        assert!(item.id > 0);
        assert_eq!("Test Item", item.nom);
        assert_eq!(9.99, item.prix);
    }

    #[sqlx::test]
    async fn list_items_returns_items_in_creation_order(db: SqlitePool) {
        let mut tx = db.begin().await.unwrap();
        create_item(&mut tx, new_item("Item 1", 5.0)).await.unwrap();
        create_item(&mut tx, new_item("Item 2", 10.0))
            .await
            .unwrap();

        let items = list_items(&mut tx, &PaginationParams::new(0, 10))
            .await
            .unwrap();
        assert_eq!(2, items.len());
        assert_eq!("Item 1", items[0].nom);
        assert_eq!("Item 2", items[1].nom);
    }

    #[sqlx::test]
    async fn read_item_finds_a_created_item(db: SqlitePool) {
        let mut tx = db.begin().await.unwrap();
        let item = create_item(&mut tx, new_item("Item A", 7.5)).await.unwrap();

        let fetched = read_item(&mut tx, item.id).await.unwrap();
        assert_eq!("Item A", fetched.unwrap().nom);
    }

    #[sqlx::test]
    async fn read_missing_item_is_none(db: SqlitePool) {
        let mut tx = db.begin().await.unwrap();
        let fetched = read_item(&mut tx, 999).await.unwrap();
        assert_eq!(None, fetched);
    }

    #[sqlx::test]
    async fn update_with_only_a_name_keeps_the_price(db: SqlitePool) {
        let mut tx = db.begin().await.unwrap();
        let item = create_item(&mut tx, new_item("Old Name", 5.0))
            .await
            .unwrap();

        let update = Valid::new(UpdateItem {
            nom: Some("New Name".to_string()),
            prix: None,
        })
        .unwrap();
        let updated = update_item(&mut tx, item.id, update)
            .await
            .unwrap()
            .unwrap();
        assert_eq!("New Name", updated.nom);
        assert_eq!(5.0, updated.prix);
    }

    #[sqlx::test]
    async fn update_with_only_a_price_keeps_the_name(db: SqlitePool) {
        let mut tx = db.begin().await.unwrap();
        let item = create_item(&mut tx, new_item("Stable", 5.0)).await.unwrap();

        let update = Valid::new(UpdateItem {
            nom: None,
            prix: Some(6.5),
        })
        .unwrap();
        let updated = update_item(&mut tx, item.id, update)
            .await
            .unwrap()
            .unwrap();
        assert_eq!("Stable", updated.nom);
        assert_eq!(6.5, updated.prix);
    }

    #[sqlx::test]
    async fn delete_item_removes_it(db: SqlitePool) {
        let mut tx = db.begin().await.unwrap();
        let item = create_item(&mut tx, new_item("Delete Me", 1.0))
            .await
            .unwrap();

        assert!(delete_item(&mut tx, item.id).await.unwrap());
        assert_eq!(None, read_item(&mut tx, item.id).await.unwrap());
    }

    #[sqlx::test]
    async fn delete_missing_item_is_false(db: SqlitePool) {
        let mut tx = db.begin().await.unwrap();
        assert!(!delete_item(&mut tx, 999).await.unwrap());
    }
}

//! Types and functions for storing and loading items from the database.

use crate::infra::{
    database::{DbConnection, Tx},
    error::ApiResult,
    pagination::PaginationParams,
    validation::Valid,
};
use async_stream::try_stream;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{instrument, Instrument};
use utoipa::ToSchema;
use validator::Validate;

/// A new item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct NewItem {
    /// The item's name.
    #[schema(example = "Chaise de jardin")]
    #[validate(length(min = 1))]
    pub nom: String,
    /// The item's price.
    #[schema(example = 9.99)]
    #[validate(range(min = 0.0))]
    pub prix: f64,
}

/// A partial change to an existing item.
/// Fields left unset keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdateItem {
    /// The item's new name.
    #[schema(example = "Chaise de jardin")]
    #[validate(length(min = 1))]
    pub nom: Option<String>,
    /// The item's new price.
    #[schema(example = 9.99)]
    #[validate(range(min = 0.0))]
    pub prix: Option<f64>,
}

/// An existing item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Item {
    /// The item's id.
    pub id: i64,
    /// The item's name.
    #[schema(example = "Chaise de jardin")]
    pub nom: String,
    /// The item's price.
    #[schema(example = 9.99)]
    pub prix: f64,
}

/// Creates a new item.
#[instrument(skip(tx))]
pub async fn create_item(tx: &mut Tx, new_item: Valid<NewItem>) -> ApiResult<Item> {
    let new_item = new_item.into_inner();
    tracing::info!("Creating item {:?}", new_item);
    let item = sqlx::query_as::<_, Item>(
        r#"
        INSERT INTO items (nom, prix)
        VALUES ($1, $2)
        RETURNING id, nom, prix
        "#,
    )
    .bind(&new_item.nom)
    .bind(new_item.prix)
    .fetch_one(tx.as_mut())
    .await?;
    tracing::info!("Created item {:?}", item);
    Ok(item)
}

/// Read an item.
#[instrument(skip(tx))]
pub async fn fetch_item(tx: &mut Tx, id: i64) -> ApiResult<Option<Item>> {
    tracing::info!("Reading item");
    let item = sqlx::query_as::<_, Item>(
        r#"
        SELECT id, nom, prix FROM items
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(tx.as_mut())
    .instrument(tracing::info_span!("fetch_optional"))
    .await?;
    tracing::info!("Found item: {:?}", item);
    Ok(item)
}

/// Updates the fields of an item that are set in `update`.
/// Returns [`None`] if the item does not exist.
#[instrument(skip(tx))]
pub async fn update_item(tx: &mut Tx, id: i64, update: Valid<UpdateItem>) -> ApiResult<Option<Item>> {
    let update = update.into_inner();
    tracing::info!("Updating item {} with {:?}", id, update);
    let item = sqlx::query_as::<_, Item>(
        r#"
        UPDATE items
        SET nom = COALESCE($1, nom), prix = COALESCE($2, prix)
        WHERE id = $3
        RETURNING id, nom, prix
        "#,
    )
    .bind(update.nom.as_deref())
    .bind(update.prix)
    .bind(id)
    .fetch_optional(tx.as_mut())
    .await?;
    tracing::info!("Updated item {:?}", item);
    Ok(item)
}

/// Deletes an item.
/// Returns whether a row was actually removed.
#[instrument(skip(tx))]
pub async fn delete_item(tx: &mut Tx, id: i64) -> ApiResult<bool> {
    tracing::info!("Deleting item {:?}", id);
    let result = sqlx::query(
        r#"
        DELETE FROM items
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(tx.as_mut())
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Lists items in insertion order.
#[instrument(skip(tx))]
pub async fn list_items(tx: &mut Tx, params: &PaginationParams) -> ApiResult<Vec<Item>> {
    tracing::info!("Listing items");
    let items = sqlx::query_as::<_, Item>(
        r#"
        SELECT id, nom, prix FROM items
        ORDER BY id
        LIMIT $1
        OFFSET $2
        "#,
    )
    .bind(params.limit())
    .bind(params.skip())
    .fetch_all(tx.as_mut())
    .instrument(tracing::info_span!("fetch_all"))
    .await?;
    tracing::info!("Listed {} items", items.len());
    Ok(items)
}

/// Streams items in insertion order.
#[instrument(skip(conn))]
pub fn stream_items(
    mut conn: DbConnection,
    params: PaginationParams,
    throttle: Duration,
) -> impl Stream<Item = ApiResult<Item>> {
    tracing::info!("Streaming items");
    let items = try_stream! {
        let mut rows = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, nom, prix FROM items
            ORDER BY id
            LIMIT $1
            OFFSET $2
            "#,
        )
        .bind(params.limit())
        .bind(params.skip())
        .fetch(&mut *conn);
        let mut total = 0;
        while let Some(item) = rows.next().await {
            yield item?;
            total += 1;
            tokio::time::sleep(throttle).await;
        }
        tracing::info!("Streamed {} items", total);
    };
    Box::pin(items)
}

//! Entity store primitives shared by the dispatcher and the query engine.
//!
//! Every function is generic over the connection so the same calls run against
//! the pool for reads and against the per-request transaction for mutations.

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, Condition, ConnectionTrait, DbErr, EntityName,
    EntityTrait, IntoActiveModel, PrimaryKeyTrait, QueryFilter, QueryOrder, SqlErr,
};

use crate::error::{AppError, AppResult};

/// Fetch one entity by surrogate id.
pub async fn get<E, C>(conn: &C, id: i32) -> AppResult<E::Model>
where
    E: EntityTrait,
    C: ConnectionTrait,
    i32: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
{
    E::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {id} not found", E::default().table_name())))
}

/// List entities matching `condition`, ordered ascending by `order_by` in turn.
pub async fn list<E, C>(
    conn: &C,
    condition: Condition,
    order_by: &[E::Column],
) -> AppResult<Vec<E::Model>>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let mut query = E::find().filter(condition);
    for column in order_by {
        query = query.order_by_asc(*column);
    }
    Ok(query.all(conn).await?)
}

/// First entity matching `condition` by ascending `order_by`, if any.
pub async fn first<E, C>(
    conn: &C,
    condition: Condition,
    order_by: E::Column,
) -> AppResult<Option<E::Model>>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    Ok(E::find()
        .filter(condition)
        .order_by_asc(order_by)
        .one(conn)
        .await?)
}

/// Insert a new entity and return the committed row.
pub async fn insert<A, C>(conn: &C, model: A) -> AppResult<<A::Entity as EntityTrait>::Model>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    C: ConnectionTrait,
{
    model.insert(conn).await.map_err(write_error)
}

/// Write the changed columns of an existing entity.
pub async fn update<A, C>(conn: &C, model: A) -> AppResult<<A::Entity as EntityTrait>::Model>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    C: ConnectionTrait,
{
    model.update(conn).await.map_err(write_error)
}

/// Delete every entity matching `condition`, returning how many went away.
pub async fn delete<E, C>(conn: &C, condition: Condition) -> AppResult<u64>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let result = E::delete_many().filter(condition).exec(conn).await?;
    Ok(result.rows_affected)
}

/// Unique-index violations reach callers as `DuplicateKey`; the validator
/// normally catches them first.
fn write_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => AppError::DuplicateKey(detail),
        _ => AppError::Database(err),
    }
}

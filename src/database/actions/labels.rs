use std::collections::HashMap;

use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

use crate::{
    error::ApiError,
    filters::LabelFilters,
    form::{LabelChanges, LabelRef},
    schema::{Id, Label, LabelKind, LinkedLabel},
};

pub async fn list_labels(
    kind: LabelKind,
    owner: Id,
    filters: &LabelFilters,
    pool: &Pool<Postgres>,
) -> Result<Vec<Label>, ApiError> {
    let table = kind.table();
    let assigned = if filters.assigned_only {
        format!(
            "AND EXISTS (
                SELECT 1 FROM {link} x
                INNER JOIN recipes r ON r.id = x.recipe_id
                WHERE x.{column} = l.id AND r.user_id = $1
            )",
            link = kind.link_table(),
            column = kind.link_column(),
        )
    } else {
        String::new()
    };

    let rows: Vec<Label> = sqlx::query_as(&format!(
        "SELECT l.id, l.name FROM {table} l WHERE l.user_id = $1 {assigned} ORDER BY l.name DESC, l.id DESC"
    ))
    .bind(owner)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn get_label(
    kind: LabelKind,
    owner: Id,
    id: Id,
    pool: &Pool<Postgres>,
) -> Result<Label, ApiError> {
    let row: Option<Label> = sqlx::query_as(&format!(
        "SELECT id, name FROM {} WHERE id = $1 AND user_id = $2",
        kind.table()
    ))
    .bind(id)
    .bind(owner)
    .fetch_optional(pool)
    .await?;

    row.ok_or(ApiError::NotFound)
}

pub async fn create_label(
    kind: LabelKind,
    owner: Id,
    name: &str,
    pool: &Pool<Postgres>,
) -> Result<Label, ApiError> {
    let row: Label = sqlx::query_as(&format!(
        "INSERT INTO {} (user_id, name) VALUES ($1, $2) RETURNING id, name",
        kind.table()
    ))
    .bind(owner)
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn update_label(
    kind: LabelKind,
    owner: Id,
    id: Id,
    changes: &LabelChanges,
    pool: &Pool<Postgres>,
) -> Result<Label, ApiError> {
    let row: Option<Label> = sqlx::query_as(&format!(
        "UPDATE {} SET name = COALESCE($3, name) WHERE id = $1 AND user_id = $2 RETURNING id, name",
        kind.table()
    ))
    .bind(id)
    .bind(owner)
    .bind(&changes.name)
    .fetch_optional(pool)
    .await?;

    row.ok_or(ApiError::NotFound)
}

/// Deletes the label and its recipe links; the recipes themselves stay.
pub async fn delete_label(
    kind: LabelKind,
    owner: Id,
    id: Id,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE id = $1 AND user_id = $2",
        kind.table()
    ))
    .bind(id)
    .bind(owner)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound);
    }

    Ok(())
}

async fn get_or_create_label(
    kind: LabelKind,
    owner: Id,
    name: &str,
    conn: &mut PgConnection,
) -> Result<Id, ApiError> {
    let existing: Option<(Id,)> = sqlx::query_as(&format!(
        "SELECT id FROM {} WHERE user_id = $1 AND name = $2 ORDER BY id LIMIT 1",
        kind.table()
    ))
    .bind(owner)
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some((id,)) = existing {
        return Ok(id);
    }

    let created: (Id,) = sqlx::query_as(&format!(
        "INSERT INTO {} (user_id, name) VALUES ($1, $2) RETURNING id",
        kind.table()
    ))
    .bind(owner)
    .bind(name)
    .fetch_one(&mut *conn)
    .await?;

    Ok(created.0)
}

/// Turns payload references into ids of labels owned by `owner`.
/// Names are looked up or created; ids must already belong to the owner.
pub async fn resolve_label_refs(
    kind: LabelKind,
    owner: Id,
    refs: &[LabelRef],
    conn: &mut PgConnection,
) -> Result<Vec<Id>, ApiError> {
    let mut ids: Vec<Id> = Vec::with_capacity(refs.len());

    for label in refs {
        let id = match label {
            LabelRef::Id(id) => {
                let row: Option<(Id,)> = sqlx::query_as(&format!(
                    "SELECT id FROM {} WHERE id = $1 AND user_id = $2",
                    kind.table()
                ))
                .bind(id)
                .bind(owner)
                .fetch_optional(&mut *conn)
                .await?;

                match row {
                    Some((id,)) => id,
                    None => {
                        return Err(ApiError::field(
                            kind.field(),
                            format!("Invalid pk \"{id}\" - object does not exist."),
                        ))
                    }
                }
            }
            LabelRef::Name(name) => get_or_create_label(kind, owner, name, &mut *conn).await?,
        };

        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    Ok(ids)
}

/// Replaces every link of `kind` on the recipe with `ids`.
pub async fn set_recipe_labels(
    kind: LabelKind,
    recipe_id: Id,
    ids: &[Id],
    conn: &mut PgConnection,
) -> Result<(), ApiError> {
    sqlx::query(&format!(
        "DELETE FROM {} WHERE recipe_id = $1",
        kind.link_table()
    ))
    .bind(recipe_id)
    .execute(&mut *conn)
    .await?;

    if ids.is_empty() {
        return Ok(());
    }

    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "INSERT INTO {} (recipe_id, {}) ",
        kind.link_table(),
        kind.link_column()
    ));

    query_builder.push_values(ids, |mut b, id| {
        b.push_bind(recipe_id).push_bind(*id);
    });
    query_builder.push(" ON CONFLICT DO NOTHING");

    query_builder.build().execute(&mut *conn).await?;

    Ok(())
}

/// Labels of `kind` linked to each of the given recipes, ordered by id.
pub async fn list_linked_labels(
    kind: LabelKind,
    recipe_ids: &[Id],
    pool: &Pool<Postgres>,
) -> Result<HashMap<Id, Vec<Label>>, ApiError> {
    if recipe_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<LinkedLabel> = sqlx::query_as(&format!(
        "
        SELECT x.recipe_id AS recipe_id, l.id AS id, l.name AS name
        FROM {link} x
        INNER JOIN {table} l ON l.id = x.{column}
        WHERE x.recipe_id = ANY($1)
        ORDER BY l.id
    ",
        link = kind.link_table(),
        table = kind.table(),
        column = kind.link_column(),
    ))
    .bind(recipe_ids.to_vec())
    .fetch_all(pool)
    .await?;

    let mut hashmap: HashMap<Id, Vec<Label>> = HashMap::new();
    rows.into_iter().for_each(|row| {
        hashmap.entry(row.recipe_id).or_default().push(row.into());
    });

    Ok(hashmap)
}

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::ApiError,
    filters::RecipeFilters,
    form::{LabelRef, NewRecipe, RecipeChanges},
    schema::{Id, LabelKind, Recipe, RecipeDetail, RecipeRow},
};

use super::labels::{list_linked_labels, resolve_label_refs, set_recipe_labels};

const LABEL_KINDS: [LabelKind; 2] = [LabelKind::Tag, LabelKind::Ingredient];

/// The owner's recipes, newest first. A recipe passes a label filter when it
/// links at least one of the listed ids.
pub async fn list_recipes(
    owner: Id,
    filters: &RecipeFilters,
    pool: &Pool<Postgres>,
) -> Result<Vec<Recipe>, ApiError> {
    let rows: Vec<RecipeRow> = sqlx::query_as(
        "
        SELECT r.*
        FROM recipes r
        WHERE r.user_id = $1
        AND ($2::INT4[] IS NULL OR EXISTS (
            SELECT 1 FROM recipe_tags rt WHERE rt.recipe_id = r.id AND rt.tag_id = ANY($2)
        ))
        AND ($3::INT4[] IS NULL OR EXISTS (
            SELECT 1 FROM recipe_ingredients ri WHERE ri.recipe_id = r.id AND ri.ingredient_id = ANY($3)
        ))
        ORDER BY r.id DESC
    ",
    )
    .bind(owner)
    .bind(filters.tags.clone())
    .bind(filters.ingredients.clone())
    .fetch_all(pool)
    .await?;

    let ids: Vec<Id> = rows.iter().map(|row| row.id).collect();
    let mut tags = list_linked_labels(LabelKind::Tag, &ids, pool).await?;
    let mut ingredients = list_linked_labels(LabelKind::Ingredient, &ids, pool).await?;

    Ok(rows
        .iter()
        .map(|row| {
            Recipe::from_row(
                row,
                tags.remove(&row.id).unwrap_or_default(),
                ingredients.remove(&row.id).unwrap_or_default(),
            )
        })
        .collect())
}

pub async fn get_recipe(owner: Id, id: Id, pool: &Pool<Postgres>) -> Result<RecipeDetail, ApiError> {
    let row: RecipeRow = sqlx::query_as("SELECT * FROM recipes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::NotFound)?;

    let mut tags = list_linked_labels(LabelKind::Tag, &[row.id], pool).await?;
    let mut ingredients = list_linked_labels(LabelKind::Ingredient, &[row.id], pool).await?;

    Ok(RecipeDetail::from_row(
        &row,
        tags.remove(&row.id).unwrap_or_default(),
        ingredients.remove(&row.id).unwrap_or_default(),
    ))
}

/// Inserts the recipe for `owner`, whatever owner the client may have sent.
pub async fn create_recipe(
    owner: Id,
    recipe: &NewRecipe,
    pool: &Pool<Postgres>,
) -> Result<RecipeDetail, ApiError> {
    let mut tr = pool.begin().await?;

    let id: (Id,) = sqlx::query_as(
        "
        INSERT INTO recipes (user_id, title, description, time_minutes, price_cents, link)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
    ",
    )
    .bind(owner)
    .bind(&recipe.title)
    .bind(&recipe.description)
    .bind(recipe.time_minutes)
    .bind(recipe.price.cents())
    .bind(&recipe.link)
    .fetch_one(&mut *tr)
    .await?;

    for kind in LABEL_KINDS {
        link_labels(kind, owner, id.0, recipe.labels(kind), &mut tr).await?;
    }

    tr.commit().await?;
    log::debug!("Created recipe {} for user {owner}", id.0);

    get_recipe(owner, id.0, pool).await
}

/// Applies the present fields. Label lists, when present, replace the
/// current links.
pub async fn update_recipe(
    owner: Id,
    id: Id,
    changes: &RecipeChanges,
    pool: &Pool<Postgres>,
) -> Result<RecipeDetail, ApiError> {
    let mut tr = pool.begin().await?;

    let owned: Option<(Id,)> =
        sqlx::query_as("SELECT id FROM recipes WHERE id = $1 AND user_id = $2 FOR UPDATE")
            .bind(id)
            .bind(owner)
            .fetch_optional(&mut *tr)
            .await?;

    if owned.is_none() {
        return Err(ApiError::NotFound);
    }

    sqlx::query(
        "
        UPDATE recipes SET
        title = COALESCE($3, title),
        description = COALESCE($4, description),
        time_minutes = COALESCE($5, time_minutes),
        price_cents = COALESCE($6, price_cents),
        link = COALESCE($7, link)
        WHERE id = $1 AND user_id = $2
    ",
    )
    .bind(id)
    .bind(owner)
    .bind(&changes.title)
    .bind(&changes.description)
    .bind(changes.time_minutes)
    .bind(changes.price.map(|price| price.cents()))
    .bind(&changes.link)
    .execute(&mut *tr)
    .await?;

    for kind in LABEL_KINDS {
        if let Some(refs) = changes.labels(kind) {
            link_labels(kind, owner, id, refs, &mut tr).await?;
        }
    }

    tr.commit().await?;

    get_recipe(owner, id, pool).await
}

/// Deletes the recipe and its links; tags and ingredients are kept.
pub async fn delete_recipe(owner: Id, id: Id, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(owner)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound);
    }

    Ok(())
}

async fn link_labels(
    kind: LabelKind,
    owner: Id,
    recipe_id: Id,
    refs: &[LabelRef],
    conn: &mut PgConnection,
) -> Result<(), ApiError> {
    let ids = resolve_label_refs(kind, owner, refs, &mut *conn).await?;
    set_recipe_labels(kind, recipe_id, &ids, &mut *conn).await
}

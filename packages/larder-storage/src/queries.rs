use sqlx::{Postgres, QueryBuilder, Transaction};

use larder_taxonomy::Winner;

use crate::{
	Error, Result,
	db::Db,
	models::{RecipeCategory, RecipeEmbedding, TaxonomyNodeRecord},
};

pub async fn fetch_taxonomy_nodes(db: &Db) -> Result<Vec<TaxonomyNodeRecord>> {
	let rows = sqlx::query_as::<_, TaxonomyNodeRecord>(
		"\
SELECT node_id, parent_id, title, centroid
FROM taxonomy_nodes
ORDER BY node_id ASC",
	)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// One keyset page of embeddings for recipes that carry no category yet.
pub async fn fetch_unassigned_embeddings(
	db: &Db,
	after_recipe_id: i64,
	limit: i64,
) -> Result<Vec<RecipeEmbedding>> {
	validate_limit(limit)?;

	let rows = sqlx::query_as::<_, RecipeEmbedding>(
		"\
SELECT e.recipe_id, e.vec, e.dim
FROM recipe_embeddings e
WHERE e.recipe_id > $1
	AND NOT EXISTS (
		SELECT 1
		FROM recipe_categories c
		WHERE c.recipe_id = e.recipe_id
	)
ORDER BY e.recipe_id ASC
LIMIT $2",
	)
	.bind(after_recipe_id)
	.bind(limit)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// One keyset page of embeddings for every recipe, assigned or not.
pub async fn fetch_all_embeddings(
	db: &Db,
	after_recipe_id: i64,
	limit: i64,
) -> Result<Vec<RecipeEmbedding>> {
	validate_limit(limit)?;

	let rows = sqlx::query_as::<_, RecipeEmbedding>(
		"\
SELECT recipe_id, vec, dim
FROM recipe_embeddings
WHERE recipe_id > $1
ORDER BY recipe_id ASC
LIMIT $2",
	)
	.bind(after_recipe_id)
	.bind(limit)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn fetch_recipe_categories(db: &Db, recipe_id: i64) -> Result<Vec<RecipeCategory>> {
	let rows = sqlx::query_as::<_, RecipeCategory>(
		"\
SELECT recipe_id, category_id, score, method, assigned_at
FROM recipe_categories
WHERE recipe_id = $1
ORDER BY score DESC, category_id ASC",
	)
	.bind(recipe_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Replaces every category of `recipe_id` with `winners` in one transaction.
pub async fn replace_recipe_categories(db: &Db, recipe_id: i64, winners: &[Winner]) -> Result<()> {
	let mut tx = db.pool.begin().await?;

	replace_recipe_categories_tx(&mut tx, recipe_id, winners).await?;

	tx.commit().await?;

	Ok(())
}

pub async fn replace_recipe_categories_tx(
	tx: &mut Transaction<'_, Postgres>,
	recipe_id: i64,
	winners: &[Winner],
) -> Result<()> {
	sqlx::query("DELETE FROM recipe_categories WHERE recipe_id = $1")
		.bind(recipe_id)
		.execute(&mut **tx)
		.await?;

	if winners.is_empty() {
		return Ok(());
	}

	let mut builder = QueryBuilder::<Postgres>::new(
		"\
INSERT INTO recipe_categories (
	recipe_id,
	category_id,
	score,
	method
) ",
	);

	builder.push_values(winners, |mut b, winner| {
		b.push_bind(recipe_id)
			.push_bind(winner.category_id)
			.push_bind(winner.score)
			.push_bind(winner.kind.as_str());
	});
	builder.build().execute(&mut **tx).await?;

	Ok(())
}

pub async fn upsert_taxonomy_node(
	db: &Db,
	node_id: i64,
	parent_id: Option<i64>,
	title: &str,
	centroid: Option<&[u8]>,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO taxonomy_nodes (node_id, parent_id, title, centroid)
VALUES ($1, $2, $3, $4)
ON CONFLICT (node_id) DO UPDATE
SET
	parent_id = EXCLUDED.parent_id,
	title = EXCLUDED.title,
	centroid = EXCLUDED.centroid,
	updated_at = now()",
	)
	.bind(node_id)
	.bind(parent_id)
	.bind(title)
	.bind(centroid)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn upsert_recipe_embedding(db: &Db, recipe_id: i64, vec: &[u8], dim: i32) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO recipe_embeddings (recipe_id, vec, dim)
VALUES ($1, $2, $3)
ON CONFLICT (recipe_id) DO UPDATE
SET
	vec = EXCLUDED.vec,
	dim = EXCLUDED.dim,
	updated_at = now()",
	)
	.bind(recipe_id)
	.bind(vec)
	.bind(dim)
	.execute(&db.pool)
	.await?;

	Ok(())
}

fn validate_limit(limit: i64) -> Result<()> {
	if limit <= 0 {
		return Err(Error::InvalidArgument(format!("Page limit must be positive, got {limit}.")));
	}

	Ok(())
}

use std::{future::Future, pin::Pin};

use larder_storage::{db::Db, models::RecipeEmbedding, queries};
use larder_taxonomy::{NodeRow, Winner};

use crate::Result;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Which recipes a pass should visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemScope {
	/// Recipes without any category row.
	Unassigned,
	/// Every recipe with an embedding.
	All,
}

pub trait AssignmentStore
where
	Self: Send + Sync,
{
	fn taxonomy<'a>(&'a self) -> BoxFuture<'a, Result<Vec<NodeRow>>>;

	/// Up to `limit` items with an id greater than `after`, in ascending id order.
	fn items<'a>(
		&'a self,
		scope: ItemScope,
		after: i64,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<RecipeEmbedding>>>;

	/// Atomically replaces every assignment of `item_id` with `winners`.
	fn replace_assignments<'a>(
		&'a self,
		item_id: i64,
		winners: &'a [Winner],
	) -> BoxFuture<'a, Result<()>>;
}

pub struct PgStore {
	pub db: Db,
}
impl AssignmentStore for PgStore {
	fn taxonomy<'a>(&'a self) -> BoxFuture<'a, Result<Vec<NodeRow>>> {
		Box::pin(async move {
			let records = queries::fetch_taxonomy_nodes(&self.db).await?;

			Ok(records.into_iter().map(|record| record.into_node_row()).collect())
		})
	}

	fn items<'a>(
		&'a self,
		scope: ItemScope,
		after: i64,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<RecipeEmbedding>>> {
		Box::pin(async move {
			let limit = i64::from(limit);
			let rows = match scope {
				ItemScope::Unassigned =>
					queries::fetch_unassigned_embeddings(&self.db, after, limit).await?,
				ItemScope::All => queries::fetch_all_embeddings(&self.db, after, limit).await?,
			};

			Ok(rows)
		})
	}

	fn replace_assignments<'a>(
		&'a self,
		item_id: i64,
		winners: &'a [Winner],
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			queries::replace_recipe_categories(&self.db, item_id, winners).await?;

			Ok(())
		})
	}
}

use time::OffsetDateTime;

use larder_taxonomy::{
	NodeRow,
	vector::{self, VectorError},
};

#[derive(Debug, sqlx::FromRow)]
pub struct TaxonomyNodeRecord {
	pub node_id: i64,
	pub parent_id: Option<i64>,
	pub title: String,
	pub centroid: Option<Vec<u8>>,
}
impl TaxonomyNodeRecord {
	pub fn into_node_row(self) -> NodeRow {
		NodeRow {
			node_id: self.node_id,
			parent_id: self.parent_id,
			title: self.title,
			centroid: self.centroid.as_deref().map(vector::decode_vector),
		}
	}
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecipeEmbedding {
	pub recipe_id: i64,
	pub vec: Vec<u8>,
	pub dim: i32,
}
impl RecipeEmbedding {
	/// Decodes the stored bytes and checks them against the declared dimension.
	pub fn decode(&self) -> Result<Vec<f32>, VectorError> {
		let decoded = vector::decode_vector(&self.vec);
		let declared = usize::try_from(self.dim).unwrap_or(0);

		vector::validate_vector(&decoded, declared)?;

		Ok(decoded)
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct RecipeCategory {
	pub recipe_id: i64,
	pub category_id: i64,
	pub score: f64,
	pub method: String,
	pub assigned_at: OffsetDateTime,
}

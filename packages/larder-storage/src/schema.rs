pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_taxonomy_nodes.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_taxonomy_nodes.sql")),
				"tables/002_recipe_embeddings.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_recipe_embeddings.sql")),
				"tables/003_recipe_categories.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_recipe_categories.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn includes_are_expanded() {
		let sql = render_schema();

		assert!(!sql.contains("\\ir "));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS taxonomy_nodes"));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS recipe_embeddings"));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS recipe_categories"));
	}

	#[test]
	fn unknown_includes_are_left_verbatim() {
		let sql = expand_includes("\\ir tables/999_missing.sql\nSELECT 1");

		assert_eq!(sql, "\\ir tables/999_missing.sql\nSELECT 1\n");
	}
}

pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_groups.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_groups.sql")),
				"tables/002_group_activity_log.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_group_activity_log.sql")),
				"tables/003_friendships.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_friendships.sql")),
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
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS groups"));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS group_activity_log"));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS friendships"));
	}
}

//! Reference schema for the tag and association tables
//!
//! Applications normally provision these tables through their own
//! migrations. [`create_tables`] is provided for tests and quick setups.

use crate::backend::TagDatabase;
use crate::config::TableNames;
use crate::error::Result;
use sea_query::{Alias, ColumnDef, ForeignKey, ForeignKeyAction, Index, Table};

/// Create the tags and taggables tables with their indexes
///
/// Existing tables are left untouched.
pub async fn create_tables(db: &TagDatabase, tables: &TableNames) -> Result<()> {
	let tags = Alias::new(tables.tags.clone());
	let taggables = Alias::new(tables.taggables.clone());

	let stmt = Table::create()
		.table(tags.clone())
		.if_not_exists()
		.col(
			ColumnDef::new(Alias::new("tag_id"))
				.big_integer()
				.not_null()
				.auto_increment()
				.primary_key(),
		)
		.col(ColumnDef::new(Alias::new("name")).string_len(255).not_null())
		.col(ColumnDef::new(Alias::new("normalized")).string_len(255).not_null())
		.col(ColumnDef::new(Alias::new("created_at")).string_len(64).not_null())
		.col(ColumnDef::new(Alias::new("updated_at")).string_len(64).not_null())
		.to_owned();
	db.execute(&db.build_table_sql(stmt)).await?;

	let index_stmt = Index::create()
		.if_not_exists()
		.name(format!("{}_normalized_unique", tables.tags))
		.table(tags.clone())
		.col(Alias::new("normalized"))
		.unique()
		.to_owned();
	db.execute(&db.build_index_sql(&index_stmt)).await?;

	let stmt = Table::create()
		.table(taggables.clone())
		.if_not_exists()
		// Insertion sequence, which is the attachment order of an entity's tags
		.col(
			ColumnDef::new(Alias::new("id"))
				.big_integer()
				.not_null()
				.auto_increment()
				.primary_key(),
		)
		.col(ColumnDef::new(Alias::new("tag_id")).big_integer().not_null())
		.col(ColumnDef::new(Alias::new("taggable_id")).big_integer().not_null())
		.col(ColumnDef::new(Alias::new("taggable_type")).string_len(255).not_null())
		.col(ColumnDef::new(Alias::new("created_at")).string_len(64).not_null())
		.col(ColumnDef::new(Alias::new("updated_at")).string_len(64).not_null())
		.foreign_key(
			ForeignKey::create()
				.from(taggables.clone(), Alias::new("tag_id"))
				.to(tags.clone(), Alias::new("tag_id"))
				.on_delete(ForeignKeyAction::Cascade),
		)
		.to_owned();
	db.execute(&db.build_table_sql(stmt)).await?;

	let indexes = [
		(
			format!("{}_unique", tables.taggables),
			vec!["tag_id", "taggable_id", "taggable_type"],
			true,
		),
		(
			format!("{}_tag_id_taggable_id_index", tables.taggables),
			vec!["tag_id", "taggable_id"],
			false,
		),
		(
			format!("{}_taggable_id_tag_id_index", tables.taggables),
			vec!["taggable_id", "tag_id"],
			false,
		),
	];
	for (name, columns, unique) in indexes {
		let mut index_stmt = Index::create();
		index_stmt.if_not_exists().name(name).table(taggables.clone());
		for column in columns {
			index_stmt.col(Alias::new(column));
		}
		if unique {
			index_stmt.unique();
		}
		db.execute(&db.build_index_sql(&index_stmt)).await?;
	}

	tracing::info!(
		tags_table = %tables.tags,
		taggables_table = %tables.taggables,
		"Created tagging tables"
	);

	Ok(())
}

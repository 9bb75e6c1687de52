//! Integration tests for non-default tag configuration
//!
//! Delimiters, glue, normalizers, table names, custom tag records and
//! settings loaded from TOML.

use crate::fixtures::{
	ColoredTag, Post, create_post, create_widget, service_with_config, tag_db_with_tables,
};
use reinhardt_taggable::config::{TableNames, TagSettings};
use reinhardt_taggable::prelude::*;
use reinhardt_taggable::DatabaseBackend;
use rstest::rstest;

/// Test custom delimiters split a tag string
#[rstest]
#[tokio::test]
async fn test_custom_delimiters() {
	// Arrange
	let config = TagConfig::builder().delimiters(";/,|").build();
	let service = service_with_config(config).await;
	let mut post = create_post(service.database(), "post").await;

	// Act
	post.tag(&service, "Apple;Banana/Cherry,Durian|Etrog")
		.await
		.unwrap();

	// Assert
	assert_eq!(
		post.tag_array(),
		vec!["Apple", "Banana", "Cherry", "Durian", "Etrog"]
	);
}

/// Test custom glue joins tag lists
#[rstest]
#[tokio::test]
async fn test_custom_glue() {
	// Arrange
	let config = TagConfig::builder().glue(" | ").build();
	let service = service_with_config(config).await;
	let mut post = create_post(service.database(), "post").await;

	// Act
	post.tag(&service, "Apple,Banana,Cherry").await.unwrap();

	// Assert
	assert_eq!(post.tag_list(&service), "Apple | Banana | Cherry");
	assert_eq!(
		Post::all_tags_list(&service).await.unwrap(),
		"Apple | Banana | Cherry"
	);
}

/// Test a custom normalizer decides which names are the same tag
#[rstest]
#[tokio::test]
async fn test_custom_normalizer() {
	// Arrange
	let config = TagConfig::builder()
		.normalizer_fn(|name: &str| name.chars().rev().collect())
		.build();
	let service = service_with_config(config).await;
	let mut post = create_post(service.database(), "post").await;

	// Act
	post.tag(&service, "Apple,apple").await.unwrap();

	// Assert
	assert_eq!(post.tag_array(), vec!["Apple", "apple"]);
	assert_eq!(post.tag_array_normalized(), vec!["elppA", "elppa"]);
	assert!(post.has_tag(&service, "apple"));
	assert!(!post.has_tag(&service, "APPLE"));
}

/// Test custom table names are used by every operation
#[rstest]
#[tokio::test]
async fn test_custom_table_names() {
	// Arrange
	let config = TagConfig::builder()
		.tags_table("custom_tags")
		.taggables_table("custom_taggables")
		.build();
	let service = service_with_config(config).await;
	let mut post = create_post(service.database(), "post").await;

	// Act
	post.tag(&service, "Apple,Banana").await.unwrap();
	let sql = Post::query(&service)
		.with_any_tags("Apple")
		.to_sql()
		.await
		.unwrap();
	let keys = Post::query(&service)
		.with_any_tags("Apple")
		.keys()
		.await
		.unwrap();

	// Assert
	assert_eq!(post.tag_array(), vec!["Apple", "Banana"]);
	assert!(sql.contains("custom_taggables_withanytags_1"));
	assert_eq!(keys, vec![post.id]);
	assert_eq!(service.popular_tags(None, None, 1).await.unwrap().len(), 2);
}

/// Test a custom tag record type with an extra column
#[rstest]
#[tokio::test]
async fn test_custom_tag_model() {
	// Arrange
	let db = tag_db_with_tables(&TableNames::default()).await;
	sqlx::query("ALTER TABLE taggable_tags ADD COLUMN color TEXT")
		.execute(db.pool())
		.await
		.unwrap();
	let service: TagService<ColoredTag> = TagService::new(db, TagConfig::default());
	let mut widget = create_widget(service.database(), "widget").await;

	// Act
	widget.tag(&service, "Red,Green").await.unwrap();
	sqlx::query("UPDATE taggable_tags SET color = 'ff0000' WHERE normalized = 'red'")
		.execute(service.database().pool())
		.await
		.unwrap();
	widget.load_tags(&service).await.unwrap();

	// Assert
	let colors: Vec<Option<&str>> = widget
		.labels
		.iter()
		.map(|tag| tag.color.as_deref())
		.collect();
	assert_eq!(widget.tag_array(), vec!["Red", "Green"]);
	assert_eq!(colors, vec![Some("ff0000"), None]);
}

/// Test settings loaded from TOML drive the service
#[rstest]
#[tokio::test]
async fn test_settings_from_toml() {
	// Arrange
	let settings = TagSettings::from_toml(
		r#"
		delimiters = "|"
		glue = "; "
		normalizer = "identity"

		[tables]
		tags = "toml_tags"
		taggables = "toml_taggables"
		"#,
	)
	.unwrap();
	let config = TagConfig::try_from(settings).unwrap();
	let service = service_with_config(config).await;
	let mut post = create_post(service.database(), "post").await;

	// Act
	post.tag(&service, "Apple|apple|Banana,Cherry").await.unwrap();

	// Assert
	assert_eq!(post.tag_list(&service), "Apple; apple; Banana,Cherry");
}

/// Test from_config opens its own pool when a connection is configured
#[rstest]
#[tokio::test]
async fn test_from_config_connection() {
	// Arrange
	let default_db = tag_db_with_tables(&TableNames::default()).await;
	let dedicated = TagConfig::builder().connection("sqlite::memory:").build();

	// Act
	let own: TagService = TagService::from_config(default_db.clone(), TagConfig::default())
		.await
		.unwrap();
	let other: TagService = TagService::from_config(default_db, dedicated).await.unwrap();

	// Assert
	assert!(own.find_or_create("Apple").await.is_ok());
	assert_eq!(other.database().backend(), DatabaseBackend::Sqlite);
	assert_eq!(other.config().connection.as_deref(), Some("sqlite::memory:"));
}

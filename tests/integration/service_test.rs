//! Integration tests for TagService aggregate operations
//!
//! Covers tag lookup and creation, popular tags, renaming, unused tags and
//! key resolution.

use crate::fixtures::{Dummy, Post, create_dummy, create_post, tag_db_with_tables, tag_service};
use reinhardt_taggable::config::TableNames;
use reinhardt_taggable::prelude::*;
use reinhardt_taggable::TagField;
use rstest::{fixture, rstest};
use std::sync::Arc;

/// Service where posts and dummies give the usage counts
/// Apple 7, Cherry 6, Durian 5, Banana 3
#[fixture]
async fn popular_service(#[future] tag_service: TagService) -> TagService {
	let service = tag_service.await;
	for tags in [
		"Apple,Banana,Cherry",
		"Apple,Banana,Cherry",
		"Apple,Banana",
		"Apple,Cherry",
		"Apple,Cherry,Durian",
		"Apple,Durian",
	] {
		let mut post = create_post(service.database(), "post").await;
		post.tag(&service, tags).await.unwrap();
	}
	for tags in ["Apple,Cherry,Durian", "Cherry,Durian", "Durian"] {
		let mut dummy = create_dummy(service.database(), "dummy").await;
		dummy.tag(&service, tags).await.unwrap();
	}
	service
}

/// Service with one post and one dummy sharing Apple
#[fixture]
async fn rename_service(#[future] tag_service: TagService) -> TagService {
	let service = tag_service.await;
	let mut post = create_post(service.database(), "post").await;
	post.tag(&service, "Apple,Banana,Cherry").await.unwrap();
	let mut dummy = create_dummy(service.database(), "dummy").await;
	dummy.tag(&service, "Apple,Durian").await.unwrap();
	service
}

fn names(popular: &[reinhardt_taggable::PopularTag]) -> Vec<(&str, i64)> {
	popular
		.iter()
		.map(|p| (p.tag.name.as_str(), p.count))
		.collect()
}

/// Test find_or_create returns the same row for equal normalized names
#[rstest]
#[tokio::test]
async fn test_find_or_create(#[future] tag_service: TagService) {
	// Arrange
	let service = tag_service.await;

	// Act
	let first = service.find_or_create(" Apple ").await.unwrap();
	let second = service.find_or_create("APPLE").await.unwrap();

	// Assert
	assert_eq!(first.tag_id, second.tag_id);
	assert_eq!(first.name, "Apple");
	assert_eq!(first.normalized, "apple");
	assert_eq!(second.name, "Apple");
}

/// Test find_or_create rejects a blank name
#[rstest]
#[tokio::test]
async fn test_find_or_create_blank(#[future] tag_service: TagService) {
	// Arrange
	let service = tag_service.await;

	// Act
	let result = service.find_or_create("   ").await;

	// Assert
	assert!(matches!(result, Err(TaggableError::InvalidTagInput(_))));
}

/// Test find looks tags up by normalized name
#[rstest]
#[tokio::test]
async fn test_find(#[future] tag_service: TagService) {
	// Arrange
	let service = tag_service.await;
	let created = service.find_or_create("Apple").await.unwrap();

	// Act
	let found = service.find("aPPle").await.unwrap();
	let missing = service.find("Kumquat").await.unwrap();

	// Assert
	assert_eq!(found.map(|tag| tag.tag_id), Some(created.tag_id));
	assert!(missing.is_none());
}

/// Test building name lists from input
#[rstest]
#[tokio::test]
async fn test_build_name_lists(#[future] tag_service: TagService) {
	// Arrange
	let service = tag_service.await;

	// Act
	let names = service.build_tag_name_list("Apple; Banana,,Cherry ");
	let normalized = service.build_normalized_name_list(vec!["Apple", " BANANA "]);

	// Assert
	assert_eq!(names, vec!["Apple", "Banana", "Cherry"]);
	assert_eq!(normalized, vec!["apple", "banana"]);
}

/// Test popular tags across every content type
#[rstest]
#[tokio::test]
async fn test_popular_tags(#[future] popular_service: TagService) {
	// Arrange
	let service = popular_service.await;

	// Act
	let popular = service.popular_tags(None, None, 1).await.unwrap();

	// Assert
	assert_eq!(
		names(&popular),
		vec![("Apple", 7), ("Cherry", 6), ("Durian", 5), ("Banana", 3)]
	);
}

/// Test popular tags with a limit
#[rstest]
#[tokio::test]
async fn test_popular_tags_limited(#[future] popular_service: TagService) {
	// Arrange
	let service = popular_service.await;

	// Act
	let popular = service.popular_tags(Some(2), None, 1).await.unwrap();
	let dummies = service.popular_tags(Some(2), Some("Dummy"), 1).await.unwrap();

	// Assert
	assert_eq!(names(&popular), vec![("Apple", 7), ("Cherry", 6)]);
	assert_eq!(names(&dummies), vec![("Durian", 3), ("Cherry", 2)]);
}

/// Test popular tags with a minimum count
#[rstest]
#[tokio::test]
async fn test_popular_tags_min_count(#[future] popular_service: TagService) {
	// Arrange
	let service = popular_service.await;

	// Act
	let popular = service.popular_tags(None, None, 5).await.unwrap();
	let posts = Post::popular_tags(&service, None, 5).await.unwrap();

	// Assert
	assert_eq!(popular.len(), 3);
	assert_eq!(posts, vec![("Apple".to_string(), 6)]);
}

/// Test normalized popular pairs
#[rstest]
#[tokio::test]
async fn test_popular_tags_normalized(#[future] popular_service: TagService) {
	// Arrange
	let service = popular_service.await;

	// Act
	let popular = Dummy::popular_tags_normalized(&service, Some(1), 1)
		.await
		.unwrap();

	// Assert
	assert_eq!(popular, vec![("durian".to_string(), 3)]);
}

/// Test renaming a tag for one content type only
#[rstest]
#[tokio::test]
async fn test_rename_scoped(#[future] rename_service: TagService) {
	// Arrange
	let service = rename_service.await;

	// Act
	let renamed = Post::rename_tag(&service, "Apple", "Apricot").await.unwrap();

	// Assert
	assert_eq!(renamed, 1);
	assert_eq!(
		Post::all_tags(&service).await.unwrap(),
		vec!["Apricot", "Banana", "Cherry"]
	);
	assert_eq!(Dummy::all_tags(&service).await.unwrap(), vec!["Apple", "Durian"]);
	assert_eq!(service.all_tags(None).await.unwrap().len(), 5);
}

/// Test renaming a tag everywhere
#[rstest]
#[tokio::test]
async fn test_rename_everywhere(#[future] rename_service: TagService) {
	// Arrange
	let service = rename_service.await;

	// Act
	let renamed = service.rename_tags("apple", "Apricot", None).await.unwrap();

	// Assert
	assert_eq!(renamed, 1);
	assert_eq!(
		Post::all_tags(&service).await.unwrap(),
		vec!["Apricot", "Banana", "Cherry"]
	);
	assert_eq!(
		Dummy::all_tags(&service).await.unwrap(),
		vec!["Apricot", "Durian"]
	);
	assert_eq!(service.all_tags(None).await.unwrap().len(), 4);
}

/// Test renaming only the display spelling of a tag
#[rstest]
#[tokio::test]
async fn test_rename_case_only(#[future] rename_service: TagService) {
	// Arrange
	let service = rename_service.await;

	// Act
	let renamed = service.rename_tags("Apple", "APPLE", None).await.unwrap();

	// Assert
	assert_eq!(renamed, 1);
	assert_eq!(service.find("apple").await.unwrap().unwrap().name, "APPLE");
}

/// Test renaming a tag that does not exist
#[rstest]
#[tokio::test]
async fn test_rename_unknown(#[future] rename_service: TagService) {
	// Arrange
	let service = rename_service.await;

	// Act
	let everywhere = service.rename_tags("Kumquat", "Apricot", None).await.unwrap();
	let scoped = Post::rename_tag(&service, "Kumquat", "Apricot").await.unwrap();

	// Assert
	assert_eq!(everywhere, 0);
	assert_eq!(scoped, 0);
	assert!(service.find("Apricot").await.unwrap().is_none());
}

/// Test renaming onto another existing tag everywhere is a conflict
#[rstest]
#[tokio::test]
async fn test_rename_conflict(#[future] rename_service: TagService) {
	// Arrange
	let service = rename_service.await;

	// Act
	let result = service.rename_tags("Apple", "BANANA", None).await;

	// Assert
	assert!(matches!(result, Err(TaggableError::RenameConflict { .. })));
	assert_eq!(service.all_tags(None).await.unwrap().len(), 4);
}

/// Test a scoped rename onto an existing tag merges the associations
#[rstest]
#[tokio::test]
async fn test_rename_scoped_merge(#[future] tag_service: TagService) {
	// Arrange
	let service = tag_service.await;
	let mut first = create_post(service.database(), "first").await;
	first.tag(&service, "Apple,Banana").await.unwrap();
	let mut second = create_post(service.database(), "second").await;
	second.tag(&service, "Apple").await.unwrap();

	// Act
	let renamed = Post::rename_tag(&service, "Apple", "Banana").await.unwrap();
	first.load_tags(&service).await.unwrap();
	second.load_tags(&service).await.unwrap();

	// Assert
	assert_eq!(renamed, 1);
	assert_eq!(first.tag_array(), vec!["Banana"]);
	assert_eq!(second.tag_array(), vec!["Banana"]);
}

/// Test rename rejects a blank new name
#[rstest]
#[tokio::test]
async fn test_rename_blank(#[future] rename_service: TagService) {
	// Arrange
	let service = rename_service.await;

	// Act
	let result = service.rename_tags("Apple", "  ", None).await;

	// Assert
	assert!(matches!(result, Err(TaggableError::InvalidTagInput(_))));
}

/// Test all tags, arrays and lists
#[rstest]
#[tokio::test]
async fn test_all_tags(#[future] rename_service: TagService) {
	// Arrange
	let service = rename_service.await;

	// Act
	let array = service.all_tags_array(None).await.unwrap();
	let normalized = service.all_tags_array_normalized(None).await.unwrap();
	let list = service.all_tags_list(Some("Dummy")).await.unwrap();

	// Assert
	assert_eq!(array, vec!["Apple", "Banana", "Cherry", "Durian"]);
	assert_eq!(normalized, vec!["apple", "banana", "cherry", "durian"]);
	assert_eq!(list, "Apple,Durian");
}

/// Test tags without associations are reported as unused
#[rstest]
#[tokio::test]
async fn test_unused_tags(#[future] tag_service: TagService) {
	// Arrange
	let service = tag_service.await;
	let mut post = create_post(service.database(), "post").await;
	post.tag(&service, "Apple,Banana,Cherry").await.unwrap();

	// Act
	post.untag(&service, "Apple,Banana").await.unwrap();
	let unused = service.unused_tags().await.unwrap();

	// Assert
	assert_eq!(service.tag_list(&unused, TagField::Name), "Apple,Banana");
	assert_eq!(post.tag_array(), vec!["Cherry"]);
}

/// Test resolving normalized names to tag keys
#[rstest]
#[tokio::test]
async fn test_tag_model_keys(#[future] rename_service: TagService) {
	// Arrange
	let service = rename_service.await;

	// Act
	let keys = service
		.tag_model_keys(&["apple".to_string(), "cherry".to_string(), "kumquat".to_string()])
		.await
		.unwrap();

	// Assert
	assert_eq!(keys, vec![1, 3]);
}

/// Test loading tags by key
#[rstest]
#[tokio::test]
async fn test_find_by_ids(#[future] rename_service: TagService) {
	// Arrange
	let service = rename_service.await;

	// Act
	let tags = service.find_by_ids(&[3, 1, 42]).await.unwrap();

	// Assert
	assert_eq!(service.tag_list(&tags, TagField::Normalized), "apple,cherry");
}

/// Service over the test database speaking the MySQL dialect
///
/// MySQL has no `ON CONFLICT`, so duplicates surface as unique-index
/// violations. SQLite accepts the backtick-quoted statements.
async fn mysql_dialect_service() -> TagService {
	let db = tag_db_with_tables(&TableNames::default()).await;
	let db = TagDatabase::from_pool(Arc::new(db.pool().clone()), "mysql://localhost/tags");
	assert!(!db.backend().supports_on_conflict());
	TagService::new(db, TagConfig::default())
}

/// Test a duplicate insert is reported as a unique violation
#[rstest]
#[tokio::test]
async fn test_unique_violation_detected(#[future] tag_service: TagService) {
	// Arrange
	let service = tag_service.await;
	let insert = "INSERT INTO taggable_tags (name, normalized, created_at, updated_at) \
		VALUES ('Apple', 'apple', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')";
	sqlx::query(insert)
		.execute(service.database().pool())
		.await
		.unwrap();

	// Act
	let err: TaggableError = sqlx::query(insert)
		.execute(service.database().pool())
		.await
		.unwrap_err()
		.into();

	// Assert
	assert!(err.is_unique_violation());
}

/// Test attaching twice without ON CONFLICT keeps one association
#[rstest]
#[tokio::test]
async fn test_attach_without_on_conflict() {
	// Arrange
	let service = mysql_dialect_service().await;
	let post = create_post(service.database(), "post").await;
	let apple = service.find_or_create("Apple").await.unwrap();
	let items = service.tagged_item_store();

	// Act
	let first = items.attach(apple.tag_id, post.id, "Post").await.unwrap();
	let second = items.attach(apple.tag_id, post.id, "Post").await.unwrap();

	// Assert
	assert!(first);
	assert!(!second);
	assert_eq!(items.items_for_object("Post", post.id).await.unwrap().len(), 1);
}

/// Test concurrent find_or_create without ON CONFLICT yields one tag
#[rstest]
#[tokio::test]
async fn test_concurrent_find_or_create_without_on_conflict() {
	// Arrange
	let service = mysql_dialect_service().await;

	// Act
	let (first, second) = tokio::join!(
		service.find_or_create("Apple"),
		service.find_or_create("APPLE")
	);

	// Assert
	assert_eq!(first.unwrap().tag_id, second.unwrap().tag_id);
	assert_eq!(service.all_tags(None).await.unwrap().len(), 1);
}

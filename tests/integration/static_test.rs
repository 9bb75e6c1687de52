//! Integration tests for the per-model static helpers of TaggableExt

use crate::fixtures::{Dummy, Post, create_dummy, create_post, tag_service};
use reinhardt_taggable::prelude::*;
use rstest::{fixture, rstest};

/// Three tagged posts and one tagged dummy
#[fixture]
async fn static_service(#[future] tag_service: TagService) -> TagService {
	let service = tag_service.await;
	for tags in ["Apple,Banana,Cherry", "Apple,Cherry", "Apple"] {
		let mut post = create_post(service.database(), "post").await;
		post.tag(&service, tags).await.unwrap();
	}
	let mut dummy = create_dummy(service.database(), "dummy").await;
	dummy.tag(&service, "Apple,Durian").await.unwrap();
	service
}

/// Test all tags of one model
#[rstest]
#[tokio::test]
async fn test_all_tags(#[future] static_service: TagService) {
	// Arrange
	let service = static_service.await;

	// Act
	let posts = Post::all_tags(&service).await.unwrap();
	let list = Post::all_tags_list(&service).await.unwrap();
	let models = Dummy::all_tag_models(&service).await.unwrap();

	// Assert
	assert_eq!(posts, vec!["Apple", "Banana", "Cherry"]);
	assert_eq!(list, "Apple,Banana,Cherry");
	assert_eq!(
		models.iter().map(|tag| tag.normalized.as_str()).collect::<Vec<_>>(),
		vec!["apple", "durian"]
	);
}

/// Test popular tags of one model
#[rstest]
#[tokio::test]
async fn test_popular_tags(#[future] static_service: TagService) {
	// Arrange
	let service = static_service.await;

	// Act
	let popular = Post::popular_tags(&service, None, 1).await.unwrap();

	// Assert
	assert_eq!(
		popular,
		vec![
			("Apple".to_string(), 3),
			("Cherry".to_string(), 2),
			("Banana".to_string(), 1),
		]
	);
}

/// Test renaming through the model keeps other models untouched
#[rstest]
#[tokio::test]
async fn test_rename_tag(#[future] static_service: TagService) {
	// Arrange
	let service = static_service.await;

	// Act
	Post::rename_tag(&service, "Apple", "Apricot").await.unwrap();

	// Assert
	assert_eq!(
		Post::all_tags_list(&service).await.unwrap(),
		"Apricot,Banana,Cherry"
	);
	assert_eq!(Dummy::all_tags_list(&service).await.unwrap(), "Apple,Durian");
}

//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test -p vidtube-db --features db-integration`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `vidtube_test`)
//!   `TEST_DB_PASSWORD` (default: `vidtube_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]
#![cfg(feature = "db-integration")]

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseBackend, Set, Statement};
use vidtube_common::AppError;
use vidtube_db::entities::{like, subscription};
use vidtube_db::repositories::{LikeRepository, SubscriptionRepository, UserRepository};
use vidtube_db::test_utils::TestDatabase;

fn new_id() -> String {
    ulid::Ulid::new().to_string().to_lowercase()
}

fn like_of_video(user_id: &str, video_id: &str) -> like::ActiveModel {
    like::ActiveModel {
        id: Set(new_id()),
        video_id: Set(Some(video_id.to_string())),
        comment_id: Set(None),
        tweet_id: Set(None),
        liked_by: Set(user_id.to_string()),
        created_at: Set(Utc::now().into()),
    }
}

#[tokio::test]
async fn test_duplicate_like_is_conflict() {
    let db = TestDatabase::create_unique().await.expect("Failed to create database");
    let user = db.insert_user("alice").await.unwrap();
    let video = db.insert_video(&user.id, "first").await.unwrap();

    let repo = LikeRepository::new(Arc::new(db.conn.clone()));
    repo.create(like_of_video(&user.id, &video.id)).await.unwrap();
    let err = repo
        .create(like_of_video(&user.id, &video.id))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");
    db.drop_database().await.unwrap();
}

#[tokio::test]
async fn test_like_needs_exactly_one_target() {
    let db = TestDatabase::create_unique().await.expect("Failed to create database");
    let user = db.insert_user("alice").await.unwrap();

    let result = like::ActiveModel {
        id: Set(new_id()),
        video_id: Set(Some(new_id())),
        comment_id: Set(Some(new_id())),
        tweet_id: Set(None),
        liked_by: Set(user.id.clone()),
        created_at: Set(Utc::now().into()),
    }
    .insert(db.connection())
    .await;

    assert!(result.is_err());
    db.drop_database().await.unwrap();
}

#[tokio::test]
async fn test_duplicate_subscription_is_conflict() {
    let db = TestDatabase::create_unique().await.expect("Failed to create database");
    let subscriber = db.insert_user("alice").await.unwrap();
    let channel = db.insert_user("bob").await.unwrap();

    let repo = SubscriptionRepository::new(Arc::new(db.conn.clone()));
    let subscribe = || subscription::ActiveModel {
        id: Set(new_id()),
        subscriber_id: Set(subscriber.id.clone()),
        channel_id: Set(channel.id.clone()),
        created_at: Set(Utc::now().into()),
    };

    repo.create(subscribe()).await.unwrap();
    let err = repo.create(subscribe()).await.unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");
    assert_eq!(repo.count_subscribers(&channel.id).await.unwrap(), 1);
    db.drop_database().await.unwrap();
}

#[tokio::test]
async fn test_self_subscription_is_rejected() {
    let db = TestDatabase::create_unique().await.expect("Failed to create database");
    let user = db.insert_user("alice").await.unwrap();

    let result = db
        .connection()
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "INSERT INTO subscription (id, subscriber_id, channel_id) VALUES ($1, $2, $2)",
            [new_id().into(), user.id.clone().into()],
        ))
        .await;

    assert!(result.is_err());
    db.drop_database().await.unwrap();
}

#[tokio::test]
async fn test_duplicate_username_is_conflict() {
    let db = TestDatabase::create_unique().await.expect("Failed to create database");
    db.insert_user("alice").await.unwrap();

    let err = db.insert_user("alice").await.unwrap_err();
    assert!(err.sql_err().is_some());

    let repo = UserRepository::new(Arc::new(db.conn.clone()));
    let found = repo.find_by_username("ALICE").await.unwrap();
    assert!(found.is_some());
    db.drop_database().await.unwrap();
}

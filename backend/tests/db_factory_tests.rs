//! Tests for db::factory module - repository creation and configuration.

use std::str::FromStr;

use court_booking::api::Court;
use court_booking::db::factory::{RepositoryFactory, RepositoryType};
use court_booking::db::{CourtRepository, RepositoryConfig, UserRepository};

#[test]
fn test_repository_type_aliases() {
    assert_eq!(RepositoryType::from_str("postgres").unwrap(), RepositoryType::Postgres);
    assert_eq!(RepositoryType::from_str("PG").unwrap(), RepositoryType::Postgres);
    assert_eq!(RepositoryType::from_str("Local").unwrap(), RepositoryType::Local);
    assert_eq!(RepositoryType::from_str("memory").unwrap(), RepositoryType::Local);

    let err = RepositoryType::from_str("sqlite").unwrap_err();
    assert!(err.contains("Unknown repository type"));
}

#[tokio::test]
async fn test_default_config_builds_local_repository() {
    let repo = RepositoryFactory::from_repository_config(&RepositoryConfig::default(), vec![])
        .await
        .unwrap();
    assert!(repo.health_check().await.unwrap());
    assert_eq!(repo.list_courts().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_local_repository_uses_configured_courts() {
    let courts = vec![Court::new(5, "Court 5"), Court::new(6, "Court 6"), Court::new(7, "Court 7")];
    let repo = RepositoryFactory::create(RepositoryType::Local, None, courts)
        .await
        .unwrap();
    let ids: Vec<i64> = repo
        .list_courts()
        .await
        .unwrap()
        .iter()
        .map(|c| c.id.value())
        .collect();
    assert_eq!(ids, vec![5, 6, 7]);
}

#[tokio::test]
async fn test_postgres_without_settings_fails() {
    let result = RepositoryFactory::create(RepositoryType::Postgres, None, vec![]).await;
    let err = result.err().unwrap();
    assert!(err.to_string().contains("Configuration error"));
}

#[test]
fn test_unknown_type_in_config_is_rejected() {
    let mut config = RepositoryConfig::default();
    config.repository.repo_type = "cassandra".to_string();
    assert!(config.repository_type().is_err());
}

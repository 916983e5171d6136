//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, addresses parse, bcrypt cost)
//! - Detect duplicate seed records
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - A missing JWT secret is not a validation error; the auth gate fails
//!   closed at request time instead

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;

const BCRYPT_COSTS: std::ops::RangeInclusive<u32> = 4..=31;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),

    #[error("http.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("http.request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("auth.token_ttl_secs must be greater than zero")]
    ZeroTokenTtl,

    #[error("auth.bcrypt_cost {0} is outside 4..=31")]
    BcryptCost(u32),

    #[error("seed club id `{0}` is used more than once")]
    DuplicateClub(String),
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.http.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.http.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.auth.token_ttl_secs == 0 {
        errors.push(ValidationError::ZeroTokenTtl);
    }
    if !BCRYPT_COSTS.contains(&config.auth.bcrypt_cost) {
        errors.push(ValidationError::BcryptCost(config.auth.bcrypt_cost));
    }

    let mut seen = HashSet::new();
    for club in &config.seed.clubs {
        if !seen.insert(club.id.as_str()) {
            errors.push(ValidationError::DuplicateClub(club.id.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ClubSeed;

    fn club(id: &str) -> ClubSeed {
        ClubSeed {
            id: id.into(),
            name: "Club".into(),
            district: "D".into(),
            description: None,
            avatar_url: None,
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.http.max_body_size = 0;
        config.auth.bcrypt_cost = 2;
        config.seed.clubs = vec![club("a"), club("b"), club("a")];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::BindAddress("not-an-address".into()),
                ValidationError::ZeroBodyLimit,
                ValidationError::BcryptCost(2),
                ValidationError::DuplicateClub("a".into()),
            ]
        );
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = AppConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::MetricsAddress("nope".into())]
        );
    }
}

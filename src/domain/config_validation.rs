//! Configuration validation.
//!
//! Validates a built [`PrepConfig`] before any data is read.

use crate::domain::config::PrepConfig;
use crate::domain::error::PrepError;
use crate::domain::universe::check_universe;

pub fn validate_prep_config(config: &PrepConfig) -> Result<(), PrepError> {
    validate_session(config)?;
    validate_universe(config)?;
    validate_features(config)?;
    validate_targets(config)?;
    validate_cleaning(config)?;
    config.split.validate()?;
    Ok(())
}

fn validate_session(config: &PrepConfig) -> Result<(), PrepError> {
    if config.session.open >= config.session.close {
        return Err(PrepError::invalid_config(
            "data",
            "session_open",
            "session_open must be before session_close",
        ));
    }
    Ok(())
}

fn validate_universe(config: &PrepConfig) -> Result<(), PrepError> {
    check_universe(&config.target, &config.predictors)
        .map_err(|e| PrepError::invalid_config("universe", "predictors", e.to_string()))
}

fn validate_positive_list(section: &str, key: &str, values: &[usize]) -> Result<(), PrepError> {
    if values.is_empty() {
        return Err(PrepError::invalid_config(section, key, format!("{key} must not be empty")));
    }
    if values.contains(&0) {
        return Err(PrepError::invalid_config(section, key, format!("{key} must be positive")));
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    if sorted.len() != values.len() {
        return Err(PrepError::invalid_config(section, key, format!("{key} contains duplicates")));
    }
    Ok(())
}

fn validate_features(config: &PrepConfig) -> Result<(), PrepError> {
    let f = &config.features;
    validate_positive_list("features", "ema_spans", &f.ema_spans)?;
    validate_positive_list("features", "return_horizons", &f.return_horizons)?;

    if f.volatility_window < 2 {
        return Err(PrepError::invalid_config(
            "features",
            "volatility_window",
            "volatility_window must be at least 2",
        ));
    }
    if f.volume_window == 0 {
        return Err(PrepError::invalid_config(
            "features",
            "volume_window",
            "volume_window must be positive",
        ));
    }
    if f.correlation_window < 2 {
        return Err(PrepError::invalid_config(
            "features",
            "correlation_window",
            "correlation_window must be at least 2",
        ));
    }
    Ok(())
}

fn validate_targets(config: &PrepConfig) -> Result<(), PrepError> {
    validate_positive_list("targets", "horizons", &config.targets.horizons)?;
    if config.targets.kinds.is_empty() {
        return Err(PrepError::ConfigMissing {
            section: "targets".to_string(),
            key: "kinds".to_string(),
        });
    }
    Ok(())
}

fn validate_cleaning(config: &PrepConfig) -> Result<(), PrepError> {
    let c = &config.cleaning;
    if !(c.return_bound > 0.0) {
        return Err(PrepError::invalid_config(
            "cleaning",
            "return_bound",
            "return_bound must be positive",
        ));
    }
    if !(c.volume_ratio_floor > 0.0) {
        return Err(PrepError::invalid_config(
            "cleaning",
            "volume_ratio_floor",
            "volume_ratio_floor must be positive",
        ));
    }
    if !(c.volume_ratio_max > c.volume_ratio_floor) {
        return Err(PrepError::invalid_config(
            "cleaning",
            "volume_ratio_max",
            "volume_ratio_max must exceed volume_ratio_floor",
        ));
    }
    Ok(())
}

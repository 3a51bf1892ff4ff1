//! Symbol universe: one target asset and an ordered list of predictors.
//!
//! Predictor order is significant. It fixes column order and the momentum
//! leader codes, so parsing preserves it exactly.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),

    #[error("target symbol {0} is also listed as a predictor")]
    TargetIsPredictor(String),

    #[error("at least one predictor symbol is required")]
    NoPredictors,
}

pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

pub fn check_universe(target: &str, predictors: &[String]) -> Result<(), UniverseError> {
    if target.trim().is_empty() {
        return Err(UniverseError::EmptyToken);
    }
    if predictors.is_empty() {
        return Err(UniverseError::NoPredictors);
    }
    let mut seen = HashSet::new();
    for p in predictors {
        if p == target {
            return Err(UniverseError::TargetIsPredictor(p.clone()));
        }
        if !seen.insert(p.as_str()) {
            return Err(UniverseError::DuplicateSymbol(p.clone()));
        }
    }
    Ok(())
}

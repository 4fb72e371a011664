//! `A..B`, `A..`, `..B` integer ranges, both ends inclusive.

use crate::parse_bound;
use paramgate::{ConstraintPlugin, PluginError, Predicate, MAX_NUMERIC_MAGNITUDE};
use std::sync::Arc;

/// Accepts integers inside an inclusive range with optional open ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangePlugin;

impl ConstraintPlugin for RangePlugin {
    fn name(&self) -> &str {
        "range"
    }

    fn can_handle(&self, constraint: &str) -> bool {
        constraint.contains("..")
            && constraint
                .bytes()
                .all(|b| b.is_ascii_digit() || b == b'-' || b == b'.')
    }

    fn compile(&self, _param: &str, constraint: &str) -> Result<Predicate, PluginError> {
        let (lo, hi) = constraint
            .split_once("..")
            .ok_or_else(|| PluginError::new("expected A..B"))?;
        if lo.is_empty() && hi.is_empty() {
            return Err(PluginError::new("at least one bound is required"));
        }
        let min = if lo.is_empty() {
            -MAX_NUMERIC_MAGNITUDE
        } else {
            parse_bound(lo)?
        };
        let max = if hi.is_empty() {
            MAX_NUMERIC_MAGNITUDE
        } else {
            parse_bound(hi)?
        };
        if min > max {
            return Err(PluginError::new(format!(
                "lower bound {min} is greater than upper bound {max}"
            )));
        }

        Ok(Arc::new(move |value: &str| {
            value.parse::<i64>().is_ok_and(|n| (min..=max).contains(&n))
        }))
    }
}

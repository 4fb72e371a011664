//! `>N`, `>=N`, `<N`, `<=N` integer comparisons.

use crate::parse_bound;
use paramgate::{ConstraintPlugin, PluginError, Predicate};
use std::sync::Arc;

/// Compares an integer value against a single bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComparisonPlugin;

#[derive(Debug, Clone, Copy)]
enum Op {
    Gt,
    Ge,
    Lt,
    Le,
}

impl ConstraintPlugin for ComparisonPlugin {
    fn name(&self) -> &str {
        "comparison"
    }

    fn can_handle(&self, constraint: &str) -> bool {
        constraint.starts_with('<') || constraint.starts_with('>')
    }

    fn compile(&self, _param: &str, constraint: &str) -> Result<Predicate, PluginError> {
        let (op, bound) = if let Some(rest) = constraint.strip_prefix(">=") {
            (Op::Ge, rest)
        } else if let Some(rest) = constraint.strip_prefix("<=") {
            (Op::Le, rest)
        } else if let Some(rest) = constraint.strip_prefix('>') {
            (Op::Gt, rest)
        } else if let Some(rest) = constraint.strip_prefix('<') {
            (Op::Lt, rest)
        } else {
            return Err(PluginError::new("expected one of >, >=, <, <="));
        };
        let bound = parse_bound(bound)?;

        Ok(Arc::new(move |value: &str| {
            value.parse::<i64>().is_ok_and(|n| match op {
                Op::Gt => n > bound,
                Op::Ge => n >= bound,
                Op::Lt => n < bound,
                Op::Le => n <= bound,
            })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(c: &str) -> Predicate {
        ComparisonPlugin.compile("p", c).unwrap()
    }

    #[test]
    fn claims_leading_angle_brackets() {
        assert!(ComparisonPlugin.can_handle(">5"));
        assert!(ComparisonPlugin.can_handle("<=x"));
        assert!(!ComparisonPlugin.can_handle("5>"));
        assert!(!ComparisonPlugin.can_handle("len>5"));
    }

    #[test]
    fn operators() {
        let gt = compile(">5");
        assert!(gt("6") && !gt("5"));
        let ge = compile(">=5");
        assert!(ge("5") && !ge("4"));
        let lt = compile("<-1");
        assert!(lt("-2") && !lt("-1"));
        let le = compile("<=0");
        assert!(le("0") && !le("1"));
    }

    #[test]
    fn non_integers_never_match() {
        let p = compile(">0");
        for v in ["", "abc", "1.5", "99999999999999999999", " 1"] {
            assert!(!p(v), "{v:?}");
        }
    }

    #[test]
    fn malformed_bounds() {
        for bad in [">", ">=", "<x", "<=1.0", ">99999999999999999999", "<>1"] {
            assert!(ComparisonPlugin.compile("p", bad).is_err(), "{bad}");
        }
    }
}

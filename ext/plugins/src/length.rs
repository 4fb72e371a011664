//! `len>N`, `len>=N`, `len<N`, `len<=N`, `len=N`, `lenN-M` character counts.

use crate::parse_bound;
use paramgate::{ConstraintPlugin, PluginError, Predicate};
use std::sync::Arc;

/// Constrains a value's length in characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthPlugin;

impl ConstraintPlugin for LengthPlugin {
    fn name(&self) -> &str {
        "length"
    }

    fn can_handle(&self, constraint: &str) -> bool {
        constraint
            .strip_prefix("len")
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| matches!(c, '<' | '>' | '=') || c.is_ascii_digit())
    }

    fn compile(&self, _param: &str, constraint: &str) -> Result<Predicate, PluginError> {
        let bounds = constraint
            .strip_prefix("len")
            .ok_or_else(|| PluginError::new("expected \"len\" prefix"))?;

        let (min, max) = if let Some(n) = bounds.strip_prefix(">=") {
            (length(n)?, usize::MAX)
        } else if let Some(n) = bounds.strip_prefix("<=") {
            (0, length(n)?)
        } else if let Some(n) = bounds.strip_prefix('>') {
            let n = length(n)?;
            (n.saturating_add(1), usize::MAX)
        } else if let Some(n) = bounds.strip_prefix('<') {
            let n = length(n)?;
            let max = n
                .checked_sub(1)
                .ok_or_else(|| PluginError::new("no length is below 0"))?;
            (0, max)
        } else if let Some(n) = bounds.strip_prefix('=') {
            let n = length(n)?;
            (n, n)
        } else {
            let (lo, hi) = bounds
                .split_once('-')
                .ok_or_else(|| PluginError::new("expected lenN-M"))?;
            (length(lo)?, length(hi)?)
        };
        if min > max {
            return Err(PluginError::new(format!(
                "minimum length {min} is greater than maximum {max}"
            )));
        }

        Ok(Arc::new(move |value: &str| {
            let n = value.chars().count();
            min <= n && n <= max
        }))
    }
}

fn length(text: &str) -> Result<usize, PluginError> {
    let n = parse_bound(text)?;
    usize::try_from(n).map_err(|_| PluginError::new(format!("length {n} is negative")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(c: &str) -> Predicate {
        LengthPlugin.compile("p", c).unwrap()
    }

    #[test]
    fn claims_len_prefix() {
        for c in ["len>1", "len<=2", "len=3", "len3-5"] {
            assert!(LengthPlugin.can_handle(c), "{c}");
        }
        for c in ["len", "length", "lenx", "len-1", ">3"] {
            assert!(!LengthPlugin.can_handle(c), "{c}");
        }
    }

    #[test]
    fn forms() {
        let p = compile("len>2");
        assert!(p("abc") && !p("ab"));
        let p = compile("len>=2");
        assert!(p("ab") && !p("a"));
        let p = compile("len<2");
        assert!(p("a") && p("") && !p("ab"));
        let p = compile("len<=2");
        assert!(p("ab") && !p("abc"));
        let p = compile("len=0");
        assert!(p("") && !p("a"));
        let p = compile("len2-3");
        assert!(p("ab") && p("abc") && !p("a") && !p("abcd"));
    }

    #[test]
    fn counts_characters_not_bytes() {
        let p = compile("len=2");
        assert!(p("éü"));
        assert!(!p("é"));
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["len<0", "len5-2", "len=-1", "len>", "len3", "len1-x", "len=99999999999999999999"] {
            assert!(LengthPlugin.compile("p", bad).is_err(), "{bad}");
        }
    }
}

//! paramgate-plugins: bundled constraint syntaxes
//!
//! Four plugins extend the `name=[...]` grammar beyond enums and `N-M` ranges:
//!
//! | Plugin | Example | Accepts |
//! |--------|---------|---------|
//! | [`ComparisonPlugin`] | `[>=18]` | integers compared against one bound |
//! | [`LengthPlugin`] | `[len<=64]`, `[len3-8]` | values by character count |
//! | [`RangePlugin`] | `[10..20]`, `[5..]`, `[..0]` | integers in an inclusive, possibly open range |
//! | [`PatternPlugin`] | `[img_*.png,*.jpg]` | values matching any glob |
//!
//! # Example
//!
//! ```
//! use paramgate::Validator;
//!
//! let v = Validator::builder()
//!     .plugins(paramgate_plugins::default_plugins())
//!     .build("/users?age=[>=18]&name=[len1-32]&avatar=[*.png]")
//!     .unwrap();
//!
//! assert!(v.validate_url("/users?age=21&name=ada&avatar=me.png"));
//! assert!(!v.validate_url("/users?age=12"));
//! ```

mod comparison;
mod length;
mod pattern;
mod range;

pub use comparison::ComparisonPlugin;
pub use length::LengthPlugin;
pub use pattern::{PatternPlugin, MAX_GLOB_PATTERN_LENGTH};
pub use range::RangePlugin;

use paramgate::{ConstraintPlugin, PluginError, MAX_NUMERIC_MAGNITUDE};
use std::sync::Arc;

/// All bundled plugins, in dispatch order.
#[must_use]
pub fn default_plugins() -> Vec<Arc<dyn ConstraintPlugin>> {
    vec![
        Arc::new(ComparisonPlugin),
        Arc::new(LengthPlugin),
        Arc::new(RangePlugin),
        Arc::new(PatternPlugin),
    ]
}

/// Look up a bundled plugin by its [`name`](ConstraintPlugin::name).
#[must_use]
pub fn plugin_by_name(name: &str) -> Option<Arc<dyn ConstraintPlugin>> {
    default_plugins().into_iter().find(|p| p.name() == name)
}

/// Parse a signed decimal bound within [`MAX_NUMERIC_MAGNITUDE`].
pub(crate) fn parse_bound(text: &str) -> Result<i64, PluginError> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PluginError::new(format!("\"{text}\" is not an integer")));
    }
    match text.parse::<i64>() {
        Ok(n) if n.unsigned_abs() <= MAX_NUMERIC_MAGNITUDE.unsigned_abs() => Ok(n),
        _ => Err(PluginError::new(format!(
            "{text} exceeds the supported magnitude {MAX_NUMERIC_MAGNITUDE}"
        ))),
    }
}

//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them against the paramgate engine.
//!
//! ```yaml
//! name: key_only
//! description: empty brackets accept only valueless parameters
//! rules: "/filter?active=[]"
//! cases:
//!   - name: bare key
//!     url: "/filter?active"
//!     valid: true
//!   - name: with value
//!     url: "/filter?active=true"
//!     valid: false
//!     normalized: "/filter"
//! ```

use crate::allow_list_callback;
use paramgate::{ParseError, Validator};
use serde::Deserialize;

/// A complete test fixture
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub rules: RulesText,
    /// Bundled plugin names, in dispatch order.
    #[serde(default)]
    pub plugins: Vec<String>,
    /// `(name, value)` pairs the callback accepts.
    #[serde(default)]
    pub callback_allow: Vec<(String, String)>,
    /// Expected parse error kind; when set, `cases` run against an empty validator.
    #[serde(default)]
    pub expect_error: Option<ErrorKind>,
    #[serde(default)]
    pub cases: Vec<TestCase>,
}

/// Rule text as one string or a list of groups joined with `;`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RulesText {
    One(String),
    Groups(Vec<String>),
}

impl RulesText {
    /// The rule text as given to the parser.
    #[must_use]
    pub fn joined(&self) -> String {
        match self {
            RulesText::One(text) => text.clone(),
            RulesText::Groups(groups) => groups.join(";"),
        }
    }
}

/// Parse error kinds a fixture can expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Syntax,
    SizeLimit,
    NumericRange,
    Plugin,
}

impl ErrorKind {
    fn of(err: &ParseError) -> Self {
        match err {
            ParseError::Syntax { .. } => ErrorKind::Syntax,
            ParseError::SizeLimit { .. } => ErrorKind::SizeLimit,
            ParseError::NumericRange { .. } => ErrorKind::NumericRange,
            ParseError::Plugin { .. } => ErrorKind::Plugin,
        }
    }
}

/// Test case. Every expectation is optional; only the given ones are checked.
#[derive(Debug, Deserialize)]
pub struct TestCase {
    pub name: String,
    /// Full URL for `validate_url` / `normalize_url`.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub valid: Option<bool>,
    #[serde(default)]
    pub normalized: Option<String>,
    /// Path plus raw query for `validate_query_params` / `filter_query_params`.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub query_valid: Option<bool>,
    #[serde(default)]
    pub filtered: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running a single check
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub check: &'static str,
    pub passed: bool,
    pub expected: String,
    pub actual: String,
}

impl CaseResult {
    fn new(case: &TestCase, check: &'static str, expected: String, actual: String) -> Self {
        Self {
            case_name: case.name.clone(),
            check,
            passed: expected == actual,
            expected,
            actual,
        }
    }
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Build the validator this fixture describes.
    ///
    /// # Errors
    ///
    /// Returns the [`ParseError`] if the rules do not compile.
    ///
    /// # Panics
    ///
    /// Panics on an unknown plugin name.
    pub fn build(&self) -> Result<Validator, ParseError> {
        let mut builder = Validator::builder();
        for name in &self.plugins {
            let plugin = paramgate_plugins::plugin_by_name(name)
                .unwrap_or_else(|| panic!("fixture '{}': unknown plugin '{name}'", self.name));
            builder = builder.plugins([plugin]);
        }
        if !self.callback_allow.is_empty() {
            let cb = allow_list_callback(self.callback_allow.iter().cloned());
            builder = builder.callback(move |name, value| cb(name, value));
        }
        builder.build(&self.rules.joined())
    }

    /// Run all test cases and return results
    pub fn run(&self) -> Vec<CaseResult> {
        let validator = match (self.build(), self.expect_error) {
            (Ok(v), None) => v,
            (Err(e), Some(kind)) => {
                let mut results = vec![CaseResult {
                    case_name: "<parse>".into(),
                    check: "error",
                    passed: ErrorKind::of(&e) == kind,
                    expected: format!("{kind:?}"),
                    actual: format!("{:?}", ErrorKind::of(&e)),
                }];
                let empty = Validator::default();
                results.extend(self.cases.iter().flat_map(|c| c.run(&empty)));
                return results;
            }
            (Ok(_), Some(kind)) => {
                return vec![CaseResult {
                    case_name: "<parse>".into(),
                    check: "error",
                    passed: false,
                    expected: format!("{kind:?}"),
                    actual: "Ok".into(),
                }];
            }
            (Err(e), None) => {
                return vec![CaseResult {
                    case_name: "<parse>".into(),
                    check: "error",
                    passed: false,
                    expected: "Ok".into(),
                    actual: e.to_string(),
                }];
            }
        };
        self.cases.iter().flat_map(|c| c.run(&validator)).collect()
    }

    /// Run all test cases and panic on first failure
    pub fn run_and_assert(&self) {
        for result in self.run() {
            assert!(
                result.passed,
                "Fixture '{}' case '{}' ({}) failed: expected {:?}, got {:?}",
                self.name, result.case_name, result.check, result.expected, result.actual
            );
        }
    }
}

impl TestCase {
    fn run(&self, v: &Validator) -> Vec<CaseResult> {
        let mut results = Vec::new();
        if let Some(url) = &self.url {
            if let Some(valid) = self.valid {
                let actual = v.validate_url(url);
                results.push(CaseResult::new(self, "valid", valid.to_string(), actual.to_string()));
            }
            if let Some(normalized) = &self.normalized {
                let actual = v.normalize_url(url);
                results.push(CaseResult::new(self, "normalized", normalized.clone(), actual.clone()));
                // normalization is idempotent
                results.push(CaseResult::new(self, "idempotent", actual.clone(), v.normalize_url(&actual)));
            }
        }
        if let Some(path) = &self.path {
            let query = self.query.as_deref().unwrap_or("");
            if let Some(valid) = self.query_valid {
                let actual = v.validate_query_params(path, query);
                results.push(CaseResult::new(self, "query_valid", valid.to_string(), actual.to_string()));
            }
            if let Some(filtered) = &self.filtered {
                let actual = v.filter_query_params(path, query);
                results.push(CaseResult::new(self, "filtered", filtered.clone(), actual));
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_runs_inline_fixture() {
        let yaml = r#"
name: inline
rules:
  - "/search?page=[1-10]"
  - "sort=[name,date]"
cases:
  - name: ok
    url: "/search?page=2&sort=name"
    valid: true
  - name: strip
    url: "/search?page=2&x=1"
    normalized: "/search?page=2"
  - name: query
    path: "/search"
    query: "page=20&sort=date"
    query_valid: false
    filtered: "sort=date"
"#;
        let fixture = Fixture::from_yaml(yaml).unwrap();
        assert_eq!(fixture.rules.joined(), "/search?page=[1-10];sort=[name,date]");
        assert!(fixture.run().iter().all(|r| r.passed));
    }

    #[test]
    fn expected_error_fixture() {
        let yaml = r#"
name: broken
rules: "page=[1&limit=[5]"
expect_error: syntax
cases:
  - name: nothing permitted
    url: "/any"
    valid: false
"#;
        let fixture = Fixture::from_yaml(yaml).unwrap();
        assert!(fixture.run().iter().all(|r| r.passed));
    }

    #[test]
    fn failing_case_is_reported() {
        let yaml = r#"
name: wrong
rules: "/a"
cases:
  - name: claims valid param
    url: "/a?x=1"
    valid: true
"#;
        let results = Fixture::from_yaml(yaml).unwrap().run();
        assert_eq!(results.len(), 1);
        assert!(!results[0].passed);
    }
}

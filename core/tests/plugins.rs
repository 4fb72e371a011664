//! The bundled plugins driven through the validator.

use paramgate::prelude::*;
use paramgate_plugins::default_plugins;

fn validator(rules: &str) -> Validator {
    Validator::builder()
        .plugins(default_plugins())
        .build(rules)
        .unwrap()
}

#[test]
fn plugin_and_builtin_constraints_mix() {
    let v = validator("/items?age=[>=18]&size=[1-3]&name=[len<=4]&img=[*.png]&sort=[asc,desc]");
    assert!(v.validate_url("/items?age=30&size=2&name=bob&img=a.png&sort=asc"));
    assert!(!v.validate_url("/items?age=30&size=4"));
    assert_eq!(
        v.normalize_url("/items?age=17&size=1&name=alice&img=a.png"),
        "/items?size=1&img=a.png"
    );
}

#[test]
fn claimed_constraint_that_fails_is_a_hard_error() {
    let v = validator("/a?x");
    let err = v.parse_rules("/a?x=[len=abc]").unwrap_err();
    assert!(matches!(err, ParseError::Plugin { ref plugin, .. } if plugin == "length"));
    // active rules untouched
    assert!(v.validate_url("/a?x=1"));
}

#[test]
fn without_plugins_the_same_body_is_an_enum() {
    let v = Validator::new("/a?x=[>=18]").unwrap();
    assert!(v.validate_url("/a?x=%3E%3D18"));
    assert!(!v.validate_url("/a?x=20"));
}

#[test]
fn trace_names_the_plugin_constraint() {
    let v = validator("/a?age=[>=18]");
    let trace = v.explain_url("/a?age=12");
    assert!(!trace.valid);
    assert_eq!(trace.params[0].verdict, Verdict::Rejected);
    assert_eq!(trace.params[0].matcher.as_deref(), Some("[>=18]"));
}

#[test]
fn predicates_are_cached_per_param_and_constraint() {
    let v = validator("/a?age=[>=18];/b?age=[>=18];/c?min=[>=18]");
    assert_eq!(v.cache_len(), 2);
    v.clear_cache();
    assert_eq!(v.cache_len(), 0);
}

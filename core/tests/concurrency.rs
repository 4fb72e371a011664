//! Readers racing writers only ever observe complete rule sets.

use paramgate::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

const OLD: &str = "/a?x=[1-5]&y=[1-5]";
const NEW: &str = "/a?x=[6-9]&y=[6-9]";

#[test]
fn readers_see_whole_snapshots() {
    let v = Validator::new(OLD).unwrap();
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                while !done.load(Ordering::Relaxed) {
                    // a single URL is judged against one snapshot
                    assert!(!v.validate_url("/a?x=1&y=7"));
                    assert!(!v.validate_url("/a?x=7&y=1"));
                }
            });
        }
        s.spawn(|| {
            for i in 0..500 {
                let text = if i % 2 == 0 { NEW } else { OLD };
                v.parse_rules(text).unwrap();
            }
            done.store(true, Ordering::Relaxed);
        });
    });
}

#[test]
fn concurrent_adds_are_not_lost() {
    let v = Validator::default();
    thread::scope(|s| {
        for t in 0..8 {
            let v = &v;
            s.spawn(move || {
                for i in 0..25 {
                    let path = format!("/t{t}/p{i}");
                    v.add_url_rule(&path, [ParamRule::new("q", ParamMatcher::any())])
                        .unwrap();
                }
            });
        }
    });
    assert_eq!(v.rules().len(), 200);
    assert!(v.validate_url("/t3/p17?q=1"));
}

#[test]
fn clear_races_with_readers() {
    let v = Validator::new("/a?x").unwrap();
    let done = AtomicBool::new(false);
    thread::scope(|s| {
        s.spawn(|| {
            while !done.load(Ordering::Relaxed) {
                let trace = v.explain_url("/a?x=1");
                // known and valid move together within one snapshot
                assert_eq!(trace.valid, trace.known);
            }
        });
        s.spawn(|| {
            for _ in 0..200 {
                v.clear();
                v.parse_rules("/a?x").unwrap();
            }
            done.store(true, Ordering::Relaxed);
        });
    });
}

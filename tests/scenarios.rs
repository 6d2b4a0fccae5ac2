//! End-to-end pipeline tests: real directory trees, walked and hashed by
//! [`duptree::Scanner`], fed into [`duptree::TreeMerger`] and reported
//! through [`duptree::TextReportSink`]. Complements the core-only
//! scenario tests alongside `TreeMerger`'s own unit tests, which feed
//! hand-built digests directly and don't exercise the scanner or hasher.

use duptree::{ReportSink, Scanner, Session, TextReportSink, TreeMerger};
use std::fs;
use std::path::Path;
use tempdir::TempDir;

fn write(path: &Path, content: &[u8]) {
    fs::write(path, content).unwrap();
}

fn run_pipeline(roots: &[&Path]) -> String {
    let mut scanner = Scanner::new();
    scanner.settings.ignore_small = false;
    for root in roots {
        scanner.scan(root).unwrap();
    }

    let session = Session::new(roots.iter().map(|p| p.canonicalize().unwrap()).collect());
    let mut merger = TreeMerger::new(&session);
    for file in scanner.matched_files() {
        merger.feed(&file).unwrap();
    }

    let mut buf = Vec::new();
    {
        let mut sink = TextReportSink::new(&mut buf);
        merger.finish(&mut sink);
    }
    String::from_utf8(buf).unwrap()
}

#[test]
fn identical_sibling_trees_report_as_one_group() {
    let tmp = TempDir::new("pipeline-identical").unwrap();
    for root in ["a", "b"] {
        fs::create_dir_all(tmp.path().join(root).join("sub")).unwrap();
        write(&tmp.path().join(root).join("x"), b"shared top-level content");
        write(&tmp.path().join(root).join("sub").join("y"), b"shared nested content");
    }

    let a = tmp.path().join("a");
    let b = tmp.path().join("b");
    let report = run_pipeline(&[&a, &b]);
    assert_eq!(report.matches("--").count(), 1);
    assert!(!report.contains("sub"), "nested duplicate should be suppressed by the ancestor report: {report}");
    assert!(report.contains(&a.display().to_string()), "report should name root a: {report}");
    assert!(report.contains(&b.display().to_string()), "report should name root b: {report}");
}

#[test]
fn extra_file_in_one_tree_prevents_any_report() {
    let tmp = TempDir::new("pipeline-extra").unwrap();
    fs::create_dir_all(tmp.path().join("a")).unwrap();
    fs::create_dir_all(tmp.path().join("b")).unwrap();
    write(&tmp.path().join("a").join("x"), b"content one goes here");
    write(&tmp.path().join("a").join("y"), b"content two goes here");
    write(&tmp.path().join("b").join("x"), b"content one goes here");
    write(&tmp.path().join("b").join("y"), b"content two goes here");
    write(&tmp.path().join("b").join("z"), b"only b has this content");

    let report = run_pipeline(&[&tmp.path().join("a"), &tmp.path().join("b")]);
    assert!(report.is_empty(), "directories with differing file counts must never be reported: {report}");
}

#[test]
fn unrelated_tree_produces_no_groups() {
    let tmp = TempDir::new("pipeline-unique").unwrap();
    fs::create_dir_all(tmp.path().join("only")).unwrap();
    write(&tmp.path().join("only").join("x"), b"nobody else has this content");

    let report = run_pipeline(&[&tmp.path().join("only")]);
    assert!(report.is_empty());
}

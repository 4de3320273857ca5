//! S4 (spec.md §8): two files with near-identical functions, differing only
//! in identifier names, cluster into exactly one cross-file duplicate group.

mod common;

use semcode::duplicates::{detect_duplicates, DuplicateParams};
use semcode::indexer::{index_full, IndexOptions};

const FN_A: &str = "export function sumValues(a: number, b: number) {\n    const total = a + b;\n    return total;\n}\n";
const FN_B: &str = "export function addTwo(x: number, y: number) {\n    const result = x + y;\n    return result;\n}\n";

#[test]
fn near_identical_cross_file_functions_form_one_group() {
    let repo = common::scratch_repo(&[("src/a.ts", FN_A), ("src/b.ts", FN_B)]);
    let ctx = common::build_context(repo.path());
    index_full(&ctx, &IndexOptions::default()).unwrap();

    let params = DuplicateParams {
        cross_file_only: true,
        min_lines: 3,
        ..DuplicateParams::from_config(&ctx.config.duplicates.clone())
    };
    let output = detect_duplicates(&ctx, &params).unwrap();

    assert_eq!(output.summary.total_duplicates, 1);
    assert_eq!(output.duplicates.len(), 1);
    assert_eq!(output.duplicates[0].instances.len(), 2);
    // Renamed locals/params collapse to the same canonical form, so the pair
    // is flagged at maximum similarity via the exact-hash fast path.
    assert!((output.duplicates[0].similarity - 1.0).abs() < 1e-6);
}

#[test]
fn same_repository_and_parameters_yield_the_same_groups() {
    let repo = common::scratch_repo(&[("src/a.ts", FN_A), ("src/b.ts", FN_B)]);
    let ctx = common::build_context(repo.path());
    index_full(&ctx, &IndexOptions::default()).unwrap();

    let params = DuplicateParams {
        cross_file_only: true,
        min_lines: 3,
        ..DuplicateParams::from_config(&ctx.config.duplicates.clone())
    };
    let first = detect_duplicates(&ctx, &params).unwrap();
    let second = detect_duplicates(&ctx, &params).unwrap();

    let members = |out: &semcode::duplicates::DuplicatesOutput| -> Vec<Vec<String>> {
        out.duplicates
            .iter()
            .map(|g| {
                let mut files: Vec<String> = g.instances.iter().map(|i| i.file.clone()).collect();
                files.sort();
                files
            })
            .collect()
    };
    assert_eq!(members(&first), members(&second));
}

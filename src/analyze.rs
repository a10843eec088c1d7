use std::collections::HashMap;

use anyhow::{bail, Result};

use crate::model::{AnalyzeResponse, LanguageStat, NodeKind, Summary, TreeNode};

#[derive(Default)]
struct LangAgg {
    files: u64,
    totals: Summary,
}

fn collect_languages(node: &TreeNode, by_lang: &mut HashMap<String, LangAgg>) {
    for child in node.children() {
        collect_languages(child, by_lang);
    }

    if let Some(lang) = node.language_label() {
        let agg = by_lang.entry(lang.to_string()).or_default();
        agg.files += 1;
        agg.totals.add(&node.stats);
    }
}

/// Bucket every file below `root` by language.
///
/// Sorted by lines descending, equal lines ordered by language name. Files
/// without a language label contribute nothing. Percentages are shares of the
/// bucketed total and are all zero when that total is zero.
pub fn language_stats(root: &TreeNode) -> Vec<LanguageStat> {
    let mut by_lang: HashMap<String, LangAgg> = HashMap::new();
    collect_languages(root, &mut by_lang);

    let total_lines: u64 = by_lang.values().map(|a| a.totals.lines).sum();

    let mut out: Vec<LanguageStat> = by_lang
        .into_iter()
        .map(|(language, agg)| LanguageStat {
            language,
            files: agg.files,
            lines: agg.totals.lines,
            code: agg.totals.code,
            comments: agg.totals.comments,
            blanks: agg.totals.blanks,
            percentage: if total_lines == 0 {
                0.0
            } else {
                agg.totals.lines as f64 * 100.0 / total_lines as f64
            },
        })
        .collect();

    out.sort_by(|a, b| {
        b.lines
            .cmp(&a.lines)
            .then_with(|| a.language.cmp(&b.language))
    });
    out
}

/// Language rollup for a response: the service's full-depth array when it sent
/// one, otherwise computed from the (possibly depth-limited) tree.
pub fn languages_for(resp: &AnalyzeResponse) -> Vec<LanguageStat> {
    match &resp.languages {
        Some(langs) => langs.clone(),
        None => language_stats(&resp.data),
    }
}

fn collect_issues(node: &TreeNode, out: &mut Vec<String>) {
    let at = if node.path.is_empty() { "<root>" } else { &node.path };

    if !node.stats.is_consistent() {
        out.push(format!(
            "{at}: lines {} != code {} + comments {} + blanks {}",
            node.stats.lines, node.stats.code, node.stats.comments, node.stats.blanks
        ));
    }

    match node.kind {
        NodeKind::File => {
            if node.child_count() > 0 {
                out.push(format!("{at}: file node has children"));
            }
        }
        NodeKind::Dir => {
            if node.language.is_some() {
                out.push(format!("{at}: directory carries a language"));
            }
            if node.child_count() > 0 {
                let mut sum = Summary::default();
                for c in node.children() {
                    sum.add(&c.stats);
                }
                if sum != node.stats {
                    out.push(format!(
                        "{at}: directory stats {:?} != sum of children {:?}",
                        node.stats, sum
                    ));
                }
            }
        }
    }

    for c in node.children() {
        collect_issues(c, out);
    }
}

/// Check the structural invariants the service promises for a tree.
pub fn validate_tree(root: &TreeNode) -> Result<()> {
    let mut issues = Vec::new();
    collect_issues(root, &mut issues);
    if issues.is_empty() {
        return Ok(());
    }
    bail!(
        "tree failed validation ({} issue(s)): {}",
        issues.len(),
        issues.join("; ")
    )
}

pub fn file_count(node: &TreeNode) -> u64 {
    match node.kind {
        NodeKind::File => 1,
        NodeKind::Dir => node.children().map(file_count).sum(),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Breakdown {
    pub label: &'static str,
    pub value: u64,
    pub percentage: f64,
}

/// Split of a summary's lines into code, comments and blanks.
pub fn overview(stats: &Summary) -> Vec<Breakdown> {
    let share = |v: u64| {
        if stats.lines == 0 {
            0.0
        } else {
            v as f64 * 100.0 / stats.lines as f64
        }
    };
    vec![
        Breakdown {
            label: "code",
            value: stats.code,
            percentage: share(stats.code),
        },
        Breakdown {
            label: "comments",
            value: stats.comments,
            percentage: share(stats.comments),
        },
        Breakdown {
            label: "blanks",
            value: stats.blanks,
            percentage: share(stats.blanks),
        },
    ]
}

/// Display order: directories first, then case-insensitive by name.
pub fn sorted_children(node: &TreeNode) -> Vec<&TreeNode> {
    let mut out: Vec<&TreeNode> = node.children().collect();
    out.sort_by(|a, b| {
        b.is_dir()
            .cmp(&a.is_dir())
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| a.name.cmp(&b.name))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TreeNode {
        TreeNode::dir(
            "",
            vec![
                TreeNode::file("a.go", Some("Go"), Summary::new(8, 1, 1)),
                TreeNode::file("b.py", Some("Python"), Summary::new(4, 0, 1)),
            ],
        )
    }

    fn nested() -> TreeNode {
        TreeNode::dir(
            "",
            vec![
                TreeNode::dir(
                    "src",
                    vec![
                        TreeNode::file("src/lib.rs", Some("Rust"), Summary::new(30, 5, 5)),
                        TreeNode::file("src/util.rs", Some("Rust"), Summary::new(10, 0, 2)),
                        TreeNode::dir(
                            "src/web",
                            vec![
                                TreeNode::file("src/web/app.ts", Some("TypeScript"), Summary::new(20, 2, 3)),
                                TreeNode::file("src/web/LICENSE", None, Summary::new(7, 0, 0)),
                            ],
                        ),
                    ],
                ),
                TreeNode::file("build.rs", Some("Rust"), Summary::new(3, 0, 1)),
                TreeNode::file("notes", Some(""), Summary::new(2, 0, 0)),
                TreeNode::dir("empty", vec![]),
            ],
        )
    }

    fn round1(v: f64) -> f64 {
        (v * 10.0).round() / 10.0
    }

    #[test]
    fn two_language_scenario() {
        let stats = language_stats(&sample());
        assert_eq!(stats.len(), 2);

        let go = &stats[0];
        assert_eq!(go.language, "Go");
        assert_eq!((go.files, go.lines, go.code, go.comments, go.blanks), (1, 10, 8, 1, 1));
        assert_eq!(round1(go.percentage), 66.7);

        let py = &stats[1];
        assert_eq!(py.language, "Python");
        assert_eq!((py.files, py.lines, py.code, py.comments, py.blanks), (1, 5, 4, 0, 1));
        assert_eq!(round1(py.percentage), 33.3);
    }

    #[test]
    fn bucketed_lines_match_root_minus_unlabelled() {
        let root = nested();
        let stats = language_stats(&root);
        let bucketed: u64 = stats.iter().map(|s| s.lines).sum();
        // LICENSE (7) and notes (2) carry no usable language
        assert_eq!(bucketed, root.stats.lines - 7 - 2);

        let rust = stats.iter().find(|s| s.language == "Rust").unwrap();
        assert_eq!(rust.files, 3);
        assert_eq!(rust.lines, 40 + 12 + 4);
    }

    #[test]
    fn percentages_sum_to_hundred_and_stay_in_range() {
        let stats = language_stats(&nested());
        let sum: f64 = stats.iter().map(|s| s.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert!(stats.iter().all(|s| (0.0..=100.0).contains(&s.percentage)));
    }

    #[test]
    fn sorted_descending_with_name_tie_break() {
        let root = TreeNode::dir(
            "",
            vec![
                TreeNode::file("z.zig", Some("Zig"), Summary::new(5, 0, 0)),
                TreeNode::file("a.c", Some("C"), Summary::new(5, 0, 0)),
                TreeNode::file("m.ml", Some("OCaml"), Summary::new(9, 0, 0)),
                TreeNode::file("b.c", Some("C"), Summary::new(0, 0, 0)),
            ],
        );
        let names: Vec<String> = language_stats(&root).into_iter().map(|s| s.language).collect();
        assert_eq!(names, vec!["OCaml", "C", "Zig"]);

        for _ in 0..10 {
            let again: Vec<String> = language_stats(&root).into_iter().map(|s| s.language).collect();
            assert_eq!(again, names);
        }
    }

    #[test]
    fn aggregation_is_idempotent_and_leaves_tree_alone() {
        let root = nested();
        let before = root.clone();
        let first = language_stats(&root);
        let second = language_stats(&root);
        assert_eq!(first, second);
        assert_eq!(root, before);
    }

    #[test]
    fn empty_root_and_zero_lines() {
        assert!(language_stats(&TreeNode::dir("", vec![])).is_empty());

        let zero = TreeNode::dir(
            "",
            vec![
                TreeNode::file("a.go", Some("Go"), Summary::default()),
                TreeNode::file("b.rs", Some("Rust"), Summary::default()),
            ],
        );
        let stats = language_stats(&zero);
        assert_eq!(stats.len(), 2);
        assert!(stats.iter().all(|s| s.percentage == 0.0));
    }

    #[test]
    fn precomputed_languages_win() {
        let mut resp = AnalyzeResponse {
            source: "clone".into(),
            repo: "o/r".into(),
            branch: "main".into(),
            timestamp: 0,
            data: sample(),
            languages: None,
        };
        assert_eq!(languages_for(&resp).len(), 2);

        let full = vec![LanguageStat {
            language: "Go".into(),
            files: 12,
            lines: 900,
            code: 800,
            comments: 50,
            blanks: 50,
            percentage: 100.0,
        }];
        resp.languages = Some(full.clone());
        assert_eq!(languages_for(&resp), full);
    }

    #[test]
    fn well_formed_trees_validate() {
        validate_tree(&sample()).unwrap();
        validate_tree(&nested()).unwrap();
    }

    #[test]
    fn validator_reports_broken_sums() {
        let mut root = sample();
        root.stats.lines += 1;
        root.stats.code += 1;
        let err = validate_tree(&root).unwrap_err().to_string();
        assert!(err.contains("sum of children"), "{err}");

        let mut bad_leaf = TreeNode::file("x.rs", Some("Rust"), Summary::new(1, 1, 1));
        bad_leaf.stats.lines = 2;
        assert!(validate_tree(&bad_leaf).is_err());
    }

    #[test]
    fn counts_and_overview() {
        let root = nested();
        assert_eq!(file_count(&root), 6);

        let parts = overview(&root.stats);
        assert_eq!(parts.len(), 3);
        let sum: u64 = parts.iter().map(|p| p.value).sum();
        assert_eq!(sum, root.stats.lines);

        let empty = overview(&Summary::default());
        assert!(empty.iter().all(|p| p.percentage == 0.0));
    }

    #[test]
    fn children_sorted_dirs_first() {
        let root = nested();
        let names: Vec<&str> = sorted_children(&root).iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["empty", "src", "build.rs", "notes"]);
    }
}

//! DuplicateDetector: normalized-identifier similarity clustering with
//! impact ranking (spec §4.9).

use std::collections::{HashMap, HashSet};

use regex::Regex;
use serde::Serialize;

use crate::chunk::{Chunk, SymbolType};
use crate::config::{AcceptablePattern, DuplicatesConfig};
use crate::context::Context;
use crate::error::Result;
use crate::filter::{and, Filter, FilterOperator, FilterValue, LeafPredicate};
use crate::language::LanguageRegistry;
use crate::vector_store::cosine_similarity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateLevel {
    Low,
    Medium,
    High,
    Exact,
}

/// Inputs controlling one detection pass (spec §4.9). Thresholds default
/// from `Config.duplicates`; `scope_filter` defaults to {function, method}
/// per spec.md §4.9.
#[derive(Debug, Clone)]
pub struct DuplicateParams {
    pub scope_filter: Vec<SymbolType>,
    pub ignore_tests: bool,
    pub cross_file_only: bool,
    pub only_exported: bool,
    pub exclude_pattern: Option<String>,
    pub min_lines: usize,
    pub min_complexity: u32,
    pub normalize_identifiers: bool,
    pub rank_by_impact: bool,
    pub ignore_acceptable_patterns: bool,
    pub limit: usize,
    pub threshold_exact: f32,
    pub threshold_high: f32,
    pub threshold_medium: f32,
    pub threshold_low: f32,
    pub acceptable_patterns: Vec<AcceptablePattern>,
}

impl DuplicateParams {
    pub fn from_config(config: &DuplicatesConfig) -> Self {
        Self {
            scope_filter: vec![SymbolType::Function, SymbolType::Method],
            ignore_tests: false,
            cross_file_only: false,
            only_exported: false,
            exclude_pattern: None,
            min_lines: config.min_lines,
            min_complexity: config.min_complexity,
            normalize_identifiers: config.normalize_identifiers,
            rank_by_impact: config.rank_by_impact,
            ignore_acceptable_patterns: config.ignore_acceptable_patterns,
            limit: 50,
            threshold_exact: config.threshold_exact,
            threshold_high: config.threshold_high,
            threshold_medium: config.threshold_medium,
            threshold_low: config.threshold_low,
            acceptable_patterns: config.acceptable_patterns.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DuplicateInstance {
    pub file: String,
    pub symbol_name: Option<String>,
    pub start_line: u32,
    pub end_line: u32,
    pub lines: usize,
    pub complexity: u32,
    pub is_exported: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    pub level: DuplicateLevel,
    pub similarity: f32,
    pub instances: Vec<DuplicateInstance>,
    pub score: f64,
    pub estimated_savings: usize,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct DuplicatesSummary {
    pub total_duplicates: usize,
    pub files_affected: usize,
    pub total_savings: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DuplicatesOutput {
    pub summary: DuplicatesSummary,
    pub duplicates: Vec<DuplicateGroup>,
    pub acceptable_duplicates: Vec<DuplicateGroup>,
}

fn is_test_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    lower.contains("/test/")
        || lower.contains("/tests/")
        || lower.contains("/spec/")
        || lower.contains("_test.")
        || lower.contains(".test.")
        || lower.contains("_spec.")
        || lower.contains(".spec.")
        || lower.starts_with("test_")
}

/// Replaces identifier tokens with a canonical placeholder per distinct
/// symbol, preserving the language's reserved words and (by construction of
/// the identifier regex) numeric/most string literal content (spec §4.9
/// step 2).
fn normalize_identifiers(content: &str, reserved: &[&str]) -> String {
    let ident_re = Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap();
    let reserved_set: HashSet<&str> = reserved.iter().copied().collect();
    let mut seen: HashMap<String, String> = HashMap::new();
    let mut next_id = 0usize;
    ident_re
        .replace_all(content, |caps: &regex::Captures| {
            let token = &caps[0];
            if reserved_set.contains(token) {
                return token.to_string();
            }
            seen.entry(token.to_string())
                .or_insert_with(|| {
                    let placeholder = format!("ID{next_id}");
                    next_id += 1;
                    placeholder
                })
                .clone()
        })
        .into_owned()
}

fn scope_filter(types: &[SymbolType]) -> Filter {
    Filter::Any(
        types
            .iter()
            .map(|t| {
                Filter::Leaf(LeafPredicate {
                    key: "symbolType".to_string(),
                    operator: FilterOperator::Equals,
                    value: FilterValue::Str(t.as_str().to_string()),
                })
            })
            .collect(),
    )
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect() }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

fn level_for(min_similarity: f32, params: &DuplicateParams) -> DuplicateLevel {
    if min_similarity >= params.threshold_exact {
        DuplicateLevel::Exact
    } else if min_similarity >= params.threshold_high {
        DuplicateLevel::High
    } else if min_similarity >= params.threshold_medium {
        DuplicateLevel::Medium
    } else {
        DuplicateLevel::Low
    }
}

fn matches_any_pattern(content: &str, patterns: &[AcceptablePattern]) -> bool {
    let trimmed = content.trim();
    patterns.iter().any(|p| {
        Regex::new(&p.pattern)
            .map(|re| re.is_match(trimmed))
            .unwrap_or(false)
    })
}

/// Finds groups of chunks whose normalized content is highly similar,
/// clustered by union-find and ranked by impact (spec §4.9).
pub fn detect_duplicates(ctx: &Context, params: &DuplicateParams) -> Result<DuplicatesOutput> {
    ctx.cancellation.check()?;

    let mut filters = vec![scope_filter(&params.scope_filter)];
    if params.min_complexity > 0 {
        filters.push(Filter::Leaf(LeafPredicate {
            key: "complexity".to_string(),
            operator: FilterOperator::GreaterOrEqual,
            value: FilterValue::Number(params.min_complexity as f64),
        }));
    }
    let filter = and(filters);

    let mut chunks: Vec<Chunk> = ctx
        .store
        .iterate_chunks(filter.as_ref())?
        .into_iter()
        .filter(|c| (c.end_line.saturating_sub(c.start_line) as usize + 1) >= params.min_lines)
        .filter(|c| !params.ignore_tests || !is_test_file(&c.file))
        .collect();

    if let Some(pattern) = &params.exclude_pattern {
        let re = Regex::new(pattern)
            .map_err(|e| crate::error::SearchCodeError::InvalidInput(format!("invalid excludePattern: {e}")))?;
        chunks.retain(|c| !re.is_match(&c.file));
    }

    ctx.cancellation.check()?;

    let registry = LanguageRegistry::new();
    let normalized: Vec<String> = chunks
        .iter()
        .map(|c| {
            if params.normalize_identifiers {
                let reserved = registry
                    .for_language(c.language)
                    .map(|s| s.reserved_words())
                    .unwrap_or(&[]);
                normalize_identifiers(&c.content, reserved)
            } else {
                c.content.clone()
            }
        })
        .collect();
    let normalized_hashes: Vec<String> = normalized.iter().map(|n| crate::chunk::content_hash(n)).collect();

    let n = chunks.len();
    let mut uf = UnionFind::new(n);
    let mut pair_similarity: HashMap<(usize, usize), f32> = HashMap::new();

    for i in 0..n {
        ctx.cancellation.check()?;
        for j in (i + 1)..n {
            let sim = if params.normalize_identifiers && normalized_hashes[i] == normalized_hashes[j] {
                1.0
            } else {
                cosine_similarity(&chunks[i].embedding, &chunks[j].embedding)
            };
            if sim >= params.threshold_low {
                uf.union(i, j);
                pair_similarity.insert((i, j), sim);
            }
        }
    }

    let mut groups: HashMap<usize, Vec<usize>> = HashMap::new();
    for i in 0..n {
        groups.entry(uf.find(i)).or_default().push(i);
    }

    let mut duplicates = Vec::new();
    let mut acceptable = Vec::new();

    for members in groups.into_values() {
        if members.len() < 2 {
            continue;
        }

        let mut min_sim = 1.0f32;
        for a in 0..members.len() {
            for b in (a + 1)..members.len() {
                let (i, j) = (members[a].min(members[b]), members[a].max(members[b]));
                if let Some(sim) = pair_similarity.get(&(i, j)) {
                    min_sim = min_sim.min(*sim);
                }
            }
        }

        let files: HashSet<&str> = members.iter().map(|&i| chunks[i].file.as_str()).collect();
        if params.cross_file_only && files.len() < 2 {
            continue;
        }
        if params.only_exported && !members.iter().any(|&i| chunks[i].modifiers.is_exported) {
            continue;
        }

        let instances: Vec<DuplicateInstance> = members
            .iter()
            .map(|&i| {
                let c = &chunks[i];
                DuplicateInstance {
                    file: c.file.clone(),
                    symbol_name: c.symbol_name.clone(),
                    start_line: c.start_line,
                    end_line: c.end_line,
                    lines: (c.end_line.saturating_sub(c.start_line) as usize) + 1,
                    complexity: c.complexity,
                    is_exported: c.modifiers.is_exported,
                }
            })
            .collect();

        let total_lines: usize = instances.iter().map(|i| i.lines).sum();
        let avg_complexity: f64 =
            instances.iter().map(|i| i.complexity as f64).sum::<f64>() / instances.len() as f64;
        let max_instance_lines = instances.iter().map(|i| i.lines).max().unwrap_or(0);
        let score = if params.rank_by_impact {
            total_lines as f64 * avg_complexity * files.len() as f64
        } else {
            0.0
        };

        let group = DuplicateGroup {
            level: level_for(min_sim, params),
            similarity: min_sim,
            instances,
            score,
            estimated_savings: total_lines.saturating_sub(max_instance_lines),
        };

        let representative = &normalized[members[0]];
        if params.ignore_acceptable_patterns && matches_any_pattern(representative, &params.acceptable_patterns) {
            acceptable.push(group);
        } else {
            duplicates.push(group);
        }
    }

    duplicates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    duplicates.truncate(params.limit.max(1));

    let mut files_affected = HashSet::new();
    let mut total_savings = 0usize;
    for g in &duplicates {
        total_savings += g.estimated_savings;
        for inst in &g.instances {
            files_affected.insert(inst.file.clone());
        }
    }

    Ok(DuplicatesOutput {
        summary: DuplicatesSummary {
            total_duplicates: duplicates.len(),
            files_affected: files_affected.len(),
            total_savings,
        },
        duplicates,
        acceptable_duplicates: acceptable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_identifiers_preserves_keywords() {
        let out = normalize_identifiers("fn add(a, b) { return a + b; }", &["fn", "return"]);
        assert!(out.contains("fn"));
        assert!(out.contains("return"));
        assert!(!out.contains("add"));
    }

    #[test]
    fn normalize_identifiers_is_stable_for_renamed_vars() {
        let reserved: &[&str] = &["fn", "return"];
        let a = normalize_identifiers("fn add(x, y) { return x + y; }", reserved);
        let b = normalize_identifiers("fn add(p, q) { return p + q; }", reserved);
        // `add` maps to the same placeholder in both since it's first-seen in
        // the same position; parameter names differ but map to the same
        // canonical indices.
        assert_eq!(a, b);
    }
}

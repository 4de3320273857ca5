//! Structural filter grammar used by VectorStore and SearchPipeline (spec §4.5).

use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    GreaterOrEqual,
    LessOrEqual,
    InSet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Str(String),
    Bool(bool),
    Number(f64),
    StrSet(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeafPredicate {
    pub key: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

/// `all(...)` is AND, `any(...)` is OR (spec §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    Leaf(LeafPredicate),
    All(Vec<Filter>),
    Any(Vec<Filter>),
}

impl Filter {
    pub fn matches(&self, chunk: &Chunk) -> bool {
        match self {
            Filter::Leaf(leaf) => leaf.matches(chunk),
            Filter::All(children) => children.iter().all(|f| f.matches(chunk)),
            Filter::Any(children) => children.iter().any(|f| f.matches(chunk)),
        }
    }
}

impl LeafPredicate {
    fn matches(&self, chunk: &Chunk) -> bool {
        match self.key.as_str() {
            "symbolType" => self.compare_str(chunk.symbol_type.as_str()),
            "variant" => self.compare_opt_str(chunk.variant.as_deref()),
            "language" => self.compare_str(chunk.language.as_str()),
            "isExported" => self.compare_bool(chunk.modifiers.is_exported),
            "isAsync" => self.compare_bool(chunk.modifiers.is_async),
            "isStatic" => self.compare_bool(chunk.modifiers.is_static),
            "isAbstract" => self.compare_bool(chunk.modifiers.is_abstract),
            "hasDocumentation" => self.compare_bool(chunk.has_documentation),
            "complexity" | "minComplexity" | "maxComplexity" => {
                self.compare_number(chunk.complexity as f64)
            }
            "parentScope" => self.compare_opt_str(chunk.parent_scope.as_deref()),
            "symbolName" => self.compare_opt_str(chunk.symbol_name.as_deref()),
            "decorator" => chunk.decorators.iter().any(|d| self.compare_str(d)),
            "imports" => chunk.imports.iter().any(|i| self.compare_str(i)),
            "file" => self.compare_str(&chunk.file),
            _ => true,
        }
    }

    fn compare_str(&self, actual: &str) -> bool {
        match (&self.operator, &self.value) {
            (FilterOperator::Equals, FilterValue::Str(v)) => actual == v,
            (FilterOperator::NotEquals, FilterValue::Str(v)) => actual != v,
            (FilterOperator::InSet, FilterValue::StrSet(vs)) => vs.iter().any(|v| v == actual),
            _ => false,
        }
    }

    fn compare_opt_str(&self, actual: Option<&str>) -> bool {
        match actual {
            Some(a) => self.compare_str(a),
            None => matches!(self.operator, FilterOperator::NotEquals),
        }
    }

    fn compare_bool(&self, actual: bool) -> bool {
        match (&self.operator, &self.value) {
            (FilterOperator::Equals, FilterValue::Bool(v)) => actual == *v,
            (FilterOperator::NotEquals, FilterValue::Bool(v)) => actual != *v,
            _ => false,
        }
    }

    fn compare_number(&self, actual: f64) -> bool {
        match (&self.operator, &self.value) {
            (FilterOperator::Equals, FilterValue::Number(v)) => (actual - v).abs() < f64::EPSILON,
            (FilterOperator::NotEquals, FilterValue::Number(v)) => (actual - v).abs() >= f64::EPSILON,
            (FilterOperator::GreaterOrEqual, FilterValue::Number(v)) => actual >= *v,
            (FilterOperator::LessOrEqual, FilterValue::Number(v)) => actual <= *v,
            _ => false,
        }
    }
}

pub fn and(filters: Vec<Filter>) -> Option<Filter> {
    let filters: Vec<Filter> = filters;
    if filters.is_empty() {
        None
    } else if filters.len() == 1 {
        filters.into_iter().next()
    } else {
        Some(Filter::All(filters))
    }
}

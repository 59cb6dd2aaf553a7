//! Selection-tree walk computing score and depth.

use crate::ast::{ArgValue, Field, QueryDocument, Selection};
use crate::config::CostConfig;
use crate::error::CostRejection;
use std::collections::{HashMap, HashSet};
use std::mem;
use tracing::debug;

/// Bound operation variables.
pub type Variables = serde_json::Map<String, serde_json::Value>;

/// Computed cost of one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CostReport {
    /// Complexity score.
    pub score: u64,
    /// Deepest field nesting (top-level fields are depth 1).
    pub depth: usize,
    /// Fields counted, fragments expanded, meta fields excluded.
    pub field_count: usize,
    /// Selected expensive fields, first-seen order, no duplicates.
    pub expensive_fields: Vec<String>,
    /// The walk stopped once the score passed `max_complexity`; `score` is a
    /// lower bound and the other fields cover only what was visited.
    pub truncated: bool,
}

impl CostReport {
    /// Fold the report of a fragment expansion into this one.
    fn absorb(&mut self, other: &CostReport) {
        self.field_count = self.field_count.saturating_add(other.field_count);
        self.depth = self.depth.max(other.depth);
        for name in &other.expensive_fields {
            if !self.expensive_fields.contains(name) {
                self.expensive_fields.push(name.clone());
            }
        }
    }
}

/// Stateless estimator; one instance serves all requests.
#[derive(Debug, Clone)]
pub struct QueryCostEstimator {
    config: CostConfig,
    page_args: HashSet<String>,
    expensive: HashSet<String>,
}

impl QueryCostEstimator {
    pub fn new(config: CostConfig) -> Self {
        let page_args = config.page_size_arguments.iter().cloned().collect();
        let expensive = config.expensive_fields.iter().cloned().collect();
        Self {
            config,
            page_args,
            expensive,
        }
    }

    pub fn config(&self) -> &CostConfig {
        &self.config
    }

    /// Score an operation without executing anything.
    pub fn estimate(&self, doc: &QueryDocument, variables: &Variables) -> CostReport {
        let mut walk = Walk {
            estimator: self,
            doc,
            variables,
            expanding: Vec::new(),
            expanded: HashMap::new(),
            spent: 0,
            report: CostReport::default(),
        };
        walk.selections(&doc.operation.selection_set, 0);
        let mut report = walk.report;
        report.score = walk.spent;
        report.truncated = walk.spent > self.config.max_complexity;

        debug!(
            operation = doc.operation.name.as_deref().unwrap_or("<anonymous>"),
            score = report.score,
            depth = report.depth,
            fields = report.field_count,
            truncated = report.truncated,
            "Estimated query cost"
        );
        report
    }

    /// Compare a report against the ceilings. Depth first.
    pub fn check(&self, report: &CostReport) -> Result<(), CostRejection> {
        if report.depth > self.config.max_depth {
            return Err(CostRejection::DepthExceeded {
                depth: report.depth,
                max: self.config.max_depth,
            });
        }
        if report.truncated || report.score > self.config.max_complexity {
            return Err(CostRejection::ComplexityExceeded {
                score: report.score,
                max: self.config.max_complexity,
            });
        }
        Ok(())
    }

    /// Estimate and check in one call.
    pub fn enforce(
        &self,
        doc: &QueryDocument,
        variables: &Variables,
    ) -> Result<CostReport, CostRejection> {
        let report = self.estimate(doc, variables);
        self.check(&report)?;
        Ok(report)
    }

    fn depth_factor(&self, depth: usize) -> u64 {
        let threshold = self.config.penalty_threshold_depth;
        if depth > threshold {
            (depth - threshold + 1) as u64
        } else {
            1
        }
    }

    /// Extra cost from page-size arguments of one field.
    fn page_cost(&self, field: &Field, variables: &Variables) -> u64 {
        field
            .arguments
            .iter()
            .filter(|(name, _)| self.page_args.contains(name.as_str()))
            .filter_map(|(_, value)| match value {
                ArgValue::Int(n) => u64::try_from(*n).ok(),
                ArgValue::Variable(var) => variables.get(var).and_then(|v| v.as_u64()),
                _ => None,
            })
            .map(|size| size.checked_div(self.config.page_size_divisor).unwrap_or(0))
            .fold(0u64, u64::saturating_add)
    }
}

/// State of one estimation pass.
struct Walk<'a> {
    estimator: &'a QueryCostEstimator,
    doc: &'a QueryDocument,
    variables: &'a Variables,
    /// Fragments currently being expanded, for cycle detection.
    expanding: Vec<&'a str>,
    /// Finished expansions keyed by fragment and the depth they were spread at.
    expanded: HashMap<(&'a str, usize), CostReport>,
    /// Running score. The walk stops once it passes `max_complexity`.
    spent: u64,
    report: CostReport,
}

impl<'a> Walk<'a> {
    fn exhausted(&self) -> bool {
        self.spent > self.estimator.config.max_complexity
    }

    fn charge(&mut self, cost: u64) {
        self.spent = self.spent.saturating_add(cost);
    }

    /// Walk a selection set whose parent sits at `depth`.
    fn selections(&mut self, set: &'a [Selection], depth: usize) {
        for selection in set {
            if self.exhausted() {
                return;
            }
            match selection {
                Selection::Field(field) => self.field(field, depth),
                Selection::FragmentSpread { name } => self.spread(name, depth),
                Selection::InlineFragment { selection_set, .. } => {
                    self.selections(selection_set, depth)
                }
            }
        }
    }

    fn field(&mut self, field: &'a Field, parent_depth: usize) {
        if field.is_meta() {
            return self.selections(&field.selection_set, parent_depth);
        }

        let depth = parent_depth + 1;
        self.report.depth = self.report.depth.max(depth);
        self.report.field_count = self.report.field_count.saturating_add(1);
        if self.estimator.expensive.contains(&field.name)
            && !self.report.expensive_fields.contains(&field.name)
        {
            self.report.expensive_fields.push(field.name.clone());
        }

        let own = 1u64
            .saturating_add(self.estimator.page_cost(field, self.variables))
            .saturating_mul(self.estimator.depth_factor(depth));
        self.charge(own);
        self.selections(&field.selection_set, depth);
    }

    fn spread(&mut self, name: &'a str, depth: usize) {
        if let Some(done) = self.expanded.get(&(name, depth)) {
            let score = done.score;
            self.report.absorb(done);
            return self.charge(score);
        }

        let doc = self.doc;
        let fragment = match doc.fragments.get(name) {
            Some(fragment) if !self.expanding.contains(&name) => fragment,
            _ => {
                debug!(fragment = name, "Unresolved fragment spread, using fixed cost");
                return self.charge(self.estimator.config.unresolved_fragment_cost);
            }
        };

        // Expand into a fresh report so the result can be reused.
        let outer = mem::take(&mut self.report);
        let before = self.spent;
        self.expanding.push(name);
        self.selections(&fragment.selection_set, depth);
        self.expanding.pop();

        let mut expansion = mem::replace(&mut self.report, outer);
        expansion.score = self.spent - before;
        self.report.absorb(&expansion);
        if !self.exhausted() {
            self.expanded.insert((name, depth), expansion);
        }
    }
}

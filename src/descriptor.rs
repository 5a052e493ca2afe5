// src/descriptor.rs
//! Query descriptor: the structured request the compiler consumes.
//!
//! Descriptors arrive fully formed from an upstream natural-language parser.
//! Shape is validated once here at the serde boundary; the compiler performs
//! no further semantic validation, only structural defensiveness.

use serde::{Deserialize, Serialize};

/// What kind of query the caller wants.
///
/// Unrecognized intent strings deserialize to [`Intent::Generic`], the
/// catch-all fallback strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Report,
    Chart,
    Statistics,
    Comparison,
    ComplexJoin,
    Ranking,
    #[serde(other)]
    Generic,
}

/// Requested chart rendering, carried through from the upstream parser.
///
/// Only `radialBar` and `radar` change compilation; the rest share the
/// default grouped-count path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Pie,
    Bar,
    Line,
    Area,
    Radar,
    #[serde(rename = "radialBar")]
    RadialBar,
    Table,
    Mixed,
}

/// Sort direction for ranking queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// Relative date buckets understood by the filter injector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    LastWeek,
    LastMonth,
    LastYear,
}

impl DateRange {
    /// Bucket width as a day count for `INTERVAL 'N days'` comparisons.
    pub fn interval_days(self) -> u32 {
        match self {
            DateRange::LastWeek => 7,
            DateRange::LastMonth => 30,
            DateRange::LastYear => 365,
        }
    }
}

/// User-supplied filters. All optional; absent means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    /// Single status, or several separated by commas.
    pub status: Option<String>,
    pub date_range: Option<DateRange>,
    pub project_id: Option<String>,
    pub min_budget: Option<f64>,
    pub max_budget: Option<f64>,
    pub min_hours: Option<f64>,
    pub max_hours: Option<f64>,
    pub min_progress: Option<f64>,
    pub max_progress: Option<f64>,
    /// Explicit ISO date bounds; accepted for upstream-parser compatibility
    /// but not consumed by the injector.
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// One analytics request, immutable during compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pub intent: Intent,
    /// Entities involved, first is primary.
    #[serde(default)]
    pub entities: Vec<String>,
    /// Requested aggregate names (e.g. "progress").
    #[serde(default)]
    pub metrics: Vec<String>,
    #[serde(default)]
    pub filters: Filters,
    /// Grouping granularity hint; carried through, not consumed here.
    #[serde(default)]
    pub aggregation: Option<String>,
    #[serde(default)]
    pub chart_type: Option<ChartKind>,
    /// "my items" queries: restrict to rows owned by the caller.
    #[serde(default)]
    pub personalized: bool,
    /// Explicit logical columns; empty means auto-select.
    #[serde(default)]
    pub requested_columns: Vec<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    /// Ranking metric name (count, budget, spent, hours).
    #[serde(default)]
    pub order_by: Option<String>,
    #[serde(default)]
    pub order_direction: Option<SortDir>,
    /// Ranking: entity to group by (often "profiles").
    #[serde(default)]
    pub group_by_entity: Option<String>,
    /// Multi-entity joins: true forces INNER instead of LEFT.
    #[serde(default)]
    pub require_all_entities: bool,
    /// Anti-join: keep primary rows whose join partner is absent.
    #[serde(default)]
    pub exclude_related: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("invalid descriptor JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

impl QueryDescriptor {
    pub fn new(intent: Intent) -> Self {
        Self {
            intent,
            entities: Vec::new(),
            metrics: Vec::new(),
            filters: Filters::default(),
            aggregation: None,
            chart_type: None,
            personalized: false,
            requested_columns: Vec::new(),
            limit: None,
            order_by: None,
            order_direction: None,
            group_by_entity: None,
            require_all_entities: false,
            exclude_related: false,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, DescriptorError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn with_entities(mut self, entities: &[&str]) -> Self {
        self.entities = entities.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn with_metrics(mut self, metrics: &[&str]) -> Self {
        self.metrics = metrics.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_requested_columns(mut self, columns: &[&str]) -> Self {
        self.requested_columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_chart_type(mut self, kind: ChartKind) -> Self {
        self.chart_type = Some(kind);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_order(mut self, metric: &str, direction: SortDir) -> Self {
        self.order_by = Some(metric.to_string());
        self.order_direction = Some(direction);
        self
    }

    pub fn with_group_by_entity(mut self, entity: &str) -> Self {
        self.group_by_entity = Some(entity.to_string());
        self
    }

    pub fn personalized(mut self) -> Self {
        self.personalized = true;
        self
    }

    pub fn require_all_entities(mut self) -> Self {
        self.require_all_entities = true;
        self
    }

    pub fn exclude_related(mut self) -> Self {
        self.exclude_related = true;
        self
    }

    /// First entity in the list, if any.
    pub fn primary_entity(&self) -> Option<&str> {
        self.entities.first().map(|e| e.as_str())
    }
}

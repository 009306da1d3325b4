//! Measurement-scale heuristics as an ordered rule table.
//!
//! The first rule whose predicate holds decides the scale; a column no rule
//! claims is `Nominal`. Numeric columns are fully decided by the numeric
//! rules, so the categorical rules never see them.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementScale {
    Nominal,
    NominalBinary,
    Ordinal,
    Interval,
    Ratio,
}

impl fmt::Display for MeasurementScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MeasurementScale::Nominal => "Nominal",
            MeasurementScale::NominalBinary => "Nominal (Binary)",
            MeasurementScale::Ordinal => "Ordinal",
            MeasurementScale::Interval => "Interval",
            MeasurementScale::Ratio => "Ratio",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueKind {
    /// `min` is `None` when the column holds no values at all.
    Numeric { min: Option<f64> },
    Categorical { distinct: usize, temporal: bool },
}

/// What the rules get to look at for one column.
#[derive(Debug, Clone)]
pub struct ColumnFacts {
    name: String,
    pub kind: ValueKind,
}

impl ColumnFacts {
    pub fn new(name: &str, kind: ValueKind) -> Self {
        Self {
            name: name.to_lowercase(),
            kind,
        }
    }

    fn name_has_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|kw| self.name.contains(kw))
    }
}

pub struct ScaleRule {
    pub name: &'static str,
    pub applies: fn(&ColumnFacts) -> bool,
    pub scale: MeasurementScale,
}

const COORDINATE_KEYWORDS: &[&str] = &["lat", "lon"];
pub const ORDINAL_KEYWORDS: &[&str] = &["age", "range", "rank", "level", "grade"];
pub const TEMPORAL_KEYWORDS: &[&str] = &["date", "time", "year", "month"];

fn is_coordinate(f: &ColumnFacts) -> bool {
    matches!(f.kind, ValueKind::Numeric { .. }) && f.name_has_any(COORDINATE_KEYWORDS)
}

fn has_no_minimum(f: &ColumnFacts) -> bool {
    matches!(f.kind, ValueKind::Numeric { min: None })
}

fn is_non_negative(f: &ColumnFacts) -> bool {
    matches!(f.kind, ValueKind::Numeric { min: Some(m) } if m >= 0.0)
}

fn is_numeric(f: &ColumnFacts) -> bool {
    matches!(f.kind, ValueKind::Numeric { .. })
}

fn is_binary(f: &ColumnFacts) -> bool {
    matches!(f.kind, ValueKind::Categorical { distinct, .. } if distinct <= 2)
}

fn has_ordinal_keyword(f: &ColumnFacts) -> bool {
    matches!(f.kind, ValueKind::Categorical { .. }) && f.name_has_any(ORDINAL_KEYWORDS)
}

fn is_typed_temporal(f: &ColumnFacts) -> bool {
    matches!(f.kind, ValueKind::Categorical { temporal: true, .. })
        && f.name_has_any(TEMPORAL_KEYWORDS)
}

fn has_temporal_keyword(f: &ColumnFacts) -> bool {
    matches!(f.kind, ValueKind::Categorical { .. }) && f.name_has_any(TEMPORAL_KEYWORDS)
}

pub const SCALE_RULES: &[ScaleRule] = &[
    ScaleRule {
        name: "coordinate",
        applies: is_coordinate,
        scale: MeasurementScale::Ratio,
    },
    ScaleRule {
        name: "unknown minimum",
        applies: has_no_minimum,
        scale: MeasurementScale::Interval,
    },
    ScaleRule {
        name: "non-negative",
        applies: is_non_negative,
        scale: MeasurementScale::Ratio,
    },
    ScaleRule {
        name: "signed",
        applies: is_numeric,
        scale: MeasurementScale::Interval,
    },
    ScaleRule {
        name: "binary",
        applies: is_binary,
        scale: MeasurementScale::NominalBinary,
    },
    ScaleRule {
        name: "ordinal keyword",
        applies: has_ordinal_keyword,
        scale: MeasurementScale::Ordinal,
    },
    ScaleRule {
        name: "typed temporal",
        applies: is_typed_temporal,
        scale: MeasurementScale::Interval,
    },
    ScaleRule {
        name: "untyped temporal",
        applies: has_temporal_keyword,
        scale: MeasurementScale::Nominal,
    },
];

/// The rule that decides `facts`, if any.
pub fn matching_rule(facts: &ColumnFacts) -> Option<&'static ScaleRule> {
    SCALE_RULES.iter().find(|rule| (rule.applies)(facts))
}

pub fn classify_scale(facts: &ColumnFacts) -> MeasurementScale {
    matching_rule(facts).map_or(MeasurementScale::Nominal, |rule| rule.scale)
}

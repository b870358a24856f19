// Copyright (c) 2025 dbmeta team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Classification enums reported by relational backends.
//!
//! Backends disagree wildly about what they report; every enum here keeps an
//! `Unknown` (or `Other`) escape hatch so an unrecognized code never aborts a
//! metadata scan.

use serde::{Deserialize, Serialize};

/// Index classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexKind {
    Statistic,
    Clustered,
    Hashed,
    Other,
    Unknown,
}

/// Stored procedure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcedureKind {
    Procedure,
    Function,
    Unknown,
}

/// Role of a procedure column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcedureColumnRole {
    In,
    InOut,
    Out,
    Return,
    ResultSet,
    Unknown,
}

/// Referential action attached to a foreign key for updates or deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CascadeRule {
    NoAction,
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    Unknown,
}

/// Constraint check deferability of a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Deferability {
    InitiallyDeferred,
    InitiallyImmediate,
    NotDeferrable,
    Unknown,
}

/// Sort direction of an index column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Ascending
    }
}

/// Constraint classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintType {
    PrimaryKey,
    UniqueKey,
    ForeignKey,
}

impl ConstraintType {
    /// Whether a constraint of this type identifies rows uniquely.
    pub fn is_unique(&self) -> bool {
        matches!(self, ConstraintType::PrimaryKey | ConstraintType::UniqueKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_uniqueness() {
        assert!(ConstraintType::PrimaryKey.is_unique());
        assert!(ConstraintType::UniqueKey.is_unique());
        assert!(!ConstraintType::ForeignKey.is_unique());
    }

    #[test]
    fn test_kind_serialization_roundtrip() {
        let json = serde_json::to_string(&IndexKind::Clustered).unwrap();
        let back: IndexKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, IndexKind::Clustered);
    }
}

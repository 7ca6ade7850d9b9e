//! Core task type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How urgent a task is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Can wait.
    Low,
    /// Default urgency.
    Medium,
    /// Should be picked up soon.
    High,
    /// Blocks the release.
    Critical,
}

impl Priority {
    /// Wire names accepted in task-definition documents.
    pub const NAMES: [&'static str; 4] = ["low", "medium", "high", "critical"];

    /// Parses a wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of worker a task is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerType {
    /// UI work.
    Frontend,
    /// Service and API work.
    Backend,
    /// Build, deploy and platform work.
    Infra,
    /// Documentation.
    Docs,
    /// Testing and verification.
    Qa,
    /// Spans frontend and backend.
    Fullstack,
}

impl OwnerType {
    /// Wire names accepted in task-definition documents.
    pub const NAMES: [&'static str; 6] = ["frontend", "backend", "infra", "docs", "qa", "fullstack"];

    /// Parses a wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "frontend" => Some(Self::Frontend),
            "backend" => Some(Self::Backend),
            "infra" => Some(Self::Infra),
            "docs" => Some(Self::Docs),
            "qa" => Some(Self::Qa),
            "fullstack" => Some(Self::Fullstack),
            _ => None,
        }
    }

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Frontend => "frontend",
            Self::Backend => "backend",
            Self::Infra => "infra",
            Self::Docs => "docs",
            Self::Qa => "qa",
            Self::Fullstack => "fullstack",
        }
    }
}

impl fmt::Display for OwnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of declared work with acceptance criteria and dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier (e.g., "T1").
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Delivery phase the task belongs to.
    pub phase: String,
    /// Urgency.
    pub priority: Priority,
    /// Kind of worker expected to pick it up.
    pub owner_type: OwnerType,
    /// Free-form size estimate.
    pub estimate: String,
    /// Task IDs that must be done first, duplicates collapsed.
    #[serde(default)]
    pub blocked_by: Vec<String>,
    /// What must be true when the task is complete.
    pub acceptance: Vec<String>,
    /// Expected outputs.
    pub deliverables: Vec<String>,
    /// Hints: file paths, `SPEC.md#anchor` references, free text.
    #[serde(default)]
    pub context: Vec<String>,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

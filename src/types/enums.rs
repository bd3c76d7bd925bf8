//! Enumeration types for the document processing simulator
//!
//! This module contains the lifecycle states of unit documents, rework credits,
//! workload division rules, support sub-stages, queue disciplines and output formats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle position of a unit document
///
/// Documents only ever move forward through these states, except when a placement
/// step pulls a document carrying a rework credit back to classification or coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CompletionState {
    /// Waiting for classification
    PendingClassification,
    /// Classified, waiting for attribute coding
    PendingCoding,
    /// Coded, waiting to be batched and placed
    PendingPlacement,
    /// Placed, waiting for validation
    PendingValidation,
    /// Validated, in the client-facing part of the process
    PendingClientStage,
}

impl CompletionState {
    /// All states in lifecycle order
    pub const ALL: [CompletionState; 5] = [
        CompletionState::PendingClassification,
        CompletionState::PendingCoding,
        CompletionState::PendingPlacement,
        CompletionState::PendingValidation,
        CompletionState::PendingClientStage,
    ];

    /// Numeric code (0 to 4)
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Position inside [`CompletionState::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CompletionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionState::PendingClassification => write!(f, "Pending Classification"),
            CompletionState::PendingCoding => write!(f, "Pending Coding"),
            CompletionState::PendingPlacement => write!(f, "Pending Placement"),
            CompletionState::PendingValidation => write!(f, "Pending Validation"),
            CompletionState::PendingClientStage => write!(f, "Pending Client Stage"),
        }
    }
}

/// Deferred rework credit carried by a job
///
/// A failed first-time-right check does not loop the job back immediately. The
/// credit rides along and is cleared on the next visit to the stage that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReworkStatus {
    /// No outstanding credit
    #[default]
    Clear,
    /// Classification was wrong; redo classification once
    Classification,
    /// Coding was wrong; redo coding once
    Coding,
    /// Placement was wrong; redo placement once (packets only)
    Placement,
}

impl ReworkStatus {
    /// Numeric code (0 to 3)
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Whether a credit is outstanding
    pub fn is_pending(self) -> bool {
        self != ReworkStatus::Clear
    }
}

impl fmt::Display for ReworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReworkStatus::Clear => write!(f, "Clear"),
            ReworkStatus::Classification => write!(f, "Classification Rework"),
            ReworkStatus::Coding => write!(f, "Coding Rework"),
            ReworkStatus::Placement => write!(f, "Placement Rework"),
        }
    }
}

/// Entity kind a station accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobKind {
    /// Single unit document
    Document,
    /// Batched placement packet
    Packet,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Document => write!(f, "Document"),
            JobKind::Packet => write!(f, "Packet"),
        }
    }
}

/// Rule mapping a job to one of several parallel stations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivisionRule {
    /// Sequence number modulo station count (rule 1)
    RoundRobin,
    /// Discrete-uniform draw over the stations (rule 2)
    UniformRandom,
    /// Split between trained staff and trainees (rule 3, classification only)
    TrainingAware,
}

impl DivisionRule {
    /// Numeric rule selector used by the operations team (1, 2 or 3)
    pub fn code(self) -> u8 {
        match self {
            DivisionRule::RoundRobin => 1,
            DivisionRule::UniformRandom => 2,
            DivisionRule::TrainingAware => 3,
        }
    }
}

impl TryFrom<u8> for DivisionRule {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(DivisionRule::RoundRobin),
            2 => Ok(DivisionRule::UniformRandom),
            3 => Ok(DivisionRule::TrainingAware),
            other => Err(format!("Unknown division rule: {}", other)),
        }
    }
}

impl fmt::Display for DivisionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DivisionRule::RoundRobin => write!(f, "Round Robin"),
            DivisionRule::UniformRandom => write!(f, "Uniform Random"),
            DivisionRule::TrainingAware => write!(f, "Training Aware"),
        }
    }
}

impl FromStr for DivisionRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "round_robin" | "round-robin" | "roundrobin" => Ok(DivisionRule::RoundRobin),
            "2" | "uniform_random" | "uniform-random" | "random" => {
                Ok(DivisionRule::UniformRandom)
            }
            "3" | "training_aware" | "training-aware" | "training" => {
                Ok(DivisionRule::TrainingAware)
            }
            _ => Err(format!("Unknown division rule: {}", s)),
        }
    }
}

/// Sub-stage served by the shared support staff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupportTask {
    /// Placement validation
    Validation,
    /// Writing the NIL report for the client
    NilReport,
    /// Processing client feedback
    Feedback,
    /// Final submission
    Submission,
    /// Intake of a standalone placement change request
    PlacementChangeRequest,
}

impl fmt::Display for SupportTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupportTask::Validation => write!(f, "Validation"),
            SupportTask::NilReport => write!(f, "NIL Report"),
            SupportTask::Feedback => write!(f, "Feedback"),
            SupportTask::Submission => write!(f, "Submission"),
            SupportTask::PlacementChangeRequest => write!(f, "Placement Change Request"),
        }
    }
}

/// Origin stage of a standalone change order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeOrderKind {
    /// Re-classification request (draw value 1)
    Classification,
    /// Re-coding request (draw value 2)
    Coding,
    /// Placement change request (draw value 3)
    Placement,
}

impl TryFrom<i64> for ChangeOrderKind {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ChangeOrderKind::Classification),
            2 => Ok(ChangeOrderKind::Coding),
            3 => Ok(ChangeOrderKind::Placement),
            other => Err(format!("Unknown change order type: {}", other)),
        }
    }
}

/// Ordering applied when a station or holding queue hands out its next job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueDiscipline {
    /// Strict arrival order
    #[default]
    Fifo,
    /// Highest priority first, arrival order among equals
    Priority,
}

impl FromStr for QueueDiscipline {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fifo" => Ok(QueueDiscipline::Fifo),
            "priority" => Ok(QueueDiscipline::Priority),
            _ => Err(format!("Unknown queue discipline: {}", s)),
        }
    }
}

/// Output format for replication reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Pretty-printed JSON document
    Json,
    /// One CSV row per replication
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_state_codes_follow_lifecycle() {
        let codes: Vec<u8> = CompletionState::ALL.iter().map(|s| s.code()).collect();
        assert_eq!(codes, vec![0, 1, 2, 3, 4]);
        assert!(CompletionState::PendingCoding > CompletionState::PendingClassification);
    }

    #[test]
    fn test_rework_status_codes() {
        assert_eq!(ReworkStatus::Clear.code(), 0);
        assert_eq!(ReworkStatus::Classification.code(), 1);
        assert_eq!(ReworkStatus::Coding.code(), 2);
        assert_eq!(ReworkStatus::Placement.code(), 3);
        assert!(!ReworkStatus::default().is_pending());
    }

    #[test]
    fn test_division_rule_parsing() {
        assert_eq!("1".parse::<DivisionRule>(), Ok(DivisionRule::RoundRobin));
        assert_eq!("random".parse::<DivisionRule>(), Ok(DivisionRule::UniformRandom));
        assert_eq!(DivisionRule::try_from(3), Ok(DivisionRule::TrainingAware));
        assert!(DivisionRule::try_from(4).is_err());
        assert_eq!(DivisionRule::TrainingAware.code(), 3);
    }

    #[test]
    fn test_change_order_kind_from_draw() {
        assert_eq!(ChangeOrderKind::try_from(1), Ok(ChangeOrderKind::Classification));
        assert_eq!(ChangeOrderKind::try_from(3), Ok(ChangeOrderKind::Placement));
        assert!(ChangeOrderKind::try_from(0).is_err());
    }

    #[test]
    fn test_output_format_roundtrip() {
        for format in [OutputFormat::Json, OutputFormat::Csv] {
            assert_eq!(format.to_string().parse::<OutputFormat>(), Ok(format));
        }
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}

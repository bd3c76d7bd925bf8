//! Configuration structures for the document processing simulator
//!
//! This module contains the simulation configuration structure, its CLI and JSON
//! file front ends, and the validation applied before any replication is built.
//!
//! Fractions (percentages, first-time-right probabilities) are expressed in
//! `[0.0, 1.0]` throughout.

use super::{DivisionRule, OutputFormat, QueueDiscipline};
use crate::resources::Distribution;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Working-day constants
pub mod workday {
    /// Length of a nominal working day in simulated seconds (8 hours)
    pub const SECONDS_PER_WORKDAY: f64 = 28_800.0;

    /// Working days per week
    pub const DAYS_PER_WEEK: u32 = 5;
}

/// Fixed service-time multipliers
///
/// Business constants awaiting product-owner confirmation; not configurable.
pub mod penalties {
    /// Multiplier applied when one employee classifies and codes in a single sitting
    pub const CONTEXT_SWITCH: f64 = 1.1;

    /// Multiplier applied to every placement round after the first
    pub const REPEAT_ROUND_DISCOUNT: f64 = 0.6;
}

/// Default values for process parameters
pub mod defaults {
    /// Service-time slowdown of employees in training
    pub const TRAINING_SLOWDOWN: f64 = 2.5;

    /// Share of a trainee-sized slice of manual work routed to trainees under rule 3
    pub const TRAINING_WORKLOAD_SHARE: f64 = 0.4;

    /// Units of work represented by one placement packet
    pub const WORKLOAD_FACTOR: u32 = 8;

    /// Shelf levels placed per document
    pub const LEVELS_TO_PLACE: u32 = 8;

    /// Mean gap between standalone change orders (seconds)
    pub const CHANGE_ORDER_MEAN_GAP: f64 = 5_000.0;

    /// Parallel capacity of automated stages (auto classifier, client review)
    pub const AUTOMATED_CAPACITY: u32 = 10_000;

    /// Priority of a freshly created job
    pub const BASE_PRIORITY: i32 = 1;

    /// Priority of important manual documents and placement change requests
    pub const ELEVATED_PRIORITY: i32 = 2;

    /// Replications run by the binary when nothing else is configured
    pub const REPLICATIONS: usize = 100;
}

/// Staff counts per role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaffingConfig {
    /// Trained classification employees (0 = coding staff also classify)
    pub classification_employees: u32,
    /// Classification employees in training
    pub classification_trainees: u32,
    /// Trained coding employees
    pub coding_employees: u32,
    /// Coding employees in training
    pub coding_trainees: u32,
    /// Trained placement employees
    pub placement_employees: u32,
    /// Placement employees in training
    pub placement_trainees: u32,
    /// Trained support employees (validation, NIL, feedback, submission)
    pub support_employees: u32,
    /// Support employees in training
    pub support_trainees: u32,
}

impl Default for StaffingConfig {
    fn default() -> Self {
        Self {
            classification_employees: 0,
            classification_trainees: 0,
            coding_employees: 5,
            coding_trainees: 0,
            placement_employees: 5,
            placement_trainees: 0,
            support_employees: 3,
            support_trainees: 0,
        }
    }
}

impl StaffingConfig {
    /// Whether classification has its own staff
    pub fn has_dedicated_classification(&self) -> bool {
        self.classification_employees > 0
    }
}

/// Station layout and workload division settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Division rule at classification
    pub classification_rule: DivisionRule,
    /// Division rule at coding
    pub coding_rule: DivisionRule,
    /// Division rule at placement
    pub placement_rule: DivisionRule,
    /// One shared classification station instead of one per employee
    pub classification_single_queue: bool,
    /// One shared coding station instead of one per employee
    pub coding_single_queue: bool,
    /// One shared placement station instead of one per employee
    pub placement_single_queue: bool,
    /// Classification and coding done in one sitting by coding staff
    pub combined_stages: bool,
    /// One shared combined station instead of one per employee
    pub combined_single_queue: bool,
    /// Ordering inside station queues
    pub queue_discipline: QueueDiscipline,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            classification_rule: DivisionRule::RoundRobin,
            coding_rule: DivisionRule::RoundRobin,
            placement_rule: DivisionRule::RoundRobin,
            classification_single_queue: false,
            coding_single_queue: false,
            placement_single_queue: false,
            combined_stages: false,
            combined_single_queue: false,
            queue_discipline: QueueDiscipline::Fifo,
        }
    }
}

impl RoutingConfig {
    /// Single-queue flag that applies to the stations doing classification
    pub fn classification_single(&self) -> bool {
        if self.combined_stages {
            self.combined_single_queue
        } else {
            self.classification_single_queue
        }
    }

    /// Single-queue flag that applies to the stations doing coding
    pub fn coding_single(&self) -> bool {
        if self.combined_stages {
            self.combined_single_queue
        } else {
            self.coding_single_queue
        }
    }
}

/// First-time-right probabilities and lateness thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Probability that classification is right first time
    pub ftr_classification: f64,
    /// Probability that coding is right first time
    pub ftr_coding: f64,
    /// Probability that placement is right first time
    pub ftr_placement: f64,
    /// Unfinished days after which a classification job is late
    pub late_classification_days: u32,
    /// Unfinished days after which a coding job is late
    pub late_coding_days: u32,
    /// Unfinished days after which a placement packet is late
    pub late_placement_days: u32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            ftr_classification: 0.95,
            ftr_coding: 0.95,
            ftr_placement: 0.98,
            late_classification_days: 2,
            late_coding_days: 2,
            late_placement_days: 4,
        }
    }
}

/// Service-time distributions of trained employees and automated stages (seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceTimeConfig {
    /// One classification
    pub classification: Distribution,
    /// One coded attribute
    pub coding: Distribution,
    /// One placed level of one document
    pub placement: Distribution,
    /// One workload unit of validation
    pub validation: Distribution,
    /// One workload unit of NIL reporting
    pub nil_report: Distribution,
    /// One workload unit of feedback processing
    pub feedback: Distribution,
    /// One workload unit of submission
    pub submission: Distribution,
    /// One workload unit of placement change-request intake
    pub placement_change_request: Distribution,
    /// Automated classifier, per document
    pub automated_classification: Distribution,
    /// Client review of a NIL report
    pub client_review: Distribution,
}

impl Default for ServiceTimeConfig {
    fn default() -> Self {
        Self {
            classification: Distribution::lognormal(8.75, 19.29),
            coding: Distribution::lognormal(15.55, 287.57),
            placement: Distribution::lognormal(8.75, 19.29),
            validation: Distribution::lognormal(5.23, 2.57),
            nil_report: Distribution::lognormal(12.55, 19.29),
            feedback: Distribution::lognormal(15.55, 287.57),
            submission: Distribution::lognormal(8.75, 6.12),
            placement_change_request: Distribution::lognormal(8.75, 19.29),
            automated_classification: Distribution::lognormal(1.0, 0.1),
            client_review: Distribution::normal(23_040.0, 3_000.0),
        }
    }
}

impl ServiceTimeConfig {
    fn named(&self) -> [(&'static str, &Distribution); 10] {
        [
            ("service_times.classification", &self.classification),
            ("service_times.coding", &self.coding),
            ("service_times.placement", &self.placement),
            ("service_times.validation", &self.validation),
            ("service_times.nil_report", &self.nil_report),
            ("service_times.feedback", &self.feedback),
            ("service_times.submission", &self.submission),
            ("service_times.placement_change_request", &self.placement_change_request),
            ("service_times.automated_classification", &self.automated_classification),
            ("service_times.client_review", &self.client_review),
        ]
    }
}

/// Which stage opens or closes on which day of the production period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DayPlan {
    /// Days on which a batch of new documents arrives (day 0 = start of run)
    pub arrival_days: Vec<u32>,
    /// Days on which classification works its intake queue
    pub classification_days: Vec<u32>,
    /// Days on which coding works its holding queues
    pub coding_days: Vec<u32>,
    /// Days on which classification and coding work their rework queues
    pub rework_days: Vec<u32>,
    /// Days on which placement works its holding queues
    pub placement_days: Vec<u32>,
    /// Days on which placement works its rework queues
    pub placement_rework_days: Vec<u32>,
    /// Weeks at whose end coded documents are batched into packets
    pub batching_weeks: Vec<u32>,
}

impl Default for DayPlan {
    fn default() -> Self {
        Self {
            arrival_days: vec![0, 5, 10, 15],
            classification_days: vec![1, 3, 6, 8, 11, 13, 16, 18],
            coding_days: vec![2, 4, 7, 9, 12, 14, 17, 19],
            rework_days: vec![5, 10, 15, 20],
            placement_days: vec![6, 7, 8, 9, 11, 12, 13, 14, 16, 17, 18, 19],
            placement_rework_days: vec![5, 10, 15, 20],
            batching_weeks: vec![1, 2, 3],
        }
    }
}

/// Command line arguments structure
#[derive(Debug, Clone, Parser)]
#[command(
    name = "docflow-sim",
    version = "0.1.0",
    about = "Document flow simulator - queueing model of a classification, coding and placement operation",
    long_about = "Runs replications of a discrete-event model in which documents are classified, coded, batched into placement packets, placed, validated and submitted by finite teams working on a day plan, with rework loops and lateness escalation.

EXAMPLES:
    # Run with default settings
    docflow-sim

    # Use a configuration file
    docflow-sim --config process.json

    # Override staffing
    docflow-sim --coding-employees 8 --placement-employees 6 --replications 20

    # Generate configuration template
    docflow-sim --print-config > process.json

    # Validate configuration without running
    docflow-sim --config process.json --dry-run

CONFIGURATION:
    Configuration can be provided via:
    1. Command line arguments (highest priority)
    2. Configuration file (--config flag)
    3. Default values (lowest priority)

    Supported configuration file formats: JSON (.json)"
)]
pub struct CliArgs {
    /// Configuration file path (JSON format)
    #[arg(
        short,
        long,
        help = "Configuration file path (JSON format)",
        long_help = "Path to a JSON configuration file. CLI arguments will override file settings."
    )]
    pub config: Option<String>,

    /// Number of independent replications
    #[arg(long, help = "Number of replications to run")]
    pub replications: Option<usize>,

    /// Random seed for reproducible results
    #[arg(long, help = "Random seed for reproducible results")]
    pub seed: Option<u64>,

    /// Trained classification employees
    #[arg(long, help = "Trained classification employees (0 = coders classify)")]
    pub classification_employees: Option<u32>,

    /// Classification trainees
    #[arg(long, help = "Classification employees in training")]
    pub classification_trainees: Option<u32>,

    /// Trained coding employees
    #[arg(long, help = "Trained coding employees")]
    pub coding_employees: Option<u32>,

    /// Coding trainees
    #[arg(long, help = "Coding employees in training")]
    pub coding_trainees: Option<u32>,

    /// Trained placement employees
    #[arg(long, help = "Trained placement employees")]
    pub placement_employees: Option<u32>,

    /// Placement trainees
    #[arg(long, help = "Placement employees in training")]
    pub placement_trainees: Option<u32>,

    /// Trained support employees
    #[arg(long, help = "Trained support employees")]
    pub support_employees: Option<u32>,

    /// Support trainees
    #[arg(long, help = "Support employees in training")]
    pub support_trainees: Option<u32>,

    /// Productive share of a working day
    #[arg(long, help = "Productive share of a working day (0.0-1.0]")]
    pub productivity: Option<f64>,

    /// Length of the production period in working days
    #[arg(long, help = "Production period length in working days")]
    pub production_period_days: Option<u32>,

    /// Mean arrival batch size
    #[arg(long, help = "Mean number of documents per arrival batch")]
    pub arrival_mean: Option<f64>,

    /// Standard deviation of the arrival batch size
    #[arg(long, help = "Standard deviation of documents per arrival batch")]
    pub arrival_std_dev: Option<f64>,

    /// Share of arrivals eligible for classification
    #[arg(long, help = "Share of arrivals eligible for classification (0.0-1.0)")]
    pub eligible_percentage: Option<f64>,

    /// Share of eligible documents classified automatically
    #[arg(long, help = "Share of eligible documents handled by the auto classifier (0.0-1.0)")]
    pub auto_classification_percentage: Option<f64>,

    /// Share of manual documents that are important
    #[arg(long, help = "Share of manual documents that are important (0.0-1.0)")]
    pub important_percentage: Option<f64>,

    /// Share of manual documents that are proactive
    #[arg(long, help = "Share of manual documents that are proactive (0.0-1.0)")]
    pub proactive_percentage: Option<f64>,

    /// Share of documents that only need classification
    #[arg(long, help = "Share of documents leaving after classification (0.0-1.0)")]
    pub classification_only_percentage: Option<f64>,

    /// Share of NIL reports that come back with client feedback
    #[arg(long, help = "Share of NIL reports returned with feedback (0.0-1.0)")]
    pub feedback_percentage: Option<f64>,

    /// First-time-right probability at classification
    #[arg(long, help = "First-time-right probability at classification (0.0-1.0)")]
    pub ftr_classification: Option<f64>,

    /// First-time-right probability at coding
    #[arg(long, help = "First-time-right probability at coding (0.0-1.0)")]
    pub ftr_coding: Option<f64>,

    /// First-time-right probability at placement
    #[arg(long, help = "First-time-right probability at placement (0.0-1.0)")]
    pub ftr_placement: Option<f64>,

    /// Lateness threshold at classification
    #[arg(long, help = "Unfinished days before a classification job is late")]
    pub late_classification_days: Option<u32>,

    /// Lateness threshold at coding
    #[arg(long, help = "Unfinished days before a coding job is late")]
    pub late_coding_days: Option<u32>,

    /// Lateness threshold at placement
    #[arg(long, help = "Unfinished days before a placement packet is late")]
    pub late_placement_days: Option<u32>,

    /// Division rule at classification
    #[arg(long, help = "Classification division rule (1 round robin, 2 random, 3 training aware)")]
    pub classification_rule: Option<DivisionRule>,

    /// Division rule at coding
    #[arg(long, help = "Coding division rule (1 round robin, 2 random)")]
    pub coding_rule: Option<DivisionRule>,

    /// Division rule at placement
    #[arg(long, help = "Placement division rule (1 round robin, 2 random)")]
    pub placement_rule: Option<DivisionRule>,

    /// One shared classification station
    #[arg(long, help = "Use one shared classification queue")]
    pub classification_single_queue: bool,

    /// One shared coding station
    #[arg(long, help = "Use one shared coding queue")]
    pub coding_single_queue: bool,

    /// One shared placement station
    #[arg(long, help = "Use one shared placement queue")]
    pub placement_single_queue: bool,

    /// Classify and code in one sitting
    #[arg(long, help = "Combine classification and coding into one stage")]
    pub combined_stages: bool,

    /// One shared combined station
    #[arg(long, help = "Use one shared queue for the combined stage")]
    pub combined_single_queue: bool,

    /// Category to attribute-count table
    #[arg(long, help = "CSV file mapping category to attribute count")]
    pub attributes_csv: Option<String>,

    /// Category cumulative probability table
    #[arg(long, help = "CSV file mapping category to cumulative probability")]
    pub cdf_csv: Option<String>,

    /// Report output path
    #[arg(long, help = "Write the replication report to this path")]
    pub report: Option<String>,

    /// Report format
    #[arg(
        long,
        help = "Report format (json or csv)",
        long_help = "Format of the replication report written with --report. Supported formats: json, csv. Default: json"
    )]
    pub output_format: Option<OutputFormat>,

    /// Write logs to daily rolling files in this directory
    #[arg(long, help = "Directory for rolling log files")]
    pub log_dir: Option<String>,

    /// Emit logs as JSON
    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, help = "Enable debug logging")]
    pub debug: bool,

    /// Dry run mode - validate configuration without running simulation
    #[arg(long, help = "Validate configuration without running simulation")]
    pub dry_run: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in JSON format and exit")]
    pub print_config: bool,
}

/// Configuration file structure (allows partial configuration)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Staff counts per role
    pub staffing: Option<StaffingConfig>,
    /// Station layout and division rules
    pub routing: Option<RoutingConfig>,
    /// First-time-right probabilities and lateness thresholds
    pub quality: Option<QualityConfig>,
    /// Service-time distributions
    pub service_times: Option<ServiceTimeConfig>,
    /// Day plan
    pub day_plan: Option<DayPlan>,
    /// Productive share of a working day
    pub productivity: Option<f64>,
    /// Production period length in working days
    pub production_period_days: Option<u32>,
    /// Mean arrival batch size
    pub arrival_mean: Option<f64>,
    /// Standard deviation of the arrival batch size
    pub arrival_std_dev: Option<f64>,
    /// Share of arrivals eligible for classification
    pub eligible_percentage: Option<f64>,
    /// Share of eligible documents classified automatically
    pub auto_classification_percentage: Option<f64>,
    /// Share of manual documents that are important
    pub important_percentage: Option<f64>,
    /// Share of manual documents that are proactive
    pub proactive_percentage: Option<f64>,
    /// Share of documents that only need classification
    pub classification_only_percentage: Option<f64>,
    /// Share of NIL reports returned with feedback
    pub feedback_percentage: Option<f64>,
    /// Units of work per placement packet
    pub workload_factor: Option<u32>,
    /// Shelf levels placed per document
    pub levels_to_place: Option<u32>,
    /// Service-time slowdown of trainees
    pub training_slowdown: Option<f64>,
    /// Rule-3 training workload share
    pub training_workload_share: Option<f64>,
    /// Change-order gap distribution
    pub change_order_gap: Option<Distribution>,
    /// Number of replications
    pub replications: Option<usize>,
    /// Random seed for reproducible results
    pub seed: Option<u64>,
    /// Report format
    pub output_format: Option<OutputFormat>,
    /// Report output path
    pub report_path: Option<String>,
    /// Category to attribute-count table
    pub attributes_csv: Option<String>,
    /// Category cumulative probability table
    pub cdf_csv: Option<String>,
}

/// Configuration for the document processing simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Staff counts per role
    pub staffing: StaffingConfig,
    /// Station layout and division rules
    pub routing: RoutingConfig,
    /// First-time-right probabilities and lateness thresholds
    pub quality: QualityConfig,
    /// Service-time distributions
    pub service_times: ServiceTimeConfig,
    /// Day plan
    pub day_plan: DayPlan,
    /// Productive share of a working day (0.0-1.0]
    pub productivity: f64,
    /// Production period length in working days
    pub production_period_days: u32,
    /// Mean arrival batch size
    pub arrival_mean: f64,
    /// Standard deviation of the arrival batch size
    pub arrival_std_dev: f64,
    /// Share of arrivals eligible for classification (0.0-1.0)
    pub eligible_percentage: f64,
    /// Share of eligible documents classified automatically (0.0-1.0)
    pub auto_classification_percentage: f64,
    /// Share of manual documents that are important (0.0-1.0)
    pub important_percentage: f64,
    /// Share of manual documents that are proactive (0.0-1.0)
    pub proactive_percentage: f64,
    /// Share of documents that only need classification (0.0-1.0)
    pub classification_only_percentage: f64,
    /// Share of NIL reports returned with feedback (0.0-1.0)
    pub feedback_percentage: f64,
    /// Units of work per placement packet
    pub workload_factor: u32,
    /// Shelf levels placed per document
    pub levels_to_place: u32,
    /// Service-time slowdown of trainees
    pub training_slowdown: f64,
    /// Rule-3 training workload share (0.0-1.0)
    pub training_workload_share: f64,
    /// Gap between standalone change orders
    pub change_order_gap: Distribution,
    /// Number of replications
    pub replications: usize,
    /// Random seed for reproducible results
    pub seed: Option<u64>,
    /// Report format
    pub output_format: OutputFormat,
    /// Report output path
    pub report_path: Option<String>,
    /// Category to attribute-count table (built-in table when absent)
    pub attributes_csv: Option<String>,
    /// Category cumulative probability table (built-in table when absent)
    pub cdf_csv: Option<String>,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Configuration file read error
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Unsupported configuration file format
    #[error("Unsupported configuration file format: {0} (supported: .json)")]
    UnsupportedFormat(String),
}

/// Validation errors for simulation configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    /// Percentage value is out of range
    #[error("Invalid percentage for {field}: {value} (must be between 0.0 and 1.0)")]
    InvalidPercentage {
        /// Name of the field with invalid percentage
        field: String,
        /// The invalid percentage value
        value: f64,
    },

    /// A count that must be positive is zero
    #[error("{field} must be greater than 0")]
    ZeroCount {
        /// Name of the field
        field: String,
    },

    /// A role without any staff
    #[error("At least one {role} employee is required")]
    MissingStaff {
        /// Role name
        role: String,
    },

    /// Trainees configured without trained staff to supervise them
    #[error("{role} trainees require at least one trained {role} employee")]
    UnsupervisedTrainees {
        /// Role name
        role: String,
    },

    /// Productivity outside (0, 1]
    #[error("Productivity must be in (0.0, 1.0], got {0}")]
    InvalidProductivity(f64),

    /// A real-valued parameter that must be non-negative and finite
    #[error("Invalid value for {field}: {value}")]
    InvalidValue {
        /// Name of the field
        field: String,
        /// The invalid value
        value: f64,
    },

    /// Division rule not allowed at this stage
    #[error("Division rule {rule} is not supported for {field}")]
    InvalidRule {
        /// Name of the field
        field: String,
        /// Offending rule
        rule: DivisionRule,
    },

    /// Day outside the production period
    #[error("Day {day} in {field} is outside the production period of {period} days")]
    InvalidDay {
        /// Name of the day list
        field: String,
        /// Offending day
        day: u32,
        /// Production period length
        period: u32,
    },

    /// Distribution parameters are invalid
    #[error("Invalid distribution for {field}: {reason}")]
    InvalidDistribution {
        /// Name of the field
        field: String,
        /// What is wrong with it
        reason: String,
    },
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            staffing: StaffingConfig::default(),
            routing: RoutingConfig::default(),
            quality: QualityConfig::default(),
            service_times: ServiceTimeConfig::default(),
            day_plan: DayPlan::default(),
            productivity: 0.8,
            production_period_days: 20,
            arrival_mean: 3_910.0,
            arrival_std_dev: 1_411.0,
            eligible_percentage: 0.9,
            auto_classification_percentage: 0.3,
            important_percentage: 0.4,
            proactive_percentage: 0.6,
            classification_only_percentage: 0.6,
            feedback_percentage: 0.1,
            workload_factor: defaults::WORKLOAD_FACTOR,
            levels_to_place: defaults::LEVELS_TO_PLACE,
            training_slowdown: defaults::TRAINING_SLOWDOWN,
            training_workload_share: defaults::TRAINING_WORKLOAD_SHARE,
            change_order_gap: Distribution::exponential(defaults::CHANGE_ORDER_MEAN_GAP),
            replications: defaults::REPLICATIONS,
            seed: None,
            output_format: OutputFormat::Json,
            report_path: None,
            attributes_csv: None,
            cdf_csv: None,
        }
    }
}

impl SimulationConfig {
    /// Create a new configuration from command line arguments and optional config file
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::from_cli_args(args)
    }

    /// Create configuration from parsed CLI arguments
    pub fn from_cli_args(args: CliArgs) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(config_path) = &args.config {
            config = Self::from_file(config_path)?;
        }

        // CLI takes precedence over the file
        Self::apply_cli_overrides(&mut config, args);

        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let config_file: ConfigFile = serde_json::from_str(&content)?;
                Ok(Self::from_config_file(config_file))
            }
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::UnsupportedFormat("no extension".to_string())),
        }
    }

    /// Create configuration from a config file, merging with defaults
    fn from_config_file(file: ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            staffing: file.staffing.unwrap_or(defaults.staffing),
            routing: file.routing.unwrap_or(defaults.routing),
            quality: file.quality.unwrap_or(defaults.quality),
            service_times: file.service_times.unwrap_or(defaults.service_times),
            day_plan: file.day_plan.unwrap_or(defaults.day_plan),
            productivity: file.productivity.unwrap_or(defaults.productivity),
            production_period_days: file
                .production_period_days
                .unwrap_or(defaults.production_period_days),
            arrival_mean: file.arrival_mean.unwrap_or(defaults.arrival_mean),
            arrival_std_dev: file.arrival_std_dev.unwrap_or(defaults.arrival_std_dev),
            eligible_percentage: file.eligible_percentage.unwrap_or(defaults.eligible_percentage),
            auto_classification_percentage: file
                .auto_classification_percentage
                .unwrap_or(defaults.auto_classification_percentage),
            important_percentage: file
                .important_percentage
                .unwrap_or(defaults.important_percentage),
            proactive_percentage: file
                .proactive_percentage
                .unwrap_or(defaults.proactive_percentage),
            classification_only_percentage: file
                .classification_only_percentage
                .unwrap_or(defaults.classification_only_percentage),
            feedback_percentage: file.feedback_percentage.unwrap_or(defaults.feedback_percentage),
            workload_factor: file.workload_factor.unwrap_or(defaults.workload_factor),
            levels_to_place: file.levels_to_place.unwrap_or(defaults.levels_to_place),
            training_slowdown: file.training_slowdown.unwrap_or(defaults.training_slowdown),
            training_workload_share: file
                .training_workload_share
                .unwrap_or(defaults.training_workload_share),
            change_order_gap: file.change_order_gap.unwrap_or(defaults.change_order_gap),
            replications: file.replications.unwrap_or(defaults.replications),
            seed: file.seed.or(defaults.seed),
            output_format: file.output_format.unwrap_or(defaults.output_format),
            report_path: file.report_path.or(defaults.report_path),
            attributes_csv: file.attributes_csv.or(defaults.attributes_csv),
            cdf_csv: file.cdf_csv.or(defaults.cdf_csv),
        }
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(config: &mut Self, args: CliArgs) {
        if let Some(value) = args.replications {
            config.replications = value;
        }
        if let Some(value) = args.seed {
            config.seed = Some(value);
        }

        let staffing = &mut config.staffing;
        if let Some(value) = args.classification_employees {
            staffing.classification_employees = value;
        }
        if let Some(value) = args.classification_trainees {
            staffing.classification_trainees = value;
        }
        if let Some(value) = args.coding_employees {
            staffing.coding_employees = value;
        }
        if let Some(value) = args.coding_trainees {
            staffing.coding_trainees = value;
        }
        if let Some(value) = args.placement_employees {
            staffing.placement_employees = value;
        }
        if let Some(value) = args.placement_trainees {
            staffing.placement_trainees = value;
        }
        if let Some(value) = args.support_employees {
            staffing.support_employees = value;
        }
        if let Some(value) = args.support_trainees {
            staffing.support_trainees = value;
        }

        if let Some(value) = args.productivity {
            config.productivity = value;
        }
        if let Some(value) = args.production_period_days {
            config.production_period_days = value;
        }
        if let Some(value) = args.arrival_mean {
            config.arrival_mean = value;
        }
        if let Some(value) = args.arrival_std_dev {
            config.arrival_std_dev = value;
        }
        if let Some(value) = args.eligible_percentage {
            config.eligible_percentage = value;
        }
        if let Some(value) = args.auto_classification_percentage {
            config.auto_classification_percentage = value;
        }
        if let Some(value) = args.important_percentage {
            config.important_percentage = value;
        }
        if let Some(value) = args.proactive_percentage {
            config.proactive_percentage = value;
        }
        if let Some(value) = args.classification_only_percentage {
            config.classification_only_percentage = value;
        }
        if let Some(value) = args.feedback_percentage {
            config.feedback_percentage = value;
        }

        let quality = &mut config.quality;
        if let Some(value) = args.ftr_classification {
            quality.ftr_classification = value;
        }
        if let Some(value) = args.ftr_coding {
            quality.ftr_coding = value;
        }
        if let Some(value) = args.ftr_placement {
            quality.ftr_placement = value;
        }
        if let Some(value) = args.late_classification_days {
            quality.late_classification_days = value;
        }
        if let Some(value) = args.late_coding_days {
            quality.late_coding_days = value;
        }
        if let Some(value) = args.late_placement_days {
            quality.late_placement_days = value;
        }

        let routing = &mut config.routing;
        if let Some(value) = args.classification_rule {
            routing.classification_rule = value;
        }
        if let Some(value) = args.coding_rule {
            routing.coding_rule = value;
        }
        if let Some(value) = args.placement_rule {
            routing.placement_rule = value;
        }
        // Flags can only switch a toggle on; the file decides otherwise
        routing.classification_single_queue |= args.classification_single_queue;
        routing.coding_single_queue |= args.coding_single_queue;
        routing.placement_single_queue |= args.placement_single_queue;
        routing.combined_stages |= args.combined_stages;
        routing.combined_single_queue |= args.combined_single_queue;

        if let Some(value) = args.attributes_csv {
            config.attributes_csv = Some(value);
        }
        if let Some(value) = args.cdf_csv {
            config.cdf_csv = Some(value);
        }
        if let Some(value) = args.report {
            config.report_path = Some(value);
        }
        if let Some(value) = args.output_format {
            config.output_format = value;
        }
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Print configuration as JSON
    pub fn print_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.validate_staffing()?;

        if !(self.productivity > 0.0 && self.productivity <= 1.0) {
            return Err(ConfigValidationError::InvalidProductivity(self.productivity));
        }
        if self.production_period_days == 0 {
            return Err(ConfigValidationError::ZeroCount {
                field: "production_period_days".to_string(),
            });
        }
        if self.replications == 0 {
            return Err(ConfigValidationError::ZeroCount { field: "replications".to_string() });
        }
        if self.workload_factor == 0 {
            return Err(ConfigValidationError::ZeroCount { field: "workload_factor".to_string() });
        }

        self.validate_non_negative("arrival_mean", self.arrival_mean)?;
        self.validate_non_negative("arrival_std_dev", self.arrival_std_dev)?;
        self.validate_non_negative("training_slowdown", self.training_slowdown)?;

        self.validate_percentage("eligible_percentage", self.eligible_percentage)?;
        self.validate_percentage(
            "auto_classification_percentage",
            self.auto_classification_percentage,
        )?;
        self.validate_percentage("important_percentage", self.important_percentage)?;
        self.validate_percentage("proactive_percentage", self.proactive_percentage)?;
        self.validate_percentage(
            "classification_only_percentage",
            self.classification_only_percentage,
        )?;
        self.validate_percentage("feedback_percentage", self.feedback_percentage)?;
        self.validate_percentage("training_workload_share", self.training_workload_share)?;
        self.validate_percentage("quality.ftr_classification", self.quality.ftr_classification)?;
        self.validate_percentage("quality.ftr_coding", self.quality.ftr_coding)?;
        self.validate_percentage("quality.ftr_placement", self.quality.ftr_placement)?;

        for (field, rule) in [
            ("routing.coding_rule", self.routing.coding_rule),
            ("routing.placement_rule", self.routing.placement_rule),
        ] {
            if rule == DivisionRule::TrainingAware {
                return Err(ConfigValidationError::InvalidRule { field: field.to_string(), rule });
            }
        }
        // The training-aware split needs somebody on the trainee side of the pool
        if self.routing.classification_rule == DivisionRule::TrainingAware {
            let trainees = if self.staffing.has_dedicated_classification()
                && !self.routing.combined_stages
            {
                self.staffing.classification_trainees
            } else {
                self.staffing.coding_trainees
            };
            if trainees == 0 {
                return Err(ConfigValidationError::InvalidRule {
                    field: "routing.classification_rule".to_string(),
                    rule: DivisionRule::TrainingAware,
                });
            }
        }

        for (field, dist) in self.service_times.named() {
            dist.validate().map_err(|reason| ConfigValidationError::InvalidDistribution {
                field: field.to_string(),
                reason,
            })?;
        }
        self.change_order_gap.validate().map_err(|reason| {
            ConfigValidationError::InvalidDistribution {
                field: "change_order_gap".to_string(),
                reason,
            }
        })?;

        self.validate_day_plan()
    }

    fn validate_staffing(&self) -> Result<(), ConfigValidationError> {
        let staffing = &self.staffing;
        for (role, trained, trainees) in [
            ("coding", staffing.coding_employees, staffing.coding_trainees),
            ("placement", staffing.placement_employees, staffing.placement_trainees),
            ("support", staffing.support_employees, staffing.support_trainees),
        ] {
            if trained + trainees == 0 {
                return Err(ConfigValidationError::MissingStaff { role: role.to_string() });
            }
        }
        if staffing.classification_trainees > 0 && staffing.classification_employees == 0 {
            return Err(ConfigValidationError::UnsupervisedTrainees {
                role: "classification".to_string(),
            });
        }
        Ok(())
    }

    fn validate_day_plan(&self) -> Result<(), ConfigValidationError> {
        let period = self.production_period_days;
        let plan = &self.day_plan;

        for &day in &plan.arrival_days {
            if day >= period {
                return Err(ConfigValidationError::InvalidDay {
                    field: "day_plan.arrival_days".to_string(),
                    day,
                    period,
                });
            }
        }

        for (field, days) in [
            ("day_plan.classification_days", &plan.classification_days),
            ("day_plan.coding_days", &plan.coding_days),
            ("day_plan.rework_days", &plan.rework_days),
            ("day_plan.placement_days", &plan.placement_days),
            ("day_plan.placement_rework_days", &plan.placement_rework_days),
        ] {
            // A gate for day d opens during day d - 1, so day 0 cannot be gated
            if let Some(&day) = days.iter().find(|&&d| d == 0 || d > period) {
                return Err(ConfigValidationError::InvalidDay { field: field.to_string(), day, period });
            }
        }

        for &week in &plan.batching_weeks {
            let last_day = week.checked_mul(workday::DAYS_PER_WEEK);
            match last_day {
                Some(day) if week > 0 && day <= period => {}
                _ => {
                    return Err(ConfigValidationError::InvalidDay {
                        field: "day_plan.batching_weeks".to_string(),
                        day: last_day.unwrap_or(u32::MAX),
                        period,
                    });
                }
            }
        }

        Ok(())
    }

    /// Helper method to validate percentage values
    fn validate_percentage(&self, field: &str, value: f64) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigValidationError::InvalidPercentage {
                field: field.to_string(),
                value,
            });
        }
        Ok(())
    }

    fn validate_non_negative(&self, field: &str, value: f64) -> Result<(), ConfigValidationError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigValidationError::InvalidValue { field: field.to_string(), value });
        }
        Ok(())
    }

    /// Simulated seconds in one productive day
    pub fn day_length(&self) -> f64 {
        self.productivity * workday::SECONDS_PER_WORKDAY
    }

    /// Simulated start of day `day`
    pub fn day_start(&self, day: u32) -> f64 {
        day as f64 * self.day_length()
    }

    /// Simulated length of one replication
    pub fn run_length(&self) -> f64 {
        self.day_start(self.production_period_days)
    }

    /// Seed of replication `index`, when the run is seeded
    pub fn replication_seed(&self, index: usize) -> Option<u64> {
        self.seed.map(|seed| seed.wrapping_add(index as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn bare_args() -> CliArgs {
        CliArgs::try_parse_from(["test"]).unwrap()
    }

    #[test]
    fn test_simulation_config_default() {
        let config = SimulationConfig::default();
        assert_eq!(config.staffing.classification_employees, 0);
        assert_eq!(config.staffing.coding_employees, 5);
        assert_eq!(config.staffing.placement_employees, 5);
        assert_eq!(config.staffing.support_employees, 3);
        assert_eq!(config.productivity, 0.8);
        assert_eq!(config.production_period_days, 20);
        assert_eq!(config.arrival_mean, 3_910.0);
        assert_eq!(config.quality.late_placement_days, 4);
        assert_eq!(config.workload_factor, 8);
        assert_eq!(config.replications, 100);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_day_arithmetic() {
        let config = SimulationConfig::default();
        assert_eq!(config.day_length(), 23_040.0);
        assert_eq!(config.day_start(5), 115_200.0);
        assert_eq!(config.run_length(), 460_800.0);
    }

    #[test]
    fn test_cli_overrides() {
        let args = CliArgs::try_parse_from([
            "test",
            "--coding-employees",
            "8",
            "--ftr-coding",
            "0.9",
            "--classification-rule",
            "3",
            "--combined-stages",
            "--seed",
            "99",
            "--output-format",
            "csv",
        ])
        .unwrap();
        let config = SimulationConfig::from_cli_args(args).unwrap();
        assert_eq!(config.staffing.coding_employees, 8);
        assert_eq!(config.quality.ftr_coding, 0.9);
        assert_eq!(config.routing.classification_rule, DivisionRule::TrainingAware);
        assert!(config.routing.combined_stages);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.output_format, OutputFormat::Csv);
        // Untouched fields keep their defaults
        assert_eq!(config.staffing.placement_employees, 5);
    }

    #[test]
    fn test_config_file_loading_is_partial() {
        let mut temp_file = Builder::new().suffix(".json").tempfile().unwrap();
        let config_json = r#"{
            "staffing": { "coding_employees": 2, "coding_trainees": 1 },
            "quality": { "ftr_placement": 0.5 },
            "productivity": 0.75,
            "seed": 12345
        }"#;
        temp_file.write_all(config_json.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = SimulationConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.staffing.coding_employees, 2);
        assert_eq!(config.staffing.coding_trainees, 1);
        assert_eq!(config.staffing.placement_employees, 5);
        assert_eq!(config.quality.ftr_placement, 0.5);
        assert_eq!(config.quality.ftr_coding, 0.95);
        assert_eq!(config.productivity, 0.75);
        assert_eq!(config.seed, Some(12345));
    }

    #[test]
    fn test_config_file_errors() {
        assert!(matches!(
            SimulationConfig::from_file("does/not/exist.json"),
            Err(ConfigError::FileNotFound(_))
        ));

        let temp_file = Builder::new().suffix(".yaml").tempfile().unwrap();
        assert!(matches!(
            SimulationConfig::from_file(temp_file.path()),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let mut config = SimulationConfig::default();
        config.staffing.support_trainees = 2;
        config.routing.placement_single_queue = true;
        let temp_file = Builder::new().suffix(".json").tempfile().unwrap();
        config.save_to_file(temp_file.path()).unwrap();

        let reloaded = SimulationConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(reloaded.staffing, config.staffing);
        assert_eq!(reloaded.routing, config.routing);
        assert_eq!(reloaded.day_plan, config.day_plan);
    }

    #[test]
    fn test_validation_rejects_bad_percentages() {
        let mut config = SimulationConfig::default();
        config.feedback_percentage = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidPercentage { .. })
        ));

        let mut config = SimulationConfig::default();
        config.quality.ftr_coding = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_missing_staff() {
        let mut config = SimulationConfig::default();
        config.staffing.placement_employees = 0;
        assert!(matches!(config.validate(), Err(ConfigValidationError::MissingStaff { .. })));

        let mut config = SimulationConfig::default();
        config.staffing.classification_trainees = 2;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::UnsupervisedTrainees { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_training_rule_outside_classification() {
        let mut config = SimulationConfig::default();
        config.routing.coding_rule = DivisionRule::TrainingAware;
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidRule { .. })));
    }

    #[test]
    fn test_training_rule_needs_trainees() {
        let mut config = SimulationConfig::default();
        config.routing.classification_rule = DivisionRule::TrainingAware;
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidRule { .. })));

        // Without a classification team the coding team is split
        config.staffing.coding_trainees = 2;
        assert!(config.validate().is_ok());

        config.staffing.classification_employees = 2;
        assert!(config.validate().is_err());
        config.staffing.classification_trainees = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_days_outside_period() {
        let mut config = SimulationConfig::default();
        config.production_period_days = 10;
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidDay { .. })));

        let mut config = SimulationConfig::default();
        config.day_plan.placement_days.push(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_huge_batching_week_is_rejected_without_overflow() {
        let mut config = SimulationConfig::default();
        config.day_plan.batching_weeks = vec![u32::MAX];
        match config.validate() {
            Err(ConfigValidationError::InvalidDay { field, day, .. }) => {
                assert_eq!(field, "day_plan.batching_weeks");
                assert_eq!(day, u32::MAX);
            }
            other => panic!("expected an invalid day, got {:?}", other),
        }

        config.day_plan.batching_weeks = vec![0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_productivity_and_counts() {
        let mut config = SimulationConfig::default();
        config.productivity = 0.0;
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidProductivity(_))));

        let mut config = SimulationConfig::default();
        config.replications = 0;
        assert!(matches!(config.validate(), Err(ConfigValidationError::ZeroCount { .. })));
    }

    #[test]
    fn test_single_queue_flags_follow_combined_mode() {
        let mut routing = RoutingConfig::default();
        routing.coding_single_queue = true;
        assert!(routing.coding_single());
        routing.combined_stages = true;
        assert!(!routing.coding_single());
        routing.combined_single_queue = true;
        assert!(routing.coding_single());
        assert!(routing.classification_single());
    }

    #[test]
    fn test_bare_cli_keeps_defaults() {
        let config = SimulationConfig::from_cli_args(bare_args()).unwrap();
        assert_eq!(config.replications, defaults::REPLICATIONS);
        assert!(!config.routing.combined_stages);
    }

    #[test]
    fn test_replication_seeds() {
        let mut config = SimulationConfig::default();
        assert_eq!(config.replication_seed(3), None);
        config.seed = Some(10);
        assert_eq!(config.replication_seed(0), Some(10));
        assert_eq!(config.replication_seed(3), Some(13));
    }
}

//! Category tables
//!
//! Two tables describe the document mix: the number of attributes to code per
//! category, and the cumulative probability of each category. Classification
//! draws a percentage and takes the first category whose cumulative threshold
//! it does not exceed.
//!
//! Both tables are plain two-column CSV files (`category,value`), optionally
//! with a header row. The category column may be written as a float (`3.0`).

use crate::simulation::{SimulationError, SimulationResult};
use crate::types::{CategoryId, SimulationConfig};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Cumulative thresholds must cover every draw in `[0, 1)`
const COVERAGE_TOLERANCE: f64 = 1e-9;

/// Attribute counts and cumulative category probabilities
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCatalog {
    attributes: BTreeMap<CategoryId, u32>,
    /// Ascending by threshold
    thresholds: Vec<(f64, CategoryId)>,
}

impl CategoryCatalog {
    /// Build a catalog from in-memory tables
    pub fn from_pairs(
        attributes: impl IntoIterator<Item = (CategoryId, u32)>,
        cdf: impl IntoIterator<Item = (CategoryId, f64)>,
    ) -> SimulationResult<Self> {
        let attributes: BTreeMap<CategoryId, u32> = attributes.into_iter().collect();
        let mut thresholds: Vec<(f64, CategoryId)> =
            cdf.into_iter().map(|(category, threshold)| (threshold, category)).collect();

        if attributes.is_empty() {
            return Err(SimulationError::configuration_error("attribute table is empty"));
        }
        if let Some((threshold, category)) =
            thresholds.iter().find(|(t, _)| !t.is_finite() || *t < 0.0)
        {
            return Err(SimulationError::configuration_error(format!(
                "invalid cumulative probability {} for {}",
                threshold, category
            )));
        }
        thresholds.sort_by(|a, b| a.0.total_cmp(&b.0));
        match thresholds.last() {
            None => {
                return Err(SimulationError::configuration_error(
                    "cumulative probability table is empty",
                ))
            }
            Some((last, _)) if *last < 1.0 - COVERAGE_TOLERANCE => {
                return Err(SimulationError::configuration_error(format!(
                    "cumulative probabilities end at {} instead of 1",
                    last
                )))
            }
            Some(_) => {}
        }

        Ok(Self { attributes, thresholds })
    }

    /// Load both tables from CSV files
    pub fn from_csv_paths<P: AsRef<Path>, Q: AsRef<Path>>(
        attributes: P,
        cdf: Q,
    ) -> SimulationResult<Self> {
        let attribute_rows = read_pairs(attributes.as_ref())?;
        let cdf_rows = read_pairs(cdf.as_ref())?;

        let mut attribute_table = Vec::with_capacity(attribute_rows.len());
        for (category, count) in attribute_rows {
            if count < 0.0 || count.fract() != 0.0 {
                return Err(SimulationError::configuration_error(format!(
                    "attribute count {} for {} is not a whole number",
                    count, category
                )));
            }
            attribute_table.push((category, count as u32));
        }

        let catalog = Self::from_pairs(attribute_table, cdf_rows)?;
        info!(
            "Loaded {} categories from {} and {}",
            catalog.len(),
            attributes.as_ref().display(),
            cdf.as_ref().display()
        );
        Ok(catalog)
    }

    /// Tables named by the configuration, or the built-in catalog when neither is given
    pub fn from_config(config: &SimulationConfig) -> SimulationResult<Self> {
        match (&config.attributes_csv, &config.cdf_csv) {
            (Some(attributes), Some(cdf)) => Self::from_csv_paths(attributes, cdf),
            (None, None) => {
                debug!("Using the built-in category catalog");
                Ok(Self::default())
            }
            _ => Err(SimulationError::configuration_error(
                "attribute and cumulative probability tables must be given together",
            )),
        }
    }

    /// Category whose cumulative threshold first covers `percentage`
    pub fn classify(&self, percentage: f64) -> SimulationResult<CategoryId> {
        self.thresholds
            .iter()
            .find(|(threshold, _)| percentage <= *threshold)
            .map(|(_, category)| *category)
            .ok_or_else(|| {
                SimulationError::configuration_error(format!(
                    "percentage {} beyond the last cumulative threshold",
                    percentage
                ))
            })
    }

    /// Attributes to code for `category`
    pub fn attribute_count(&self, category: CategoryId) -> SimulationResult<u32> {
        self.attributes
            .get(&category)
            .copied()
            .ok_or(SimulationError::MissingCategoryError(category))
    }

    /// Categories with an attribute count, ascending
    pub fn categories(&self) -> impl Iterator<Item = CategoryId> + '_ {
        self.attributes.keys().copied()
    }

    /// Number of categories with an attribute count
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Whether the catalog has no categories
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        let attributes = [(1, 3), (2, 5), (3, 2), (4, 8), (5, 4), (6, 6)];
        let cdf = [(1, 0.25), (2, 0.45), (3, 0.6), (4, 0.75), (5, 0.9), (6, 1.0)];
        Self {
            attributes: attributes.iter().map(|&(c, n)| (CategoryId(c), n)).collect(),
            thresholds: cdf.iter().map(|&(c, t)| (t, CategoryId(c))).collect(),
        }
    }
}

fn read_pairs(path: &Path) -> SimulationResult<Vec<(CategoryId, f64)>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut rows = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        let key = get_f64_field(&record, 0);
        let value = get_f64_field(&record, 1);
        match (key, value) {
            (Some(key), Some(value)) if key >= 0.0 => {
                rows.push((CategoryId(key as u32), value));
            }
            _ => debug!("Skipping non-numeric row {} of {}", row_idx + 1, path.display()),
        }
    }
    Ok(rows)
}

fn get_f64_field(record: &csv::StringRecord, index: usize) -> Option<f64> {
    record.get(index).and_then(|s| s.parse::<f64>().ok())
}

//! Offline chart report over the employee dataset.
//!
//! Reads the CSV dataset once and renders three SVG charts: the age
//! distribution, absent hours per department and a correlation heatmap over
//! every numeric column.

pub mod charts;
pub mod dataset;
pub mod stats;

pub use dataset::Dataset;

use crate::config::ReportConfig;
use crate::error::{AppError, Result};
use crate::models::{ABSENT_HOURS, AGE};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

pub const DEPARTMENT: &str = "DepartmentName";

pub const AGE_DISTRIBUTION_FILE: &str = "age_distribution.svg";
pub const ABSENCE_BY_DEPARTMENT_FILE: &str = "absenthours_by_dept.svg";
pub const CORRELATION_HEATMAP_FILE: &str = "correlation_heatmap.svg";

const DEFAULT_HISTOGRAM_BINS: usize = 15;

/// Result of a report run
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub rows: usize,
    pub files: Vec<PathBuf>,
    pub duration_ms: u64,
}

/// Renders the chart report from a dataset into an output directory
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    dataset_path: PathBuf,
    output_dir: PathBuf,
    histogram_bins: usize,
}

impl ReportGenerator {
    pub fn new(dataset_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            dataset_path: dataset_path.into(),
            output_dir: output_dir.into(),
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(&config.dataset_path, &config.output_dir).with_histogram_bins(config.histogram_bins)
    }

    pub fn with_histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = bins.max(1);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Load the dataset and write all three charts
    pub fn generate(&self) -> Result<ReportSummary> {
        let start = Instant::now();
        info!(
            dataset = %self.dataset_path.display(),
            output_dir = %self.output_dir.display(),
            "Generating chart report"
        );

        let dataset = Dataset::from_path(&self.dataset_path)?;
        let summary = self.render(&dataset, start)?;

        info!(
            rows = summary.rows,
            files = summary.files.len(),
            duration_ms = summary.duration_ms,
            "Chart report complete"
        );
        Ok(summary)
    }

    /// Write all three charts for an already loaded dataset
    pub fn generate_from(&self, dataset: &Dataset) -> Result<ReportSummary> {
        self.render(dataset, Instant::now())
    }

    fn render(&self, dataset: &Dataset, start: Instant) -> Result<ReportSummary> {
        if dataset.is_empty() {
            return Err(AppError::Report("dataset has no rows".to_string()));
        }

        // Fail on missing columns before touching the output directory
        let ages: Vec<f64> = dataset
            .numeric_column(AGE)?
            .into_iter()
            .flatten()
            .filter(|v| v.is_finite())
            .collect();
        let departments = dataset.text_column(DEPARTMENT)?;
        let hours = dataset.numeric_column(ABSENT_HOURS)?;

        std::fs::create_dir_all(&self.output_dir)?;
        let mut files = Vec::with_capacity(3);

        let path = self.output_dir.join(AGE_DISTRIBUTION_FILE);
        charts::age_distribution(&ages, self.histogram_bins, &path)?;
        debug!(path = %path.display(), "Wrote age distribution");
        files.push(path);

        let groups = group_by_department(&departments, &hours);
        let path = self.output_dir.join(ABSENCE_BY_DEPARTMENT_FILE);
        charts::box_plot(&groups, ABSENT_HOURS, &path)?;
        debug!(path = %path.display(), departments = groups.len(), "Wrote department box plot");
        files.push(path);

        let names = dataset.numeric_columns();
        let columns = names
            .iter()
            .map(|name| dataset.numeric_column(name))
            .collect::<Result<Vec<_>>>()?;
        let matrix = stats::correlation_matrix(&columns);
        let path = self.output_dir.join(CORRELATION_HEATMAP_FILE);
        charts::correlation_heatmap(&names, &matrix, &path)?;
        debug!(path = %path.display(), columns = names.len(), "Wrote correlation heatmap");
        files.push(path);

        Ok(ReportSummary {
            rows: dataset.len(),
            files,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Group values by department in first-appearance order, skipping blanks
fn group_by_department(departments: &[&str], values: &[Option<f64>]) -> Vec<(String, Vec<f64>)> {
    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
    for (dept, value) in departments.iter().zip(values) {
        let Some(v) = value.filter(|v| v.is_finite()) else {
            continue;
        };
        match groups.iter_mut().find(|(name, _)| name.as_str() == *dept) {
            Some((_, bucket)) => bucket.push(v),
            None => groups.push((dept.to_string(), vec![v])),
        }
    }
    groups
}

use crate::error::AnalysisError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A named raw input series. Points may arrive unordered and may hold gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub name: String,
    pub points: Vec<(NaiveDate, Option<f64>)>,
}

impl TimeSeries {
    pub fn new(name: impl Into<String>, points: Vec<(NaiveDate, Option<f64>)>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    /// Builds a gap-free series from parallel date and value slices.
    pub fn from_values(name: impl Into<String>, dates: &[NaiveDate], values: &[f64]) -> Self {
        Self::new(
            name,
            dates.iter().copied().zip(values.iter().map(|v| Some(*v))).collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Outer join of several series: the union of their timestamps in strictly
/// increasing order, with gaps kept as `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    timestamps: Vec<NaiveDate>,
    names: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl Panel {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Restricts the panel to `names` and drops every row where any of them is
    /// missing. Fails when fewer than `min_len` rows survive.
    pub fn complete_rows(&self, names: &[&str], min_len: usize) -> Result<AlignedSeries, AnalysisError> {
        let selected = names
            .iter()
            .map(|name| {
                self.column(name).ok_or_else(|| {
                    AnalysisError::InvalidInput(name.to_string(), "series not present in panel".to_string())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut timestamps = Vec::new();
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); selected.len()];
        for (row, ts) in self.timestamps.iter().enumerate() {
            let values: Option<Vec<f64>> = selected.iter().map(|col| col[row]).collect();
            if let Some(values) = values {
                timestamps.push(*ts);
                for (column, value) in columns.iter_mut().zip(values) {
                    column.push(value);
                }
            }
        }

        if timestamps.len() < min_len {
            return Err(AnalysisError::insufficient(
                format!("aligned series [{}]", names.join(", ")),
                min_len,
                timestamps.len(),
            ));
        }

        Ok(AlignedSeries {
            timestamps,
            names: names.iter().map(|n| n.to_string()).collect(),
            columns,
        })
    }
}

/// Inner join of named series with no missing values in any column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedSeries {
    timestamps: Vec<NaiveDate>,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl AlignedSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Looks up a column that the caller requires to exist.
    pub fn require(&self, name: &str) -> Result<&[f64], AnalysisError> {
        self.column(name).ok_or_else(|| {
            AnalysisError::InvalidInput(name.to_string(), "series not present in aligned set".to_string())
        })
    }
}

/// Joins named series on their shared timestamp key.
#[derive(Debug, Clone, Copy)]
pub struct SeriesAligner {
    min_len: usize,
}

impl SeriesAligner {
    pub fn new(min_len: usize) -> Self {
        Self { min_len }
    }

    /// Outer-joins the requested series. Non-finite values become gaps; no
    /// requested names gives an empty panel.
    pub fn join(&self, series: &[TimeSeries], names: &[&str]) -> Result<Panel, AnalysisError> {
        let mut rows: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
        for (col, name) in names.iter().enumerate() {
            let source = series.iter().find(|s| s.name == *name).ok_or_else(|| {
                AnalysisError::InvalidInput(name.to_string(), "no input series with this name".to_string())
            })?;

            let mut seen = HashSet::with_capacity(source.points.len());
            for (ts, value) in &source.points {
                if !seen.insert(*ts) {
                    return Err(AnalysisError::InvalidInput(
                        name.to_string(),
                        format!("duplicate timestamp {ts}"),
                    ));
                }
                let row = rows.entry(*ts).or_insert_with(|| vec![None; names.len()]);
                row[col] = value.filter(|v| v.is_finite());
            }
        }

        let mut timestamps = Vec::with_capacity(rows.len());
        let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(rows.len()); names.len()];
        for (ts, values) in rows {
            timestamps.push(ts);
            for (column, value) in columns.iter_mut().zip(values) {
                column.push(value);
            }
        }

        tracing::debug!(series = ?names, rows = timestamps.len(), "Joined series into panel");
        Ok(Panel {
            timestamps,
            names: names.iter().map(|n| n.to_string()).collect(),
            columns,
        })
    }

    /// Inner-joins the requested series, dropping any row with a gap, and
    /// enforces the aligner's minimum length.
    pub fn align(&self, series: &[TimeSeries], names: &[&str]) -> Result<AlignedSeries, AnalysisError> {
        if names.len() < 2 {
            return Err(AnalysisError::InvalidInput(
                "align".to_string(),
                "at least two series are required".to_string(),
            ));
        }
        self.join(series, names)?.complete_rows(names, self.min_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(month: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, month, 1).unwrap()
    }

    fn inputs() -> Vec<TimeSeries> {
        vec![
            TimeSeries::new(
                "spread",
                vec![(date(3), Some(3.0)), (date(1), Some(1.0)), (date(2), None), (date(4), Some(f64::NAN))],
            ),
            TimeSeries::new(
                "returns",
                vec![(date(1), Some(0.1)), (date(2), Some(0.2)), (date(3), Some(0.3)), (date(5), Some(0.5))],
            ),
        ]
    }

    #[test]
    fn join_keeps_union_in_order() {
        let panel = SeriesAligner::new(1).join(&inputs(), &["spread", "returns"]).unwrap();
        assert_eq!(panel.timestamps(), &[date(1), date(2), date(3), date(4), date(5)]);
        assert_eq!(panel.column("spread").unwrap(), &[Some(1.0), None, Some(3.0), None, None]);
        assert_eq!(panel.column("returns").unwrap(), &[Some(0.1), Some(0.2), Some(0.3), None, Some(0.5)]);
    }

    #[test]
    fn align_drops_rows_with_gaps() {
        let aligned = SeriesAligner::new(2).align(&inputs(), &["spread", "returns"]).unwrap();
        assert_eq!(aligned.timestamps(), &[date(1), date(3)]);
        assert_eq!(aligned.column("spread").unwrap(), &[1.0, 3.0]);
        assert_eq!(aligned.column("returns").unwrap(), &[0.1, 0.3]);
    }

    #[test]
    fn align_enforces_minimum_length() {
        let err = SeriesAligner::new(3).align(&inputs(), &["spread", "returns"]).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { required: 3, actual: 2, .. }));
    }

    #[test]
    fn duplicate_timestamps_are_rejected() {
        let series = vec![
            TimeSeries::new("a", vec![(date(1), Some(1.0)), (date(1), Some(2.0))]),
            TimeSeries::new("b", vec![(date(1), Some(1.0))]),
        ];
        let err = SeriesAligner::new(1).align(&series, &["a", "b"]).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(..)));
    }

    #[test]
    fn empty_request_gives_empty_panel() {
        let panel = SeriesAligner::new(1).join(&inputs(), &[]).unwrap();
        assert!(panel.is_empty());
        assert_eq!(panel.column("spread"), None);
    }

    #[test]
    fn unknown_series_is_rejected() {
        let err = SeriesAligner::new(1).align(&inputs(), &["spread", "vix"]).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(ref name, _) if name == "vix"));
    }
}

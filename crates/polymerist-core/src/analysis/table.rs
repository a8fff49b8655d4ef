use super::AnalysisError;
use indexmap::IndexMap;
use regex::Regex;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

/// Ordered, labelled numeric columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: IndexMap<String, Vec<f64>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a column, replacing any existing column with the same label in place.
    pub fn insert_column(
        &mut self,
        label: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), AnalysisError> {
        let label = label.into();
        let expected = self
            .columns
            .iter()
            .find(|(existing, _)| **existing != label)
            .map(|(_, column)| column.len());
        if let Some(expected) = expected {
            if values.len() != expected {
                return Err(AnalysisError::ColumnLength {
                    label,
                    expected,
                    found: values.len(),
                });
            }
        }
        self.columns.insert(label, values);
        Ok(())
    }

    pub fn column(&self, label: &str) -> Option<&[f64]> {
        self.columns.get(label).map(Vec::as_slice)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns
            .iter()
            .map(|(label, values)| (label.as_str(), values.as_slice()))
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn n_rows(&self) -> usize {
        self.columns.values().next().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Columns whose label matches `pattern` anywhere.
    pub fn filter_regex(&self, pattern: &Regex) -> Table {
        self.select(|label| pattern.is_match(label))
    }

    pub fn select(&self, mut keep: impl FnMut(&str) -> bool) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .filter(|(label, _)| keep(label))
                .map(|(label, values)| (label.clone(), values.clone()))
                .collect(),
        }
    }

    /// Splits into x data (every column matching `pattern`) and y data (every
    /// column except the first match).
    pub fn split_by_regex(&self, pattern: &Regex) -> Result<(Table, Table), AnalysisError> {
        let x_data = self.filter_regex(pattern);
        let x_label = x_data
            .labels()
            .next()
            .ok_or_else(|| AnalysisError::NoMatchingColumn(pattern.as_str().to_string()))?
            .to_string();
        let y_data = self.select(|label| label != x_label);
        Ok((x_data, y_data))
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), AnalysisError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(self.columns.keys())?;
        for row in 0..self.n_rows() {
            csv_writer.write_record(self.columns.values().map(|column| column[row].to_string()))?;
        }
        csv_writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    pub fn write_csv_path(&self, path: &Path) -> Result<(), AnalysisError> {
        let file = File::create(path).map_err(|source| AnalysisError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.write_csv(BufWriter::new(file))
    }

    pub fn to_csv_string(&self) -> Result<String, AnalysisError> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    pub fn read_csv<R: Read>(reader: R) -> Result<Table, AnalysisError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let labels: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); labels.len()];
        for (row, record) in csv_reader.records().enumerate() {
            let record = record?;
            for ((label, column), field) in labels.iter().zip(columns.iter_mut()).zip(record.iter()) {
                let value = field.trim().parse::<f64>().map_err(|_| AnalysisError::InvalidCell {
                    label: label.clone(),
                    row,
                    value: field.to_string(),
                })?;
                column.push(value);
            }
        }
        Ok(Table {
            columns: labels.into_iter().zip(columns).collect(),
        })
    }
}

fn split_with(table: &Table, pattern: &str) -> Result<(Table, Table), AnalysisError> {
    let regex = Regex::new(pattern)?;
    table.split_by_regex(&regex)
}

/// Radii as x data, one `g(r)` column per pair group as y data.
pub fn rdfs_to_plot_data(table: &Table) -> Result<(Table, Table), AnalysisError> {
    split_with(table, "Radius")
}

/// Sample times as x data, property series as y data.
pub fn props_to_plot_data(table: &Table) -> Result<(Table, Table), AnalysisError> {
    split_with(table, "Time")
}

/// Like [`props_to_plot_data`], but only a column starting with `Time (` counts
/// as x data, so `Elapsed Time` and `Time Remaining` stay on the y side.
pub fn states_to_plot_data(table: &Table) -> Result<(Table, Table), AnalysisError> {
    split_with(table, r"\ATime \(")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn props() -> Table {
        let mut table = Table::new();
        table.insert_column("Sample Time (ns)", vec![0.0, 1.0]).unwrap();
        table.insert_column("Radius of Gyration (Rg, nm)", vec![1.2, 1.3]).unwrap();
        table
    }

    #[test]
    fn columns_must_share_a_length() {
        let mut table = props();
        let err = table.insert_column("Extra", vec![1.0]).unwrap_err();
        assert!(matches!(err, AnalysisError::ColumnLength { expected: 2, found: 1, .. }));

        table.insert_column("Sample Time (ns)", vec![5.0, 6.0]).unwrap();
        assert_eq!(table.labels().next(), Some("Sample Time (ns)"));
        assert_eq!(table.column("Sample Time (ns)"), Some(&[5.0, 6.0][..]));
    }

    #[test]
    fn replacing_the_only_column_may_change_its_length() {
        let mut table = Table::new();
        table.insert_column("Radius (nm)", vec![0.1, 0.2]).unwrap();
        table.insert_column("Radius (nm)", vec![0.1, 0.2, 0.3]).unwrap();
        assert_eq!(table.n_rows(), 3);
    }

    #[test]
    fn splitters_pick_the_first_matching_column_as_x() {
        let (x, y) = props_to_plot_data(&props()).unwrap();
        assert_eq!(x.labels().collect::<Vec<_>>(), ["Sample Time (ns)"]);
        assert_eq!(y.labels().collect::<Vec<_>>(), ["Radius of Gyration (Rg, nm)"]);

        let mut energies = Table::new();
        energies.insert_column("Sample Time (ns)", vec![0.0]).unwrap();
        energies.insert_column("Potential Energy (kJ/mol)", vec![-12.5]).unwrap();
        assert!(matches!(
            rdfs_to_plot_data(&energies),
            Err(AnalysisError::NoMatchingColumn(_))
        ));

        // Any label containing "Radius" qualifies as the x column.
        let (x, _) = rdfs_to_plot_data(&props()).unwrap();
        assert_eq!(x.labels().collect::<Vec<_>>(), ["Radius of Gyration (Rg, nm)"]);
    }

    #[test]
    fn state_splitter_ignores_other_time_columns() {
        let mut states = Table::new();
        states.insert_column("Elapsed Time (s)", vec![1.0]).unwrap();
        states.insert_column("Time (ps)", vec![2.0]).unwrap();
        states.insert_column("Time Remaining", vec![3.0]).unwrap();

        let (x, y) = states_to_plot_data(&states).unwrap();
        assert_eq!(x.labels().collect::<Vec<_>>(), ["Time (ps)"]);
        assert_eq!(
            y.labels().collect::<Vec<_>>(),
            ["Elapsed Time (s)", "Time Remaining"]
        );
    }

    #[test]
    fn csv_output_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("props.csv");
        props().write_csv_path(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Sample Time (ns),\"Radius of Gyration (Rg, nm)\"\n"));

        let table = Table::read_csv(File::open(&path).unwrap()).unwrap();
        assert_eq!(table, props());
    }
}

use crate::error::ExportError;
use crate::flatten::FlatRecord;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Column names, in output order.
pub const HEADERS: [&str; 5] = [
    "Asteroid ID",
    "Asteroid name",
    "The Minimal estimated diameter in Kilometre",
    "Absolute_magnitude",
    "Relative_velocity(km/s)",
];

/// Rows shown in previews.
pub const PREVIEW_ROWS: usize = 5;

/// One exported row with its numeric columns already coerced.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub id: Option<String>,
    pub name: Option<String>,
    pub min_diameter_km: Option<f64>,
    pub absolute_magnitude: Option<f64>,
    pub velocity_km_s: Option<f64>,
}

impl TableRow {
    fn from_record(record: &FlatRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            min_diameter_km: record.min_diameter_km.as_ref().and_then(|s| s.to_number()),
            absolute_magnitude: record.absolute_magnitude.as_ref().and_then(|s| s.to_number()),
            velocity_km_s: record.velocity_km_s.filter(|v| !v.is_nan()),
        }
    }

    /// CSV cells. An empty cell is the "no value" marker.
    pub fn cells(&self) -> [String; 5] {
        [
            self.id.clone().unwrap_or_default(),
            self.name.clone().unwrap_or_default(),
            fmt_number(self.min_diameter_km),
            fmt_number(self.absolute_magnitude),
            fmt_number(self.velocity_km_s),
        ]
    }

    fn presence(&self) -> [bool; 5] {
        [
            self.id.is_some(),
            self.name.is_some(),
            self.min_diameter_km.is_some(),
            self.absolute_magnitude.is_some(),
            self.velocity_km_s.is_some(),
        ]
    }
}

/// Row count, non-null count per column, and the first few rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSummary {
    pub rows: usize,
    pub non_null: [usize; 5],
    pub preview: Vec<[String; 5]>,
}

/// The flattened feed with a fixed five-column schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultTable {
    rows: Vec<TableRow>,
}

impl ResultTable {
    /// Project and coerce. Values that are not numbers become "no value";
    /// coercion never fails.
    pub fn from_records(records: &[FlatRecord]) -> Self {
        Self { rows: records.iter().map(TableRow::from_record).collect() }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn summary(&self) -> TableSummary {
        let mut non_null = [0usize; 5];
        for row in &self.rows {
            for (count, present) in non_null.iter_mut().zip(row.presence()) {
                *count += present as usize;
            }
        }
        TableSummary {
            rows: self.rows.len(),
            non_null,
            preview: self.rows.iter().take(PREVIEW_ROWS).map(TableRow::cells).collect(),
        }
    }

    /// Header row, then one row per record. No index column.
    pub fn write_csv<W: Write>(&self, out: W) -> Result<(), ExportError> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(HEADERS)?;
        for row in &self.rows {
            writer.write_record(row.cells())?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the table to `dest`, replacing any previous file.
    pub fn write_to_path(&self, dest: &Path) -> Result<(), ExportError> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = fs::File::create(dest)?;
        self.write_csv(std::io::BufWriter::new(file))
    }
}

/// Build the table from `records` and write it to `dest`.
pub fn export(records: &[FlatRecord], dest: &Path) -> Result<ResultTable, ExportError> {
    let table = ResultTable::from_records(records);
    table.write_to_path(dest)?;
    log::debug!("wrote {} rows to {}", table.len(), dest.display());
    Ok(table)
}

/// Shortest round-trip form, integral values keep a trailing `.0`.
fn fmt_number(value: Option<f64>) -> String {
    match value {
        Some(n) => format!("{:?}", n),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::Scalar;

    fn eros() -> FlatRecord {
        FlatRecord {
            id: Some("2000433".into()),
            name: Some("Eros".into()),
            min_diameter_km: Some(Scalar::from(0.2)),
            absolute_magnitude: Some(Scalar::from(10.4)),
            velocity_km_s: Some(5.2),
        }
    }

    fn csv_lines(table: &ResultTable) -> Vec<String> {
        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        String::from_utf8(out).unwrap().lines().map(str::to_string).collect()
    }

    #[test]
    fn test_columns_keep_fixed_order() {
        let lines = csv_lines(&ResultTable::from_records(&[eros()]));
        assert_eq!(
            lines[0],
            "Asteroid ID,Asteroid name,The Minimal estimated diameter in Kilometre,Absolute_magnitude,Relative_velocity(km/s)"
        );
        assert_eq!(lines[1], "2000433,Eros,0.2,10.4,5.2");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_non_numeric_magnitude_becomes_empty_cell() {
        let mut bad = eros();
        bad.id = Some("3".into());
        bad.absolute_magnitude = Some(Scalar::from("bright"));
        bad.min_diameter_km = Some(Scalar::from("0.75"));

        let table = ResultTable::from_records(&[bad, eros()]);
        let lines = csv_lines(&table);
        assert_eq!(lines[1], "3,Eros,0.75,,5.2");
        assert_eq!(lines[2], "2000433,Eros,0.2,10.4,5.2");
        assert_eq!(table.summary().non_null, [2, 2, 2, 1, 2]);
    }

    #[test]
    fn test_empty_input_writes_header_only() {
        let lines = csv_lines(&ResultTable::from_records(&[]));
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Asteroid ID,"));
    }

    #[test]
    fn test_names_with_commas_are_quoted() {
        let mut record = eros();
        record.name = Some("Eros, the lover".into());
        record.velocity_km_s = None;
        record.min_diameter_km = Some(Scalar::from(5.0));
        let lines = csv_lines(&ResultTable::from_records(&[record]));
        assert_eq!(lines[1], "2000433,\"Eros, the lover\",5.0,10.4,");
    }

    #[test]
    fn test_summary_counts_non_null_cells() {
        let mut partial = eros();
        partial.velocity_km_s = None;
        partial.absolute_magnitude = Some(Scalar::from("n/a"));
        let summary = ResultTable::from_records(&[eros(), partial]).summary();
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.non_null, [2, 2, 2, 1, 1]);
        assert_eq!(summary.preview.len(), 2);
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out").join("nasa_asteroids_data.csv");
        let table = export(&[eros()], &dest).unwrap();
        assert_eq!(table.len(), 1);
        let written = std::fs::read_to_string(&dest).unwrap();
        assert!(written.ends_with("2000433,Eros,0.2,10.4,5.2\n"));
    }
}

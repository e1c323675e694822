use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use log::info;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path};

use crate::error::{BalanceError, Result};
use wmb_utils::dates::parse_date_flexible;

/// Column holding the surface area (m²).
pub const AREA: &str = "area";
/// Column holding the rainfall depth (mm).
pub const RAIN: &str = "rain";
/// Column holding the pan evaporation depth (mm).
pub const EVAPORATION: &str = "evaporation";
/// Column holding the stored volume (m³).
pub const VOLUME: &str = "volume";
/// Column holding the air temperature (°C).
pub const TEMPERATURE: &str = "temperature";
/// Column holding the relative humidity, as a percentage on input.
pub const RELATIVE_HUMIDITY: &str = "rh";

/// Required numeric columns, in output order.
pub const REQUIRED_COLUMNS: [&str; 6] =
    [AREA, RAIN, EVAPORATION, VOLUME, TEMPERATURE, RELATIVE_HUMIDITY];

/// Suffix marking a column of laboratory measurements for a tracer.
pub const SAMPLE_SUFFIX: &str = "_sample";

/// One day of hydrological observations for a water body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub date: NaiveDate,
    /// Surface area in m²
    pub area: f64,
    /// Rainfall depth in mm
    pub rain: f64,
    /// Pan evaporation depth in mm
    pub evaporation: f64,
    /// Stored volume in m³
    pub volume: f64,
    /// Air temperature in °C
    pub temperature: f64,
    /// Relative humidity as a fraction in [0, 1]
    pub relative_humidity: f64,
}

/// Externally supplied laboratory measurements for one tracer.
///
/// `values` is aligned with the observation records; days without a
/// sample are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleColumn {
    /// Tracer name, without the `_sample` suffix.
    pub tracer: String,
    pub values: Vec<Option<f64>>,
}

impl SampleColumn {
    /// Column name as it appears in tables: `<tracer>_sample`.
    pub fn column_name(&self) -> String {
        format!("{}{}", self.tracer, SAMPLE_SUFFIX)
    }
}

/// Rectangular observation table as read from disk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationTable {
    pub records: Vec<ObservationRecord>,
    pub samples: Vec<SampleColumn>,
}

impl ObservationTable {
    pub fn new(records: Vec<ObservationRecord>) -> Self {
        ObservationTable {
            records,
            samples: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sample column for `tracer`, if the table carries one.
    pub fn sample(&self, tracer: &str) -> Option<&SampleColumn> {
        self.samples.iter().find(|s| s.tracer == tracer)
    }

    /// Read an observation table from a CSV file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let body = std::fs::read_to_string(path.as_ref())?;
        let table = Self::parse_csv(&body)?;
        info!(
            "Loaded {} observations from {}",
            table.len(),
            path.as_ref().display()
        );
        Ok(table)
    }

    /// Parse an observation table from a CSV string.
    ///
    /// The first column is the date index. Header names are matched
    /// case-insensitively; the columns in [`REQUIRED_COLUMNS`] must all be
    /// present, and any `<tracer>_sample` columns are kept. Relative
    /// humidity is read as a percentage and normalised to a fraction.
    ///
    /// # Example CSV
    /// ```text
    /// date,area,rain,evaporation,volume,temperature,rh,d18O_sample
    /// 2021-03-01,1000,10,0,100,21.5,65,
    /// 2021-03-02,1000,0,5,95,23.0,58,-1.2
    /// ```
    pub fn parse_csv(csv_data: &str) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_data.as_bytes());
        let headers = rdr.headers()?.clone();
        let layout = ColumnLayout::from_headers(&headers)?;

        let mut records = Vec::new();
        let mut samples: Vec<SampleColumn> = layout
            .samples
            .iter()
            .map(|(tracer, _)| SampleColumn {
                tracer: tracer.clone(),
                values: Vec::new(),
            })
            .collect();

        for (idx, row) in rdr.records().enumerate() {
            let row = row?;
            // header is line 1
            let line = idx + 2;
            records.push(layout.parse_record(&row, line)?);
            for (column, (_, position)) in samples.iter_mut().zip(layout.samples.iter()) {
                let cell = row.get(*position).unwrap_or("");
                let value = parse_optional(cell, line, &column.column_name())?;
                column.values.push(value);
            }
        }

        Ok(ObservationTable { records, samples })
    }
}

/// Positions of the known columns within a header row.
struct ColumnLayout {
    required: [usize; 6],
    samples: Vec<(String, usize)>,
}

impl ColumnLayout {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        if headers.is_empty() {
            return Err(BalanceError::schema("date"));
        }
        let positions: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();

        let mut required = [0usize; 6];
        for (slot, name) in required.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = *positions
                .get(name)
                .ok_or_else(|| BalanceError::schema(name))?;
        }

        let mut samples: Vec<(String, usize)> = headers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| {
                let header = h.trim();
                let stem = header
                    .len()
                    .checked_sub(SAMPLE_SUFFIX.len())
                    .filter(|&at| header.is_char_boundary(at))?;
                let (tracer, suffix) = header.split_at(stem);
                (!tracer.is_empty() && suffix.eq_ignore_ascii_case(SAMPLE_SUFFIX))
                    .then(|| (tracer.to_string(), i))
            })
            .collect();
        samples.sort_by_key(|(_, i)| *i);

        Ok(ColumnLayout { required, samples })
    }

    fn parse_record(&self, row: &StringRecord, line: usize) -> Result<ObservationRecord> {
        let date_cell = row.get(0).unwrap_or("");
        let date = parse_date_flexible(date_cell).map_err(|_| BalanceError::Parse {
            row: line,
            column: "date".to_string(),
            value: date_cell.to_string(),
        })?;

        let mut values = [0f64; 6];
        for ((value, position), name) in values
            .iter_mut()
            .zip(self.required.iter())
            .zip(REQUIRED_COLUMNS)
        {
            let cell = row.get(*position).unwrap_or("");
            *value = parse_optional(cell, line, name)?.ok_or_else(|| BalanceError::Parse {
                row: line,
                column: name.to_string(),
                value: cell.to_string(),
            })?;
        }
        let [area, rain, evaporation, volume, temperature, rh_percent] = values;

        Ok(ObservationRecord {
            date,
            area,
            rain,
            evaporation,
            volume,
            temperature,
            relative_humidity: rh_percent / 100.0,
        })
    }
}

/// Parse a numeric cell; an empty cell is `None`.
fn parse_optional(cell: &str, line: usize, column: &str) -> Result<Option<f64>> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| BalanceError::Parse {
            row: line,
            column: column.to_string(),
            value: trimmed.to_string(),
        })
}

#[cfg(test)]
mod test {
    use super::ObservationTable;
    use crate::error::BalanceError;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    const STR_RESULT: &str = r#"date,area,rain,evaporation,volume,temperature,rh,d18O_sample,Cl_sample
2021-03-01,1000,10,0,100,21.5,65,,120
2021-03-02,1000,0,5,95,23.0,58,-1.2,
2021-03-03,1000,0,5,90,24.5,50,-0.8,131.5
"#;

    #[test]
    fn test_parse_csv() {
        let table = ObservationTable::parse_csv(STR_RESULT).unwrap();
        assert_eq!(table.len(), 3);
        let first = &table.records[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2021, 3, 1).unwrap());
        assert_eq!(first.area, 1000.0);
        assert_eq!(first.rain, 10.0);
        assert_eq!(first.volume, 100.0);
        assert_relative_eq!(first.relative_humidity, 0.65);
    }

    #[test]
    fn test_sample_columns() {
        let table = ObservationTable::parse_csv(STR_RESULT).unwrap();
        assert_eq!(table.samples.len(), 2);
        let d18o = table.sample("d18O").unwrap();
        assert_eq!(d18o.column_name(), "d18O_sample");
        assert_eq!(d18o.values, vec![None, Some(-1.2), Some(-0.8)]);
        let cl = table.sample("Cl").unwrap();
        assert_eq!(cl.values, vec![Some(120.0), None, Some(131.5)]);
        assert!(table.sample("d2H").is_none());
    }

    #[test]
    fn test_sample_suffix_is_case_insensitive() {
        let csv = "date,area,rain,evaporation,volume,temperature,rh,d18O_SAMPLE,Cl_Sample,_sample\n\
                   2021-03-01,1000,10,0,100,21.5,65,-1.5,120,9\n";
        let table = ObservationTable::parse_csv(csv).unwrap();
        assert_eq!(table.samples.len(), 2);
        assert_eq!(table.sample("d18O").unwrap().values, vec![Some(-1.5)]);
        assert_eq!(table.sample("Cl").unwrap().values, vec![Some(120.0)]);
        assert!(table.sample("d18o").is_none());
    }

    #[test]
    fn test_headers_are_case_insensitive_and_reorderable() {
        let csv = "Date,RH,Volume,Area,Rain,Evaporation,Temperature\n20210301,50,100,1000,1,2,20\n";
        let table = ObservationTable::parse_csv(csv).unwrap();
        let record = &table.records[0];
        assert_eq!(record.volume, 100.0);
        assert_eq!(record.evaporation, 2.0);
        assert_relative_eq!(record.relative_humidity, 0.5);
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let csv = "date,area,rain,evaporation,volume,temperature\n2021-03-01,1,1,1,1,1\n";
        match ObservationTable::parse_csv(csv) {
            Err(BalanceError::Schema { column }) => assert_eq!(column, "rh"),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_cell_reports_row_and_column() {
        let csv = "date,area,rain,evaporation,volume,temperature,rh\n2021-03-01,1,1,1,1,1,50\n2021-03-02,1,x,1,1,1,50\n";
        match ObservationTable::parse_csv(csv) {
            Err(BalanceError::Parse { row, column, value }) => {
                assert_eq!(row, 3);
                assert_eq!(column, "rain");
                assert_eq!(value, "x");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_required_cell_is_parse_error() {
        let csv = "date,area,rain,evaporation,volume,temperature,rh\n2021-03-01,1,1,1,,1,50\n";
        assert!(matches!(
            ObservationTable::parse_csv(csv),
            Err(BalanceError::Parse { .. })
        ));
    }
}

//! Lazy CSV decoding of one table.

use std::io::Read;

use tracing::warn;

use super::{FieldValue, Row, TableSchema};
use crate::error::LoadError;

/// Iterator over the typed rows of one table.
///
/// The header is checked when the reader is created; each data row is decoded
/// as it is pulled. The first error ends the table as far as the loader is
/// concerned, since any error fails the whole load.
pub struct TableReader<R: Read> {
    schema: &'static TableSchema,
    records: csv::StringRecordsIntoIter<R>,
    /// Schema position of each file column, `None` for ignored columns.
    columns: Vec<Option<usize>>,
    row: usize,
}

impl<R: Read> TableReader<R> {
    /// Read and check the header of a table.
    ///
    /// Fails with `MissingColumn` when a required field has no column and
    /// with `UnknownField` for an undeclared column unless
    /// `allow_unknown_field` is set.
    pub fn new(
        schema: &'static TableSchema,
        input: R,
        allow_unknown_field: bool,
    ) -> Result<Self, LoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(input);
        let headers = reader
            .headers()
            .map_err(|source| LoadError::Csv {
                table: schema.file,
                source,
            })?
            .clone();

        let mut columns = Vec::with_capacity(headers.len());
        let mut seen = vec![false; schema.fields.len()];
        let mut ignored = Vec::new();
        for (i, raw) in headers.iter().enumerate() {
            let name = if i == 0 {
                raw.trim_start_matches('\u{feff}').trim()
            } else {
                raw.trim()
            };
            match schema.fields.iter().position(|f| f.matches(name)) {
                Some(pos) if seen[pos] => {
                    return Err(LoadError::malformed(
                        schema.file,
                        0,
                        name,
                        "column appears twice in header",
                    ));
                }
                Some(pos) => {
                    seen[pos] = true;
                    columns.push(Some(pos));
                }
                None if allow_unknown_field => {
                    ignored.push(name.to_string());
                    columns.push(None);
                }
                None => {
                    return Err(LoadError::UnknownField {
                        table: schema.file,
                        field: name.to_string(),
                    });
                }
            }
        }

        if let Some(missing) = schema
            .fields
            .iter()
            .zip(&seen)
            .find(|(spec, seen)| spec.required && !**seen)
        {
            return Err(LoadError::MissingColumn {
                table: schema.file,
                field: missing.0.name,
            });
        }
        if !ignored.is_empty() {
            warn!(
                table = schema.file,
                columns = %ignored.join(","),
                "ignoring unknown columns"
            );
        }

        Ok(Self {
            schema,
            records: reader.into_records(),
            columns,
            row: 0,
        })
    }

    pub fn schema(&self) -> &'static TableSchema {
        self.schema
    }

    fn decode(&self, record: &csv::StringRecord) -> Result<Row, LoadError> {
        let file = self.schema.file;
        if record.len() != self.columns.len() {
            return Err(LoadError::malformed(
                file,
                self.row,
                "*",
                format!(
                    "expected {} columns, found {}",
                    self.columns.len(),
                    record.len()
                ),
            ));
        }

        let mut values: Vec<Option<FieldValue>> = vec![None; self.schema.fields.len()];
        for (cell, column) in record.iter().zip(&self.columns) {
            let Some(pos) = *column else { continue };
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            let spec = &self.schema.fields[pos];
            let value = FieldValue::parse(spec.ty, cell)
                .map_err(|reason| LoadError::malformed(file, self.row, spec.name, reason))?;
            values[pos] = Some(value);
        }
        if let Some((spec, _)) = self
            .schema
            .fields
            .iter()
            .zip(&values)
            .find(|(spec, value)| spec.required && value.is_none())
        {
            return Err(LoadError::malformed(
                file,
                self.row,
                spec.name,
                "required value is empty",
            ));
        }

        Ok(Row::new(self.schema, self.row, values))
    }
}

impl<R: Read> Iterator for TableReader<R> {
    type Item = Result<Row, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        self.row += 1;
        Some(match record {
            Ok(record) => self.decode(&record),
            Err(source) => Err(LoadError::Csv {
                table: self.schema.file,
                source,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::schema::{CALENDAR_DATES, STOP_TIMES, STOPS};

    fn read(
        schema: &'static TableSchema,
        text: &str,
        allow_unknown_field: bool,
    ) -> Result<Vec<Row>, LoadError> {
        TableReader::new(schema, text.as_bytes(), allow_unknown_field)?.collect()
    }

    #[test]
    fn reads_rows_in_order() {
        let rows = read(
            &CALENDAR_DATES,
            "service_id,date,exception_type\nWD,20260103,2\nSA,20260116,1\n",
            false,
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].index(), 1);
        assert_eq!(rows[1].text("service_id").unwrap(), "SA");
        assert_eq!(rows[1].integer("exception_type").unwrap(), 1);
    }

    #[test]
    fn columns_may_come_in_any_order() {
        let rows = read(
            &CALENDAR_DATES,
            "exception_type,service_id,date\n1,WD,20260116\n",
            false,
        )
        .unwrap();
        assert_eq!(rows[0].text("service_id").unwrap(), "WD");
        let names: Vec<_> = rows[0].iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["service_id", "date", "exception_type"]);
    }

    #[test]
    fn trims_header_bom_and_cells() {
        let rows = read(
            &CALENDAR_DATES,
            "\u{feff}service_id , date,exception_type\n WD ,20260103, 2\n",
            false,
        )
        .unwrap();
        assert_eq!(rows[0].text("service_id").unwrap(), "WD");
        assert_eq!(rows[0].integer("exception_type").unwrap(), 2);
    }

    #[test]
    fn empty_cells_are_null() {
        let rows = read(
            &STOPS,
            "stop_id,stop_name,stop_lat,stop_lon,stop_code\nS1,Bray,53.2,-6.1,\n",
            false,
        )
        .unwrap();
        assert_eq!(rows[0].get("stop_code"), None);
        assert_eq!(rows[0].opt_text("stop_code").unwrap(), None);
    }

    #[test]
    fn missing_required_column() {
        let err = read(&CALENDAR_DATES, "service_id,date\nWD,20260103\n", false)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            LoadError::MissingColumn {
                table: "calendar_dates.txt",
                field: "exception_type"
            }
        ));
    }

    #[test]
    fn unknown_column_rejected_unless_allowed() {
        let text = "service_id,date,exception_type,note\nWD,20260103,2,x\n";
        let err = read(&CALENDAR_DATES, text, false).err().unwrap();
        assert!(matches!(err, LoadError::UnknownField { ref field, .. } if field == "note"));

        let rows = read(&CALENDAR_DATES, text, true).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("note"), None);
    }

    #[test]
    fn wrong_column_count_is_malformed() {
        let err = read(
            &CALENDAR_DATES,
            "service_id,date,exception_type\nWD,20260103,2\nWD,20260104\n",
            false,
        )
        .err()
        .unwrap();
        match err {
            LoadError::MalformedRow { table, row, .. } => {
                assert_eq!(table, "calendar_dates.txt");
                assert_eq!(row, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unparsable_value_names_field_and_row() {
        let err = read(
            &CALENDAR_DATES,
            "service_id,date,exception_type\nWD,20260103,2\nWD,2026-01-04,1\n",
            false,
        )
        .err()
        .unwrap();
        assert_eq!(
            err.to_string(),
            "malformed row calendar_dates.txt:2 field date: expected YYYYMMDD"
        );
    }

    #[test]
    fn legacy_dropoff_column() {
        let rows = read(
            &STOP_TIMES,
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence,dropoff_type\n\
             T1,08:00:00,08:01:00,S1,1,1\n",
            false,
        )
        .unwrap();
        assert_eq!(rows[0].opt_integer("drop_off_type").unwrap(), Some(1));
    }

    #[test]
    fn duplicate_header_column() {
        let err = read(
            &STOP_TIMES,
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence,drop_off_type,dropoff_type\n",
            false,
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("column appears twice"));
    }

    #[test]
    fn empty_required_cell_is_malformed() {
        let err = read(
            &CALENDAR_DATES,
            "service_id,date,exception_type\n,20260103,2\n",
            false,
        )
        .err()
        .unwrap();
        assert_eq!(
            err.to_string(),
            "malformed row calendar_dates.txt:1 field service_id: required value is empty"
        );
    }

    #[test]
    fn header_only_table_is_empty() {
        let rows = read(&CALENDAR_DATES, "service_id,date,exception_type\n", false).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn invalid_utf8_is_csv_error() {
        let bytes: &[u8] = b"service_id,date,exception_type\n\xff\xfe,20260103,2\n";
        let err = TableReader::new(&CALENDAR_DATES, bytes, false)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .err()
            .unwrap();
        assert!(matches!(err, LoadError::Csv { .. }));
    }
}

use crate::error::{Result, Witsml2CsvError};
use crate::witsml::{CellValue, MnemonicMap};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// What to do with a `data` row whose field count differs from the number of
/// entries in `mnemonicList`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RaggedRowPolicy {
    /// Fail the extraction on the first ragged row
    #[default]
    Reject,
    /// Drop extra fields and fill missing trailing fields with empty values
    Pad,
    /// Drop extra fields and leave short rows short; unequal columns fail
    Compatible,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub mnemonic: String,
    pub values: Vec<CellValue>,
}

/// Column-oriented table of coerced log values.
#[derive(Debug, Clone, PartialEq)]
pub struct LogTable {
    columns: Vec<Column>,
    row_count: usize,
}

impl LogTable {
    /// Splits every raw row on `,`, coerces the fields and places them into
    /// columns by position.
    ///
    /// `declared_width` is the entry count of `mnemonicList` and is what rows
    /// are checked against. The header may have fewer columns when the unit
    /// list is shorter or a mnemonic repeats; fields past the last header
    /// column are then dropped.
    pub fn from_rows<S: AsRef<str>>(
        mnemonics: &MnemonicMap,
        declared_width: usize,
        rows: &[S],
        policy: RaggedRowPolicy,
    ) -> Result<Self> {
        let mut columns: Vec<Column> = mnemonics
            .mnemonics()
            .map(|m| Column {
                mnemonic: m.to_string(),
                values: Vec::with_capacity(rows.len()),
            })
            .collect();

        for (index, row) in rows.iter().enumerate() {
            let fields: Vec<&str> = row.as_ref().split(',').collect();

            if fields.len() != declared_width && policy == RaggedRowPolicy::Reject {
                return Err(Witsml2CsvError::RaggedRow {
                    row: index + 1,
                    expected: declared_width,
                    found: fields.len(),
                });
            }

            for (column, field) in columns.iter_mut().zip(&fields) {
                column.values.push(CellValue::coerce(field));
            }

            if policy == RaggedRowPolicy::Pad {
                for column in columns.iter_mut().skip(fields.len()) {
                    column.values.push(CellValue::Missing);
                }
            }
        }

        Self::from_columns(columns)
    }

    /// Builds a table from columns that must all have the same length.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.iter().map(|c| c.values.len()).max().unwrap_or(0);

        if let Some(short) = columns.iter().find(|c| c.values.len() != row_count) {
            return Err(Witsml2CsvError::ColumnLengthMismatch {
                column: short.mnemonic.clone(),
                expected: row_count,
                found: short.values.len(),
            });
        }

        Ok(Self { columns, row_count })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.mnemonic.as_str())
    }

    pub fn row(&self, index: usize) -> Option<Vec<&CellValue>> {
        if index >= self.row_count {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&CellValue>> + '_ {
        (0..self.row_count).map(move |i| self.columns.iter().map(|c| &c.values[i]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> MnemonicMap {
        MnemonicMap::from_lists("DEPT,GR,RHOB", "m,API,g/cm3")
    }

    #[test]
    fn test_regular_rows() {
        let rows = ["100.0,55.2,2.31", "100.5,,2.29"];
        let table = LogTable::from_rows(&header(), 3, &rows, RaggedRowPolicy::Reject).unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.headers().collect::<Vec<_>>(), vec!["DEPT", "GR", "RHOB"]);
        assert_eq!(
            table.row(1).unwrap(),
            vec![
                &CellValue::Number(100.5),
                &CellValue::Missing,
                &CellValue::Number(2.29)
            ]
        );
        assert!(table.row(2).is_none());
    }

    #[test]
    fn test_no_rows_is_empty() {
        let rows: [&str; 0] = [];
        let table = LogTable::from_rows(&header(), 3, &rows, RaggedRowPolicy::Reject).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.column_count(), 3);
    }

    #[test]
    fn test_reject_policy() {
        let rows = ["1,2,3", "4,5"];
        let err = LogTable::from_rows(&header(), 3, &rows, RaggedRowPolicy::Reject).unwrap_err();

        match err {
            Witsml2CsvError::RaggedRow {
                row,
                expected,
                found,
            } => {
                assert_eq!(row, 2);
                assert_eq!(expected, 3);
                assert_eq!(found, 2);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let long = ["1,2,3,4"];
        assert!(LogTable::from_rows(&header(), 3, &long, RaggedRowPolicy::Reject).is_err());
    }

    #[test]
    fn test_pad_policy() {
        let rows = ["1,2", "4,5,6,7"];
        let table = LogTable::from_rows(&header(), 3, &rows, RaggedRowPolicy::Pad).unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.row(0).unwrap(),
            vec![
                &CellValue::Number(1.0),
                &CellValue::Number(2.0),
                &CellValue::Missing
            ]
        );
        assert_eq!(table.row(1).unwrap()[2], &CellValue::Number(6.0));
    }

    #[test]
    fn test_compatible_policy_truncates_long_rows() {
        let rows = ["1,2,3,extra", "4,5,6"];
        let table = LogTable::from_rows(&header(), 3, &rows, RaggedRowPolicy::Compatible).unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_compatible_policy_fails_on_uneven_columns() {
        let rows = ["1,2,3", "4"];
        let err =
            LogTable::from_rows(&header(), 3, &rows, RaggedRowPolicy::Compatible).unwrap_err();

        assert!(matches!(
            err,
            Witsml2CsvError::ColumnLengthMismatch { ref column, expected: 2, found: 1 } if column == "GR"
        ));
    }

    #[test]
    fn test_short_unit_list_checks_declared_mnemonics() {
        let header = MnemonicMap::from_lists("DEPT,GR,RHOB", "m,API");
        let table = LogTable::from_rows(&header, 3, &["1,2,3"], RaggedRowPolicy::Reject).unwrap();

        assert_eq!(table.column_count(), 2);
        assert_eq!(
            table.row(0).unwrap(),
            vec![&CellValue::Number(1.0), &CellValue::Number(2.0)]
        );

        let err = LogTable::from_rows(&header, 3, &["1,2"], RaggedRowPolicy::Reject).unwrap_err();
        assert!(matches!(
            err,
            Witsml2CsvError::RaggedRow { row: 1, expected: 3, found: 2 }
        ));
    }

    #[test]
    fn test_duplicate_mnemonic_keeps_first_position() {
        let header = MnemonicMap::from_lists("DEPT,GR,DEPT", "m,API,ft");
        let table = LogTable::from_rows(&header, 3, &["1,2,3"], RaggedRowPolicy::Reject).unwrap();

        assert_eq!(table.headers().collect::<Vec<_>>(), vec!["DEPT", "GR"]);
        assert_eq!(
            table.row(0).unwrap(),
            vec![&CellValue::Number(1.0), &CellValue::Number(2.0)]
        );
    }

    #[test]
    fn test_rows_iterator() {
        let rows = ["a,1,", "b,2,"];
        let table = LogTable::from_rows(&header(), 3, &rows, RaggedRowPolicy::Reject).unwrap();
        let collected: Vec<_> = table.rows().collect();

        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0][0], &CellValue::Text("a".to_string()));
        assert_eq!(collected[1][2], &CellValue::Missing);
    }
}

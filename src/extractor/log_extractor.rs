use crate::error::Result;
use crate::extractor::output_manager::{OutputManager, SavedLog};
use crate::extractor::table::{LogTable, RaggedRowPolicy};
use crate::witsml::{read_xml, LogDocument, MnemonicMap};
use std::path::Path;

/// A parsed and coerced log, not yet written anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedLog {
    pub name: String,
    pub mnemonics: MnemonicMap,
    pub table: LogTable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    /// Both output files were written.
    Written(SavedLog),
    /// The document had no data rows; nothing was written.
    Empty { stem: String },
}

impl ExtractionOutcome {
    pub fn saved(&self) -> Option<&SavedLog> {
        match self {
            ExtractionOutcome::Written(saved) => Some(saved),
            ExtractionOutcome::Empty { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogExtractor {
    ragged_rows: RaggedRowPolicy,
}

impl LogExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ragged_rows(mut self, policy: RaggedRowPolicy) -> Self {
        self.ragged_rows = policy;
        self
    }

    pub fn ragged_rows(&self) -> RaggedRowPolicy {
        self.ragged_rows
    }

    pub fn extract(&self, xml_text: &str) -> Result<ExtractedLog> {
        let document = LogDocument::parse(xml_text)?;
        let table = LogTable::from_rows(
            &document.mnemonics,
            document.declared_width,
            &document.rows,
            self.ragged_rows,
        )?;

        Ok(ExtractedLog {
            name: document.name,
            mnemonics: document.mnemonics,
            table,
        })
    }

    /// Parses `xml_text` and writes `{name}_{J}.json` plus `{name}_{C}.csv.gz`
    /// into `destination_dir`.
    ///
    /// A document without data rows yields [`ExtractionOutcome::Empty`] and
    /// writes nothing. On error nothing is left in the destination.
    pub fn extract_and_save<P: AsRef<Path>>(
        &self,
        xml_text: &str,
        destination_dir: P,
    ) -> Result<ExtractionOutcome> {
        let log = self.extract(xml_text)?;

        if log.table.is_empty() {
            tracing::debug!(name = %log.name, "no data rows, nothing written");
            return Ok(ExtractionOutcome::Empty { stem: log.name });
        }

        let saved = OutputManager::new(destination_dir.as_ref()).save_log(
            &log.name,
            &log.mnemonics,
            &log.table,
        )?;
        Ok(ExtractionOutcome::Written(saved))
    }

    /// Same as [`extract_and_save`](Self::extract_and_save) but never fails:
    /// the reason for a failure is only logged.
    pub fn extract_and_save_best_effort<P: AsRef<Path>>(
        &self,
        xml_text: &str,
        destination_dir: P,
    ) -> Option<SavedLog> {
        match self.extract_and_save(xml_text, destination_dir) {
            Ok(ExtractionOutcome::Written(saved)) => Some(saved),
            Ok(ExtractionOutcome::Empty { .. }) => None,
            Err(e) => {
                tracing::debug!(error = %e, "extraction failed, no output written");
                None
            }
        }
    }

    /// Reads `source` and extracts it. Read failures are returned as I/O
    /// errors before any parsing happens.
    pub fn convert_file<S: AsRef<Path>, D: AsRef<Path>>(
        &self,
        source: S,
        destination_dir: D,
    ) -> Result<ExtractionOutcome> {
        let xml_text = read_xml(source)?;
        self.extract_and_save(&xml_text, destination_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Witsml2CsvError;
    use flate2::read::GzDecoder;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    fn witsml(name: &str, rows: &[&str]) -> String {
        let data: String = rows
            .iter()
            .map(|r| format!("<data>{}</data>", r))
            .collect();
        format!(
            r#"<logs xmlns="http://www.witsml.org/schemas/1series"><log>
                <name>{}</name>
                <logData>
                  <mnemonicList>DEPT,GR,RHOB</mnemonicList>
                  <unitList>m,API,g/cm3</unitList>
                  {}
                </logData></log></logs>"#,
            name, data
        )
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_extract_and_save_writes_two_files() {
        let temp_dir = TempDir::new().unwrap();
        let xml = witsml("well", &["100.0,55.2,2.31", "100.5,,2.29", "101.0,60.1,2.35"]);

        let outcome = LogExtractor::new()
            .extract_and_save(&xml, temp_dir.path())
            .unwrap();
        let saved = outcome.saved().unwrap();

        assert_eq!(dir_entries(temp_dir.path()), vec!["well_0.csv.gz", "well_0.json"]);

        let header: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&saved.json_path).unwrap()).unwrap();
        assert_eq!(header.as_object().unwrap().len(), 3);
        assert_eq!(header["RHOB"], "g/cm3");

        let mut csv = String::new();
        GzDecoder::new(fs::File::open(&saved.csv_path).unwrap())
            .read_to_string(&mut csv)
            .unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "DEPT,GR,RHOB");
        assert_eq!(lines[2], "100.5,,2.29");
        assert!(lines.iter().all(|l| l.split(',').count() == 3));
    }

    #[test]
    fn test_zero_rows_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let outcome = LogExtractor::new()
            .extract_and_save(&witsml("well", &[]), temp_dir.path())
            .unwrap();

        assert_eq!(
            outcome,
            ExtractionOutcome::Empty {
                stem: "well".to_string()
            }
        );
        assert!(dir_entries(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_missing_elements_write_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let extractor = LogExtractor::new();
        let documents = [
            "<log><name>w</name><unitList>m</unitList><data>1</data></log>",
            "<log><name>w</name><mnemonicList>D</mnemonicList><data>1</data></log>",
            "<log><mnemonicList>D</mnemonicList><unitList>m</unitList><data>1</data></log>",
        ];

        for xml in documents {
            let result = extractor.extract_and_save(xml, temp_dir.path());
            assert!(matches!(result, Err(Witsml2CsvError::MissingElement { .. })));
            assert!(extractor
                .extract_and_save_best_effort(xml, temp_dir.path())
                .is_none());
        }
        assert!(dir_entries(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_existing_outputs_bump_suffix() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("well_0.json"), "{}").unwrap();
        fs::write(temp_dir.path().join("well_0.csv.gz"), "").unwrap();

        let saved = LogExtractor::new()
            .extract_and_save_best_effort(&witsml("well", &["1,2,3"]), temp_dir.path())
            .unwrap();

        assert_eq!(saved.json_path, temp_dir.path().join("well_1.json"));
        assert_eq!(saved.csv_path, temp_dir.path().join("well_1.csv.gz"));
    }

    #[test]
    fn test_repeated_calls_increase_suffix() {
        let temp_dir = TempDir::new().unwrap();
        let xml = witsml("well", &["1,2,3"]);
        let extractor = LogExtractor::new();

        let ids: Vec<(usize, usize)> = (0..3)
            .map(|_| {
                let saved = extractor
                    .extract_and_save_best_effort(&xml, temp_dir.path())
                    .unwrap();
                (saved.json_id, saved.csv_id)
            })
            .collect();

        assert_eq!(ids, vec![(0, 0), (1, 1), (2, 2)]);
        assert_eq!(dir_entries(temp_dir.path()).len(), 6);
    }

    #[test]
    fn test_ragged_rows_follow_policy() {
        let temp_dir = TempDir::new().unwrap();
        let xml = witsml("ragged", &["1,2,3", "4,5"]);

        let rejected = LogExtractor::new().extract_and_save(&xml, temp_dir.path());
        assert!(matches!(rejected, Err(Witsml2CsvError::RaggedRow { row: 2, .. })));

        let compatible = LogExtractor::new()
            .with_ragged_rows(RaggedRowPolicy::Compatible)
            .extract_and_save(&xml, temp_dir.path());
        assert!(matches!(
            compatible,
            Err(Witsml2CsvError::ColumnLengthMismatch { .. })
        ));
        assert!(dir_entries(temp_dir.path()).is_empty());

        let padded = LogExtractor::new()
            .with_ragged_rows(RaggedRowPolicy::Pad)
            .extract_and_save(&xml, temp_dir.path())
            .unwrap();
        assert_eq!(padded.saved().unwrap().rows, 2);
    }

    fn csv_lines(path: &Path) -> Vec<String> {
        let mut csv = String::new();
        GzDecoder::new(fs::File::open(path).unwrap())
            .read_to_string(&mut csv)
            .unwrap();
        csv.lines().map(str::to_string).collect()
    }

    #[test]
    fn test_short_unit_list_converts_under_reject() {
        let temp_dir = TempDir::new().unwrap();
        let xml = "<log><name>short</name><mnemonicList>DEPT,GR,RHOB</mnemonicList>\
                   <unitList>m,API</unitList><data>1,2,3</data><data>4,5,6</data></log>";

        let outcome = LogExtractor::new()
            .extract_and_save(xml, temp_dir.path())
            .unwrap();
        let saved = outcome.saved().unwrap();

        assert_eq!(
            fs::read_to_string(&saved.json_path).unwrap(),
            r#"{"DEPT": "m", "GR": "API"}"#
        );
        assert_eq!(csv_lines(&saved.csv_path), vec!["DEPT,GR", "1.0,2.0", "4.0,5.0"]);

        let ragged = "<log><name>short</name><mnemonicList>DEPT,GR,RHOB</mnemonicList>\
                      <unitList>m,API</unitList><data>1,2</data></log>";
        assert!(matches!(
            LogExtractor::new().extract_and_save(ragged, temp_dir.path()),
            Err(Witsml2CsvError::RaggedRow { row: 1, expected: 3, found: 2 })
        ));
    }

    #[test]
    fn test_duplicate_mnemonic_converts_under_reject() {
        let temp_dir = TempDir::new().unwrap();
        let xml = "<log><name>dup</name><mnemonicList>DEPT,GR,DEPT</mnemonicList>\
                   <unitList>m,API,ft</unitList><data>1,2,3</data></log>";

        let outcome = LogExtractor::new()
            .extract_and_save(xml, temp_dir.path())
            .unwrap();
        let saved = outcome.saved().unwrap();

        assert_eq!(
            fs::read_to_string(&saved.json_path).unwrap(),
            r#"{"DEPT": "ft", "GR": "API"}"#
        );
        assert_eq!(csv_lines(&saved.csv_path), vec!["DEPT,GR", "1.0,2.0"]);
    }

    #[test]
    fn test_unwritable_stem_leaves_no_files() {
        let temp_dir = TempDir::new().unwrap();
        let result =
            LogExtractor::new().extract_and_save(&witsml("a/b", &["1,2,3"]), temp_dir.path());

        assert!(matches!(result, Err(Witsml2CsvError::InvalidStem { .. })));
        assert!(dir_entries(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_missing_destination_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        let result = LogExtractor::new().extract_and_save(&witsml("w", &["1,2,3"]), &missing);

        assert!(matches!(result, Err(Witsml2CsvError::Io(_))));
    }

    #[test]
    fn test_convert_file_propagates_read_errors() {
        let temp_dir = TempDir::new().unwrap();
        let result =
            LogExtractor::new().convert_file(temp_dir.path().join("absent.xml"), temp_dir.path());
        assert!(matches!(result, Err(Witsml2CsvError::Io(_))));

        let source = temp_dir.path().join("log.xml");
        fs::write(&source, witsml("from_file", &["1,2,3"])).unwrap();
        let outcome = LogExtractor::new().convert_file(&source, temp_dir.path()).unwrap();
        assert_eq!(outcome.saved().unwrap().stem, "from_file");
    }
}

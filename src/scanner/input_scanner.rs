use crate::config::InputConfig;
use crate::error::{format_bytes, Result, Witsml2CsvError};
use crate::scanner::file_filter::FileFilter;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub size: u64,
    /// Named directly on the command line rather than found by walking.
    pub explicit: bool,
}

impl InputFile {
    pub fn new(path: PathBuf, size: u64, explicit: bool) -> Self {
        Self {
            path,
            size,
            explicit,
        }
    }

    pub fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    pub fn format_size(&self) -> String {
        format_bytes(self.size)
    }
}

/// Expands command line inputs into the list of documents to convert.
pub struct InputScanner {
    filter: FileFilter,
    max_depth: usize,
}

impl InputScanner {
    pub fn new(config: &InputConfig) -> Self {
        Self {
            filter: FileFilter::new(config),
            max_depth: config.max_depth,
        }
    }

    pub fn filter(&self) -> &FileFilter {
        &self.filter
    }

    /// Files are taken as they are; directories are walked. The result is
    /// sorted by path and free of duplicates.
    pub fn scan<P: AsRef<Path>>(&self, inputs: &[P]) -> Result<Vec<InputFile>> {
        let mut files = Vec::new();

        for input in inputs {
            let path = input.as_ref();
            let metadata = std::fs::metadata(path).map_err(|_| Witsml2CsvError::InvalidPath {
                path: path.display().to_string(),
            })?;

            if metadata.is_dir() {
                files.extend(self.scan_directory(path)?);
            } else {
                files.push(InputFile::new(path.to_path_buf(), metadata.len(), true));
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.dedup_by(|a, b| a.path == b.path);

        if files.is_empty() {
            return Err(Witsml2CsvError::NoInputsFound {
                searched_extensions: self.filter.extensions().to_vec(),
            });
        }

        tracing::debug!(count = files.len(), "input files collected");
        Ok(files)
    }

    pub fn scan_directory<P: AsRef<Path>>(&self, root: P) -> Result<Vec<InputFile>> {
        let root_path = root.as_ref();

        if !root_path.is_dir() {
            return Err(Witsml2CsvError::InvalidPath {
                path: format!("{} is not a directory", root_path.display()),
            });
        }

        let mut files = Vec::new();
        let mut scan_errors = Vec::new();

        let walker = WalkDir::new(root_path)
            .max_depth(self.max_depth)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| self.should_traverse(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    if err
                        .io_error()
                        .is_some_and(|e| e.kind() == std::io::ErrorKind::PermissionDenied)
                    {
                        scan_errors.push(format!("Permission denied: {}", err));
                    } else {
                        scan_errors.push(format!("Scan error: {}", err));
                    }
                    continue;
                }
            };

            if entry.file_type().is_file() {
                match self.process_file(&entry) {
                    Ok(Some(file)) => files.push(file),
                    Ok(None) => {}
                    Err(err) => {
                        scan_errors.push(format!(
                            "Error processing {}: {}",
                            entry.path().display(),
                            err
                        ));
                    }
                }
            }
        }

        for error in &scan_errors {
            tracing::warn!("{}", error);
        }

        if !scan_errors.is_empty() && files.is_empty() {
            return Err(Witsml2CsvError::Permission {
                path: format!("Multiple scan errors: {}", scan_errors.join(", ")),
            });
        }

        Ok(files)
    }

    fn should_traverse(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || entry.file_type().is_file() {
            return true;
        }

        if entry.file_type().is_dir() {
            return self.filter.should_traverse_directory(entry.path());
        }

        true
    }

    fn process_file(&self, entry: &DirEntry) -> Result<Option<InputFile>> {
        let path = entry.path();

        if !self.filter.is_witsml_file(path) {
            return Ok(None);
        }

        let metadata = entry.metadata().map_err(|e| Witsml2CsvError::Io(e.into()))?;

        if !self.filter.is_size_allowed(metadata.len()) {
            tracing::debug!(
                path = %path.display(),
                size = metadata.len(),
                "skipping file above size limit"
            );
            return Ok(None);
        }

        Ok(Some(InputFile::new(path.to_path_buf(), metadata.len(), false)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_config() -> InputConfig {
        InputConfig {
            extensions: vec!["xml".to_string()],
            max_file_size: 64,
            exclude_dirs: vec!["archive".to_string()],
            exclude_patterns: vec![],
            max_depth: 5,
        }
    }

    #[test]
    fn test_input_file_creation() {
        let file = InputFile::new(PathBuf::from("logs/well.xml"), 2048, true);
        assert_eq!(file.display_path(), "logs/well.xml");
        assert_eq!(file.format_size(), "2.0 KB");
    }

    #[test]
    fn test_scan_directory_filters_and_sorts() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("b")).unwrap();
        fs::create_dir_all(root.join("archive")).unwrap();
        fs::create_dir_all(root.join(".hidden")).unwrap();

        fs::write(root.join("b/two.xml"), "<log/>").unwrap();
        fs::write(root.join("a.xml"), "<log/>").unwrap();
        fs::write(root.join("notes.txt"), "text").unwrap();
        fs::write(root.join("archive/old.xml"), "<log/>").unwrap();
        fs::write(root.join(".hidden/secret.xml"), "<log/>").unwrap();
        fs::write(root.join("big.xml"), "x".repeat(65)).unwrap();

        let scanner = InputScanner::new(&create_test_config());
        let files = scanner.scan(&[root]).unwrap();

        let names: Vec<PathBuf> = files
            .iter()
            .map(|f| f.path.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(names, vec![PathBuf::from("a.xml"), PathBuf::from("b/two.xml")]);
        assert!(files.iter().all(|f| !f.explicit));
    }

    #[test]
    fn test_explicit_files_are_kept_as_is() {
        let temp_dir = TempDir::new().unwrap();
        let odd = temp_dir.path().join("export.dat");
        fs::write(&odd, "x".repeat(100)).unwrap();

        let scanner = InputScanner::new(&create_test_config());
        let files = scanner.scan(&[&odd, &odd]).unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].explicit);
        assert_eq!(files[0].size, 100);
    }

    #[test]
    fn test_missing_input_is_invalid_path() {
        let scanner = InputScanner::new(&create_test_config());
        let result = scanner.scan(&[Path::new("/no/such/input.xml")]);
        assert!(matches!(result, Err(Witsml2CsvError::InvalidPath { .. })));
    }

    #[test]
    fn test_empty_directory_finds_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = InputScanner::new(&create_test_config());

        match scanner.scan(&[temp_dir.path()]) {
            Err(Witsml2CsvError::NoInputsFound {
                searched_extensions,
            }) => assert_eq!(searched_extensions, vec!["xml"]),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}

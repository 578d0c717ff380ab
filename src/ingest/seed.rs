use crate::core::error::{BenchError, Result};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Reads one name per line. Trailing whitespace is trimmed, blank lines are
/// dropped and duplicates collapse.
pub fn read_city_names<R: Read>(reader: R) -> std::io::Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    for line in BufReader::new(reader).lines() {
        let line = line?;
        let name = line.trim_end();
        if !name.is_empty() {
            names.insert(name.to_string());
        }
    }
    Ok(names)
}

pub fn load_city_names(path: &Path) -> Result<BTreeSet<String>> {
    let missing = |reason: String| BenchError::MissingSeedData {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| missing(e.to_string()))?;
    let names = read_city_names(file).map_err(|e| missing(e.to_string()))?;
    if names.is_empty() {
        return Err(missing("no city names".to_string()));
    }
    Ok(names)
}

use crate::error::TmResult;
use crate::stats::StoredTest;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const HEADER: [&str; 9] = [
    "id",
    "timestamp",
    "difficulty",
    "wpm",
    "accuracy",
    "time_taken",
    "error_count",
    "original_text",
    "typed_text",
];

/// Writes the test history as CSV, header first, one row per test.
/// Returns the number of rows written.
pub fn write_tests_csv<W: Write>(tests: &[StoredTest], out: W) -> TmResult<usize> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);

    // Written by hand so an empty history still gets a header.
    writer.write_record(HEADER)?;
    for test in tests {
        writer.serialize(test)?;
    }
    writer.flush()?;

    Ok(tests.len())
}

pub fn export_tests_to_path<P: AsRef<Path>>(tests: &[StoredTest], path: P) -> TmResult<usize> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    write_tests_csv(tests, File::create(path)?)
}

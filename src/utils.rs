use std::{fs, io};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};

/// Reads a label file, one class name per line. Blank lines are skipped.
pub(crate) fn file_to_vec(filename: impl AsRef<Path>) -> io::Result<Vec<String>> {
    let file_in = fs::File::open(filename)?;
    let file_reader = BufReader::new(file_in);
    let mut lines = Vec::new();
    for line in file_reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    Ok(lines)
}

pub(crate) fn trace(l_type: &str, l_step: &str, start: Instant, previous: Duration) -> Duration {
    log::trace!("{} | Total={:.2?} | {}={:.2?}", l_type, start.elapsed(), l_step, start.elapsed() - previous);
    start.elapsed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_label_file() {
        let path = std::env::temp_dir().join(format!("overlap_detect_labels_{}.txt", std::process::id()));
        fs::write(&path, "person\n\nbicycle\r\n  car  \n").unwrap();
        let labels = file_to_vec(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(labels, vec!["person", "bicycle", "car"]);
    }

    #[test]
    fn missing_label_file_errors() {
        assert!(file_to_vec("/nonexistent/labels.txt").is_err());
    }
}

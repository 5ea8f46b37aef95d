use anyhow::Result;
use fs_err::File;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Creates a spinner for waiting on the fetcher.
pub fn spinner_with_message(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner().with_message(message);
    if let Ok(style) = ProgressStyle::with_template("[{elapsed_precise}] {spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

pub fn write_json_file<T: Serialize>(
    file_name: &str,
    output_directory: &Path,
    data: T,
) -> Result<PathBuf> {
    let path = output_directory.join(format!("{file_name}.json"));
    info!("Writing to {}", path.display());
    let file = File::create(&path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &data)?;
    writer.flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_write_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let data = json!([{"Departure": "10:17", "Delay (min)": "2"}]);
        let path = write_json_file("departures_outbound", dir.path(), &data).unwrap();

        assert_eq!(path, dir.path().join("departures_outbound.json"));
        let written: Value = serde_json::from_str(&fs_err::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, data);
    }

    #[test]
    fn test_write_json_file_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(write_json_file("departures", &missing, json!({})).is_err());
    }
}

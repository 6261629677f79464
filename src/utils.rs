use std::{fs, io};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};
use anyhow::Context;
use regex::Regex;

pub(crate) fn file_to_vec(filename: &Path) -> io::Result<Vec<String>> {
    let file_in = fs::File::open(filename)?;
    let file_reader = BufReader::new(file_in);
    Ok(file_reader
        .lines()
        .map_while(io::Result::ok)
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

/// Class labels from a `.json` array of strings or a text file with one label per line.
pub(crate) fn read_labels(path: &Path) -> anyhow::Result<Vec<String>> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let labels = if is_json {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read labels file {}", path.display()))?;
        serde_json::from_str::<Vec<String>>(&raw)
            .with_context(|| format!("Labels file {} is not a JSON array of strings", path.display()))?
    } else {
        file_to_vec(path).with_context(|| format!("Failed to read labels file {}", path.display()))?
    };

    if labels.is_empty() {
        anyhow::bail!("Labels file {} is empty", path.display());
    }
    Ok(labels)
}

/// Parses the `names` metadata entry exported with YOLO ONNX models.
///
/// String format: `{0: 'person', 1: 'bicycle', 2: 'sports ball', ..., 27: "yellow_lady's_slipper"}`
pub(crate) fn parse_names_metadata(names: &str) -> Vec<String> {
    let re = match Regex::new(r#"(['"])([-()\w '"]+)(['"])"#) {
        Ok(re) => re,
        Err(_) => return vec![],
    };
    re.captures_iter(names)
        .map(|x| x.extract())
        .map(|(_, [_, name, _])| name.to_string())
        .collect()
}

pub(crate) fn trace(l_type: &str, l_step: &str, detect: Instant, _detect_elapsed: Duration) -> Duration {
    log::trace!("{} | Total={:.2?} | {}={:.2?}", l_type, detect.elapsed(), l_step, detect.elapsed() - _detect_elapsed);
    detect.elapsed()
}

use anyhow::{bail, Context, Result};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

// Default patterns compiled into the binary.
const DEFAULT_PATTERNS: &str = include_str!("../default_domain_patterns.txt");

/// Compile one pattern per non-comment line. `strict` makes a bad line an
/// error (used for explicitly named files); otherwise it is logged and
/// skipped.
fn compile_patterns(content: &str, origin: &str, strict: bool) -> Result<Vec<Regex>> {
    let mut patterns = Vec::new();
    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match Regex::new(line) {
            Ok(regex) => patterns.push(regex),
            Err(e) if strict => {
                bail!("Invalid regex pattern in {} at line {}: {}", origin, line_num + 1, e)
            }
            Err(e) => {
                warn!(action = "parse", component = "pattern_loading", origin = origin, line_number = line_num + 1, error = %e, "Skipping invalid regex pattern")
            }
        }
    }
    Ok(patterns)
}

pub fn load_domain_patterns(pattern_file_path: Option<&Path>) -> Result<Vec<Regex>> {
    let start_time = Instant::now();

    let patterns = if let Some(path) = pattern_file_path {
        if !path.exists() {
            bail!("Pattern file not found: {:?}", path);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read pattern file {:?}", path))?;
        compile_patterns(&content, &path.display().to_string(), true)?
    } else {
        let default_file = Path::new("domain_patterns.txt");
        let from_file = if default_file.exists() {
            let content = fs::read_to_string(default_file)?;
            compile_patterns(&content, "domain_patterns.txt", false)?
        } else {
            Vec::new()
        };
        if from_file.is_empty() {
            compile_patterns(DEFAULT_PATTERNS, "embedded defaults", false)?
        } else {
            from_file
        }
    };

    info!(
        action = "complete",
        component = "pattern_loading",
        pattern_count = patterns.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Compiled domain patterns"
    );
    Ok(patterns)
}

/// Write the embedded defaults to domain_patterns.txt in the working
/// directory so they can be customized.
pub fn init_default_patterns() -> Result<()> {
    let default_file = Path::new("domain_patterns.txt");

    if default_file.exists() {
        bail!("domain_patterns.txt already exists. Remove it first if you want to reinitialize.");
    }

    fs::write(default_file, DEFAULT_PATTERNS)?;
    println!("Created domain_patterns.txt with default patterns");

    Ok(())
}

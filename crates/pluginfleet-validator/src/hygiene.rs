//! Shell-expansion scan over packaged JSON files.

use std::path::Path;

use tracing::warn;

use crate::codes::E201;
use crate::paths;
use crate::report::{ReportBuilder, ValidationReport};

/// Substrings that only make sense to a shell.
const HAZARDS: [&str; 3] = ["$(", "${", "~/"];

/// Scan every `*.json` file under `root` for shell expansion or home
/// shorthand. One issue per offending file; a file that cannot be read is
/// reported as its own issue and the scan continues.
pub fn scan_content(root: &Path) -> ValidationReport {
    if !root.exists() {
        return ValidationReport::not_found(root);
    }

    let mut report = ReportBuilder::new(root);
    let mut flagged = false;

    for entry in paths::walk_files(root, "json") {
        let file = match entry {
            Ok(file) => file,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory");
                report.issue(e.to_string());
                continue;
            }
        };

        match paths::read_text(&file) {
            Ok(content) if HAZARDS.iter().any(|h| content.contains(h)) => {
                let name = file.strip_prefix(root).unwrap_or(&file);
                report.issue(format!("{}: Shell expansion in {}", E201, name.display()));
                flagged = true;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Skipping unreadable file");
                report.issue(e.to_string());
            }
        }
    }

    if flagged {
        report.recommend("Replace shell expansions with absolute paths");
    }
    report.build()
}

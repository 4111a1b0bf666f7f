//! Canonical machine-readable document

use crate::report::CoverageReport;

/// Pretty-printed JSON form of the report
pub fn render(report: &CoverageReport) -> String {
    // Every field is a string, number, bool, map with string keys or a JSON value
    match serde_json::to_string_pretty(report) {
        Ok(mut body) => {
            body.push('\n');
            body
        },
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize coverage report");
            String::from("{}\n")
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatters::fixtures;

    #[test]
    fn test_json_document_decodes_back() {
        let report = fixtures::report();
        let body = render(&report);

        let decoded = CoverageReport::from_json_str(&body).unwrap();
        assert_eq!(decoded, report);

        let keys: Vec<_> = decoded.coverage.requirements.keys().cloned().collect();
        assert_eq!(keys, vec!["REQ-1", "REQ-2", "REQ-3"]);
    }
}

//! Console summary printed after a run.

use crate::trainer::TrainingReport;

/// Accuracy line followed by the feature-importance table.
pub fn render_summary(report: &TrainingReport) -> String {
    format!(
        "Model trained and logged with accuracy: {:.4}\n\nFeature Importance:\n{}",
        report.accuracy, report.importances
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_core::metrics::FeatureImportance;

    #[test]
    fn summary_layout() {
        let names = vec!["Glucose".to_string(), "BMI".to_string()];
        let report = TrainingReport {
            experiment_id: "1".into(),
            run_id: "r1".into(),
            accuracy: 0.753_246,
            params: Vec::new(),
            importances: FeatureImportance::new(&names, &[0.6, 0.4]).unwrap(),
            n_train: 614,
            n_test: 154,
        };

        let summary = render_summary(&report);
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[0], "Model trained and logged with accuracy: 0.7532");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "Feature Importance:");
        assert!(lines[4].starts_with("Glucose"));
        assert!(lines[5].starts_with("BMI"));
    }
}

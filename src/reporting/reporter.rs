use crate::reporting::model::{Finding, Severity};

#[derive(Debug, Default)]
pub struct Reporter {
    findings: Vec<Finding>,
}

impl Reporter {
    pub fn new() -> Self {
        Self {
            findings: Vec::new(),
        }
    }

    pub fn add(&mut self, finding: Finding) {
        tracing::info!("Finding: {} ({})", finding.title, finding.url);
        self.findings.push(finding);
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    pub fn into_findings(self) -> Vec<Finding> {
        self.findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_severity() {
        let mut reporter = Reporter::new();
        reporter.add(Finding::suspicious_screen("https://a.com/App/Test", "/App/Test"));
        reporter.add(Finding::suspicious_screen("https://a.com/App/Debug", "/App/Debug"));
        reporter.add(Finding::native_apps_exposed("https://a.com/NativeAppBuilder", 3));

        assert_eq!(reporter.count(Severity::Low), 2);
        assert_eq!(reporter.count(Severity::Medium), 1);
        assert_eq!(reporter.into_findings().len(), 3);
    }
}

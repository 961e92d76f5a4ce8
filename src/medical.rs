//! Medical report analysis collaborator
//!
//! Uploaded reports are never parsed. An analyzer receives only the
//! document's metadata and returns a static [`ReportAnalysis`] after a
//! fixed artificial delay. The analysis is consumed read-only by the
//! recommendation engine.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Delay the dashboard showed before an analysis appeared
pub const DEFAULT_ANALYSIS_DELAY: Duration = Duration::from_secs(2);

/// Flag attached to one lab marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabFlag {
    #[default]
    Normal,
    Low,
    High,
}

impl fmt::Display for LabFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabFlag::Normal => write!(f, "normal"),
            LabFlag::Low => write!(f, "low"),
            LabFlag::High => write!(f, "high"),
        }
    }
}

/// Outcome of a (simulated) report analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportAnalysis {
    pub glucose: LabFlag,
    pub cholesterol: LabFlag,
    pub hemoglobin: LabFlag,
    pub vitamin_d: LabFlag,
    pub vitamin_b12: LabFlag,
    pub iron: LabFlag,
    pub magnesium: LabFlag,
    pub low_electrolytes: bool,
    pub recommendations: Vec<String>,
}

impl ReportAnalysis {
    /// Build an analysis and derive its free-text recommendations
    #[allow(clippy::too_many_arguments)]
    pub fn from_flags(
        glucose: LabFlag,
        cholesterol: LabFlag,
        hemoglobin: LabFlag,
        vitamin_d: LabFlag,
        vitamin_b12: LabFlag,
        iron: LabFlag,
        magnesium: LabFlag,
        low_electrolytes: bool,
    ) -> Self {
        let mut analysis = Self {
            glucose,
            cholesterol,
            hemoglobin,
            vitamin_d,
            vitamin_b12,
            iron,
            magnesium,
            low_electrolytes,
            recommendations: Vec::new(),
        };
        analysis.recommendations = analysis.derive_recommendations();
        analysis
    }

    fn derive_recommendations(&self) -> Vec<String> {
        let mut recommendations = Vec::new();
        if self.glucose == LabFlag::Low {
            recommendations.push("Monitor blood sugar during exercise".to_string());
        }
        if self.vitamin_d == LabFlag::Low {
            recommendations.push("Consider vitamin D supplementation".to_string());
        }
        if self.iron == LabFlag::Low {
            recommendations
                .push("May experience faster fatigue - monitor energy levels".to_string());
        }
        recommendations
    }

    /// Marker name and flag pairs, in display order
    pub fn markers(&self) -> [(&'static str, LabFlag); 7] {
        [
            ("glucose", self.glucose),
            ("cholesterol", self.cholesterol),
            ("hemoglobin", self.hemoglobin),
            ("vitamin D", self.vitamin_d),
            ("vitamin B12", self.vitamin_b12),
            ("iron", self.iron),
            ("magnesium", self.magnesium),
        ]
    }
}

/// Metadata of an uploaded report; its content is never read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl ReportDocument {
    pub fn from_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(&path)?;
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            size_bytes: metadata.len(),
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Pluggable report analysis
pub trait ReportAnalyzer: Send {
    fn analyze(&mut self, document: &ReportDocument) -> ReportAnalysis;
}

/// Always returns the same analysis
#[derive(Debug, Clone, Default)]
pub struct StaticReportAnalyzer {
    analysis: ReportAnalysis,
}

impl StaticReportAnalyzer {
    pub fn new(analysis: ReportAnalysis) -> Self {
        Self { analysis }
    }
}

impl ReportAnalyzer for StaticReportAnalyzer {
    fn analyze(&mut self, _document: &ReportDocument) -> ReportAnalysis {
        self.analysis.clone()
    }
}

/// Draws each marker flag at random with fixed abnormal odds
#[derive(Debug, Clone)]
pub struct RandomReportAnalyzer {
    rng: StdRng,
}

impl RandomReportAnalyzer {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible analyzer for tests and demos
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Normal with probability `1 - abnormal_below`, otherwise `abnormal`
    fn draw(&mut self, abnormal_below: f64, abnormal: LabFlag) -> LabFlag {
        if self.rng.gen::<f64>() > abnormal_below {
            LabFlag::Normal
        } else {
            abnormal
        }
    }
}

impl Default for RandomReportAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportAnalyzer for RandomReportAnalyzer {
    fn analyze(&mut self, document: &ReportDocument) -> ReportAnalysis {
        tracing::debug!(file = %document.file_name(), bytes = document.size_bytes, "Simulating report analysis");

        let glucose = self.draw(0.7, LabFlag::Low);
        let cholesterol = self.draw(0.6, LabFlag::High);
        let hemoglobin = self.draw(0.8, LabFlag::Low);
        let vitamin_d = self.draw(0.5, LabFlag::Low);
        let vitamin_b12 = self.draw(0.7, LabFlag::Low);
        let iron = self.draw(0.6, LabFlag::Low);
        let magnesium = self.draw(0.7, LabFlag::Low);
        let low_electrolytes = self.rng.gen::<f64>() > 0.7;

        ReportAnalysis::from_flags(
            glucose,
            cholesterol,
            hemoglobin,
            vitamin_d,
            vitamin_b12,
            iron,
            magnesium,
            low_electrolytes,
        )
    }
}

/// Run an analyzer after the artificial delay
///
/// Runs independently of the session clock.
pub async fn analyze_report<A>(
    analyzer: &mut A,
    document: &ReportDocument,
    delay: Duration,
) -> ReportAnalysis
where
    A: ReportAnalyzer + ?Sized,
{
    tokio::time::sleep(delay).await;
    let analysis = analyzer.analyze(document);
    tracing::info!(
        file = %document.file_name(),
        low_electrolytes = analysis.low_electrolytes,
        recommendations = analysis.recommendations.len(),
        "Report analysis ready"
    );
    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn document() -> ReportDocument {
        ReportDocument {
            path: PathBuf::from("/reports/bloodwork.pdf"),
            size_bytes: 1024,
        }
    }

    #[test]
    fn test_recommendations_follow_flags() {
        let analysis = ReportAnalysis::from_flags(
            LabFlag::Low,
            LabFlag::High,
            LabFlag::Normal,
            LabFlag::Low,
            LabFlag::Normal,
            LabFlag::Low,
            LabFlag::Normal,
            true,
        );

        assert_eq!(
            analysis.recommendations,
            vec![
                "Monitor blood sugar during exercise".to_string(),
                "Consider vitamin D supplementation".to_string(),
                "May experience faster fatigue - monitor energy levels".to_string(),
            ]
        );
    }

    #[test]
    fn test_all_normal_has_no_recommendations() {
        let analysis = ReportAnalysis::default();
        assert!(analysis.recommendations.is_empty());
        assert!(analysis.markers().iter().all(|(_, flag)| *flag == LabFlag::Normal));
    }

    #[test]
    fn test_static_analyzer_is_fixed() {
        let fixed = ReportAnalysis {
            low_electrolytes: true,
            ..ReportAnalysis::default()
        };
        let mut analyzer = StaticReportAnalyzer::new(fixed.clone());
        assert_eq!(analyzer.analyze(&document()), fixed);
        assert_eq!(analyzer.analyze(&document()), fixed);
    }

    #[test]
    fn test_seeded_analyzer_is_reproducible() {
        let mut a = RandomReportAnalyzer::seeded(7);
        let mut b = RandomReportAnalyzer::seeded(7);
        for _ in 0..5 {
            assert_eq!(a.analyze(&document()), b.analyze(&document()));
        }
    }

    #[test]
    fn test_document_metadata_only() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"not really a lab report").unwrap();

        let document = ReportDocument::from_path(file.path()).unwrap();
        assert_eq!(document.size_bytes, 23);
        assert!(!document.file_name().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_analysis_waits_for_delay() {
        let mut analyzer = StaticReportAnalyzer::default();
        let started = tokio::time::Instant::now();

        let analysis = analyze_report(&mut analyzer, &document(), DEFAULT_ANALYSIS_DELAY).await;

        assert!(started.elapsed() >= DEFAULT_ANALYSIS_DELAY);
        assert_eq!(analysis, ReportAnalysis::default());
    }
}

use serde::Deserialize;

use crate::analysis::repo::AnalysisStatus;

#[derive(Debug, Deserialize)]
pub struct CreateAnalysisRequest {
    pub file_name: String,
    pub file_url: Option<String>,
    pub analysis_summary: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAnalysisRequest {
    pub analysis_summary: Option<String>,
    pub status: Option<AnalysisStatus>,
}

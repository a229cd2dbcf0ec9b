//! OpenAPI description of the persisted record format.

use utoipa::OpenApi;

use crate::domain::{
    CandidateInfo, CandidateRecord, CoverageMetrics, TestMetrics, TestReport, ToolKind,
    ToolMetrics,
};

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(
            CandidateRecord,
            CandidateInfo,
            ToolKind,
            ToolMetrics,
            TestReport,
            TestMetrics,
            CoverageMetrics
        )
    )
)]
/// OpenAPI document holding the record schemas.
pub struct RecordSchema;

/// Record schema as pretty-printed JSON.
pub fn record_schema_json() -> Result<String, serde_json::Error> {
    RecordSchema::openapi().to_pretty_json()
}

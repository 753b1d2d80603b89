//! Upload handle - SAS URI exchange for batch mode
//!
//! Created per flush, consumed immediately, never persisted.

use serde::{Deserialize, Serialize};

/// Status code reported on a successful upload
pub const UPLOAD_SUCCESS_STATUS: u16 = 200;

/// Description reported on a successful upload
pub const UPLOAD_SUCCESS_DESCRIPTION: &str = "Success";

/// Upload target returned by the ingestion endpoint for one blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTarget {
    /// Correlates the later completion notification
    pub correlation_id: String,
    /// Storage account host
    pub host_name: String,
    /// Blob container
    pub container_name: String,
    /// Blob name (may differ from the requested file name)
    pub blob_name: String,
    /// SAS query string, including the leading `?`
    pub sas_token: String,
}

impl UploadTarget {
    /// Full pre-authorized blob URI
    pub fn blob_uri(&self) -> String {
        format!(
            "https://{}/{}/{}{}",
            self.host_name, self.container_name, self.blob_name, self.sas_token
        )
    }
}

/// Completion notification sent after a blob upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCompletion {
    pub correlation_id: String,
    pub is_success: bool,
    pub status_code: u16,
    pub status_description: String,
}

impl UploadCompletion {
    /// Fixed success notification for a target
    pub fn success(target: &UploadTarget) -> Self {
        Self {
            correlation_id: target.correlation_id.clone(),
            is_success: true,
            status_code: UPLOAD_SUCCESS_STATUS,
            status_description: UPLOAD_SUCCESS_DESCRIPTION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> UploadTarget {
        UploadTarget {
            correlation_id: "corr-1".into(),
            host_name: "acct.blob.core.windows.net".into(),
            container_name: "uploads".into(),
            blob_name: "dev/telemetry-1.jsonl".into(),
            sas_token: "?sv=2021&sig=abc".into(),
        }
    }

    #[test]
    fn test_blob_uri() {
        assert_eq!(
            target().blob_uri(),
            "https://acct.blob.core.windows.net/uploads/dev/telemetry-1.jsonl?sv=2021&sig=abc"
        );
    }

    #[test]
    fn test_success_notification_wire_shape() {
        let completion = UploadCompletion::success(&target());
        let json = serde_json::to_value(&completion).unwrap();
        assert_eq!(json["correlationId"], "corr-1");
        assert_eq!(json["isSuccess"], true);
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["statusDescription"], "Success");
    }

    #[test]
    fn test_target_parses_hub_response() {
        let body = r#"{
            "correlationId": "c",
            "hostName": "h",
            "containerName": "k",
            "blobName": "b",
            "sasToken": "?s"
        }"#;
        let parsed: UploadTarget = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.blob_uri(), "https://h/k/b?s");
    }
}

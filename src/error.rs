//! The ways a request can go wrong, and the HTTP status each one earns
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

/// Errors from the tabular adapter and the HTTP layer. The comparison engine
/// itself never fails.
#[derive(Error, Debug)]
pub enum ListsetError {
    /// The upload had no `file` field
    #[error("No file uploaded")]
    MissingFile,

    /// The uploaded file had an empty filename
    #[error("No file selected")]
    EmptyFilename,

    /// Neither `.csv`, `.xlsx`, nor `.xls` (or, for exports, neither `csv` nor `excel`)
    #[error("Unsupported file format: {0}. Please upload a CSV or Excel file (.csv, .xlsx, .xls)")]
    UnsupportedFormat(String),

    /// The header row lacks one or more required columns
    #[error("Missing required columns: {}. Required columns: member, items", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// Every row had a blank member or no items
    #[error("No valid member data found in file")]
    NoValidRows,

    /// An export was requested with no members
    #[error("No member data to export")]
    EmptyMembers,

    /// The CSV reader or writer failed
    #[error("Error processing file: {0}")]
    Csv(#[from] csv::Error),

    /// The spreadsheet reader failed
    #[error("Error processing file: {0}")]
    Spreadsheet(String),

    /// The spreadsheet writer failed
    #[error("Error creating Excel file: {0}")]
    Xlsx(String),

    /// Anything else that went wrong while handling a file
    #[error("Error processing file: {0}")]
    Processing(String),
}

impl From<calamine::Error> for ListsetError {
    fn from(err: calamine::Error) -> Self {
        ListsetError::Spreadsheet(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ListsetError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ListsetError::Xlsx(err.to_string())
    }
}

impl ListsetError {
    /// Validation problems are the client's fault; everything else is ours.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ListsetError::MissingFile
            | ListsetError::EmptyFilename
            | ListsetError::UnsupportedFormat(_)
            | ListsetError::MissingColumns(_)
            | ListsetError::NoValidRows
            | ListsetError::EmptyMembers => StatusCode::BAD_REQUEST,
            ListsetError::Csv(_)
            | ListsetError::Spreadsheet(_)
            | ListsetError::Xlsx(_)
            | ListsetError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ListsetError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Result type for the tabular adapter and HTTP handlers
pub type Result<T> = std::result::Result<T, ListsetError>;

#[allow(clippy::pedantic)]
#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests() {
        for err in [
            ListsetError::MissingFile,
            ListsetError::EmptyFilename,
            ListsetError::UnsupportedFormat(".txt".into()),
            ListsetError::MissingColumns(vec!["items".into()]),
            ListsetError::NoValidRows,
            ListsetError::EmptyMembers,
        ] {
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "for {err:?}");
        }
    }

    #[test]
    fn processing_errors_are_server_errors() {
        let err = ListsetError::Processing("bad bytes".into());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Error processing file: bad bytes");
    }

    #[test]
    fn missing_columns_are_listed() {
        let err = ListsetError::MissingColumns(vec!["member".into(), "items".into()]);
        assert_eq!(
            err.to_string(),
            "Missing required columns: member, items. Required columns: member, items"
        );
    }
}

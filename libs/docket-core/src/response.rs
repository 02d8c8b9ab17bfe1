//! JSON response envelope for task list endpoints

use crate::error::DocketError;
use crate::query::QueryResult;
use serde::{Deserialize, Serialize};

/// Pagination block of a successful response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub pages: u64,
}

/// Payload of a successful response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageData<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// `{"status":"success","data":{...}}` or `{"status":"error","message":"..."}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ApiResponse<T> {
    Success { data: PageData<T> },
    Error { message: String },
}

impl<T> ApiResponse<T> {
    #[must_use]
    pub fn success(result: QueryResult<T>) -> Self {
        Self::Success {
            data: PageData {
                pagination: Pagination {
                    total: result.total,
                    page: result.page,
                    pages: result.pages,
                },
                items: result.items,
            },
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl<T> From<&DocketError> for ApiResponse<T> {
    fn from(error: &DocketError) -> Self {
        Self::error(error.to_string())
    }
}

impl<T> From<Result<QueryResult<T>, DocketError>> for ApiResponse<T> {
    fn from(result: Result<QueryResult<T>, DocketError>) -> Self {
        match result {
            Ok(page) => Self::success(page),
            Err(e) => Self::from(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SortSpec;
    use serde_json::json;

    #[test]
    fn test_success_envelope_shape() {
        let result = QueryResult::new(vec!["a", "b"], 12, &SortSpec::default());
        let value = serde_json::to_value(ApiResponse::success(result)).unwrap();

        assert_eq!(
            value,
            json!({
                "status": "success",
                "data": {
                    "items": ["a", "b"],
                    "pagination": { "total": 12, "page": 1, "pages": 1 }
                }
            })
        );
    }

    #[test]
    fn test_error_envelope_shape() {
        let err = DocketError::validation("dateFrom", "invalid ISO date 'x'");
        let response: ApiResponse<()> = ApiResponse::from(&err);
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["status"], "error");
        assert!(value["message"].as_str().unwrap().contains("dateFrom"));
        assert!(value.get("data").is_none());
        assert!(!response.is_success());
    }

    #[test]
    fn test_from_result() {
        let ok: ApiResponse<u8> = Ok(QueryResult::new(vec![], 0, &SortSpec::default())).into();
        assert!(ok.is_success());

        let failed: ApiResponse<u8> = Err(DocketError::store("down")).into();
        assert_eq!(failed, ApiResponse::error("Store error: down"));
    }
}

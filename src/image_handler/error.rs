//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载校验链路中的所有失败，并在检测点直接完成分级：
//! - `bad_request`（400）：调用方或上游数据问题
//! - `service_unavailable`（503）：远端不可达
//! - `internal`（500）：系统自身故障
//!
//! 400 分为“无原因”（`BadRequest`）与“附带原因”（`Rejected`）两种，
//! 便于调用侧区分是否需要透出底层错误信息。

use std::borrow::Cow;

use reqwest::StatusCode;

/// 底层错误原因（网络 / IO / 解码 / 编码）。
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 固定文案：栅格不支持区域提取。
pub const CROP_FAILED_MESSAGE: &str = "Image cropping failed";

/// 错误分级，与 HTTP 状态码一一对应。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    BadRequest,
    ServiceUnavailable,
    Internal,
}

impl Classification {
    pub fn status(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::ServiceUnavailable => "service_unavailable",
            Self::Internal => "internal",
        }
    }
}

/// 图片校验统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// 请求无效，不附带原因（URI 非法、上游状态码 ≥ 400、无法识别来源）。
    #[error("请求无效")]
    BadRequest,

    /// 请求无效，附带原因（内联数据格式错误、远端内容无法解码）。
    #[error("请求无效：{0}")]
    Rejected(#[source] BoxError),

    /// 远端不可达。
    #[error("服务不可用：{0}")]
    ServiceUnavailable(#[source] BoxError),

    /// 内部错误，附带原因。
    #[error("内部错误：{0}")]
    Internal(#[source] BoxError),

    /// 内部错误，仅固定文案。
    #[error("{0}")]
    Failed(Cow<'static, str>),
}

impl ImageError {
    pub fn rejected(cause: impl Into<BoxError>) -> Self {
        Self::Rejected(cause.into())
    }

    pub fn unavailable(cause: impl Into<BoxError>) -> Self {
        Self::ServiceUnavailable(cause.into())
    }

    pub fn internal(cause: impl Into<BoxError>) -> Self {
        Self::Internal(cause.into())
    }

    pub fn classification(&self) -> Classification {
        match self {
            Self::BadRequest | Self::Rejected(_) => Classification::BadRequest,
            Self::ServiceUnavailable(_) => Classification::ServiceUnavailable,
            Self::Internal(_) | Self::Failed(_) => Classification::Internal,
        }
    }

    /// 对应的 HTTP 状态码。
    pub fn status(&self) -> StatusCode {
        self.classification().status()
    }

    /// 稳定错误码，供请求层序列化。
    pub fn code(&self) -> &'static str {
        self.classification().code()
    }

    /// 被包装的底层原因；`BadRequest` 与 `Failed` 不携带原因。
    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Rejected(cause) | Self::ServiceUnavailable(cause) | Self::Internal(cause) => {
                Some(cause.as_ref())
            }
            Self::BadRequest | Self::Failed(_) => None,
        }
    }
}

impl From<ImageError> for String {
    fn from(error: ImageError) -> Self {
        error.to_string()
    }
}

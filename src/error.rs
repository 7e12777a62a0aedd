//! 统一错误类型模块
//!
//! # 设计思路
//!
//! `ImageError` 负责校验链路内部的分级；`AppError` 在其之上汇总设置加载、
//! 文件读写与抽帧等外围错误，供二进制入口与请求层统一输出。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `ImageError` / IO / 抽帧错误提供 `From` 转换，无需手动 map。
//! - `Serialize` 输出 `ErrorResponse` 结构（状态码 + 错误码 + 文案）。

use serde::Serialize;

use crate::frames::FrameExtractError;
use crate::image_handler::ImageError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 图片校验链路错误（已分级）
    #[error("{0}")]
    Image(#[from] ImageError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 设置文件不可用或格式错误
    #[error("设置错误: {0}")]
    Settings(String),

    /// 外部转码失败
    #[error("抽帧失败: {0}")]
    Frames(#[from] FrameExtractError),
}

/// 面向请求层的错误结构。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub code: &'static str,
    pub message: String,
}

impl From<&ImageError> for ErrorResponse {
    fn from(error: &ImageError) -> Self {
        Self {
            status: error.status().as_u16(),
            code: error.code(),
            message: error.to_string(),
        }
    }
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        match error {
            AppError::Image(image) => image.into(),
            other => Self {
                status: 500,
                code: "internal",
                message: other.to_string(),
            },
        }
    }
}

/// 序列化为 `ErrorResponse`。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        ErrorResponse::from(self).serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_errors_keep_their_status() {
        let err = AppError::from(ImageError::BadRequest);
        let json = serde_json::to_value(&err).expect("serialize");

        assert_eq!(json["status"], 400);
        assert_eq!(json["code"], "bad_request");
    }

    #[test]
    fn peripheral_errors_are_internal() {
        let err = AppError::Settings("missing".to_string());
        let response = ErrorResponse::from(&err);

        assert_eq!(response.status, 500);
        assert_eq!(response.code, "internal");
        assert_eq!(response.message, "设置错误: missing");
    }
}

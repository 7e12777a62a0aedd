//! # 配置模块
//!
//! ## 设计思路
//!
//! 将部署级参数集中到 `ImageConfig`：上传目录、JPEG 质量、网络超时与外部转码程序。
//! 上传目录属于部署配置而非单次请求参数；为空时本地文件来源整体禁用。
//!
//! ## 实现思路
//!
//! - `Default` 与参考编码器的默认行为一致（质量 75、无超时、最多 10 次重定向）。
//! - 通过 serde 反序列化，缺省字段回落到默认值。
//! - `validate` 在加载与运行时更新时统一校验。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ImageError;

/// 默认 JPEG 质量（与标准库编码器缺省一致）。
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// 图片校验配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// 本地上传目录；为空时拒绝本地文件来源。
    pub uploads_root: Option<PathBuf>,
    /// 是否拒绝包含 `..` 的本地路径。
    pub contain_uploads: bool,
    /// 规范化输出的 JPEG 质量（1~100）。
    pub jpeg_quality: u8,
    /// 远端下载总超时（秒）；未设置时不限制。
    pub download_timeout_secs: Option<u64>,
    /// 建立连接超时（秒）；未设置时不限制。
    pub connect_timeout_secs: Option<u64>,
    /// 最大重定向次数。
    pub max_redirects: usize,
    /// 抽帧使用的转码程序。
    pub ffmpeg_binary: PathBuf,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            uploads_root: None,
            contain_uploads: true,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            download_timeout_secs: None,
            connect_timeout_secs: None,
            max_redirects: 10,
            ffmpeg_binary: PathBuf::from("ffmpeg"),
        }
    }
}

impl ImageConfig {
    /// 以指定上传目录创建配置。
    pub fn with_uploads_root(root: impl Into<PathBuf>) -> Self {
        Self {
            uploads_root: Some(root.into()),
            ..Self::default()
        }
    }

    /// 非空的上传目录；空字符串视为未配置。
    pub fn uploads_root(&self) -> Option<&Path> {
        self.uploads_root
            .as_deref()
            .filter(|root| !root.as_os_str().is_empty())
    }

    pub fn validate(&self) -> Result<(), ImageError> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ImageError::internal(format!(
                "jpeg_quality 必须在 1~100 之间（当前：{}）",
                self.jpeg_quality
            )));
        }
        if self.ffmpeg_binary.as_os_str().is_empty() {
            return Err(ImageError::internal("ffmpeg_binary 不能为空"));
        }
        Ok(())
    }
}

//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入语义”和“流水线中间结果”解耦：
//! - `ImageReference` 表示单次请求的图片引用及其校验结果
//! - `SourceKind` 表示来源分类（远端 / 内联 / 本地 / 无法识别），由单一函数产出
//! - `RawImageData` 表示已获取但未解码的字节或文件流
//!
//! 分类只看 scheme 前缀（以及是否配置了上传目录），不会混用。

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use bytes::Bytes;
use serde::Deserialize;
use url::{ParseError, Url};

use super::pipeline::jpeg_to_data_url;
use super::raster::DecodedRaster;
use super::registry::DecodeError;
use super::ImageError;

/// 来源分类。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// `http` / `https` 等以 `http` 开头的 scheme。
    Remote(Url),
    /// `data:` 内联数据。
    Inline,
    /// 上传目录下的相对路径。
    Local,
    /// 无法识别且未配置上传目录。
    Unrecognized,
}

/// 对来源字符串分类。
///
/// 无 scheme 的相对引用不算解析失败，会落入本地 / 无法识别分支；
/// 其余 URL 解析错误一律视为请求无效。
pub fn classify_source(source: &str, uploads_root: Option<&Path>) -> Result<SourceKind, ImageError> {
    match Url::parse(source) {
        Ok(url) if url.scheme().starts_with("http") => return Ok(SourceKind::Remote(url)),
        Ok(url) if url.scheme().starts_with("data") => return Ok(SourceKind::Inline),
        Ok(_) | Err(ParseError::RelativeUrlWithoutBase) => {}
        Err(e) => {
            log::debug!("来源 URI 解析失败：{}", e);
            return Err(ImageError::BadRequest);
        }
    }

    match uploads_root {
        Some(root) if !root.as_os_str().is_empty() => Ok(SourceKind::Local),
        _ => Ok(SourceKind::Unrecognized),
    }
}

/// 字节来源，决定解码失败的分级。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SourceOrigin {
    Remote,
    Inline,
    Local,
}

impl SourceOrigin {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "url",
            Self::Inline => "data-url",
            Self::Local => "file",
        }
    }

    /// 远端内容视为不可信输入（400）；内联与本地内容解码失败视为内部错误（500）。
    pub(crate) fn decode_failure(self, error: DecodeError) -> ImageError {
        match self {
            Self::Remote => ImageError::rejected(error),
            Self::Inline | Self::Local => ImageError::internal(error),
        }
    }
}

/// 待解码的原始数据。
pub(crate) enum RawPayload {
    Bytes(Bytes),
    /// 已打开的本地文件；解码结束即关闭。
    File(BufReader<File>),
}

/// 获取阶段输出。
pub(crate) struct RawImageData {
    pub(crate) payload: RawPayload,
    pub(crate) origin: SourceOrigin,
}

/// 校验成功后的结果：栅格与其规范化 JPEG 编码总是同时存在。
#[derive(Clone)]
pub struct ValidatedImage {
    raster: DecodedRaster,
    canonical_bytes: Vec<u8>,
}

impl ValidatedImage {
    pub(crate) fn new(raster: DecodedRaster, canonical_bytes: Vec<u8>) -> Self {
        Self {
            raster,
            canonical_bytes,
        }
    }

    pub fn raster(&self) -> &DecodedRaster {
        &self.raster
    }

    pub fn canonical_bytes(&self) -> &[u8] {
        &self.canonical_bytes
    }

    pub fn into_parts(self) -> (DecodedRaster, Vec<u8>) {
        (self.raster, self.canonical_bytes)
    }
}

impl fmt::Debug for ValidatedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let image = self.raster.image();
        f.debug_struct("ValidatedImage")
            .field("width", &image.width())
            .field("height", &image.height())
            .field("canonical_len", &self.canonical_bytes.len())
            .finish()
    }
}

/// 单次请求的图片引用。
///
/// 请求体字段为 `src`；校验结果不参与序列化。
#[derive(Debug, Clone, Deserialize)]
pub struct ImageReference {
    #[serde(rename = "src")]
    pub source: String,
    #[serde(skip)]
    validated: Option<ValidatedImage>,
}

impl ImageReference {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            validated: None,
        }
    }

    /// 从请求体 JSON 解析；`src` 缺失或为空视为请求无效。
    pub fn from_json(body: &str) -> Result<Self, ImageError> {
        let reference: Self = serde_json::from_str(body).map_err(|e| {
            if e.is_data() {
                log::debug!("请求体缺少有效的 src 字段：{}", e);
                ImageError::BadRequest
            } else {
                ImageError::rejected(e)
            }
        })?;

        if reference.source.trim().is_empty() {
            return Err(ImageError::BadRequest);
        }

        Ok(reference)
    }

    pub fn raster(&self) -> Option<&DecodedRaster> {
        self.validated.as_ref().map(ValidatedImage::raster)
    }

    pub fn canonical_bytes(&self) -> Option<&[u8]> {
        self.validated.as_ref().map(ValidatedImage::canonical_bytes)
    }

    pub fn is_validated(&self) -> bool {
        self.validated.is_some()
    }

    /// 规范化 JPEG 的 Data URL 形式。
    pub fn to_data_url(&self) -> Option<String> {
        self.canonical_bytes().map(jpeg_to_data_url)
    }

    pub fn into_validated(self) -> Option<ValidatedImage> {
        self.validated
    }

    pub(crate) fn set_validated(&mut self, validated: ValidatedImage) {
        self.validated = Some(validated);
    }

    pub(crate) fn clear_validated(&mut self) {
        self.validated = None;
    }
}

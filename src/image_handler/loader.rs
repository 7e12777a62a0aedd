//! # 获取模块
//!
//! ## 设计思路
//!
//! 按来源分类获取原始数据，并在检测点直接完成错误分级：
//! - 远端：传输失败 503；状态码 ≥ 400 为 400（不附带原因）；响应体读取失败按远端解码失败处理（400）
//! - 内联：RFC 2397 Data URL，格式错误 400（附带原因）
//! - 本地：上传目录下的相对路径，打开失败 500（附带 IO 原因）
//!
//! ## 实现思路
//!
//! - 单次请求、无重试、无缓存；超时与重定向上限来自配置快照。
//! - 本地路径按分量拼接：根分量与 `.` 被忽略，`..` 在开启 `contain_uploads` 时直接拒绝。
//! - 日志中的 URL 只保留 scheme / host / port / path。

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use url::Url;

use super::source::{RawImageData, RawPayload, SourceOrigin};
use super::{ImageConfig, ImageError, ImageHandler};

/// 内联数据解析错误。
#[derive(Debug, thiserror::Error)]
pub enum DataUrlError {
    #[error("不是 data: URL")]
    MissingScheme,

    #[error("Data URL 缺少 ',' 分隔符")]
    MissingComma,

    #[error("Base64 解码失败：{0}")]
    Base64(#[from] base64::DecodeError),
}

/// 解析后的 Data URL。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// 声明的媒体类型（仅用于日志，解码时不参考）。
    pub media_type: String,
    pub data: Vec<u8>,
}

/// 按 RFC 2397 解析 `data:[<mediatype>][;base64],<data>`。
pub fn parse_data_url(input: &str) -> Result<DataUrl, DataUrlError> {
    let trimmed = input.trim();
    let rest = trimmed
        .get(..5)
        .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
        .map(|_| &trimmed[5..])
        .ok_or(DataUrlError::MissingScheme)?;

    let (header, payload) = rest.split_once(',').ok_or(DataUrlError::MissingComma)?;

    let (media_type, is_base64) = match header.rsplit_once(';') {
        Some((media_type, flag)) if flag.trim().eq_ignore_ascii_case("base64") => (media_type, true),
        _ => (header, false),
    };
    let media_type = if media_type.trim().is_empty() {
        "text/plain;charset=US-ASCII".to_string()
    } else {
        media_type.trim().to_string()
    };

    let unescaped = urlencoding::decode_binary(payload.as_bytes());
    let data = if is_base64 {
        let compact: Vec<u8> = unescaped
            .iter()
            .copied()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        general_purpose::STANDARD.decode(compact)?
    } else {
        unescaped.into_owned()
    };

    Ok(DataUrl { media_type, data })
}

/// 将来源路径拼接到上传目录下。
///
/// 根分量与 `.` 被忽略；`contain` 为真时遇到 `..` 直接拒绝。
pub fn resolve_upload_path(root: &Path, source: &str, contain: bool) -> io::Result<PathBuf> {
    let mut path = root.to_path_buf();

    for component in Path::new(source).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir if contain => {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    format!("路径越界：{}", source),
                ));
            }
            Component::ParentDir => path.push(".."),
        }
    }

    Ok(path)
}

impl ImageHandler {
    /// 从远端地址获取图片字节。
    pub(crate) async fn load_from_url(
        &self,
        url: &Url,
        config: &ImageConfig,
    ) -> Result<RawImageData, ImageError> {
        log::info!("🌐 开始下载图片 - URL: {}", redact_url_for_log(url));

        let client = build_http_client(config)?;
        log::debug!("📡 发送 HTTP 请求...");

        let response = client.get(url.clone()).send().await.map_err(|e| {
            log::warn!("⚠️ 网络请求失败 - URL: {} 错误: {}", redact_url_for_log(url), e);
            ImageError::unavailable(e.without_url())
        })?;

        let status = response.status();
        if status.as_u16() >= 400 {
            log::warn!(
                "⚠️ 上游返回 HTTP {} - URL: {}",
                status.as_u16(),
                redact_url_for_log(url)
            );
            return Err(ImageError::BadRequest);
        }

        let bytes: Bytes = response.bytes().await.map_err(|e| {
            log::warn!("⚠️ 响应体读取失败：{}", e);
            ImageError::rejected(e.without_url())
        })?;
        log::debug!("✅ 下载完成 - {} bytes", bytes.len());

        Ok(RawImageData {
            payload: RawPayload::Bytes(bytes),
            origin: SourceOrigin::Remote,
        })
    }

    /// 从 Data URL 获取图片字节。
    pub(crate) fn load_from_data_url(&self, source: &str) -> Result<RawImageData, ImageError> {
        log::info!("📝 开始处理 Data URL 图片");

        let parsed = parse_data_url(source).map_err(|e| {
            log::warn!("⚠️ Data URL 解析失败：{}", e);
            ImageError::rejected(e)
        })?;
        log::debug!(
            "📝 Data URL 声明类型: {} 数据: {} bytes",
            parsed.media_type,
            parsed.data.len()
        );

        Ok(RawImageData {
            payload: RawPayload::Bytes(Bytes::from(parsed.data)),
            origin: SourceOrigin::Inline,
        })
    }

    /// 打开上传目录下的本地文件。
    pub(crate) fn load_from_uploads(
        &self,
        root: &Path,
        source: &str,
        config: &ImageConfig,
    ) -> Result<RawImageData, ImageError> {
        let path = resolve_upload_path(root, source, config.contain_uploads).map_err(|e| {
            log::warn!("⚠️ 拒绝越界路径 - 来源: {}", source);
            ImageError::internal(e)
        })?;
        log::info!("📁 开始读取本地图片 - 路径: {}", path.display());

        let file = File::open(&path).map_err(|e| {
            log::warn!("⚠️ 无法打开图片文件 - 路径: {} 错误: {}", path.display(), e);
            ImageError::internal(e)
        })?;

        Ok(RawImageData {
            payload: RawPayload::File(BufReader::new(file)),
            origin: SourceOrigin::Local,
        })
    }
}

fn build_http_client(config: &ImageConfig) -> Result<reqwest::Client, ImageError> {
    let mut builder =
        reqwest::Client::builder().redirect(reqwest::redirect::Policy::limited(config.max_redirects));

    if let Some(secs) = config.download_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = config.connect_timeout_secs {
        builder = builder.connect_timeout(Duration::from_secs(secs));
    }

    builder.build().map_err(|e| {
        log::error!("❌ 无法创建 HTTP 客户端：{}", e);
        ImageError::internal(e)
    })
}

pub(crate) fn redact_url_for_log(url: &Url) -> String {
    let host = url.host_str().unwrap_or("<unknown-host>");
    let port = url.port().map(|p| format!(":{}", p)).unwrap_or_default();

    format!("{}://{}{}{}", url.scheme(), host, port, url.path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_data_url_decodes_base64_payload() {
        let parsed = parse_data_url("data:image/png;base64,aGVs bG8=").expect("parse");
        assert_eq!(parsed.media_type, "image/png");
        assert_eq!(parsed.data, b"hello");
    }

    #[test]
    fn parse_data_url_decodes_percent_payload() {
        let parsed = parse_data_url("data:,a%20b%00").expect("parse");
        assert_eq!(parsed.media_type, "text/plain;charset=US-ASCII");
        assert_eq!(parsed.data, b"a b\0");
    }

    #[test]
    fn parse_data_url_rejects_malformed_input() {
        assert!(matches!(
            parse_data_url("data:image/png;base64"),
            Err(DataUrlError::MissingComma)
        ));
        assert!(matches!(
            parse_data_url("data:image/png;base64,@@@"),
            Err(DataUrlError::Base64(_))
        ));
        assert!(matches!(
            parse_data_url("https://example.com"),
            Err(DataUrlError::MissingScheme)
        ));
    }

    #[test]
    fn resolve_upload_path_joins_under_root() {
        let root = Path::new("/srv/uploads");

        assert_eq!(
            resolve_upload_path(root, "a/b.png", true).expect("join"),
            PathBuf::from("/srv/uploads/a/b.png")
        );
        assert_eq!(
            resolve_upload_path(root, "/a/./b.png", true).expect("join"),
            PathBuf::from("/srv/uploads/a/b.png")
        );
    }

    #[test]
    fn resolve_upload_path_guards_parent_segments() {
        let root = Path::new("/srv/uploads");

        let err = resolve_upload_path(root, "../../etc/passwd", true).expect_err("must reject");
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);

        assert_eq!(
            resolve_upload_path(root, "../../etc/passwd", false).expect("unguarded join"),
            PathBuf::from("/srv/uploads/../../etc/passwd")
        );
    }

    #[test]
    fn redact_url_for_log_removes_query_and_fragment() {
        let url = Url::parse("https://example.com:8443/path/img.png?token=abc123#hash").expect("url");
        assert_eq!(redact_url_for_log(&url), "https://example.com:8443/path/img.png");
    }

    #[test]
    fn load_from_data_url_classifies_bad_payload_as_bad_request() {
        let handler = ImageHandler::new(ImageConfig::default()).expect("handler init failed");

        let result = handler.load_from_data_url("data:image/png;base64,%%%");
        assert!(matches!(result, Err(ImageError::Rejected(_))));
    }

    #[test]
    fn load_from_uploads_missing_file_is_internal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let handler = ImageHandler::new(ImageConfig::default()).expect("handler init failed");

        let result = handler.load_from_uploads(dir.path(), "missing.png", &ImageConfig::default());
        match result {
            Err(ImageError::Internal(cause)) => {
                let io_err = cause.downcast_ref::<io::Error>().expect("io cause");
                assert_eq!(io_err.kind(), io::ErrorKind::NotFound);
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("missing file must not load"),
        }
    }
}

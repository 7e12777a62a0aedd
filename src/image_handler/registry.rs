//! # 格式注册表
//!
//! ## 设计思路
//!
//! 区分两类“格式列表”：
//! - `IMAGE_MIME_TYPES`：对外声明可接受的输入类型（静态只读数据）
//! - `DecoderRegistry`：解码器实际具备的能力，显式构造并注入处理器
//!
//! 解码能力可以多于对外声明的类型；AVIF / SVG 常量保留但暂不对外声明。
//!
//! ## 实现思路
//!
//! 通过 `infer` 按文件签名嗅探 MIME，再在注册表中查找对应的 `ImageFormat`，
//! 不依赖来源声明的 Content-Type 或 Data URL 媒体类型。

use std::io::{BufRead, Cursor, Seek};

use image::{DynamicImage, ImageFormat, ImageReader};

pub const IMAGE_APNG: &str = "image/apng";
pub const IMAGE_AVIF: &str = "image/avif";
pub const IMAGE_GIF: &str = "image/gif";
pub const IMAGE_JPEG: &str = "image/jpeg";
pub const IMAGE_PNG: &str = "image/png";
pub const IMAGE_SVGXML: &str = "image/svg+xml";
pub const IMAGE_WEBP: &str = "image/webp";

/// 对外声明的可接受类型（展示顺序）。
///
/// `IMAGE_AVIF` 与 `IMAGE_SVGXML` 待稳定后再加入。
pub const IMAGE_MIME_TYPES: &[&str] = &[IMAGE_APNG, IMAGE_GIF, IMAGE_JPEG, IMAGE_PNG, IMAGE_WEBP];

/// 是否为对外声明的类型。
pub fn is_advertised(mime: &str) -> bool {
    IMAGE_MIME_TYPES
        .iter()
        .any(|advertised| advertised.eq_ignore_ascii_case(mime.trim()))
}

/// 解码阶段错误。
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("图片内容为空")]
    Empty,

    #[error("无法识别图片类型")]
    Unrecognized,

    #[error("不支持的图片类型：{0}")]
    Unsupported(&'static str),

    #[error("图片读取失败：{0}")]
    Io(#[from] std::io::Error),

    #[error("图片解码失败：{0}")]
    Image(#[from] image::ImageError),
}

/// 签名探测所需的最大前缀长度。
const SNIFF_PROBE_BYTES: usize = 8192;

/// 解码器注册表。
///
/// 每一项为“嗅探到的 MIME → 解码格式”。
#[derive(Debug, Clone)]
pub struct DecoderRegistry {
    codecs: Vec<(&'static str, ImageFormat)>,
}

impl Default for DecoderRegistry {
    /// PNG（含 APNG 首帧）、JPEG、GIF、WEBP。
    fn default() -> Self {
        Self::empty()
            .with_codec(IMAGE_PNG, ImageFormat::Png)
            .with_codec(IMAGE_APNG, ImageFormat::Png)
            .with_codec(IMAGE_JPEG, ImageFormat::Jpeg)
            .with_codec(IMAGE_GIF, ImageFormat::Gif)
            .with_codec(IMAGE_WEBP, ImageFormat::WebP)
    }
}

impl DecoderRegistry {
    pub fn empty() -> Self {
        Self { codecs: Vec::new() }
    }

    pub fn with_codec(mut self, mime: &'static str, format: ImageFormat) -> Self {
        self.codecs.retain(|(existing, _)| *existing != mime);
        self.codecs.push((mime, format));
        self
    }

    fn format_for(&self, mime: &str) -> Option<ImageFormat> {
        self.codecs
            .iter()
            .find(|(registered, _)| registered.eq_ignore_ascii_case(mime))
            .map(|(_, format)| *format)
    }

    /// 按内容嗅探格式。
    pub fn sniff(&self, header: &[u8]) -> Result<ImageFormat, DecodeError> {
        if header.is_empty() {
            return Err(DecodeError::Empty);
        }

        let kind = infer::get(header).ok_or(DecodeError::Unrecognized)?;
        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(DecodeError::Unsupported(kind.mime_type()));
        }

        self.format_for(kind.mime_type())
            .ok_or(DecodeError::Unsupported(kind.mime_type()))
    }

    /// 解码内存中的完整字节。
    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
        self.decode_reader(Cursor::new(bytes))
    }

    /// 解码可回溯的字节流；读取器在返回时释放。
    pub fn decode_reader<R: BufRead + Seek>(&self, mut reader: R) -> Result<DynamicImage, DecodeError> {
        let header = reader.fill_buf()?;
        let header = &header[..header.len().min(SNIFF_PROBE_BYTES)];
        let format = self.sniff(header)?;

        let decoded = ImageReader::with_format(reader, format).decode()?;
        Ok(decoded)
    }
}

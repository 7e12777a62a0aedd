//! # 解码与重新编码流水线
//!
//! ## 设计思路
//!
//! 将“原始数据 → 栅格 → 规范化 JPEG”集中管理：
//! 1. 按内容嗅探格式并解码（不看来源声明的类型）
//! 2. 解码失败按来源分级（远端 400，内联 / 本地 500）
//! 3. 统一重新编码为基线 JPEG，失败一律 500
//!
//! ## 实现思路
//!
//! 本地文件以 `BufReader<File>` 形式进入解码；解码函数按值接收读取器，
//! 返回时文件句柄随之释放，成功与失败路径一致。

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose};
use image::codecs::jpeg::JpegEncoder;

use super::raster::{DecodedRaster, Raster};
use super::source::{RawImageData, RawPayload};
use super::{ImageError, ImageHandler};

const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

impl ImageHandler {
    /// 将获取阶段的原始数据解码为栅格。
    pub(crate) fn decode_raw(&self, raw: RawImageData) -> Result<DecodedRaster, ImageError> {
        let origin = raw.origin;
        let decoded = match raw.payload {
            RawPayload::Bytes(bytes) => self.registry.decode_bytes(&bytes),
            RawPayload::File(reader) => self.registry.decode_reader(reader),
        }
        .map_err(|e| {
            log::warn!("⚠️ 图片解码失败 - 来源: {} 错误: {}", origin.as_str(), e);
            origin.decode_failure(e)
        })?;

        log::info!(
            "✅ 图片解码成功 - 来源: {} 尺寸: {}x{}",
            origin.as_str(),
            decoded.width(),
            decoded.height()
        );

        Ok(DecodedRaster::new(decoded))
    }
}

/// 将任意栅格编码为基线 JPEG。
///
/// 透明像素按预乘 alpha 合成到黑色背景；相同输入与质量参数产出的字节完全一致。
pub fn encode_to_jpeg(raster: &dyn Raster, quality: u8) -> Result<Vec<u8>, ImageError> {
    let rgb = raster.to_rgb8();
    let mut buffer = Cursor::new(Vec::new());

    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode_image(&rgb)
        .map_err(|e| {
            log::error!("❌ JPEG 编码失败：{}", e);
            ImageError::internal(e)
        })?;

    Ok(buffer.into_inner())
}

/// 规范化 JPEG 字节转为 Data URL（标准 base64 字母表，保留填充，不换行）。
pub fn jpeg_to_data_url(payload: &[u8]) -> String {
    let encoded = general_purpose::STANDARD.encode(payload);
    let mut url = String::with_capacity(JPEG_DATA_URL_PREFIX.len() + encoded.len());
    url.push_str(JPEG_DATA_URL_PREFIX);
    url.push_str(&encoded);
    url
}

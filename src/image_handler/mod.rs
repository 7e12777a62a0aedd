//! # 图片引用校验模块（image_handler）
//!
//! ## 设计思路
//!
//! 该模块将“来源分类 → 获取 → 解码 → 规范化编码 → 裁剪”按职责拆分为多个子模块，
//! 避免单文件膨胀与耦合。
//!
//! - `handler`：编排整条校验流水线
//! - `source`：来源分类与中间数据模型（`ImageReference` / `SourceKind`）
//! - `loader`：远端下载、Data URL 解析、上传目录文件打开
//! - `registry`：对外声明的格式列表与显式构造的解码器注册表
//! - `pipeline`：解码分级、JPEG 重新编码、Data URL 输出
//! - `raster` / `crop`：栅格表示、区域提取能力与裁剪
//! - `config/error`：配置与错误分级
//!
//! ## 新同事快速上手
//!
//! ```text
//! 请求层（不在本 crate 内）
//!    ↓
//! handler.rs（配置快照 + 阶段耗时日志）
//!    ├─ source.rs（classify_source：Remote / Inline / Local / Unrecognized）
//!    ├─ loader.rs（获取原始数据，按检测点分级）
//!    ├─ pipeline.rs（registry 嗅探解码 → 基线 JPEG）
//!    ↓
//! ImageReference（栅格 + 规范化字节）
//!    ↓
//! crop.rs（可选：按区域提取能力裁剪）
//! ```
//!
//! ## 分层职责建议
//!
//! - 新增可解码格式优先改 `registry.rs`（`DecoderRegistry::default`）
//! - 对外声明的格式列表只改 `IMAGE_MIME_TYPES`
//! - 错误分级变更优先改 `error.rs` 与对应检测点
//! - 流程顺序变更优先改 `handler.rs`

mod config;
mod crop;
mod error;
mod handler;
mod loader;
mod pipeline;
mod raster;
mod registry;
mod source;

pub use config::{DEFAULT_JPEG_QUALITY, ImageConfig};
pub use crop::crop_image;
pub use error::{BoxError, CROP_FAILED_MESSAGE, Classification, ImageError};
pub use handler::ImageHandler;
pub use loader::{DataUrl, DataUrlError, parse_data_url, resolve_upload_path};
pub use pipeline::{encode_to_jpeg, jpeg_to_data_url};
pub use raster::{CropRegion, DecodedRaster, Raster, RegionExtractable, UniformRaster};
pub use registry::{
    DecodeError, DecoderRegistry, IMAGE_APNG, IMAGE_AVIF, IMAGE_GIF, IMAGE_JPEG, IMAGE_MIME_TYPES,
    IMAGE_PNG, IMAGE_SVGXML, IMAGE_WEBP, is_advertised,
};
pub use source::{ImageReference, SourceKind, ValidatedImage, classify_source};

//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `ImageHandler` 只负责流程编排与配置管理，不绑定任何请求框架。
//! 校验链路固定为：
//! 1. 读取配置快照
//! 2. 对来源分类（远端 / 内联 / 本地 / 无法识别）
//! 3. 获取原始数据
//! 4. 解码为栅格
//! 5. 重新编码为基线 JPEG
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<ImageConfig>>` 支持运行时调整。
//! - 单次请求内使用“同一配置快照”，避免处理中途配置漂移。
//! - 解码能力由显式构造的 `DecoderRegistry` 提供，不依赖全局注册。
//! - 任一阶段失败立即返回，不重试、不回退；失败时引用上不残留任何部分结果。
//! - 记录 `load/decode/encode/total` 阶段耗时，便于性能诊断。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::pipeline::encode_to_jpeg;
use super::registry::DecoderRegistry;
use super::source::{SourceKind, ValidatedImage, classify_source};
use super::{ImageConfig, ImageError, ImageReference};

/// 图片校验处理器。
pub struct ImageHandler {
    pub(super) config: Arc<RwLock<ImageConfig>>,
    pub(super) registry: DecoderRegistry,
}

impl ImageHandler {
    /// 使用默认解码器注册表创建处理器。
    ///
    /// # 示例
    /// ```rust,ignore
    /// use imgin::image_handler::{ImageConfig, ImageHandler};
    ///
    /// let handler = ImageHandler::new(ImageConfig::with_uploads_root("/srv/uploads"))?;
    /// # Ok::<(), imgin::image_handler::ImageError>(())
    /// ```
    pub fn new(config: ImageConfig) -> Result<Self, ImageError> {
        Self::with_registry(config, DecoderRegistry::default())
    }

    /// 使用自定义解码器注册表创建处理器。
    pub fn with_registry(config: ImageConfig, registry: DecoderRegistry) -> Result<Self, ImageError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            registry,
        })
    }

    /// 获取配置快照。
    pub fn config_snapshot(&self) -> Result<ImageConfig, ImageError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| ImageError::internal("配置读取锁已中毒"))
    }

    /// 在写锁内修改配置；修改结果不合法时保持原配置。
    pub fn update_config<F>(&self, update: F) -> Result<(), ImageError>
    where
        F: FnOnce(&mut ImageConfig),
    {
        let mut config = self
            .config
            .write()
            .map_err(|_| ImageError::internal("配置写入锁已中毒"))?;

        let mut next = config.clone();
        update(&mut next);
        next.validate()?;
        *config = next;

        log::info!(
            "⚙️ 已更新图片配置（uploads_root={:?}, contain_uploads={}, jpeg_quality={}）",
            config.uploads_root,
            config.contain_uploads,
            config.jpeg_quality
        );
        Ok(())
    }

    /// 校验主入口：解析来源、获取、解码并重新编码。
    ///
    /// 成功时引用上同时写入栅格与规范化字节；失败时两者都不存在。
    ///
    /// # 示例
    /// ```rust,ignore
    /// use imgin::image_handler::{ImageConfig, ImageHandler, ImageReference};
    ///
    /// # async fn demo() -> Result<(), imgin::image_handler::ImageError> {
    /// let handler = ImageHandler::new(ImageConfig::default())?;
    /// let mut reference = ImageReference::new("https://example.com/a.png");
    /// handler.validate(&mut reference).await?;
    /// assert!(reference.canonical_bytes().is_some());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn validate(&self, reference: &mut ImageReference) -> Result<(), ImageError> {
        reference.clear_validated();

        let config = self.config_snapshot()?;
        let total_start = Instant::now();

        let kind = classify_source(&reference.source, config.uploads_root())?;

        let load_start = Instant::now();
        let raw = match &kind {
            SourceKind::Remote(url) => self.load_from_url(url, &config).await?,
            SourceKind::Inline => self.load_from_data_url(&reference.source)?,
            SourceKind::Local => {
                let Some(root) = config.uploads_root() else {
                    return Err(ImageError::BadRequest);
                };
                self.load_from_uploads(root, &reference.source, &config)?
            }
            SourceKind::Unrecognized => {
                log::warn!("⚠️ 无法识别的图片来源，且未配置上传目录");
                return Err(ImageError::BadRequest);
            }
        };
        let load_elapsed = load_start.elapsed();

        let decode_start = Instant::now();
        let raster = self.decode_raw(raw)?;
        let decode_elapsed = decode_start.elapsed();

        let encode_start = Instant::now();
        let canonical_bytes = encode_to_jpeg(&raster, config.jpeg_quality)?;
        let encode_elapsed = encode_start.elapsed();

        if let SourceKind::Remote(url) = kind {
            reference.source = url.to_string();
        }
        reference.set_validated(ValidatedImage::new(raster, canonical_bytes));

        log::info!(
            "✅ 图片校验完成 - load={}ms decode={}ms encode={}ms total={}ms",
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            encode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(())
    }

    /// 便捷入口：由来源字符串直接得到已校验的引用。
    pub async fn validate_source(&self, source: impl Into<String>) -> Result<ImageReference, ImageError> {
        let mut reference = ImageReference::new(source);
        self.validate(&mut reference).await?;
        Ok(reference)
    }
}

//! 部署设置加载
//!
//! 设置文件为 JSON，字段与 `ImageConfig` 一致，缺省字段使用默认值。

use std::fs;
use std::path::Path;

use crate::error::AppError;
use crate::image_handler::ImageConfig;

/// 读取并校验设置文件。
pub fn load_settings(path: &Path) -> Result<ImageConfig, AppError> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::Settings(format!("读取设置文件 '{}' 失败: {}", path.display(), e)))?;

    let config = serde_json::from_str::<ImageConfig>(&content)
        .map_err(|e| AppError::Settings(format!("解析设置文件失败: {}", e)))?;

    config.validate()?;
    log::info!("⚙️ 已加载设置文件: {}", path.display());
    Ok(config)
}

/// 将生效配置输出为设置文件格式（格式化 JSON）。
pub fn render_settings(config: &ImageConfig) -> Result<String, AppError> {
    serde_json::to_string_pretty(config)
        .map_err(|e| AppError::Settings(format!("序列化设置失败: {}", e)))
}

/// 有设置文件时读取，否则使用默认配置。
pub fn load_or_default(path: Option<&Path>) -> Result<ImageConfig, AppError> {
    match path {
        Some(path) => load_settings(path),
        None => Ok(ImageConfig::default()),
    }
}

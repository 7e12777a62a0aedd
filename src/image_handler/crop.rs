//! # 裁剪
//!
//! 只检查“是否具备区域提取能力”，边界处理完全交给能力实现本身。

use super::error::CROP_FAILED_MESSAGE;
use super::raster::{CropRegion, DecodedRaster, Raster};
use super::ImageError;

/// 按矩形裁剪栅格。
///
/// # 示例
/// ```rust,ignore
/// use imgin::image_handler::{crop_image, CropRegion};
///
/// let cropped = crop_image(reference.raster().unwrap(), CropRegion::new(0, 0, 64, 64))?;
/// ```
pub fn crop_image(raster: &dyn Raster, region: CropRegion) -> Result<DecodedRaster, ImageError> {
    let Some(extractable) = raster.as_region_extractable() else {
        log::warn!("✂️ 裁剪失败：当前栅格不支持区域提取");
        return Err(ImageError::Failed(CROP_FAILED_MESSAGE.into()));
    };

    let cropped = extractable.extract_region(region);
    log::debug!(
        "✂️ 裁剪完成 - 区域: {:?} 输出尺寸: {:?}",
        region,
        cropped.dimensions()
    );
    Ok(cropped)
}

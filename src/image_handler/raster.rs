//! # 栅格表示
//!
//! ## 设计思路
//!
//! 解码结果以 `Raster` trait 对外暴露，区域提取作为可选能力 `RegionExtractable`：
//! 具体表示要么提供该能力，要么不提供；裁剪方只查询能力，不判断具体类型。
//!
//! - `DecodedRaster`：解码得到的像素网格，支持区域提取
//! - `UniformRaster`：纯色填充，没有可提取的像素数据，不支持区域提取

use image::{DynamicImage, GenericImageView, Rgb, RgbImage, Rgba};

/// 裁剪矩形（左、上、右、下边界，右/下为开区间）。
///
/// 不做任何校验，越界行为由区域提取能力自身决定。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl CropRegion {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// 内存中的栅格图像。
pub trait Raster: Send + Sync {
    /// 宽高（像素）。
    fn dimensions(&self) -> (u32, u32);

    /// 转为 RGB8，作为重新编码的输入。
    fn to_rgb8(&self) -> RgbImage;

    /// 区域提取能力；默认不提供。
    fn as_region_extractable(&self) -> Option<&dyn RegionExtractable> {
        None
    }
}

/// 无需重新解码即可截取矩形子区域的能力。
pub trait RegionExtractable {
    fn extract_region(&self, region: CropRegion) -> DecodedRaster;
}

/// 解码得到的栅格。
#[derive(Debug, Clone)]
pub struct DecodedRaster {
    image: DynamicImage,
}

impl DecodedRaster {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

}

impl Raster for DecodedRaster {
    fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// 含透明通道时按预乘 alpha 合成到黑色背景。
    fn to_rgb8(&self) -> RgbImage {
        if !self.image.color().has_alpha() {
            return self.image.to_rgb8();
        }

        let rgba = self.image.to_rgba8();
        RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
            Rgb([premultiply(r, a), premultiply(g, a), premultiply(b, a)])
        })
    }

    fn as_region_extractable(&self) -> Option<&dyn RegionExtractable> {
        Some(self)
    }
}

impl RegionExtractable for DecodedRaster {
    /// 与图像边界求交；交集为空时得到 0×0 栅格。
    fn extract_region(&self, region: CropRegion) -> DecodedRaster {
        let (width, height) = self.image.dimensions();

        let left = i64::from(region.left).max(0);
        let top = i64::from(region.top).max(0);
        let right = i64::from(region.right).min(i64::from(width));
        let bottom = i64::from(region.bottom).min(i64::from(height));

        if right <= left || bottom <= top {
            return DecodedRaster::new(self.image.crop_imm(0, 0, 0, 0));
        }

        DecodedRaster::new(self.image.crop_imm(
            left as u32,
            top as u32,
            (right - left) as u32,
            (bottom - top) as u32,
        ))
    }
}

fn premultiply(channel: u8, alpha: u8) -> u8 {
    ((u16::from(channel) * u16::from(alpha) + 127) / 255) as u8
}

/// 纯色栅格。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformRaster {
    pub width: u32,
    pub height: u32,
    pub color: Rgb<u8>,
}

impl UniformRaster {
    pub fn new(width: u32, height: u32, color: Rgb<u8>) -> Self {
        Self {
            width,
            height,
            color,
        }
    }
}

impl Raster for UniformRaster {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn to_rgb8(&self) -> RgbImage {
        RgbImage::from_pixel(self.width, self.height, self.color)
    }
}

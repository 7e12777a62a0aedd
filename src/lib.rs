//! # imgin：图片引用校验库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │            请求层（HTTP 框架 / CLI，不在核心内）          │
//! │        { "src": "..." }  →  ImageReference               │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↓ Result<(), ImageError>（400 / 503 / 500）
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↓            后端 (Rust)                           │
//! │                                                          │
//! │  ┌─ error ────── AppError / ErrorResponse                │
//! │  │                                                       │
//! │  ├─ image_handler  分类·获取·解码·JPEG·裁剪              │
//! │  │   ├─ registry      对外格式列表 + 解码器注册表        │
//! │  │   └─ raster/crop   区域提取能力                       │
//! │  │                                                       │
//! │  ├─ frames        ffmpeg 抽帧（外部进程边界）            │
//! │  └─ settings      部署设置（JSON）                       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，以及序列化用的 `ErrorResponse` |
//! | [`image_handler`] | 将 URL / Data URL / 上传路径规范化为栅格 + 基线 JPEG |
//! | [`frames`] | 调用外部转码程序按采样率抽帧 |
//! | [`settings`] | 读取部署级 `ImageConfig` |

pub mod error;
pub mod frames;
pub mod image_handler;
pub mod settings;

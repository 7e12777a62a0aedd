//! 视频抽帧（外部转码进程边界）
//!
//! # 设计思路
//!
//! 本 crate 不做任何视频解码，只通过窄接口 `FrameExtractor` 请求外部转码程序
//! 将视频按固定采样率拆成 `0001.jpeg`、`0002.jpeg`…… 的图片序列。
//!
//! # 实现思路
//!
//! - `FfmpegFrameExtractor` 以子进程方式调用 ffmpeg，参数固定：
//!   仅输出错误日志、`fps=<两位小数>` 滤镜、image2 序列输出、mjpeg 编码。
//! - 失败原样返回（无法启动 / 非零退出 + stderr），不做 HTTP 分级。

use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};

use tokio::process::Command;

/// 输出文件名模板（4 位、从 1 开始）。
pub const FRAME_FILE_PATTERN: &str = "%04d.jpeg";

/// 外部转码失败。
#[derive(Debug, thiserror::Error)]
pub enum FrameExtractError {
    #[error("无法启动转码程序：{0}")]
    Spawn(#[from] std::io::Error),

    #[error("转码程序退出码 {code:?}：{stderr}")]
    Exit { code: Option<i32>, stderr: String },
}

/// 抽帧接口：输入视频、输出目录、采样率 → 成功 / 失败。
pub trait FrameExtractor {
    fn extract_frames(
        &self,
        source: &Path,
        dest_dir: &Path,
        fps: f32,
    ) -> impl Future<Output = Result<(), FrameExtractError>> + Send;
}

/// 基于 ffmpeg 子进程的实现。
#[derive(Debug, Clone)]
pub struct FfmpegFrameExtractor {
    binary: PathBuf,
}

impl Default for FfmpegFrameExtractor {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegFrameExtractor {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// 完整命令行参数（不含程序名）。
    pub fn build_args(source: &Path, dest_dir: &Path, fps: f32) -> Vec<OsString> {
        vec![
            "-i".into(),
            source.as_os_str().to_owned(),
            "-f".into(),
            "image2".into(),
            "-v".into(),
            "error".into(),
            "-vcodec".into(),
            "mjpeg".into(),
            "-vf".into(),
            format!("fps={:.2}", fps).into(),
            dest_dir.join(FRAME_FILE_PATTERN).into_os_string(),
        ]
    }
}

impl FrameExtractor for FfmpegFrameExtractor {
    fn extract_frames(
        &self,
        source: &Path,
        dest_dir: &Path,
        fps: f32,
    ) -> impl Future<Output = Result<(), FrameExtractError>> + Send {
        let mut command = Command::new(&self.binary);
        command.args(Self::build_args(source, dest_dir, fps));
        let source = source.display().to_string();

        async move {
            log::info!("🎞️ 开始抽帧 - 输入: {} fps={:.2}", source, fps);

            let output = command.output().await?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                log::error!(
                    "❌ 抽帧失败 - 退出码: {:?} stderr: {}",
                    output.status.code(),
                    stderr
                );
                return Err(FrameExtractError::Exit {
                    code: output.status.code(),
                    stderr,
                });
            }

            log::info!("✅ 抽帧完成 - 输入: {}", source);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_follow_fixed_ffmpeg_invocation() {
        let args = FfmpegFrameExtractor::build_args(Path::new("in.mp4"), Path::new("/tmp/out"), 2.0);
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            args,
            vec![
                "-i",
                "in.mp4",
                "-f",
                "image2",
                "-v",
                "error",
                "-vcodec",
                "mjpeg",
                "-vf",
                "fps=2.00",
                "/tmp/out/%04d.jpeg",
            ]
        );
    }

    #[test]
    fn fps_is_formatted_with_two_decimals() {
        let args = FfmpegFrameExtractor::build_args(Path::new("a"), Path::new("b"), 0.333);
        assert!(args.iter().any(|a| a == "fps=0.33"));
    }

    #[tokio::test]
    async fn missing_binary_surfaces_spawn_error() {
        let extractor = FfmpegFrameExtractor::new("/nonexistent/imgin-ffmpeg");
        let result = extractor
            .extract_frames(Path::new("in.mp4"), Path::new("out"), 1.0)
            .await;

        assert!(matches!(result, Err(FrameExtractError::Spawn(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_surfaces_raw_failure() {
        let extractor = FfmpegFrameExtractor::new("false");
        let result = extractor
            .extract_frames(Path::new("in.mp4"), Path::new("out"), 1.0)
            .await;

        assert!(matches!(result, Err(FrameExtractError::Exit { code: Some(1), .. })));
    }
}

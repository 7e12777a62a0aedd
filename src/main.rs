//! # imgin：命令行入口
//!
//! 本文件仅负责日志初始化、参数解析与子命令分发。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use imgin::error::{AppError, ErrorResponse};
use imgin::frames::{FfmpegFrameExtractor, FrameExtractor};
use imgin::image_handler::{self, CropRegion, ImageHandler};
use imgin::settings;

#[derive(Debug, Parser)]
#[command(name = "imgin", version, about = "图片引用校验与规范化")]
struct Cli {
    /// 部署设置文件（JSON）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 校验图片来源并输出规范化 JPEG
    Validate {
        /// 远端 URL、data: URL 或上传目录下的相对路径
        src: String,
        /// 覆盖设置中的上传目录
        #[arg(long)]
        uploads_root: Option<PathBuf>,
        /// 裁剪区域：left,top,right,bottom
        #[arg(long, value_parser = parse_crop_region)]
        crop: Option<CropRegion>,
        /// 写入 JPEG 文件；未指定时输出 Data URL
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// 调用 ffmpeg 按采样率抽帧
    Frames {
        video: PathBuf,
        dest_dir: PathBuf,
        #[arg(long, default_value_t = 1.0)]
        fps: f32,
    },
    /// 列出对外声明的图片类型
    Formats,
    /// 输出生效配置（设置文件格式）
    Config,
}

fn parse_crop_region(value: &str) -> Result<CropRegion, String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("裁剪区域必须为整数: {}", e))?;

    match parts.as_slice() {
        [left, top, right, bottom] => Ok(CropRegion::new(*left, *top, *right, *bottom)),
        _ => Err("裁剪区域格式为 left,top,right,bottom".to_string()),
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = settings::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Command::Validate {
            src,
            uploads_root,
            crop,
            output,
        } => {
            if uploads_root.is_some() {
                config.uploads_root = uploads_root;
            }
            let quality = config.jpeg_quality;
            let handler = ImageHandler::new(config)?;
            let reference = handler.validate_source(src).await?;

            let validated = reference
                .into_validated()
                .ok_or(image_handler::ImageError::BadRequest)?;
            let jpeg = match crop {
                Some(region) => {
                    let cropped = image_handler::crop_image(validated.raster(), region)?;
                    image_handler::encode_to_jpeg(&cropped, quality)?
                }
                None => validated.into_parts().1,
            };

            match output {
                Some(path) => {
                    std::fs::write(&path, &jpeg)?;
                    log::info!("💾 已写入 {} ({} bytes)", path.display(), jpeg.len());
                }
                None => println!("{}", image_handler::jpeg_to_data_url(&jpeg)),
            }
        }
        Command::Frames {
            video,
            dest_dir,
            fps,
        } => {
            let extractor = FfmpegFrameExtractor::new(config.ffmpeg_binary);
            extractor.extract_frames(&video, &dest_dir, fps).await?;
        }
        Command::Config => println!("{}", settings::render_settings(&config)?),
        Command::Formats => {
            for mime in image_handler::IMAGE_MIME_TYPES {
                println!("{}", mime);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            let response = ErrorResponse::from(&err);
            match serde_json::to_string(&response) {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("{}", response.message),
            }
            ExitCode::FAILURE
        }
    }
}

// 该文件是 Arcade （冠脉狭窄检测） 项目的一部分。
// src/bin/simple_oneshot.rs - 单张图像推理测试代码
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use url::Url;

use arcade::{FromUrl, input, model::RknnClassifierBuilder, predict::Predictor};

/// Arcade 单张图像推理
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// RKNN 模型地址
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入图像路径
  #[arg(long, value_name = "IMAGE")]
  pub input: PathBuf,
  /// 重复推理次数，用于测量平均耗时
  #[arg(long, default_value = "1", value_name = "COUNT")]
  pub repeat: usize,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型地址: {}", args.model);
  info!("输入图像: {}", args.input.display());

  let model = RknnClassifierBuilder::from_url(&args.model)?.build()?;
  let predictor = Predictor::new(model);
  let frame = input::normalize_file(&args.input)?;

  info!("开始推理...");
  let mut times = Vec::with_capacity(args.repeat);
  let mut prediction = None;
  for i in 0..args.repeat.max(1) {
    let now = std::time::Instant::now();
    prediction = Some(predictor.predict_frame(&frame)?);
    let elapsed = now.elapsed();
    info!("({})推理完成，耗时: {:.2?}", i, elapsed);
    times.push(elapsed);
  }

  if times.len() > 1 {
    warn!(
      "平均推理时间: {:.2?}",
      times.iter().sum::<Duration>() / times.len() as u32
    );
  }

  if let Some(prediction) = prediction {
    println!("{}", serde_json::to_string_pretty(&prediction)?);
  }

  Ok(())
}

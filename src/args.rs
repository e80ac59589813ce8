// 该文件是 Arcade （冠脉狭窄检测） 项目的一部分。
// src/args.rs - 服务参数配置
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

use std::time::Duration;

use arcade::server::ServerConfig;
use clap::Parser;
use url::Url;

/// Arcade 狭窄检测服务参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// RKNN 模型地址，例如 rknn:///models/arcade_model.rknn?channels=1
  #[arg(
    long,
    env = "ARCADE_MODEL",
    default_value = "rknn:///models/arcade_model.rknn",
    value_name = "MODEL"
  )]
  pub model: Url,

  /// 监听地址
  #[arg(long, env = "ARCADE_HOST", default_value = "0.0.0.0")]
  pub host: String,

  /// 监听端口
  #[arg(short, long, env = "ARCADE_PORT", default_value = "8000")]
  pub port: u16,

  /// 上传文件大小上限（字节）
  #[arg(long, env = "ARCADE_MAX_UPLOAD_BYTES", default_value = "16777216")]
  pub max_upload_bytes: usize,

  /// 模拟重训练耗时（秒）
  #[arg(long, env = "ARCADE_RETRAIN_DELAY_SECS", default_value = "5")]
  pub retrain_delay_secs: u64,

  /// 日志过滤规则，RUST_LOG 优先
  #[arg(long, env = "ARCADE_LOG", default_value = "info,tower_http=debug")]
  pub log_level: String,
}

impl Args {
  pub fn server_config(&self) -> ServerConfig {
    ServerConfig {
      max_upload_bytes: self.max_upload_bytes,
      retrain_delay: Duration::from_secs(self.retrain_delay_secs),
      ..ServerConfig::default()
    }
  }
}

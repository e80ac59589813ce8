// 该文件是 Arcade （冠脉狭窄检测） 项目的一部分。
// src/task.rs - 后台任务
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

use std::{
  future::Future,
  sync::atomic::{AtomicU64, Ordering},
  time::Duration,
};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

pub trait BackgroundJob: Send + 'static {
  fn name(&self) -> &'static str;
  fn run(self) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// 已派发任务的凭据，仅用于日志
#[derive(Debug, Clone, Copy)]
pub struct JobTicket {
  pub id: u64,
  pub triggered_at: DateTime<Utc>,
}

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

/// 派发后即不再关心：不等待完成，也不回传结果
///
/// 必须在 tokio 运行时内调用。
pub fn dispatch_detached<J: BackgroundJob>(job: J) -> JobTicket {
  let ticket = JobTicket {
    id: NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed),
    triggered_at: Utc::now(),
  };
  let name = job.name();
  info!(
    "后台任务 #{} ({}) 已触发于 {}",
    ticket.id,
    name,
    ticket.triggered_at.to_rfc3339()
  );

  tokio::spawn(async move {
    let now = std::time::Instant::now();
    match job.run().await {
      Ok(()) => info!(
        "后台任务 #{} ({}) 完成，耗时: {:.2?}",
        ticket.id,
        name,
        now.elapsed()
      ),
      Err(e) => warn!("后台任务 #{} ({}) 失败: {:#}", ticket.id, name, e),
    }
  });

  ticket
}

/// 模拟的重训练流水线，只等待一段时间
#[derive(Debug, Clone)]
pub struct SimulatedRetraining {
  pub delay: Duration,
}

impl BackgroundJob for SimulatedRetraining {
  fn name(&self) -> &'static str {
    "retraining"
  }

  async fn run(self) -> anyhow::Result<()> {
    info!("重训练流水线已启动...");
    tokio::time::sleep(self.delay).await;
    info!("重训练模拟完成，新权重已保存（模拟）");
    Ok(())
  }
}

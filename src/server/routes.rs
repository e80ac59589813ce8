// 该文件是 Arcade （冠脉狭窄检测） 项目的一部分。
// src/server/routes.rs - HTTP 路由处理
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

use axum::{
  Json,
  body::Bytes,
  extract::{
    State,
    multipart::{Multipart, MultipartRejection},
  },
};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
  model::{Classifier, Prediction},
  server::{error::ApiError, state::SharedState},
  task::{SimulatedRetraining, dispatch_detached},
};

/// 上传表单中的文件字段名
const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
  pub status: &'static str,
  pub model_status: &'static str,
  pub service: String,
}

#[derive(Debug, Serialize)]
pub struct RetrainResponse {
  pub message: &'static str,
}

/// GET / - 健康检查
pub async fn health_check<M: Classifier>(
  State(state): State<SharedState<M>>,
) -> Json<HealthResponse> {
  let model_status = if state.predictor.is_loaded() {
    "active"
  } else {
    "inactive"
  };

  Json(HealthResponse {
    status: "online",
    model_status,
    service: state.config.service_name.clone(),
  })
}

/// POST /predict - 上传造影图像并预测
///
/// 模型未加载时先于读取请求体返回 503。
pub async fn predict<M: Classifier>(
  State(state): State<SharedState<M>>,
  multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Prediction>, ApiError> {
  if !state.predictor.is_loaded() {
    return Err(ApiError::ModelNotLoaded);
  }

  let mut multipart =
    multipart.map_err(|e| ApiError::BadRequest(format!("Error reading file: {}", e)))?;
  let image_data = read_upload(&mut multipart).await?;
  debug!("收到上传文件: {} 字节", image_data.len());

  let now = std::time::Instant::now();
  let worker = state.clone();
  let prediction = tokio::task::spawn_blocking(move || worker.predictor.predict(&image_data))
    .await
    .map_err(|e| ApiError::Internal(format!("Prediction task failed: {}", e)))??;
  info!(
    "预测完成: {} ({:.2}%)，耗时: {:.2?}",
    prediction.diagnosis.label(),
    prediction.confidence * 100.0,
    now.elapsed()
  );

  Ok(Json(prediction))
}

async fn read_upload(multipart: &mut Multipart) -> Result<Bytes, ApiError> {
  while let Some(field) = multipart.next_field().await? {
    if field.name() == Some(UPLOAD_FIELD) {
      return Ok(field.bytes().await?);
    }
  }
  Err(ApiError::BadRequest(format!(
    "Missing multipart field '{}'",
    UPLOAD_FIELD
  )))
}

/// POST /retrain - 触发后台重训练，立即返回
pub async fn retrain<M: Classifier>(
  State(state): State<SharedState<M>>,
) -> Json<RetrainResponse> {
  dispatch_detached(SimulatedRetraining {
    delay: state.config.retrain_delay,
  });

  Json(RetrainResponse {
    message: "Retraining pipeline triggered. The system will update shortly.",
  })
}

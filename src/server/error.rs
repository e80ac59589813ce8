// 该文件是 Arcade （冠脉狭窄检测） 项目的一部分。
// src/server/error.rs - 错误到 HTTP 状态码的映射
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
  extract::multipart::MultipartError,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::predict::PredictError;

#[derive(Error, Debug)]
pub enum ApiError {
  #[error("Model is not loaded. Please contact admin or check server logs.")]
  ModelNotLoaded,
  #[error("{0}")]
  BadRequest(String),
  #[error("Uploaded file exceeds the size limit")]
  PayloadTooLarge,
  #[error("{0}")]
  Internal(String),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::ModelNotLoaded => StatusCode::SERVICE_UNAVAILABLE,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<PredictError> for ApiError {
  fn from(err: PredictError) -> Self {
    match err {
      PredictError::ModelNotLoaded => ApiError::ModelNotLoaded,
      PredictError::Decode(e) => {
        warn!("无法解码上传的图像: {}", e);
        ApiError::BadRequest(format!("Error reading image: {}", e))
      }
      PredictError::Inference(e) => {
        error!("预测错误: {}", e);
        ApiError::Internal(e.to_string())
      }
    }
  }
}

impl From<MultipartError> for ApiError {
  fn from(err: MultipartError) -> Self {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
      return ApiError::PayloadTooLarge;
    }
    warn!("读取上传文件失败: {}", err.body_text());
    ApiError::BadRequest(format!("Error reading file: {}", err.body_text()))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
  }
}

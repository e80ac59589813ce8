// 该文件是 Arcade （冠脉狭窄检测） 项目的一部分。
// tests/common/mod.rs - 集成测试公共工具
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

#![allow(dead_code)]

use std::{
  io::Cursor,
  sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use arcade::{
  frame::ModelFrame,
  model::Model,
  predict::Predictor,
  server::{AppState, ServerConfig},
};
use axum::{Router, body::Body, http::Request};
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use thiserror::Error;

pub const BOUNDARY: &str = "arcade-test-boundary";

#[derive(Error, Debug)]
#[error("模拟推理失败")]
pub struct MockError;

/// 依次循环返回预设分数的模型，并记录收到的输入
pub struct ScriptedModel {
  scores: Vec<f32>,
  calls: AtomicUsize,
  seen: Mutex<Vec<ModelFrame>>,
}

impl ScriptedModel {
  pub fn new(scores: &[f32]) -> Self {
    ScriptedModel {
      scores: scores.to_vec(),
      calls: AtomicUsize::new(0),
      seen: Mutex::new(Vec::new()),
    }
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn seen(&self) -> Vec<ModelFrame> {
    self.seen.lock().expect("seen lock").clone()
  }
}

impl Model for ScriptedModel {
  type Input = ModelFrame;
  type Output = f32;
  type Error = MockError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let i = self.calls.fetch_add(1, Ordering::SeqCst);
    self.seen.lock().expect("seen lock").push(input.clone());
    Ok(self.scores[i % self.scores.len()])
  }
}

pub struct FailingModel;

impl Model for FailingModel {
  type Input = ModelFrame;
  type Output = f32;
  type Error = MockError;

  fn infer(&self, _input: &Self::Input) -> Result<Self::Output, Self::Error> {
    Err(MockError)
  }
}

pub fn test_config() -> ServerConfig {
  ServerConfig {
    retrain_delay: Duration::from_secs(5),
    max_upload_bytes: 1024 * 1024,
    ..ServerConfig::default()
  }
}

pub fn app<M: arcade::model::Classifier>(predictor: Predictor<M>) -> Router {
  arcade::server::router(Arc::new(AppState::new(predictor, test_config())))
}

pub fn gray_png(width: u32, height: u32) -> Vec<u8> {
  let gray = GrayImage::from_fn(width, height, |x, y| Luma([((x * 3 + y) % 256) as u8]));
  let mut buf = Vec::new();
  DynamicImage::ImageLuma8(gray)
    .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
    .expect("encode png");
  buf
}

pub fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
  let mut body = Vec::new();
  body.extend_from_slice(
    format!(
      "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .as_bytes(),
  );
  body.extend_from_slice(data);
  body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
  body
}

pub fn upload_request(body: Vec<u8>) -> Request<Body> {
  Request::builder()
    .method("POST")
    .uri("/predict")
    .header(
      "content-type",
      format!("multipart/form-data; boundary={BOUNDARY}"),
    )
    .body(Body::from(body))
    .expect("build request")
}

pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .expect("read body");
  serde_json::from_slice(&bytes).expect("json body")
}

// 该文件是 Arcade （冠脉狭窄检测） 项目的一部分。
// src/frame.rs - NHWC 帧定义
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

use thiserror::Error;

const GRAY_CHANNELS: usize = 1;
const RGB_CHANNELS: usize = 3;

/// 模型输入宽度
pub const MODEL_INPUT_W: u32 = 224;
/// 模型输入高度
pub const MODEL_INPUT_H: u32 = 224;

/// 模型输入帧，形状为 (1, 224, 224, 3)
pub type ModelFrame = RgbNhwcFrame<MODEL_INPUT_W, MODEL_INPUT_H>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
  #[error("数据长度不匹配: 期望长度 {expected}, 实际长度 {actual}")]
  LengthMismatch { expected: usize, actual: usize },
}

/// 以 NHWC 布局访问帧数据（批大小固定为 1）
pub trait AsNhwcFrame {
  fn as_nhwc(&self) -> &[u8];
  fn channels(&self) -> usize;
}

fn check_len(actual: usize, expected: usize) -> Result<(), FrameError> {
  if actual != expected {
    return Err(FrameError::LengthMismatch { expected, actual });
  }
  Ok(())
}

// 按行沿宽度方向镜像，每个像素的通道顺序保持不变
fn flip_rows(data: &[u8], width: usize, channels: usize) -> Box<[u8]> {
  let row = width * channels;
  let mut flipped = vec![0u8; data.len()];
  for (src_row, dst_row) in data.chunks_exact(row).zip(flipped.chunks_exact_mut(row)) {
    for (src, dst) in src_row
      .chunks_exact(channels)
      .zip(dst_row.chunks_exact_mut(channels).rev())
    {
      dst.copy_from_slice(src);
    }
  }
  flipped.into_boxed_slice()
}

/// 单通道灰度帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayFrame<const W: u32, const H: u32> {
  data: Box<[u8]>,
}

impl<const W: u32, const H: u32> TryFrom<Vec<u8>> for GrayFrame<W, H> {
  type Error = FrameError;

  fn try_from(data: Vec<u8>) -> Result<Self, Self::Error> {
    check_len(data.len(), GRAY_CHANNELS * W as usize * H as usize)?;
    Ok(Self {
      data: data.into_boxed_slice(),
    })
  }
}

impl<const W: u32, const H: u32> GrayFrame<W, H> {
  pub fn get(&self, h: usize, w: usize) -> u8 {
    self.data[h * W as usize + w]
  }

  pub fn flip_horizontal(&self) -> Self {
    Self {
      data: flip_rows(&self.data, W as usize, GRAY_CHANNELS),
    }
  }
}

impl<const W: u32, const H: u32> AsNhwcFrame for GrayFrame<W, H> {
  fn as_nhwc(&self) -> &[u8] {
    &self.data
  }

  fn channels(&self) -> usize {
    GRAY_CHANNELS
  }
}

/// 三通道 NHWC 帧
///
/// 只能由 [`GrayFrame`] 经伪 RGB 适配得到，三个通道的值始终相同。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbNhwcFrame<const W: u32, const H: u32> {
  data: Box<[u8]>,
}

/// 伪 RGB 适配：把灰度通道复制三份
impl<const W: u32, const H: u32> From<&GrayFrame<W, H>> for RgbNhwcFrame<W, H> {
  fn from(gray: &GrayFrame<W, H>) -> Self {
    let data = gray
      .data
      .iter()
      .flat_map(|&v| [v; RGB_CHANNELS])
      .collect::<Vec<_>>()
      .into_boxed_slice();
    Self { data }
  }
}

impl<const W: u32, const H: u32> RgbNhwcFrame<W, H> {
  /// 张量形状 [N, H, W, C]
  pub fn shape(&self) -> [usize; 4] {
    [1, H as usize, W as usize, RGB_CHANNELS]
  }

  pub fn get(&self, h: usize, w: usize, c: usize) -> u8 {
    self.data[(h * W as usize + w) * RGB_CHANNELS + c]
  }

  /// 沿宽度方向镜像（测试时增强）
  pub fn flip_horizontal(&self) -> Self {
    Self {
      data: flip_rows(&self.data, W as usize, RGB_CHANNELS),
    }
  }

  /// 取第一个通道，供自带适配层的模型使用
  pub fn to_gray(&self) -> GrayFrame<W, H> {
    let data = self
      .data
      .chunks_exact(RGB_CHANNELS)
      .map(|pixel| pixel[0])
      .collect::<Vec<_>>()
      .into_boxed_slice();
    GrayFrame { data }
  }
}

impl<const W: u32, const H: u32> AsNhwcFrame for RgbNhwcFrame<W, H> {
  fn as_nhwc(&self) -> &[u8] {
    &self.data
  }

  fn channels(&self) -> usize {
    RGB_CHANNELS
  }
}

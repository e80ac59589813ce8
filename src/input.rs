// 该文件是 Arcade （冠脉狭窄检测） 项目的一部分。
// src/input.rs - 图像输入归一化
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

use std::{io::Cursor, path::Path};

use image::{DynamicImage, GrayImage, ImageReader, imageops::FilterType};
use thiserror::Error;
use tracing::debug;

use crate::frame::{FrameError, GrayFrame, MODEL_INPUT_H, MODEL_INPUT_W, ModelFrame};

/// 缩放滤波器，Catmull-Rom 三次插值
pub const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

#[derive(Error, Debug)]
pub enum InputError {
  #[error("图像解码错误: {0}")]
  Decode(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  Io(#[from] std::io::Error),
  #[error("帧形状错误: {0}")]
  Shape(#[from] FrameError),
}

/// 将上传的原始图像字节转换为模型输入帧
///
/// 解码 -> 灰度 -> 缩放到 224x224 -> 伪 RGB。像素值保持 0-255，
/// 不做 /255 归一化，骨干网络内部自行处理。
pub fn normalize(image_data: &[u8]) -> Result<ModelFrame, InputError> {
  let image = ImageReader::new(Cursor::new(image_data))
    .with_guessed_format()?
    .decode()?;
  debug!(
    "解码图像: {}x{} {:?}",
    image.width(),
    image.height(),
    image.color()
  );

  let gray = to_luma(&image);
  let resized = image::imageops::resize(&gray, MODEL_INPUT_W, MODEL_INPUT_H, RESIZE_FILTER);
  let frame: GrayFrame<MODEL_INPUT_W, MODEL_INPUT_H> = GrayFrame::try_from(resized.into_raw())?;

  Ok(ModelFrame::from(&frame))
}

/// 从文件读取并归一化，便于本地测试
pub fn normalize_file<P: AsRef<Path>>(path: P) -> Result<ModelFrame, InputError> {
  let data = std::fs::read(path)?;
  normalize(&data)
}

/// 转为单通道亮度图
///
/// 已是灰度的图像直接取亮度（16 位缩放到 8 位），
/// 彩色图像按 ITU-R BT.601 计算，忽略 alpha。
pub fn to_luma(image: &DynamicImage) -> GrayImage {
  match image {
    DynamicImage::ImageLuma8(gray) => gray.clone(),
    DynamicImage::ImageLumaA8(_)
    | DynamicImage::ImageLuma16(_)
    | DynamicImage::ImageLumaA16(_) => image.to_luma8(),
    _ => {
      let rgb = image.to_rgb8();
      GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        image::Luma([bt601_luma(r, g, b)])
      })
    }
  }
}

fn bt601_luma(r: u8, g: u8, b: u8) -> u8 {
  let l = 19595 * u32::from(r) + 38470 * u32::from(g) + 7471 * u32::from(b) + 0x8000;
  (l >> 16) as u8
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::frame::AsNhwcFrame;
  use image::{ImageFormat, Luma, Rgb, RgbImage, Rgba, RgbaImage};

  fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
  }

  fn assert_model_frame(frame: &ModelFrame) {
    assert_eq!(frame.shape(), [1, 224, 224, 3]);
    assert_eq!(frame.as_nhwc().len(), 224 * 224 * 3);
    for pixel in frame.as_nhwc().chunks_exact(3) {
      assert_eq!(pixel[0], pixel[1]);
      assert_eq!(pixel[1], pixel[2]);
    }
  }

  #[test]
  fn grayscale_png_becomes_model_frame() {
    let gray = GrayImage::from_fn(100, 100, |x, y| Luma([((x + y) % 256) as u8]));
    let frame = normalize(&encode(DynamicImage::ImageLuma8(gray), ImageFormat::Png)).unwrap();
    assert_model_frame(&frame);
  }

  #[test]
  fn color_inputs_of_any_size_become_model_frame() {
    for (w, h) in [(1, 1), (31, 57), (300, 120), (224, 224)] {
      let rgb = RgbImage::from_fn(w, h, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
      let png = encode(DynamicImage::ImageRgb8(rgb.clone()), ImageFormat::Png);
      assert_model_frame(&normalize(&png).unwrap());

      let jpeg = encode(DynamicImage::ImageRgb8(rgb), ImageFormat::Jpeg);
      assert_model_frame(&normalize(&jpeg).unwrap());
    }
  }

  #[test]
  fn uniform_image_keeps_raw_pixel_scale() {
    let gray = GrayImage::from_pixel(40, 40, Luma([200]));
    let frame = normalize(&encode(DynamicImage::ImageLuma8(gray), ImageFormat::Png)).unwrap();
    assert!(frame.as_nhwc().iter().all(|&v| v == 200));
  }

  #[test]
  fn color_conversion_uses_bt601_and_ignores_alpha() {
    let rgba = RgbaImage::from_fn(2, 1, |x, _| {
      if x == 0 {
        Rgba([255, 0, 0, 0])
      } else {
        Rgba([0, 255, 0, 255])
      }
    });
    let gray = to_luma(&DynamicImage::ImageRgba8(rgba));
    assert_eq!(gray.get_pixel(0, 0).0, [76]);
    assert_eq!(gray.get_pixel(1, 0).0, [150]);
  }

  #[test]
  fn white_stays_white() {
    assert_eq!(bt601_luma(255, 255, 255), 255);
    assert_eq!(bt601_luma(0, 0, 0), 0);
  }

  #[test]
  fn non_image_bytes_fail_to_decode() {
    let err = normalize(b"this is definitely not an x-ray").unwrap_err();
    assert!(matches!(err, InputError::Decode(_)));

    let err = normalize(b"").unwrap_err();
    assert!(matches!(err, InputError::Decode(_)));
  }

  #[test]
  fn truncated_png_fails_to_decode() {
    let gray = GrayImage::from_pixel(64, 64, Luma([10]));
    let png = encode(DynamicImage::ImageLuma8(gray), ImageFormat::Png);
    let err = normalize(&png[..png.len() / 2]).unwrap_err();
    assert!(matches!(err, InputError::Decode(_)));
  }

  #[test]
  fn missing_file_is_io_error() {
    let err = normalize_file("/nonexistent/arcade/test_xray.png").unwrap_err();
    assert!(matches!(err, InputError::Io(_)));
  }
}

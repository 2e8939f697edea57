// 该文件是 Eying （目见） 项目的一部分。
// tests/annotate.rs - 标注行为测试
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

use std::io::Cursor;

use eying::{
  input::decode_image,
  model::{BoundingBox, DetectResult, Detection},
  output::{Annotator, ConfidenceLine, ConfidenceTier, FontSource, Render},
};
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

const RED: [u8; 3] = [255, 0, 0];

fn annotator(dir: &tempfile::TempDir) -> Annotator {
  Annotator::with_paths(
    dir.path().join("no-such-font.ttf"),
    dir.path().join("result").join("annotated_photo.jpg"),
  )
  .unwrap()
}

fn detection(label: &str, score: f32, bbox: [f32; 4]) -> Detection {
  Detection {
    label: label.to_string(),
    score,
    bbox: BoundingBox::new(bbox[0], bbox[1], bbox[2], bbox[3]),
  }
}

fn canvas() -> RgbImage {
  RgbImage::from_fn(200, 160, |x, y| Rgb([(x % 64) as u8, (y % 64) as u8, 90]))
}

#[test]
fn zero_detections_leave_image_untouched() {
  let dir = tempfile::tempdir().unwrap();
  let annotator = annotator(&dir);
  let input = canvas();
  let mut image = input.clone();
  let mut lines: Vec<ConfidenceLine> = Vec::new();

  let output = annotator
    .annotate(&mut image, &DetectResult::default(), &mut lines)
    .unwrap();

  assert_eq!(image, input);
  assert!(lines.is_empty());
  assert!(output.path.ends_with("result/annotated_photo.jpg"));
  assert_eq!(std::fs::read(&output.path).unwrap(), output.jpeg);
}

#[test]
fn every_detection_is_drawn_and_reported_in_order() {
  let dir = tempfile::tempdir().unwrap();
  let annotator = annotator(&dir);
  assert_eq!(annotator.font_source(), &FontSource::Fallback);

  let result = DetectResult::from(vec![
    detection("person", 0.95, [40.0, 40.0, 100.0, 150.0]),
    detection("dog", 0.42, [120.0, 60.0, 190.0, 120.0]),
    // 重复框也要画、也要报告
    detection("dog", 0.42, [120.0, 60.0, 190.0, 120.0]),
    detection("cup", 0.5, [10.0, 130.0, 30.0, 155.0]),
  ]);
  let mut image = canvas();
  let mut lines: Vec<ConfidenceLine> = Vec::new();
  annotator.annotate(&mut image, &result, &mut lines).unwrap();

  let summary: Vec<_> = lines
    .iter()
    .map(|l| (l.label.as_str(), l.confidence.as_str(), l.tier))
    .collect();
  assert_eq!(
    summary,
    [
      ("person", "0.95", ConfidenceTier::High),
      ("dog", "0.42", ConfidenceTier::Low),
      ("dog", "0.42", ConfidenceTier::Low),
      ("cup", "0.50", ConfidenceTier::Medium),
    ]
  );

  for d in result.iter() {
    let (x, y) = (d.bbox.xmin as u32, d.bbox.ymin as u32 + 20);
    assert_eq!(image.get_pixel(x, y).0, RED, "left edge of {}", d.label);
    let (x, y) = (d.bbox.xmax as u32, d.bbox.ymax as u32 - 5);
    assert_eq!(image.get_pixel(x, y).0, RED, "right edge of {}", d.label);
  }
}

#[test]
fn png_input_is_written_as_jpeg() {
  let dir = tempfile::tempdir().unwrap();
  let annotator = annotator(&dir);

  let png = RgbaImage::from_pixel(64, 48, Rgba([200, 100, 50, 128]));
  let mut bytes = Vec::new();
  png
    .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
    .unwrap();

  let mut image = decode_image(&bytes).unwrap();
  let result = DetectResult::from(vec![detection("kite", 0.81, [4.0, 30.0, 60.0, 44.0])]);
  let output = annotator.annotate(&mut image, &result, &mut ()).unwrap();

  assert_eq!(image::guess_format(&output.jpeg).unwrap(), ImageFormat::Jpeg);
  let written = std::fs::read(&output.path).unwrap();
  let decoded = image::load_from_memory_with_format(&written, ImageFormat::Jpeg).unwrap();
  assert_eq!((decoded.width(), decoded.height()), (64, 48));
}

#[test]
fn annotating_twice_gives_identical_bytes() {
  let dir = tempfile::tempdir().unwrap();
  let annotator = annotator(&dir);
  let result = DetectResult::from(vec![
    detection("car", 0.66, [-20.0, 10.0, 80.0, 90.0]),
    detection("bus", 0.99, [150.0, 100.0, 260.0, 200.0]),
  ]);

  let first = annotator.render_result(&canvas(), &result).unwrap();
  let first_file = std::fs::read(&first.path).unwrap();
  let second = annotator.render_result(&canvas(), &result).unwrap();
  let second_file = std::fs::read(&second.path).unwrap();

  assert_eq!(first.path, second.path);
  assert_eq!(first.jpeg, second.jpeg);
  assert_eq!(first_file, second_file);
}

#[test]
fn render_result_keeps_the_frame() {
  let dir = tempfile::tempdir().unwrap();
  let annotator = annotator(&dir);
  let frame = canvas();
  let result = DetectResult::from(vec![detection("cat", 0.9, [10.0, 40.0, 50.0, 80.0])]);

  annotator.render_result(&frame, &result).unwrap();
  assert_eq!(frame, canvas());
}

fn has_label_text(image: &RgbImage, bbox: &BoundingBox, background: Rgb<u8>) -> bool {
  let (x0, y0) = (bbox.xmin as u32, bbox.ymin as u32 - 28);
  (y0..bbox.ymin as u32)
    .flat_map(|y| (x0..x0 + 60).map(move |x| (x, y)))
    .any(|(x, y)| {
      let [r, g, _] = image.get_pixel(x, y).0;
      r as i32 > g as i32 + 60
    })
}

fn band_untouched(image: &RgbImage, bbox: &BoundingBox, background: Rgb<u8>) -> bool {
  let (x0, y0) = (bbox.xmin as u32, bbox.ymin as u32 - 28);
  (y0..bbox.ymin as u32)
    .flat_map(|y| (x0..x0 + 60).map(move |x| (x, y)))
    .all(|(x, y)| image.get_pixel(x, y) == &background)
}

#[test]
fn every_detection_gets_its_own_label() {
  let dir = tempfile::tempdir().unwrap();
  let annotator = annotator(&dir);
  let background = Rgb([40, 40, 40]);

  let dog = detection("dog", 0.7, [20.0, 60.0, 100.0, 150.0]);
  let cat = detection("cat", 0.3, [180.0, 60.0, 260.0, 150.0]);
  let dup = detection("cat", 0.3, [180.0, 60.0, 260.0, 150.0]);

  let mut both = RgbImage::from_pixel(300, 200, background);
  let result = DetectResult::from(vec![dog.clone(), cat.clone(), dup]);
  annotator.annotate(&mut both, &result, &mut ()).unwrap();
  assert!(has_label_text(&both, &dog.bbox, background));
  assert!(has_label_text(&both, &cat.bbox, background));

  let mut only_dog = RgbImage::from_pixel(300, 200, background);
  annotator
    .annotate(&mut only_dog, &DetectResult::from(vec![dog.clone()]), &mut ())
    .unwrap();
  assert!(has_label_text(&only_dog, &dog.bbox, background));
  assert!(band_untouched(&only_dog, &cat.bbox, background));
}

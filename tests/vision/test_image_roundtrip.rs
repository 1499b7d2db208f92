// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Decode → resize → re-encode tests for uploaded frames

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use sortyx::vision::{decode_image_bytes, encode_jpeg, normalize, resize_exact};
use std::io::Cursor;

fn encode(image: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

fn mean_rgb(image: &RgbImage) -> [f64; 3] {
    let mut sum = [0f64; 3];
    for pixel in image.pixels() {
        for (c, value) in pixel.0.iter().enumerate() {
            sum[c] += *value as f64;
        }
    }
    let n = (image.width() * image.height()) as f64;
    [sum[0] / n, sum[1] / n, sum[2] / n]
}

#[test]
fn test_red_jpeg_stays_red_after_resize_and_reencode() {
    let red = RgbImage::from_pixel(320, 240, Rgb([220, 20, 20]));
    let upload = encode(&red, ImageFormat::Jpeg);

    let (decoded, info) = decode_image_bytes(&upload).unwrap();
    assert_eq!((info.width, info.height), (320, 240));

    let frame = normalize(&decoded, 640);
    assert_eq!(frame.dimensions(), (640, 640));

    let jpeg = encode_jpeg(&frame, 90).unwrap();
    let (again, _) = decode_image_bytes(&jpeg).unwrap();
    let [r, g, b] = mean_rgb(&again.to_rgb8());

    assert!(r > 180.0, "red channel faded: {}", r);
    assert!(r > g * 3.0 && r > b * 3.0, "channels swapped: {} {} {}", r, g, b);
}

#[test]
fn test_blue_png_keeps_channel_order() {
    let blue = RgbImage::from_pixel(50, 30, Rgb([10, 30, 230]));
    let (decoded, _) = decode_image_bytes(&encode(&blue, ImageFormat::Png)).unwrap();

    let frame = normalize(&decoded, 224);
    let jpeg = encode_jpeg(&frame, 95).unwrap();
    let (again, _) = decode_image_bytes(&jpeg).unwrap();
    let [r, _, b] = mean_rgb(&again.to_rgb8());

    assert!(b > r * 3.0, "blue not dominant: r={} b={}", r, b);
}

#[test]
fn test_grayscale_upload_becomes_three_channel() {
    let gray = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(20, 20, image::Luma([128])));
    let frame = normalize(&gray, 32);
    assert_eq!(frame.get_pixel(0, 0), &Rgb([128, 128, 128]));
}

#[test]
fn test_camera_frame_resize() {
    let frame = RgbImage::from_pixel(1920, 1080, Rgb([1, 2, 3]));
    let resized = resize_exact(&frame, 640, 480);
    assert_eq!(resized.dimensions(), (640, 480));
}

//! Fit a poster of arbitrary size onto the fixed panel canvas.
//!
//! Two policies are supported:
//!
//! - [`FillMode::Fill`] scales the poster until it covers the canvas, applies
//!   the optional zoom, then crops a canvas-sized window. The vertical window
//!   is centered and biased by `offset_pixels`; it is clamped at the top but
//!   not at the bottom, so an offset that pushes the window past the end of
//!   the scaled poster yields black rows there.
//! - [`FillMode::Fit`] scales the poster until it fits entirely inside the
//!   canvas and centers it on black.
//!
//! Scaling is always uniform and resampled with Lanczos3. The resulting frame
//! is always exactly the requested size.

use image::{DynamicImage, GenericImageView, RgbImage, imageops};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::{error::GeometryError, model::DisplayFrame};

/// Scaling policy for posters whose aspect ratio differs from the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    /// Crop to cover the whole canvas.
    #[default]
    Fill,
    /// Letterbox inside the canvas.
    Fit,
}

impl fmt::Display for FillMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillMode::Fill => f.write_str("fill"),
            FillMode::Fit => f.write_str("fit"),
        }
    }
}

impl FromStr for FillMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fill" | "crop" | "cover" => Ok(FillMode::Fill),
            "fit" | "letterbox" | "contain" => Ok(FillMode::Fit),
            other => Err(format!(
                "unknown fill mode '{other}' (expected 'fill' or 'fit')"
            )),
        }
    }
}

/// Startup-time geometry options. The target size comes from the device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Crop or letterbox.
    pub fill_mode: FillMode,
    /// Extra magnification in percent, fill mode only.
    pub zoom_percent: f64,
    /// Vertical crop bias in pixels, fill mode only. Negative moves the
    /// window up.
    pub offset_pixels: i32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            fill_mode: FillMode::Fill,
            zoom_percent: 0.0,
            offset_pixels: 0,
        }
    }
}

/// Where the scaled poster lands relative to the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Scale to `scaled`, then read a canvas-sized window at `crop`.
    Crop {
        /// Size after scaling and zoom.
        scaled: (u32, u32),
        /// Top-left of the window read from the scaled image.
        crop: (u32, u32),
    },
    /// Scale to `scaled`, then paste at `origin` on a black canvas.
    Letterbox {
        /// Size after scaling.
        scaled: (u32, u32),
        /// Top-left of the pasted image on the canvas.
        origin: (u32, u32),
    },
}

impl Layout {
    /// Size the source is resampled to.
    pub fn scaled(&self) -> (u32, u32) {
        match *self {
            Layout::Crop { scaled, .. } | Layout::Letterbox { scaled, .. } => {
                scaled
            }
        }
    }
}

/// Compute the layout without touching any pixels.
pub fn plan(
    source: (u32, u32),
    target: (u32, u32),
    config: &GeometryConfig,
) -> Result<Layout, GeometryError> {
    let (src_w, src_h) = source;
    let (target_w, target_h) = target;

    if src_w == 0 || src_h == 0 {
        return Err(GeometryError::EmptySource {
            width: src_w,
            height: src_h,
        });
    }
    if target_w == 0 || target_h == 0 {
        return Err(GeometryError::EmptyTarget {
            width: target_w,
            height: target_h,
        });
    }

    let img_aspect = src_w as f64 / src_h as f64;
    let target_aspect = target_w as f64 / target_h as f64;

    let layout = match config.fill_mode {
        FillMode::Fill => {
            let (mut w, mut h) = if img_aspect < target_aspect {
                (target_w, (target_w as f64 / img_aspect) as u32)
            } else {
                ((target_h as f64 * img_aspect) as u32, target_h)
            };

            if config.zoom_percent > 0.0 {
                let factor = 1.0 + config.zoom_percent / 100.0;
                w = (w as f64 * factor) as u32;
                h = (h as f64 * factor) as u32;
            }
            let (w, h) = (w.max(1), h.max(1));

            let centered = (i64::from(h) - i64::from(target_h)).div_euclid(2);
            let top = (centered + i64::from(config.offset_pixels)).max(0);
            let left = w.saturating_sub(target_w) / 2;

            Layout::Crop {
                scaled: (w, h),
                crop: (left, u32::try_from(top).unwrap_or(u32::MAX)),
            }
        }
        FillMode::Fit => {
            let (w, h) = if img_aspect > target_aspect {
                (target_w, (target_w as f64 / img_aspect) as u32)
            } else {
                ((target_h as f64 * img_aspect) as u32, target_h)
            };
            let (w, h) = (w.clamp(1, target_w), h.clamp(1, target_h));

            Layout::Letterbox {
                scaled: (w, h),
                origin: ((target_w - w) / 2, (target_h - h) / 2),
            }
        }
    };

    Ok(layout)
}

/// Transform `source` into a frame of exactly `target` pixels.
pub fn transform(
    source: &DynamicImage,
    target: (u32, u32),
    config: &GeometryConfig,
) -> Result<DisplayFrame, GeometryError> {
    let layout = plan(source.dimensions(), target, config)?;
    let (target_w, target_h) = target;

    let rgb = source.to_rgb8();
    let (scaled_w, scaled_h) = layout.scaled();
    let scaled = if rgb.dimensions() == (scaled_w, scaled_h) {
        rgb
    } else {
        imageops::resize(&rgb, scaled_w, scaled_h, imageops::FilterType::Lanczos3)
    };

    let mut canvas = RgbImage::new(target_w, target_h);
    match layout {
        Layout::Crop { crop: (x, y), .. } => {
            // crop_imm clamps to the scaled bounds; whatever falls outside
            // stays black on the canvas.
            let window =
                imageops::crop_imm(&scaled, x, y, target_w, target_h).to_image();
            imageops::replace(&mut canvas, &window, 0, 0);
        }
        Layout::Letterbox { origin: (x, y), .. } => {
            imageops::replace(&mut canvas, &scaled, i64::from(x), i64::from(y));
        }
    }

    Ok(DisplayFrame::new(canvas))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                (x * 255 / width.max(2).saturating_sub(1)) as u8,
                (y * 255 / height.max(2).saturating_sub(1)) as u8,
                128,
            ])
        })
    }

    fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    fn fill(zoom_percent: f64, offset_pixels: i32) -> GeometryConfig {
        GeometryConfig {
            fill_mode: FillMode::Fill,
            zoom_percent,
            offset_pixels,
        }
    }

    fn fit() -> GeometryConfig {
        GeometryConfig {
            fill_mode: FillMode::Fit,
            ..GeometryConfig::default()
        }
    }

    #[test]
    fn wide_source_fill_crops_the_horizontal_center() {
        let layout = plan((1000, 500), (64, 64), &fill(0.0, 0)).unwrap();
        assert_eq!(
            layout,
            Layout::Crop {
                scaled: (128, 64),
                crop: (32, 0),
            }
        );

        let source = gradient(1000, 500);
        let frame = transform(
            &DynamicImage::ImageRgb8(source.clone()),
            (64, 64),
            &fill(0.0, 0),
        )
        .unwrap();
        assert_eq!(frame.dimensions(), (64, 64));

        let scaled = imageops::resize(
            &source,
            128,
            64,
            imageops::FilterType::Lanczos3,
        );
        for y in 0..64 {
            for x in 0..64 {
                assert_eq!(
                    frame.pixels().get_pixel(x, y),
                    scaled.get_pixel(x + 32, y),
                    "pixel ({x},{y}) should come from scaled column {}",
                    x + 32
                );
            }
        }
    }

    #[test]
    fn tall_poster_fill_applies_zoom_and_offset() {
        let layout = plan((200, 300), (64, 64), &fill(8.0, -10)).unwrap();
        // 64x96 before zoom, truncated after the 1.08 factor.
        assert_eq!(
            layout,
            Layout::Crop {
                scaled: (69, 103),
                crop: (2, 9),
            }
        );
    }

    #[test]
    fn negative_offset_is_clamped_to_the_top_edge() {
        let layout = plan((200, 300), (64, 64), &fill(0.0, -100)).unwrap();
        assert_eq!(
            layout,
            Layout::Crop {
                scaled: (64, 96),
                crop: (0, 0),
            }
        );
    }

    #[test]
    fn offset_past_the_bottom_leaves_black_rows() {
        // Scaled to 10x20; window starts at row 5 + 8 = 13, so only seven
        // rows of poster remain.
        let frame =
            transform(&solid(100, 200, [255, 255, 255]), (10, 10), &fill(0.0, 8))
                .unwrap();
        assert_eq!(frame.dimensions(), (10, 10));

        for y in 0..10 {
            for x in 0..10 {
                let px = frame.pixels().get_pixel(x, y);
                if y < 7 {
                    assert!(px.0.iter().all(|c| *c > 200), "row {y} should be poster");
                } else {
                    assert_eq!(px.0, [0, 0, 0], "row {y} should be black");
                }
            }
        }
    }

    #[test]
    fn offset_entirely_past_the_image_yields_a_black_frame() {
        let frame = transform(
            &solid(100, 200, [255, 255, 255]),
            (10, 10),
            &fill(0.0, 500),
        )
        .unwrap();
        assert_eq!(frame.dimensions(), (10, 10));
        assert!(frame.as_raw().iter().all(|c| *c == 0));
    }

    #[test]
    fn fit_letterboxes_a_wide_source_without_cropping() {
        let layout = plan((200, 100), (64, 64), &fit()).unwrap();
        assert_eq!(
            layout,
            Layout::Letterbox {
                scaled: (64, 32),
                origin: (0, 16),
            }
        );

        let frame =
            transform(&solid(200, 100, [200, 10, 10]), (64, 64), &fit()).unwrap();
        assert_eq!(frame.dimensions(), (64, 64));

        for x in 0..64 {
            assert_eq!(frame.pixels().get_pixel(x, 0).0, [0, 0, 0]);
            assert_eq!(frame.pixels().get_pixel(x, 15).0, [0, 0, 0]);
            assert_eq!(frame.pixels().get_pixel(x, 48).0, [0, 0, 0]);
            assert_eq!(frame.pixels().get_pixel(x, 63).0, [0, 0, 0]);
            // Every source column survives, including both edges.
            assert!(frame.pixels().get_pixel(x, 16).0[0] > 150);
            assert!(frame.pixels().get_pixel(x, 47).0[0] > 150);
        }
    }

    #[test]
    fn fit_pillarboxes_a_tall_poster() {
        let layout = plan((100, 150), (64, 64), &fit()).unwrap();
        let Layout::Letterbox {
            scaled: (w, h),
            origin: (x, y),
        } = layout
        else {
            panic!("fit should letterbox");
        };
        assert_eq!(h, 64);
        assert_eq!(w, 42);
        assert_eq!((x, y), (11, 0));
    }

    #[test]
    fn fit_ignores_zoom_and_offset() {
        let config = GeometryConfig {
            fill_mode: FillMode::Fit,
            zoom_percent: 50.0,
            offset_pixels: 20,
        };
        assert_eq!(
            plan((200, 100), (64, 64), &config).unwrap(),
            plan((200, 100), (64, 64), &fit()).unwrap()
        );
    }

    #[test]
    fn output_always_matches_the_target_size() {
        let sources = [(1, 1), (3, 300), (300, 3), (500, 750), (64, 64)];
        let targets = [(64, 64), (128, 32), (32, 128)];
        for config in [fill(8.0, -10), fill(0.0, 40), fit()] {
            for &(sw, sh) in &sources {
                for &target in &targets {
                    let frame =
                        transform(&solid(sw, sh, [9, 9, 9]), target, &config)
                            .unwrap();
                    assert_eq!(frame.dimensions(), target);
                }
            }
        }
    }

    #[test]
    fn fill_scaling_is_uniform() {
        for &(sw, sh) in &[(1000, 500), (200, 300), (333, 777)] {
            let scaled = plan((sw, sh), (64, 64), &fill(0.0, 0))
                .unwrap()
                .scaled();
            let src_aspect = sw as f64 / sh as f64;
            let out_aspect = scaled.0 as f64 / scaled.1 as f64;
            // Truncation may cost at most one pixel on the long side.
            assert!((src_aspect - out_aspect).abs() < 0.05);
            assert!(scaled.0 >= 64 && scaled.1 >= 64);
        }
    }

    #[test]
    fn alpha_is_dropped() {
        let rgba = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            10,
            10,
            image::Rgba([10, 20, 30, 0]),
        ));
        let frame = transform(&rgba, (10, 10), &fill(0.0, 0)).unwrap();
        assert_eq!(frame.pixels().get_pixel(5, 5).0, [10, 20, 30]);
    }

    #[test]
    fn empty_inputs_are_rejected() {
        assert_eq!(
            plan((0, 10), (64, 64), &fill(0.0, 0)),
            Err(GeometryError::EmptySource {
                width: 0,
                height: 10,
            })
        );
        assert_eq!(
            plan((10, 10), (64, 0), &fit()),
            Err(GeometryError::EmptyTarget {
                width: 64,
                height: 0,
            })
        );
    }

    #[test]
    fn fill_mode_parses_common_aliases() {
        assert_eq!("FILL".parse::<FillMode>(), Ok(FillMode::Fill));
        assert_eq!("letterbox".parse::<FillMode>(), Ok(FillMode::Fit));
        assert!("stretch".parse::<FillMode>().is_err());
    }
}

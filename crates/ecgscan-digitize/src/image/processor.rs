// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — loading, rotation, and strict cropping of ECG scans.
// Operates on in-memory images using the `image` and `imageproc` crates.

use ecgscan_core::error::EcgScanError;
use ecgscan_core::types::Rectangle;
use image::{DynamicImage, RgbaImage};
use imageproc::geometric_transformations::{self, Interpolation};
use tracing::{debug, info, instrument};

/// Geometric operations on a single in-memory scan.
///
/// `rotate` consumes `self` and returns the transformed processor so calls
/// can be chained; `crop` borrows, because one rotated scan is cropped once
/// per lead.
///
/// ```ignore
/// let rotated = ImageProcessor::open("ecg.png")?.rotate(-1.5);
/// let lead_i = rotated.crop(Rectangle::new(40, 120, 600, 180));
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load a scan from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, EcgScanError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            EcgScanError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Scan loaded");
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Rotate the image by an arbitrary angle in degrees (clockwise).
    ///
    /// Multiples of 90 degrees are lossless and swap the canvas dimensions
    /// where appropriate. Other angles rotate about the centre with bilinear
    /// interpolation on a canvas of the original size; uncovered corners are
    /// filled with white paper.
    #[instrument(skip(self))]
    pub fn rotate(self, degrees: f32) -> Self {
        let normalised = degrees.rem_euclid(360.0);
        if normalised.abs() < 0.01 || (normalised - 360.0).abs() < 0.01 {
            return self;
        }
        info!(degrees, "Rotating scan");

        if (normalised - 90.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate90(),
            };
        }
        if (normalised - 180.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate180(),
            };
        }
        if (normalised - 270.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate270(),
            };
        }

        let rgba = self.image.to_rgba8();
        let paper = image::Rgba([255u8, 255, 255, 255]);
        let rotated: RgbaImage = geometric_transformations::rotate_about_center(
            &rgba,
            degrees.to_radians(),
            Interpolation::Bilinear,
            paper,
        );

        debug!("General rotation applied");
        Self {
            image: DynamicImage::ImageRgba8(rotated),
        }
    }

    /// Copy out a rectangular region.
    ///
    /// Returns `None` when the region is empty or reaches past the image
    /// edge; regions are never clamped, since a silently shrunk crop would
    /// shift the lead's time axis.
    pub fn crop(&self, region: Rectangle) -> Option<Self> {
        if !region.fits_within(self.width(), self.height()) {
            return None;
        }
        debug!(%region, "Cropping scan");
        Some(Self {
            image: self
                .image
                .crop_imm(region.x, region.y, region.width, region.height),
        })
    }
}

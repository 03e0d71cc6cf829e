// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometry stage — rotate the scan once, then cut one image per lead.

use std::collections::BTreeMap;

use ecgscan_core::error::{EcgScanError, Result};
use ecgscan_core::types::{LeadId, LeadRegion};
use image::DynamicImage;
use tracing::{debug, instrument};

use crate::image::ImageProcessor;

/// Rotate `image` by `rotation` degrees and crop every configured lead.
///
/// Lead regions are interpreted in rotated-image coordinates. A region that
/// is empty or does not fit is a configuration error and aborts the stage.
#[instrument(skip_all, fields(rotation = rotation, leads = leads.len()))]
pub fn crop_leads(
    image: &DynamicImage,
    rotation: f32,
    leads: &BTreeMap<LeadId, LeadRegion>,
) -> Result<BTreeMap<LeadId, DynamicImage>> {
    let rotated = ImageProcessor::from_dynamic(image.clone()).rotate(rotation);
    let (width, height) = (rotated.width(), rotated.height());

    let mut crops = BTreeMap::new();
    for (&lead, config) in leads {
        let crop = rotated
            .crop(config.region)
            .ok_or(EcgScanError::RegionOutOfBounds {
                lead,
                region: config.region,
                width,
                height,
            })?;
        debug!(%lead, width = crop.width(), height = crop.height(), "Lead cropped");
        crops.insert(lead, crop.into_dynamic());
    }
    Ok(crops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecgscan_core::types::Rectangle;
    use image::{GrayImage, Luma};

    fn striped_scan() -> DynamicImage {
        // 100x60 scan whose pixel value encodes the column, so crops can be
        // traced back to where they came from.
        let img = GrayImage::from_fn(100, 60, |x, _| Luma([x as u8]));
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn crops_each_lead_from_its_region() {
        let mut leads = BTreeMap::new();
        leads.insert(LeadId::I, LeadRegion::new(Rectangle::new(0, 0, 50, 20), 0.0));
        leads.insert(LeadId::II, LeadRegion::new(Rectangle::new(50, 20, 30, 20), 0.0));

        let crops = crop_leads(&striped_scan(), 0.0, &leads).expect("crop leads");
        assert_eq!(crops.len(), 2);

        let lead_ii = crops[&LeadId::II].to_luma8();
        assert_eq!(lead_ii.dimensions(), (30, 20));
        assert_eq!(lead_ii.get_pixel(0, 0).0[0], 50);
    }

    #[test]
    fn regions_are_in_rotated_coordinates() {
        // After a quarter turn the 100x60 scan is 60x100, so a tall region
        // that would not fit the original is valid.
        let mut leads = BTreeMap::new();
        leads.insert(LeadId::V1, LeadRegion::new(Rectangle::new(0, 0, 60, 100), 0.0));

        let crops = crop_leads(&striped_scan(), 90.0, &leads).expect("crop rotated");
        assert_eq!(crops[&LeadId::V1].width(), 60);
        assert_eq!(crops[&LeadId::V1].height(), 100);
    }

    #[test]
    fn out_of_bounds_region_is_fatal() {
        let mut leads = BTreeMap::new();
        leads.insert(LeadId::I, LeadRegion::new(Rectangle::new(0, 0, 10, 10), 0.0));
        leads.insert(LeadId::Avf, LeadRegion::new(Rectangle::new(90, 0, 20, 10), 0.0));

        match crop_leads(&striped_scan(), 0.0, &leads) {
            Err(EcgScanError::RegionOutOfBounds {
                lead,
                width,
                height,
                ..
            }) => {
                assert_eq!(lead, LeadId::Avf);
                assert_eq!((width, height), (100, 60));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

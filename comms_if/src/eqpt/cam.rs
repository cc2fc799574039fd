//! # Camera images
//!
//! Decoded frames from the vehicle's cameras, as consumed by traffic light
//! classification.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A decoded camera image.
#[derive(Clone)]
pub struct CamImage {
    /// Camera the image came from
    pub cam_id: CamId,

    /// Acquisition time
    pub timestamp: DateTime<Utc>,

    pub image: DynamicImage,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Cameras available on the vehicle
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Hash, Eq, PartialEq)]
pub enum CamId {
    /// The forward facing colour camera used for traffic light detection
    Front,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CamImage {
    /// Create a black RGB image of the given size.
    pub fn blank(cam_id: CamId, width: u32, height: u32, timestamp: DateTime<Utc>) -> Self {
        Self {
            cam_id,
            timestamp,
            image: DynamicImage::new_rgb8(width, height),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use image::GenericImageView;

    #[test]
    fn test_blank_image() {
        let img = CamImage::blank(CamId::Front, 8, 6, Utc::now());

        assert_eq!(img.image.dimensions(), (8, 6));
        assert!(img.image.pixels().all(|(_, _, p)| p[0] == 0 && p[1] == 0 && p[2] == 0));
    }
}

// THEORY:
// The `BlobDetector` is the engine of the perception layer. It finds the single
// best candidate for one marker color in one frame and reduces it to a `Blob`.
//
// Algorithm steps:
// 1.  **Classification**: every pixel is tested by a `PixelClassifier` (HSV
//     ranges by default) to build a binary mask.
// 2.  **Noise Reduction**: an erosion pass then a dilation pass (3x3 kernel, a few
//     iterations) clear isolated speckles while keeping real regions intact.
// 3.  **Region Extraction**: the outer border of every connected region is traced.
// 4.  **Selection**: the region with the largest enclosed area wins. Only one
//     marker of each color is expected in view.
// 5.  **Summary**: the winner's minimum enclosing circle gives the radius, its
//     polygon moments give the centroid.
// 6.  **Confidence Gate**: anything with a radius at or below the minimum is noise
//     and is reported as no blob at all.
//
// The detector is a stateless utility. It has no memory of previous frames, and
// "nothing found" is an ordinary, expected result.

use crate::core_modules::blob::{Blob, Point};
use crate::core_modules::contour::contour;
use crate::core_modules::hsv::hsv::PixelClassifier;
use crate::core_modules::mask::mask;
use image::RgbImage;

pub mod blob_detector {
    use super::*;

    /// Blobs with a radius at or below this many pixels are discarded.
    pub const DEFAULT_MIN_RADIUS: f32 = 10.0;
    pub const DEFAULT_MORPHOLOGY_ITERATIONS: u8 = 2;

    /// Tunables for a single detection pass.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct DetectorSettings {
        /// Minimum-confidence radius. A blob must be strictly larger to count.
        pub min_radius: f32,
        /// Erode/dilate passes of a 3x3 kernel applied to the color mask.
        pub morphology_iterations: u8,
    }

    impl Default for DetectorSettings {
        fn default() -> Self {
            Self {
                min_radius: DEFAULT_MIN_RADIUS,
                morphology_iterations: DEFAULT_MORPHOLOGY_ITERATIONS,
            }
        }
    }

    /// Finds the largest qualifying blob of the classifier's color.
    pub fn find_blob<C>(frame: &RgbImage, classifier: &C, settings: &DetectorSettings) -> Option<Blob>
    where
        C: PixelClassifier + ?Sized,
    {
        let raw_mask = mask::color_mask(frame, classifier);
        let cleaned = mask::clean(&raw_mask, settings.morphology_iterations);
        blob_from_mask(&cleaned, settings)
    }

    /// Steps 3 to 6 on an already cleaned mask.
    pub fn blob_from_mask(cleaned: &image::GrayImage, settings: &DetectorSettings) -> Option<Blob> {
        let contours = contour::outer_contours(cleaned);
        let largest = contour::largest_by_area(&contours)?;

        let circle = largest.min_enclosing_circle()?;
        let (cx, cy) = largest.moments().centroid()?;

        let radius = circle.radius as f32;
        if radius <= settings.min_radius {
            return None;
        }

        Some(Blob {
            center: Point::new(cx as i32, cy as i32),
            radius,
        })
    }

}

// THEORY:
// The `mask` module turns a color frame into a binary foreground image and then
// cleans it. The cleanup is a morphological opening: erosion strips isolated
// speckles and thin bridges, dilation grows the surviving regions back to their
// original extent. It removes sensor noise; it is not a shape filter.
//
// Iterating a 3x3 square kernel `n` times is the same as one pass with a
// (2n+1)x(2n+1) square, which is what an L-infinity distance of `n` gives us.

pub mod mask {
    use crate::core_modules::hsv::hsv::PixelClassifier;
    use image::{GrayImage, Luma, RgbImage};
    use imageproc::distance_transform::Norm;
    use imageproc::morphology::{dilate, erode};

    pub const FOREGROUND: u8 = 255;
    pub const BACKGROUND: u8 = 0;

    /// Marks every pixel the classifier accepts with `FOREGROUND`.
    pub fn color_mask<C>(frame: &RgbImage, classifier: &C) -> GrayImage
    where
        C: PixelClassifier + ?Sized,
    {
        GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
            if classifier.is_foreground(frame.get_pixel(x, y)) {
                Luma([FOREGROUND])
            } else {
                Luma([BACKGROUND])
            }
        })
    }

    /// Erosion followed by dilation, `iterations` passes of a 3x3 kernel each.
    pub fn clean(mask: &GrayImage, iterations: u8) -> GrayImage {
        if iterations == 0 {
            return mask.clone();
        }
        let eroded = erode(mask, Norm::LInf, iterations);
        dilate(&eroded, Norm::LInf, iterations)
    }

    pub fn foreground_count(mask: &GrayImage) -> usize {
        mask.pixels().filter(|p| p[0] != BACKGROUND).count()
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use image::Rgb;

        fn square_mask(size: u32, x0: u32, y0: u32, side: u32) -> GrayImage {
            GrayImage::from_fn(size, size, |x, y| {
                if x >= x0 && x < x0 + side && y >= y0 && y < y0 + side {
                    Luma([FOREGROUND])
                } else {
                    Luma([BACKGROUND])
                }
            })
        }

        #[test]
        fn color_mask_follows_classifier() {
            let mut frame = RgbImage::new(4, 1);
            frame.put_pixel(1, 0, Rgb([255, 255, 255]));
            frame.put_pixel(3, 0, Rgb([255, 255, 255]));
            let mask = color_mask(&frame, &|p: &Rgb<u8>| p[0] == 255);
            let row: Vec<u8> = mask.pixels().map(|p| p[0]).collect();
            assert_eq!(row, vec![0, 255, 0, 255]);
        }

        #[test]
        fn clean_removes_isolated_speckles() {
            let mut mask = GrayImage::new(40, 40);
            mask.put_pixel(5, 5, Luma([FOREGROUND]));
            mask.put_pixel(30, 12, Luma([FOREGROUND]));
            mask.put_pixel(31, 12, Luma([FOREGROUND]));
            let cleaned = clean(&mask, 2);
            assert_eq!(foreground_count(&cleaned), 0);
        }

        #[test]
        fn clean_preserves_solid_regions() {
            let mask = square_mask(60, 20, 20, 15);
            let cleaned = clean(&mask, 2);
            assert_eq!(foreground_count(&cleaned), 15 * 15);
            assert_eq!(cleaned.get_pixel(20, 20)[0], FOREGROUND);
            assert_eq!(cleaned.get_pixel(34, 34)[0], FOREGROUND);
        }

        #[test]
        fn zero_iterations_is_identity() {
            let mask = square_mask(10, 2, 2, 1);
            assert_eq!(clean(&mask, 0), mask);
        }
    }
}

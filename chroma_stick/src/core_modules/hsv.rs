// THEORY:
// The `hsv` module is the color-identification layer. It answers one question per
// pixel: "is this the marker's color?" Everything above it (masks, contours,
// blobs) is purely geometric and never looks at color again.
//
// Key architectural principles:
// 1.  **Lighting-robust color space**: RGB mixes "which color" with "how bright".
//     Hue/saturation/value pulls them apart, so a marker range can be wide in
//     value (shadows, highlights) and narrow in hue.
// 2.  **8-bit HSV convention**: hue is stored as degrees / 2 (0..=179) so all three
//     channels fit in a byte. Saturation and value span 0..=255. Ranges written for
//     other camera tooling using the same convention can be pasted in unchanged.
// 3.  **Pluggable predicate**: the detector only depends on `PixelClassifier`.
//     HSV ranges are one implementation; a closure is another. A different
//     foreground test can be substituted without touching anything downstream.

pub mod hsv {
    use image::Rgb;
    use serde::{Deserialize, Serialize};

    /// Largest hue value in the 8-bit convention.
    pub const MAX_HUE: u8 = 179;

    /// A single pixel expressed in 8-bit hue/saturation/value.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HsvPixel {
        pub hue: u8,
        pub saturation: u8,
        pub value: u8,
    }

    impl HsvPixel {
        pub fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
            let r = red as f32;
            let g = green as f32;
            let b = blue as f32;
            let maximum_channel = r.max(g.max(b));
            let minimum_channel = r.min(g.min(b));
            let chroma = maximum_channel - minimum_channel;

            let saturation = if maximum_channel <= 0.0 {
                0.0
            } else {
                (chroma * 255.0 / maximum_channel).round()
            };

            let hue_degrees = if chroma <= 0.0 {
                0.0
            } else {
                let raw = if maximum_channel == r {
                    60.0 * (g - b) / chroma
                } else if maximum_channel == g {
                    120.0 + 60.0 * (b - r) / chroma
                } else {
                    240.0 + 60.0 * (r - g) / chroma
                };
                if raw < 0.0 { raw + 360.0 } else { raw }
            };

            // 359.x degrees rounds up to 180, which is the same hue as 0.
            let hue = ((hue_degrees / 2.0).round() as u16 % (MAX_HUE as u16 + 1)) as u8;

            Self {
                hue,
                saturation: saturation as u8,
                value: maximum_channel as u8,
            }
        }

        pub fn channels(&self) -> [u8; 3] {
            [self.hue, self.saturation, self.value]
        }
    }

    impl From<&Rgb<u8>> for HsvPixel {
        fn from(pixel: &Rgb<u8>) -> Self {
            HsvPixel::from_rgb(pixel[0], pixel[1], pixel[2])
        }
    }

    /// Inclusive lower/upper bounds of an HSV box.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ColorRange {
        pub lower: [u8; 3],
        pub upper: [u8; 3],
    }

    impl ColorRange {
        pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
            Self { lower, upper }
        }

        pub fn contains(&self, pixel: &HsvPixel) -> bool {
            pixel
                .channels()
                .iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(channel, (low, high))| channel >= low && channel <= high)
        }
    }

    /// Anything that can label a pixel as marker (foreground) or not.
    pub trait PixelClassifier {
        fn is_foreground(&self, pixel: &Rgb<u8>) -> bool;
    }

    impl PixelClassifier for ColorRange {
        fn is_foreground(&self, pixel: &Rgb<u8>) -> bool {
            self.contains(&HsvPixel::from(pixel))
        }
    }

    impl<F> PixelClassifier for F
    where
        F: Fn(&Rgb<u8>) -> bool,
    {
        fn is_foreground(&self, pixel: &Rgb<u8>) -> bool {
            self(pixel)
        }
    }

    /// A marker color made of one or more HSV ranges whose masks are OR-ed.
    /// Red needs two: its hue wraps around from 179 back to 0.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MarkerColor {
        pub ranges: Vec<ColorRange>,
    }

    impl MarkerColor {
        pub fn new(ranges: Vec<ColorRange>) -> Self {
            Self { ranges }
        }

        pub fn single(range: ColorRange) -> Self {
            Self { ranges: vec![range] }
        }
    }

    impl PixelClassifier for MarkerColor {
        fn is_foreground(&self, pixel: &Rgb<u8>) -> bool {
            let hsv = HsvPixel::from(pixel);
            self.ranges.iter().any(|range| range.contains(&hsv))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn primary_colors_land_on_expected_hues() {
            assert_eq!(HsvPixel::from_rgb(255, 0, 0).channels(), [0, 255, 255]);
            assert_eq!(HsvPixel::from_rgb(0, 255, 0).channels(), [60, 255, 255]);
            assert_eq!(HsvPixel::from_rgb(0, 0, 255).channels(), [120, 255, 255]);
        }

        #[test]
        fn gray_has_no_hue_or_saturation() {
            let hsv = HsvPixel::from_rgb(128, 128, 128);
            assert_eq!(hsv.hue, 0);
            assert_eq!(hsv.saturation, 0);
            assert_eq!(hsv.value, 128);
        }

        #[test]
        fn black_is_all_zero() {
            assert_eq!(HsvPixel::from_rgb(0, 0, 0).channels(), [0, 0, 0]);
        }

        #[test]
        fn hue_just_below_red_wraps_to_zero() {
            // 359.x degrees: red with a trace of blue.
            let hsv = HsvPixel::from_rgb(255, 0, 1);
            assert_eq!(hsv.hue, 0);
        }

        #[test]
        fn range_bounds_are_inclusive() {
            let range = ColorRange::new([90, 80, 50], [130, 255, 255]);
            let at_lower = HsvPixel { hue: 90, saturation: 80, value: 50 };
            let at_upper = HsvPixel { hue: 130, saturation: 255, value: 255 };
            let below = HsvPixel { hue: 89, saturation: 200, value: 200 };
            assert!(range.contains(&at_lower));
            assert!(range.contains(&at_upper));
            assert!(!range.contains(&below));
        }

        #[test]
        fn marker_color_ors_its_ranges() {
            let red = MarkerColor::new(vec![
                ColorRange::new([0, 120, 70], [10, 255, 255]),
                ColorRange::new([170, 120, 70], [179, 255, 255]),
            ]);
            // Magenta-leaning red sits at the top of the hue circle.
            assert!(red.is_foreground(&Rgb([255, 0, 60])));
            assert!(red.is_foreground(&Rgb([255, 20, 0])));
            assert!(!red.is_foreground(&Rgb([0, 0, 255])));
        }

        #[test]
        fn closures_are_classifiers() {
            let bright = |pixel: &Rgb<u8>| pixel[0] > 200;
            assert!(bright.is_foreground(&Rgb([250, 0, 0])));
            assert!(!bright.is_foreground(&Rgb([10, 0, 0])));
        }
    }
}

use chroma_stick::core_modules::blob_detector::blob_detector::{self, DetectorSettings};
use chroma_stick::core_modules::direction::{Direction, direction_mapper};
use chroma_stick::core_modules::hsv::hsv::{ColorRange, HsvPixel, MAX_HUE};
use chroma_stick::core_modules::keys::{EmissionMode, KeyCommand, KeySet, KeyState, KeySymbol};
use chroma_stick::core_modules::mask::mask::FOREGROUND;
use chroma_stick::core_modules::presence::PresenceEdgeState;
use image::{GrayImage, Luma, Rgb, RgbImage};
use proptest::prelude::*;

const BLUE: Rgb<u8> = Rgb([20, 40, 220]);
const BACKDROP: Rgb<u8> = Rgb([90, 90, 90]);

fn disk_frame(cx: i32, cy: i32, radius: i32) -> RgbImage {
    let mut image = RgbImage::from_pixel(200, 200, BACKDROP);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let (dx, dy) = (x as i32 - cx, y as i32 - cy);
        if dx * dx + dy * dy <= radius * radius {
            *pixel = BLUE;
        }
    }
    image
}

fn blue() -> ColorRange {
    ColorRange::new([90, 80, 50], [130, 255, 255])
}

fn key_set() -> impl Strategy<Value = KeySet> {
    proptest::bits::u8::between(0, 5).prop_map(|bits| {
        let mut set = KeySet::EMPTY;
        for symbol in KeySymbol::ALL {
            if bits & (1 << symbol as u8) != 0 {
                set.insert(symbol);
            }
        }
        set
    })
}

proptest! {
    #[test]
    fn small_disks_are_never_reported(
        cx in 40i32..160,
        cy in 40i32..160,
        radius in 1i32..=10,
    ) {
        let blob = blob_detector::find_blob(&disk_frame(cx, cy, radius), &blue(), &DetectorSettings::default());
        prop_assert!(blob.is_none());
    }

    #[test]
    fn any_mask_inside_a_small_window_is_noise(
        bits in proptest::collection::vec(any::<bool>(), 14 * 14),
        ox in 0u32..180,
        oy in 0u32..180,
    ) {
        let mut mask = GrayImage::new(200, 200);
        for (i, on) in bits.iter().enumerate() {
            if *on {
                let (x, y) = (i as u32 % 14, i as u32 / 14);
                mask.put_pixel(ox + x, oy + y, Luma([FOREGROUND]));
            }
        }
        prop_assert!(blob_detector::blob_from_mask(&mask, &DetectorSettings::default()).is_none());
    }

    #[test]
    fn large_disks_are_found_near_their_center(
        cx in 60i32..140,
        cy in 60i32..140,
        radius in 14i32..=40,
    ) {
        let blob = blob_detector::find_blob(&disk_frame(cx, cy, radius), &blue(), &DetectorSettings::default());
        let blob = blob.expect("disk should be detected");
        prop_assert!((blob.center.x - cx).abs() <= 1);
        prop_assert!((blob.center.y - cy).abs() <= 1);
        prop_assert!(blob.radius > 10.0);
        prop_assert!(blob.radius <= radius as f32 + 0.5);
    }

    #[test]
    fn inside_the_deadzone_is_neutral(
        deadzone in 1u32..200,
        fx in -1.0f64..=1.0,
        fy in -1.0f64..=1.0,
    ) {
        let dx = (fx * deadzone as f64) as i32;
        let dy = (fy * deadzone as f64) as i32;
        prop_assert!(direction_mapper::map_displacement(dx, dy, deadzone).is_empty());
    }

    #[test]
    fn one_axis_past_the_deadzone_gives_one_direction(
        deadzone in 1u32..200,
        excess in 1i32..500,
        negative in any::<bool>(),
        horizontal in any::<bool>(),
        other_fraction in -1.0f64..=1.0,
    ) {
        let far = (deadzone as i32 + excess) * if negative { -1 } else { 1 };
        let near = (other_fraction * deadzone as f64) as i32;
        let (dx, dy) = if horizontal { (far, near) } else { (near, far) };

        let set = direction_mapper::map_displacement(dx, dy, deadzone);
        let expected = match (horizontal, negative) {
            (true, true) => Direction::Left,
            (true, false) => Direction::Right,
            (false, true) => Direction::Up,
            (false, false) => Direction::Down,
        };
        prop_assert_eq!(set.iter().collect::<Vec<_>>(), vec![expected]);
    }

    #[test]
    fn both_axes_past_the_deadzone_give_two_directions(
        deadzone in 1u32..200,
        ex in 1i32..500,
        ey in 1i32..500,
        left in any::<bool>(),
        up in any::<bool>(),
    ) {
        let dx = (deadzone as i32 + ex) * if left { -1 } else { 1 };
        let dy = (deadzone as i32 + ey) * if up { -1 } else { 1 };
        let set = direction_mapper::map_displacement(dx, dy, deadzone);
        prop_assert_eq!(set.len(), 2);
        prop_assert_eq!(set.vertical(), Some(if up { Direction::Up } else { Direction::Down }));
        prop_assert_eq!(set.horizontal(), Some(if left { Direction::Left } else { Direction::Right }));
    }

    #[test]
    fn action_fires_once_per_disappearance(visibility in proptest::collection::vec(any::<bool>(), 0..64)) {
        let mut presence = PresenceEdgeState::default();
        let mut previous = false;
        for visible in visibility {
            let fired = presence.observe(visible).is_some();
            prop_assert_eq!(fired, previous && !visible);
            previous = visible;
        }
    }

    #[test]
    fn diff_emission_reaches_the_desired_set(
        steps in proptest::collection::vec(key_set(), 1..20),
    ) {
        let mut state = KeyState::default();
        let mut service = KeySet::EMPTY;
        for desired in steps {
            for command in state.transition(desired, EmissionMode::Diff) {
                match command {
                    KeyCommand::Down(symbol) => {
                        prop_assert!(!service.contains(symbol), "pressed twice: {symbol}");
                        service.insert(symbol);
                    }
                    KeyCommand::Up(symbol) => {
                        prop_assert!(service.contains(symbol), "released while up: {symbol}");
                        service.remove(symbol);
                    }
                }
            }
            prop_assert_eq!(service, desired);
            prop_assert_eq!(state.held(), desired);
        }
    }

    #[test]
    fn hsv_channels_stay_in_range(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
        let pixel = HsvPixel::from_rgb(r, g, b);
        prop_assert!(pixel.hue <= MAX_HUE);
        prop_assert_eq!(pixel.value, r.max(g).max(b));
    }
}

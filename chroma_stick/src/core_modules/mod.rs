pub mod blob;
pub mod blob_detector;
pub mod calibration;
pub mod contour;
pub mod direction;
pub mod hsv;
pub mod keys;
pub mod mask;
pub mod presence;

//! OpenCV capture device as a `FrameSource`.

use chroma_stick::config::StickConfig;
use chroma_stick::control_loop::FrameSource;
use chroma_stick::error::StickError;
use image::RgbImage;
use opencv::{
    core::{self, Mat},
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};
use tracing::{info, warn};

pub struct CameraSource {
    capture: VideoCapture,
    mirror: bool,
    frame: Mat,
}

impl CameraSource {
    pub fn open(config: &StickConfig) -> Result<Self, StickError> {
        let mut capture = VideoCapture::new(config.camera_index, videoio::CAP_ANY).map_err(cv_error)?;
        if !capture.is_opened().map_err(cv_error)? {
            return Err(StickError::FrameSource(format!(
                "could not open camera {}",
                config.camera_index
            )));
        }
        capture
            .set(videoio::CAP_PROP_FRAME_WIDTH, config.frame_width as f64)
            .map_err(cv_error)?;
        capture
            .set(videoio::CAP_PROP_FRAME_HEIGHT, config.frame_height as f64)
            .map_err(cv_error)?;

        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH).map_err(cv_error)? as u32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT).map_err(cv_error)? as u32;
        if (width, height) != (config.frame_width, config.frame_height) {
            warn!(width, height, "camera ignored the requested frame size");
        }
        info!(index = config.camera_index, width, height, "camera opened");

        Ok(Self {
            capture,
            mirror: config.mirror,
            frame: Mat::default(),
        })
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>, StickError> {
        let grabbed = self.capture.read(&mut self.frame).map_err(cv_error)?;
        if is_end_of_stream(grabbed, &self.frame) {
            info!("camera returned no frame, treating it as end of stream");
            return Ok(None);
        }

        let mut oriented = Mat::default();
        if self.mirror {
            core::flip(&self.frame, &mut oriented, 1).map_err(cv_error)?;
        } else {
            oriented = self.frame.clone();
        }

        let mut rgb = Mat::default();
        imgproc::cvt_color(&oriented, &mut rgb, imgproc::COLOR_BGR2RGB, 0).map_err(cv_error)?;
        let bytes = rgb.data_bytes().map_err(cv_error)?.to_vec();
        RgbImage::from_raw(rgb.cols() as u32, rgb.rows() as u32, bytes)
            .map(Some)
            .ok_or_else(|| StickError::FrameSource("frame buffer has an unexpected size".to_string()))
    }
}

/// A device that stops delivering frames has ended, it has not failed.
fn is_end_of_stream(grabbed: bool, frame: &Mat) -> bool {
    !grabbed || frame.empty()
}

pub fn cv_error(err: opencv::Error) -> StickError {
    StickError::FrameSource(err.to_string())
}

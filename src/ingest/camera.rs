/// Live camera capture
///
/// A `CameraSession` owns an open stream for as long as the capture view is
/// shown. The stream is stopped exactly once: on capture, on cancel, or when
/// the session is dropped, whichever happens first.
///
/// The device itself lives on a dedicated capture thread. The UI thread only
/// ever reads the most recent frame that thread published, so neither opening
/// the device nor waiting for the next frame can stall the interface.

use iced::widget::image::Handle;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use thiserror::Error;

use crate::state::data::ImageData;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CaptureError {
    #[error("No camera was found on this device.")]
    NoDevice,
    #[error("Camera access was denied: {0}")]
    PermissionDenied(String),
    #[error("The camera is still starting. Try again in a moment.")]
    NotReady,
    #[error("Camera stream failed: {0}")]
    Stream(String),
    #[error("Could not encode the captured frame: {0}")]
    Encode(String),
}

/// An open, running video stream
pub trait CameraStream {
    /// Most recent frame, `None` until the device has delivered one. Never blocks.
    fn latest_frame(&mut self) -> Result<Option<RgbImage>, CaptureError>;
    /// Release the underlying device
    fn stop(&mut self);
}

/// Something that can open a camera stream
pub trait CameraBackend {
    fn open(&self) -> Result<Box<dyn CameraStream>, CaptureError>;
}

/// Scoped ownership of an open camera stream
pub struct CameraSession {
    stream: Option<Box<dyn CameraStream>>,
}

impl CameraSession {
    pub fn open(backend: &dyn CameraBackend) -> Result<Self, CaptureError> {
        let stream = backend.open()?;
        tracing::info!("📷 Camera stream opened");
        Ok(Self { stream: Some(stream) })
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Latest frame for the live preview, if one has arrived
    pub fn preview(&mut self) -> Result<Option<Handle>, CaptureError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| CaptureError::Stream("stream already released".to_string()))?;

        Ok(stream.latest_frame()?.map(|frame| {
            let (width, height) = frame.dimensions();
            let rgba = DynamicImage::ImageRgb8(frame).into_rgba8();
            Handle::from_rgba(width, height, rgba.into_raw())
        }))
    }

    /// Take a still, release the camera, and encode the still as JPEG
    pub fn capture(mut self) -> Result<ImageData, CaptureError> {
        let frame = match self.stream.as_mut() {
            Some(stream) => stream.latest_frame(),
            None => Err(CaptureError::Stream("stream already released".to_string())),
        };
        self.release();

        encode_still(frame?.ok_or(CaptureError::NotReady)?)
    }

    /// Close without capturing
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            tracing::info!("📷 Camera stream released");
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// Encode a sampled frame the same way file uploads are held
pub fn encode_still(frame: RgbImage) -> Result<ImageData, CaptureError> {
    let mut jpeg = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(frame)
        .write_to(&mut jpeg, ImageFormat::Jpeg)
        .map_err(|e| CaptureError::Encode(e.to_string()))?;

    ImageData::from_encoded("image/jpeg", jpeg.into_inner()).map_err(|e| CaptureError::Encode(e.to_string()))
}

/// What the capture thread has produced so far
#[derive(Debug, Default)]
enum Feed {
    #[default]
    Starting,
    Frame(RgbImage),
    Failed(CaptureError),
}

/// Hand-off point between the capture thread and the UI thread
#[derive(Debug, Clone, Default)]
struct FrameSlot {
    feed: Arc<Mutex<Feed>>,
}

impl FrameSlot {
    fn set(&self, feed: Feed) {
        *self.feed.lock().unwrap_or_else(PoisonError::into_inner) = feed;
    }

    fn publish(&self, frame: RgbImage) {
        self.set(Feed::Frame(frame));
    }

    fn fail(&self, error: CaptureError) {
        self.set(Feed::Failed(error));
    }

    fn latest(&self) -> Result<Option<RgbImage>, CaptureError> {
        match &*self.feed.lock().unwrap_or_else(PoisonError::into_inner) {
            Feed::Starting => Ok(None),
            Feed::Frame(frame) => Ok(Some(frame.clone())),
            Feed::Failed(error) => Err(error.clone()),
        }
    }
}

/// Webcam access through nokhwa's native backend
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeCamera;

impl CameraBackend for NativeCamera {
    fn open(&self) -> Result<Box<dyn CameraStream>, CaptureError> {
        let slot = FrameSlot::default();
        let running = Arc::new(AtomicBool::new(true));

        let worker_slot = slot.clone();
        let worker_running = running.clone();
        thread::Builder::new()
            .name("camera-capture".to_string())
            .spawn(move || run_capture(worker_slot, worker_running))
            .map_err(|e| CaptureError::Stream(e.to_string()))?;

        Ok(Box::new(NativeStream { slot, running }))
    }
}

/// Capture thread body: open the device, then publish frames until told to stop
fn run_capture(slot: FrameSlot, running: Arc<AtomicBool>) {
    let mut camera = match open_device() {
        Ok(camera) => camera,
        Err(e) => {
            tracing::warn!("⚠️  Camera failed to open: {}", e);
            slot.fail(e);
            return;
        }
    };

    while running.load(Ordering::Acquire) {
        match read_frame(&mut camera) {
            Ok(frame) => slot.publish(frame),
            Err(e) => {
                slot.fail(e);
                break;
            }
        }
    }

    if let Err(e) = camera.stop_stream() {
        tracing::warn!("⚠️  Failed to stop camera stream: {}", e);
    }
    tracing::debug!("Camera capture thread finished");
}

fn open_device() -> Result<nokhwa::Camera, CaptureError> {
    use nokhwa::pixel_format::RgbFormat;
    use nokhwa::utils::{ApiBackend, RequestedFormat, RequestedFormatType};

    let devices = nokhwa::query(ApiBackend::Auto).map_err(|e| classify(e.to_string()))?;
    let device = devices.first().ok_or(CaptureError::NoDevice)?;
    tracing::debug!("Using camera {}", device.human_name());

    let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
    let mut camera = nokhwa::Camera::new(device.index().clone(), requested).map_err(|e| classify(e.to_string()))?;
    camera.open_stream().map_err(|e| classify(e.to_string()))?;
    Ok(camera)
}

/// Blocks until the device delivers the next frame
fn read_frame(camera: &mut nokhwa::Camera) -> Result<RgbImage, CaptureError> {
    use nokhwa::pixel_format::RgbFormat;

    let buffer = camera.frame().map_err(|e| CaptureError::Stream(e.to_string()))?;
    let decoded = buffer
        .decode_image::<RgbFormat>()
        .map_err(|e| CaptureError::Stream(e.to_string()))?;

    let (width, height) = (decoded.width(), decoded.height());
    RgbImage::from_raw(width, height, decoded.into_raw())
        .ok_or_else(|| CaptureError::Stream("frame buffer has the wrong size".to_string()))
}

/// Opening failures mentioning permissions are reported as such
fn classify(message: String) -> CaptureError {
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("not authorized") {
        CaptureError::PermissionDenied(message)
    } else {
        CaptureError::Stream(message)
    }
}

/// UI-side handle on the capture thread
struct NativeStream {
    slot: FrameSlot,
    running: Arc<AtomicBool>,
}

impl CameraStream for NativeStream {
    fn latest_frame(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        self.slot.latest()
    }

    /// Signals the thread and returns; the device is released once the
    /// in-flight frame read completes
    fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct FakeStream {
        stops: Rc<Cell<usize>>,
        broken: bool,
        warming_up: bool,
    }

    impl CameraStream for FakeStream {
        fn latest_frame(&mut self) -> Result<Option<RgbImage>, CaptureError> {
            if self.broken {
                return Err(CaptureError::Stream("unplugged".to_string()));
            }
            if self.warming_up {
                return Ok(None);
            }
            Ok(Some(RgbImage::from_pixel(32, 24, image::Rgb([10, 200, 30]))))
        }

        fn stop(&mut self) {
            self.stops.set(self.stops.get() + 1);
        }
    }

    struct FakeCamera {
        stops: Rc<Cell<usize>>,
        broken: bool,
        warming_up: bool,
        missing: bool,
    }

    impl FakeCamera {
        fn new() -> Self {
            Self {
                stops: Rc::new(Cell::new(0)),
                broken: false,
                warming_up: false,
                missing: false,
            }
        }
    }

    impl CameraBackend for FakeCamera {
        fn open(&self) -> Result<Box<dyn CameraStream>, CaptureError> {
            if self.missing {
                return Err(CaptureError::NoDevice);
            }
            Ok(Box::new(FakeStream {
                stops: self.stops.clone(),
                broken: self.broken,
                warming_up: self.warming_up,
            }))
        }
    }

    #[test]
    fn test_capture_encodes_jpeg_and_releases() {
        let camera = FakeCamera::new();
        let session = CameraSession::open(&camera).unwrap();

        let still = session.capture().unwrap();
        assert_eq!(still.media_type(), "image/jpeg");
        assert_eq!(still.dimensions(), (32, 24));
        assert_eq!(camera.stops.get(), 1);
    }

    #[test]
    fn test_failed_capture_still_releases() {
        let mut camera = FakeCamera::new();
        camera.broken = true;
        let session = CameraSession::open(&camera).unwrap();

        assert!(session.capture().is_err());
        assert_eq!(camera.stops.get(), 1);
    }

    #[test]
    fn test_preview_before_first_frame() {
        let mut camera = FakeCamera::new();
        camera.warming_up = true;
        let mut session = CameraSession::open(&camera).unwrap();

        assert!(session.preview().unwrap().is_none());
        assert_eq!(session.capture().unwrap_err(), CaptureError::NotReady);
        assert_eq!(camera.stops.get(), 1);
    }

    #[test]
    fn test_cancel_releases_once() {
        let camera = FakeCamera::new();
        let session = CameraSession::open(&camera).unwrap();
        session.cancel();
        assert_eq!(camera.stops.get(), 1);
    }

    #[test]
    fn test_drop_releases() {
        let camera = FakeCamera::new();
        {
            let mut session = CameraSession::open(&camera).unwrap();
            assert!(session.is_open());
            assert!(session.preview().unwrap().is_some());
        }
        assert_eq!(camera.stops.get(), 1);
    }

    #[test]
    fn test_open_failure() {
        let mut camera = FakeCamera::new();
        camera.missing = true;
        assert_eq!(CameraSession::open(&camera).err(), Some(CaptureError::NoDevice));
        assert_eq!(camera.stops.get(), 0);
    }

    #[test]
    fn test_frame_slot_hand_off() {
        let slot = FrameSlot::default();
        assert_eq!(slot.latest(), Ok(None));

        let frame = RgbImage::from_pixel(4, 3, image::Rgb([1, 2, 3]));
        slot.publish(frame.clone());
        assert_eq!(slot.latest(), Ok(Some(frame.clone())));
        // Reading does not consume the frame
        assert_eq!(slot.latest(), Ok(Some(frame)));

        slot.fail(CaptureError::NoDevice);
        assert_eq!(slot.latest(), Err(CaptureError::NoDevice));
    }

    #[test]
    fn test_frames_cross_threads() {
        let slot = FrameSlot::default();
        let producer = slot.clone();
        thread::spawn(move || producer.publish(RgbImage::from_pixel(2, 2, image::Rgb([7, 7, 7]))))
            .join()
            .unwrap();

        assert_eq!(slot.latest().unwrap().map(|frame| frame.dimensions()), Some((2, 2)));
    }

    #[test]
    fn test_native_stream_stop_signals_thread() {
        let running = Arc::new(AtomicBool::new(true));
        let mut stream = NativeStream {
            slot: FrameSlot::default(),
            running: running.clone(),
        };

        assert_eq!(stream.latest_frame(), Ok(None));
        stream.stop();
        assert!(!running.load(Ordering::Acquire));
    }

    #[test]
    fn test_classify_permission_errors() {
        assert!(matches!(
            classify("Permission denied (os error 13)".to_string()),
            CaptureError::PermissionDenied(_)
        ));
        assert!(matches!(classify("device busy".to_string()), CaptureError::Stream(_)));
    }
}

//! QR scanner panel. Owns the camera stream and the decoder while open and
//! releases both on every exit path.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::qr::{self, ScanMatch};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FacingMode {
    /// Back camera.
    #[default]
    Environment,
    /// Front camera.
    User,
}

impl FacingMode {
    pub fn toggled(self) -> Self {
        match self {
            FacingMode::Environment => FacingMode::User,
            FacingMode::User => FacingMode::Environment,
        }
    }
}

/// Camera failures, each with the message shown before falling back to
/// manual code entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("Camera access was denied. Please allow access and try again.")]
    PermissionDenied,

    #[error("No camera was found on this device.")]
    NoCamera,

    #[error("QR scanner unavailable. Please enter the code manually.")]
    DecoderUnavailable,

    #[error("Unable to access the camera.")]
    Unavailable(String),
}

#[automock]
pub trait CameraStream: Send {
    /// Stops every track of the stream.
    fn stop(&mut self);
}

#[automock]
#[async_trait]
pub trait CameraDevice: Send + Sync {
    async fn open(&self, facing: FacingMode) -> Result<Box<dyn CameraStream>, CameraError>;
}

#[automock]
pub trait QrDecoder: Send {
    fn start(&mut self);
    fn reset(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// A deposit code was found; the panel has closed itself.
    Accepted(ScanMatch),
    /// Decoded text without a code; the panel keeps scanning.
    Rejected(String),
}

pub struct ScannerPanel {
    camera: Arc<dyn CameraDevice>,
    decoder: Option<Box<dyn QrDecoder>>,
    facing: FacingMode,
    stream: Option<Box<dyn CameraStream>>,
}

impl ScannerPanel {
    /// `decoder` is `None` when no QR decoding library is available.
    pub fn new(camera: Arc<dyn CameraDevice>, decoder: Option<Box<dyn QrDecoder>>) -> Self {
        Self {
            camera,
            decoder,
            facing: FacingMode::default(),
            stream: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    pub async fn open(&mut self) -> Result<(), CameraError> {
        if self.is_open() {
            return Ok(());
        }
        let Some(decoder) = self.decoder.as_mut() else {
            return Err(CameraError::DecoderUnavailable);
        };

        let stream = self.camera.open(self.facing).await.inspect_err(|err| {
            tracing::warn!(error = %err, facing = ?self.facing, "camera unavailable");
        })?;
        decoder.start();
        self.stream = Some(stream);
        Ok(())
    }

    pub fn close(&mut self) {
        let Some(mut stream) = self.stream.take() else {
            return;
        };
        stream.stop();
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.reset();
        }
    }

    /// Flips between front and back camera, restarting the stream if open.
    pub async fn switch_camera(&mut self) -> Result<(), CameraError> {
        self.facing = self.facing.toggled();
        if self.is_open() {
            self.close();
            self.open().await?;
        }
        Ok(())
    }

    pub fn on_decoded(&mut self, text: &str) -> ScanOutcome {
        match qr::extract(text) {
            Some(found) => {
                tracing::debug!(code = %found.code, source = ?found.source, "QR code accepted");
                self.close();
                ScanOutcome::Accepted(found)
            }
            None => ScanOutcome::Rejected(text.to_string()),
        }
    }
}

impl Drop for ScannerPanel {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn releasing_stream() -> Box<dyn CameraStream> {
        let mut stream = MockCameraStream::new();
        stream.expect_stop().times(1).return_const(());
        Box::new(stream)
    }

    fn camera(opens: usize) -> Arc<dyn CameraDevice> {
        let mut camera = MockCameraDevice::new();
        camera
            .expect_open()
            .times(opens)
            .returning(|_| Ok(releasing_stream()));
        Arc::new(camera)
    }

    fn decoder(cycles: usize) -> Box<dyn QrDecoder> {
        let mut decoder = MockQrDecoder::new();
        decoder.expect_start().times(cycles).return_const(());
        decoder.expect_reset().times(cycles).return_const(());
        Box::new(decoder)
    }

    #[tokio::test]
    async fn close_releases_stream_and_decoder() {
        let mut panel = ScannerPanel::new(camera(1), Some(decoder(1)));
        panel.open().await.unwrap();
        assert!(panel.is_open());

        panel.close();
        assert!(!panel.is_open());
        panel.close();
    }

    #[tokio::test]
    async fn accepted_code_closes_panel() {
        let mut panel = ScannerPanel::new(camera(1), Some(decoder(1)));
        panel.open().await.unwrap();

        assert_eq!(
            panel.on_decoded("hello world"),
            ScanOutcome::Rejected("hello world".into())
        );
        assert!(panel.is_open());

        match panel.on_decoded("https://x/y?dv=dv123") {
            ScanOutcome::Accepted(found) => assert_eq!(found.code, "DV123"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!panel.is_open());
    }

    #[tokio::test]
    async fn switch_restarts_with_other_camera() {
        let mut camera = MockCameraDevice::new();
        let mut seq = mockall::Sequence::new();
        camera
            .expect_open()
            .withf(|facing| *facing == FacingMode::Environment)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(releasing_stream()));
        camera
            .expect_open()
            .withf(|facing| *facing == FacingMode::User)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(releasing_stream()));

        let mut panel = ScannerPanel::new(Arc::new(camera), Some(decoder(2)));
        panel.open().await.unwrap();
        panel.switch_camera().await.unwrap();
        assert_eq!(panel.facing(), FacingMode::User);
        panel.close();
    }

    #[tokio::test]
    async fn drop_releases_open_stream() {
        let mut panel = ScannerPanel::new(camera(1), Some(decoder(1)));
        panel.open().await.unwrap();
        drop(panel);
    }

    #[tokio::test]
    async fn camera_errors_leave_panel_closed() {
        let mut camera = MockCameraDevice::new();
        camera
            .expect_open()
            .returning(|_| Err(CameraError::PermissionDenied));
        let mut decoder = MockQrDecoder::new();
        decoder.expect_start().never();
        decoder.expect_reset().never();

        let mut panel = ScannerPanel::new(Arc::new(camera), Some(Box::new(decoder)));
        assert_eq!(panel.open().await, Err(CameraError::PermissionDenied));
        assert!(!panel.is_open());
    }

    #[tokio::test]
    async fn missing_decoder_is_reported() {
        let mut camera = MockCameraDevice::new();
        camera.expect_open().never();
        let mut panel = ScannerPanel::new(Arc::new(camera), None);
        assert_eq!(panel.open().await, Err(CameraError::DecoderUnavailable));
    }
}

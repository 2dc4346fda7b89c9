//! Frame supply for the billboard texture.
//!
//! Decoding real video is left to the host: anything that can hand out RGBA8
//! frames in a loop can drive the swarm through [`VideoSource`].

use thiserror::Error;

/// Why a frame cannot be uploaded. The renderer keeps showing the previous
/// frame instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VideoFrameError {
    #[error("frame is empty ({width}x{height})")]
    Empty { width: u32, height: u32 },

    #[error("frame of {width}x{height} exceeds the {max_dimension} texel texture limit")]
    TooLarge { width: u32, height: u32, max_dimension: u32 },

    #[error("frame of {width}x{height} needs {expected} bytes, got {actual}")]
    Truncated { width: u32, height: u32, expected: usize, actual: usize },
}

/// One decoded RGBA8 frame, rows top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self { width, height, pixels }
    }

    /// A frame of a single color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba.repeat((width * height) as usize);
        Self { width, height, pixels }
    }

    /// Checks that the frame can back a texture of at most `max_dimension`
    /// texels per side.
    pub fn validate(&self, max_dimension: u32) -> Result<(), VideoFrameError> {
        let (width, height) = (self.width, self.height);
        if width == 0 || height == 0 {
            return Err(VideoFrameError::Empty { width, height });
        }
        if width > max_dimension || height > max_dimension {
            return Err(VideoFrameError::TooLarge { width, height, max_dimension });
        }
        let expected = width as usize * height as usize * 4;
        if self.pixels.len() < expected {
            return Err(VideoFrameError::Truncated { width, height, expected, actual: self.pixels.len() });
        }
        Ok(())
    }
}

/// A looping stream of frames. Frames advance monotonically and wrap at the
/// end of the clip.
pub trait VideoSource {
    /// False until the first frame can be produced; the frame loop does not
    /// start before that.
    fn is_ready(&self) -> bool;

    /// The frame to show this tick, or `None` when nothing new is available.
    fn next_frame(&mut self) -> Option<VideoFrame>;
}

/// A synthetic clip: a dark, slowly breathing skull-like mask on a white
/// background, which the chroma key cuts out.
pub struct ProceduralClip {
    size: u32,
    frame_count: u32,
    frame_index: u32,
}

impl ProceduralClip {
    pub fn new(size: u32, frame_count: u32) -> Self {
        assert!(size > 0 && frame_count > 0, "clip must have pixels and frames");
        Self { size, frame_count, frame_index: 0 }
    }

    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    fn render_frame(&self, frame_index: u32) -> VideoFrame {
        let phase = frame_index as f32 / self.frame_count as f32 * std::f32::consts::TAU;
        let scale = 0.8 + 0.1 * phase.sin();
        let size = self.size as f32;
        let mut pixels = Vec::with_capacity((self.size * self.size * 4) as usize);

        for y in 0..self.size {
            for x in 0..self.size {
                // Centered coordinates in [-1, 1], y pointing up.
                let u = (x as f32 + 0.5) / size * 2.0 - 1.0;
                let v = 1.0 - (y as f32 + 0.5) / size * 2.0;

                let cranium = (u * u + (v - 0.15) * (v - 0.15)) < 0.45 * scale;
                let jaw = u.abs() < 0.35 * scale && v < -0.2 && v > -0.7 * scale;
                let eye = ((u.abs() - 0.25) * (u.abs() - 0.25) + (v - 0.1) * (v - 0.1)) < 0.02;

                let rgba = if (cranium || jaw) && !eye {
                    let glow = (0.5 + 0.5 * (phase + u * 3.0).cos()) * 120.0;
                    [60 + glow as u8, 40, 90 + (glow * 0.5) as u8, 255]
                } else if eye {
                    [220, 30, 20, 255]
                } else {
                    [255, 255, 255, 255]
                };
                pixels.extend_from_slice(&rgba);
            }
        }

        VideoFrame::new(self.size, self.size, pixels)
    }
}

impl VideoSource for ProceduralClip {
    fn is_ready(&self) -> bool {
        true
    }

    fn next_frame(&mut self) -> Option<VideoFrame> {
        let frame = self.render_frame(self.frame_index);
        self.frame_index = (self.frame_index + 1) % self.frame_count;
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn procedural_clip_loops() {
        let mut clip = ProceduralClip::new(8, 3);
        let first = clip.next_frame().unwrap();
        clip.next_frame();
        clip.next_frame();
        assert_eq!(clip.frame_index(), 0);
        assert_eq!(clip.next_frame().unwrap(), first);
    }

    #[test]
    fn procedural_clip_corners_are_keyed_white() {
        let frame = ProceduralClip::new(16, 4).next_frame().unwrap();
        assert_eq!(&frame.pixels[0..4], &[255, 255, 255, 255]);
    }

    #[test]
    fn well_formed_frames_validate() {
        assert_eq!(VideoFrame::solid(4, 2, [0; 4]).validate(8), Ok(()));
        assert_eq!(ProceduralClip::new(16, 1).next_frame().unwrap().validate(16), Ok(()));
    }

    #[test]
    fn malformed_frames_are_rejected() {
        assert_eq!(
            VideoFrame::new(0, 0, Vec::new()).validate(8),
            Err(VideoFrameError::Empty { width: 0, height: 0 })
        );
        assert_eq!(
            VideoFrame::new(4, 4, vec![0; 16]).validate(8),
            Err(VideoFrameError::Truncated { width: 4, height: 4, expected: 64, actual: 16 })
        );
        assert_eq!(
            VideoFrame::solid(9, 1, [0; 4]).validate(8),
            Err(VideoFrameError::TooLarge { width: 9, height: 1, max_dimension: 8 })
        );
    }

    #[test]
    fn solid_frame_has_one_color() {
        let frame = VideoFrame::solid(2, 3, [1, 2, 3, 4]);
        assert_eq!(frame.pixels.len(), 24);
        assert!(frame.pixels.chunks(4).all(|p| p == [1, 2, 3, 4]));
    }
}

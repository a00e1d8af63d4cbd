//! Synthetic labelled frames: a few shapes drifting across the image.

use std::num::NonZeroUsize;

/// Number of distinct frames; frame indices wrap around.
pub const FRAME_COUNT: usize = 10;

/// A labelled shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// A filled disc centred on `(x, y)`.
    Circle { x: usize, y: usize, radius: usize },
    /// A filled square whose top-left corner is `(x, y)`.
    Square { x: usize, y: usize, side: usize },
}

impl Shape {
    pub fn contains(&self, px: usize, py: usize) -> bool {
        match *self {
            Shape::Circle { x, y, radius } => {
                let dx = px as i64 - x as i64;
                let dy = py as i64 - y as i64;
                let r = radius as i64;
                dx * dx + dy * dy <= r * r
            }
            Shape::Square { x, y, side } => {
                (x..x + side).contains(&px) && (y..y + side).contains(&py)
            }
        }
    }
}

/// One pixel as the accelerator consumes it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Collect {
    pub in_label: bool,
    pub x: usize,
    pub y: usize,
    pub has_red: bool,
    pub has_green: bool,
    pub has_blue: bool,
}

#[derive(Clone, Debug)]
pub struct TestFrame {
    shapes: Vec<Shape>,
}

impl TestFrame {
    pub fn new(shapes: Vec<Shape>) -> Self {
        Self { shapes }
    }

    /// Returns pixel `(x, y)`, with the frame's content repeated every `repeat_y` lines.
    pub fn pixel(&self, x: usize, y: usize, repeat_y: NonZeroUsize) -> Collect {
        let folded = y % repeat_y;
        Collect {
            in_label: self.shapes.iter().any(|shape| shape.contains(x, folded)),
            x,
            y,
            ..Collect::default()
        }
    }
}

#[derive(Clone, Debug)]
pub struct TestFrames {
    frames: Vec<TestFrame>,
    repeat_y: NonZeroUsize,
}

impl TestFrames {
    pub fn new(repeat_y: NonZeroUsize) -> Self {
        let frames = (0..FRAME_COUNT)
            .map(|f| {
                TestFrame::new(vec![
                    Shape::Circle {
                        x: 20 + 40 * f,
                        y: 20 + 3 * f,
                        radius: 12,
                    },
                    Shape::Square {
                        x: 30 + 30 * f,
                        y: 30 + 2 * f,
                        side: 10,
                    },
                ])
            })
            .collect();
        Self { frames, repeat_y }
    }

    pub fn pixel(&self, frame: usize, x: usize, y: usize) -> Collect {
        self.frames[frame % self.frames.len()].pixel(x, y, self.repeat_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repeat(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_circle() {
        let circle = Shape::Circle { x: 20, y: 20, radius: 12 };
        assert!(circle.contains(20, 20));
        assert!(circle.contains(32, 20));
        assert!(!circle.contains(33, 20));
        assert!(circle.contains(20, 8));
        assert!(!circle.contains(29, 29));
        assert!(!circle.contains(0, 0));
    }

    #[test]
    fn test_square() {
        let square = Shape::Square { x: 30, y: 30, side: 10 };
        assert!(square.contains(30, 30));
        assert!(square.contains(39, 39));
        assert!(!square.contains(40, 35));
        assert!(!square.contains(35, 29));
    }

    #[test]
    fn test_frames_drift() {
        let frames = TestFrames::new(repeat(512));
        assert!(frames.pixel(0, 20, 20).in_label);
        assert!(frames.pixel(0, 35, 35).in_label);
        assert!(!frames.pixel(0, 500, 20).in_label);
        assert!(frames.pixel(3, 140, 29).in_label);
        assert!(frames.pixel(9, 380, 47).in_label);
        assert_eq!(
            frames.pixel(1, 60, 23),
            Collect { in_label: true, x: 60, y: 23, ..Collect::default() },
        );
    }

    #[test]
    fn test_frame_index_wraps() {
        let frames = TestFrames::new(repeat(512));
        assert_eq!(frames.pixel(12, 100, 26), frames.pixel(2, 100, 26));
    }

    #[quickcheck]
    fn labels_repeat_vertically(frame: usize, x: u16, y: u16, repeat_y: u16) -> bool {
        let repeat_y = repeat(usize::from(repeat_y) + 1);
        let frames = TestFrames::new(repeat_y);
        let (x, y) = (usize::from(x), usize::from(y));
        frames.pixel(frame, x, y).in_label == frames.pixel(frame, x, y + repeat_y.get()).in_label
    }
}

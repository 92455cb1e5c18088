//! Offline observation logs for replaying detector output through the pipeline.
//!
//! One tick per line:
//!
//! ```text
//! # left_x left_y right_x right_y width height
//! 0.45 0.50 0.55 0.50 640 480
//! -        # detector ran, no face found
//! .        # no new detector frame this tick
//! ```

use crate::{
    observation::{DetectorFrame, EyeDetection, EyePoint},
    Error, Result,
};
use std::path::Path;

/// Image size used for `-` lines before any full line has been seen
const DEFAULT_REPLAY_SIZE: (u32, u32) = (640, 480);

/// Parse a whole observation log; each entry is one tick
///
/// # Errors
///
/// Returns [`Error::ReplayParse`] with the offending line number.
pub fn parse_log(content: &str) -> Result<Vec<Option<DetectorFrame>>> {
    let mut size = DEFAULT_REPLAY_SIZE;
    let mut ticks = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let line_no = index + 1;

        match line {
            "." => ticks.push(None),
            "-" => ticks.push(Some(DetectorFrame::empty(size.0, size.1))),
            _ => {
                let frame = parse_frame(line, line_no)?;
                size = (frame.width, frame.height);
                ticks.push(Some(frame));
            }
        }
    }

    Ok(ticks)
}

/// Read and parse an observation log file
///
/// # Errors
///
/// Returns an I/O error or [`Error::ReplayParse`].
pub fn load_log<P: AsRef<Path>>(path: P) -> Result<Vec<Option<DetectorFrame>>> {
    let content = std::fs::read_to_string(path)?;
    parse_log(&content)
}

fn parse_frame(line: &str, line_no: usize) -> Result<DetectorFrame> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 6 {
        return Err(Error::ReplayParse {
            line: line_no,
            message: format!("expected 6 fields, got {}", fields.len()),
        });
    }

    let coord = |i: usize| -> Result<f64> {
        fields[i].parse::<f64>().map_err(|_| Error::ReplayParse {
            line: line_no,
            message: format!("invalid coordinate '{}'", fields[i]),
        })
    };
    let dim = |i: usize| -> Result<u32> {
        match fields[i].parse::<u32>() {
            Ok(v) if v > 0 => Ok(v),
            _ => Err(Error::ReplayParse {
                line: line_no,
                message: format!("invalid image dimension '{}'", fields[i]),
            }),
        }
    };

    let detection = EyeDetection {
        left_eye: EyePoint::new(coord(0)?, coord(1)?),
        right_eye: EyePoint::new(coord(2)?, coord(3)?),
    };
    Ok(DetectorFrame::new(vec![detection], dim(4)?, dim(5)?))
}

/// Synthetic head sweep: side to side and toward/away from the camera
///
/// Tracking drops out for three ticks every 40 ticks.
#[must_use]
pub fn synthetic_sweep(ticks: usize, width: u32, height: u32) -> Vec<Option<DetectorFrame>> {
    (0..ticks)
        .map(|i| {
            if i % 40 >= 37 {
                return Some(DetectorFrame::empty(width, height));
            }
            #[allow(clippy::cast_precision_loss)]
            let t = i as f64 / 30.0;
            let center_x = 0.5 + 0.15 * (t * 0.8).sin();
            let center_y = 0.5 + 0.05 * (t * 0.5).cos();
            let half_separation = 0.08 + 0.03 * (t * 0.3).sin();
            let detection = EyeDetection {
                left_eye: EyePoint::new(center_x - half_separation, center_y),
                right_eye: EyePoint::new(center_x + half_separation, center_y),
            };
            Some(DetectorFrame::new(vec![detection], width, height))
        })
        .collect()
}

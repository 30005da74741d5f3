//! Frame boundary arithmetic.
//!
//! A peak position marks the end of the synchronization symbol, which closes
//! the first slot of a frame, so the frame starts one slot earlier. Offsets
//! are relative to the window's current region and a frame never starts
//! before the read position.

use contracts::{ContractError, FrameGeometry, Sample, Window};

/// Validated frame region inside a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRegion {
    /// Frame start relative to the read position
    pub frame_start: i64,
    /// First frame sample as an index into `window.samples()`
    pub index: usize,
    /// Frame length
    pub len: usize,
    /// Input samples to consume: `frame_start + len`
    pub consume: usize,
}

impl FrameRegion {
    /// The aligned samples
    #[inline]
    pub fn slice<'a>(&self, window: &Window<'a>) -> &'a [Sample] {
        &window.samples()[self.index..self.index + self.len]
    }
}

/// Compute and validate the frame region for `position`.
///
/// # Errors
/// [`ContractError::AlignmentBounds`] when the region starts before the
/// read position or ends past the available samples.
pub fn locate(
    geometry: &FrameGeometry,
    position: usize,
    window: &Window<'_>,
) -> Result<FrameRegion, ContractError> {
    let frame_len = geometry.frame_len;
    let available = window.available();
    let frame_start = position as i64 - geometry.slot_len as i64;
    let index = window.history() as i64 + frame_start;
    let end = frame_start + frame_len as i64;

    if frame_start < 0 || end > available as i64 {
        return Err(ContractError::AlignmentBounds {
            frame_start,
            frame_len,
            available,
        });
    }

    Ok(FrameRegion {
        frame_start,
        index: index as usize,
        len: frame_len,
        consume: end as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> FrameGeometry {
        FrameGeometry {
            frame_len: 20,
            slot_len: 4,
            symbol_len: 2,
        }
    }

    fn ramp(len: usize) -> Vec<Sample> {
        (0..len).map(|i| Sample::new(i as f32, 0.0)).collect()
    }

    #[test]
    fn test_region_inside_current() {
        let samples = ramp(19 + 40);
        let window = Window::new(&samples, 19);
        let region = locate(&geometry(), 10, &window).unwrap();

        assert_eq!(region.frame_start, 6);
        assert_eq!(region.index, 25);
        assert_eq!(region.consume, 26);
        assert_eq!(region.slice(&window)[0].re, 25.0);
        assert_eq!(region.slice(&window).len(), 20);
    }

    #[test]
    fn test_start_before_read_position_rejected_despite_history() {
        let samples = ramp(19 + 40);
        let window = Window::new(&samples, 19);
        let err = locate(&geometry(), 1, &window).unwrap_err();

        assert!(matches!(
            err,
            ContractError::AlignmentBounds {
                frame_start: -3,
                frame_len: 20,
                available: 40
            }
        ));
    }

    #[test]
    fn test_peak_at_slot_end_starts_at_read_position() {
        let samples = ramp(19 + 40);
        let window = Window::new(&samples, 19);
        let region = locate(&geometry(), 4, &window).unwrap();

        assert_eq!(region.frame_start, 0);
        assert_eq!(region.index, 19);
        assert_eq!(region.consume, 20);
        assert_eq!(region.slice(&window)[0].re, 19.0);
    }

    #[test]
    fn test_negative_start_without_history() {
        let samples = ramp(40);
        let window = Window::new(&samples, 0);
        let err = locate(&geometry(), 2, &window).unwrap_err();

        assert!(matches!(
            err,
            ContractError::AlignmentBounds {
                frame_start: -2,
                frame_len: 20,
                available: 40
            }
        ));
    }

    #[test]
    fn test_overrun_past_available() {
        let samples = ramp(19 + 30);
        let window = Window::new(&samples, 19);
        // start 11, end 31 > 30
        let err = locate(&geometry(), 15, &window).unwrap_err();
        assert!(matches!(err, ContractError::AlignmentBounds { .. }));

        // end exactly at the boundary is accepted
        let region = locate(&geometry(), 14, &window).unwrap();
        assert_eq!(region.consume, 30);
    }
}

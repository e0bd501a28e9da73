//! Work coordinate systems, the G92 offset and the program-to-machine transform.

use crate::modal::{DistanceMode, ModalState};
use grbl_shared::gcode::ParsedLine;
use grbl_shared::{Axis, Position};

pub const WCS_COUNT: usize = 6;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinateFrame {
    /// G54..G59 offsets in machine coordinates.
    pub wcs: [Position; WCS_COUNT],
    pub g92: Position,
}

impl CoordinateFrame {
    /// Total offset between machine and work coordinates for `active`.
    pub fn offset(&self, active: usize) -> Position {
        self.wcs[active] + self.g92
    }

    pub fn work_position(&self, machine: Position, active: usize) -> Position {
        machine - self.offset(active)
    }

    /// Machine-coordinate target for the axis words of `parsed`.
    /// Axes without a word keep their `reference` value; `machine_coords`
    /// applies G53 semantics.
    pub fn resolve_target(
        &self,
        parsed: &ParsedLine,
        modal: &ModalState,
        reference: Position,
        machine_coords: bool,
    ) -> Position {
        let offset = self.offset(modal.coord_system);
        let mut target = reference;
        for axis in Axis::ALL {
            let Some(value) = parsed.axis(axis) else { continue };
            let value = modal.units.to_mm(value);
            target[axis] = if machine_coords {
                value
            } else {
                match modal.distance {
                    DistanceMode::Absolute => value + offset[axis],
                    DistanceMode::Incremental => reference[axis] + value,
                }
            };
        }
        target
    }

    /// G10 L2: store the given axis values as the system's offset.
    pub fn set_wcs(&mut self, index: usize, parsed: &ParsedLine, modal: &ModalState) {
        for axis in Axis::ALL {
            if let Some(value) = parsed.axis(axis) {
                self.wcs[index][axis] = modal.units.to_mm(value);
            }
        }
    }

    /// G10 L20: choose the offset so that `position` reads as the given values.
    pub fn set_wcs_from_position(
        &mut self,
        index: usize,
        parsed: &ParsedLine,
        modal: &ModalState,
        position: Position,
    ) {
        for axis in Axis::ALL {
            if let Some(value) = parsed.axis(axis) {
                self.wcs[index][axis] = position[axis] - self.g92[axis] - modal.units.to_mm(value);
            }
        }
    }

    /// G92: offset the active system so that `position` reads as the values.
    pub fn set_g92(&mut self, parsed: &ParsedLine, modal: &ModalState, position: Position) {
        let wcs = self.wcs[modal.coord_system];
        for axis in Axis::ALL {
            if let Some(value) = parsed.axis(axis) {
                self.g92[axis] = position[axis] - wcs[axis] - modal.units.to_mm(value);
            }
        }
    }

    pub fn clear_g92(&mut self) {
        self.g92 = Position::ORIGIN;
    }

    /// `[G54:...]` through `[G92:...]` lines of the `$#` report.
    pub fn report(&self) -> String {
        let mut out = String::new();
        for (i, offset) in self.wcs.iter().enumerate() {
            out.push_str(&format!("[G{}:{}]\r\n", 54 + i, offset.format_report()));
        }
        out.push_str("[G28:0,0,0]\r\n[G30:0,0,0]\r\n");
        out.push_str(&format!("[G92:{}]\r\n", self.g92.format_report()));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modal::Units;
    use grbl_shared::gcode::parse_line;

    #[test]
    fn absolute_target_applies_offsets() {
        let mut frame = CoordinateFrame::default();
        frame.wcs[1] = Position::new(10.0, 20.0, 0.0);
        frame.g92 = Position::new(1.0, 0.0, 0.0);
        let modal = ModalState { coord_system: 1, ..ModalState::default() };
        let parsed = parse_line("X5").unwrap();
        let target = frame.resolve_target(&parsed, &modal, Position::new(0.0, 3.0, 4.0), false);
        assert_eq!(target, Position::new(16.0, 3.0, 4.0));
        assert_eq!(frame.work_position(target, 1), Position::new(5.0, -17.0, 4.0));
    }

    #[test]
    fn incremental_and_inches() {
        let frame = CoordinateFrame::default();
        let modal = ModalState {
            distance: DistanceMode::Incremental,
            units: Units::Inches,
            ..ModalState::default()
        };
        let parsed = parse_line("X1 Z-0.5").unwrap();
        let target = frame.resolve_target(&parsed, &modal, Position::new(1.0, 1.0, 1.0), false);
        assert!((target.x - 26.4).abs() < 1e-9);
        assert_eq!(target.y, 1.0);
        assert!((target.z - (1.0 - 12.7)).abs() < 1e-9);
    }

    #[test]
    fn machine_coordinates_ignore_offsets() {
        let mut frame = CoordinateFrame::default();
        frame.wcs[0] = Position::new(50.0, 50.0, 50.0);
        let parsed = parse_line("X1").unwrap();
        let target = frame.resolve_target(&parsed, &ModalState::default(), Position::ORIGIN, true);
        assert_eq!(target, Position::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn g92_makes_position_read_as_value() {
        let mut frame = CoordinateFrame::default();
        frame.wcs[0] = Position::new(5.0, 0.0, 0.0);
        let position = Position::new(12.0, 3.0, 0.0);
        frame.set_g92(&parse_line("X0 Y1").unwrap(), &ModalState::default(), position);
        assert_eq!(frame.work_position(position, 0), Position::new(0.0, 1.0, 0.0));
        frame.clear_g92();
        assert_eq!(frame.work_position(position, 0), Position::new(7.0, 3.0, 0.0));
    }

    #[test]
    fn l20_sets_offset_from_position() {
        let mut frame = CoordinateFrame::default();
        let position = Position::new(30.0, 40.0, 0.0);
        frame.set_wcs_from_position(2, &parse_line("X0 Y0").unwrap(), &ModalState::default(), position);
        assert_eq!(frame.wcs[2], Position::new(30.0, 40.0, 0.0));
    }

    #[test]
    fn report_lists_every_system() {
        let mut frame = CoordinateFrame::default();
        frame.set_wcs(0, &parse_line("X10 Y20").unwrap(), &ModalState::default());
        let report = frame.report();
        assert!(report.starts_with("[G54:10.000,20.000,0.000]\r\n[G55:0.000,0.000,0.000]\r\n"));
        assert!(report.contains("[G59:0.000,0.000,0.000]\r\n[G28:0,0,0]\r\n[G30:0,0,0]\r\n"));
        assert!(report.ends_with("[G92:0.000,0.000,0.000]\r\n"));
    }
}

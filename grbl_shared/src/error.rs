use thiserror::Error;

/// Errors reported inline as `error:<code>`. None of them is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GrblError {
    #[error("Invalid statement")]
    InvalidStatement,
    #[error("Probe fail: pin not in expected initial state")]
    ProbeFailInitial,
    #[error("Setting disabled")]
    SettingDisabled,
    #[error("Command requires idle state")]
    NotIdle,
    #[error("Receive buffer overflow")]
    Overflow,
    #[error("Line too long")]
    LineTooLong,
    #[error("Jog target exceeds machine travel")]
    TravelExceeded,
    #[error("Invalid jog command")]
    InvalidJog,
    #[error("Unsupported command")]
    UnsupportedCommand,
    #[error("Undefined feed rate")]
    UndefinedFeedRate,
    #[error("No axis words")]
    NoAxisWords,
    #[error("Dwell without P word")]
    DwellMissingP,
    #[error("Arc radius error")]
    ArcRadius,
    #[error("No offsets in plane")]
    ArcNoOffsets,
}

impl GrblError {
    pub fn code(self) -> u8 {
        match self {
            GrblError::InvalidStatement => 3,
            GrblError::ProbeFailInitial => 4,
            GrblError::SettingDisabled => 5,
            GrblError::NotIdle => 8,
            GrblError::Overflow => 11,
            GrblError::LineTooLong => 14,
            GrblError::TravelExceeded => 15,
            GrblError::InvalidJog => 16,
            GrblError::UnsupportedCommand => 20,
            GrblError::UndefinedFeedRate => 22,
            GrblError::NoAxisWords => 26,
            GrblError::DwellMissingP => 27,
            GrblError::ArcRadius => 34,
            GrblError::ArcNoOffsets => 35,
        }
    }

    /// Wire form, `error:<code>\r\n`.
    pub fn response(self) -> String {
        format!("error:{}\r\n", self.code())
    }
}

/// Alarm conditions pushed asynchronously as `ALARM:<code>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmCode {
    SoftLimit,
    AbortCycle,
}

impl AlarmCode {
    pub fn code(self) -> u8 {
        match self {
            AlarmCode::SoftLimit => 2,
            AlarmCode::AbortCycle => 3,
        }
    }

    pub fn push(self) -> String {
        format!("ALARM:{}\r\n", self.code())
    }
}

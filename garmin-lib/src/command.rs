//! Device command protocol.
//!
//! Commands are 16-bit codes carried in a `pid_command_data` packet. The
//! code assignments depend on the negotiated command protocol: A010 is used
//! by most devices, A011 by panel-mounted aviation devices. An unimplemented
//! command does not produce an error; the device simply ignores it, which
//! the host observes as a read timeout.

/// An abstract device command, resolved against the negotiated protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    AbortTransfer,
    TransferAlm,
    TransferPosn,
    TransferPrx,
    TransferRte,
    TransferTime,
    TransferTrk,
    TransferWpt,
    TurnOffPwr,
    TransferUnitId,
    TransferScreen,
    StartPvtData,
    StopPvtData,
    TransferBaud,
    AckPing,
    TransferMem,
    FlightbookTransfer,
    TransferLaps,
    TransferWptCats,
    TransferRuns,
    TransferWorkouts,
    TransferWorkoutOccurrences,
    TransferFitnessUserProfile,
    TransferWorkoutLimits,
    TransferCourses,
    TransferCourseLaps,
    TransferCoursePoints,
    TransferCourseTracks,
    TransferCourseLimits,
}

/// The negotiated device command protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandProtocol {
    A010,
    A011,
}

impl CommandProtocol {
    /// Resolve a command to its wire code, or `None` when the protocol does
    /// not define it.
    pub fn code(self, command: Command) -> Option<u16> {
        match self {
            CommandProtocol::A010 => a010_code(command),
            CommandProtocol::A011 => a011_code(command),
        }
    }
}

/// Device Command Protocol 1, used by most devices.
fn a010_code(command: Command) -> Option<u16> {
    use Command::*;
    let code = match command {
        AbortTransfer => 0,
        TransferAlm => 1,
        TransferPosn => 2,
        TransferPrx => 3,
        TransferRte => 4,
        TransferTime => 5,
        TransferTrk => 6,
        TransferWpt => 7,
        TurnOffPwr => 8,
        TransferUnitId => 14,  // undocumented
        TransferScreen => 32,  // undocumented
        StartPvtData => 49,
        StopPvtData => 50,
        TransferBaud => 57, // undocumented
        AckPing => 58,      // undocumented
        TransferMem => 63,  // undocumented
        FlightbookTransfer => 92,
        TransferLaps => 117,
        TransferWptCats => 121,
        TransferRuns => 450,
        TransferWorkouts => 451,
        TransferWorkoutOccurrences => 452,
        TransferFitnessUserProfile => 453,
        TransferWorkoutLimits => 454,
        TransferCourses => 561,
        TransferCourseLaps => 562,
        TransferCoursePoints => 563,
        TransferCourseTracks => 564,
        TransferCourseLimits => 565,
    };
    Some(code)
}

/// Device Command Protocol 2, used by panel-mounted aviation devices.
fn a011_code(command: Command) -> Option<u16> {
    use Command::*;
    let code = match command {
        AbortTransfer => 0,
        TransferAlm => 4,
        TransferRte => 8,
        TransferPrx => 17,
        TransferTime => 20,
        TransferWpt => 21,
        TurnOffPwr => 26,
        _ => return None,
    };
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a010_codes() {
        assert_eq!(CommandProtocol::A010.code(Command::TransferWpt), Some(7));
        assert_eq!(CommandProtocol::A010.code(Command::TransferRuns), Some(450));
    }

    #[test]
    fn a011_lacks_fitness_commands() {
        assert_eq!(CommandProtocol::A011.code(Command::TransferWpt), Some(21));
        assert_eq!(CommandProtocol::A011.code(Command::TransferRuns), None);
        assert_eq!(CommandProtocol::A011.code(Command::StartPvtData), None);
    }
}

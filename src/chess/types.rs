use super::month::MonthLabel;
use super::timecontrol::TimeControlSpec;

/// One game decoded from the line stream: the tags in force plus its movetext line.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub time_control: TimeControlSpec,
    pub month: MonthLabel,
    pub movetext: String,
    /// 1-based line number of the movetext line.
    pub line_number: usize,
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Session phases, in presentation order.
#[derive(Copy, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Instructions,
    Practice,
    Experiment,
    Debrief,
}

impl Phase {
    pub fn next(&self) -> Option<Self> {
        use Phase::*;
        Some(match self {
            Instructions => Practice,
            Practice => Experiment,
            Experiment => Debrief,
            Debrief => return None,
        })
    }

    pub fn is_practice(&self) -> bool {
        matches!(self, Phase::Practice)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Instructions => "instructions",
            Phase::Practice => "practice",
            Phase::Experiment => "experiment",
            Phase::Debrief => "debrief",
        })
    }
}

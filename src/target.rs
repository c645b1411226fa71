use crate::counting::ClassCount;
use serde::{Deserialize, Serialize};

/// Resampling direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Undersample every class to the rarest class size, without replacement.
    Reduce,
    /// Oversample every class to the most common class size, with replacement.
    Expand,
}

impl Mode {
    pub fn from_undersample(undersample: bool) -> Self {
        if undersample { Mode::Reduce } else { Mode::Expand }
    }

    #[inline]
    pub fn with_replacement(self) -> bool {
        matches!(self, Mode::Expand)
    }
}

/// One global size for every countable class; 0 when there are no countable classes.
pub fn select_target_size(counts: &ClassCount, mode: Mode) -> usize {
    let values = counts.values().copied();
    let target = match mode {
        Mode::Reduce => values.min(),
        Mode::Expand => values.max(),
    };
    target.unwrap_or(0) as usize
}

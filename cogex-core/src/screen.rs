use std::time::Duration;

pub type Rgba = [u8; 4];

pub const BLACK: Rgba = [0, 0, 0, 255];
pub const WHITE: Rgba = [255, 255, 255, 255];

/// Everything a renderer may be asked to put on screen.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Blank {
        background: Rgba,
    },
    Instructions {
        text: String,
        background: Rgba,
    },
    Stimulus {
        text: String,
        ink: Rgba,
        background: Rgba,
    },
    Feedback {
        correct: bool,
        latency: Option<Duration>,
    },
}

impl Screen {
    pub fn blank() -> Self {
        Screen::Blank { background: BLACK }
    }

    pub fn instructions(text: impl Into<String>) -> Self {
        Screen::Instructions {
            text: text.into(),
            background: BLACK,
        }
    }

    pub fn background(&self) -> Rgba {
        match self {
            Screen::Blank { background }
            | Screen::Instructions { background, .. }
            | Screen::Stimulus { background, .. } => *background,
            Screen::Feedback { .. } => BLACK,
        }
    }
}

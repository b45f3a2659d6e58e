use serde::Deserialize;

/// Red, green and blue channels.
pub type Rgb = (u8, u8, u8);

/// Two-color palettes for the monochrome display.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Mint,
    Spooky,
    Bumblebee,
}

impl Theme {
    /// The following theme, wrapping around after the last.
    pub fn next(&self) -> Theme {
        match self {
            Theme::Default => Theme::Mint,
            Theme::Mint => Theme::Spooky,
            Theme::Spooky => Theme::Bumblebee,
            Theme::Bumblebee => Theme::Default,
        }
    }

    /// Color of a pixel that is off.
    pub fn off(&self) -> Rgb {
        self.colors().0
    }

    /// Color of a pixel that is on.
    pub fn on(&self) -> Rgb {
        self.colors().1
    }

    fn colors(&self) -> (Rgb, Rgb) {
        match self {
            Theme::Default => ((0, 0, 0), (255, 255, 255)),
            Theme::Mint => ((173, 239, 209), (0, 32, 63)),
            Theme::Spooky => ((16, 24, 32), (242, 170, 76)),
            Theme::Bumblebee => ((16, 24, 32), (254, 231, 21)),
        }
    }
}

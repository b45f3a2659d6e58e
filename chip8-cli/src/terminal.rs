//! Headless devices that render to a terminal stream.
use std::{collections::VecDeque, io::Write};

use chip8::{constants::*, Control, Devices, Keypad};
use log::{debug, error, info};

use crate::{
    config::{AppConf, KeyEvent},
    theme::Theme,
};

const BELL: &[u8] = b"\x07";
const CLEAR_SCREEN: &[u8] = b"\x1b[2J\x1b[H";
const RESET_COLOR: &str = "\x1b[0m";

/// Terminal display and buzzer, with input replayed from a script.
pub struct Terminal<W: Write> {
    out: W,
    theme: Theme,
    color: bool,
    /// Pending key events, ordered by cycle.
    keys: VecDeque<KeyEvent>,
    /// Pending theme switches, ordered by cycle.
    theme_changes: VecDeque<usize>,
    /// Last frame drawn, kept for redrawing in a new theme.
    display: Box<[bool; DISPLAY_BUFFER_SIZE]>,
    drawn: bool,
    max_cycles: Option<usize>,
    cycle: usize,
}

impl<W: Write> Terminal<W> {
    pub fn new(out: W, conf: &AppConf) -> Self {
        Self {
            out,
            theme: conf.theme,
            color: conf.color,
            keys: conf.keys.iter().copied().collect(),
            theme_changes: conf.theme_changes.iter().copied().collect(),
            display: Box::new([false; DISPLAY_BUFFER_SIZE]),
            drawn: false,
            max_cycles: conf.max_cycles,
            cycle: 0,
        }
    }

    /// Number of cycles that input was polled for.
    pub fn cycles(&self) -> usize {
        self.cycle
    }

    #[cfg(test)]
    pub fn theme(&self) -> Theme {
        self.theme
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_frame(&mut self) {
        let frame = self.render(&self.display);
        if let Err(err) = self.out.write_all(&frame).and_then(|_| self.out.flush()) {
            error!("failed to draw display: {err}");
        }
    }

    /// Switch to the next theme, redrawing the last frame in its colors.
    fn next_theme(&mut self) {
        self.theme = self.theme.next();
        info!("switched to {:?} theme", self.theme);

        if self.color && self.drawn {
            self.write_frame();
        }
    }

    fn render(&self, display: &[bool; DISPLAY_BUFFER_SIZE]) -> Vec<u8> {
        let mut frame = Vec::with_capacity(DISPLAY_BUFFER_SIZE * 2);

        if self.color {
            frame.extend_from_slice(CLEAR_SCREEN);
        }

        for row in display.chunks(DISPLAY_WIDTH) {
            for &pixel in row {
                if self.color {
                    let (r, g, b) = if pixel {
                        self.theme.on()
                    } else {
                        self.theme.off()
                    };
                    // Two cells per pixel.
                    frame.extend_from_slice(format!("\x1b[48;2;{r};{g};{b}m  ").as_bytes());
                } else {
                    frame.push(if pixel { b'#' } else { b'.' });
                }
            }

            if self.color {
                frame.extend_from_slice(RESET_COLOR.as_bytes());
            }
            frame.push(b'\n');
        }

        if !self.color {
            frame.push(b'\n');
        }

        frame
    }
}

impl<W: Write> Devices for Terminal<W> {
    fn poll_input(&mut self, keypad: &mut Keypad) -> Control {
        if let Some(max_cycles) = self.max_cycles {
            if self.cycle >= max_cycles {
                info!("stopping after {max_cycles} cycles");
                return Control::Quit;
            }
        }

        while let Some(event) = self.keys.front() {
            if event.cycle > self.cycle {
                break;
            }
            debug!(
                "cycle {}: key {} {}",
                self.cycle,
                event.key,
                if event.pressed { "down" } else { "up" }
            );
            keypad.set(event.key.as_u8(), event.pressed);
            self.keys.pop_front();
        }

        while let Some(&cycle) = self.theme_changes.front() {
            if cycle > self.cycle {
                break;
            }
            self.theme_changes.pop_front();
            self.next_theme();
        }

        self.cycle += 1;
        Control::Continue
    }

    fn draw(&mut self, display: &[bool; DISPLAY_BUFFER_SIZE]) {
        self.display.copy_from_slice(display);
        self.drawn = true;
        self.write_frame();
    }

    fn buzz(&mut self, state: bool) {
        if state {
            info!("buzzer on");
            if let Err(err) = self.out.write_all(BELL).and_then(|_| self.out.flush()) {
                error!("failed to ring bell: {err}");
            }
        } else {
            debug!("buzzer off");
        }
    }
}

//! TUI module for studio
//!
//! Transport bar, per-track mixer strips with meters, and an overview of the
//! selected track's newest clip.

mod mixer;
mod state;
mod transport;
mod waveform;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

pub use state::UiState;

use mixer::render_mixer;
use transport::render_transport;
use waveform::render_waveform;

/// Render the whole screen.
pub fn render(frame: &mut Frame, state: &UiState) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Transport bar
            Constraint::Min(6),    // Mixer
            Constraint::Length(8), // Waveform
            Constraint::Length(1), // Status
            Constraint::Length(1), // Help bar
        ])
        .split(area);

    render_transport(frame, chunks[0], state);
    render_mixer(frame, chunks[1], state);
    render_waveform(frame, chunks[2], &state.waveform);

    let status = Paragraph::new(format!(" {}", state.status))
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(status, chunks[3]);

    let help = Paragraph::new(
        " [A] Add  [X] Remove  [R] Rec  [Space] Play/Stop  [0] Reset  [,/.] Seek  \
         [M] Mute  [S] Solo  [-/=] Vol  [[/]] Pan  [E] Export  [Q] Quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[4]);
}

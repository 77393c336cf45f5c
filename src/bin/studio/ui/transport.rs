//! Transport bar widget - play state, playhead, length and device rate

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::UiState;

/// `m:ss.t`
fn clock(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let minutes = (seconds / 60.0).floor();
    format!("{}:{:04.1}", minutes as u64, seconds - minutes * 60.0)
}

/// Render the transport bar
pub fn render_transport(frame: &mut Frame, area: Rect, state: &UiState) {
    let block = Block::default().title(" studio ").borders(Borders::ALL);

    let (play_symbol, play_state, play_color) = if state.is_playing {
        ("▶", "Playing", Color::Green)
    } else {
        ("⏸", "Stopped", Color::Yellow)
    };

    let mut spans = vec![
        Span::styled(
            format!(" {play_symbol} {play_state}  "),
            Style::default().fg(play_color),
        ),
        Span::styled(
            format!("{} / {}  ", clock(state.current_time), clock(state.total_duration)),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("{} tracks  ", state.tracks.len()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("{:.1}kHz  ", state.sample_rate as f32 / 1000.0),
            Style::default().fg(Color::DarkGray),
        ),
    ];

    if state.is_recording {
        spans.push(Span::styled(
            format!("● REC {}", clock(state.recording_elapsed)),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

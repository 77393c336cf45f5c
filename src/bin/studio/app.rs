//! Studio - key handling and the refresh loop around the engine

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::DefaultTerminal;
use saavy_studio::{
    AudioBackend, BlobSink, CpalBackend, Engine, EngineError, TrackId, TrackKind,
};
use tracing::{info, warn};

use crate::ui::{self, UiState};

/// Points kept for the clip overview.
const WAVEFORM_POINTS: usize = 512;

/// Refresh period of the UI and the engine tick.
const FRAME: Duration = Duration::from_millis(33);

const VOLUME_STEP: f32 = 0.05;
const PAN_STEP: f32 = 0.1;
const SEEK_STEP: f64 = 1.0;

/// Saves exports next to the working directory.
struct FileSink<'a> {
    dir: &'a Path,
}

impl BlobSink for FileSink<'_> {
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> saavy_studio::Result<()> {
        let path = self.dir.join(file_name);
        fs::write(&path, bytes).map_err(|e| EngineError::Delivery(e.to_string()))?;
        info!(path = %path.display(), bytes = bytes.len(), "mixdown saved");
        Ok(())
    }
}

pub struct Studio {
    engine: Engine<CpalBackend>,
    export_dir: PathBuf,
    selected: usize,
    status: String,
    should_quit: bool,
}

impl Studio {
    pub fn new(engine: Engine<CpalBackend>, export_dir: PathBuf) -> Self {
        Self {
            engine,
            export_dir,
            selected: 0,
            status: "[A] to add a track".into(),
            should_quit: false,
        }
    }

    pub fn run(mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.engine.tick();

            let state = self.ui_state();
            terminal.draw(|frame| ui::render(frame, &state))?;

            if event::poll(FRAME)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        // Leaving mid-take keeps what was captured
        if self.engine.is_recording() {
            self.stop_recording();
        }
        Ok(())
    }

    fn selected_track(&self) -> Option<TrackId> {
        self.engine.tracks().get(self.selected).map(|t| t.id())
    }

    fn handle_key(&mut self, key: KeyCode) {
        let result = match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
                Ok(())
            }
            KeyCode::Char('a') => {
                let id = self.engine.create_track(None, TrackKind::Audio);
                self.selected = self.engine.tracks().len() - 1;
                self.status = format!("added {id}");
                Ok(())
            }
            KeyCode::Char('x') => self.remove_selected(),
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                Ok(())
            }
            KeyCode::Down => {
                let last = self.engine.tracks().len().saturating_sub(1);
                self.selected = (self.selected + 1).min(last);
                Ok(())
            }
            KeyCode::Char(' ') => {
                if self.engine.is_playing() {
                    self.engine.stop();
                } else {
                    let at = self.engine.current_time();
                    self.engine.play(at);
                }
                Ok(())
            }
            KeyCode::Char('0') | KeyCode::Home => {
                self.engine.reset();
                Ok(())
            }
            KeyCode::Char(',') => {
                let t = (self.engine.current_time() - SEEK_STEP).max(0.0);
                self.engine.seek(t);
                Ok(())
            }
            KeyCode::Char('.') => {
                let t = self.engine.current_time() + SEEK_STEP;
                self.engine.seek(t);
                Ok(())
            }
            KeyCode::Char('r') => self.toggle_recording(),
            KeyCode::Char('m') => self.with_selected(|engine, id| engine.toggle_mute(id).map(drop)),
            KeyCode::Char('s') => self.with_selected(|engine, id| engine.toggle_solo(id).map(drop)),
            KeyCode::Char('-') => self.nudge_volume(-VOLUME_STEP),
            KeyCode::Char('=') | KeyCode::Char('+') => self.nudge_volume(VOLUME_STEP),
            KeyCode::Char('[') => self.nudge_pan(-PAN_STEP),
            KeyCode::Char(']') => self.nudge_pan(PAN_STEP),
            KeyCode::Char('e') => self.export(),
            _ => Ok(()),
        };

        if let Err(e) = result {
            warn!(error = %e, "command failed");
            self.status = e.to_string();
        }
    }

    fn with_selected(
        &mut self,
        f: impl FnOnce(&mut Engine<CpalBackend>, TrackId) -> saavy_studio::Result<()>,
    ) -> saavy_studio::Result<()> {
        match self.selected_track() {
            Some(id) => f(&mut self.engine, id),
            None => Ok(()),
        }
    }

    fn nudge_volume(&mut self, delta: f32) -> saavy_studio::Result<()> {
        self.with_selected(|engine, id| {
            let volume = (engine.track(id)?.volume() + delta).clamp(0.0, 1.0);
            engine.set_volume(id, volume)
        })
    }

    fn nudge_pan(&mut self, delta: f32) -> saavy_studio::Result<()> {
        self.with_selected(|engine, id| {
            let pan = (engine.track(id)?.pan() + delta).clamp(-1.0, 1.0);
            engine.set_pan(id, pan)
        })
    }

    fn remove_selected(&mut self) -> saavy_studio::Result<()> {
        let Some(id) = self.selected_track() else {
            return Ok(());
        };
        self.engine.remove_track(id)?;
        self.selected = self.selected.min(self.engine.tracks().len().saturating_sub(1));
        self.status = format!("removed {id}");
        Ok(())
    }

    fn toggle_recording(&mut self) -> saavy_studio::Result<()> {
        if self.engine.is_recording() {
            self.stop_recording();
            return Ok(());
        }
        let Some(id) = self.selected_track() else {
            self.status = "add a track before recording".into();
            return Ok(());
        };
        self.engine.start_recording(id)?;
        self.status = format!("recording into {id}");
        Ok(())
    }

    fn stop_recording(&mut self) {
        self.status = match self.engine.stop_recording() {
            Ok(Some(clip)) => format!("kept {:.2}s take", clip.duration()),
            Ok(None) => "nothing captured".into(),
            Err(e) => e.to_string(),
        };
    }

    fn export(&mut self) -> saavy_studio::Result<()> {
        let blob = self.engine.export_wav(|p| info!(percent = p.percent, "export {}", p.stage))?;
        let mut sink = FileSink {
            dir: &self.export_dir,
        };
        blob.save(&mut sink, None)?;
        self.status = format!("exported {} ({} bytes)", blob.file_name, blob.len());
        Ok(())
    }

    fn ui_state(&self) -> UiState {
        let waveform = self
            .engine
            .tracks()
            .get(self.selected)
            .and_then(|t| t.clips().last())
            .map(|clip| overview(clip.buffer().channel(0), WAVEFORM_POINTS))
            .unwrap_or_default();

        UiState {
            is_playing: self.engine.is_playing(),
            is_recording: self.engine.is_recording(),
            recording_elapsed: self.engine.recording_elapsed(),
            current_time: self.engine.current_time(),
            total_duration: self.engine.total_duration(),
            sample_rate: self.engine.backend().sample_rate(),
            tracks: self.engine.snapshot(),
            selected: self.selected,
            waveform,
            status: self.status.clone(),
        }
    }
}

/// Peak per bucket, keeping the sign of the larger excursion.
fn overview(samples: &[f32], points: usize) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }
    let bucket = samples.len().div_ceil(points).max(1);
    samples
        .chunks(bucket)
        .map(|chunk| {
            chunk
                .iter()
                .copied()
                .fold(0.0f32, |acc, s| if s.abs() > acc.abs() { s } else { acc })
        })
        .collect()
}

//! Per-frame animation driver and the session context it owns.

use log::{debug, info};

use crate::config::SessionConfig;
use crate::error::Result;
use crate::params;
use crate::pipeline::{Pipeline, Renderer};
use crate::scene;

/// Whether the video element currently has a decodable frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Ready,
    NotReady,
}

/// Face proximity pushed in by an external tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DistanceSignal {
    pub found: bool,
    pub distance: f64,
}

/// The element shown while a face is held close to the camera.
pub trait Overlay {
    fn show(&mut self, fade_ms: u32);
    fn hide(&mut self, fade_ms: u32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RevealState {
    Waiting,
    /// Overlay shown; re-check the threshold at `deadline_ms`.
    Pending { deadline_ms: f64 },
    /// Terminal.
    Begun,
}

pub struct Session<R, O> {
    config: SessionConfig,
    pipeline: Pipeline<R>,
    overlay: O,
    signal: DistanceSignal,
    shader_time: f32,
    state: DriverState,
    reveal: RevealState,
}

impl<R: Renderer, O: Overlay> Session<R, O> {
    pub fn new(config: SessionConfig, renderer: R, overlay: O) -> Result<Self> {
        config.validate()?;
        let mut pipeline = Pipeline::standard(renderer)?;
        params::apply_initial(&mut pipeline)?;
        Ok(Self {
            config,
            pipeline,
            overlay,
            signal: DistanceSignal::default(),
            shader_time: 0.0,
            state: DriverState::Idle,
            reveal: RevealState::Waiting,
        })
    }

    pub fn start(&mut self) {
        if self.state == DriverState::Idle {
            info!("animation driver running");
            self.state = DriverState::Running;
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn reveal(&self) -> RevealState {
        self.reveal
    }

    pub fn experience_begun(&self) -> bool {
        self.reveal == RevealState::Begun
    }

    pub fn set_distance(&mut self, distance: f64) {
        self.signal.distance = distance;
    }

    pub fn set_face_found(&mut self, found: bool) {
        self.signal.found = found;
    }

    pub fn signal(&self) -> DistanceSignal {
        self.signal
    }

    pub fn shader_time(&self) -> f32 {
        self.shader_time
    }

    pub fn pipeline(&self) -> &Pipeline<R> {
        &self.pipeline
    }

    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        debug!(
            "resize {width}x{height}, plane extent {:?}",
            scene::plane_extent(scene::aspect(width, height))
        );
        self.pipeline.resize(width, height)
    }

    /// Advance one animation frame. `now_ms` is a monotonic timestamp.
    pub fn tick(&mut self, now_ms: f64, frame: FrameStatus) -> Result<()> {
        if self.state != DriverState::Running {
            return Ok(());
        }

        if self.signal.found {
            params::apply_distance(
                &mut self.pipeline,
                self.signal.distance,
                self.config.face_low,
                self.config.face_high,
            )?;
        }

        self.shader_time += self.config.time_step;
        self.pipeline.broadcast_uniform("time", self.shader_time)?;

        if frame == FrameStatus::Ready {
            self.pipeline.mark_frame_dirty();
        }

        // always render, even without a face or a frame
        self.pipeline.tick(self.config.render_delta)?;

        self.advance_reveal(now_ms);
        Ok(())
    }

    fn advance_reveal(&mut self, now_ms: f64) {
        let close = self.signal.distance >= self.config.face_high;
        self.reveal = match self.reveal {
            RevealState::Begun => RevealState::Begun,
            RevealState::Waiting if close => {
                self.overlay.show(self.config.fade_in_ms);
                RevealState::Pending {
                    deadline_ms: now_ms + self.config.reveal_delay_ms,
                }
            }
            RevealState::Waiting => RevealState::Waiting,
            RevealState::Pending { deadline_ms } if now_ms >= deadline_ms => {
                if close {
                    info!("experience begun");
                    RevealState::Begun
                } else {
                    self.overlay.hide(self.config.fade_out_ms);
                    RevealState::Waiting
                }
            }
            RevealState::Pending { .. } if !close => {
                // face backed away before the re-check: cancel it
                debug!("reveal cancelled");
                self.overlay.hide(self.config.fade_out_ms);
                RevealState::Waiting
            }
            pending @ RevealState::Pending { .. } => pending,
        };
    }
}

use crate::error::{Error, Result};

/// Tunables for one session. Defaults reproduce the installation's values.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Distance at which effects are at full strength.
    pub face_low: f64,
    /// Distance at which effects are calm and the reveal starts.
    pub face_high: f64,
    /// Added to the shader clock every tick.
    pub time_step: f32,
    pub render_delta: f32,
    pub reveal_delay_ms: f64,
    pub fade_in_ms: u32,
    pub fade_out_ms: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            face_low: 1.2,
            face_high: 1.7,
            time_step: 0.1,
            render_delta: 0.1,
            reveal_delay_ms: 2000.0,
            fade_in_ms: 1000,
            fade_out_ms: 250,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.face_low.is_finite() && self.face_high.is_finite())
            || self.face_low >= self.face_high
        {
            return Err(Error::InvalidConfig(format!(
                "face thresholds must satisfy low < high (got {} / {})",
                self.face_low, self.face_high
            )));
        }
        for (name, step) in [("time step", self.time_step), ("render delta", self.render_delta)] {
            if !(step.is_finite() && step > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be positive (got {step})"
                )));
            }
        }
        if !(self.reveal_delay_ms.is_finite() && self.reveal_delay_ms >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "reveal delay must be non-negative (got {})",
                self.reveal_delay_ms
            )));
        }
        Ok(())
    }

    /// Override thresholds from optional textual values (e.g. `data-*`
    /// attributes). Unparseable values are reported, missing ones ignored.
    pub fn with_thresholds(mut self, low: Option<&str>, high: Option<&str>) -> Result<Self> {
        if let Some(s) = low {
            self.face_low = parse_threshold("face-low", s)?;
        }
        if let Some(s) = high {
            self.face_high = parse_threshold("face-high", s)?;
        }
        self.validate()?;
        Ok(self)
    }
}

fn parse_threshold(name: &str, s: &str) -> Result<f64> {
    s.trim()
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("{name}: `{s}` is not a number")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        SessionConfig::default().validate().unwrap();
    }

    #[test]
    fn inverted_thresholds_rejected() {
        let cfg = SessionConfig {
            face_low: 2.0,
            face_high: 1.0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn steps_must_be_positive_and_finite() {
        for render_delta in [0.0, -0.1, f32::NAN, f32::INFINITY] {
            let cfg = SessionConfig {
                render_delta,
                ..Default::default()
            };
            assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
        }
        let cfg = SessionConfig {
            time_step: 0.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn thresholds_from_attributes() {
        let cfg = SessionConfig::default()
            .with_thresholds(Some(" 1.0 "), None)
            .unwrap();
        assert_eq!(cfg.face_low, 1.0);
        assert_eq!(cfg.face_high, 1.7);

        assert!(SessionConfig::default()
            .with_thresholds(Some("near"), None)
            .is_err());
        assert!(SessionConfig::default()
            .with_thresholds(None, Some("1.2"))
            .is_err());
    }
}

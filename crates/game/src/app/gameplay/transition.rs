use tracing::warn;

pub(crate) const FADE_OPAQUE: f32 = 255.0;
pub(crate) const DEFAULT_FADE_SPEED: f32 = 10.0;

/// Map swap to perform once the screen is fully faded out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingTransition {
    pub(crate) target_map: String,
    pub(crate) target_spawn: String,
}

#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FadePhase {
    Idle,
    FadingOut,
    FadingIn,
}

/// Fade-out, swap, fade-in. Only one transition is ever in flight.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TransitionSequencer {
    alpha: f32,
    target: f32,
    speed: f32,
    pending: Option<PendingTransition>,
}

impl TransitionSequencer {
    pub(crate) fn new(speed: f32) -> Self {
        let speed = if speed.is_finite() && speed > 0.0 {
            speed
        } else {
            warn!(speed, "fade_speed_invalid_using_default");
            DEFAULT_FADE_SPEED
        };
        Self {
            alpha: 0.0,
            target: 0.0,
            speed,
            pending: None,
        }
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.alpha == 0.0 && self.target == 0.0
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> FadePhase {
        if self.is_idle() {
            FadePhase::Idle
        } else if self.target > 0.0 {
            FadePhase::FadingOut
        } else {
            FadePhase::FadingIn
        }
    }

    #[cfg(test)]
    pub(crate) fn alpha(&self) -> f32 {
        self.alpha
    }

    pub(crate) fn overlay_alpha(&self) -> u8 {
        self.alpha.clamp(0.0, FADE_OPAQUE).round() as u8
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> Option<&PendingTransition> {
        self.pending.as_ref()
    }

    /// Returns false, changing nothing, unless the sequencer is idle.
    pub(crate) fn start(&mut self, pending: PendingTransition) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.target = FADE_OPAQUE;
        self.pending = Some(pending);
        true
    }

    /// Advances one tick. Yields the pending swap exactly once, on the tick
    /// alpha first reaches full opacity.
    pub(crate) fn step(&mut self) -> Option<PendingTransition> {
        if self.alpha == self.target {
            return None;
        }
        if self.alpha < self.target {
            self.alpha = (self.alpha + self.speed).min(self.target);
            if self.alpha >= FADE_OPAQUE {
                if let Some(pending) = self.pending.take() {
                    self.target = 0.0;
                    return Some(pending);
                }
            }
        } else {
            self.alpha = (self.alpha - self.speed).max(self.target);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_house() -> PendingTransition {
        PendingTransition {
            target_map: "maison_maire".to_string(),
            target_spawn: "entree".to_string(),
        }
    }

    #[test]
    fn full_cycle_fires_swap_once_at_opacity() {
        let mut fade = TransitionSequencer::new(10.0);
        assert!(fade.start(to_house()));

        let mut fired = Vec::new();
        let mut alphas = vec![fade.alpha()];
        for tick in 0..200 {
            if let Some(pending) = fade.step() {
                fired.push((tick, fade.alpha(), pending));
            }
            alphas.push(fade.alpha());
            if fade.is_idle() {
                break;
            }
        }

        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, 25, "0 -> 255 in steps of 10 takes 26 ticks");
        assert_eq!(fired[0].1, FADE_OPAQUE);
        assert_eq!(fired[0].2, to_house());
        assert!(fade.is_idle());

        let peak = alphas
            .iter()
            .position(|alpha| *alpha == FADE_OPAQUE)
            .expect("reaches opacity");
        assert!(alphas[..=peak].windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(alphas[peak..].windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn start_is_ignored_while_in_flight() {
        let mut fade = TransitionSequencer::new(10.0);
        assert!(fade.start(to_house()));
        fade.step();
        assert_eq!(fade.phase(), FadePhase::FadingOut);

        let other = PendingTransition {
            target_map: "donjon".to_string(),
            target_spawn: "porte".to_string(),
        };
        assert!(!fade.start(other));
        assert_eq!(fade.pending(), Some(&to_house()));

        while fade.step().is_none() {}
        assert_eq!(fade.phase(), FadePhase::FadingIn);
        assert!(!fade.start(to_house()), "fading in still counts as in flight");
    }

    #[test]
    fn idle_step_is_a_no_op() {
        let mut fade = TransitionSequencer::new(10.0);
        assert_eq!(fade.step(), None);
        assert_eq!(fade.overlay_alpha(), 0);
        assert_eq!(fade.phase(), FadePhase::Idle);
    }

    #[test]
    fn non_positive_speed_falls_back_to_default() {
        let mut fade = TransitionSequencer::new(0.0);
        assert!(fade.start(to_house()));
        fade.step();
        assert_eq!(fade.alpha(), DEFAULT_FADE_SPEED);
    }
}

use serde::Deserialize;

/// Scroll geometry in rows. `total_height` includes the sentinel line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub total_height: f64,
    pub viewport_height: f64,
    pub scroll_offset: f64,
}

impl Viewport {
    pub fn distance_from_end(&self) -> f64 {
        self.total_height - self.viewport_height - self.scroll_offset
    }
}

/// What caused the geometry to be observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Scroll,
    Layout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerStrategy {
    #[default]
    Proximity,
    ScrollThreshold,
}

/// Decides whether the viewer is close enough to the end of the rendered
/// content to request the next page.
pub trait TriggerDetector: Send + std::fmt::Debug {
    /// Returns true when a "near end" signal should be emitted.
    fn observe(&mut self, viewport: &Viewport, cause: Observation) -> bool;
}

pub fn detector_for(strategy: TriggerStrategy) -> Box<dyn TriggerDetector> {
    match strategy {
        TriggerStrategy::Proximity => Box::new(ProximityTrigger::new(SENTINEL_HEIGHT)),
        TriggerStrategy::ScrollThreshold => Box::new(ScrollThresholdTrigger),
    }
}

/// Height of the end-of-list marker line.
pub const SENTINEL_HEIGHT: f64 = 1.0;

/// Fires when the sentinel at the end of the list enters the viewport.
/// Only the hidden -> visible edge fires; staying visible does not.
#[derive(Debug)]
pub struct ProximityTrigger {
    sentinel_height: f64,
    visible: bool,
}

impl ProximityTrigger {
    pub fn new(sentinel_height: f64) -> Self {
        Self {
            sentinel_height,
            visible: false,
        }
    }

    fn sentinel_visible(&self, viewport: &Viewport) -> bool {
        let top = viewport.total_height - self.sentinel_height;
        let bottom = viewport.total_height;
        let view_top = viewport.scroll_offset;
        let view_bottom = viewport.scroll_offset + viewport.viewport_height;
        top < view_bottom && bottom > view_top
    }
}

impl TriggerDetector for ProximityTrigger {
    fn observe(&mut self, viewport: &Viewport, _cause: Observation) -> bool {
        let visible = self.sentinel_visible(viewport);
        let fired = visible && !self.visible;
        self.visible = visible;
        fired
    }
}

/// Fires on any scroll event that ends within one row of the bottom.
#[derive(Debug)]
pub struct ScrollThresholdTrigger;

/// Absorbs rounding at the boundary.
const THRESHOLD_TOLERANCE: f64 = 1.0;

impl TriggerDetector for ScrollThresholdTrigger {
    fn observe(&mut self, viewport: &Viewport, cause: Observation) -> bool {
        cause == Observation::Scroll && viewport.distance_from_end() <= THRESHOLD_TOLERANCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(total: f64, height: f64, offset: f64) -> Viewport {
        Viewport {
            total_height: total,
            viewport_height: height,
            scroll_offset: offset,
        }
    }

    #[test]
    fn distance_from_end() {
        assert_eq!(viewport(100.0, 20.0, 30.0).distance_from_end(), 50.0);
        assert_eq!(viewport(10.0, 20.0, 0.0).distance_from_end(), -10.0);
    }

    #[test]
    fn proximity_fires_when_sentinel_enters_view() {
        let mut trigger = ProximityTrigger::new(SENTINEL_HEIGHT);
        assert!(!trigger.observe(&viewport(41.0, 20.0, 0.0), Observation::Scroll));
        assert!(!trigger.observe(&viewport(41.0, 20.0, 20.0), Observation::Scroll));
        assert!(trigger.observe(&viewport(41.0, 20.0, 21.0), Observation::Scroll));
    }

    #[test]
    fn proximity_fires_once_per_transition() {
        let mut trigger = ProximityTrigger::new(SENTINEL_HEIGHT);
        assert!(trigger.observe(&viewport(1.0, 20.0, 0.0), Observation::Layout));
        // Still visible: no repeat.
        assert!(!trigger.observe(&viewport(1.0, 20.0, 0.0), Observation::Scroll));
        assert!(!trigger.observe(&viewport(1.0, 20.0, 0.0), Observation::Layout));

        // New content pushes the sentinel out, then scrolling reveals it again.
        assert!(!trigger.observe(&viewport(41.0, 20.0, 0.0), Observation::Layout));
        assert!(trigger.observe(&viewport(41.0, 20.0, 21.0), Observation::Scroll));
    }

    #[test]
    fn proximity_reacts_to_layout_changes() {
        let mut trigger = ProximityTrigger::new(SENTINEL_HEIGHT);
        assert!(!trigger.observe(&viewport(41.0, 10.0, 0.0), Observation::Layout));
        // Terminal grew tall enough to show the end.
        assert!(trigger.observe(&viewport(41.0, 50.0, 0.0), Observation::Layout));
    }

    #[test]
    fn threshold_fires_within_tolerance() {
        let mut trigger = ScrollThresholdTrigger;
        assert!(!trigger.observe(&viewport(41.0, 20.0, 19.0), Observation::Scroll));
        assert!(trigger.observe(&viewport(41.0, 20.0, 20.0), Observation::Scroll));
        assert!(trigger.observe(&viewport(41.0, 20.0, 21.0), Observation::Scroll));
        assert!(trigger.observe(&viewport(41.0, 20.0, 20.5), Observation::Scroll));
    }

    #[test]
    fn threshold_fires_repeatedly_while_at_end() {
        let mut trigger = ScrollThresholdTrigger;
        let at_end = viewport(41.0, 20.0, 21.0);
        assert!(trigger.observe(&at_end, Observation::Scroll));
        assert!(trigger.observe(&at_end, Observation::Scroll));
    }

    #[test]
    fn threshold_ignores_layout_changes() {
        let mut trigger = ScrollThresholdTrigger;
        assert!(!trigger.observe(&viewport(1.0, 20.0, 0.0), Observation::Layout));
    }

    #[test]
    fn strategy_parses_from_toml_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            trigger: TriggerStrategy,
        }
        let w: Wrapper = toml::from_str(r#"trigger = "scroll-threshold""#).unwrap();
        assert_eq!(w.trigger, TriggerStrategy::ScrollThreshold);
        let w: Wrapper = toml::from_str(r#"trigger = "proximity""#).unwrap();
        assert_eq!(w.trigger, TriggerStrategy::Proximity);
    }
}

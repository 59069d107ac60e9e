/// The small set of defaults a caller can override without touching code
/// (§1's ambient config surface): departure-index window sizing, and the
/// profile parameters a [`QueryBuilder`](crate::query::QueryBuilder) falls
/// back to when not overridden per-query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub window_seconds: u32,
    pub num_windows: u32,
    pub walking_speed_mps: f32,
    pub max_transfers: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_seconds: crate::connections::DEFAULT_WINDOW_SECONDS,
            num_windows: crate::connections::DEFAULT_NUM_WINDOWS,
            walking_speed_mps: crate::query::DEFAULT_WALKING_SPEED_MPS,
            max_transfers: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_self_consistent() {
        let config = Config::default();
        assert!(config.window_seconds > 0);
        assert!(config.num_windows > 0);
        assert!(config.walking_speed_mps > 0.0);
    }
}

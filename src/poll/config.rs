//! Polling configuration

use std::fmt;
use std::time::Duration;

use indexmap::IndexMap;

/// Headers or query parameters for a poll: either a fixed map, or a
/// producer invoked fresh before every request (for values that change
/// over time, such as auth tokens or high-water marks).
pub enum MapSource {
    Static(IndexMap<String, String>),
    Producer(Box<dyn Fn() -> IndexMap<String, String> + Send + Sync>),
}

impl MapSource {
    pub(crate) fn resolve(&self) -> IndexMap<String, String> {
        match self {
            MapSource::Static(map) => map.clone(),
            MapSource::Producer(f) => f(),
        }
    }

    pub fn producer<F>(f: F) -> Self
    where
        F: Fn() -> IndexMap<String, String> + Send + Sync + 'static,
    {
        MapSource::Producer(Box::new(f))
    }
}

impl Default for MapSource {
    fn default() -> Self {
        MapSource::Static(IndexMap::new())
    }
}

impl From<IndexMap<String, String>> for MapSource {
    fn from(map: IndexMap<String, String>) -> Self {
        MapSource::Static(map)
    }
}

impl fmt::Debug for MapSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapSource::Static(map) => f.debug_tuple("Static").field(map).finish(),
            MapSource::Producer(_) => f.debug_tuple("Producer").finish(),
        }
    }
}

/// Configuration for a polling loop. `Default` gives the standard policy:
/// start at 1s, double on unchanged responses up to 64s, no call limit,
/// no auto-stop, first request after the initial delay.
#[derive(Debug)]
pub struct PollConfig {
    /// Headers sent with every poll request
    pub headers: MapSource,
    /// Query parameters sent with every poll request
    pub params: MapSource,
    /// Starting (and floor) interval between requests
    pub min_timeout: Duration,
    /// Ceiling for the grown interval
    pub max_timeout: Duration,
    /// Interval growth factor on unchanged responses; 1 or 0 disables growth
    pub multiplier: u32,
    /// Stop after this many successful calls; 0 = unlimited
    pub max_calls: u32,
    /// Stop after this many consecutive unchanged responses; 0 = disabled
    pub auto_stop: u32,
    /// Issue the first request immediately instead of waiting `min_timeout`
    pub run_at_once: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            headers: MapSource::default(),
            params: MapSource::default(),
            min_timeout: Duration::from_millis(1000),
            max_timeout: Duration::from_millis(64000),
            multiplier: 2,
            max_calls: 0,
            auto_stop: 0,
            run_at_once: false,
        }
    }
}

impl PollConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headers(mut self, headers: impl Into<MapSource>) -> Self {
        self.headers = headers.into();
        self
    }

    pub fn params(mut self, params: impl Into<MapSource>) -> Self {
        self.params = params.into();
        self
    }

    pub fn min_timeout(mut self, min_timeout: Duration) -> Self {
        self.min_timeout = min_timeout;
        self
    }

    pub fn max_timeout(mut self, max_timeout: Duration) -> Self {
        self.max_timeout = max_timeout;
        self
    }

    pub fn multiplier(mut self, multiplier: u32) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn max_calls(mut self, max_calls: u32) -> Self {
        self.max_calls = max_calls;
        self
    }

    pub fn auto_stop(mut self, auto_stop: u32) -> Self {
        self.auto_stop = auto_stop;
        self
    }

    pub fn run_at_once(mut self, run_at_once: bool) -> Self {
        self.run_at_once = run_at_once;
        self
    }
}

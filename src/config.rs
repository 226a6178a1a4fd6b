//! Pipeline sizing and naming.

use crate::error::Error;

/// Capture ring slots; holds up to 7 interrupts between deferred runs.
pub const DEFAULT_CAPTURE_CAPACITY: usize = 8;
/// Bulk ring slots; holds up to 15 records between reads.
pub const DEFAULT_BULK_CAPACITY: usize = 16;
pub const DEFAULT_WORKER_NAME: &str = "ph-capture-expander";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    capture_capacity: usize,
    bulk_capacity: usize,
    worker_name: &'static str,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            capture_capacity: DEFAULT_CAPTURE_CAPACITY,
            bulk_capacity: DEFAULT_BULK_CAPACITY,
            worker_name: DEFAULT_WORKER_NAME,
        }
    }

    pub const fn with_capture_capacity(mut self, capacity: usize) -> Self {
        self.capture_capacity = capacity;
        self
    }

    pub const fn with_bulk_capacity(mut self, capacity: usize) -> Self {
        self.bulk_capacity = capacity;
        self
    }

    /// Thread name used by [`Pipeline::spawn`](crate::Pipeline::spawn).
    pub const fn with_worker_name(mut self, name: &'static str) -> Self {
        self.worker_name = name;
        self
    }

    #[inline]
    pub const fn capture_capacity(&self) -> usize {
        self.capture_capacity
    }

    #[inline]
    pub const fn bulk_capacity(&self) -> usize {
        self.bulk_capacity
    }

    #[inline]
    pub const fn worker_name(&self) -> &'static str {
        self.worker_name
    }

    /// Check both capacities before anything is allocated.
    pub fn validate(&self) -> Result<(), Error> {
        for capacity in [self.capture_capacity, self.bulk_capacity] {
            if capacity == 0 || !capacity.is_power_of_two() {
                return Err(Error::CapacityInvalid { capacity });
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_driver_sizes() {
        let config = Config::default();
        assert_eq!(config.capture_capacity(), 8);
        assert_eq!(config.bulk_capacity(), 16);
        assert_eq!(config.worker_name(), DEFAULT_WORKER_NAME);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_names_the_bad_capacity() {
        let config = Config::new().with_capture_capacity(32).with_bulk_capacity(24);
        assert!(matches!(
            config.validate(),
            Err(Error::CapacityInvalid { capacity: 24 })
        ));

        let config = Config::new().with_capture_capacity(0);
        assert!(matches!(
            config.validate(),
            Err(Error::CapacityInvalid { capacity: 0 })
        ));
    }
}

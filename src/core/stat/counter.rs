/// `Counter` is one second-granularity bucket of the sliding window.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    /// the unix second this bucket represents
    pub(crate) second: i64,
    pub(crate) success: u64,
    pub(crate) failure: u64,
}

impl Counter {
    /// zero the counts and re-stamp the bucket for `second`
    pub fn reset(&mut self, second: i64) {
        self.second = second;
        self.success = 0;
        self.failure = 0;
    }

    #[inline]
    pub fn second(&self) -> i64 {
        self.second
    }

    #[inline]
    pub fn success(&self) -> u64 {
        self.success
    }

    #[inline]
    pub fn failure(&self) -> u64 {
        self.failure
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.success + self.failure
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reset_bucket() {
        let mut counter = Counter {
            second: 3,
            success: 5,
            failure: 10,
        };
        assert_eq!(counter.total(), 15);
        counter.reset(42);
        assert_eq!(counter.second(), 42);
        assert_eq!(counter.success(), 0);
        assert_eq!(counter.failure(), 0);
    }
}

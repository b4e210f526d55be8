//! Cache statistics collection and reporting.
//!
//! This module tracks the performance counters of the cache:
//! 1. **Hit and Miss Counts:** One counter each, incremented on the timing
//!    access path.
//! 2. **Miss Latency:** A sampled histogram of cycles from miss detection to
//!    the backing-store response.
//! 3. **Derived Metrics:** Hit ratio and mean miss latency.

/// Number of histogram buckets used for miss-latency sampling.
const MISS_LATENCY_BUCKETS: usize = 16;

/// A fixed-bucket-count sampled histogram.
///
/// The bucket width doubles whenever a sample lands beyond the covered
/// range, folding existing buckets pairwise, so the bucket count stays
/// constant regardless of the value distribution.
#[derive(Clone, Debug)]
pub struct Histogram {
    buckets: Vec<u64>,
    bucket_width: u64,
    samples: u64,
    sum: u64,
    min_value: u64,
    max_value: u64,
}

impl Histogram {
    /// Creates an empty histogram with the given number of buckets.
    pub fn new(num_buckets: usize) -> Self {
        assert!(num_buckets >= 2, "histogram needs at least two buckets");
        Self {
            buckets: vec![0; num_buckets],
            bucket_width: 1,
            samples: 0,
            sum: 0,
            min_value: u64::MAX,
            max_value: 0,
        }
    }

    /// Records one sample.
    pub fn sample(&mut self, value: u64) {
        let n = self.buckets.len() as u64;
        while value >= self.bucket_width * n {
            // Double the width and fold buckets pairwise.
            for i in 0..self.buckets.len() / 2 {
                self.buckets[i] = self.buckets[2 * i] + self.buckets[2 * i + 1];
            }
            let half = self.buckets.len() / 2;
            for b in &mut self.buckets[half..] {
                *b = 0;
            }
            self.bucket_width *= 2;
        }
        self.buckets[(value / self.bucket_width) as usize] += 1;
        self.samples += 1;
        self.sum += value;
        self.min_value = self.min_value.min(value);
        self.max_value = self.max_value.max(value);
    }

    /// Returns the number of recorded samples.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Returns the mean of the recorded samples, or 0 with no samples.
    pub fn mean(&self) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        self.sum as f64 / self.samples as f64
    }

    /// Returns the smallest recorded sample, if any.
    pub fn min(&self) -> Option<u64> {
        (self.samples > 0).then_some(self.min_value)
    }

    /// Returns the largest recorded sample, if any.
    pub fn max(&self) -> Option<u64> {
        (self.samples > 0).then_some(self.max_value)
    }

    /// Returns the bucket counts and the current bucket width.
    pub fn buckets(&self) -> (&[u64], u64) {
        (&self.buckets, self.bucket_width)
    }
}

/// Statistics for one cache instance.
#[derive(Clone, Debug)]
pub struct DbrcStats {
    /// Number of hits.
    pub hits: u64,
    /// Number of misses.
    pub misses: u64,
    /// Cycles from miss detection to backing-store response.
    pub miss_latency: Histogram,
}

impl Default for DbrcStats {
    fn default() -> Self {
        Self {
            hits: 0,
            misses: 0,
            miss_latency: Histogram::new(MISS_LATENCY_BUCKETS),
        }
    }
}

impl DbrcStats {
    /// Returns the total number of accesses.
    pub fn accesses(&self) -> u64 {
        self.hits + self.misses
    }

    /// Returns the ratio of hits to total accesses, or 0 with no accesses.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.accesses();
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }

    /// Prints a statistics report to stdout.
    pub fn print(&self) {
        println!("==========================================================");
        println!("DBRC CACHE STATISTICS");
        println!("==========================================================");
        println!("accesses                 {}", self.accesses());
        println!("hits                     {}", self.hits);
        println!("misses                   {}", self.misses);
        println!("hit_ratio                {:.4}", self.hit_ratio());
        println!("miss_latency.samples     {}", self.miss_latency.samples());
        println!("miss_latency.mean        {:.2}", self.miss_latency.mean());
        if let (Some(min), Some(max)) = (self.miss_latency.min(), self.miss_latency.max()) {
            println!("miss_latency.min         {}", min);
            println!("miss_latency.max         {}", max);
        }
        let (buckets, width) = self.miss_latency.buckets();
        for (i, count) in buckets.iter().enumerate() {
            if *count > 0 {
                println!(
                    "miss_latency.bucket      [{}, {}) {}",
                    i as u64 * width,
                    (i as u64 + 1) * width,
                    count
                );
            }
        }
        println!("==========================================================");
    }
}

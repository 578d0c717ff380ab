/// What a measurement pass does with a neighbour id that has no name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DanglingPolicy {
    /// Log, count and leave the neighbour out of the result.
    #[default]
    Skip,
    /// Fail the whole pass with `DanglingReference`.
    Abort,
}

pub struct RunConfig {
    pub total_city_instances: usize,
    pub unique_city_pool_size: usize,
    pub neighbour_degree: usize,
    pub measurement_repeats: usize,
    /// Write ops buffered before a pipeline is synced.
    pub pipeline_flush_every: usize,
    pub seed: Option<u64>,
    pub dangling_policy: DanglingPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            total_city_instances: 10_000,
            unique_city_pool_size: 1_000,
            neighbour_degree: 10,
            measurement_repeats: 10,
            pipeline_flush_every: 64,
            seed: None,
            dangling_policy: DanglingPolicy::Skip,
        }
    }
}

/// Metric names recorded for a single task. Generated by [`generate_labels!`].
#[derive(Copy, Clone, Debug)]
pub struct TaskLabels {
    pub success: &'static str,
    pub error: &'static str,
    pub latency: &'static str,
}

#[macro_export]
macro_rules! generate_labels {
    ($base_name:expr) => {
        ::swarm::core::TaskLabels {
            success: concat!("swarm_task_", stringify!($base_name), "_success"),
            error: concat!("swarm_task_", stringify!($base_name), "_error"),
            latency: concat!("swarm_task_", stringify!($base_name), "_latency"),
        }
    };
}

pub mod activity;

pub use activity::{ActivityMetric, ActivityRate, ActivityStats};

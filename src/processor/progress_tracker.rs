use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

pub struct ProgressTracker {
    pb: ProgressBar,
    start_time: Instant,
    year: Option<i32>,
    orders: u32,
}

impl ProgressTracker {
    pub fn new() -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} [{elapsed}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );

        Self {
            pb,
            start_time: Instant::now(),
            year: None,
            orders: 0,
        }
    }

    pub fn start(&mut self, message: &str) {
        self.pb.set_message(message.to_string());
        self.pb.enable_steady_tick(Duration::from_millis(100));
    }

    pub fn update(&mut self, message: &str) {
        self.pb.set_message(message.to_string());
    }

    pub fn start_year(&mut self, year: i32) {
        self.year = Some(year);
        self.orders = 0;
        self.pb.set_message(format!("{}: loading order history...", year));
    }

    pub fn log_order(&mut self, order_id: &str) {
        self.orders += 1;
        self.pb.set_message(format!(
            "{}: order {} ({} so far)",
            self.year.map(|y| y.to_string()).unwrap_or_default(),
            order_id,
            self.orders
        ));
    }

    pub fn complete(&self, message: &str) {
        self.pb.finish_with_message(format!(
            "{} in {:.2} seconds",
            message,
            self.start_time.elapsed().as_secs_f32()
        ));
    }

    pub fn abandon(&self, message: &str) {
        self.pb.abandon_with_message(message.to_string());
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

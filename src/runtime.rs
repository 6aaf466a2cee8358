use itertools::Itertools;
use log::info;

use std::collections::HashMap;

use hifitime::prelude::{Duration, Epoch};

use rtcm_caster::prelude::Frame;

#[derive(Debug)]
pub struct Runtime {
    /// Epoch of deployment
    deploy_time: Epoch,

    /// Uptime as [Duration]
    pub uptime: Duration,

    /// Published frames, per message number
    published: HashMap<u16, usize>,

    /// Rejected frames or failed builds
    rejected: usize,
}

impl Runtime {
    pub fn new(epoch: Epoch) -> Self {
        Self {
            deploy_time: epoch,
            uptime: Default::default(),
            published: Default::default(),
            rejected: 0,
        }
    }

    /// Update latest epoch
    pub fn new_epoch(&mut self, epoch: Epoch) {
        self.uptime = epoch - self.deploy_time;
    }

    /// Latch one published [Frame]
    pub fn published(&mut self, frame: &Frame) {
        *self.published.entry(frame.message_number()).or_default() += 1;
    }

    pub fn rejected(&mut self) {
        self.rejected += 1;
    }

    pub fn total_published(&self) -> usize {
        self.published.values().sum()
    }

    /// Logs the statistics
    pub fn report(&self) {
        info!(
            "uptime: {} - {} frames published, {} rejected",
            self.uptime,
            self.total_published(),
            self.rejected
        );

        for (msg, count) in self.published.iter().sorted_by_key(|(msg, _)| **msg) {
            info!("  {}: {}", msg, count);
        }
    }
}

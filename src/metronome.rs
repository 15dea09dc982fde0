//! Startup and shutdown sequencing.

use crate::config::Settings;
use crate::device::{DeviceSpec, InputHost, InputSink};
use crate::error::Result;
use crate::tick::TickGenerator;
use crate::toggle::{ToggleSwitch, ToggleTrigger};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// A loaded metronome: device registered, triggers bound, generators armed.
///
/// Exists only in the loaded state; [`Metronome::stop`] consumes it.
pub struct Metronome {
    switch: ToggleSwitch,
    triggers: Vec<Box<dyn ToggleTrigger>>,
    generators: Vec<TickGenerator>,
    device: Option<Arc<dyn InputSink>>,
    origin: Instant,
}

impl Metronome {
    /// Creates the device, registers the triggers and arms the generators.
    ///
    /// Only device allocation and registration can fail; a trigger that
    /// cannot be registered is logged and skipped. Must be called from within
    /// a tokio runtime.
    pub fn start<H: InputHost>(
        settings: &Settings,
        host: &H,
        triggers: Vec<Box<dyn ToggleTrigger>>,
    ) -> Result<Self> {
        info!("Loaded.");

        let spec = DeviceSpec::keyboard(settings.keys());
        info!("Registering device...");
        let allocated = host
            .allocate(&spec)
            .inspect_err(|e| error!("Failed to allocate device: {}", e))?;
        let device = host
            .register(allocated)
            .inspect_err(|e| error!("Failed to register device: {}", e))?;

        let switch = ToggleSwitch::new(settings.status());

        let mut registered = Vec::with_capacity(triggers.len());
        for mut trigger in triggers {
            info!("Registering {}...", trigger.describe());
            match trigger.register(switch.clone()) {
                Ok(()) => registered.push(trigger),
                Err(e) => warn!("Skipping {}: {}", trigger.describe(), e),
            }
        }

        let origin = Instant::now();
        let mut generators = Vec::new();
        for slot in settings.generators() {
            let mut generator = TickGenerator::new(slot.index, slot.interval, slot.key);
            generator.arm(switch.clone(), device.clone(), origin);
            generators.push(generator);
        }

        Ok(Self {
            switch,
            triggers: registered,
            generators,
            device: Some(device),
            origin,
        })
    }

    pub fn switch(&self) -> &ToggleSwitch {
        &self.switch
    }

    /// Slot numbers of the armed generators.
    pub fn armed(&self) -> Vec<usize> {
        self.generators
            .iter()
            .filter(|g| g.is_armed())
            .map(TickGenerator::index)
            .collect()
    }

    /// Instant the generators were armed; emission timestamps count from here.
    pub fn origin(&self) -> Instant {
        self.origin
    }

    /// Tears everything down in reverse order.
    ///
    /// The device is released only after every generator's task has
    /// finished, so no key is reported to an unregistered device.
    pub async fn stop(mut self) {
        for mut trigger in self.triggers.drain(..) {
            info!("Unregistering {}...", trigger.describe());
            trigger.unregister();
        }

        info!("Stopping timers...");
        for generator in &mut self.generators {
            generator.cancel().await;
        }

        info!("Unregistering device...");
        drop(self.device.take());

        info!("Unloaded.");
    }
}

impl Drop for Metronome {
    fn drop(&mut self) {
        for trigger in &mut self.triggers {
            trigger.unregister();
        }
    }
}

// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{CStr, CString};

use ash::vk;
use prism_core::{Error, Result};
use tracing::info;

/// Score given to adapters that cannot drive the surface at all.
pub const DISQUALIFIED: i32 = -1;

/// What the surface looks like from one adapter.
#[derive(Clone, Debug, Default)]
pub struct SurfaceSupport {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

/// Everything selection needs to know about one physical device.
#[derive(Clone, Debug)]
pub struct AdapterProfile {
    pub handle: vk::PhysicalDevice,
    pub name: String,
    pub device_type: vk::PhysicalDeviceType,
    pub extensions: Vec<CString>,
    pub surface: SurfaceSupport,
}

impl AdapterProfile {
    pub fn supports_extensions(&self, required: &[&CStr]) -> bool {
        required
            .iter()
            .all(|want| self.extensions.iter().any(|have| have.as_c_str() == *want))
    }

    /// +1 for discrete hardware; [`DISQUALIFIED`] when an extension is missing
    /// or the surface offers no formats or no present modes.
    pub fn score(&self, required: &[&CStr]) -> i32 {
        if !self.supports_extensions(required)
            || self.surface.formats.is_empty()
            || self.surface.present_modes.is_empty()
        {
            return DISQUALIFIED;
        }
        match self.device_type {
            vk::PhysicalDeviceType::DISCRETE_GPU => 1,
            _ => 0,
        }
    }
}

/// Queries one adapter for the capability set selection scores on.
pub trait CapabilityProbe {
    fn probe(&self, adapter: vk::PhysicalDevice) -> AdapterProfile;
}

/// Picks the highest scoring adapter. Among equal scores the one enumerated
/// last wins, so the result is stable for a fixed enumeration order.
pub fn select_adapter<P: CapabilityProbe + ?Sized>(
    probe: &P,
    adapters: &[vk::PhysicalDevice],
    required: &[&CStr],
) -> Result<AdapterProfile> {
    if adapters.is_empty() {
        return Err(Error::NoAdapterFound);
    }

    let (score, best) = adapters
        .iter()
        .map(|&adapter| {
            let profile = probe.probe(adapter);
            let score = profile.score(required);
            info!("adapter detected: {} (score {})", profile.name, score);
            (score, profile)
        })
        .max_by_key(|(score, _)| *score)
        .ok_or(Error::NoAdapterFound)?;

    if score <= DISQUALIFIED {
        return Err(Error::NoSuitableAdapter);
    }
    info!("adapter selected: {} ({:?})", best.name, best.device_type);
    Ok(best)
}

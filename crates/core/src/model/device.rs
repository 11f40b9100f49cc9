//! Static viewport descriptors per device type.

use serde::Serialize;

use super::DeviceType;

/// Viewport the browser is configured with for a device type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
    pub is_mobile: bool,
    pub has_touch: bool,
}

/// Device configuration handed to the analysis pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeviceConfiguration {
    pub viewport: Viewport,
}

const DESKTOP: DeviceConfiguration = DeviceConfiguration {
    viewport: Viewport { width: 1920, height: 1080, device_scale_factor: 1.0, is_mobile: false, has_touch: false },
};

const MOBILE: DeviceConfiguration = DeviceConfiguration {
    viewport: Viewport { width: 375, height: 667, device_scale_factor: 2.0, is_mobile: true, has_touch: true },
};

impl DeviceType {
    /// The fixed configuration for this device type.
    pub fn configuration(self) -> &'static DeviceConfiguration {
        match self {
            DeviceType::Desktop => &DESKTOP,
            DeviceType::Mobile => &MOBILE,
        }
    }
}

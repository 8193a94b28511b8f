//! # Joystick Discovery Module
//!
//! This module handles joystick detection and connection using the Linux
//! evdev interface.
//!
//! ## Device Detection
//!
//! A device counts as a joystick when it reports:
//! - An absolute X axis (ABS_X)
//! - At least one key in the joystick/gamepad button blocks
//!
//! Detected devices are sorted by their `/dev/input/eventX` path, so a
//! configured device index always selects the same stick across runs.
//!
//! ## Axis Layout
//!
//! Hat axes (ABS_HAT0X through ABS_HAT3Y) are carried separately from
//! regular axes: regular axes get slot numbers in ascending code order,
//! hats are counted as discrete direction pads.

use evdev::Device;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, StickmixError};

/// First evdev ABS code belonging to a hat (ABS_HAT0X)
pub const HAT_CODE_FIRST: u16 = 0x10;

/// Last evdev ABS code belonging to a hat (ABS_HAT3Y)
pub const HAT_CODE_LAST: u16 = 0x17;

/// Joystick button block (BTN_TRIGGER through BTN_THUMBR)
const BUTTON_BLOCK: std::ops::RangeInclusive<u16> = 0x120..=0x13e;

/// Extra button block (BTN_TRIGGER_HAPPY1 through BTN_TRIGGER_HAPPY40)
const BUTTON_BLOCK_EXTRA: std::ops::RangeInclusive<u16> = 0x2c0..=0x2e7;

/// evdev code of the absolute X axis
const ABS_X_CODE: u16 = 0x00;

/// Whether an ABS code is one of the hat axes.
#[must_use]
pub fn is_hat_code(code: u16) -> bool {
    (HAT_CODE_FIRST..=HAT_CODE_LAST).contains(&code)
}

/// Whether a key code is a joystick or gamepad button.
#[must_use]
pub fn is_joystick_button(code: u16) -> bool {
    BUTTON_BLOCK.contains(&code) || BUTTON_BLOCK_EXTRA.contains(&code)
}

/// Range of one absolute axis as reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    /// evdev ABS code of the axis
    pub code: u16,
    /// Raw value at full negative deflection
    pub min: i32,
    /// Raw value at full positive deflection
    pub max: i32,
}

/// Shape of a joystick: its axes, buttons, and hat count.
///
/// Slot numbers are assigned in ascending code order, so axis 0 is the
/// device's lowest ABS code (normally ABS_X) and button 0 its lowest
/// button code (normally BTN_TRIGGER on sticks, BTN_SOUTH on gamepads).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceLayout {
    /// Regular (non-hat) axes, indexed by axis slot
    pub axes: Vec<AxisRange>,
    /// Button key codes, indexed by button slot
    pub buttons: Vec<u16>,
    /// Number of hats
    pub hats: usize,
}

/// An opened joystick device.
///
/// Holds the evdev handle together with the index it was selected by
/// and the path it was opened from. Closing is automatic when the
/// handle is dropped.
pub struct Joystick {
    device: Device,
    index: usize,
    path: PathBuf,
}

impl std::fmt::Debug for Joystick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Joystick")
            .field("index", &self.index)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Joystick {
    /// Open the joystick at `index` in the sorted device list.
    ///
    /// Scans `/dev/input/event*` devices, keeps the ones that look like
    /// joysticks, sorts them by path, and opens the `index`-th.
    ///
    /// # Errors
    ///
    /// - [`StickmixError::JoystickNotFound`]: fewer than `index + 1`
    ///   joysticks are connected
    /// - [`StickmixError::DeviceRead`]: `/dev/input` cannot be scanned
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use stickmix::input::joystick::Joystick;
    ///
    /// let stick = Joystick::open(0)?;
    /// println!("Using {} at {}", stick.name().unwrap_or("unknown"), stick.path().display());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(index: usize) -> Result<Self> {
        let sticks = enumerate_joysticks()?;
        let available = sticks.len();

        match sticks.into_iter().nth(index) {
            Some((path, device)) => {
                info!(
                    "Selected joystick {}: {} at {}",
                    index,
                    device.name().unwrap_or("unknown"),
                    path.display()
                );
                Ok(Joystick {
                    device,
                    index,
                    path,
                })
            }
            None => Err(StickmixError::JoystickNotFound { index, available }),
        }
    }

    /// The index this joystick was selected by.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The `/dev/input/eventX` path this joystick was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Human-readable device name from evdev.
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Read the device's axis, button, and hat layout.
    ///
    /// Axis ranges come from the driver's absinfo, so slot values can be
    /// normalized against the hardware's real range rather than an
    /// assumed one.
    ///
    /// # Errors
    ///
    /// Returns [`StickmixError::Io`] if the absinfo ioctl fails.
    pub fn layout(&self) -> Result<DeviceLayout> {
        let abs_state = self.device.get_abs_state()?;

        let mut axes = Vec::new();
        let mut hat_seen = [false; 4];

        if let Some(supported) = self.device.supported_absolute_axes() {
            let mut codes: Vec<u16> = supported.iter().map(|axis| axis.0).collect();
            codes.sort_unstable();

            for code in codes {
                if is_hat_code(code) {
                    hat_seen[((code - HAT_CODE_FIRST) / 2) as usize] = true;
                    continue;
                }
                let info = abs_state[code as usize];
                axes.push(AxisRange {
                    code,
                    min: info.minimum,
                    max: info.maximum,
                });
            }
        }

        let mut buttons = Vec::new();
        if let Some(supported) = self.device.supported_keys() {
            buttons = supported
                .iter()
                .map(|key| key.code())
                .filter(|code| is_joystick_button(*code))
                .collect();
            buttons.sort_unstable();
        }

        Ok(DeviceLayout {
            axes,
            buttons,
            hats: hat_seen.iter().filter(|seen| **seen).count(),
        })
    }

    /// Surrender the evdev handle, consuming the joystick.
    ///
    /// The event pump takes the raw device so it can run the blocking
    /// read loop on its own thread.
    #[must_use]
    pub fn into_device(self) -> Device {
        self.device
    }
}

/// Scan `/dev/input` for joystick-like event devices, sorted by path.
fn enumerate_joysticks() -> Result<Vec<(PathBuf, Device)>> {
    let input_dir = Path::new("/dev/input");

    let mut entries: Vec<_> = std::fs::read_dir(input_dir)
        .map_err(|e| StickmixError::DeviceRead(format!("failed to read /dev/input: {}", e)))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| StickmixError::DeviceRead(format!("failed to read directory entry: {}", e)))?;

    // Sort entries for deterministic device indices when multiple sticks are connected
    entries.sort_by_key(|entry| entry.path());

    let mut sticks = Vec::new();

    for entry in entries {
        let path = entry.path();

        // Only check event* devices
        if let Some(filename) = path.file_name() {
            if !filename.to_string_lossy().starts_with("event") {
                continue;
            }
        } else {
            continue;
        }

        match Device::open(&path) {
            Ok(device) => {
                if is_joystick(&device) {
                    info!(
                        "Found joystick {}: {} at {}",
                        sticks.len(),
                        device.name().unwrap_or("unknown"),
                        path.display()
                    );
                    sticks.push((path, device));
                } else {
                    debug!(
                        "Skipping non-joystick device: {} at {}",
                        device.name().unwrap_or("unknown"),
                        path.display()
                    );
                }
            }
            Err(e) => {
                // Permission denied or other errors - skip device
                debug!("Could not open {}: {}", path.display(), e);
            }
        }
    }

    Ok(sticks)
}

/// Whether a device reports the capabilities of a joystick.
fn is_joystick(device: &Device) -> bool {
    let has_abs_x = device
        .supported_absolute_axes()
        .map(|axes| axes.iter().any(|axis| axis.0 == ABS_X_CODE))
        .unwrap_or(false);

    let has_button = device
        .supported_keys()
        .map(|keys| keys.iter().any(|key| is_joystick_button(key.code())))
        .unwrap_or(false);

    has_abs_x && has_button
}

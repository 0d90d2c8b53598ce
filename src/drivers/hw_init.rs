//! One-shot hardware initialisation.
//!
//! Mounts the SPIFFS partition that holds the schedule log, configures the
//! RTC alarm input and registers its ISR.  Called once from `main()` before
//! the tasks start.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

use crate::events::NotifyFlags;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    SpiffsMountFailed(i32),
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    IsrRegisterFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SpiffsMountFailed(rc) => write!(f, "SPIFFS mount failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::IsrRegisterFailed(rc) => write!(f, "alarm ISR registration failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

/// VFS mount point of the schedule filesystem.
pub const SPIFFS_BASE_PATH: &str = "/spiffs";

// ── SPIFFS ────────────────────────────────────────────────────

/// Mount SPIFFS at [`SPIFFS_BASE_PATH`], formatting it if the mount fails.
#[cfg(target_os = "espidf")]
pub fn mount_storage() -> Result<(), HwInitError> {
    let cfg = esp_vfs_spiffs_conf_t {
        base_path: c"/spiffs".as_ptr(),
        partition_label: core::ptr::null(),
        max_files: 4,
        format_if_mount_failed: true,
    };
    // SAFETY: called once from main() before any file access.
    let ret = unsafe { esp_vfs_spiffs_register(&cfg) };
    if ret != ESP_OK {
        return Err(HwInitError::SpiffsMountFailed(ret));
    }

    let mut total: usize = 0;
    let mut used: usize = 0;
    // SAFETY: the partition was registered above; out-params are valid.
    if unsafe { esp_spiffs_info(core::ptr::null(), &mut total, &mut used) } == ESP_OK {
        info!("hw_init: SPIFFS mounted at {} ({}/{} bytes used)", SPIFFS_BASE_PATH, used, total);
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn mount_storage() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): SPIFFS mount skipped");
    Ok(())
}

// ── RTC alarm line ────────────────────────────────────────────

/// Configure the alarm input (pull-up, falling edge) and register the ISR
/// that raises `ALARM_TRIGGERED` on `flags`.
#[cfg(target_os = "espidf")]
pub fn init_alarm_interrupt(flags: &'static NotifyFlags) -> Result<(), HwInitError> {
    use crate::interrupt::{alarm_gpio_isr, isr_arg};

    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::RTC_INT_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_NEGEDGE,
    };

    // SAFETY: single-threaded boot path.  ESP_ERR_INVALID_STATE from the
    // ISR service install means it was already installed.  The handler only
    // touches the 'static flag set.
    unsafe {
        let ret = gpio_config(&cfg);
        if ret != ESP_OK {
            return Err(HwInitError::GpioConfigFailed(ret));
        }

        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        gpio_set_intr_type(pins::RTC_INT_GPIO, gpio_int_type_t_GPIO_INTR_NEGEDGE);
        let ret = gpio_isr_handler_add(pins::RTC_INT_GPIO, Some(alarm_gpio_isr), isr_arg(flags));
        if ret != ESP_OK {
            return Err(HwInitError::IsrRegisterFailed(ret));
        }
        gpio_intr_enable(pins::RTC_INT_GPIO);
    }

    info!("hw_init: RTC alarm ISR installed on GPIO{}", pins::RTC_INT_GPIO);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_alarm_interrupt(_flags: &'static NotifyFlags) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): alarm ISR skipped");
    Ok(())
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;
    use crate::config::SystemConfig;

    #[test]
    fn default_schedule_files_live_on_the_mounted_partition() {
        let cfg = SystemConfig::default();
        let prefix = format!("{}/", SPIFFS_BASE_PATH);
        assert!(cfg.schedule_path.starts_with(&prefix));
        assert!(cfg.schedule_staging_path.starts_with(&prefix));
    }

    #[test]
    fn host_init_is_a_no_op() {
        static FLAGS: NotifyFlags = NotifyFlags::new();
        assert_eq!(mount_storage(), Ok(()));
        assert_eq!(init_alarm_interrupt(&FLAGS), Ok(()));
    }
}

//! Display formatting for fares, durations and HUD lines.

use crate::contract::PaymentMethod;

/// Distance (meters) at which the HUD progress bar reads empty.
pub const PROGRESS_FULL_DISTANCE_M: f64 = 1000.0;

pub const ETA_PLACEHOLDER: &str = "Est. Time: --";
pub const UNAVAILABLE_MESSAGE: &str = "Error: taxi service unavailable";

/// Format a duration in whole seconds as `"<m>m <s>s"` or `"<s>s"`.
pub fn format_time(seconds: i64) -> String {
    if seconds <= 0 {
        return "0s".to_string();
    }
    if seconds >= 60 {
        return format!("{}m {}s", seconds / 60, seconds % 60);
    }
    format!("{seconds}s")
}

/// Print an amount the way the host prints numbers: no trailing `.0` for whole values.
pub fn format_amount(amount: f64) -> String {
    if amount == 0.0 {
        // Also folds -0.0.
        return "0".to_string();
    }
    format!("{amount}")
}

pub fn format_fare(amount: f64) -> String {
    format!("${}", format_amount(amount))
}

pub fn eta_label(seconds: i64) -> String {
    format!("Est. Time: {}", format_time(seconds))
}

pub fn quick_label(name: &str) -> String {
    format!("📍 {name}")
}

pub fn confirm_label(method: PaymentMethod) -> String {
    format!("Confirm – Pay with {}", method.label())
}

/// Inline message for a reason string returned by the host.
pub fn error_message(reason: &str) -> String {
    format!("Error: {reason}")
}

/// Progress towards the pickup/dropoff point, in percent.
pub fn hud_progress(distance_m: f64) -> f64 {
    let progress = 100.0 - (distance_m / PROGRESS_FULL_DISTANCE_M) * 100.0;
    if progress.is_nan() {
        return 0.0;
    }
    progress.clamp(0.0, 100.0)
}

pub fn hud_line(eta_secs: i64, distance_m: f64, fare: f64) -> String {
    format!(
        "🚕 ETA: {} | Dist: {} m | Fare: {}",
        format_time(eta_secs),
        format_amount(distance_m),
        format_fare(fare)
    )
}

/// Whole seconds from a wire number; fractions are truncated and out-of-range
/// values saturate.
pub fn whole_seconds(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    value as i64
}

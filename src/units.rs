//! Temperature unit conversion and display formatting

/// Convert degrees Celsius to degrees Fahrenheit
#[must_use]
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Format a Fahrenheit value for display, e.g. `"68.0°F"`
#[must_use]
pub fn format_fahrenheit(fahrenheit: f64) -> String {
    format!("{fahrenheit:.1}°F")
}

/// Format a signed Fahrenheit delta, e.g. `"+1.4°F"`
#[must_use]
pub fn format_fahrenheit_delta(delta: f64) -> String {
    format!("{delta:+.1}°F")
}

/// Format both units, e.g. `"68.0°F (20.0°C)"`
#[must_use]
pub fn format_dual(celsius: f64) -> String {
    format!(
        "{:.1}°F ({celsius:.1}°C)",
        celsius_to_fahrenheit(celsius)
    )
}

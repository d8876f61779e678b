use datadis_core::ConsumptionSummary;

/// Trait for formatting different types of data
pub trait Formatter<T> {
    fn format(&self, input: T) -> String;
}

/// Masks secrets (tokens, passwords) for log output
pub struct SecretFormatter;

impl Formatter<&str> for SecretFormatter {
    /// Keep the first and last four characters of long secrets
    fn format(&self, secret: &str) -> String {
        let chars: Vec<char> = secret.chars().collect();
        if chars.len() <= 8 {
            return "*".repeat(chars.len());
        }

        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

/// Energy formatter for kWh figures
pub struct EnergyFormatter;

impl Formatter<f64> for EnergyFormatter {
    fn format(&self, kwh: f64) -> String {
        format!("{:.2} kWh", kwh)
    }
}

impl Formatter<&ConsumptionSummary> for EnergyFormatter {
    fn format(&self, summary: &ConsumptionSummary) -> String {
        format!(
            "{} records, {} total (avg {}, max {}, min {})",
            summary.records,
            format_kwh(summary.total_kwh),
            format_kwh(summary.average_kwh),
            format_kwh(summary.max_kwh),
            format_kwh(summary.min_kwh)
        )
    }
}

// Convenience functions
pub fn mask_secret(secret: &str) -> String {
    SecretFormatter.format(secret)
}

pub fn format_kwh(kwh: f64) -> String {
    EnergyFormatter.format(kwh)
}

pub fn format_consumption_summary(summary: &ConsumptionSummary) -> String {
    EnergyFormatter.format(summary)
}

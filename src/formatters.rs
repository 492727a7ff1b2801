//! Formatters - Different output formatters for operation outcomes

use crate::outcome::Outcome;
use std::io::Write;

/// Formatter trait
pub trait Formatter {
    fn format(&self, outcome: &Outcome) -> String;
    fn write_to(&self, outcome: &Outcome, writer: &mut dyn Write) -> std::io::Result<()> {
        writeln!(writer, "{}", self.format(outcome))
    }
}

/// Shell formatter - interactive presentation with colors
pub struct ShellFormatter;

impl Formatter for ShellFormatter {
    fn format(&self, outcome: &Outcome) -> String {
        let prefix = if outcome.success {
            "\x1b[32m✓\x1b[0m"
        } else {
            "\x1b[31m✗\x1b[0m"
        };
        let message = outcome.message.as_deref().unwrap_or("");
        let mut feedback = format!(
            "{} {}: {}",
            prefix,
            outcome.operation.to_string().to_uppercase(),
            message
        );

        if !outcome.details.is_empty() {
            let mut keys: Vec<&String> = outcome.details.keys().collect();
            keys.sort();
            let detail_lines: Vec<String> = keys
                .into_iter()
                .map(|k| format!("  {}: {}", k, display_value(&outcome.details[k])))
                .collect();
            feedback.push_str(&format!("\n{}", detail_lines.join("\n")));
        }

        feedback
    }
}

/// Text formatter - the message alone
pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format(&self, outcome: &Outcome) -> String {
        outcome.message.clone().unwrap_or_default()
    }
}

/// JSON formatter - returns JSON string of structured data
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, outcome: &Outcome) -> String {
        serde_json::to_string(outcome).unwrap_or_else(|_| "{}".to_string())
    }
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Formatters module - factory for creating formatters
pub struct Formatters;

impl Formatters {
    pub fn by_name(name: &str) -> Box<dyn Formatter> {
        match name.to_lowercase().as_str() {
            "shell" => Box::new(ShellFormatter),
            "text" => Box::new(TextFormatter),
            "json" => Box::new(JsonFormatter),
            _ => Box::new(ShellFormatter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Operation;
    use std::path::Path;

    fn saved() -> Outcome {
        Outcome::done(Operation::Save, 2, "Saved to slot 02".to_string())
            .with_path(Path::new("/cfg/savestates/Elite/02.sna"))
    }

    #[test]
    fn shell_lists_details() {
        let text = ShellFormatter.format(&saved());
        assert!(text.contains("SAVE: Saved to slot 02"));
        assert!(text.contains("  path: /cfg/savestates/Elite/02.sna"));
    }

    #[test]
    fn text_is_the_message() {
        assert_eq!(TextFormatter.format(&saved()), "Saved to slot 02");
    }

    #[test]
    fn json_is_parseable() {
        let json: serde_json::Value =
            serde_json::from_str(&Formatters::by_name("json").format(&saved())).unwrap();
        assert_eq!(json["slot"], 2);
    }
}

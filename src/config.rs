//! Runtime configuration: defaults, s-expression config file, overrides.
//!
//! The file is a single plist.  Every key is optional:
//!
//! ```text
//! (:midline 0.5 :thumb :mirrored :sides :near-left :vertical :none
//!  :hold-ms (:left 200 :right 200 :up 300 :down 300)
//!  :repeat-ms (:left 250 :right 250 :up 400 :down 400)
//!  :bindings (:left :move-left :right :move-right :up :rotate :down :drop)
//!  :confirm :confirm :rotate :rotate
//!  :alphabet (:move-left "l" :move-right "r" :rotate "u" :drop "d"
//!             :confirm "a" :alt-confirm " ")
//!  :endpoint "ws://127.0.0.1:8080" :status-interval-secs 60)
//! ```
//!
//! Out of the box both open hands map to nothing and `alt-confirm` is
//! unbound.  To send `alt-confirm` (the space character) on two open
//! hands, use `(:vertical :open-up :bindings (:up :alt-confirm))`.

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use lexpr::Value;
use tracing::warn;

use crate::command::{Alphabet, Command};
use crate::gesture::{
    ClassifierConfig, DebounceConfig, GestureCandidate, PerCandidate, SideConvention,
    ThumbConvention, VerticalMapping,
};
use crate::sexp;

/// Default command channel endpoint.
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:8080";

const KNOWN_KEYS: &[&str] = &[
    "midline",
    "thumb",
    "sides",
    "vertical",
    "hold-ms",
    "repeat-ms",
    "bindings",
    "confirm",
    "rotate",
    "alphabet",
    "endpoint",
    "status-interval-secs",
];

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub classifier: ClassifierConfig,
    pub debounce: DebounceConfig,
    pub alphabet: Alphabet,
    /// WebSocket URL of the command listener.
    pub endpoint: String,
    /// How often the session loop logs a status line.
    pub status_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            debounce: DebounceConfig::default(),
            alphabet: Alphabet::default(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            status_interval: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Read and parse a config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_sexp(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Parse a config plist on top of the defaults.
    pub fn from_sexp(text: &str) -> anyhow::Result<Self> {
        let value = lexpr::from_str(text).map_err(|e| anyhow!("malformed s-expression: {e}"))?;
        let mut config = Self::default();
        config.apply(&value)?;
        Ok(config)
    }

    fn apply(&mut self, value: &Value) -> anyhow::Result<()> {
        if !sexp::is_nil(value) && sexp::list_items(value).is_none() {
            bail!("config must be a plist");
        }
        for (key, _) in sexp::plist_entries(value) {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                warn!(key = %key, "ignoring unknown config key");
            }
        }

        if let Some(v) = sexp::plist_get(value, "midline") {
            let midline = sexp::as_f64(v)
                .filter(|m| m.is_finite())
                .ok_or_else(|| anyhow!(":midline must be a number, got {v}"))?;
            self.classifier.midline = midline as f32;
        }
        if let Some(s) = sexp::get_keyword(value, "thumb") {
            self.classifier.thumb = ThumbConvention::parse(&s)
                .ok_or_else(|| anyhow!(":thumb must be :mirrored or :unmirrored, got {s}"))?;
        }
        if let Some(s) = sexp::get_keyword(value, "sides") {
            self.classifier.sides = SideConvention::parse(&s)
                .ok_or_else(|| anyhow!(":sides must be :near-left or :near-right, got {s}"))?;
        }
        if let Some(s) = sexp::get_keyword(value, "vertical") {
            self.debounce.vertical = VerticalMapping::parse(&s).ok_or_else(|| {
                anyhow!(":vertical must be :none, :open-up, :fist-down or :both, got {s}")
            })?;
        }
        if let Some(v) = sexp::plist_get(value, "hold-ms") {
            apply_per_candidate(v, "hold-ms", &mut self.debounce.hold_time, parse_millis)?;
        }
        if let Some(v) = sexp::plist_get(value, "repeat-ms") {
            apply_per_candidate(v, "repeat-ms", &mut self.debounce.repeat_interval, parse_millis)?;
        }
        if let Some(v) = sexp::plist_get(value, "bindings") {
            apply_per_candidate(v, "bindings", &mut self.debounce.bindings, parse_binding)?;
        }
        if let Some(s) = sexp::get_keyword(value, "confirm") {
            self.debounce.confirm_command = parse_command(&s).context(":confirm")?;
        }
        if let Some(s) = sexp::get_keyword(value, "rotate") {
            self.debounce.rotate_command = parse_command(&s).context(":rotate")?;
        }
        if let Some(v) = sexp::plist_get(value, "alphabet") {
            self.apply_alphabet(v)?;
        }
        if let Some(v) = sexp::plist_get(value, "endpoint") {
            match v {
                Value::String(s) => self.endpoint = s.to_string(),
                other => bail!(":endpoint must be a string, got {other}"),
            }
        }
        if let Some(v) = sexp::plist_get(value, "status-interval-secs") {
            let secs = sexp::as_f64(v)
                .filter(|s| s.is_finite() && *s > 0.0)
                .ok_or_else(|| anyhow!(":status-interval-secs must be a positive number, got {v}"))?;
            self.status_interval = Duration::from_secs_f64(secs);
        }
        Ok(())
    }

    fn apply_alphabet(&mut self, value: &Value) -> anyhow::Result<()> {
        for (key, v) in sexp::plist_entries(value) {
            let command = parse_command(&key).context(":alphabet")?;
            let ch = match v {
                Value::String(s) => {
                    let mut chars = s.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => c,
                        _ => bail!(":alphabet :{key} must be a one-character string, got {v}"),
                    }
                }
                Value::Char(c) => *c,
                other => bail!(":alphabet :{key} must be a one-character string, got {other}"),
            };
            self.alphabet.set(command, ch);
        }
        for (a, b) in self.alphabet.collisions() {
            warn!(
                "commands {} and {} share the character {:?}",
                a.as_str(),
                b.as_str(),
                self.alphabet.encode(a)
            );
        }
        Ok(())
    }

    /// S-expression of the effective configuration.
    pub fn config_sexp(&self) -> String {
        let c = &self.classifier;
        let machine = crate::gesture::GestureMachine::new(self.debounce.clone()).config_sexp();
        // Splice the machine plist into ours.
        let machine_body = machine
            .strip_prefix('(')
            .and_then(|m| m.strip_suffix(')'))
            .unwrap_or(&machine);
        let alphabet = Command::ALL
            .iter()
            .map(|cmd| {
                format!(
                    ":{} \"{}\"",
                    cmd.as_str(),
                    sexp::escape_string(&self.alphabet.encode(*cmd).to_string())
                )
            })
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "(:midline {} :thumb :{} :sides :{} {} :alphabet ({}) :endpoint \"{}\" :status-interval-secs {})",
            c.midline,
            c.thumb.as_str(),
            c.sides.as_str(),
            machine_body,
            alphabet,
            sexp::escape_string(&self.endpoint),
            self.status_interval.as_secs_f64(),
        )
    }
}

/// Apply a `(:left x :right y ...)` plist to a per-candidate table.
fn apply_per_candidate<T>(
    value: &Value,
    name: &str,
    table: &mut PerCandidate<T>,
    parse: fn(&Value) -> anyhow::Result<T>,
) -> anyhow::Result<()> {
    for (key, v) in sexp::plist_entries(value) {
        let candidate = GestureCandidate::parse(&key)
            .ok_or_else(|| anyhow!(":{name} has unknown gesture :{key}"))?;
        let parsed = parse(v).with_context(|| format!(":{name} :{key}"))?;
        if let Some(slot) = table.get_mut(candidate) {
            *slot = parsed;
        }
    }
    Ok(())
}

fn parse_millis(value: &Value) -> anyhow::Result<Duration> {
    let ms = sexp::as_f64(value)
        .filter(|ms| ms.is_finite() && *ms >= 0.0)
        .ok_or_else(|| anyhow!("expected non-negative milliseconds, got {value}"))?;
    Ok(Duration::from_micros((ms * 1000.0).round() as u64))
}

fn parse_binding(value: &Value) -> anyhow::Result<Option<Command>> {
    if sexp::is_nil(value) {
        return Ok(None);
    }
    let s = sexp::atom_string(value).ok_or_else(|| anyhow!("expected a command, got {value}"))?;
    parse_command(&s).map(Some)
}

fn parse_command(s: &str) -> anyhow::Result<Command> {
    Command::parse(s).ok_or_else(|| anyhow!("unknown command {s:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = Config::default();
        assert_eq!(c.classifier.midline, 0.5);
        assert_eq!(c.classifier.thumb, ThumbConvention::Mirrored);
        assert_eq!(c.endpoint, "ws://127.0.0.1:8080");
        assert_eq!(c.debounce.hold_time.left, Duration::from_millis(200));
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::from_sexp("()").unwrap(), Config::default());
    }

    #[test]
    fn test_full_config() {
        let c = Config::from_sexp(
            r#"(:midline 320 :thumb :unmirrored :sides :near-right :vertical :both
                :hold-ms (:left 120 :down 50)
                :repeat-ms (:right 90)
                :bindings (:up nil :down :alt-confirm)
                :confirm :alt-confirm
                :alphabet (:move-left "h" :alt-confirm "!")
                :endpoint "ws://10.0.0.2:9000"
                :status-interval-secs 5)"#,
        )
        .unwrap();
        assert_eq!(c.classifier.midline, 320.0);
        assert_eq!(c.classifier.thumb, ThumbConvention::Unmirrored);
        assert_eq!(c.classifier.sides, SideConvention::NearRight);
        assert_eq!(c.debounce.vertical, VerticalMapping::Both);
        assert_eq!(c.debounce.hold_time.left, Duration::from_millis(120));
        assert_eq!(c.debounce.hold_time.down, Duration::from_millis(50));
        assert_eq!(c.debounce.hold_time.right, Duration::from_millis(200));
        assert_eq!(c.debounce.repeat_interval.right, Duration::from_millis(90));
        assert_eq!(c.debounce.bindings.up, None);
        assert_eq!(c.debounce.bindings.down, Some(Command::AltConfirm));
        assert_eq!(c.debounce.confirm_command, Command::AltConfirm);
        assert_eq!(c.alphabet.encode(Command::MoveLeft), 'h');
        assert_eq!(c.alphabet.encode(Command::AltConfirm), '!');
        assert_eq!(c.endpoint, "ws://10.0.0.2:9000");
        assert_eq!(c.status_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_values_name_the_key() {
        let err = Config::from_sexp("(:thumb :sideways)").unwrap_err();
        assert!(format!("{err:#}").contains(":thumb"), "{err:#}");

        let err = Config::from_sexp("(:hold-ms (:left -5))").unwrap_err();
        assert!(format!("{err:#}").contains(":hold-ms :left"), "{err:#}");

        let err = Config::from_sexp("(:hold-ms (:sideways 5))").unwrap_err();
        assert!(format!("{err:#}").contains("sideways"), "{err:#}");

        let err = Config::from_sexp(r#"(:alphabet (:rotate "up"))"#).unwrap_err();
        assert!(format!("{err:#}").contains("one-character"), "{err:#}");

        assert!(Config::from_sexp("(:bindings (:left :jump))").is_err());
        assert!(Config::from_sexp("(:endpoint 5)").is_err());
        assert!(Config::from_sexp("(:midline").is_err());
        assert!(Config::from_sexp("42").is_err());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let c = Config::from_sexp("(:colour :blue :midline 0.4)").unwrap();
        assert_eq!(c.classifier.midline, 0.4);
    }

    #[test]
    fn test_config_sexp_round_trips() {
        let mut original = Config::default();
        original.classifier.midline = 0.25;
        original.debounce.vertical = VerticalMapping::OpenUp;
        original.debounce.hold_time.up = Duration::from_millis(75);
        original.debounce.bindings.right = None;
        original.alphabet.set(Command::Drop, 'x');

        let sexp = original.config_sexp();
        let reparsed = Config::from_sexp(&sexp).unwrap();
        assert_eq!(reparsed, original, "{sexp}");
    }

    #[test]
    fn test_keyword_value_is_not_read_as_key() {
        let c = Config::from_sexp("(:confirm :rotate :midline 0.4)").unwrap();
        assert_eq!(c.debounce.confirm_command, Command::Rotate);
        assert_eq!(c.debounce.rotate_command, Command::Rotate);
        assert_eq!(c.classifier.midline, 0.4);
    }

    #[test]
    fn test_swapped_confirm_and_rotate_round_trip() {
        let mut original = Config::default();
        original.debounce.confirm_command = Command::Rotate;
        original.debounce.rotate_command = Command::Drop;

        let sexp = original.config_sexp();
        let reparsed = Config::from_sexp(&sexp).unwrap();
        assert_eq!(reparsed.debounce.confirm_command, Command::Rotate);
        assert_eq!(reparsed.debounce.rotate_command, Command::Drop);
        assert_eq!(reparsed, original, "{sexp}");
    }

    #[test]
    fn test_open_hands_alt_confirm_setup() {
        let c = Config::from_sexp("(:vertical :open-up :bindings (:up :alt-confirm))").unwrap();
        assert_eq!(c.debounce.vertical, VerticalMapping::OpenUp);
        assert_eq!(c.debounce.bindings.up, Some(Command::AltConfirm));
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let err = Config::load(Path::new("/nonexistent/gesturectl.el")).unwrap_err();
        assert!(format!("{err:#}").contains("reading config"), "{err:#}");
    }
}

//! # Line Parser
//!
//! Turns one raw line of sensor output into channel readings.
//!
//! ## Line Format
//! ```text
//! C:1024,R:51234.5,IR:48872.0,G:3011.0
//! X:127,Y:127,Z:127
//! ```
//! Fields are comma separated. Each field is `name:value`; fields without a
//! colon are skipped. The whole line either parses or is discarded, so a
//! single bad value never leaves a half-applied line behind.

use crate::channel::Channel;
use crate::error::LineParseError;

const FIELD_DELIMITER: char = ',';
const NAME_SEPARATOR: char = ':';

/// Channel values taken from a single line, in the order they appeared
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reading {
    fields: Vec<(Channel, f64)>,
}

impl Reading {
    pub fn iter(&self) -> impl Iterator<Item = (Channel, f64)> + '_ {
        self.fields.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Last value reported for `channel` in this line
    pub fn get(&self, channel: Channel) -> Option<f64> {
        self.fields
            .iter()
            .rev()
            .find(|(c, _)| *c == channel)
            .map(|(_, value)| *value)
    }
}

/// Parse one line as received from the transport (terminator included or not)
pub fn parse_line(raw: &[u8]) -> Result<Reading, LineParseError> {
    let line = std::str::from_utf8(raw).map_err(LineParseError::Encoding)?;
    parse_str(line.trim())
}

/// Parse an already decoded line
pub fn parse_str(line: &str) -> Result<Reading, LineParseError> {
    let mut fields = Vec::new();

    for field in line.split(FIELD_DELIMITER) {
        if !field.contains(NAME_SEPARATOR) {
            continue;
        }

        let mut parts = field.split(NAME_SEPARATOR);
        let name = parts.next().unwrap_or_default().trim();
        let raw_value = parts.next().unwrap_or_default();

        // Value before name lookup: `Foo:abc` still rejects the line.
        let value = raw_value
            .trim()
            .parse::<f64>()
            .map_err(|source| LineParseError::InvalidValue {
                field: field.to_string(),
                value: raw_value.to_string(),
                source,
            })?;

        match Channel::from_name(name) {
            Some(channel) => fields.push((channel, value)),
            None => log::debug!("Skipping unknown channel {:?}", name),
        }
    }

    Ok(Reading { fields })
}

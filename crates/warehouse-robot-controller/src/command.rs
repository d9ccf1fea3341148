/*
[INPUT]:  Direction buttons and freeform operator input
[OUTPUT]: Pending command batch as an uppercase token string
[POS]:    Command layer - not-yet-submitted move sequence
[UPDATE]: When direction tokens or buffer editing rules change
*/

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// One grid move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown direction {0:?}, expected one of N, S, E, W")]
pub struct ParseDirectionError(pub String);

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn as_char(&self) -> char {
        match self {
            Direction::North => 'N',
            Direction::South => 'S',
            Direction::East => 'E',
            Direction::West => 'W',
        }
    }
}

impl TryFrom<char> for Direction {
    type Error = ParseDirectionError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value.to_ascii_uppercase() {
            'N' => Ok(Direction::North),
            'S' => Ok(Direction::South),
            'E' => Ok(Direction::East),
            'W' => Ok(Direction::West),
            _ => Err(ParseDirectionError(value.to_string())),
        }
    }
}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "n" | "north" => Ok(Direction::North),
            "s" | "south" => Ok(Direction::South),
            "e" | "east" => Ok(Direction::East),
            "w" | "west" => Ok(Direction::West),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Pending move sequence.
///
/// The buffer never validates what it holds; the engine rejects illegal
/// batches at submission time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandBuffer {
    value: String,
    separator: Option<char>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer that places `separator` between appended tokens.
    pub fn with_separator(separator: Option<char>) -> Self {
        Self {
            value: String::new(),
            separator,
        }
    }

    pub fn append(&mut self, direction: Direction) {
        if let Some(sep) = self.separator {
            if !self.value.is_empty() && !self.value.ends_with(sep) {
                self.value.push(sep);
            }
        }
        self.value.push(direction.as_char());
    }

    /// Replace the whole buffer with freeform input, uppercased.
    pub fn set(&mut self, value: &str) {
        self.value = value.to_uppercase();
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Recognised moves, skipping separators and anything else.
    pub fn directions(&self) -> impl Iterator<Item = Direction> + '_ {
        self.value.chars().filter_map(|c| Direction::try_from(c).ok())
    }
}

impl fmt::Display for CommandBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_concatenates_without_separator() {
        let mut buffer = CommandBuffer::new();
        buffer.append(Direction::North);
        buffer.append(Direction::North);
        buffer.append(Direction::East);
        assert_eq!(buffer.as_str(), "NNE");
    }

    #[test]
    fn test_append_with_separator_never_leads_or_doubles() {
        let mut buffer = CommandBuffer::with_separator(Some(' '));
        buffer.append(Direction::North);
        assert_eq!(buffer.as_str(), "N");

        buffer.set("N ");
        buffer.append(Direction::West);
        assert_eq!(buffer.as_str(), "N W");
    }

    #[test]
    fn test_set_uppercases_and_clear_resets() {
        let mut buffer = CommandBuffer::new();
        buffer.set("nnee");
        assert_eq!(buffer.as_str(), "NNEE");
        assert_eq!(buffer.directions().count(), 4);

        buffer.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_set_keeps_unknown_characters() {
        let mut buffer = CommandBuffer::new();
        buffer.set("nx1");
        assert_eq!(buffer.as_str(), "NX1");
        assert_eq!(buffer.directions().collect::<Vec<_>>(), vec![Direction::North]);
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("north".parse::<Direction>(), Ok(Direction::North));
        assert_eq!(" s ".parse::<Direction>(), Ok(Direction::South));
        assert_eq!(Direction::try_from('w'), Ok(Direction::West));
        assert!("up".parse::<Direction>().is_err());
    }
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Instrument palette and pitch-row naming.

use std::fmt;

/// Number of palette instruments
pub const INSTRUMENT_COUNT: u8 = 16;

/// Note names, repeating every 12 rows
const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// The 16 palette instruments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instrument {
    Piano,
    Bass,
    Snare,
    Hat,
    BassDrum,
    Bell,
    Flute,
    Chime,
    Guitar,
    Xylophone,
    IronXylophone,
    CowBell,
    Didgeridoo,
    Bit,
    Banjo,
    Pling,
}

impl Instrument {
    /// All instruments in id order
    pub const ALL: [Instrument; 16] = [
        Instrument::Piano,
        Instrument::Bass,
        Instrument::Snare,
        Instrument::Hat,
        Instrument::BassDrum,
        Instrument::Bell,
        Instrument::Flute,
        Instrument::Chime,
        Instrument::Guitar,
        Instrument::Xylophone,
        Instrument::IronXylophone,
        Instrument::CowBell,
        Instrument::Didgeridoo,
        Instrument::Bit,
        Instrument::Banjo,
        Instrument::Pling,
    ];

    /// Look up an instrument by id; unknown ids fall back to piano
    pub fn from_id(id: u8) -> Self {
        Self::ALL.get(id as usize).copied().unwrap_or(Instrument::Piano)
    }

    /// Get the palette id
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Instrument::Piano => "Piano",
            Instrument::Bass => "Bass",
            Instrument::Snare => "Snare",
            Instrument::Hat => "Hat",
            Instrument::BassDrum => "Basedrum",
            Instrument::Bell => "Bell",
            Instrument::Flute => "Flute",
            Instrument::Chime => "Chime",
            Instrument::Guitar => "Guitar",
            Instrument::Xylophone => "Xylophone",
            Instrument::IronXylophone => "Iron Xylophone",
            Instrument::CowBell => "Cow Bell",
            Instrument::Didgeridoo => "Didgeridoo",
            Instrument::Bit => "Bit",
            Instrument::Banjo => "Banjo",
            Instrument::Pling => "Pling",
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name a pitch row, e.g. row 13 is `C#1`
pub fn pitch_name(pitch_row: i64) -> String {
    if pitch_row < 0 {
        return "?".to_string();
    }
    let note = (pitch_row % 12) as usize;
    let octave = pitch_row / 12;
    format!("{}{}", NOTE_NAMES[note], octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_ids() {
        for (i, instrument) in Instrument::ALL.iter().enumerate() {
            assert_eq!(instrument.id() as usize, i);
            assert_eq!(Instrument::from_id(i as u8), *instrument);
        }
    }

    #[test]
    fn test_unknown_id_falls_back_to_piano() {
        assert_eq!(Instrument::from_id(INSTRUMENT_COUNT), Instrument::Piano);
        assert_eq!(Instrument::from_id(255), Instrument::Piano);
    }

    #[test]
    fn test_pitch_name() {
        assert_eq!(pitch_name(0), "C0");
        assert_eq!(pitch_name(13), "C#1");
        assert_eq!(pitch_name(24), "C2");
        assert_eq!(pitch_name(-1), "?");
    }
}

//! Wager entry for daily doubles and the final round.

/// Coerce free-form wager text into a non-negative amount.
///
/// Reads an optional sign followed by leading digits, ignoring anything after
/// them (`"300 dollars"` is 300). Blank, non-numeric and negative input all
/// yield 0. Oversized values saturate.
pub fn coerce_wager(text: &str) -> u32 {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_end = rest
        .bytes()
        .position(|byte| !byte.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..digits_end];
    if negative || digits.is_empty() {
        return 0;
    }
    digits.parse::<u32>().unwrap_or(u32::MAX)
}

/// In-progress wager text, one slot per player position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WagerRegistry {
    entries: Vec<String>,
}

impl WagerRegistry {
    /// Empty registry sized for `players` players.
    pub fn new(players: usize) -> Self {
        Self {
            entries: vec![String::new(); players],
        }
    }

    /// Start a new wagering opportunity: every slot becomes empty.
    pub fn reset(&mut self, players: usize) {
        self.entries.clear();
        self.entries.resize(players, String::new());
    }

    /// Raw text for a player, empty when the slot does not exist.
    pub fn text(&self, index: usize) -> &str {
        self.entries.get(index).map(String::as_str).unwrap_or("")
    }

    /// Replace a player's text. Returns `false` for an unknown slot.
    pub fn set(&mut self, index: usize, text: impl Into<String>) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                *entry = text.into();
                true
            }
            None => false,
        }
    }

    /// Coerced wager for a player.
    pub fn amount(&self, index: usize) -> u32 {
        coerce_wager(self.text(index))
    }

    /// Empty a single slot.
    pub fn clear(&mut self, index: usize) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.clear();
        }
    }

    /// Coerced wager for a player, emptying their slot.
    pub fn take(&mut self, index: usize) -> u32 {
        let amount = self.amount(index);
        self.clear(index);
        amount
    }

    /// All slots in player order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_wagers_coerce_to_zero() {
        assert_eq!(coerce_wager(""), 0);
        assert_eq!(coerce_wager("abc"), 0);
        assert_eq!(coerce_wager("-5"), 0);
        assert_eq!(coerce_wager("   "), 0);
        assert_eq!(coerce_wager("-"), 0);
    }

    #[test]
    fn leading_digits_are_used() {
        assert_eq!(coerce_wager("250"), 250);
        assert_eq!(coerce_wager("  600"), 600);
        assert_eq!(coerce_wager("+75"), 75);
        assert_eq!(coerce_wager("300 dollars"), 300);
        assert_eq!(coerce_wager("12.5"), 12);
    }

    #[test]
    fn oversized_wagers_saturate() {
        assert_eq!(coerce_wager("99999999999999"), u32::MAX);
    }

    #[test]
    fn take_clears_only_that_slot() {
        let mut wagers = WagerRegistry::new(2);
        assert!(wagers.set(0, "500"));
        assert!(wagers.set(1, "200"));
        assert_eq!(wagers.take(0), 500);
        assert_eq!(wagers.text(0), "");
        assert_eq!(wagers.text(1), "200");
    }

    #[test]
    fn reset_resizes_and_empties() {
        let mut wagers = WagerRegistry::new(1);
        wagers.set(0, "100");
        wagers.reset(3);
        assert_eq!(wagers.entries(), &["", "", ""]);
        assert!(!wagers.set(5, "1"));
        assert_eq!(wagers.amount(5), 0);
    }
}

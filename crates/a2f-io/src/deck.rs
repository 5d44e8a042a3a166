//! Line buffer shared by the emitters.

/// Text artifact assembled one line at a time.
#[derive(Debug, Default)]
pub struct Deck {
    text: String,
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `line` followed by a newline.
    pub fn line(&mut self, line: impl AsRef<str>) {
        self.text.push_str(line.as_ref());
        self.text.push('\n');
    }

    pub fn lines<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.line(line);
        }
    }

    /// Writes `items` concatenated, `per_line` to a line.
    pub fn packed(&mut self, items: &[String], per_line: usize) {
        for chunk in items.chunks(per_line.max(1)) {
            self.line(chunk.concat());
        }
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_items_per_line() {
        let mut deck = Deck::new();
        let items: Vec<String> = (1..=12).map(|i| format!("{i},")).collect();
        deck.packed(&items, 10);
        assert_eq!(deck.into_string(), "1,2,3,4,5,6,7,8,9,10,\n11,12,\n");
    }
}

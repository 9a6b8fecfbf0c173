/// Read access to an ordered list of lines. The engine only observes a
/// buffer for the duration of one pass.
pub trait TextBuffer {
    fn line_count(&self) -> usize;

    fn line(&self, index: usize) -> Option<&str>;

    fn text(&self) -> String {
        (0..self.line_count())
            .map(|i| self.line(i).unwrap_or(""))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl TextBuffer for str {
    fn line_count(&self) -> usize {
        self.split('\n').count()
    }

    fn line(&self, index: usize) -> Option<&str> {
        self.split('\n')
            .nth(index)
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
    }

    fn text(&self) -> String {
        self.to_string()
    }
}

impl TextBuffer for [String] {
    fn line_count(&self) -> usize {
        self.len()
    }

    fn line(&self, index: usize) -> Option<&str> {
        self.get(index).map(String::as_str)
    }
}

/// An owned, editable buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
}

impl Document {
    pub fn new() -> Self {
        Document {
            lines: vec![String::new()],
        }
    }

    pub fn from_text(text: &str) -> Self {
        let mut doc = Document::default();
        doc.set_text(text);
        doc
    }

    pub fn set_text(&mut self, text: &str) {
        self.lines = text
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
            .collect();
    }

    /// Replace line `index`. Returns `false` when out of range.
    pub fn edit_line(&mut self, index: usize, text: &str) -> bool {
        match self.lines.get_mut(index) {
            Some(line) => {
                *line = text.to_string();
                true
            }
            None => false,
        }
    }

    /// Insert before `index`; `index == len` appends.
    pub fn insert_line(&mut self, index: usize, text: &str) -> bool {
        if index > self.lines.len() {
            return false;
        }
        self.lines.insert(index, text.to_string());
        true
    }

    pub fn remove_line(&mut self, index: usize) -> Option<String> {
        (index < self.lines.len()).then(|| self.lines.remove(index))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl TextBuffer for Document {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Document::from_text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn str_buffers_keep_trailing_empty_line() {
        let text = "1\r\n2\n";
        assert_eq!(text.line_count(), 3);
        assert_eq!(text.line(0), Some("1"));
        assert_eq!(text.line(2), Some(""));
        assert_eq!(text.line(3), None);
    }

    #[test]
    fn document_edits() {
        let mut doc = Document::from("a\nb");
        assert!(doc.edit_line(1, "c"));
        assert!(!doc.edit_line(5, "x"));
        assert!(doc.insert_line(2, "d"));
        assert!(!doc.insert_line(9, "x"));
        assert_eq!(doc.remove_line(0).as_deref(), Some("a"));
        assert_eq!(doc.remove_line(7), None);
        assert_eq!(doc.text(), "c\nd");
        assert_eq!(Document::new().line_count(), 1);
    }
}

//! Typeclass registry trait.

/// Lookup of the typeclasses prototypes may be based on.
pub trait TypeclassRegistry: Send + Sync {
    /// All registered typeclass paths, sorted.
    fn all_typeclasses(&self) -> Vec<String>;

    /// Documentation for a typeclass, if registered.
    fn docstring(&self, path: &str) -> Option<String>;

    fn contains(&self, path: &str) -> bool {
        self.all_typeclasses().iter().any(|p| p == path)
    }
}

/// First paragraph of a docstring: leading blank lines skipped, stops at the
/// first blank line after content.
pub fn first_paragraph(doc: &str) -> String {
    let mut lines = Vec::new();
    for line in doc.lines() {
        if !line.trim().is_empty() {
            lines.push(line.trim_end());
        } else if !lines.is_empty() {
            break;
        }
    }
    if lines.is_empty() {
        "<empty>".to_string()
    } else {
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_paragraph_stops_at_blank_line() {
        let doc = "\n\nRooms are containers.\nThey hold things.\n\nSecond paragraph.";
        assert_eq!(first_paragraph(doc), "Rooms are containers.\nThey hold things.");
    }

    #[test]
    fn test_first_paragraph_of_empty_doc() {
        assert_eq!(first_paragraph("   \n"), "<empty>");
    }
}

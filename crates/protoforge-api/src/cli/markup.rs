//! Convert wizard pipe markup (`|r`, `|g`, `|n`, ...) to terminal styles.

use console::Style;

fn style_for(code: char) -> Option<Style> {
    let style = Style::new();
    Some(match code {
        'r' => style.red(),
        'R' => style.red().dim(),
        'g' => style.green(),
        'G' => style.green().dim(),
        'y' => style.yellow(),
        'Y' => style.yellow().dim(),
        'b' => style.blue(),
        'B' => style.blue().dim(),
        'm' => style.magenta(),
        'M' => style.magenta().dim(),
        'c' => style.cyan(),
        'C' => style.cyan().dim(),
        'w' => style.white().bold(),
        'W' | 'x' | 'X' => style.dim(),
        'h' => style.bold(),
        'H' => style,
        'u' => style.underlined(),
        'n' => style,
        _ => return None,
    })
}

/// Render markup with terminal colors. `console` drops the colors itself
/// when stdout is not a terminal.
pub fn render(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut segment = String::new();
    let mut current = Style::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '|' {
            segment.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('|') => {
                segment.push('|');
                chars.next();
            }
            Some(code) => match style_for(code) {
                Some(style) => {
                    chars.next();
                    out.push_str(&current.apply_to(std::mem::take(&mut segment)).to_string());
                    current = style;
                }
                None => segment.push('|'),
            },
            None => segment.push('|'),
        }
    }
    out.push_str(&current.apply_to(segment).to_string());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_without_colors_matches_plain_text() {
        console::set_colors_enabled(false);
        assert_eq!(render("|gPrototype saved.|n"), "Prototype saved.");
        assert_eq!(render("a || b"), "a | b");
        assert_eq!(render("|wq|Wuit|n"), "quit");
        assert_eq!(render("trailing |"), "trailing |");
        assert_eq!(render("|zunknown"), "|zunknown");
    }

    #[test]
    fn test_render_matches_core_strip() {
        console::set_colors_enabled(false);
        let text = "|cprototype key:|n lamp, |ctags:|n || light";
        assert_eq!(render(text), protoforge_core::olc::format::strip_markup(text));
    }
}

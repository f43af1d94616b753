//! Menu model: what a screen shows and what each option does.
//!
//! A node builder produces a `NodeView`; the wizard matches user input
//! against its options (by key or number) and falls back to the node's
//! default input handler.

use std::fmt;

use protoforge_types::menu::NodeId;
use protoforge_types::prototype::PrototypeField;

use super::format::strip_markup;

/// Option keys rendered inline in the navigation bar.
const NAV_KEYS: &[&str] = &[
    "index",
    "forward",
    "back",
    "previous",
    "next",
    "validate prototype",
];

/// What selecting an option does.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Goto(NodeId),
    /// Open the view/validate screen, returning to the given node.
    View { back: NodeId },
    PreviousPage,
    NextPage,
    Select { list: ListKind, value: String },
    SaveConfirmed,
    Spawn { location: Option<String> },
    UpdateSpawned,
}

/// Which list a list-screen entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    PrototypeParent,
    Typeclass,
    Load,
    Attr,
    Tag,
}

/// How a node handles free-text input.
#[derive(Debug, Clone, PartialEq)]
pub enum InputHandler {
    CheckPrototypeKey,
    SetProperty {
        field: PrototypeField,
        processor: Processor,
        next: NodeId,
    },
    ExaminePrototype,
    ExamineTypeclass,
    AddAttr,
    AddTag,
    SaveConfirmed,
}

/// Conversion applied to raw input before it is written to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Processor {
    Verbatim,
    Strip,
    CommaList,
    LowercaseCommaList,
    /// Strip, then validate as a lock string.
    LockString,
    /// Strip and lowercase, then validate as a lock string.
    LowercaseLockString,
}

/// One selectable option.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuOption {
    /// Display key first, then aliases. Empty until numbered.
    pub keys: Vec<String>,
    pub desc: String,
    pub action: Action,
}

impl MenuOption {
    pub fn new(keys: &[&str], desc: impl Into<String>, action: Action) -> Self {
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            desc: desc.into(),
            action,
        }
    }

    /// An option that will be numbered when the view is finalized.
    pub fn numbered(desc: impl Into<String>, action: Action) -> Self {
        Self {
            keys: Vec::new(),
            desc: desc.into(),
            action,
        }
    }

    /// Case-insensitive match against any key.
    pub fn matches(&self, input: &str) -> bool {
        let input = input.trim().to_lowercase();
        self.keys.iter().any(|k| k.to_lowercase() == input)
    }

    fn is_nav(&self) -> bool {
        self.keys
            .first()
            .is_some_and(|k| NAV_KEYS.contains(&k.as_str()))
    }
}

/// A rendered screen: text, options, and the free-text handler.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeView {
    pub node: NodeId,
    pub text: String,
    pub options: Vec<MenuOption>,
    pub default: Option<InputHandler>,
}

impl NodeView {
    pub fn new(node: NodeId, text: impl Into<String>) -> Self {
        Self {
            node,
            text: text.into(),
            options: Vec::new(),
            default: None,
        }
    }

    pub fn with_default(mut self, handler: InputHandler) -> Self {
        self.default = Some(handler);
        self
    }

    pub fn push(&mut self, option: MenuOption) {
        self.options.push(option);
    }

    pub fn extend(&mut self, options: impl IntoIterator<Item = MenuOption>) {
        self.options.extend(options);
    }

    /// Number the unkeyed options, continuing after any numeric keys.
    pub fn finalize(mut self) -> Self {
        let mut next = self
            .options
            .iter()
            .filter_map(|o| o.keys.first().and_then(|k| k.parse::<usize>().ok()))
            .max()
            .unwrap_or(0);
        for option in self.options.iter_mut().filter(|o| o.keys.is_empty()) {
            next += 1;
            option.keys.push(next.to_string());
        }
        self
    }

    /// Find the option `input` selects.
    pub fn find_option(&self, input: &str) -> Option<&MenuOption> {
        self.options.iter().find(|o| o.matches(input))
    }
}

/// Standard navigation options for a wizard screen.
///
/// `back`/`forward` appear when given; `index` unless one of them already is
/// the index; `validate prototype` when `current` is given.
pub fn wizard_options(
    current: Option<NodeId>,
    back: Option<NodeId>,
    forward: Option<NodeId>,
) -> Vec<MenuOption> {
    let mut options = Vec::new();
    if let Some(back) = back {
        options.push(MenuOption::new(
            &["back", "b"],
            format!("|W({})|n", back.label()),
            Action::Goto(back),
        ));
    }
    if let Some(forward) = forward {
        options.push(MenuOption::new(
            &["forward", "f"],
            format!("|W({})|n", forward.label()),
            Action::Goto(forward),
        ));
    }
    if back != Some(NodeId::Index) && forward != Some(NodeId::Index) {
        options.push(MenuOption::new(&["index", "i"], "", Action::Goto(NodeId::Index)));
    }
    if let Some(current) = current {
        options.push(MenuOption::new(
            &["validate prototype", "v"],
            "",
            Action::View { back: current },
        ));
    }
    options
}

/// One page of list entries as numbered options, plus paging options.
///
/// `page` is clamped to the last page; the clamped value is returned.
pub fn list_page(
    entries: Vec<(String, Action)>,
    page: usize,
    page_size: usize,
) -> (Vec<MenuOption>, usize) {
    let page_size = page_size.max(1);
    let pages = entries.len().div_ceil(page_size).max(1);
    let page = page.min(pages - 1);

    let mut options: Vec<MenuOption> = entries
        .into_iter()
        .skip(page * page_size)
        .take(page_size)
        .enumerate()
        .map(|(i, (desc, action))| MenuOption {
            keys: vec![(i + 1).to_string()],
            desc,
            action,
        })
        .collect();

    if page > 0 {
        options.push(MenuOption::new(
            &["previous", "p"],
            format!("|W(page {} of {})|n", page, pages),
            Action::PreviousPage,
        ));
    }
    if page + 1 < pages {
        options.push(MenuOption::new(
            &["next", "n"],
            format!("|W(page {} of {})|n", page + 2, pages),
            Action::NextPage,
        ));
    }
    (options, page)
}

/// Render options: navigation inline, the rest one per line.
pub fn format_options(options: &[MenuOption]) -> String {
    let mut nav = Vec::new();
    let mut other = Vec::new();
    for option in options {
        let Some(key) = option.keys.first() else {
            continue;
        };
        if option.is_nav() {
            let mut chars = key.chars();
            let head: String = chars.next().map(String::from).unwrap_or_default();
            let rest: String = chars.collect();
            let desc = if option.desc.is_empty() {
                String::new()
            } else {
                format!(" {}", option.desc)
            };
            nav.push(format!("|w{head}|W{rest}|n{desc}"));
        } else if option.desc.is_empty() {
            other.push(format!("|w{key}|n"));
        } else {
            other.push(format!("|w{key}|n: {}", option.desc));
        }
    }

    let nav = if nav.is_empty() {
        String::new()
    } else {
        format!("{} | |wq|Wuit|n", nav.join(" | "))
    };
    let other = other.join("\n");
    let sep = if !nav.is_empty() && !other.is_empty() {
        "\n\n"
    } else {
        ""
    };
    format!("{nav}{sep}{other}")
}

/// A screen ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    pub node: NodeId,
    pub text: String,
    pub options: String,
}

impl Screen {
    pub fn from_view(view: &NodeView) -> Self {
        Self {
            node: view.node,
            text: view.text.clone(),
            options: format_options(&view.options),
        }
    }

    /// The screen with markup removed.
    pub fn plain(&self) -> String {
        strip_markup(&self.to_string())
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.options.is_empty() {
            write!(f, "{}", self.text)
        } else {
            write!(f, "{}\n\n{}", self.text, self.options)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wizard_options_full_set() {
        let options = wizard_options(
            Some(NodeId::Key),
            Some(NodeId::Typeclass),
            Some(NodeId::Aliases),
        );
        let keys: Vec<_> = options.iter().map(|o| o.keys[0].as_str()).collect();
        assert_eq!(keys, vec!["back", "forward", "index", "validate prototype"]);
        assert_eq!(options[3].action, Action::View { back: NodeId::Key });
    }

    #[test]
    fn test_wizard_options_skip_index_when_neighbour() {
        let options = wizard_options(None, Some(NodeId::Index), Some(NodeId::PrototypeParent));
        let keys: Vec<_> = options.iter().map(|o| o.keys[0].as_str()).collect();
        assert_eq!(keys, vec!["back", "forward"]);
    }

    #[test]
    fn test_option_matching_is_case_insensitive_on_aliases() {
        let option = MenuOption::new(&["back", "b"], "", Action::Goto(NodeId::Index));
        assert!(option.matches("B"));
        assert!(option.matches(" back "));
        assert!(!option.matches("ba"));
    }

    #[test]
    fn test_finalize_numbers_after_existing_numbers() {
        let mut view = NodeView::new(NodeId::Index, "text");
        view.push(MenuOption::new(&["1"], "listed", Action::Goto(NodeId::Key)));
        view.push(MenuOption::numbered("first", Action::Goto(NodeId::Home)));
        view.push(MenuOption::new(&["save", "s"], "", Action::SaveConfirmed));
        view.push(MenuOption::numbered("second", Action::Goto(NodeId::Locks)));
        let view = view.finalize();

        assert_eq!(view.options[1].keys, vec!["2".to_string()]);
        assert_eq!(view.options[3].keys, vec!["3".to_string()]);
        assert_eq!(
            view.find_option("3").map(|o| &o.action),
            Some(&Action::Goto(NodeId::Locks))
        );
    }

    #[test]
    fn test_list_page_paginates() {
        let entries: Vec<_> = (0..25)
            .map(|i| (format!("item{i}"), Action::Goto(NodeId::Index)))
            .collect();

        let (options, page) = list_page(entries.clone(), 0, 10);
        assert_eq!(page, 0);
        assert_eq!(options.len(), 11);
        assert_eq!(options[10].keys[0], "next");

        let (options, page) = list_page(entries.clone(), 2, 10);
        assert_eq!(page, 2);
        assert_eq!(options.len(), 6);
        assert_eq!(options[0].desc, "item20");
        assert_eq!(options[0].keys[0], "1");
        assert_eq!(options[5].keys[0], "previous");

        let (_, page) = list_page(entries, 9, 10);
        assert_eq!(page, 2);
    }

    #[test]
    fn test_list_page_empty() {
        let (options, page) = list_page(Vec::new(), 3, 10);
        assert!(options.is_empty());
        assert_eq!(page, 0);
    }

    #[test]
    fn test_format_options_splits_nav_and_other() {
        let mut options = wizard_options(Some(NodeId::Key), Some(NodeId::Typeclass), None);
        options.push(MenuOption {
            keys: vec!["1".to_string()],
            desc: "Spawn here".to_string(),
            action: Action::Spawn { location: None },
        });
        let text = strip_markup(&format_options(&options));
        assert_eq!(
            text,
            "back (typeclass) | index | validate prototype | quit\n\n1: Spawn here"
        );
    }

    #[test]
    fn test_screen_display_without_options() {
        let screen = Screen {
            node: NodeId::Index,
            text: "hello".to_string(),
            options: String::new(),
        };
        assert_eq!(screen.to_string(), "hello");
    }
}

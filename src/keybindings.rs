//! Keybinding registry: maps key events to actions, with config overrides.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    NavDown,
    NavUp,
    PageDown,
    PageUp,
    ToggleFavorite,
    ToggleFavoritesView,
    Reload,
    OpenInBrowser,
    ShowHelp,
    Back,
}

impl Action {
    /// Human-readable description for the help screen.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit",
            Self::NavDown => "Move down",
            Self::NavUp => "Move up",
            Self::PageDown => "Page down",
            Self::PageUp => "Page up",
            Self::ToggleFavorite => "Favorite / unfavorite movie",
            Self::ToggleFavoritesView => "Switch feed / favorites",
            Self::Reload => "Reload feed from page 1",
            Self::OpenInBrowser => "Open movie page in browser",
            Self::ShowHelp => "Show help",
            Self::Back => "Back / retry failed page",
        }
    }

    /// Name used in the `[keybindings]` config table.
    pub fn config_name(self) -> &'static str {
        match self {
            Self::Quit => "quit",
            Self::NavDown => "nav_down",
            Self::NavUp => "nav_up",
            Self::PageDown => "page_down",
            Self::PageUp => "page_up",
            Self::ToggleFavorite => "toggle_favorite",
            Self::ToggleFavoritesView => "favorites_view",
            Self::Reload => "reload",
            Self::OpenInBrowser => "open_in_browser",
            Self::ShowHelp => "show_help",
            Self::Back => "back",
        }
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context: which list has the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    Feed,
    Favorites,
}

// ============================================================================
// Key Specification
// ============================================================================

/// A key event: code + modifiers.
///
/// Shift is dropped for character keys because the character already encodes
/// it (`F` arrives as `Char('F')` with or without SHIFT depending on the
/// terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        let modifiers = match code {
            KeyCode::Char(_) => modifiers.difference(KeyModifiers::SHIFT),
            _ => modifiers,
        };
        Self { code, modifiers }
    }

    pub fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }
}

/// Parse a key string from config into a KeySpec.
///
/// Supported formats:
/// - Single char: "q", "j", "/"
/// - Named keys: "Enter", "Esc", "Tab", "Up", "Down", "PageUp", "Space"
/// - Modifier combos: "Ctrl+d"
/// - Function keys: "F1" through "F12"
fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+") {
        let mut chars = rest.trim().chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Some(KeySpec::ctrl(c)),
            _ => None,
        };
    }

    let named = match s.to_lowercase().as_str() {
        "enter" | "return" => Some(KeyCode::Enter),
        "esc" | "escape" => Some(KeyCode::Esc),
        "tab" => Some(KeyCode::Tab),
        "up" => Some(KeyCode::Up),
        "down" => Some(KeyCode::Down),
        "pageup" | "pgup" => Some(KeyCode::PageUp),
        "pagedown" | "pgdn" => Some(KeyCode::PageDown),
        "home" => Some(KeyCode::Home),
        "end" => Some(KeyCode::End),
        "space" => Some(KeyCode::Char(' ')),
        _ => None,
    };
    if let Some(code) = named {
        return Some(KeySpec::plain(code));
    }

    if let Some(n) = s
        .strip_prefix(|c| c == 'F' || c == 'f')
        .and_then(|n| n.parse::<u8>().ok())
    {
        if (1..=12).contains(&n) {
            return Some(KeySpec::plain(KeyCode::F(n)));
        }
    }

    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(KeySpec::plain(KeyCode::Char(c))),
        _ => None,
    }
}

/// Format a KeySpec for the help screen.
fn format_key(key: &KeySpec) -> String {
    let modifier = if key.modifiers.contains(KeyModifiers::CONTROL) {
        "Ctrl+"
    } else {
        ""
    };

    let key_name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => "?".to_string(),
    };

    format!("{}{}", modifier, key_name)
}

/// Parse an action name from config.
fn parse_action_name(name: &str) -> Option<Action> {
    match name.to_lowercase().as_str() {
        "quit" => Some(Action::Quit),
        "nav_down" | "down" => Some(Action::NavDown),
        "nav_up" | "up" => Some(Action::NavUp),
        "page_down" | "pagedown" => Some(Action::PageDown),
        "page_up" | "pageup" => Some(Action::PageUp),
        "toggle_favorite" | "favorite" => Some(Action::ToggleFavorite),
        "favorites_view" | "toggle_favorites_view" | "favorites" => {
            Some(Action::ToggleFavoritesView)
        }
        "reload" | "refresh" => Some(Action::Reload),
        "open_in_browser" | "open" => Some(Action::OpenInBrowser),
        "show_help" | "help" => Some(Action::ShowHelp),
        "back" => Some(Action::Back),
        _ => None,
    }
}

// ============================================================================
// Keybinding Registry
// ============================================================================

/// Registry of keybindings: defaults plus config overrides.
///
/// The same key can map to different actions in different contexts; lookups
/// fall back to [`Context::Global`].
pub struct KeybindingRegistry {
    lookup: HashMap<(Context, KeySpec), Action>,
    /// Registration order, for the help screen.
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::new(),
            bindings: Vec::new(),
        };
        registry.register_defaults();
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    fn register_defaults(&mut self) {
        use Context::Global;

        self.bind(Global, KeySpec::plain(KeyCode::Char('q')), Action::Quit);

        self.bind(Global, KeySpec::plain(KeyCode::Char('j')), Action::NavDown);
        self.bind(Global, KeySpec::plain(KeyCode::Down), Action::NavDown);
        self.bind(Global, KeySpec::plain(KeyCode::Char('k')), Action::NavUp);
        self.bind(Global, KeySpec::plain(KeyCode::Up), Action::NavUp);

        self.bind(Global, KeySpec::plain(KeyCode::PageDown), Action::PageDown);
        self.bind(Global, KeySpec::ctrl('d'), Action::PageDown);
        self.bind(Global, KeySpec::plain(KeyCode::PageUp), Action::PageUp);
        self.bind(Global, KeySpec::ctrl('u'), Action::PageUp);

        self.bind(
            Global,
            KeySpec::plain(KeyCode::Char('f')),
            Action::ToggleFavorite,
        );
        self.bind(
            Global,
            KeySpec::plain(KeyCode::Char(' ')),
            Action::ToggleFavorite,
        );
        self.bind(
            Global,
            KeySpec::plain(KeyCode::Char('F')),
            Action::ToggleFavoritesView,
        );

        self.bind(
            Global,
            KeySpec::plain(KeyCode::Char('o')),
            Action::OpenInBrowser,
        );
        self.bind(Global, KeySpec::plain(KeyCode::Char('?')), Action::ShowHelp);
        self.bind(Global, KeySpec::plain(KeyCode::Esc), Action::Back);

        // Reloading only makes sense for the paginated feed
        self.bind(
            Context::Feed,
            KeySpec::plain(KeyCode::Char('r')),
            Action::Reload,
        );
    }

    /// Apply user overrides from the config `[keybindings]` table.
    ///
    /// An override replaces every default key of that action, keeping the
    /// contexts the action was bound in. Returns warnings for unknown action
    /// names and unparseable keys.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        for (action_name, key_str) in overrides {
            let Some(action) = parse_action_name(action_name) else {
                warnings.push(format!("Unknown action '{}', ignoring", action_name));
                continue;
            };

            let Some(key) = parse_key_string(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{}' for action '{}', ignoring",
                    key_str, action_name
                ));
                continue;
            };

            let mut contexts: Vec<Context> = Vec::new();
            for (ctx, _, a) in &self.bindings {
                if *a == action && !contexts.contains(ctx) {
                    contexts.push(*ctx);
                }
            }

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);

            for ctx in contexts {
                if let Some(previous) = self.lookup.get(&(ctx, key)).copied() {
                    warnings.push(format!(
                        "Key '{}' was bound to '{}', now '{}'",
                        key_str,
                        previous.config_name(),
                        action.config_name()
                    ));
                    self.bindings
                        .retain(|(c, k, a)| !(*c == ctx && *k == key && *a == previous));
                }
                self.bind(ctx, key, action);
            }

            tracing::info!(action = %action_name, key = %key_str, "Applied keybinding override");
        }

        warnings
    }

    /// Look up the action for a key in a context, falling back to Global.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        let key = KeySpec::new(code, modifiers);

        self.lookup
            .get(&(context, key))
            .or_else(|| self.lookup.get(&(Context::Global, key)))
            .copied()
    }

    /// All bindings for the help screen: (context, key label, action, description).
    pub fn all_bindings(&self) -> Vec<(Context, String, Action, &'static str)> {
        self.bindings
            .iter()
            .map(|(ctx, key, action)| (*ctx, format_key(key), *action, action.describe()))
            .collect()
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(reg: &KeybindingRegistry, code: KeyCode, ctx: Context) -> Option<Action> {
        reg.action_for_key(code, KeyModifiers::NONE, ctx)
    }

    #[test]
    fn test_default_bindings() {
        let reg = KeybindingRegistry::new();
        assert_eq!(key(&reg, KeyCode::Char('q'), Context::Feed), Some(Action::Quit));
        assert_eq!(key(&reg, KeyCode::Down, Context::Feed), Some(Action::NavDown));
        assert_eq!(key(&reg, KeyCode::Char('k'), Context::Favorites), Some(Action::NavUp));
        assert_eq!(
            key(&reg, KeyCode::Char(' '), Context::Feed),
            Some(Action::ToggleFavorite)
        );
        assert_eq!(
            key(&reg, KeyCode::PageDown, Context::Favorites),
            Some(Action::PageDown)
        );
    }

    #[test]
    fn test_ctrl_modifiers() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Char('d'), KeyModifiers::CONTROL, Context::Feed),
            Some(Action::PageDown)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('u'), KeyModifiers::CONTROL, Context::Feed),
            Some(Action::PageUp)
        );
        // Plain 'd' is unbound
        assert_eq!(key(&reg, KeyCode::Char('d'), Context::Feed), None);
    }

    #[test]
    fn test_shift_ignored_for_characters() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Char('F'), KeyModifiers::SHIFT, Context::Feed),
            Some(Action::ToggleFavoritesView)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('?'), KeyModifiers::SHIFT, Context::Feed),
            Some(Action::ShowHelp)
        );
    }

    #[test]
    fn test_reload_only_in_feed_context() {
        let reg = KeybindingRegistry::new();
        assert_eq!(key(&reg, KeyCode::Char('r'), Context::Feed), Some(Action::Reload));
        assert_eq!(key(&reg, KeyCode::Char('r'), Context::Favorites), None);
    }

    #[test]
    fn test_parse_key_string() {
        assert_eq!(parse_key_string("x"), Some(KeySpec::plain(KeyCode::Char('x'))));
        assert_eq!(parse_key_string("Ctrl+n"), Some(KeySpec::ctrl('n')));
        assert_eq!(parse_key_string("PageDown"), Some(KeySpec::plain(KeyCode::PageDown)));
        assert_eq!(parse_key_string("space"), Some(KeySpec::plain(KeyCode::Char(' '))));
        assert_eq!(parse_key_string("F5"), Some(KeySpec::plain(KeyCode::F(5))));
        assert_eq!(parse_key_string("F13"), None);
        assert_eq!(parse_key_string("Ctrl+ab"), None);
        assert_eq!(parse_key_string("nonsense"), None);
        assert_eq!(parse_key_string(""), None);
    }

    #[test]
    fn test_override_replaces_defaults() {
        let mut reg = KeybindingRegistry::new();
        let overrides = HashMap::from([("toggle_favorite".to_string(), "x".to_string())]);
        let warnings = reg.apply_overrides(&overrides);
        assert!(warnings.is_empty());

        assert_eq!(
            key(&reg, KeyCode::Char('x'), Context::Feed),
            Some(Action::ToggleFavorite)
        );
        assert_eq!(key(&reg, KeyCode::Char('f'), Context::Feed), None);
        assert_eq!(key(&reg, KeyCode::Char(' '), Context::Feed), None);
    }

    #[test]
    fn test_override_keeps_context() {
        let mut reg = KeybindingRegistry::new();
        let overrides = HashMap::from([("reload".to_string(), "F5".to_string())]);
        reg.apply_overrides(&overrides);

        assert_eq!(key(&reg, KeyCode::F(5), Context::Feed), Some(Action::Reload));
        assert_eq!(key(&reg, KeyCode::F(5), Context::Favorites), None);
    }

    #[test]
    fn test_override_warnings() {
        let mut reg = KeybindingRegistry::new();
        let overrides = HashMap::from([
            ("launch_rockets".to_string(), "x".to_string()),
            ("quit".to_string(), "Ctrl+".to_string()),
        ]);
        let warnings = reg.apply_overrides(&overrides);
        assert_eq!(warnings.len(), 2);
        // Failed override leaves the default in place
        assert_eq!(key(&reg, KeyCode::Char('q'), Context::Feed), Some(Action::Quit));
    }

    #[test]
    fn test_override_stealing_key_is_reported() {
        let mut reg = KeybindingRegistry::new();
        let overrides = HashMap::from([("quit".to_string(), "o".to_string())]);
        let warnings = reg.apply_overrides(&overrides);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("open_in_browser"));
        assert_eq!(key(&reg, KeyCode::Char('o'), Context::Feed), Some(Action::Quit));

        let listed = reg
            .all_bindings()
            .into_iter()
            .filter(|(_, label, _, _)| label == "o")
            .count();
        assert_eq!(listed, 1);
    }

    #[test]
    fn test_all_bindings_labels() {
        let reg = KeybindingRegistry::new();
        let labels: Vec<String> = reg
            .all_bindings()
            .into_iter()
            .filter(|(_, _, a, _)| *a == Action::PageDown)
            .map(|(_, label, _, _)| label)
            .collect();
        assert_eq!(labels, vec!["PageDown".to_string(), "Ctrl+d".to_string()]);
    }
}

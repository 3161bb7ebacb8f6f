use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Whether output is styled. Decided once per process from the terminal
/// and `NO_COLOR`/`CLICOLOR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Colored,
    Plain,
}

impl Theme {
    pub fn detect() -> Self {
        if console::colors_enabled() {
            Theme::Colored
        } else {
            Theme::Plain
        }
    }

    fn pick(self, style: Style) -> Style {
        match self {
            Theme::Colored => style,
            Theme::Plain => Style::new(),
        }
    }

    pub fn header(self) -> Style {
        self.pick(Style::new().cyan().bold())
    }

    pub fn success(self) -> Style {
        self.pick(Style::new().green().bold())
    }

    pub fn error(self) -> Style {
        self.pick(Style::new().red().bold())
    }

    pub fn warn(self) -> Style {
        self.pick(Style::new().yellow().bold())
    }

    pub fn alias(self) -> Style {
        self.pick(Style::new().magenta().bold())
    }

    pub fn path(self) -> Style {
        self.pick(Style::new().blue())
    }

    pub fn dim(self) -> Style {
        self.pick(Style::new().bright_black())
    }
}

pub fn theme() -> Theme {
    *THEME.get_or_init(Theme::detect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use owo_colors::OwoColorize;

    #[test]
    fn test_plain_theme_drops_colors() {
        let plain = "dots".style(Theme::Plain.alias()).to_string();
        assert!(plain.contains("dots"));
        assert!(!plain.contains("35"));

        let colored = "dots".style(Theme::Colored.alias()).to_string();
        assert!(colored.contains("35"));
    }
}

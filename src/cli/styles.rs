// (c) Bakelite Contributors
//! CLI output styling
//!
//! Conditional style accessors based on the terminal and user preferences, matching the
//! `CLICOLOR`/`NO_COLOR` conventions. See <https://bixense.com/clicolors/>.

#[allow(clippy::enum_glob_use)]
use anstyle::AnsiColor::*;
use anstyle::Color::Ansi;
use clap::builder::styling::Styles;
use std::io::IsTerminal;

/// Error message styling. This can be Displayed directly.
const _ERROR: anstyle::Style = anstyle::Style::new().bold().fg_color(Some(Ansi(Red)));

/// Warning message styling. This can be Displayed directly.
const _WARNING: anstyle::Style = anstyle::Style::new().bold().fg_color(Some(Ansi(Yellow)));

const _HEADER: anstyle::Style = anstyle::Style::new()
    .underline()
    .fg_color(Some(Ansi(Yellow)));

/// Styling for clap's own usage/help output.
pub(crate) const CLAP_STYLES: Styles = Styles::styled()
    .usage(_HEADER)
    .header(_HEADER)
    .literal(anstyle::Style::new().bold())
    .invalid(_WARNING)
    .error(_ERROR);

/// Wrap a constant in a function that returns the style if colours are enabled.
macro_rules! wrap {
    ($func:ident, $def:ident) => {
        #[must_use]
        /// Conditional styling accessor
        pub(crate) fn $func() -> anstyle::Style {
            if use_colours() {
                $def
            } else {
                anstyle::Style::new()
            }
        }
    };
}

wrap!(error, _ERROR);
wrap!(warning, _WARNING);

/// Resets styling to default.
#[must_use]
pub(crate) fn reset() -> impl core::fmt::Display + Copy {
    error().render_reset()
}

/// Are we configured to use terminal colours?
#[must_use]
pub(crate) fn use_colours() -> bool {
    console::colors_enabled()
}

/// The available terminal colour modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub(crate) enum ColourMode {
    #[value(alias = "on", alias = "yes")]
    /// Forces colours on, whatever is happening
    Always,
    #[value(alias = "off", alias = "no", alias = "none")]
    /// Never use colours
    Never,
    #[default]
    /// Use colours only when writing to a terminal. This is the default behaviour.
    Auto,
}

/// Detect the desired colour mode from the environment variables.
fn autodetect_colour() -> bool {
    let clicolor_force = std::env::var("CLICOLOR_FORCE").unwrap_or_default();
    let no_color = std::env::var("NO_COLOR").unwrap_or_default();

    if !no_color.is_empty() {
        false
    } else if !clicolor_force.is_empty() {
        true
    } else {
        std::io::stdout().is_terminal()
    }
}

/// Set up the terminal colour mode for subsequent output.
pub(crate) fn configure_colours(mode: ColourMode) {
    let state = match mode {
        ColourMode::Always => true,
        ColourMode::Never => false,
        ColourMode::Auto => autodetect_colour(),
    };
    console::set_colors_enabled(state);
    console::set_colors_enabled_stderr(state);
}

#[cfg(test)]
mod test {
    use super::{ColourMode, configure_colours};

    #[test]
    fn configure_colours_modes_do_not_panic() {
        configure_colours(ColourMode::Always);
        configure_colours(ColourMode::Never);
        configure_colours(ColourMode::Auto);
    }
}

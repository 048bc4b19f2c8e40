//! Nerd Font icons for TUI display
//! Requires a Nerd Font to be installed (https://www.nerdfonts.com)

/// Icon set using Nerd Font glyphs
#[derive(Debug, Clone)]
pub struct Icons {
    // Screens
    pub videos: &'static str,
    pub channels: &'static str,
    pub help: &'static str,

    // List rows
    pub channel: &'static str,
    pub watched: &'static str,
    pub bullet: &'static str,

    // Status
    pub success: &'static str,
    pub error: &'static str,

    // Input
    pub edit: &'static str,
}

impl Icons {
    /// Nerd Font icon set
    pub const fn nerd() -> Self {
        Self {
            // Screens - nf-fa-*
            videos: "\u{f16a}",   // nf-fa-youtube_play
            channels: "\u{f0c0}", // nf-fa-users
            help: "\u{f059}",     // nf-fa-question_circle

            // List rows
            channel: "\u{f007}", // nf-fa-user
            watched: "\u{f06e}", // nf-fa-eye
            bullet: "•",

            // Status
            success: "\u{f00c}", // nf-fa-check
            error: "\u{f00d}",   // nf-fa-times

            // Input
            edit: "\u{f044}", // nf-fa-pencil_square_o
        }
    }
}

impl Default for Icons {
    fn default() -> Self {
        Self::nerd()
    }
}

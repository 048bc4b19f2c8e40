use super::state::Screen;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextScreen,
    PrevScreen,
    SetScreen(Screen),

    ListUp,
    ListDown,
    GoTop,
    GoBottom,
    PageUp,
    PageDown,

    /// Play the selected video.
    Activate,
    /// Reload the visible list, serving fresh caches as-is.
    Refresh,
    /// Throw the video cache away and refetch.
    ForceRefresh,

    // Subscription management
    StartAdd,
    InputChar(char),
    Backspace,
    CancelAdd,
    SubmitAdd,
    RemoveSelected,

    Resize,
}

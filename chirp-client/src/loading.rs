/// Text read out by assistive technology for every spinner.
pub const LOADING_LABEL: &str = "Loading...";

/// The shared pending-state spinner.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum LoadingIndicator {
    /// Small spinner placed next to other content.
    Inline,
    /// Spinner centered in the whole viewport.
    FullPage,
}

impl LoadingIndicator {
    #[must_use]
    pub fn label(self) -> &'static str {
        LOADING_LABEL
    }
}

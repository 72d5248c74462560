use serde::Serialize;

/// A single engine control widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Control {
    Zoom,
    Scale,
    Attribution { collapsible: bool },
    FullScreen,
    MapType,
    StreetView,
    Rotate,
}

/// Controls currently installed on an engine.
///
/// Controls are installed or removed as a whole; there is no way to show a
/// partial set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSet {
    standard: &'static [Control],
    installed: Vec<Control>,
}

impl ControlSet {
    /// Empty set that installs `standard` when shown
    pub fn new(standard: &'static [Control]) -> Self {
        Self {
            standard,
            installed: Vec::new(),
        }
    }

    /// Clears the installed controls and, when `visible`, installs the full
    /// standard set again
    pub fn set_visible(&mut self, visible: bool) {
        self.installed.clear();
        if visible {
            self.installed.extend_from_slice(self.standard);
        }
    }

    pub fn is_visible(&self) -> bool {
        !self.installed.is_empty()
    }

    pub fn installed(&self) -> &[Control] {
        &self.installed
    }

    pub fn contains(&self, control: Control) -> bool {
        self.installed.contains(&control)
    }

    /// The engine's full control list
    pub fn standard(&self) -> &'static [Control] {
        self.standard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STANDARD: &[Control] = &[
        Control::Zoom,
        Control::Scale,
        Control::Attribution { collapsible: true },
        Control::FullScreen,
    ];

    #[test]
    fn test_controls_toggle_as_unit() {
        let mut controls = ControlSet::new(STANDARD);
        assert!(!controls.is_visible());

        controls.set_visible(true);
        assert_eq!(controls.installed(), STANDARD);

        controls.set_visible(false);
        assert!(controls.installed().is_empty());
    }

    #[test]
    fn test_repeated_show_does_not_duplicate() {
        let mut controls = ControlSet::new(STANDARD);
        controls.set_visible(true);
        controls.set_visible(true);
        assert_eq!(controls.installed().len(), STANDARD.len());
        assert!(controls.contains(Control::FullScreen));
    }
}

use plotters::style::RGBColor;

/// Trace colours in drawing order
pub const TRACE_COLORS: [RGBColor; 12] = [
    RGBColor(0, 0, 0),       // black
    RGBColor(0, 191, 191),   // cyan
    RGBColor(255, 0, 0),     // red
    RGBColor(0, 128, 0),     // green
    RGBColor(191, 191, 0),   // yellow
    RGBColor(0, 0, 255),     // blue
    RGBColor(105, 105, 105), // dim grey
    RGBColor(210, 105, 30),  // chocolate
    RGBColor(191, 0, 191),   // magenta
    RGBColor(255, 215, 0),   // gold
    RGBColor(255, 99, 71),   // tomato
    RGBColor(0, 255, 0),     // lime
];

/// Colour of an aggregated sum trace
pub const SUM_COLOR: RGBColor = RGBColor(0, 0, 0);

/// Endless cycle over the trace colours.
///
/// Owned by whoever drives the plots, so the position carries over between events of one
/// run and nothing else sees it.
#[derive(Debug, Clone, Default)]
pub struct ColorCycle {
    position: usize,
}

impl ColorCycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

impl Iterator for ColorCycle {
    type Item = RGBColor;

    fn next(&mut self) -> Option<Self::Item> {
        let color = TRACE_COLORS[self.position];
        self.position = (self.position + 1) % TRACE_COLORS.len();
        Some(color)
    }
}

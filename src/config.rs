use crate::units::Pt;
use std::time::Duration;

/// How column widths are derived from the available width
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum LayoutPolicy {
    /// Columns are stretched or squeezed between their minimum and preferred
    /// widths to exactly fill the available width
    #[default]
    FitPage,
    /// Columns take their preferred widths; wide tables are split across
    /// frames column-wise
    FitContent,
    /// Every visible column gets the same width
    EqualWidth,
    /// Preferred widths, squeezed like [LayoutPolicy::FitPage] when the
    /// table is too wide but never stretched
    FitContentPage,
    /// Preferred widths, squeezed toward (but never below) the minimum widths
    /// when the table is too wide; what still overflows is split column-wise
    FitContentOnePage,
}

/// Settings shared by the sizing and pagination of one table
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub policy: LayoutPolicy,
    /// Padding added on every side of every visible cell
    pub cell_padding: Pt,
    /// How many rows are measured to find a column's width
    pub sample_rows: usize,
    /// Keep a lone first data row off a page that cannot fit a second one
    pub orphan_control: bool,
    /// Keep a lone last data row off a page of its own
    pub widow_control: bool,
    /// Space kept free at the bottom of a frame when the table continues on
    /// the next one
    pub continuation_reserve: Pt,
    /// How often a thread waiting for deferred table data re-checks the gate
    pub gate_poll: Duration,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            policy: LayoutPolicy::default(),
            cell_padding: Pt(2.0),
            sample_rows: 200,
            orphan_control: true,
            widow_control: true,
            continuation_reserve: Pt::ZERO,
            gate_poll: Duration::from_millis(50),
        }
    }
}

impl LayoutConfig {
    /// Create a configuration with the default settings
    pub fn new() -> LayoutConfig {
        LayoutConfig::default()
    }

    pub fn policy(&mut self, policy: LayoutPolicy) -> &mut Self {
        self.policy = policy;
        self
    }

    pub fn cell_padding<P: Into<Pt>>(&mut self, padding: P) -> &mut Self {
        self.cell_padding = padding.into();
        self
    }

    /// Limit the number of rows measured per column; at least one row is
    /// always measured
    pub fn sample_rows(&mut self, rows: usize) -> &mut Self {
        self.sample_rows = rows.max(1);
        self
    }

    pub fn orphan_control(&mut self, enabled: bool) -> &mut Self {
        self.orphan_control = enabled;
        self
    }

    pub fn widow_control(&mut self, enabled: bool) -> &mut Self {
        self.widow_control = enabled;
        self
    }

    pub fn continuation_reserve<P: Into<Pt>>(&mut self, reserve: P) -> &mut Self {
        self.continuation_reserve = reserve.into();
        self
    }

    pub fn gate_poll(&mut self, interval: Duration) -> &mut Self {
        self.gate_poll = interval;
        self
    }
}

use anyhow::Result;

use crate::demo;
use crate::events::source::EventSource;
use crate::tui::canvas::{self, ViewOptions};

/// Demo mode: a scripted engine session feeds the visualizer.
pub fn run(opts: ViewOptions) -> Result<()> {
    let source = EventSource::new();
    demo::spawn(source.sender());
    canvas::run(source, opts)
}

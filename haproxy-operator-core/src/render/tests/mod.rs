mod spoe_tests;

use crate::model::ModelSnapshot;
use crate::render::{RenderedConfig, Renderer};
use crate::settings::OperatorSettings;
use crate::state::assemble;

pub(crate) fn render(snapshot: &ModelSnapshot, tls_enabled: bool) -> RenderedConfig {
    let settings = OperatorSettings::default();
    let state = assemble(snapshot, &settings);
    Renderer::new()
        .expect("templates load")
        .render(snapshot, &settings, &state, tls_enabled)
        .expect("configuration renders")
}

/// Lines of the section starting with `header`, up to the next blank line.
pub(crate) fn section<'a>(config: &'a str, header: &str) -> Vec<&'a str> {
    config
        .lines()
        .skip_while(|line| *line != header)
        .take_while(|line| !line.is_empty())
        .collect()
}

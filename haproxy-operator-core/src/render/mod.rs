//! HAProxy configuration rendering.
//!
//! The proxy state is flattened into template views (see [`context`]) and
//! rendered with the embedded templates of the selected mode.

mod context;
mod error;
mod lines;

#[cfg(test)]
mod tests;

pub use error::RenderError;

use crate::model::ModelSnapshot;
use crate::settings::OperatorSettings;
use crate::state::ProxyState;
use context::RenderContext;
use minijinja::{Environment, UndefinedBehavior};
use rust_embed::RustEmbed;
use tracing::debug;

/// RFC 7919 ffdhe2048 group, written next to the configuration.
pub const FFDHE2048: &str = "-----BEGIN DH PARAMETERS-----
MIIBCAKCAQEA//////////+t+FRYortKmq/cViAnPTzx2LnFg84tNpWp4TZBFGQz
+8yTnc4kmz75fS/jY2MMddj2gbICrsRhetPfHtXV/WVhJDP1H18GbtCFY2VVPe0a
87VXE15/V8k1mE8McODmi3fipona8+/och3xWKE2rec1MKzKT0g6eXq8CrGCsyT7
YdEIqUuyyOP7uWrat2DX9GgdT0Kj3jlN9K5W7edjcrsZCwenyO4KbXCeAvzhzffi
7MA0BM0oNC9hkXL+nOmFg/+OTxIy7vKBg8P+OxtMb61zO7X8vC7CIAXFjvGDfRaD
ssbzSibBsu/6iGtCOGEoXJf//////////wIBAg==
-----END DH PARAMETERS-----
";

const CONFIG_TEMPLATE: &str = "haproxy.cfg.j2";
const SPOE_TEMPLATE: &str = "spoe_auth.conf.j2";

#[derive(RustEmbed)]
#[folder = "templates/"]
struct Templates;

/// Files produced for one reconcile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedConfig {
    pub haproxy_cfg: String,
    /// SPOE agent definitions; `None` when no agent is admitted.
    pub spoe_auth: Option<String>,
}

pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);

        for name in Templates::iter() {
            let Some(file) = Templates::get(&name) else {
                continue;
            };
            let source = String::from_utf8(file.data.into_owned()).map_err(|_| {
                RenderError::Encoding {
                    template: name.to_string(),
                }
            })?;
            env.add_template_owned(name.to_string(), source)
                .map_err(|source| RenderError::Template {
                    template: name.to_string(),
                    source,
                })?;
        }

        Ok(Self { env })
    }

    fn render_template(&self, name: &str, context: &RenderContext<'_>) -> Result<String, RenderError> {
        let error = |source| RenderError::Template {
            template: name.to_string(),
            source,
        };
        self.env
            .get_template(name)
            .and_then(|template| template.render(context))
            .map_err(error)
    }

    /// Render the configuration for `state`. Frontends binding TLS are only
    /// emitted when `tls_enabled`, i.e. at least one certificate is on disk.
    pub fn render(
        &self,
        snapshot: &ModelSnapshot,
        settings: &OperatorSettings,
        state: &ProxyState,
        tls_enabled: bool,
    ) -> Result<RenderedConfig, RenderError> {
        let context = RenderContext::build(snapshot, settings, state, tls_enabled);
        debug!(mode = %state.mode, tls_enabled, "rendering configuration");

        let haproxy_cfg = self.render_template(CONFIG_TEMPLATE, &context)?;
        let spoe_auth = if context.has_spoe() {
            Some(self.render_template(SPOE_TEMPLATE, &context)?)
        } else {
            None
        };

        Ok(RenderedConfig {
            haproxy_cfg,
            spoe_auth,
        })
    }
}

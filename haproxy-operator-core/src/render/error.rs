#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template {template} is not valid UTF-8")]
    Encoding { template: String },

    #[error("failed to render template {template}")]
    Template {
        template: String,
        #[source]
        source: minijinja::Error,
    },
}
